use crate::config::Config;
use substation_intake_common::{AuthProvider, Error, OwnerId, Result};

/// 設定・環境変数から所有者を決める認証プロバイダ
#[derive(Debug, Clone, Default)]
pub struct ConfigAuth {
    owner: Option<String>,
}

impl ConfigAuth {
    pub fn from_config(config: &Config) -> Self {
        Self {
            owner: config.owner_id(),
        }
    }

    pub fn new(owner: Option<String>) -> Self {
        Self { owner }
    }
}

impl AuthProvider for ConfigAuth {
    fn current_owner_id(&self) -> Result<OwnerId> {
        self.owner
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(OwnerId::new)
            .ok_or(Error::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_in() {
        let auth = ConfigAuth::new(Some(" inspector-7 ".into()));
        assert_eq!(auth.current_owner_id().unwrap(), OwnerId::new("inspector-7"));
    }

    #[test]
    fn test_unauthenticated() {
        assert!(matches!(ConfigAuth::new(None).current_owner_id(), Err(Error::Unauthenticated)));
        assert!(matches!(
            ConfigAuth::new(Some("   ".into())).current_owner_id(),
            Err(Error::Unauthenticated)
        ));
    }
}
