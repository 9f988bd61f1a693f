use super::sanitize_component;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use substation_intake_common::store::extension_for_mime;
use substation_intake_common::{Error, FileStore, Locator, OwnerId, Result};

const FILES_DIR: &str = "files";

/// `<data_dir>/files/<owner>/<hash>-<n>.<ext>` に本体を保存する
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let root = data_dir.join(FILES_DIR);
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// ロケータを実パスへ（ルート外を指すものは拒否）
    fn resolve(&self, locator: &Locator) -> Result<PathBuf> {
        let relative = Path::new(locator.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || locator.as_str().is_empty() {
            return Err(Error::NotFound(locator.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn content_hash(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..8])
}

impl FileStore for DiskFileStore {
    fn store(&mut self, owner: &OwnerId, bytes: &[u8], mime_type: &str) -> Result<Locator> {
        let owner_dir = sanitize_component(owner.as_str());
        let dir = self.root.join(&owner_dir);
        std::fs::create_dir_all(&dir)?;

        let hash = content_hash(bytes);
        let ext = extension_for_mime(mime_type);
        let mut seq = 0u32;
        let file_name = loop {
            let candidate = format!("{}-{}.{}", hash, seq, ext);
            if !dir.join(&candidate).exists() {
                break candidate;
            }
            seq += 1;
        };

        std::fs::write(dir.join(&file_name), bytes)?;
        tracing::debug!("stored {} bytes as {}/{}", bytes.len(), owner_dir, file_name);
        Ok(Locator::new(format!("{}/{}", owner_dir, file_name)))
    }

    fn retrieve_url(&self, locator: &Locator) -> Result<String> {
        let path = self.resolve(locator)?;
        if !path.is_file() {
            return Err(Error::NotFound(locator.to_string()));
        }
        Ok(format!("file://{}", path.display()))
    }

    fn remove(&mut self, locator: &Locator) -> Result<()> {
        let path = self.resolve(locator)?;
        if !path.is_file() {
            return Err(Error::NotFound(locator.to_string()));
        }
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
