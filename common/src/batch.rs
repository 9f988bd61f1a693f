//! 複数ファイルの一括検証
//!
//! アップロード候補を入力順に検証し、受理と却下に振り分ける。
//! 1件の却下が他の候補の判定に影響することはない。

use crate::category::Category;
use crate::classifier::{detect_file_kind, Classifier, DuplicateScope, ParsedFilename, RejectionReason};
use crate::taxonomy::FileKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// アップロード候補（ファイル名と申告MIMEタイプのみ参照する）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadCandidate {
    pub file_name: String,
    /// ブラウザ等が申告したMIMEタイプ（不明なら空）
    pub mime_type: String,
    pub size: u64,
}

impl UploadCandidate {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// 受理された候補
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedCandidate {
    /// 入力列での位置
    pub index: usize,
    pub candidate: UploadCandidate,
    pub parsed: ParsedFilename,
    pub kind: FileKind,
}

/// 却下された候補と理由
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedCandidate {
    /// 入力列での位置
    pub index: usize,
    pub candidate: UploadCandidate,
    pub reason: RejectionReason,
}

/// 一括検証の結果（どちらも入力順）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub accepted: Vec<AcceptedCandidate>,
    pub rejected: Vec<RejectedCandidate>,
}

impl BatchOutcome {
    pub fn is_all_accepted(&self) -> bool {
        self.rejected.is_empty()
    }

    /// "ファイル名 - 理由" 形式の一覧
    pub fn rejection_lines(&self) -> Vec<String> {
        self.rejected
            .iter()
            .map(|r| format!("{} - {}", r.candidate.file_name, r.reason))
            .collect()
    }
}

/// 呼び出し側の受付方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// 命名規則に無い組み合わせも `Uncategorized` として受け付ける
    pub allow_uncategorized: bool,
}

/// 申告MIMEタイプが画像またはPDFか（空は拡張子に任せる）
fn is_supported_mime(mime_type: &str) -> bool {
    let mime = mime_type.trim().to_lowercase();
    mime.is_empty() || mime.starts_with("image/") || mime == "application/pdf"
}

impl<'t> Classifier<'t> {
    /// 候補を一括検証する
    ///
    /// 判定順: MIMEタイプ → 命名規則・ファイル種別 → 登録済みとの重複 → バッチ内の重複。
    /// 重複判定は大文字小文字を区別しない。バッチ内の重複は先に受理された候補とのみ比較する。
    pub fn validate_batch_with<S: AsRef<str>>(
        &self,
        policy: BatchPolicy,
        candidates: &[UploadCandidate],
        existing_filenames: &[S],
    ) -> BatchOutcome {
        let existing: HashSet<String> = existing_filenames
            .iter()
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        let mut seen_in_batch: HashSet<String> = HashSet::new();
        let mut outcome = BatchOutcome::default();

        for (index, candidate) in candidates.iter().enumerate() {
            match self.check_candidate(policy, candidate, &existing, &seen_in_batch) {
                Ok((parsed, kind)) => {
                    seen_in_batch.insert(candidate.file_name.to_lowercase());
                    outcome.accepted.push(AcceptedCandidate {
                        index,
                        candidate: candidate.clone(),
                        parsed,
                        kind,
                    });
                }
                Err(reason) => {
                    tracing::debug!("rejected {}: {}", candidate.file_name, reason);
                    outcome.rejected.push(RejectedCandidate {
                        index,
                        candidate: candidate.clone(),
                        reason,
                    });
                }
            }
        }

        outcome
    }

    /// 既定の方針で一括検証する
    pub fn validate_batch<S: AsRef<str>>(
        &self,
        candidates: &[UploadCandidate],
        existing_filenames: &[S],
    ) -> BatchOutcome {
        self.validate_batch_with(BatchPolicy::default(), candidates, existing_filenames)
    }

    fn check_candidate(
        &self,
        policy: BatchPolicy,
        candidate: &UploadCandidate,
        existing: &HashSet<String>,
        seen_in_batch: &HashSet<String>,
    ) -> Result<(ParsedFilename, FileKind), RejectionReason> {
        if !is_supported_mime(&candidate.mime_type) {
            return Err(RejectionReason::UnsupportedMimeType(candidate.mime_type.clone()));
        }

        let (parsed, kind) = match self.check_file_type(&candidate.file_name) {
            Ok(ok) => ok,
            Err(RejectionReason::UnknownCategory { .. }) if policy.allow_uncategorized => {
                let parsed = self.parse_image_filename(&candidate.file_name);
                debug_assert_eq!(parsed.category, Category::Uncategorized);
                // check_file_type は拡張子を先に確認済み
                let kind = detect_file_kind(&candidate.file_name).unwrap_or(FileKind::Image);
                (parsed, kind)
            }
            Err(reason) => return Err(reason),
        };

        let key = candidate.file_name.to_lowercase();
        if existing.contains(&key) {
            return Err(RejectionReason::DuplicateFilename(DuplicateScope::Existing));
        }
        if seen_in_batch.contains(&key) {
            return Err(RejectionReason::DuplicateFilename(DuplicateScope::Batch));
        }

        Ok((parsed, kind))
    }
}

/// 組み込みテーブル・既定方針で一括検証
pub fn validate_batch<S: AsRef<str>>(
    candidates: &[UploadCandidate],
    existing_filenames: &[S],
) -> BatchOutcome {
    Classifier::default().validate_batch(candidates, existing_filenames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MalformedName;

    const NONE: &[&str] = &[];

    fn jpg(name: &str) -> UploadCandidate {
        UploadCandidate::new(name, "image/jpeg", 1024)
    }

    fn pdf(name: &str) -> UploadCandidate {
        UploadCandidate::new(name, "application/pdf", 2048)
    }

    fn accepted_names(outcome: &BatchOutcome) -> Vec<&str> {
        outcome.accepted.iter().map(|a| a.candidate.file_name.as_str()).collect()
    }

    fn rejected_names(outcome: &BatchOutcome) -> Vec<&str> {
        outcome.rejected.iter().map(|r| r.candidate.file_name.as_str()).collect()
    }

    #[test]
    fn test_all_valid() {
        let candidates = vec![jpg("vi_switchgear_a.jpg"), pdf("ts_cbm_test.pdf")];
        let outcome = validate_batch(&candidates, NONE);

        assert!(outcome.is_all_accepted());
        assert_eq!(outcome.accepted[0].parsed.category, Category::VisualDefect);
        assert_eq!(outcome.accepted[1].kind, FileKind::Document);
    }

    #[test]
    fn test_duplicate_in_batch_case_insensitive() {
        let candidates = vec![jpg("VI_Switchgear_A.jpg"), jpg("vi_switchgear_a.jpg")];
        let outcome = validate_batch(&candidates, NONE);

        assert_eq!(accepted_names(&outcome), vec!["VI_Switchgear_A.jpg"]);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].candidate.file_name, "vi_switchgear_a.jpg");
        assert_eq!(
            outcome.rejected[0].reason,
            RejectionReason::DuplicateFilename(DuplicateScope::Batch)
        );
    }

    #[test]
    fn test_duplicate_of_existing() {
        let existing = vec!["SC_Battery_bay1.jpg".to_string()];
        let candidates = vec![jpg("sc_battery_BAY1.jpg"), jpg("sc_battery_bay2.jpg")];
        let outcome = validate_batch(&candidates, &existing);

        assert_eq!(accepted_names(&outcome), vec!["sc_battery_bay2.jpg"]);
        assert_eq!(
            outcome.rejected[0].reason,
            RejectionReason::DuplicateFilename(DuplicateScope::Existing)
        );
    }

    #[test]
    fn test_rejected_candidate_does_not_block_batch_name() {
        // 先行候補が却下された場合、同名の後続候補は重複扱いにならない
        let candidates = vec![
            UploadCandidate::new("vi_ptx.jpg", "text/plain", 10),
            jpg("vi_ptx.jpg"),
        ];
        let outcome = validate_batch(&candidates, NONE);

        assert_eq!(accepted_names(&outcome), vec!["vi_ptx.jpg"]);
        assert_eq!(
            outcome.rejected[0].reason,
            RejectionReason::UnsupportedMimeType("text/plain".into())
        );
    }

    #[test]
    fn test_each_rejection_has_specific_reason() {
        let candidates = vec![
            jpg("randomfile.jpg"),
            jpg("xx_panel.jpg"),
            jpg("ts_cbm_test.jpg"),
            pdf("vi_switchgear_site1.pdf"),
            UploadCandidate::new("vi_ptx.docx", "", 1),
        ];
        let outcome = validate_batch(&candidates, NONE);

        assert!(outcome.accepted.is_empty());
        let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(reasons[0], RejectionReason::MalformedName(MalformedName::TooFewTokens));
        assert!(matches!(reasons[1], RejectionReason::UnknownCategory { .. }));
        assert!(matches!(
            reasons[2],
            RejectionReason::FileKindMismatch { category: Category::TestSheet, .. }
        ));
        assert!(matches!(
            reasons[3],
            RejectionReason::FileKindMismatch { category: Category::VisualDefect, .. }
        ));
        assert_eq!(
            reasons[4],
            RejectionReason::MalformedName(MalformedName::UnrecognizedExtension)
        );
    }

    #[test]
    fn test_order_stability() {
        let candidates = vec![
            jpg("sc_lvdb_a.jpg"),
            jpg("stk_normal_b.jpg"),
            jpg("ts_vitest_c.jpg"),
            jpg("mi_oltt_d.jpg"),
            jpg("gen_logo_e.jpg"),
        ];
        let outcome = validate_batch(&candidates, NONE);

        assert_eq!(
            accepted_names(&outcome),
            vec!["sc_lvdb_a.jpg", "stk_normal_b.jpg", "mi_oltt_d.jpg", "gen_logo_e.jpg"]
        );
        assert_eq!(rejected_names(&outcome), vec!["ts_vitest_c.jpg"]);

        // 却下対象を除いたバッチと同じ分類結果になる
        let without_rejected: Vec<_> = candidates
            .iter()
            .filter(|c| c.file_name != "ts_vitest_c.jpg")
            .cloned()
            .collect();
        let reference = validate_batch(&without_rejected, NONE);
        let strip = |o: &BatchOutcome| -> Vec<(UploadCandidate, ParsedFilename)> {
            o.accepted.iter().map(|a| (a.candidate.clone(), a.parsed.clone())).collect()
        };
        assert_eq!(strip(&reference), strip(&outcome));
        assert_eq!(outcome.rejected[0].index, 2);
    }

    #[test]
    fn test_mime_checks() {
        let candidates = vec![
            UploadCandidate::new("vi_ptx_1.jpg", "", 1),
            UploadCandidate::new("vi_ptx_2.tif", "IMAGE/TIFF", 1),
            UploadCandidate::new("vi_ptx_3.jpg", "video/mp4", 1),
        ];
        let outcome = validate_batch(&candidates, NONE);

        assert_eq!(accepted_names(&outcome), vec!["vi_ptx_1.jpg", "vi_ptx_2.tif"]);
        assert_eq!(rejected_names(&outcome), vec!["vi_ptx_3.jpg"]);
    }

    #[test]
    fn test_allow_uncategorized_policy() {
        let classifier = Classifier::default();
        let policy = BatchPolicy { allow_uncategorized: true };
        let candidates = vec![
            jpg("site_walkdown_1.jpg"),
            pdf("misc_report.pdf"),
            jpg("randomfile.jpg"),
            jpg("ts_cbm.jpg"),
        ];
        let outcome = classifier.validate_batch_with(policy, &candidates, NONE);

        assert_eq!(accepted_names(&outcome), vec!["site_walkdown_1.jpg", "misc_report.pdf"]);
        assert_eq!(outcome.accepted[0].parsed.category, Category::Uncategorized);
        assert_eq!(outcome.accepted[1].kind, FileKind::Document);
        // 命名不備とカテゴリ違反は方針に関係なく却下
        assert_eq!(rejected_names(&outcome), vec!["randomfile.jpg", "ts_cbm.jpg"]);
    }

    #[test]
    fn test_rejection_lines() {
        let outcome = validate_batch(&[jpg("ts_cbm.jpg")], NONE);
        assert_eq!(
            outcome.rejection_lines(),
            vec!["ts_cbm.jpg - Test Sheet files must be PDF documents, got an image".to_string()]
        );
    }
}
