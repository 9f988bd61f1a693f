//! ファイル名分類の性質テスト
//!
//! 公開APIのみを使い、命名規則全体にわたる性質を検証

use substation_intake_common::{
    is_valid_file_type, is_valid_naming_format, parse_image_filename, validate_batch, Category,
    FileKind, RejectionReason, TaxonomyTable, UploadCandidate,
};

fn allowed_extension(category: Category) -> &'static str {
    if category == Category::TestSheet {
        ".pdf"
    } else {
        ".jpg"
    }
}

/// 全ての登録済み組み合わせが対応カテゴリに分類される
#[test]
fn test_every_entry_classifies() {
    for entry in TaxonomyTable::builtin().entries() {
        let name = format!(
            "{}_{}_site_20240101_01{}",
            entry.prefix,
            entry.shortform,
            allowed_extension(entry.category)
        );
        let parsed = parse_image_filename(&name);
        assert_eq!(parsed.category, entry.category, "{}", name);
        assert_eq!(parsed.prefix, entry.prefix);
        assert!(is_valid_naming_format(&name), "{}", name);
        assert!(is_valid_file_type(&name), "{}", name);
    }
}

/// 大文字小文字を変えても結果は同じ
#[test]
fn test_case_insensitive() {
    for name in ["vi_ptx_bay1_20240101_01.jpg", "ts_cbm_panel.pdf", "xx_unknown.png"] {
        let upper = name.to_uppercase();
        assert_eq!(parse_image_filename(name), parse_image_filename(&upper));
        assert_eq!(is_valid_file_type(name), is_valid_file_type(&upper));
    }
}

/// 解析は失敗しない（どんな入力でも結果を返す）
#[test]
fn test_parse_is_total() {
    for name in ["", "_", "__", ".jpg", "noext", "a_b_c_d_e_f_g.jpg", "日本語_名前.png"] {
        let parsed = parse_image_filename(name);
        if !is_valid_naming_format(name) {
            assert_eq!(parsed.category, Category::Uncategorized);
        }
    }
}

/// ファイル種別の不一致
#[test]
fn test_kind_mismatch() {
    assert!(!is_valid_file_type("ts_cbm_panel.jpg"));
    assert!(!is_valid_file_type("vi_ptx_1.pdf"));
    assert!(is_valid_file_type("ts_cbm_panel.PDF"));
    assert!(is_valid_file_type("sc_transformer_1.TIFF"));
}

/// 一括検証: 受付と却下の合計は入力数と一致し、順序が保たれる
#[test]
fn test_batch_partition() {
    let candidates = vec![
        UploadCandidate::new("vi_ptx_1.jpg", "image/jpeg", 10),
        UploadCandidate::new("ts_cbm_1.jpg", "image/jpeg", 10),
        UploadCandidate::new("vi_ptx_1.jpg", "image/jpeg", 10),
        UploadCandidate::new("mi_oltt_1.png", "image/png", 10),
        UploadCandidate::new("sc_sf6_1.png", "image/png", 10),
    ];
    let existing = ["sc_sf6_1.png"];

    let outcome = validate_batch(&candidates, &existing);
    assert_eq!(outcome.accepted.len() + outcome.rejected.len(), candidates.len());

    let accepted: Vec<usize> = outcome.accepted.iter().map(|a| a.index).collect();
    assert_eq!(accepted, vec![0, 3]);
    assert_eq!(outcome.accepted[1].kind, FileKind::Image);

    let rejected: Vec<usize> = outcome.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![1, 2, 4]);
    assert!(matches!(
        outcome.rejected[0].reason,
        RejectionReason::FileKindMismatch { .. }
    ));
    assert!(matches!(outcome.rejected[1].reason, RejectionReason::DuplicateFilename(_)));
    assert!(matches!(outcome.rejected[2].reason, RejectionReason::DuplicateFilename(_)));
}

/// カスタム命名規則で分類が変わる
#[test]
fn test_custom_taxonomy() {
    use substation_intake_common::Classifier;

    let table = TaxonomyTable::from_json(
        r#"{"entries": [
            {"prefix": "ts", "shortform": "irscan", "category": "Test Sheet"},
            {"prefix": "vi", "shortform": "fence", "category": "Visual Defect"}
        ]}"#,
    )
    .unwrap();
    let classifier = Classifier::new(&table);

    assert!(classifier.is_valid_file_type("ts_irscan_a.pdf"));
    assert!(classifier.is_valid_file_type("vi_fence_a.jpg"));
    assert!(!classifier.is_valid_naming_format("vi_ptx_a.jpg"));
}
