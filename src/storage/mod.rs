//! ディスク上のストア実装

mod disk;
mod records;

pub use disk::DiskFileStore;
pub use records::JsonMetadataStore;

/// パスに使えない文字を置き換える
fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}
