use crate::error::{IntakeError, Result};
use std::path::{Path, PathBuf};
use substation_intake_common::store::mime_for_file_name;
use substation_intake_common::{detect_file_kind, UploadFile};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub file_name: String,
    /// 拡張子から推定したMIMEタイプ
    pub mime_type: String,
}

impl ScannedFile {
    fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime_type = mime_for_file_name(&file_name).to_string();
        Self {
            path: path.to_path_buf(),
            file_name,
            mime_type,
        }
    }

    /// 本体を読み込んでアップロード用に変換
    pub fn read(&self) -> Result<UploadFile> {
        let bytes = std::fs::read(&self.path)?;
        Ok(UploadFile::new(self.file_name.clone(), self.mime_type.clone(), bytes))
    }
}

/// フォルダ内の画像・PDFを列挙する
///
/// 拡張子が画像/PDFでないファイルは対象外。隠しファイルも除外する。
pub fn scan_folder(folder: &Path, recursive: bool) -> Result<Vec<ScannedFile>> {
    if !folder.is_dir() {
        return Err(IntakeError::FolderNotFound(folder.display().to_string()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if detect_file_kind(&name).is_some() {
            files.push(ScannedFile::from_path(path));
        }
    }

    // ファイル名でソート
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(files)
}

/// ファイル・フォルダ混在の引数を展開する
///
/// 明示指定されたファイルは拡張子に関係なく候補に含める（検証で却下理由を出すため）。
pub fn collect_paths(paths: &[PathBuf], recursive: bool) -> Result<Vec<ScannedFile>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(scan_folder(path, recursive)?);
        } else if path.is_file() {
            files.push(ScannedFile::from_path(path));
        } else {
            return Err(IntakeError::FileNotFound(path.display().to_string()));
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"), false);
        assert!(matches!(result, Err(IntakeError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_extensions() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("vi_ptx_1.jpg")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.path().join("ts_cbm_1.PDF")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.path().join("sc_sf6_1.tiff")).unwrap().write_all(b"dummy").unwrap();
        File::create(dir.path().join("readme.txt")).unwrap().write_all(b"text").unwrap();
        File::create(dir.path().join(".hidden.jpg")).unwrap();

        let result = scan_folder(dir.path(), false).unwrap();
        let names: Vec<_> = result.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["sc_sf6_1.tiff", "ts_cbm_1.PDF", "vi_ptx_1.jpg"]);
        assert_eq!(result[1].mime_type, "application/pdf");
        assert_eq!(result[2].mime_type, "image/jpeg");
    }

    #[test]
    fn test_scan_folder_recursive() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bay1")).unwrap();
        File::create(dir.path().join("gen_logo.png")).unwrap();
        File::create(dir.path().join("bay1").join("vi_ptx_bay1.jpg")).unwrap();

        assert_eq!(scan_folder(dir.path(), false).unwrap().len(), 1);
        assert_eq!(scan_folder(dir.path(), true).unwrap().len(), 2);
    }

    #[test]
    fn test_collect_paths_explicit_file_kept() {
        let dir = tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        File::create(&notes).unwrap().write_all(b"x").unwrap();

        let files = collect_paths(&[notes], false).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].mime_type, "text/plain");

        let upload = files[0].read().unwrap();
        assert_eq!(upload.candidate.size, 1);
    }

    #[test]
    fn test_collect_paths_missing() {
        let result = collect_paths(&[PathBuf::from("/nonexistent/x.jpg")], false);
        assert!(matches!(result, Err(IntakeError::FileNotFound(_))));
    }
}
