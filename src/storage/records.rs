use crate::error::{IntakeError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use substation_intake_common::{Category, ImageRecord, MetadataStore, NewImageRecord, OwnerId};

const RECORDS_FILE_NAME: &str = "records.json";

/// レコードファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordsFile {
    /// バージョン（互換性チェック用）
    version: u32,
    records: Vec<ImageRecord>,
}

impl Default for RecordsFile {
    fn default() -> Self {
        Self {
            version: JsonMetadataStore::CURRENT_VERSION,
            records: Vec::new(),
        }
    }
}

/// `<data_dir>/records.json` に保存するメタデータストア
#[derive(Debug, Clone)]
pub struct JsonMetadataStore {
    path: PathBuf,
    file: RecordsFile,
}

impl JsonMetadataStore {
    const CURRENT_VERSION: u32 = 1;

    /// 読み込み（ファイルが無ければ空で開始）
    pub fn open(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(RECORDS_FILE_NAME);
        if !path.exists() {
            return Ok(Self {
                path,
                file: RecordsFile::default(),
            });
        }

        let reader = BufReader::new(File::open(&path)?);
        let file: RecordsFile = serde_json::from_reader(reader)
            .map_err(|e| IntakeError::CorruptStore(format!("{}: {}", path.display(), e)))?;
        if file.version != Self::CURRENT_VERSION {
            return Err(IntakeError::CorruptStore(format!(
                "unsupported version {} in {}",
                file.version,
                path.display()
            )));
        }

        tracing::debug!("loaded {} record(s) from {}", file.records.len(), path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.file.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.records.is_empty()
    }

    /// 一時ファイルに書いてから置き換える
    fn write(&self, file: &RecordsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, file)?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// 書き込みに成功したときだけメモリ上の内容を差し替える
    fn commit(&mut self, records: Vec<ImageRecord>) -> Result<()> {
        let next = RecordsFile {
            version: self.file.version,
            records,
        };
        self.write(&next)?;
        self.file = next;
        Ok(())
    }

    fn next_id(&self, base: i64, offset: usize) -> String {
        let mut id = format!("img-{}-{}", base, offset);
        let mut bump = 0;
        while self.file.records.iter().any(|r| r.id == id) {
            bump += 1;
            id = format!("img-{}-{}-{}", base, offset, bump);
        }
        id
    }
}

impl MetadataStore for JsonMetadataStore {
    fn insert_many(&mut self, records: Vec<NewImageRecord>) -> substation_intake_common::Result<Vec<ImageRecord>> {
        let now = Utc::now();
        let base = now.timestamp_millis();

        let inserted: Vec<ImageRecord> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| record.into_record(self.next_id(base, i), now))
            .collect();

        let mut next = self.file.records.clone();
        next.extend(inserted.iter().cloned());
        self.commit(next)?;
        Ok(inserted)
    }

    fn list_by_owner(
        &self,
        owner: &OwnerId,
        category: Option<Category>,
    ) -> substation_intake_common::Result<Vec<ImageRecord>> {
        Ok(self
            .file
            .records
            .iter()
            .filter(|r| &r.uploaded_by == owner)
            .filter(|r| category.map_or(true, |c| r.category == c))
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> substation_intake_common::Result<ImageRecord> {
        self.file
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| substation_intake_common::Error::NotFound(id.to_string()))
    }

    fn delete_by_id(&mut self, id: &str) -> substation_intake_common::Result<ImageRecord> {
        let pos = self
            .file
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| substation_intake_common::Error::NotFound(id.to_string()))?;
        let mut next = self.file.records.clone();
        let removed = next.remove(pos);
        self.commit(next)?;
        Ok(removed)
    }

    fn delete_by_category(
        &mut self,
        owner: &OwnerId,
        category: Category,
    ) -> substation_intake_common::Result<usize> {
        let next: Vec<ImageRecord> = self
            .file
            .records
            .iter()
            .filter(|r| !(&r.uploaded_by == owner && r.category == category))
            .cloned()
            .collect();
        let removed = self.file.records.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
        }
        Ok(removed)
    }
}
