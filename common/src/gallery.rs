//! ギャラリー表示用の絞り込み・グループ化

use crate::category::Category;
use crate::record::ImageRecord;
use serde::{Deserialize, Serialize};

/// ギャラリーの絞り込み条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryFilter {
    /// `None` は全カテゴリ
    pub category: Option<Category>,
    /// ファイル名・item type・location・日付・連番の部分一致（大文字小文字を区別しない）
    pub search: Option<String>,
}

impl GalleryFilter {
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn matches(&self, record: &ImageRecord) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }

        let needle = match self.search.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };

        [
            &record.filename,
            &record.item_type,
            &record.location,
            &record.date_taken,
            &record.sequence,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// 条件に合うレコード（順序は維持）
pub fn filter_records<'a>(records: &'a [ImageRecord], filter: &GalleryFilter) -> Vec<&'a ImageRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

/// カテゴリ別にグループ化
///
/// `Category::ALL` の順、最後に `Uncategorized`。空のグループは含めない。
pub fn group_by_category<'a, I>(records: I) -> Vec<(Category, Vec<&'a ImageRecord>)>
where
    I: IntoIterator<Item = &'a ImageRecord>,
{
    let records: Vec<&ImageRecord> = records.into_iter().collect();
    Category::with_fallback()
        .filter_map(|category| {
            let group: Vec<&ImageRecord> = records
                .iter()
                .copied()
                .filter(|r| r.category == category)
                .collect();
            (!group.is_empty()).then_some((category, group))
        })
        .collect()
}

/// カテゴリ別件数
///
/// 6つの業務カテゴリは0件でも含める。`Uncategorized` は1件以上のときのみ末尾に付く。
pub fn category_counts(records: &[ImageRecord]) -> Vec<(Category, usize)> {
    let count = |category: Category| records.iter().filter(|r| r.category == category).count();

    let mut counts: Vec<(Category, usize)> = Category::ALL.iter().map(|c| (*c, count(*c))).collect();
    let uncategorized = count(Category::Uncategorized);
    if uncategorized > 0 {
        counts.push((Category::Uncategorized, uncategorized));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::parse_image_filename;
    use crate::record::NewImageRecord;
    use crate::store::{Locator, OwnerId};
    use chrono::Utc;

    fn record(name: &str) -> ImageRecord {
        NewImageRecord::from_parsed(
            name,
            parse_image_filename(name),
            Locator::new(name),
            1,
            "image/jpeg",
            OwnerId::new("o"),
        )
        .into_record(format!("id-{}", name), Utc::now())
    }

    fn sample() -> Vec<ImageRecord> {
        vec![
            record("vi_ptx_bayA_20240101_01.jpg"),
            record("sc_transformer_bayB_20240102_01.jpg"),
            record("randomfile.jpg"),
            record("vi_earthing_bayB_20240103_02.jpg"),
            record("ts_cbm_bayA.pdf"),
        ]
    }

    #[test]
    fn test_filter_by_category() {
        let records = sample();
        let filter = GalleryFilter::default().category(Category::VisualDefect);
        let names: Vec<_> = filter_records(&records, &filter).iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["vi_ptx_bayA_20240101_01.jpg", "vi_earthing_bayB_20240103_02.jpg"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let records = sample();
        let filter = GalleryFilter::default().search("BAYB");
        assert_eq!(filter_records(&records, &filter).len(), 2);

        let by_date = GalleryFilter::default().search("20240101");
        assert_eq!(filter_records(&records, &by_date).len(), 1);

        let combined = GalleryFilter::default().category(Category::VisualDefect).search("bayb");
        assert_eq!(filter_records(&records, &combined).len(), 1);
    }

    #[test]
    fn test_blank_search_matches_all() {
        let records = sample();
        let filter = GalleryFilter::default().search("   ");
        assert_eq!(filter_records(&records, &filter).len(), records.len());
    }

    #[test]
    fn test_group_order() {
        let records = sample();
        let groups = group_by_category(&records);
        let order: Vec<Category> = groups.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                Category::SubstationCondition,
                Category::VisualDefect,
                Category::TestSheet,
                Category::Uncategorized,
            ]
        );

        let (_, defects) = &groups[1];
        assert_eq!(defects[0].filename, "vi_ptx_bayA_20240101_01.jpg");
        assert_eq!(defects[1].filename, "vi_earthing_bayB_20240103_02.jpg");
    }

    #[test]
    fn test_category_counts() {
        let records = sample();
        let counts = category_counts(&records);
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[0], (Category::General, 0));
        assert_eq!(counts[3], (Category::VisualDefect, 2));
        assert_eq!(counts[6], (Category::Uncategorized, 1));

        let no_uncategorized = category_counts(&records[..2]);
        assert_eq!(no_uncategorized.len(), 6);
    }
}
