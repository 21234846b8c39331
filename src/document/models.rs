use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, collections::BTreeSet, path::Path};

use crate::ids::{DocumentId, FolderId};

/// Raw attachment row from the content store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttachmentRecord {
    pub id: DocumentId,
    pub folder_id: FolderId,
    pub title: String,
    pub file_path: String,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub menu_order: i32,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A document as handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub file_path: String,
    /// MIME type
    pub file_type: String,
    pub extension: String,
    pub file_size_bytes: u64,
    pub size_label: String,
    pub order: i32,
    pub thumbnail_url: Option<String>,
    pub url: String,
    pub source_folder_id: FolderId,
    pub uploaded_at: DateTime<Utc>,
}

impl From<AttachmentRecord> for Document {
    fn from(value: AttachmentRecord) -> Self {
        let AttachmentRecord {
            id,
            folder_id,
            title,
            file_path,
            mime_type,
            file_size,
            menu_order,
            url,
            thumbnail_url,
            created_at,
        } = value;

        let extension = Path::new(&file_path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();

        let file_type = match mime_type {
            Some(mime) if !mime.trim().is_empty() => mime,
            _ => guess_mime(&extension).to_string(),
        };

        let thumbnail_url = thumbnail_url
            .filter(|thumb| !thumb.is_empty())
            .or_else(|| file_type.starts_with("image/").then(|| url.clone()));

        let file_size_bytes = file_size.unwrap_or(0).max(0) as u64;

        Self {
            id,
            title,
            file_path,
            file_type,
            extension,
            file_size_bytes,
            size_label: size_label(file_size_bytes),
            order: menu_order,
            thumbnail_url,
            url,
            source_folder_id: folder_id,
            uploaded_at: created_at,
        }
    }
}

fn guess_mime(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

fn size_label(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{size:.1} {}", UNITS[unit])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    Date,
    Title,
    #[default]
    #[serde(alias = "menu_order")]
    Order,
    Id,
}

impl OrderBy {
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match self {
            OrderBy::Date => a.uploaded_at.cmp(&b.uploaded_at),
            OrderBy::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            OrderBy::Order => a.order.cmp(&b.order),
            OrderBy::Id => a.id.cmp(&b.id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Result cap. Serialized as an integer where `-1` means no cap.
/// Any other negative number is read as `-1` as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Limit {
    #[default]
    Unlimited,
    Max(usize),
}

impl Limit {
    pub fn is_zero(&self) -> bool {
        matches!(self, Limit::Max(0))
    }

    pub fn apply<T>(&self, items: &mut Vec<T>) {
        if let Limit::Max(max) = self {
            items.truncate(*max);
        }
    }

    /// Value for a SQL `LIMIT`, where NULL means no limit.
    pub fn as_sql(&self) -> Option<i64> {
        match self {
            Limit::Unlimited => None,
            Limit::Max(max) => Some(i64::try_from(*max).unwrap_or(i64::MAX)),
        }
    }
}

impl From<i64> for Limit {
    fn from(value: i64) -> Self {
        match usize::try_from(value) {
            Ok(max) => Limit::Max(max),
            Err(_) => Limit::Unlimited,
        }
    }
}

impl From<Limit> for i64 {
    fn from(value: Limit) -> Self {
        value.as_sql().unwrap_or(-1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub order_by: OrderBy,

    #[serde(alias = "order_direction")]
    pub order: OrderDirection,

    pub limit: Limit,

    pub exclude_folder_ids: BTreeSet<FolderId>,
}

/// Stable sort, documents comparing equal keep their current order.
pub fn sort_documents(documents: &mut [Document], order_by: OrderBy, order: OrderDirection) {
    documents.sort_by(|a, b| {
        let ordering = order_by.compare(a, b);
        match order {
            OrderDirection::Asc => ordering,
            OrderDirection::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: DocumentId, file_path: &str, mime: Option<&str>) -> AttachmentRecord {
        AttachmentRecord {
            id,
            folder_id: 1,
            title: format!("Doc {id}"),
            file_path: file_path.to_string(),
            mime_type: mime.map(str::to_string),
            file_size: Some(2048),
            menu_order: 0,
            url: format!("https://cdn.test/{file_path}"),
            thumbnail_url: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn derives_type_and_thumbnail() {
        let pdf = Document::from(record(1, "files/Report.PDF", None));
        assert_eq!("application/pdf", pdf.file_type);
        assert_eq!("pdf", pdf.extension);
        assert_eq!(None, pdf.thumbnail_url);
        assert_eq!("2.0 KB", pdf.size_label);

        let image = Document::from(record(2, "img/photo.png", Some("image/png")));
        assert_eq!(Some("https://cdn.test/img/photo.png".to_string()), image.thumbnail_url);

        let unknown = Document::from(record(3, "noext", Some("  ")));
        assert_eq!("application/octet-stream", unknown.file_type);
        assert_eq!("", unknown.extension);
    }

    #[test]
    fn stored_thumbnail_wins() {
        let mut rec = record(1, "img/photo.jpg", None);
        rec.thumbnail_url = Some("https://cdn.test/thumb.jpg".to_string());
        let doc = Document::from(rec);

        assert_eq!("image/jpeg", doc.file_type);
        assert_eq!(Some("https://cdn.test/thumb.jpg".to_string()), doc.thumbnail_url);
    }

    #[test]
    fn size_labels() {
        assert_eq!("0 B", size_label(0));
        assert_eq!("1023 B", size_label(1023));
        assert_eq!("1.5 KB", size_label(1536));
        assert_eq!("3.0 MB", size_label(3 * 1024 * 1024));
        assert_eq!("2.0 GB", size_label(2 * 1024 * 1024 * 1024));

        let mut rec = record(1, "a.txt", None);
        rec.file_size = Some(-20);
        assert_eq!(0, Document::from(rec).file_size_bytes);
    }

    #[test]
    fn limit_from_integers() {
        assert_eq!(Limit::Unlimited, Limit::from(-1));
        assert_eq!(Limit::Unlimited, Limit::from(-30));
        assert_eq!(Limit::Max(0), Limit::from(0));
        assert!(Limit::from(0).is_zero());
        assert_eq!(Limit::Max(5), Limit::from(5));
        assert_eq!(-1, i64::from(Limit::from(-7)));
        assert_eq!(None, Limit::Unlimited.as_sql());

        let mut items = vec![1, 2, 3];
        Limit::Max(2).apply(&mut items);
        assert_eq!(vec![1, 2], items);
        Limit::Unlimited.apply(&mut items);
        assert_eq!(vec![1, 2], items);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: QueryOptions = serde_json::from_str(
            r#"{ "order_by": "title", "order_direction": "DESC", "limit": -9, "exclude_folder_ids": [3] }"#,
        )
        .unwrap();

        assert_eq!(OrderBy::Title, options.order_by);
        assert_eq!(OrderDirection::Desc, options.order);
        assert_eq!(Limit::Unlimited, options.limit);
        assert!(options.exclude_folder_ids.contains(&3));

        let defaults: QueryOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(QueryOptions::default(), defaults);
    }

    #[test]
    fn sorting_is_stable() {
        let mut docs: Vec<Document> = [(1, "b"), (2, "A"), (3, "a"), (4, "c")]
            .into_iter()
            .map(|(id, title)| {
                let mut doc = Document::from(record(id, "x.pdf", None));
                doc.title = title.to_string();
                doc
            })
            .collect();

        sort_documents(&mut docs, OrderBy::Title, OrderDirection::Asc);
        assert_eq!(vec![2, 3, 1, 4], docs.iter().map(|d| d.id).collect::<Vec<_>>());

        sort_documents(&mut docs, OrderBy::Title, OrderDirection::Desc);
        assert_eq!(vec![4, 1, 2, 3], docs.iter().map(|d| d.id).collect::<Vec<_>>());

        // All share one timestamp
        sort_documents(&mut docs, OrderBy::Date, OrderDirection::Desc);
        assert_eq!(vec![4, 1, 2, 3], docs.iter().map(|d| d.id).collect::<Vec<_>>());
    }

    #[test]
    fn titles_compare_by_code_point() {
        let mut docs: Vec<Document> = [(1, "éclair"), (2, "Zeta"), (3, "apple")]
            .into_iter()
            .map(|(id, title)| {
                let mut doc = Document::from(record(id, "x.pdf", None));
                doc.title = title.to_string();
                doc
            })
            .collect();

        sort_documents(&mut docs, OrderBy::Title, OrderDirection::Asc);

        assert_eq!(vec![3, 2, 1], docs.iter().map(|d| d.id).collect::<Vec<_>>());
    }
}
