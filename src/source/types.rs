//! Read-only projections of the source's JSON payloads

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A category tag as the source reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceCategory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
}

/// One entry of a listing page
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceItemSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// The source's own slug, used to address the detail endpoint
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin_name: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Absolute thumbnail URL once resolved by the client
    #[serde(default)]
    pub thumb_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: Vec<SourceCategory>,
}

/// Full metadata of one item
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceItemDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapters: Vec<ChapterServer>,
}

impl SourceItemDetail {
    /// Chapters of the first chapter server, empty when there is none
    pub fn first_server_chapters(&self) -> &[SourceChapter] {
        self.chapters
            .first()
            .map(|server| server.server_data.as_slice())
            .unwrap_or(&[])
    }
}

/// A mirror ("server") carrying a full chapter list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChapterServer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub server_data: Vec<SourceChapter>,
}

/// One chapter reference inside an item detail
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceChapter {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter_name: String,
    #[serde(default)]
    pub chapter_title: Option<String>,
    /// Endpoint (usually absolute) returning the chapter's images
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter_api_data: String,
}

/// One image of a chapter
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceImage {
    #[serde(default)]
    pub image_page: u32,
    pub image_file: String,
}

/// Where a chapter's images live and in which order to read them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChapterImages {
    pub cdn_domain: String,
    pub chapter_path: String,
    pub images: Vec<SourceImage>,
}

// ===== Response envelopes =====

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SourceItemSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetailData {
    #[serde(default)]
    pub item: Option<SourceItemDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub domain_cdn: String,
    #[serde(default)]
    pub item: Option<ChapterItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChapterItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter_path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter_image: Vec<SourceImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tolerates_nulls() {
        let json = r#"{
            "_id": "1",
            "name": "One Piece",
            "slug": "one-piece",
            "origin_name": null,
            "status": "ongoing",
            "thumb_url": "one-piece.jpg",
            "category": null
        }"#;
        let item: SourceItemSummary = serde_json::from_str(json).unwrap();
        assert!(item.origin_name.is_empty());
        assert!(item.category.is_empty());
        assert_eq!(item.thumb_url.as_deref(), Some("one-piece.jpg"));
    }

    #[test]
    fn test_summary_null_name_and_slug_decode_empty() {
        let json = r#"[
            {"name": null, "slug": "ok"},
            {"name": "Missing slug"},
            {"name": "Good", "slug": "good"}
        ]"#;
        let items: Vec<SourceItemSummary> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "");
        assert_eq!(items[1].slug, "");
        assert_eq!(items[2].slug, "good");
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: Envelope<ListData> =
            serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        assert!(envelope.data.is_none());

        let envelope: Envelope<ListData> =
            serde_json::from_str(r#"{"status": "success", "data": {"items": null}}"#).unwrap();
        assert!(envelope.data.unwrap().items.is_empty());
    }

    #[test]
    fn test_first_server_chapters() {
        let json = r#"{
            "name": "X",
            "slug": "x",
            "chapters": [
                {"server_name": "Server #1", "server_data": [
                    {"chapter_name": "1", "chapter_title": "", "chapter_api_data": "https://a/1"},
                    {"chapter_name": "2", "chapter_title": null, "chapter_api_data": "https://a/2"}
                ]},
                {"server_name": "Server #2", "server_data": [
                    {"chapter_name": "99", "chapter_api_data": "https://b/99"}
                ]}
            ]
        }"#;
        let detail: SourceItemDetail = serde_json::from_str(json).unwrap();
        let names: Vec<_> = detail
            .first_server_chapters()
            .iter()
            .map(|c| c.chapter_name.as_str())
            .collect();
        assert_eq!(names, vec!["1", "2"]);
    }

    #[test]
    fn test_no_chapter_server() {
        let detail: SourceItemDetail =
            serde_json::from_str(r#"{"name": "X", "slug": "x", "chapters": null}"#).unwrap();
        assert!(detail.first_server_chapters().is_empty());
    }
}
