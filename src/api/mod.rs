//! Album server collaborator: wire types, locators and the content API seam.

pub mod client;
pub mod session;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

pub use client::HttpContentApi;
pub use session::Session;

/// Album entry as returned by `GET albums/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSummary {
    pub id: String,
    pub name: String,
}

/// One stored content item as returned by `GET albums/{id}/contents/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentData {
    pub content_type: String,
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, deserialize_with = "deserialize_timestamp", skip_serializing)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of the properties update sent by the edit panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPatch<'a> {
    pub alt: &'a str,
    pub text: &'a str,
}

/// The server writes `Instant`s either as RFC 3339 text or as fractional epoch seconds.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Seconds(f64),
    }

    let raw = Option::<Raw>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(Raw::Seconds(secs)) if secs.is_finite() => {
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1e9).round() as u32;
            Utc.timestamp_opt(whole, nanos.min(999_999_999)).single()
        }
        _ => None,
    })
}

/// Locator of an album's content listing.
pub fn contents_locator(album_id: &str) -> String {
    format!("albums/{}/contents/", album_id)
}

/// Locator of a full-resolution asset.
pub fn content_locator(album_id: &str, src: &str) -> String {
    format!("albums/{}/contents/{}", album_id, src)
}

/// Locator of an asset's thumbnail.
pub fn thumbnail_locator(album_id: &str, src: &str) -> String {
    format!("albums/{}/contents/thumbnails/{}", album_id, src)
}

/// Suggested file name for a download: everything after the last `/`.
pub fn download_filename(locator: &str) -> &str {
    match locator.rfind('/') {
        Some(idx) => &locator[idx + 1..],
        None => locator,
    }
}

/// Requests the lightbox issues against the album server.
///
/// Implementations are called from background threads, never from the UI loop.
pub trait ContentApi: Send + Sync {
    /// List the albums visible to the session.
    fn list_albums(&self) -> Result<Vec<AlbumSummary>>;

    /// List an album's contents in server order.
    fn list_contents(&self, album_id: &str) -> Result<Vec<ContentData>>;

    /// Update alt text and caption of the item at `locator`.
    fn update_content(&self, locator: &str, alt: &str, text: &str) -> Result<()>;

    /// Remove the item at `locator`.
    fn delete_content(&self, locator: &str) -> Result<()>;

    /// Fetch the raw bytes behind `locator`.
    fn fetch_content(&self, locator: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_data_from_server_json() {
        let json = r#"[
            {"contentType":"image/jpeg","src":"beach.jpg","alt":"Beach","text":null,
             "width":1600,"height":900,"timestamp":"2024-06-01T12:30:00Z"},
            {"contentType":"video/mp4","src":"clip.mp4","width":1920,"height":1080,
             "timestamp":1717245000.5}
        ]"#;
        let contents: Vec<ContentData> = serde_json::from_str(json).unwrap();

        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].alt.as_deref(), Some("Beach"));
        assert_eq!(contents[0].text, None);
        assert_eq!(contents[0].width, 1600.0);
        assert_eq!(
            contents[0].timestamp.map(|t| t.to_rfc3339()),
            Some("2024-06-01T12:30:00+00:00".to_string())
        );
        let added = contents[1].timestamp.unwrap();
        assert_eq!(added.timestamp(), 1_717_245_000);
        assert_eq!(added.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_unparseable_timestamp_is_dropped() {
        let json = r#"{"contentType":"image/png","src":"a.png","width":1,"height":1,"timestamp":"yesterday"}"#;
        let content: ContentData = serde_json::from_str(json).unwrap();
        assert!(content.timestamp.is_none());
    }

    #[test]
    fn test_locators() {
        assert_eq!(contents_locator("summer"), "albums/summer/contents/");
        assert_eq!(content_locator("summer", "a.jpg"), "albums/summer/contents/a.jpg");
        assert_eq!(
            thumbnail_locator("summer", "a.jpg"),
            "albums/summer/contents/thumbnails/a.jpg"
        );
    }

    #[test]
    fn test_download_filename_is_trailing_segment() {
        assert_eq!(download_filename("albums/summer/contents/a.jpg"), "a.jpg");
        assert_eq!(download_filename("a.jpg"), "a.jpg");
        assert_eq!(download_filename("albums/summer/"), "");
    }

    #[test]
    fn test_patch_body_field_names() {
        let body = serde_json::to_value(ContentPatch { alt: "Sunset", text: "Day two" }).unwrap();
        assert_eq!(body, serde_json::json!({"alt": "Sunset", "text": "Day two"}));
    }
}
