//! Gallery index: the rendered media list of one album and adjacency lookups over it.
//!
//! Positions are dense and 0-based, assigned in server order every time the
//! contents are loaded. They double as the index, so a position is only
//! meaningful for the index that produced it.

use chrono::{DateTime, Utc};

use crate::api::{content_locator, thumbnail_locator, ContentData};

/// What kind of viewer element a media item needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type; anything other than `image/*` or `video/*` is not rendered.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.starts_with("image") {
            Some(MediaKind::Image)
        } else if content_type.starts_with("video") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Direction of a neighbour lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// One rendered gallery entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    pub position: usize,
    pub kind: MediaKind,
    /// Locator of the full-resolution asset.
    pub source: String,
    pub thumbnail: String,
    pub natural_width: f64,
    pub natural_height: f64,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub content_type: String,
    pub added: Option<DateTime<Utc>>,
}

impl MediaItem {
    /// Alt text for display, empty when unset.
    pub fn alt_text(&self) -> &str {
        self.alt.as_deref().unwrap_or_default()
    }

    pub fn caption_text(&self) -> &str {
        self.caption.as_deref().unwrap_or_default()
    }
}

/// The currently rendered media list of one album.
#[derive(Debug, Clone, Default)]
pub struct GalleryIndex {
    album_id: Option<String>,
    items: Vec<MediaItem>,
}

impl GalleryIndex {
    /// Build from items that already carry their positions.
    /// Positions are reassigned densely in the given order.
    pub fn new(album_id: Option<String>, items: Vec<MediaItem>) -> Self {
        let items = items
            .into_iter()
            .enumerate()
            .map(|(position, mut item)| {
                item.position = position;
                item
            })
            .collect();
        Self { album_id, items }
    }

    /// Build from an album contents response, skipping content types the lightbox can't show.
    pub fn from_contents(album_id: &str, contents: Vec<ContentData>) -> Self {
        let mut items = Vec::with_capacity(contents.len());

        for content in contents {
            let Some(kind) = MediaKind::from_content_type(&content.content_type) else {
                tracing::debug!(src = %content.src, content_type = %content.content_type, "Skipping unsupported content");
                continue;
            };
            items.push(MediaItem {
                position: items.len(),
                kind,
                source: content_locator(album_id, &content.src),
                thumbnail: thumbnail_locator(album_id, &content.src),
                natural_width: content.width,
                natural_height: content.height,
                alt: content.alt,
                caption: content.text,
                content_type: content.content_type,
                added: content.timestamp,
            });
        }

        Self {
            album_id: Some(album_id.to_string()),
            items,
        }
    }

    pub fn album_id(&self) -> Option<&str> {
        self.album_id.as_deref()
    }

    /// True iff a rendered item holds exactly this position.
    pub fn exists(&self, position: usize) -> bool {
        position < self.items.len()
    }

    /// The adjacent position in `direction`, if that item exists.
    pub fn neighbor(&self, position: usize, direction: Direction) -> Option<usize> {
        let candidate = match direction {
            Direction::Previous => position.checked_sub(1)?,
            Direction::Next => position.checked_add(1)?,
        };
        self.exists(candidate).then_some(candidate)
    }

    pub fn get(&self, position: usize) -> Option<&MediaItem> {
        self.items.get(position)
    }

    /// Position of the item whose asset lives at `source`.
    pub fn position_of(&self, source: &str) -> Option<usize> {
        self.items.iter().position(|item| item.source == source)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(src: &str, content_type: &str) -> ContentData {
        ContentData {
            content_type: content_type.to_string(),
            src: src.to_string(),
            alt: None,
            text: None,
            width: 800.0,
            height: 600.0,
            timestamp: None,
        }
    }

    fn index_of(n: usize) -> GalleryIndex {
        let contents = (0..n)
            .map(|i| content(&format!("{}.jpg", i), "image/jpeg"))
            .collect();
        GalleryIndex::from_contents("album", contents)
    }

    #[test]
    fn test_exists_matches_rendered_range() {
        for n in [0, 1, 2, 7] {
            let index = index_of(n);
            for p in 0..n + 3 {
                assert_eq!(index.exists(p), p < n, "n={} p={}", n, p);
            }
        }
    }

    #[test]
    fn test_neighbors() {
        let index = index_of(4);
        assert_eq!(index.neighbor(0, Direction::Previous), None);
        assert_eq!(index.neighbor(1, Direction::Previous), Some(0));
        assert_eq!(index.neighbor(2, Direction::Next), Some(3));
        assert_eq!(index.neighbor(3, Direction::Next), None);
        assert_eq!(index.neighbor(usize::MAX, Direction::Next), None);
        assert_eq!(index.neighbor(10, Direction::Previous), None);
    }

    #[test]
    fn test_single_item_has_no_neighbors() {
        let index = index_of(1);
        assert_eq!(index.neighbor(0, Direction::Previous), None);
        assert_eq!(index.neighbor(0, Direction::Next), None);
    }

    #[test]
    fn test_from_contents_assigns_dense_positions_and_kinds() {
        let contents = vec![
            content("a.jpg", "image/jpeg"),
            content("notes.txt", "text/plain"),
            content("b.mp4", "video/mp4"),
            content("c.png", "image/png"),
        ];
        let index = GalleryIndex::from_contents("summer", contents);

        assert_eq!(index.len(), 3);
        let positions: Vec<usize> = index.iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(index.get(1).unwrap().kind, MediaKind::Video);
        assert_eq!(index.get(1).unwrap().source, "albums/summer/contents/b.mp4");
        assert_eq!(
            index.get(2).unwrap().thumbnail,
            "albums/summer/contents/thumbnails/c.png"
        );
        assert_eq!(index.position_of("albums/summer/contents/c.png"), Some(2));
        assert_eq!(index.album_id(), Some("summer"));
    }

    #[test]
    fn test_rebuild_reassigns_positions() {
        let first = GalleryIndex::from_contents(
            "a",
            vec![content("x.jpg", "image/jpeg"), content("y.jpg", "image/jpeg")],
        );
        assert_eq!(first.position_of("albums/a/contents/y.jpg"), Some(1));

        // x.jpg deleted server-side: y.jpg now sits at position 0
        let second = GalleryIndex::from_contents("a", vec![content("y.jpg", "image/jpeg")]);
        assert_eq!(second.position_of("albums/a/contents/y.jpg"), Some(0));
        assert!(!second.exists(1));
    }

    #[test]
    fn test_new_renumbers_items() {
        let mut items: Vec<MediaItem> = index_of(3).iter().cloned().collect();
        items.remove(0);
        let index = GalleryIndex::new(None, items);
        assert_eq!(index.get(0).unwrap().source, "albums/album/contents/1.jpg");
        assert_eq!(index.get(1).unwrap().position, 1);
    }
}
