//! Legacy content migration.
//!
//! Stored page content predates the block format in several shapes: a bare
//! markdown string, a project record with separate hero/description/gallery
//! fields, and an article object with a fixed six-slot gallery. Each is
//! adapted into a [`Document`] here, before the mutation engine ever sees
//! it. Migration never fails: unparseable content degrades to a single
//! text block or an empty document.

use atelier_api::{
    Block, BlockBody, BlockId, ColumnLayout, Document, FontWeight, GalleryLayout, ImageGridRow,
    ImageRef, OverlayPosition, DOCUMENT_VERSION,
};
use serde::Deserialize;

/// Parse stored content in any known shape.
///
/// JSON that deserializes into the document shape is passed through as-is;
/// anything else is treated as legacy markdown and wrapped in one text
/// block. Empty input yields an empty document.
pub fn parse_content(raw: &str) -> Document {
    if raw.trim().is_empty() {
        return Document::empty();
    }

    if let Ok(doc) = serde_json::from_str::<Document>(raw) {
        return doc;
    }

    tracing::debug!("content is not in block format, wrapping as markdown");
    Document {
        blocks: vec![text_block(raw, 0)],
        version: DOCUMENT_VERSION.to_owned(),
        row_config: None,
    }
}

/// Serialize a document to its canonical stored JSON.
pub fn serialize_content(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_default()
}

/// Adapt a legacy project record (markdown description + hosted gallery
/// URLs + hero fields) into a document.
///
/// The hero image and title/author/email combine into one hero-section
/// block when both are present; a hero image alone becomes a plain
/// hero-image block. The description becomes a text block and the gallery
/// an image-grid laid out 1/2/3-and-up.
pub fn parse_project_content(
    description: Option<&str>,
    gallery_images: &[String],
    hero_image: Option<&str>,
    title: Option<&str>,
    author: Option<&str>,
    email: Option<&str>,
) -> Document {
    // Already-migrated descriptions pass through untouched.
    if let Some(raw) = description {
        if let Ok(doc) = serde_json::from_str::<Document>(raw) {
            return doc;
        }
    }

    let mut blocks = Vec::new();

    let has_titles = [title, author, email].iter().any(|f| f.is_some_and(|s| !s.is_empty()));
    match hero_image {
        Some(url) if has_titles => {
            blocks.push(hero_section_block(url, title, author, email, blocks.len()));
        }
        Some(url) => {
            blocks.push(Block {
                id: BlockId::generate(),
                order: blocks.len() as u32,
                body: BlockBody::HeroImage {
                    url: url.to_owned(),
                    alt: String::new(),
                },
            });
        }
        None => {}
    }

    if let Some(raw) = description {
        if !raw.is_empty() {
            blocks.push(text_block(raw, blocks.len() as u32));
        }
    }

    let valid_images: Vec<&String> = gallery_images.iter().filter(|url| !url.is_empty()).collect();
    if !valid_images.is_empty() {
        blocks.push(image_grid_block(&valid_images, blocks.len() as u32));
    }

    Document {
        blocks,
        version: DOCUMENT_VERSION.to_owned(),
        row_config: None,
    }
}

/// The legacy article content object: optional intro text and a fixed
/// six-slot gallery.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyArticle {
    #[serde(default)]
    pub intro_text: Option<String>,
    #[serde(default)]
    pub gallery: Option<LegacyGallery>,
}

/// Fixed-slot gallery from the pre-block article format.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyGallery {
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub center_left: Option<String>,
    #[serde(default)]
    pub center_right: Option<String>,
    #[serde(default)]
    pub bottom_left: Option<String>,
    #[serde(default)]
    pub bottom_center: Option<String>,
    #[serde(default)]
    pub bottom_right: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
}

/// Adapt legacy article content JSON into a document. Content already in
/// block format passes through; the legacy intro/gallery fields become a
/// text block and a gallery block.
pub fn parse_article_content(raw: &str) -> Document {
    if raw.trim().is_empty() {
        return Document::empty();
    }

    if let Ok(doc) = serde_json::from_str::<Document>(raw) {
        if !doc.blocks.is_empty() {
            return doc;
        }
    }

    let legacy: LegacyArticle = match serde_json::from_str(raw) {
        Ok(legacy) => legacy,
        Err(err) => {
            tracing::warn!("unrecognized article content, wrapping as markdown: {err}");
            return parse_content(raw);
        }
    };

    let mut blocks = Vec::new();

    if let Some(intro) = legacy.intro_text.as_deref() {
        if !intro.is_empty() {
            blocks.push(text_block(intro, blocks.len() as u32));
        }
    }

    if let Some(gallery) = &legacy.gallery {
        let urls: Vec<&String> = [
            &gallery.main,
            &gallery.center_left,
            &gallery.center_right,
            &gallery.bottom_left,
            &gallery.bottom_center,
            &gallery.bottom_right,
        ]
        .into_iter()
        .filter_map(|slot| slot.as_ref())
        .filter(|url| !url.is_empty())
        .collect();

        if !urls.is_empty() {
            let layout = match gallery.layout.as_deref() {
                Some("grid") => GalleryLayout::Grid,
                Some("auto") => GalleryLayout::Auto,
                _ => GalleryLayout::OneTwoThree,
            };
            blocks.push(Block {
                id: BlockId::generate(),
                order: blocks.len() as u32,
                body: BlockBody::Gallery {
                    images: urls.iter().map(|url| ImageRef::new(url.as_str())).collect(),
                    layout: Some(layout),
                    image_layout: None,
                },
            });
        }
    }

    Document {
        blocks,
        version: DOCUMENT_VERSION.to_owned(),
        row_config: None,
    }
}

fn text_block(content: &str, order: u32) -> Block {
    Block {
        id: BlockId::generate(),
        order,
        body: BlockBody::Text {
            content: content.to_owned(),
            font_size: None,
            font_weight: None,
            color: None,
            line_height: None,
        },
    }
}

fn hero_section_block(
    url: &str,
    title: Option<&str>,
    author: Option<&str>,
    email: Option<&str>,
    order: usize,
) -> Block {
    Block {
        id: BlockId::generate(),
        order: order as u32,
        body: BlockBody::HeroSection {
            url: url.to_owned(),
            alt: String::new(),
            title: title.unwrap_or_default().to_owned(),
            author: author.unwrap_or_default().to_owned(),
            email: email.unwrap_or_default().to_owned(),
            title_font_size: Some(60.0),
            author_font_size: Some(14.0),
            gap: Some(24.0),
            title_font_weight: Some(FontWeight::Bold),
            author_font_weight: Some(FontWeight::Medium),
            email_font_weight: Some(FontWeight::Regular),
            title_color: Some("#1b1d1f".to_owned()),
            author_color: Some("#1b1d1f".to_owned()),
            email_color: Some("#7b828e".to_owned()),
            overlay_position: Some(OverlayPosition::BottomLeft),
            overlay_opacity: Some(0.8),
            overlay_background: Some("rgba(0, 0, 0, 0.3)".to_owned()),
        },
    }
}

/// Build an image-grid for migrated gallery URLs: one full-width row, one
/// 2-column row, then 3-column rows for whatever remains.
fn image_grid_block(urls: &[&String], order: u32) -> Block {
    let mut rows = Vec::new();
    let mut index = 0usize;

    let strategy = [
        (ColumnLayout::One, 1usize),
        (ColumnLayout::Two, 2),
        (ColumnLayout::Three, usize::MAX),
    ];
    for (columns, take) in strategy {
        if index >= urls.len() {
            break;
        }
        let count = take.min(urls.len() - index);
        rows.push(ImageGridRow {
            id: BlockId::generate().0,
            columns,
            image_count: count as u32,
        });
        index += count;
    }

    Block {
        id: BlockId::generate(),
        order,
        body: BlockBody::ImageGrid {
            images: urls.iter().map(|url| ImageRef::new(url.as_str())).collect(),
            rows,
            gap: Some(0.0),
            aspect_ratio: Some(2.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_api::BlockKind;

    #[test]
    fn test_empty_input_yields_empty_document() {
        assert_eq!(parse_content(""), Document::empty());
        assert_eq!(parse_content("   "), Document::empty());
    }

    #[test]
    fn test_markdown_wraps_in_text_block() {
        let doc = parse_content("# Heading\n\nSome *markdown*.");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::Text);
        match &doc.blocks[0].body {
            BlockBody::Text { content, font_size, .. } => {
                assert!(content.starts_with("# Heading"));
                assert_eq!(*font_size, None);
            }
            other => panic!("expected text block, got {other:?}"),
        }
    }

    #[test]
    fn test_block_json_passes_through() {
        let raw = r#"{"blocks":[{"id":"b1","order":0,"type":"spacer","height":"medium"}],"version":"1.0"}"#;
        let doc = parse_content(raw);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::Spacer);
    }

    #[test]
    fn test_round_trip_through_serialize() {
        let doc = parse_content("plain text");
        let json = serialize_content(&doc);
        assert_eq!(parse_content(&json), doc);
    }

    #[test]
    fn test_project_content_builds_hero_section() {
        let gallery = vec!["https://cdn.example/a.jpg".to_owned()];
        let doc = parse_project_content(
            Some("About the work"),
            &gallery,
            Some("https://cdn.example/hero.jpg"),
            Some("Knot Study"),
            Some("S. Lee"),
            Some("lee@example.com"),
        );

        assert_eq!(doc.blocks.len(), 3);
        assert_eq!(doc.blocks[0].kind(), BlockKind::HeroSection);
        assert_eq!(doc.blocks[1].kind(), BlockKind::Text);
        assert_eq!(doc.blocks[2].kind(), BlockKind::ImageGrid);
    }

    #[test]
    fn test_project_content_without_titles_uses_hero_image() {
        let doc = parse_project_content(
            None,
            &[],
            Some("https://cdn.example/hero.jpg"),
            None,
            None,
            None,
        );
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::HeroImage);
    }

    #[test]
    fn test_project_gallery_rows_follow_strategy() {
        let gallery: Vec<String> = (0..6)
            .map(|i| format!("https://cdn.example/{i}.jpg"))
            .collect();
        let doc = parse_project_content(None, &gallery, None, None, None, None);

        match &doc.blocks[0].body {
            BlockBody::ImageGrid { rows, images, .. } => {
                assert_eq!(images.len(), 6);
                let counts: Vec<u32> = rows.iter().map(|r| r.image_count).collect();
                assert_eq!(counts, vec![1, 2, 3]);
            }
            other => panic!("expected image grid, got {other:?}"),
        }
    }

    #[test]
    fn test_article_legacy_gallery() {
        let raw = r#"{
            "introText": "Opening remarks",
            "gallery": {
                "main": "https://cdn.example/m.jpg",
                "centerLeft": "https://cdn.example/cl.jpg",
                "bottomRight": ""
            }
        }"#;
        let doc = parse_article_content(raw);

        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].kind(), BlockKind::Text);
        match &doc.blocks[1].body {
            BlockBody::Gallery { images, layout, .. } => {
                assert_eq!(images.len(), 2);
                assert_eq!(*layout, Some(GalleryLayout::OneTwoThree));
            }
            other => panic!("expected gallery, got {other:?}"),
        }
    }

    #[test]
    fn test_article_block_format_passes_through() {
        let raw = r#"{"blocks":[{"id":"b1","order":0,"type":"divider"}],"version":"1.0"}"#;
        let doc = parse_article_content(raw);
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::Divider);
    }
}
