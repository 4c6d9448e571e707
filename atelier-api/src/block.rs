//! Content block types - the typed units a page is composed of.
//!
//! A block is an opaque payload from the layout engine's point of view: the
//! engine manipulates placement, never content. The `Block` struct carries
//! the identity and ordering fields shared by every variant; `BlockBody`
//! holds the type-specific payload as a discriminated union matching the
//! on-wire `type` tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a content block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub String);

impl BlockId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(format!("block-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Column count for a row or layout container (1 = full width).
///
/// Serialized as the bare number (`1`, `2`, `3`), matching the stored format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ColumnLayout {
    #[default]
    One = 1,
    Two = 2,
    Three = 3,
}

impl ColumnLayout {
    /// The number of column slots this layout provides.
    pub fn columns(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for ColumnLayout {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(format!("invalid column layout: {other}")),
        }
    }
}

impl From<ColumnLayout> for u8 {
    fn from(layout: ColumnLayout) -> Self {
        layout as u8
    }
}

/// Heading level, serialized as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::H1),
            2 => Ok(Self::H2),
            3 => Ok(Self::H3),
            other => Err(format!("invalid heading level: {other}")),
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level as u8
    }
}

/// Font weight, stored as the CSS numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontWeight {
    #[default]
    #[serde(rename = "400")]
    Regular,
    #[serde(rename = "500")]
    Medium,
    #[serde(rename = "700")]
    Bold,
}

/// Display size of a standalone image block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    Full,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Vertical spacing amount for spacer blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacerHeight {
    Small,
    Medium,
    Large,
}

/// Visual style of a divider block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerStyle {
    Solid,
    Dashed,
    Dotted,
}

/// Overlay placement for hero sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayPosition {
    BottomLeft,
    BottomRight,
    Center,
    None,
}

/// Named layout choice for gallery blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GalleryLayout {
    #[serde(rename = "1+2+3")]
    OneTwoThree,
    #[serde(rename = "grid")]
    Grid,
    #[serde(rename = "auto")]
    Auto,
}

/// Column width distribution for row containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Distribution {
    Equal,
    GoldenLeft,
    GoldenCenter,
    GoldenRight,
    Custom,
}

/// Grid template for layout-grid containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridTemplate {
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[serde(rename = "3x1")]
    ThreeByOne,
    #[serde(rename = "1x3")]
    OneByThree,
    #[serde(rename = "2x3")]
    TwoByThree,
    #[serde(rename = "auto")]
    Auto,
}

/// Width mode of the text column in a layout-config block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColumnWidth {
    Auto,
    Narrow,
    Wide,
}

/// One hosted image inside an image-bearing block.
///
/// The engine stores the URL opaquely; it never fetches or validates bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl ImageRef {
    /// Wrap a hosted URL with a fresh entry id.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: format!("img-{}", Uuid::new_v4()),
            url: url.into(),
            alt: None,
        }
    }
}

/// One row descriptor inside an image-grid block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageGridRow {
    pub id: String,
    pub columns: ColumnLayout,
    pub image_count: u32,
}

/// The `type` tag of a block, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Text,
    Heading,
    Image,
    Gallery,
    Spacer,
    Divider,
    HeroImage,
    HeroSection,
    #[serde(rename = "title-block")]
    Title,
    #[serde(rename = "metadata-block")]
    Metadata,
    LayoutConfig,
    LayoutRow,
    LayoutGrid,
    ImageRow,
    ImageGrid,
}

impl BlockKind {
    /// The on-wire tag string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Gallery => "gallery",
            Self::Spacer => "spacer",
            Self::Divider => "divider",
            Self::HeroImage => "hero-image",
            Self::HeroSection => "hero-section",
            Self::Title => "title-block",
            Self::Metadata => "metadata-block",
            Self::LayoutConfig => "layout-config",
            Self::LayoutRow => "layout-row",
            Self::LayoutGrid => "layout-grid",
            Self::ImageRow => "image-row",
            Self::ImageGrid => "image-grid",
        }
    }

    /// Container kinds hold nested blocks in their children.
    pub fn is_container(self) -> bool {
        matches!(self, Self::LayoutRow | Self::LayoutGrid)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed, independently editable unit of page content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub body: BlockBody,
}

/// Type-specific payload of a block, discriminated by the `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum BlockBody {
    /// Markdown text with optional styling.
    Text {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line_height: Option<f64>,
    },
    Heading {
        level: HeadingLevel,
        content: String,
    },
    Image {
        url: String,
        alt: String,
        caption: String,
        size: ImageSize,
        align: Align,
    },
    /// Multi-image set with a layout choice.
    Gallery {
        images: Vec<ImageRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layout: Option<GalleryLayout>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_layout: Option<ColumnLayout>,
    },
    Spacer {
        height: SpacerHeight,
    },
    Divider {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<DividerStyle>,
    },
    /// Full-width hero image.
    HeroImage {
        url: String,
        alt: String,
    },
    /// Unified hero: image plus title/author/email with overlay styling.
    HeroSection {
        url: String,
        alt: String,
        title: String,
        author: String,
        email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overlay_position: Option<OverlayPosition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overlay_opacity: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overlay_background: Option<String>,
    },
    /// Page title with author/email line.
    #[serde(rename = "title-block")]
    Title {
        title: String,
        author: String,
        email: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_font_size: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_font_weight: Option<FontWeight>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author_color: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email_color: Option<String>,
    },
    /// Author + email single line.
    #[serde(rename = "metadata-block")]
    Metadata {
        author: String,
        email: String,
    },
    /// Column layout and spacing for the surrounding page section.
    LayoutConfig {
        column_layout: ColumnLayout,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_column_width: Option<TextColumnWidth>,
    },
    /// Horizontal container holding nested blocks per column.
    LayoutRow {
        columns: ColumnLayout,
        children: Vec<Vec<Block>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        column_gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distribution: Option<Distribution>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_widths: Option<Vec<f64>>,
    },
    /// 2D grid container holding nested blocks per cell.
    LayoutGrid {
        template: GridTemplate,
        children: Vec<Vec<Block>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_cell_height: Option<f64>,
    },
    /// Single row of 1-3 images.
    ImageRow {
        images: Vec<ImageRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distribution: Option<Distribution>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f64>,
    },
    /// Multi-row image grid with per-row column counts.
    ImageGrid {
        images: Vec<ImageRef>,
        rows: Vec<ImageGridRow>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gap: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        aspect_ratio: Option<f64>,
    },
}

impl BlockBody {
    /// The discriminant of this payload.
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Heading { .. } => BlockKind::Heading,
            Self::Image { .. } => BlockKind::Image,
            Self::Gallery { .. } => BlockKind::Gallery,
            Self::Spacer { .. } => BlockKind::Spacer,
            Self::Divider { .. } => BlockKind::Divider,
            Self::HeroImage { .. } => BlockKind::HeroImage,
            Self::HeroSection { .. } => BlockKind::HeroSection,
            Self::Title { .. } => BlockKind::Title,
            Self::Metadata { .. } => BlockKind::Metadata,
            Self::LayoutConfig { .. } => BlockKind::LayoutConfig,
            Self::LayoutRow { .. } => BlockKind::LayoutRow,
            Self::LayoutGrid { .. } => BlockKind::LayoutGrid,
            Self::ImageRow { .. } => BlockKind::ImageRow,
            Self::ImageGrid { .. } => BlockKind::ImageGrid,
        }
    }

    /// Nested child block lists, if this is a container block.
    pub fn children(&self) -> Option<&[Vec<Block>]> {
        match self {
            Self::LayoutRow { children, .. } | Self::LayoutGrid { children, .. } => {
                Some(children)
            }
            _ => None,
        }
    }
}

impl Block {
    /// Create a block of the given kind with default field values and a
    /// fresh id. The `order` field starts at 0; mutation operations re-index
    /// the whole document after every change.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: BlockId::generate(),
            order: 0,
            body: default_body(kind),
        }
    }

    /// The block's `type` tag.
    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }
}

/// Default payload per kind. These defaults are the editor's "fresh block"
/// values and are part of the stored format's expectations.
fn default_body(kind: BlockKind) -> BlockBody {
    match kind {
        BlockKind::Text => BlockBody::Text {
            content: String::new(),
            font_size: Some(18.0),
            font_weight: Some(FontWeight::Regular),
            color: Some("#1b1d1f".to_owned()),
            line_height: Some(1.8),
        },
        BlockKind::Heading => BlockBody::Heading {
            level: HeadingLevel::H2,
            content: String::new(),
        },
        BlockKind::Image => BlockBody::Image {
            url: String::new(),
            alt: String::new(),
            caption: String::new(),
            size: ImageSize::Large,
            align: Align::Center,
        },
        BlockKind::Gallery => BlockBody::Gallery {
            images: Vec::new(),
            layout: Some(GalleryLayout::Auto),
            image_layout: Some(ColumnLayout::One),
        },
        BlockKind::Spacer => BlockBody::Spacer {
            height: SpacerHeight::Medium,
        },
        BlockKind::Divider => BlockBody::Divider {
            style: Some(DividerStyle::Solid),
        },
        BlockKind::HeroImage => BlockBody::HeroImage {
            url: String::new(),
            alt: String::new(),
        },
        BlockKind::HeroSection => BlockBody::HeroSection {
            url: String::new(),
            alt: String::new(),
            title: String::new(),
            author: String::new(),
            email: String::new(),
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
        BlockKind::Title => BlockBody::Title {
            title: String::new(),
            author: String::new(),
            email: String::new(),
            title_font_size: None,
            author_font_size: None,
            gap: None,
            title_font_weight: None,
            author_font_weight: None,
            email_font_weight: None,
            title_color: None,
            author_color: None,
            email_color: None,
        },
        BlockKind::Metadata => BlockBody::Metadata {
            author: String::new(),
            email: String::new(),
        },
        BlockKind::LayoutConfig => BlockBody::LayoutConfig {
            column_layout: ColumnLayout::Two,
            column_gap: Some(90.0),
            text_column_width: Some(TextColumnWidth::Auto),
        },
        BlockKind::LayoutRow => BlockBody::LayoutRow {
            columns: ColumnLayout::Two,
            children: vec![Vec::new(), Vec::new()],
            column_gap: Some(24.0),
            distribution: Some(Distribution::Equal),
            custom_widths: None,
        },
        BlockKind::LayoutGrid => BlockBody::LayoutGrid {
            template: GridTemplate::TwoByTwo,
            children: vec![Vec::new(), Vec::new(), Vec::new(), Vec::new()],
            gap: Some(16.0),
            min_cell_height: Some(200.0),
        },
        BlockKind::ImageRow => BlockBody::ImageRow {
            images: Vec::new(),
            distribution: Some(Distribution::Equal),
            image_height: Some(300.0),
            gap: Some(24.0),
        },
        BlockKind::ImageGrid => BlockBody::ImageGrid {
            images: Vec::new(),
            rows: Vec::new(),
            gap: Some(0.0),
            aspect_ratio: Some(2.0),
        },
    }
}

// =========================================================================
// Nesting validation
// =========================================================================

/// Maximum nesting depth allowed for container blocks.
pub const MAX_NESTING_DEPTH: usize = 3;

/// Violations reported by [`validate_tree`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("block tree exceeds maximum nesting depth of {max_depth} at {path}")]
    TooDeep { max_depth: usize, path: String },

    #[error("container block ({kind}) cannot be nested inside another container at {path}")]
    NestedContainer { kind: BlockKind, path: String },
}

/// Validate a block tree's structure: bounded depth, and no container block
/// nested inside another container.
pub fn validate_tree(blocks: &[Block], max_depth: usize) -> Result<(), TreeError> {
    fn check(block: &Block, depth: usize, path: &str, max_depth: usize) -> Result<(), TreeError> {
        if depth > max_depth {
            return Err(TreeError::TooDeep {
                max_depth,
                path: path.to_owned(),
            });
        }

        if depth > 1 && block.kind().is_container() {
            return Err(TreeError::NestedContainer {
                kind: block.kind(),
                path: path.to_owned(),
            });
        }

        if let Some(children) = block.body.children() {
            for (slot, column) in children.iter().enumerate() {
                for (idx, child) in column.iter().enumerate() {
                    let child_path = format!("{path}/{}[{slot}][{idx}]", block.kind());
                    check(child, depth + 1, &child_path, max_depth)?;
                }
            }
        }

        Ok(())
    }

    for (i, block) in blocks.iter().enumerate() {
        check(block, 1, &format!("root[{i}]"), max_depth)?;
    }

    Ok(())
}
