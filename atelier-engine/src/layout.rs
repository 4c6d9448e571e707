//! Deterministic image layout calculator.
//!
//! Maps an image count to a grid of rows, each row a list of column-width
//! percentages summing to 100. Counts 1 through 9 use fixed presets that
//! encode the site's visual design; larger counts fall back to a greedy
//! packing with a full-width lead row.

use serde::{Deserialize, Serialize};

/// One row of column widths, in percent. Thirds are written 33.33/33.33/33.34
/// so the row sums to exactly 100.
pub type LayoutRow = Vec<f64>;

fn full() -> LayoutRow {
    vec![100.0]
}

fn halves() -> LayoutRow {
    vec![50.0, 50.0]
}

fn thirds() -> LayoutRow {
    vec![33.33, 33.33, 33.34]
}

/// Calculate the grid layout for `count` images.
pub fn calculate_layout(count: usize) -> Vec<LayoutRow> {
    match count {
        0 => Vec::new(),
        1 => vec![full()],
        2 => vec![halves()],
        3 => vec![full(), halves()],
        4 => vec![halves(), halves()],
        5 => vec![full(), halves(), halves()],
        6 => vec![full(), halves(), thirds()],
        7 => vec![full(), halves(), halves(), halves()],
        8 => vec![full(), halves(), thirds(), halves()],
        9 => vec![full(), halves(), thirds(), thirds()],
        _ => dynamic_layout(count),
    }
}

/// Layout for 10+ images: a full-width first row, then greedy packing into
/// 3-column rows while at least 3 remain, a 2-column row for a pair, and a
/// final full-width row for a single leftover.
fn dynamic_layout(count: usize) -> Vec<LayoutRow> {
    let mut layout = vec![full()];
    let mut remaining = count - 1;

    while remaining > 0 {
        if remaining >= 3 {
            layout.push(thirds());
            remaining -= 3;
        } else if remaining == 2 {
            layout.push(halves());
            remaining -= 2;
        } else {
            layout.push(full());
            remaining -= 1;
        }
    }

    layout
}

/// Walk a layout and assign image indices (0-based, consumed in order) to
/// each row. Rows beyond the image count are dropped; a partially filled
/// final row keeps only the indices that exist.
pub fn distribute_images(count: usize, layout: &[LayoutRow]) -> Vec<Vec<usize>> {
    let mut result = Vec::new();
    let mut index = 0usize;

    for row in layout {
        let mut row_images = Vec::with_capacity(row.len());
        for _ in 0..row.len() {
            if index >= count {
                break;
            }
            row_images.push(index);
            index += 1;
        }
        if !row_images.is_empty() {
            result.push(row_images);
        }
    }

    result
}

/// Named layout presets selectable in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutPreset {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "1col")]
    OneColumn,
    #[serde(rename = "2col")]
    TwoColumn,
    #[serde(rename = "3col")]
    ThreeColumn,
    #[serde(rename = "1+2")]
    HeroPairs,
    #[serde(rename = "1+2+3")]
    OneTwoThree,
}

/// Resolve a preset to a concrete layout for `count` images.
pub fn layout_from_preset(preset: LayoutPreset, count: usize) -> Vec<LayoutRow> {
    if count == 0 {
        return Vec::new();
    }

    match preset {
        LayoutPreset::Auto => calculate_layout(count),
        LayoutPreset::OneColumn => (0..count).map(|_| full()).collect(),
        LayoutPreset::TwoColumn => {
            let mut rows = Vec::new();
            let mut i = 0;
            while i < count {
                if i + 1 < count {
                    rows.push(halves());
                } else {
                    rows.push(full());
                }
                i += 2;
            }
            rows
        }
        LayoutPreset::ThreeColumn => {
            let mut rows = Vec::new();
            let mut i = 0;
            while i < count {
                match count - i {
                    r if r >= 3 => rows.push(thirds()),
                    2 => rows.push(halves()),
                    _ => rows.push(full()),
                }
                i += 3;
            }
            rows
        }
        LayoutPreset::HeroPairs => {
            let mut rows = vec![full()];
            let mut remaining = count - 1;
            while remaining > 0 {
                if remaining >= 2 {
                    rows.push(halves());
                    remaining -= 2;
                } else {
                    rows.push(full());
                    remaining -= 1;
                }
            }
            rows
        }
        LayoutPreset::OneTwoThree => {
            let mut rows = vec![full()];
            let mut remaining = count - 1;
            if remaining >= 2 {
                rows.push(halves());
                remaining -= 2;
            } else if remaining == 1 {
                rows.push(full());
                remaining -= 1;
            }
            while remaining > 0 {
                if remaining >= 3 {
                    rows.push(thirds());
                    remaining -= 3;
                } else if remaining == 2 {
                    rows.push(halves());
                    remaining -= 2;
                } else {
                    rows.push(full());
                    remaining -= 1;
                }
            }
            rows
        }
    }
}
