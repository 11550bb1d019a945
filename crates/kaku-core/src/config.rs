//! Connector configuration shared by every connector on a canvas.

use crate::arrowhead::DEFAULT_HEAD_LENGTH;
use crate::model::{ArrowHeadStyle, Color};
use serde::Deserialize;

// ─── Config ───────────────────────────────────────────────────────────────

/// Tunables for binding, heads, and styling.
///
/// Every field has a default, so hosts can deserialize a partial table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Max distance from an endpoint to a shape's outline for it to bind.
    /// Inclusive. Default: **20**.
    pub snap_threshold: f64,

    /// Distance from the tip to the raking points of a head. Default: **30**.
    pub head_length: f64,

    /// Shaft stroke; filled heads use it as their fill.
    pub stroke: Color,

    pub stroke_width: f64,

    /// Glow applied to shapes that would bind while dragging.
    pub highlight: HighlightConfig,

    pub start_head: ArrowHeadStyle,
    pub end_head: ArrowHeadStyle,

    /// Upper bound on shaft shortening, as a fraction of the end tangent.
    pub max_shorten_ratio: f64,

    /// Drawings shorter than this are discarded on release.
    pub min_draw_length: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: 20.0,
            head_length: DEFAULT_HEAD_LENGTH,
            stroke: Color::WHITE,
            stroke_width: 2.0,
            highlight: HighlightConfig::default(),
            start_head: ArrowHeadStyle::None,
            end_head: ArrowHeadStyle::Triangle,
            max_shorten_ratio: 0.45,
            min_draw_length: 2.0,
        }
    }
}

/// Outer glow used for proximity previews.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub color: Color,
    pub blur: f32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            blur: 15.0,
        }
    }
}
