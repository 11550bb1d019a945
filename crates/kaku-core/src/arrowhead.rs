//! Arrowhead outlines.
//!
//! A head is built from a tip point and the direction the shaft arrives in
//! (`angle`, radians). Two raking points sit `head_length` behind the tip at
//! ±30°; the open arrow and the triangles use them directly, the other
//! styles are laid out along the shaft axis (`dir`) and its normal.

use crate::model::ArrowHeadStyle;
use kurbo::{Point, Vec2};
use smallvec::{SmallVec, smallvec};
use std::f64::consts::PI;

/// Default distance from tip to raking points.
pub const DEFAULT_HEAD_LENGTH: f64 = 30.0;

/// Half-angle between the shaft and each raking line.
const RAKE: f64 = PI / 6.0;

/// One drawable piece of a head.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadPrimitive {
    /// Open stroke through the points.
    Polyline(SmallVec<[Point; 5]>),
    /// Closed outline; the back edge is implied.
    Polygon(SmallVec<[Point; 5]>),
    Circle { center: Point, radius: f64 },
}

/// The outline of one arrowhead.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowHead {
    pub style: ArrowHeadStyle,
    pub primitives: SmallVec<[HeadPrimitive; 3]>,
    /// Filled variants close their outline and fill with the stroke color.
    pub closed: bool,
}

impl ArrowHead {
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Build the head outline for `style` with its tip at `tip`.
pub fn generate_head(tip: Point, angle: f64, style: ArrowHeadStyle, head_length: f64) -> ArrowHead {
    let l = head_length;
    let dir = Vec2::from_angle(angle);
    let normal = Vec2::new(-dir.y, dir.x);
    let back = |d: f64| tip - dir * d;
    let across = |at: Point, half: f64| -> SmallVec<[Point; 5]> {
        smallvec![at + normal * half, at - normal * half]
    };

    let rake_a = tip - Vec2::from_angle(angle - RAKE) * l;
    let rake_b = tip - Vec2::from_angle(angle + RAKE) * l;

    let primitives: SmallVec<[HeadPrimitive; 3]> = match style {
        ArrowHeadStyle::None => SmallVec::new(),
        ArrowHeadStyle::OpenArrow => {
            smallvec![HeadPrimitive::Polyline(smallvec![rake_a, tip, rake_b])]
        }
        ArrowHeadStyle::Triangle => {
            smallvec![HeadPrimitive::Polyline(smallvec![rake_a, tip, rake_b, rake_a])]
        }
        ArrowHeadStyle::FilledTriangle => {
            smallvec![HeadPrimitive::Polygon(smallvec![rake_a, tip, rake_b])]
        }
        ArrowHeadStyle::Bar => smallvec![HeadPrimitive::Polyline(across(tip, l / 2.0))],
        ArrowHeadStyle::Circle | ArrowHeadStyle::FilledCircle => {
            let radius = circle_radius(l);
            smallvec![HeadPrimitive::Circle {
                center: back(radius),
                radius,
            }]
        }
        ArrowHeadStyle::Diamond | ArrowHeadStyle::FilledDiamond => {
            let half = l / 2.0;
            let mid = back(half);
            let outline: SmallVec<[Point; 5]> = smallvec![
                tip,
                mid + normal * (l / 4.0),
                back(l),
                mid - normal * (l / 4.0),
            ];
            if style.is_filled() {
                smallvec![HeadPrimitive::Polygon(outline)]
            } else {
                let mut open = outline;
                open.push(tip);
                smallvec![HeadPrimitive::Polyline(open)]
            }
        }
        ArrowHeadStyle::CrowFootOne => {
            smallvec![HeadPrimitive::Polyline(across(back(l / 2.0), l / 3.0))]
        }
        ArrowHeadStyle::CrowFootMany => crow_feet(tip, normal, back(l * 2.0 / 3.0), l / 2.0),
        ArrowHeadStyle::CrowFootOneOrMany => {
            let mut prims = crow_feet(tip, normal, back(l * 2.0 / 3.0), l / 2.0);
            prims.push(HeadPrimitive::Polyline(across(back(l * 5.0 / 6.0), l / 3.0)));
            prims
        }
    };

    ArrowHead {
        style,
        primitives,
        closed: style.is_filled(),
    }
}

/// Two strokes fanning out from `join` on the shaft to either side of the tip.
fn crow_feet(tip: Point, normal: Vec2, join: Point, spread: f64) -> SmallVec<[HeadPrimitive; 3]> {
    smallvec![
        HeadPrimitive::Polyline(smallvec![tip + normal * spread, join]),
        HeadPrimitive::Polyline(smallvec![tip - normal * spread, join]),
    ]
}

fn circle_radius(head_length: f64) -> f64 {
    head_length / 3.0
}

/// How far the shaft must stop short of the tip so it ends at the back of a
/// closed head. Zero for open styles.
pub fn cutoff_distance(style: ArrowHeadStyle, head_length: f64) -> f64 {
    match style {
        ArrowHeadStyle::Triangle | ArrowHeadStyle::FilledTriangle => head_length * RAKE.cos(),
        ArrowHeadStyle::Circle | ArrowHeadStyle::FilledCircle => 2.0 * circle_radius(head_length),
        ArrowHeadStyle::Diamond | ArrowHeadStyle::FilledDiamond => head_length,
        ArrowHeadStyle::None
        | ArrowHeadStyle::OpenArrow
        | ArrowHeadStyle::Bar
        | ArrowHeadStyle::CrowFootOne
        | ArrowHeadStyle::CrowFootOneOrMany
        | ArrowHeadStyle::CrowFootMany => 0.0,
    }
}
