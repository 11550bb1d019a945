//! Connector data model.
//!
//! A connector is a directional path ("arrow") whose two endpoints may be
//! glued to other shapes. Its geometry lives in a short list of drawing
//! commands; its bindings are frozen offsets from a target's center.
//! Everything in this module is plain data: the live behavior sits in
//! `kaku-editor`.

use crate::id::ShapeId;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], persisted as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (channel(self.r), channel(self.g), channel(self.b), channel(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| de::Error::custom(format!("invalid color '{s}'")))
    }
}

// ─── Path data ───────────────────────────────────────────────────────────

/// A single drawing command. Coordinates are in the connector's path space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64), // control, end
    Close,
}

impl PathCmd {
    /// Number of coordinate pairs carried by this command.
    pub fn point_count(&self) -> usize {
        match self {
            PathCmd::MoveTo(..) | PathCmd::LineTo(..) => 1,
            PathCmd::QuadTo(..) => 2,
            PathCmd::Close => 0,
        }
    }

    /// The `i`-th coordinate pair of this command.
    pub fn point(&self, i: usize) -> Option<Point> {
        match (*self, i) {
            (PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y), 0) => Some(Point::new(x, y)),
            (PathCmd::QuadTo(cx, cy, _, _), 0) => Some(Point::new(cx, cy)),
            (PathCmd::QuadTo(_, _, x, y), 1) => Some(Point::new(x, y)),
            _ => None,
        }
    }

    /// Overwrite the `i`-th coordinate pair. Returns false if it does not exist.
    pub fn set_point(&mut self, i: usize, p: Point) -> bool {
        match (self, i) {
            (PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y), 0)
            | (PathCmd::QuadTo(x, y, _, _), 0)
            | (PathCmd::QuadTo(_, _, x, y), 1) => {
                *x = p.x;
                *y = p.y;
                true
            }
            _ => false,
        }
    }

    /// Apply `f` to every coordinate pair.
    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> PathCmd {
        let g = |x: f64, y: f64| {
            let p = f(Point::new(x, y));
            (p.x, p.y)
        };
        match *self {
            PathCmd::MoveTo(x, y) => {
                let (x, y) = g(x, y);
                PathCmd::MoveTo(x, y)
            }
            PathCmd::LineTo(x, y) => {
                let (x, y) = g(x, y);
                PathCmd::LineTo(x, y)
            }
            PathCmd::QuadTo(cx, cy, x, y) => {
                let (cx, cy) = g(cx, cy);
                let (x, y) = g(x, y);
                PathCmd::QuadTo(cx, cy, x, y)
            }
            PathCmd::Close => PathCmd::Close,
        }
    }
}

/// A connector path: 2–4 commands depending on the routing mode.
pub type Path = SmallVec<[PathCmd; 4]>;

/// All coordinate pairs of a path, in drawing order.
pub fn path_points(path: &[PathCmd]) -> SmallVec<[Point; 5]> {
    path.iter()
        .flat_map(|cmd| (0..cmd.point_count()).filter_map(move |i| cmd.point(i)))
        .collect()
}

// ─── Routing & heads ─────────────────────────────────────────────────────

/// Path topology used to connect two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingMode {
    #[default]
    Straight,
    /// Quadratic curve through a single control point.
    Curved,
    /// Orthogonal route bending at the horizontal midpoint.
    Elbow,
}

/// Visual terminator drawn at a connector endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowHeadStyle {
    #[default]
    None,
    OpenArrow,
    FilledTriangle,
    Triangle,
    Bar,
    CrowFootOne,
    CrowFootOneOrMany,
    CrowFootMany,
    FilledCircle,
    Circle,
    FilledDiamond,
    Diamond,
}

impl ArrowHeadStyle {
    pub const ALL: [ArrowHeadStyle; 12] = [
        ArrowHeadStyle::None,
        ArrowHeadStyle::OpenArrow,
        ArrowHeadStyle::FilledTriangle,
        ArrowHeadStyle::Triangle,
        ArrowHeadStyle::Bar,
        ArrowHeadStyle::CrowFootOne,
        ArrowHeadStyle::CrowFootOneOrMany,
        ArrowHeadStyle::CrowFootMany,
        ArrowHeadStyle::FilledCircle,
        ArrowHeadStyle::Circle,
        ArrowHeadStyle::FilledDiamond,
        ArrowHeadStyle::Diamond,
    ];

    pub fn is_filled(self) -> bool {
        matches!(
            self,
            ArrowHeadStyle::FilledTriangle
                | ArrowHeadStyle::FilledCircle
                | ArrowHeadStyle::FilledDiamond
        )
    }
}

// ─── Bindings ────────────────────────────────────────────────────────────

/// Which end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Start,
    End,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::Start, Role::End];

    pub fn opposite(self) -> Role {
        match self {
            Role::Start => Role::End,
            Role::End => Role::Start,
        }
    }
}

/// A connector endpoint glued to a target shape.
///
/// `offset` is `connection point − target center` captured at bind time.
/// It is never recomputed; only a rebind replaces it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub target: ShapeId,
    pub offset: Vec2,
}

impl Binding {
    /// Bind `point` to a target whose center is currently `center`.
    pub fn capture(target: ShapeId, point: Point, center: Point) -> Self {
        Self {
            target,
            offset: point - center,
        }
    }

    /// Where the bound endpoint belongs for a target centered at `center`.
    pub fn resolve(&self, center: Point) -> Point {
        center + self.offset
    }
}

// ─── Persisted records ───────────────────────────────────────────────────

/// Serialized form of a binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRecord {
    pub target_id: ShapeId,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl From<&Binding> for BindingRecord {
    fn from(b: &Binding) -> Self {
        Self {
            target_id: b.target,
            offset_x: b.offset.x,
            offset_y: b.offset.y,
        }
    }
}

impl From<&BindingRecord> for Binding {
    fn from(r: &BindingRecord) -> Self {
        Self {
            target: r.target_id,
            offset: Vec2::new(r.offset_x, r.offset_y),
        }
    }
}

/// Serialized form of a connector. `path_commands` are in scene coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRecord {
    pub id: ShapeId,
    pub routing_mode: RoutingMode,
    pub path_commands: Vec<PathCmd>,
    pub start_arrow_head_style: ArrowHeadStyle,
    pub end_arrow_head_style: ArrowHeadStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<BindingRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<BindingRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex(), "#FF000080");

        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("#12345"), None);
    }

    #[test]
    fn color_persists_as_hex() {
        let json = serde_json::to_value(Color::WHITE).unwrap();
        assert_eq!(json, "#FFFFFF");
        let back: Color = serde_json::from_value(json).unwrap();
        assert_eq!(back, Color::WHITE);
        assert!(serde_json::from_str::<Color>(r##""#12""##).is_err());
    }

    #[test]
    fn quad_points_are_addressable() {
        let mut cmd = PathCmd::QuadTo(1.0, 2.0, 3.0, 4.0);
        assert_eq!(cmd.point_count(), 2);
        assert_eq!(cmd.point(1), Some(Point::new(3.0, 4.0)));
        assert!(cmd.set_point(0, Point::new(9.0, 9.0)));
        assert_eq!(cmd, PathCmd::QuadTo(9.0, 9.0, 3.0, 4.0));
        assert!(!cmd.set_point(2, Point::ZERO));
        let mut close = PathCmd::Close;
        assert!(!close.set_point(0, Point::ZERO));
    }

    #[test]
    fn path_points_flatten_in_order() {
        let path = [PathCmd::MoveTo(0.0, 0.0), PathCmd::QuadTo(5.0, 5.0, 10.0, 0.0)];
        let pts = path_points(&path);
        assert_eq!(
            pts.as_slice(),
            &[Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 0.0)]
        );
    }

    #[test]
    fn binding_offset_is_relative_to_center() {
        let b = Binding::capture(
            ShapeId::intern("box"),
            Point::new(450.0, 225.0),
            Point::new(400.0, 225.0),
        );
        assert_eq!(b.offset, Vec2::new(50.0, 0.0));
        assert_eq!(b.resolve(Point::new(330.0, 180.0)), Point::new(380.0, 180.0));
    }

    #[test]
    fn connector_record_uses_camel_case_fields() {
        let record = ConnectorRecord {
            id: ShapeId::intern("arrow_a"),
            routing_mode: RoutingMode::Curved,
            path_commands: vec![PathCmd::MoveTo(0.0, 0.0), PathCmd::QuadTo(1.0, 1.0, 2.0, 0.0)],
            start_arrow_head_style: ArrowHeadStyle::None,
            end_arrow_head_style: ArrowHeadStyle::FilledDiamond,
            start_binding: Some(BindingRecord {
                target_id: ShapeId::intern("box"),
                offset_x: 5.0,
                offset_y: -2.0,
            }),
            end_binding: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["routingMode"], "curved");
        assert_eq!(json["endArrowHeadStyle"], "filledDiamond");
        assert_eq!(json["startBinding"]["targetId"], "box");
        assert_eq!(json["startBinding"]["offsetX"], 5.0);
        assert!(json.get("endBinding").is_none());

        let back: ConnectorRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
