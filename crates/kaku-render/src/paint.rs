//! Canvas → kurbo drawables.
//!
//! Walks the canvas in document order and emits one `Drawable` per shape
//! outline, connector shaft, and arrowhead, all in scene coordinates. A
//! backend only has to fill and stroke `BezPath`s.

use kaku_core::{
    ArrowHead, Color, ConnectorConfig, HeadPrimitive, HighlightConfig, PathCmd, ShapeId,
};
use kaku_editor::{Canvas, ConnectorController, Scene, ShapeKind, Surface};
use kurbo::{Affine, BezPath, Cap, Circle, Ellipse, Join, Point, Shape, Stroke};

/// Curve flattening tolerance for circles and ellipses.
const TOLERANCE: f64 = 0.1;

/// A filled and/or stroked path in scene coordinates.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub path: BezPath,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, Stroke)>,
    /// Outer glow behind the path (proximity preview).
    pub glow: Option<HighlightConfig>,
}

/// Paint the whole canvas, back to front.
pub fn paint_canvas(canvas: &Canvas) -> Vec<Drawable> {
    let scene = canvas.scene();
    let mut out = Vec::new();
    for id in scene.shape_ids() {
        match canvas.connector(id) {
            Some(connector) => out.extend(paint_connector(connector)),
            None => out.extend(paint_shape(scene, id, canvas.config())),
        }
    }
    log::trace!("painted {} drawables", out.len());
    out
}

// ─── Shapes ──────────────────────────────────────────────────────────────

/// Outline of a plain shape. Groups and connectors have none.
pub fn paint_shape(scene: &Scene, id: ShapeId, config: &ConnectorConfig) -> Option<Drawable> {
    let shape = scene.get(id)?;
    let rect = scene.bounds(id)?;
    let mut path = match shape.kind {
        ShapeKind::Rect { .. } => rect.to_path(TOLERANCE),
        ShapeKind::Ellipse { .. } => Ellipse::from_rect(rect).to_path(TOLERANCE),
        ShapeKind::Diamond { .. } => {
            let c = rect.center();
            let mut bez = BezPath::new();
            bez.move_to(Point::new(c.x, rect.y0));
            bez.line_to(Point::new(rect.x1, c.y));
            bez.line_to(Point::new(c.x, rect.y1));
            bez.line_to(Point::new(rect.x0, c.y));
            bez.close_path();
            bez
        }
        ShapeKind::Root | ShapeKind::Group | ShapeKind::Connector => return None,
    };
    if shape.angle != 0.0 {
        path.apply_affine(Affine::rotate_about(shape.angle, rect.center()));
    }
    Some(Drawable {
        path,
        fill: None,
        stroke: Some((config.stroke, stroke_for(config))),
        glow: shape.highlight,
    })
}

// ─── Connectors ──────────────────────────────────────────────────────────

/// Shaft plus any non-empty heads. Closed heads are filled with the
/// stroke color.
pub fn paint_connector(connector: &ConnectorController) -> Vec<Drawable> {
    let geometry = connector.geometry();
    let config = connector.config();
    let stroke = stroke_for(config);
    let mut out = Vec::with_capacity(3);

    if !geometry.shaft.is_empty() {
        out.push(Drawable {
            path: shaft_path(&geometry.shaft, geometry.transform),
            fill: None,
            stroke: Some((config.stroke, stroke.clone())),
            glow: None,
        });
    }
    for head in [&geometry.start_head, &geometry.end_head] {
        if let Some(path) = head_path(head, geometry.transform) {
            out.push(Drawable {
                path,
                fill: head.closed.then_some(config.stroke),
                stroke: Some((config.stroke, stroke.clone())),
                glow: None,
            });
        }
    }
    out
}

fn stroke_for(config: &ConnectorConfig) -> Stroke {
    Stroke::new(config.stroke_width)
        .with_join(Join::Round)
        .with_caps(Cap::Round)
}

fn shaft_path(commands: &[PathCmd], transform: Affine) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in commands {
        match *cmd {
            PathCmd::MoveTo(x, y) => bez.move_to((x, y)),
            PathCmd::LineTo(x, y) => bez.line_to((x, y)),
            PathCmd::QuadTo(cx, cy, x, y) => bez.quad_to((cx, cy), (x, y)),
            PathCmd::Close => bez.close_path(),
        }
    }
    bez.apply_affine(transform);
    bez
}

fn head_path(head: &ArrowHead, transform: Affine) -> Option<BezPath> {
    if head.is_empty() {
        return None;
    }
    let mut bez = BezPath::new();
    for primitive in &head.primitives {
        match primitive {
            HeadPrimitive::Polyline(points) | HeadPrimitive::Polygon(points) => {
                let Some((first, rest)) = points.split_first() else {
                    continue;
                };
                bez.move_to(*first);
                for p in rest {
                    bez.line_to(*p);
                }
                if matches!(primitive, HeadPrimitive::Polygon(_)) {
                    bez.close_path();
                }
            }
            HeadPrimitive::Circle { center, radius } => {
                bez.extend(Circle::new(*center, *radius).path_elements(TOLERANCE));
            }
        }
    }
    bez.apply_affine(transform);
    Some(bez)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaku_core::{ArrowHeadStyle, RoutingMode};
    use kaku_editor::{CanvasMutation, ShapeRecord};
    use kurbo::PathEl;

    fn canvas_with_arrow(id: &str) -> (Canvas, ShapeId) {
        let mut canvas = Canvas::default();
        let id = ShapeId::intern(id);
        canvas.apply(CanvasMutation::BeginConnector {
            id,
            mode: RoutingMode::Straight,
            x: 10.0,
            y: 20.0,
        });
        canvas.apply(CanvasMutation::DrawConnector {
            id,
            start: Point::new(10.0, 20.0),
            end: Point::new(210.0, 20.0),
        });
        canvas.apply(CanvasMutation::CommitConnector { id });
        (canvas, id)
    }

    #[test]
    fn default_connector_is_shaft_and_open_triangle() {
        let (canvas, id) = canvas_with_arrow("paint_default");
        let drawables = paint_connector(canvas.connector(id).unwrap());
        assert_eq!(drawables.len(), 2);
        assert!(drawables.iter().all(|d| d.fill.is_none()));

        // Shaft starts at the scene-space start point.
        match drawables[0].path.elements().first() {
            Some(PathEl::MoveTo(p)) => assert!(p.distance(Point::new(10.0, 20.0)) < 1e-9),
            other => panic!("expected MoveTo, got {other:?}"),
        }
    }

    #[test]
    fn filled_heads_are_filled_with_stroke_color() {
        let (mut canvas, id) = canvas_with_arrow("paint_filled");
        canvas.apply(CanvasMutation::SetArrowHeads {
            id,
            start: ArrowHeadStyle::FilledCircle,
            end: ArrowHeadStyle::FilledTriangle,
        });
        let drawables = paint_connector(canvas.connector(id).unwrap());
        assert_eq!(drawables.len(), 3);
        assert_eq!(drawables[1].fill, Some(Color::WHITE));
        assert_eq!(drawables[2].fill, Some(Color::WHITE));
        assert!(
            drawables[2]
                .path
                .elements()
                .iter()
                .any(|el| matches!(el, PathEl::ClosePath))
        );
    }

    #[test]
    fn shaft_bounds_stay_in_scene_space() {
        let (canvas, id) = canvas_with_arrow("paint_bounds");
        let drawables = paint_connector(canvas.connector(id).unwrap());
        let bbox = drawables[0].path.bounding_box();
        assert!((bbox.x0 - 10.0).abs() < 1e-9);
        assert!(bbox.x1 < 210.0);
        assert!((bbox.y0 - 20.0).abs() < 1e-9);
    }

    #[test]
    fn canvas_paints_shapes_with_glow() {
        let mut canvas = Canvas::default();
        let target = ShapeRecord::rect("paint_target", 300.0, 0.0, 100.0, 40.0);
        canvas.add_shape(&target).unwrap();
        let id = ShapeId::intern("paint_live");
        canvas.apply(CanvasMutation::BeginConnector {
            id,
            mode: RoutingMode::Straight,
            x: 0.0,
            y: 20.0,
        });
        canvas.apply(CanvasMutation::DrawConnector {
            id,
            start: Point::new(0.0, 20.0),
            end: Point::new(290.0, 20.0),
        });

        let drawables = paint_canvas(&canvas);
        // Target outline first, then the live connector's shaft and head.
        assert_eq!(drawables.len(), 3);
        assert!(drawables[0].glow.is_some());
        assert!(drawables[1].glow.is_none());
    }
}
