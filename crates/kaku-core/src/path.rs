//! Path geometry for connectors, dispatched over `RoutingMode`.
//!
//! Every function here is pure: endpoints in, commands out (or the other
//! way around). Paths are expressed in the connector's own path space; the
//! editor maps them to the scene through the connector's placement.
//!
//! | Mode | Commands |
//! |----------|-----------------------------------------------|
//! | Straight | `M start, L end` |
//! | Curved | `M start, Q control end` |
//! | Elbow | `M start, L (mx, start.y), L (mx, end.y), L end` |

use crate::geom::{bounding_rect, direction};
use crate::model::{Path, PathCmd, Role, RoutingMode, path_points};
use kurbo::{Point, Rect, Vec2};
use smallvec::{SmallVec, smallvec};

/// Endpoints and tangent references extracted from a path.
///
/// `before_start` is the second coordinate pair and `before_end` the
/// second-to-last; for a curve these are the control point, for a two-point
/// line they are simply the opposite endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints {
    pub start: Point,
    pub end: Point,
    pub before_start: Point,
    pub before_end: Point,
}

/// Head directions in radians. Both point away from the shaft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angles {
    pub start: f64,
    pub end: f64,
}

/// Location of an endpoint inside a path: command index and the coordinate
/// pair within that command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub command: usize,
    pub point: usize,
}

// ─── Build ───────────────────────────────────────────────────────────────

/// Build the path connecting `start` to `end`.
///
/// A curved path bows toward the path-space origin: during drawing that is
/// the midpoint of the drag, so a fresh curve starts out straight.
pub fn build_path(mode: RoutingMode, start: Point, end: Point) -> Path {
    match mode {
        RoutingMode::Straight => smallvec![
            PathCmd::MoveTo(start.x, start.y),
            PathCmd::LineTo(end.x, end.y),
        ],
        RoutingMode::Curved => smallvec![
            PathCmd::MoveTo(start.x, start.y),
            PathCmd::QuadTo(0.0, 0.0, end.x, end.y),
        ],
        RoutingMode::Elbow => elbow(start, end),
    }
}

fn elbow(start: Point, end: Point) -> Path {
    let mx = (start.x + end.x) / 2.0;
    smallvec![
        PathCmd::MoveTo(start.x, start.y),
        PathCmd::LineTo(mx, start.y),
        PathCmd::LineTo(mx, end.y),
        PathCmd::LineTo(end.x, end.y),
    ]
}

/// Rebuild `path` (of any mode) as a path of `mode`, keeping its endpoints.
///
/// A curve keeps an existing control point; switching into `Curved` from a
/// path without one uses the midpoint of the endpoints. Returns `None` if the
/// path has fewer than two coordinate pairs.
pub fn convert(mode: RoutingMode, path: &[PathCmd]) -> Option<Path> {
    let ep = extract_endpoints(path)?;
    Some(match mode {
        RoutingMode::Straight | RoutingMode::Elbow => build_path(mode, ep.start, ep.end),
        RoutingMode::Curved => {
            let control = path
                .iter()
                .find_map(|cmd| match *cmd {
                    PathCmd::QuadTo(cx, cy, _, _) => Some(Point::new(cx, cy)),
                    _ => None,
                })
                .unwrap_or_else(|| ep.start.midpoint(ep.end));
            smallvec![
                PathCmd::MoveTo(ep.start.x, ep.start.y),
                PathCmd::QuadTo(control.x, control.y, ep.end.x, ep.end.y),
            ]
        }
    })
}

/// Whether `path` has the command layout `mode` produces.
pub fn matches_mode(mode: RoutingMode, path: &[PathCmd]) -> bool {
    match (mode, path) {
        (RoutingMode::Straight, [PathCmd::MoveTo(..), PathCmd::LineTo(..)]) => true,
        (RoutingMode::Curved, [PathCmd::MoveTo(..), PathCmd::QuadTo(..)]) => true,
        (
            RoutingMode::Elbow,
            [
                PathCmd::MoveTo(..),
                PathCmd::LineTo(..),
                PathCmd::LineTo(..),
                PathCmd::LineTo(..),
            ],
        ) => true,
        _ => false,
    }
}

/// Restore mode invariants after an endpoint was overwritten in place.
///
/// Only elbows need it: their bends are recomputed so every segment stays
/// axis-aligned.
pub fn reroute(mode: RoutingMode, path: &mut Path) {
    if mode != RoutingMode::Elbow || !matches_mode(mode, path) {
        return;
    }
    if let Some(ep) = extract_endpoints(path) {
        *path = elbow(ep.start, ep.end);
    }
}

// ─── Extract ─────────────────────────────────────────────────────────────

/// Extract endpoints and tangent references. `None` below two points.
///
/// Points stacked on an endpoint are skipped (a vertical elbow repeats both
/// of its ends), so each reference is the nearest distinct neighbour, or the
/// opposite endpoint when there is none.
pub fn extract_endpoints(path: &[PathCmd]) -> Option<Endpoints> {
    let pts = path_points(path);
    let n = pts.len();
    if n < 2 {
        return None;
    }
    let (start, end) = (pts[0], pts[n - 1]);
    let before_start = pts[1..].iter().copied().find(|p| *p != start).unwrap_or(end);
    let before_end = pts[..n - 1]
        .iter()
        .rev()
        .copied()
        .find(|p| *p != end)
        .unwrap_or(start);
    Some(Endpoints {
        start,
        end,
        before_start,
        before_end,
    })
}

/// Head angles for both ends.
///
/// The end head points along `before_end → end`; the start head along
/// `before_start → start`, i.e. the shaft's own direction turned by π.
/// Zero-length tangents give 0.
pub fn calculate_angles(ep: &Endpoints) -> Angles {
    Angles {
        start: direction(ep.start - ep.before_start),
        end: direction(ep.end - ep.before_end),
    }
}

/// Which path slot a moving binding overwrites for `role`.
pub fn binding_anchor(mode: RoutingMode, role: Role) -> Anchor {
    match (mode, role) {
        (_, Role::Start) => Anchor {
            command: 0,
            point: 0,
        },
        (RoutingMode::Straight, Role::End) => Anchor {
            command: 1,
            point: 0,
        },
        (RoutingMode::Curved, Role::End) => Anchor {
            command: 1,
            point: 1,
        },
        (RoutingMode::Elbow, Role::End) => Anchor {
            command: 3,
            point: 0,
        },
    }
}

/// Read the coordinate pair at `anchor`.
pub fn point_at(path: &[PathCmd], anchor: Anchor) -> Option<Point> {
    path.get(anchor.command)?.point(anchor.point)
}

/// Overwrite the coordinate pair at `anchor`. Returns false if absent.
pub fn set_point_at(path: &mut [PathCmd], anchor: Anchor, p: Point) -> bool {
    path.get_mut(anchor.command)
        .is_some_and(|cmd| cmd.set_point(anchor.point, p))
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Subtract `offset` from every coordinate pair.
pub fn rescale(path: &[PathCmd], offset: Vec2) -> Path {
    path.iter().map(|cmd| cmd.map_points(|p| p - offset)).collect()
}

/// Bounding box of every coordinate pair (control points included).
pub fn path_bounds(path: &[PathCmd]) -> Option<Rect> {
    bounding_rect(path_points(path))
}

/// Pull each endpoint back along its tangent by the given distance.
///
/// Used so the shaft ends at the back of a closed head instead of poking
/// through it. The pull is expressed as a ratio of the tangent length and
/// capped at `max_ratio`; zero-length tangents are left alone. Points
/// stacked on an endpoint move with it.
pub fn shorten(path: &[PathCmd], start_cut: f64, end_cut: f64, max_ratio: f64) -> Path {
    let mut out: Path = path.iter().copied().collect();
    let Some(ep) = extract_endpoints(path) else {
        return out;
    };

    if let Some(p) = pull_back(ep.start, ep.before_start, start_cut, max_ratio) {
        move_run(&mut out, ep.start, p, false);
    }
    if let Some(p) = pull_back(ep.end, ep.before_end, end_cut, max_ratio) {
        move_run(&mut out, ep.end, p, true);
    }
    out
}

fn pull_back(tip: Point, toward: Point, cut: f64, max_ratio: f64) -> Option<Point> {
    let v = tip - toward;
    let len = v.hypot();
    if cut <= 0.0 || len == 0.0 {
        return None;
    }
    let ratio = (cut / len).min(max_ratio);
    Some(tip - v * ratio)
}

/// Every coordinate-pair slot of the path, in drawing order.
fn anchors(path: &[PathCmd]) -> SmallVec<[Anchor; 5]> {
    path.iter()
        .enumerate()
        .flat_map(|(command, cmd)| {
            (0..cmd.point_count()).map(move |point| Anchor { command, point })
        })
        .collect()
}

/// Overwrite the run of slots sitting on `from` at the start (or end) of the path.
fn move_run(path: &mut Path, from: Point, to: Point, from_end: bool) {
    let mut slots = anchors(path);
    if from_end {
        slots.reverse();
    }
    for anchor in slots {
        if point_at(path, anchor) != Some(from) {
            break;
        }
        set_point_at(path, anchor, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const MODES: [RoutingMode; 3] = [
        RoutingMode::Straight,
        RoutingMode::Curved,
        RoutingMode::Elbow,
    ];

    #[test]
    fn build_then_extract_recovers_endpoints() {
        let a = Point::new(-40.0, 12.5);
        let b = Point::new(75.0, -30.0);
        for mode in MODES {
            let ep = extract_endpoints(&build_path(mode, a, b)).unwrap();
            assert_eq!(ep.start, a, "{mode:?}");
            assert_eq!(ep.end, b, "{mode:?}");
        }
    }

    #[test]
    fn curve_controls_at_origin() {
        let path = build_path(RoutingMode::Curved, Point::new(-5.0, -5.0), Point::new(5.0, 5.0));
        let ep = extract_endpoints(&path).unwrap();
        assert_eq!(ep.before_start, Point::ZERO);
        assert_eq!(ep.before_end, Point::ZERO);
    }

    #[test]
    fn elbow_bends_at_horizontal_midpoint() {
        let path = build_path(RoutingMode::Elbow, Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(
            path.as_slice(),
            &[
                PathCmd::MoveTo(0.0, 0.0),
                PathCmd::LineTo(50.0, 0.0),
                PathCmd::LineTo(50.0, 50.0),
                PathCmd::LineTo(100.0, 50.0),
            ]
        );
    }

    #[test]
    fn horizontal_straight_angles() {
        let path = build_path(RoutingMode::Straight, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let angles = calculate_angles(&extract_endpoints(&path).unwrap());
        assert_eq!(angles.end, 0.0);
        assert_eq!(angles.start, PI);
    }

    #[test]
    fn degenerate_connector_has_zero_angles() {
        let p = Point::new(7.0, 7.0);
        for mode in MODES {
            let path = build_path(mode, p, p);
            let ep = extract_endpoints(&path).unwrap();
            assert_eq!(ep.start, ep.end);
            if mode != RoutingMode::Curved {
                let angles = calculate_angles(&ep);
                assert_eq!(angles.start, 0.0);
                assert_eq!(angles.end, 0.0);
            }
        }
    }

    #[test]
    fn too_short_paths_extract_nothing() {
        assert!(extract_endpoints(&[]).is_none());
        assert!(extract_endpoints(&[PathCmd::MoveTo(1.0, 1.0)]).is_none());
        assert!(extract_endpoints(&[PathCmd::MoveTo(1.0, 1.0), PathCmd::Close]).is_none());
    }

    #[test]
    fn anchors_address_the_endpoints() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(30.0, 40.0);
        for mode in MODES {
            let path = build_path(mode, a, b);
            assert_eq!(point_at(&path, binding_anchor(mode, Role::Start)), Some(a));
            assert_eq!(point_at(&path, binding_anchor(mode, Role::End)), Some(b));
        }
    }

    #[test]
    fn rescale_subtracts_offset_everywhere() {
        let path = [PathCmd::MoveTo(10.0, 10.0), PathCmd::QuadTo(20.0, 0.0, 30.0, 10.0)];
        let out = rescale(&path, Vec2::new(10.0, 5.0));
        assert_eq!(
            out.as_slice(),
            &[PathCmd::MoveTo(0.0, 5.0), PathCmd::QuadTo(10.0, -5.0, 20.0, 5.0)]
        );
    }

    #[test]
    fn convert_straight_curved_straight_keeps_endpoints() {
        let a = Point::new(-20.0, 3.0);
        let b = Point::new(60.0, 41.0);
        let straight = build_path(RoutingMode::Straight, a, b);
        let curved = convert(RoutingMode::Curved, &straight).unwrap();
        assert!(matches_mode(RoutingMode::Curved, &curved));
        let ep = extract_endpoints(&curved).unwrap();
        assert_eq!(ep.before_end, a.midpoint(b));

        let back = convert(RoutingMode::Straight, &curved).unwrap();
        assert_eq!(back, straight);
    }

    #[test]
    fn convert_into_curved_keeps_existing_control() {
        let path = [PathCmd::MoveTo(0.0, 0.0), PathCmd::QuadTo(3.0, 9.0, 10.0, 0.0)];
        let curved = convert(RoutingMode::Curved, &path).unwrap();
        assert_eq!(curved[1], PathCmd::QuadTo(3.0, 9.0, 10.0, 0.0));
    }

    #[test]
    fn reroute_straightens_elbow_after_endpoint_edit() {
        let mut path = build_path(
            RoutingMode::Elbow,
            Point::new(0.0, 0.0),
            Point::new(100.0, 50.0),
        );
        set_point_at(
            &mut path,
            binding_anchor(RoutingMode::Elbow, Role::End),
            Point::new(40.0, 80.0),
        );
        reroute(RoutingMode::Elbow, &mut path);
        assert_eq!(path[1], PathCmd::LineTo(20.0, 0.0));
        assert_eq!(path[2], PathCmd::LineTo(20.0, 80.0));
    }

    #[test]
    fn shorten_pulls_end_back_along_tangent() {
        let path = build_path(RoutingMode::Straight, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let out = shorten(&path, 0.0, 26.0, 0.45);
        assert_eq!(out[0], PathCmd::MoveTo(0.0, 0.0));
        assert_eq!(out[1], PathCmd::LineTo(74.0, 0.0));
    }

    #[test]
    fn shorten_is_capped_and_skips_zero_length() {
        let path = build_path(RoutingMode::Straight, Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let out = shorten(&path, 50.0, 0.0, 0.45);
        assert_eq!(out[0], PathCmd::MoveTo(4.5, 0.0));

        let p = Point::new(3.0, 3.0);
        let zero = build_path(RoutingMode::Straight, p, p);
        assert_eq!(shorten(&zero, 10.0, 10.0, 0.45), zero);
    }

    #[test]
    fn vertical_elbow_heads_follow_the_shaft() {
        let path = build_path(RoutingMode::Elbow, Point::new(0.0, -100.0), Point::new(0.0, 100.0));
        let ep = extract_endpoints(&path).unwrap();
        assert_eq!(ep.before_start, Point::new(0.0, 100.0));
        assert_eq!(ep.before_end, Point::new(0.0, -100.0));

        let angles = calculate_angles(&ep);
        assert_eq!(angles.end, FRAC_PI_2);
        assert_eq!(angles.start, -FRAC_PI_2);
    }

    #[test]
    fn shorten_moves_points_stacked_on_the_end() {
        let path = build_path(RoutingMode::Elbow, Point::new(0.0, -100.0), Point::new(0.0, 100.0));
        let out = shorten(&path, 0.0, 50.0, 0.45);
        assert_eq!(
            out.as_slice(),
            &[
                PathCmd::MoveTo(0.0, -100.0),
                PathCmd::LineTo(0.0, -100.0),
                PathCmd::LineTo(0.0, 50.0),
                PathCmd::LineTo(0.0, 50.0),
            ]
        );
    }

    #[test]
    fn bounds_include_control_points() {
        let path = [PathCmd::MoveTo(0.0, 0.0), PathCmd::QuadTo(5.0, -10.0, 10.0, 0.0)];
        assert_eq!(path_bounds(&path), Some(Rect::new(0.0, -10.0, 10.0, 0.0)));
    }
}
