//! Proximity snapping.
//!
//! While a connector is drawn or edited, each endpoint looks for a shape
//! whose outline is within the snap threshold. Among qualifying shapes the
//! one with the nearest center wins; ties keep the earlier shape in
//! enumeration order. Candidates get a temporary glow until the gesture
//! ends.

use crate::surface::Surface;
use kaku_core::kurbo::Point;
use kaku_core::{HighlightConfig, Quad, Role, ShapeId};
use smallvec::SmallVec;

/// A shape that may receive an endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateShape {
    pub id: ShapeId,
    pub center: Point,
    pub outline: Quad,
}

/// The winning shape for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub shape: ShapeId,
    /// The endpoint position that was evaluated.
    pub point: Point,
    /// Center-to-endpoint distance.
    pub distance: f64,
    pub center: Point,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Proximity {
    pub start: Option<Candidate>,
    pub end: Option<Candidate>,
}

impl Proximity {
    pub fn get(&self, role: Role) -> Option<&Candidate> {
        match role {
            Role::Start => self.start.as_ref(),
            Role::End => self.end.as_ref(),
        }
    }
}

/// Non-connector shapes on `surface` with geometry, in enumeration order.
pub fn candidates(surface: &dyn Surface) -> Vec<CandidateShape> {
    surface
        .shape_ids()
        .into_iter()
        .filter(|id| !surface.is_connector(*id))
        .filter_map(|id| {
            Some(CandidateShape {
                id,
                center: surface.center(id)?,
                outline: surface.outline(id)?,
            })
        })
        .collect()
}

/// Pick a binding candidate for each endpoint.
///
/// A shape qualifies for a point when the distance from the point to any
/// edge of its outline is at most `threshold`. Shapes that don't qualify
/// are never considered, however close their center.
pub fn evaluate(
    start: Point,
    end: Point,
    shapes: &[CandidateShape],
    threshold: f64,
) -> Proximity {
    Proximity {
        start: closest(start, shapes, threshold),
        end: closest(end, shapes, threshold),
    }
}

fn closest(point: Point, shapes: &[CandidateShape], threshold: f64) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for shape in shapes {
        if shape.outline.distance_to_edges(point) > threshold {
            continue;
        }
        let distance = shape.center.distance(point);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Candidate {
                shape: shape.id,
                point,
                distance,
                center: shape.center,
            });
        }
    }
    best
}

// ─── Binder ──────────────────────────────────────────────────────────────

/// Pending candidates and the glow they put on the surface.
///
/// Everything highlighted through a binder is tracked here so it can be
/// restored on commit, cancel, or disposal.
#[derive(Debug, Clone, Default)]
pub struct ProximityBinder {
    pending: Proximity,
    highlighted: SmallVec<[ShapeId; 2]>,
}

impl ProximityBinder {
    /// Re-evaluate both endpoints and refresh the glow.
    pub fn preview(
        &mut self,
        start: Point,
        end: Point,
        surface: &mut dyn Surface,
        threshold: f64,
        glow: HighlightConfig,
    ) -> Proximity {
        self.clear_highlights(surface);
        let shapes = candidates(surface);
        self.pending = evaluate(start, end, &shapes, threshold);
        for candidate in [self.pending.start, self.pending.end].into_iter().flatten() {
            if !self.highlighted.contains(&candidate.shape) {
                surface.set_highlight(candidate.shape, Some(glow));
                self.highlighted.push(candidate.shape);
            }
        }
        log::trace!(
            "proximity start={:?} end={:?}",
            self.pending.start.map(|c| c.shape),
            self.pending.end.map(|c| c.shape)
        );
        self.pending
    }

    pub fn pending(&self) -> &Proximity {
        &self.pending
    }

    /// Hand over the pending candidates and reset them.
    pub fn take_pending(&mut self) -> Proximity {
        std::mem::take(&mut self.pending)
    }

    pub fn highlighted(&self) -> &[ShapeId] {
        &self.highlighted
    }

    /// Restore every shape this binder highlighted. Shapes that left the
    /// surface meanwhile are skipped.
    pub fn clear_highlights(&mut self, surface: &mut dyn Surface) {
        for id in self.highlighted.drain(..) {
            if surface.contains(id) {
                surface.set_highlight(id, None);
            }
        }
    }

    /// Drop pending candidates and restore highlights.
    pub fn cancel(&mut self, surface: &mut dyn Surface) {
        self.clear_highlights(surface);
        self.pending = Proximity::default();
    }
}
