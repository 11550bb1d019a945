//! The narrow interface a rendering host exposes to connectors.
//!
//! Connectors never own the shapes they bind to. They read identity,
//! centers and outlines through `Surface`, and drive preview glow through
//! its styling hook.

use crate::subscriptions::SubscriptionTable;
use kaku_core::kurbo::Point;
use kaku_core::{HighlightConfig, Quad, ShapeId};

/// Read access to the shapes on a canvas, plus the highlight styling hook.
pub trait Surface {
    /// Every shape on the surface, in enumeration order (connectors included).
    fn shape_ids(&self) -> Vec<ShapeId>;

    fn contains(&self, id: ShapeId) -> bool;

    fn is_connector(&self, id: ShapeId) -> bool;

    /// Center in scene coordinates; `None` for shapes without geometry.
    fn center(&self, id: ShapeId) -> Option<Point>;

    /// Bounding quadrilateral in scene coordinates.
    fn outline(&self, id: ShapeId) -> Option<Quad>;

    /// Apply (`Some`) or restore (`None`) a preview glow on a shape.
    fn set_highlight(&mut self, id: ShapeId, glow: Option<HighlightConfig>);
}

/// Collaborators a connector needs once it lives on a surface.
pub struct Host<'a> {
    pub surface: &'a mut dyn Surface,
    pub subscriptions: &'a mut SubscriptionTable,
}

impl<'a> Host<'a> {
    pub fn new(surface: &'a mut dyn Surface, subscriptions: &'a mut SubscriptionTable) -> Self {
        Self {
            surface,
            subscriptions,
        }
    }
}
