//! Tool system for connector interactions.
//!
//! Each tool translates input events into `CanvasMutation`s applied by the
//! `Canvas`.
//!
//! | Event | Arrow Tool | Handle Tool |
//! |-------|------------|-------------|
//! | Primary down | Begin drawing | Grab handle under pointer |
//! | Move | Update drag points | Drag endpoint |
//! | Up | Commit (short drags discarded) | Rebind both ends |
//! | Secondary down / Escape | Cancel drawing | Release handle |

use crate::canvas::{CanvasMutation, HandleHit};
use crate::input::InputEvent;
use kaku_core::kurbo::Point;
use kaku_core::{RoutingMode, ShapeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Arrow,
    Handle,
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event. `hit` is the connector handle under the
    /// pointer, if any.
    fn handle(&mut self, event: &InputEvent, hit: Option<HandleHit>) -> Vec<CanvasMutation>;
}

// ─── Arrow Tool ──────────────────────────────────────────────────────────

/// Draws new connectors by press-drag-release.
#[derive(Debug, Default)]
pub struct ArrowTool {
    pub mode: RoutingMode,
    /// Connector being drawn and the press point.
    drawing: Option<(ShapeId, Point)>,
}

impl ArrowTool {
    pub fn new(mode: RoutingMode) -> Self {
        Self {
            mode,
            drawing: None,
        }
    }

    pub fn drawing(&self) -> Option<ShapeId> {
        self.drawing.map(|(id, _)| id)
    }

    fn cancel(&mut self) -> Vec<CanvasMutation> {
        match self.drawing.take() {
            Some((id, _)) => vec![CanvasMutation::CancelConnector { id }],
            None => vec![],
        }
    }
}

impl Tool for ArrowTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Arrow
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<HandleHit>) -> Vec<CanvasMutation> {
        match event {
            InputEvent::PointerDown { primary: false, .. } => self.cancel(),
            InputEvent::PointerDown { x, y, .. } => {
                if self.drawing.is_some() {
                    return vec![];
                }
                let id = ShapeId::with_prefix("arrow");
                self.drawing = Some((id, Point::new(*x, *y)));
                vec![CanvasMutation::BeginConnector {
                    id,
                    mode: self.mode,
                    x: *x,
                    y: *y,
                }]
            }
            InputEvent::PointerMove { x, y } => match self.drawing {
                Some((id, start)) => vec![CanvasMutation::DrawConnector {
                    id,
                    start,
                    end: Point::new(*x, *y),
                }],
                None => vec![],
            },
            InputEvent::PointerUp { x, y } => match self.drawing.take() {
                Some((id, start)) => vec![
                    CanvasMutation::DrawConnector {
                        id,
                        start,
                        end: Point::new(*x, *y),
                    },
                    CanvasMutation::CommitConnector { id },
                ],
                None => vec![],
            },
            InputEvent::Key { .. } if event.is_escape() => self.cancel(),
            InputEvent::Key { .. } => vec![],
        }
    }
}

// ─── Handle Tool ─────────────────────────────────────────────────────────

/// Drags the endpoint handles of committed connectors.
#[derive(Debug, Default)]
pub struct HandleTool {
    grabbed: Option<HandleHit>,
}

impl HandleTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grabbed(&self) -> Option<HandleHit> {
        self.grabbed
    }
}

impl Tool for HandleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Handle
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<HandleHit>) -> Vec<CanvasMutation> {
        match event {
            InputEvent::PointerDown { primary: true, .. } => {
                self.grabbed = hit;
                vec![]
            }
            InputEvent::PointerMove { x, y } => match self.grabbed {
                Some(h) => vec![CanvasMutation::DragHandle {
                    id: h.connector,
                    role: h.role,
                    x: *x,
                    y: *y,
                }],
                None => vec![],
            },
            InputEvent::PointerUp { .. } => match self.grabbed.take() {
                Some(h) => vec![CanvasMutation::CommitEdit { id: h.connector }],
                None => vec![],
            },
            InputEvent::PointerDown { primary: false, .. } => {
                self.grabbed = None;
                vec![]
            }
            InputEvent::Key { .. } => {
                if event.is_escape() {
                    self.grabbed = None;
                }
                vec![]
            }
        }
    }
}
