//! Canvas host: owns the scene, every connector, and the subscription table.
//!
//! All edits funnel through [`Canvas::apply`] as `CanvasMutation`s, the
//! way tools produce them. Moving a shape notifies the connectors bound to
//! it (and to anything in its subtree) through the subscription table.

use crate::connector::ConnectorController;
use crate::error::ConnectorError;
use crate::input::InputEvent;
use crate::scene::{Scene, ShapeKind, ShapeRecord};
use crate::subscriptions::SubscriptionTable;
use crate::surface::{Host, Surface};
use crate::tools::Tool;
use kaku_core::kurbo::{Point, Vec2};
use kaku_core::{ArrowHeadStyle, ConnectorConfig, ConnectorRecord, Role, RoutingMode, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pick radius around a connector endpoint handle.
pub const HANDLE_HIT_RADIUS: f64 = 8.0;

// ─── Mutations ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasMutation {
    AddShape {
        shape: ShapeRecord,
    },
    /// Move a shape (and its subtree), or translate a connector.
    MoveShape {
        id: ShapeId,
        dx: f64,
        dy: f64,
    },
    RemoveShape {
        id: ShapeId,
    },
    AddConnector {
        connector: Box<ConnectorRecord>,
    },
    RemoveConnector {
        id: ShapeId,
    },
    /// Start drawing a connector at a point.
    BeginConnector {
        id: ShapeId,
        mode: RoutingMode,
        x: f64,
        y: f64,
    },
    /// Update the drag points of a connector being drawn.
    DrawConnector {
        id: ShapeId,
        start: Point,
        end: Point,
    },
    CommitConnector {
        id: ShapeId,
    },
    /// Abandon a drawing; the connector is removed.
    CancelConnector {
        id: ShapeId,
    },
    SetRoutingMode {
        id: ShapeId,
        mode: RoutingMode,
    },
    SetArrowHeads {
        id: ShapeId,
        start: ArrowHeadStyle,
        end: ArrowHeadStyle,
    },
    DragHandle {
        id: ShapeId,
        role: Role,
        x: f64,
        y: f64,
    },
    /// End of a move/transform gesture on a connector: rebind both ends.
    CommitEdit {
        id: ShapeId,
    },
}

/// A connector endpoint handle under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleHit {
    pub connector: ShapeId,
    pub role: Role,
}

/// Serialized canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    #[serde(default)]
    pub shapes: Vec<ShapeRecord>,
    #[serde(default)]
    pub connectors: Vec<ConnectorRecord>,
    /// Document order of shapes and connectors together.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<ShapeId>,
}

// ─── Canvas ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Canvas {
    scene: Scene,
    connectors: HashMap<ShapeId, ConnectorController>,
    subscriptions: SubscriptionTable,
    config: ConnectorConfig,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(ConnectorConfig::default())
    }
}

impl Canvas {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            scene: Scene::new(),
            connectors: HashMap::new(),
            subscriptions: SubscriptionTable::new(),
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn connector(&self, id: ShapeId) -> Option<&ConnectorController> {
        self.connectors.get(&id)
    }

    /// Connectors in document order.
    pub fn connectors(&self) -> impl Iterator<Item = &ConnectorController> + '_ {
        self.scene
            .shape_ids()
            .into_iter()
            .filter_map(move |id| self.connectors.get(&id))
    }

    /// Run `f` with a connector and the host collaborators it needs.
    fn with_connector<R>(
        &mut self,
        id: ShapeId,
        f: impl FnOnce(&mut ConnectorController, &mut Host<'_>) -> R,
    ) -> Option<R> {
        let connector = self.connectors.get_mut(&id)?;
        let mut host = Host::new(&mut self.scene, &mut self.subscriptions);
        Some(f(connector, &mut host))
    }

    /// Apply one mutation. Returns false when it referred to nothing or
    /// changed nothing.
    pub fn apply(&mut self, mutation: CanvasMutation) -> bool {
        match mutation {
            CanvasMutation::AddShape { shape } => self.add_shape(&shape).is_ok(),
            CanvasMutation::MoveShape { id, dx, dy } => self.move_shape(id, Vec2::new(dx, dy)),
            CanvasMutation::RemoveShape { id } => self.remove_shape(id),
            CanvasMutation::AddConnector { connector } => self.add_connector(&connector).is_ok(),
            CanvasMutation::RemoveConnector { id } => self.remove_connector(id),
            CanvasMutation::BeginConnector { id, mode, x, y } => {
                self.begin_connector(id, mode, Point::new(x, y))
            }
            CanvasMutation::DrawConnector { id, start, end } => self
                .with_connector(id, |c, host| c.set_draw_endpoints(start, end, Some(host)))
                .unwrap_or(false),
            CanvasMutation::CommitConnector { id } => self.commit_connector(id),
            CanvasMutation::CancelConnector { id } => self.cancel_connector(id),
            CanvasMutation::SetRoutingMode { id, mode } => self
                .with_connector(id, |c, host| c.set_routing_mode(mode, Some(host)))
                .unwrap_or(false),
            CanvasMutation::SetArrowHeads { id, start, end } => self
                .with_connector(id, |c, _| c.set_arrow_heads(start, end))
                .is_some(),
            CanvasMutation::DragHandle { id, role, x, y } => self
                .with_connector(id, |c, host| {
                    c.on_handle_dragged(role, Point::new(x, y), Some(host))
                })
                .unwrap_or(false),
            CanvasMutation::CommitEdit { id } => self
                .with_connector(id, |c, host| c.on_edit_committed(host))
                .unwrap_or(false),
        }
    }

    /// Feed an input event through a tool and apply what it produces.
    pub fn handle_input(&mut self, tool: &mut dyn Tool, event: &InputEvent) -> bool {
        let hit = event
            .position()
            .and_then(|(x, y)| self.hit_handle(Point::new(x, y), HANDLE_HIT_RADIUS));
        let mut changed = false;
        for mutation in tool.handle(event, hit) {
            changed |= self.apply(mutation);
        }
        changed
    }

    // ─── Shapes ──────────────────────────────────────────────────────────

    pub fn add_shape(&mut self, record: &ShapeRecord) -> Result<(), ConnectorError> {
        if !self.scene.add_record(record) {
            return Err(ConnectorError::DuplicateId {
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    /// Move a shape and everything bound to it or its subtree.
    pub fn move_shape(&mut self, id: ShapeId, delta: Vec2) -> bool {
        if let Some(connector) = self.connectors.get_mut(&id) {
            connector.translate(delta);
            return true;
        }
        if !self.scene.contains(id) {
            return false;
        }
        for target in self.scene.move_shape(id, delta) {
            for (owner, role) in self.subscriptions.listeners(target) {
                if let Some(connector) = self.connectors.get_mut(&owner) {
                    connector.on_target_moved(role, &self.scene);
                }
            }
        }
        true
    }

    /// Remove a shape (or connector). Connectors bound to a removed shape
    /// keep their binding but stop following it.
    pub fn remove_shape(&mut self, id: ShapeId) -> bool {
        if self.connectors.contains_key(&id) {
            return self.remove_connector(id);
        }
        let removed = self.scene.remove_shape(id);
        for gone in &removed {
            if let Some(mut connector) = self.connectors.remove(gone) {
                let mut host = Host::new(&mut self.scene, &mut self.subscriptions);
                connector.clear_bindings(&mut host);
            }
        }
        !removed.is_empty()
    }

    // ─── Connectors ──────────────────────────────────────────────────────

    /// Add a committed connector from its record and relink its bindings.
    pub fn add_connector(&mut self, record: &ConnectorRecord) -> Result<ShapeId, ConnectorError> {
        if self.scene.contains(record.id) {
            return Err(ConnectorError::DuplicateId {
                id: record.id.to_string(),
            });
        }
        let mut connector = ConnectorController::from_record(record, &self.config)?;
        self.scene
            .add_shape(record.id, ShapeKind::Connector, Point::ZERO, None);
        let mut host = Host::new(&mut self.scene, &mut self.subscriptions);
        connector.reconnect_bindings(&mut host);
        self.connectors.insert(record.id, connector);
        Ok(record.id)
    }

    pub fn begin_connector(&mut self, id: ShapeId, mode: RoutingMode, at: Point) -> bool {
        if self.scene.contains(id) {
            log::warn!("cannot begin connector {id}: id in use");
            return false;
        }
        let mut connector = ConnectorController::new(id, mode, at, &self.config);
        self.scene.add_shape(id, ShapeKind::Connector, Point::ZERO, None);
        let mut host = Host::new(&mut self.scene, &mut self.subscriptions);
        connector.set_draw_endpoints(at, at, Some(&mut host));
        self.connectors.insert(id, connector);
        true
    }

    /// Finish a drawing. Drags shorter than `min_draw_length` are discarded.
    pub fn commit_connector(&mut self, id: ShapeId) -> bool {
        let Some(length) = self.connectors.get(&id).and_then(|c| c.draw_length()) else {
            return false;
        };
        if length < self.config.min_draw_length {
            log::debug!("{id} too short ({length:.2}), discarding");
            self.cancel_connector(id);
            return false;
        }
        self.with_connector(id, |c, host| c.commit_drawing(Some(host)))
            .unwrap_or(false)
    }

    pub fn cancel_connector(&mut self, id: ShapeId) -> bool {
        if self
            .with_connector(id, |c, host| c.cancel_drawing(Some(host)))
            .is_none()
        {
            return false;
        }
        self.remove_connector(id)
    }

    pub fn remove_connector(&mut self, id: ShapeId) -> bool {
        let Some(mut connector) = self.connectors.remove(&id) else {
            return false;
        };
        let mut host = Host::new(&mut self.scene, &mut self.subscriptions);
        connector.clear_bindings(&mut host);
        self.scene.remove_shape(id);
        true
    }

    /// Topmost connector endpoint within `radius` of `point`.
    pub fn hit_handle(&self, point: Point, radius: f64) -> Option<HandleHit> {
        let ids = self.scene.shape_ids();
        ids.iter().rev().find_map(|id| {
            let connector = self.connectors.get(id)?;
            if connector.is_drawing() {
                return None;
            }
            Role::BOTH.into_iter().find_map(|role| {
                let p = connector.endpoint(role)?;
                (p.distance(point) <= radius).then_some(HandleHit {
                    connector: *id,
                    role,
                })
            })
        })
    }

    /// Connectors whose geometry changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<ShapeId> {
        let mut dirty: Vec<ShapeId> = self
            .connectors
            .iter_mut()
            .filter_map(|(id, c)| c.take_dirty().then_some(*id))
            .collect();
        dirty.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        dirty
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn to_snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            shapes: self.scene.to_records(),
            connectors: self.connectors().map(|c| c.to_record()).collect(),
            order: self.scene.shape_ids(),
        }
    }

    pub fn to_json(&self) -> Result<String, ConnectorError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Replace the canvas contents. Shapes and connectors that cannot be
    /// restored are skipped with a warning; bindings to missing targets are
    /// dropped. Shapes go in before connectors so bindings can relink, then
    /// the saved document order is restored.
    pub fn load_snapshot(&mut self, snapshot: &SceneSnapshot) {
        let ids: Vec<ShapeId> = self.connectors.keys().copied().collect();
        for id in ids {
            self.remove_connector(id);
        }
        self.scene = Scene::new();
        self.subscriptions = SubscriptionTable::new();

        for shape in &snapshot.shapes {
            if let Err(err) = self.add_shape(shape) {
                log::warn!("skipping shape: {err}");
            }
        }
        for record in &snapshot.connectors {
            if let Err(err) = self.add_connector(record) {
                log::warn!("skipping connector: {err}");
            }
        }
        self.scene.restack(&snapshot.order);
        log::debug!(
            "loaded {} shapes, {} connectors",
            snapshot.shapes.len(),
            self.connectors.len()
        );
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), ConnectorError> {
        let snapshot: SceneSnapshot = serde_json::from_str(json)?;
        self.load_snapshot(&snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas_with_box(id: &str) -> (Canvas, ShapeId) {
        let mut canvas = Canvas::default();
        let record = ShapeRecord::rect(id, 0.0, 0.0, 100.0, 50.0);
        canvas.add_shape(&record).unwrap();
        (canvas, record.id)
    }

    fn draw(canvas: &mut Canvas, id: ShapeId, start: Point, end: Point) -> bool {
        canvas.apply(CanvasMutation::BeginConnector {
            id,
            mode: RoutingMode::Straight,
            x: start.x,
            y: start.y,
        });
        canvas.apply(CanvasMutation::DrawConnector { id, start, end });
        canvas.apply(CanvasMutation::CommitConnector { id })
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (mut canvas, id) = canvas_with_box("canvas_dup");
        assert!(matches!(
            canvas.add_shape(&ShapeRecord::rect("canvas_dup", 1.0, 1.0, 1.0, 1.0)),
            Err(ConnectorError::DuplicateId { .. })
        ));
        assert!(!canvas.begin_connector(id, RoutingMode::Straight, Point::ZERO));
    }

    #[test]
    fn short_drags_are_discarded() {
        let (mut canvas, _) = canvas_with_box("canvas_short_box");
        let id = ShapeId::intern("canvas_short");
        let p = Point::new(500.0, 500.0);
        assert!(!draw(&mut canvas, id, p, p + Vec2::new(1.0, 0.0)));
        assert!(canvas.connector(id).is_none());
        assert!(!canvas.scene().contains(id));
    }

    #[test]
    fn moving_target_notifies_bound_connector() {
        let (mut canvas, target) = canvas_with_box("canvas_move_box");
        let id = ShapeId::intern("canvas_move_arrow");
        assert!(draw(&mut canvas, id, Point::new(-200.0, 25.0), Point::new(0.0, 25.0)));
        assert_eq!(
            canvas.connector(id).unwrap().binding(Role::End).map(|b| b.target),
            Some(target)
        );

        assert!(canvas.apply(CanvasMutation::MoveShape {
            id: target,
            dx: 10.0,
            dy: 10.0
        }));
        let (s, e) = canvas.connector(id).unwrap().endpoints().unwrap();
        assert!(s.distance(Point::new(-200.0, 25.0)) < 1e-9);
        assert!(e.distance(Point::new(10.0, 35.0)) < 1e-9);
    }

    #[test]
    fn removing_connector_disposes_subscriptions() {
        let (mut canvas, _) = canvas_with_box("canvas_rm_box");
        let id = ShapeId::intern("canvas_rm_arrow");
        draw(&mut canvas, id, Point::new(-200.0, 25.0), Point::new(0.0, 25.0));
        assert_eq!(canvas.subscriptions().len(), 1);
        assert!(canvas.apply(CanvasMutation::RemoveShape { id }));
        assert!(canvas.subscriptions().is_empty());
        assert!(canvas.connector(id).is_none());
        assert!(!canvas.apply(CanvasMutation::RemoveConnector { id }));
    }

    #[test]
    fn add_connector_mutation_relinks() {
        let (mut canvas, target) = canvas_with_box("canvas_add_box");
        let id = ShapeId::intern("canvas_add_arrow");
        draw(&mut canvas, id, Point::new(-200.0, 25.0), Point::new(0.0, 25.0));
        let record = canvas.connector(id).unwrap().to_record();
        assert!(canvas.apply(CanvasMutation::RemoveConnector { id }));

        assert!(canvas.apply(CanvasMutation::AddConnector {
            connector: Box::new(record.clone())
        }));
        assert!(!canvas.apply(CanvasMutation::AddConnector {
            connector: Box::new(record)
        }));
        assert_eq!(canvas.subscriptions().listeners(target).as_slice(), &[(id, Role::End)]);
    }

    #[test]
    fn hit_handle_finds_committed_endpoints() {
        let (mut canvas, _) = canvas_with_box("canvas_hit_box");
        let id = ShapeId::intern("canvas_hit_arrow");
        draw(&mut canvas, id, Point::new(-200.0, 25.0), Point::new(0.0, 25.0));
        assert_eq!(
            canvas.hit_handle(Point::new(-203.0, 27.0), HANDLE_HIT_RADIUS),
            Some(HandleHit {
                connector: id,
                role: Role::Start
            })
        );
        assert_eq!(canvas.hit_handle(Point::new(-100.0, 25.0), HANDLE_HIT_RADIUS), None);
    }

    #[test]
    fn dirty_connectors_are_reported_once() {
        let (mut canvas, _) = canvas_with_box("canvas_dirty_box");
        let id = ShapeId::intern("canvas_dirty_arrow");
        draw(&mut canvas, id, Point::new(-200.0, 25.0), Point::new(0.0, 25.0));
        assert_eq!(canvas.take_dirty(), vec![id]);
        assert!(canvas.take_dirty().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut canvas = Canvas::default();
        assert!(matches!(
            canvas.load_json("{ not json"),
            Err(ConnectorError::Json(_))
        ));
    }
}
