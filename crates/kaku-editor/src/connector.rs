//! Connector controller: geometry, bindings, and proximity for one arrow.
//!
//! A connector is in one of two states. While **drawing**, the two scene
//! points of the drag are the only geometry; the path is derived from them
//! each time. Once **committed**, the stored path is authoritative and the
//! drag points are gone.
//!
//! Committed paths live in path space. `offset` is the center of the path's
//! bounding box, and `transform` places `point - offset` in the scene:
//!
//! ```text
//! scene = transform * (path_point - offset)
//! ```
//!
//! Endpoint edits keep the *other* endpoint fixed in the scene: its scene
//! position is recorded before the edit and the transform is translated
//! back onto it afterwards.

use crate::bindings::BindingRegistry;
use crate::error::ConnectorError;
use crate::proximity::{Proximity, ProximityBinder};
use crate::surface::{Host, Surface};
use kaku_core::kurbo::{Affine, Point, Vec2};
use kaku_core::path;
use kaku_core::{
    ArrowHead, ArrowHeadStyle, Binding, BindingRecord, ConnectorConfig, ConnectorRecord, Path,
    PathCmd, Role, RoutingMode, ShapeId, cutoff_distance, generate_head,
};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq)]
enum Source {
    /// Scene-space drag points.
    Drawing { start: Point, end: Point },
    /// Path-space commands and their bounding-box center.
    Committed { path: Path, offset: Vec2 },
}

/// Everything a renderer needs, in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorGeometry {
    /// Shaft, pulled back behind closed heads.
    pub shaft: Path,
    pub start_head: ArrowHead,
    pub end_head: ArrowHead,
    /// Local → scene.
    pub transform: Affine,
}

impl ConnectorGeometry {
    fn empty(transform: Affine) -> Self {
        let none = || ArrowHead {
            style: ArrowHeadStyle::None,
            primitives: SmallVec::new(),
            closed: false,
        };
        Self {
            shaft: Path::new(),
            start_head: none(),
            end_head: none(),
            transform,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectorController {
    id: ShapeId,
    mode: RoutingMode,
    start_head: ArrowHeadStyle,
    end_head: ArrowHeadStyle,
    source: Source,
    transform: Affine,
    bindings: BindingRegistry,
    binder: ProximityBinder,
    config: ConnectorConfig,
    geometry: ConnectorGeometry,
    dirty: bool,
}

impl ConnectorController {
    /// Start drawing a connector at `at` (both drag points coincide).
    pub fn new(id: ShapeId, mode: RoutingMode, at: Point, config: &ConnectorConfig) -> Self {
        let mut controller = Self {
            id,
            mode,
            start_head: config.start_head,
            end_head: config.end_head,
            source: Source::Drawing { start: at, end: at },
            transform: Affine::translate(at.to_vec2()),
            bindings: BindingRegistry::default(),
            binder: ProximityBinder::default(),
            config: config.clone(),
            geometry: ConnectorGeometry::empty(Affine::IDENTITY),
            dirty: false,
        };
        controller.update();
        controller
    }

    /// Rebuild a committed connector from its serialized form.
    ///
    /// Bindings are stored but not subscribed; call
    /// [`reconnect_bindings`](Self::reconnect_bindings) once on a surface.
    pub fn from_record(
        record: &ConnectorRecord,
        config: &ConnectorConfig,
    ) -> Result<Self, ConnectorError> {
        let degenerate = || ConnectorError::DegeneratePath {
            id: record.id.to_string(),
        };
        let raw: Path = record.path_commands.iter().copied().collect();
        let path = if path::matches_mode(record.routing_mode, &raw) {
            raw
        } else {
            log::warn!(
                "{} path does not match {:?}, rebuilding from endpoints",
                record.id,
                record.routing_mode
            );
            path::convert(record.routing_mode, &raw).ok_or_else(degenerate)?
        };
        let offset = path::path_bounds(&path)
            .ok_or_else(degenerate)?
            .center()
            .to_vec2();

        let mut bindings = BindingRegistry::default();
        bindings.restore(Role::Start, record.start_binding.as_ref().map(Binding::from));
        bindings.restore(Role::End, record.end_binding.as_ref().map(Binding::from));

        let mut controller = Self {
            id: record.id,
            mode: record.routing_mode,
            start_head: record.start_arrow_head_style,
            end_head: record.end_arrow_head_style,
            source: Source::Committed { path, offset },
            transform: Affine::translate(offset),
            bindings,
            binder: ProximityBinder::default(),
            config: config.clone(),
            geometry: ConnectorGeometry::empty(Affine::IDENTITY),
            dirty: false,
        };
        controller.update();
        Ok(controller)
    }

    /// Serializable state. Path commands are in scene coordinates.
    pub fn to_record(&self) -> ConnectorRecord {
        let transform = self.transform;
        ConnectorRecord {
            id: self.id,
            routing_mode: self.mode,
            path_commands: self
                .local_path()
                .iter()
                .map(|cmd| cmd.map_points(|p| transform * p))
                .collect(),
            start_arrow_head_style: self.start_head,
            end_arrow_head_style: self.end_head,
            start_binding: self.bindings.get(Role::Start).map(BindingRecord::from),
            end_binding: self.bindings.get(Role::End).map(BindingRecord::from),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    pub fn arrow_heads(&self) -> (ArrowHeadStyle, ArrowHeadStyle) {
        (self.start_head, self.end_head)
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.source, Source::Drawing { .. })
    }

    pub fn binding(&self, role: Role) -> Option<&Binding> {
        self.bindings.get(role)
    }

    pub fn geometry(&self) -> &ConnectorGeometry {
        &self.geometry
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Candidates from the last proximity evaluation.
    pub fn pending(&self) -> &Proximity {
        self.binder.pending()
    }

    pub fn highlighted(&self) -> &[ShapeId] {
        self.binder.highlighted()
    }

    /// Committed path in path space. `None` while drawing.
    pub fn path(&self) -> Option<&[PathCmd]> {
        match &self.source {
            Source::Committed { path, .. } => Some(path),
            Source::Drawing { .. } => None,
        }
    }

    /// Scene position of one endpoint.
    pub fn endpoint(&self, role: Role) -> Option<Point> {
        match &self.source {
            Source::Drawing { start, end } => Some(match role {
                Role::Start => *start,
                Role::End => *end,
            }),
            Source::Committed { path, offset } => {
                let p = path::point_at(path, path::binding_anchor(self.mode, role))?;
                Some(self.transform * (p - *offset))
            }
        }
    }

    pub fn endpoints(&self) -> Option<(Point, Point)> {
        Some((self.endpoint(Role::Start)?, self.endpoint(Role::End)?))
    }

    /// Length of the current drag; `None` once committed.
    pub fn draw_length(&self) -> Option<f64> {
        match self.source {
            Source::Drawing { start, end } => Some(start.distance(end)),
            Source::Committed { .. } => None,
        }
    }

    /// Whether geometry changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Move the drag points. On a surface, re-evaluates proximity and
    /// refreshes the candidate glow. No-op once committed.
    pub fn set_draw_endpoints(
        &mut self,
        start: Point,
        end: Point,
        host: Option<&mut Host<'_>>,
    ) -> bool {
        let Source::Drawing { start: s, end: e } = &mut self.source else {
            return false;
        };
        *s = start;
        *e = end;
        self.transform = Affine::translate(start.midpoint(end).to_vec2());
        self.update();
        if let Some(host) = host {
            self.binder.preview(
                start,
                end,
                &mut *host.surface,
                self.config.snap_threshold,
                self.config.highlight,
            );
        }
        true
    }

    /// Freeze the drawn geometry and bind whatever was pending from the
    /// last proximity check.
    pub fn commit_drawing(&mut self, host: Option<&mut Host<'_>>) -> bool {
        let Source::Drawing { start, end } = self.source else {
            return false;
        };
        let mid = start.midpoint(end);
        let drawn = path::build_path(self.mode, (start - mid).to_point(), (end - mid).to_point());
        let center = path::path_bounds(&drawn)
            .map(|r| r.center().to_vec2())
            .unwrap_or(Vec2::ZERO);
        self.transform = Affine::translate(mid.to_vec2()) * Affine::translate(center);
        self.source = Source::Committed {
            path: path::rescale(&drawn, center),
            offset: Vec2::ZERO,
        };
        if let Some(host) = host {
            self.finalize_bindings(host);
        }
        self.update();
        log::debug!("{} committed as {:?}", self.id, self.mode);
        true
    }

    /// Abandon the gesture: restore highlights and drop pending candidates.
    pub fn cancel_drawing(&mut self, host: Option<&mut Host<'_>>) {
        match host {
            Some(host) => self.binder.cancel(&mut *host.surface),
            None => self.binder = ProximityBinder::default(),
        }
        if let Source::Drawing { start, end } = &mut self.source {
            *end = *start;
            self.transform = Affine::translate(start.to_vec2());
            self.update();
        }
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Switch routing mode. Endpoints, bindings, and the start endpoint's
    /// scene position survive the switch.
    pub fn set_routing_mode(&mut self, mode: RoutingMode, mut host: Option<&mut Host<'_>>) -> bool {
        if mode == self.mode {
            return false;
        }
        let old = self.mode;
        self.mode = mode;
        if self.is_drawing() {
            self.update();
            return true;
        }

        let kept = Role::BOTH.map(|role| self.bindings.get(role).copied());
        if let Some(host) = host.as_deref_mut() {
            for role in Role::BOTH {
                self.bindings.detach(self.id, role, host.subscriptions);
            }
        }

        let converted = self.edit_path(Role::Start, old, |path, _| {
            match path::convert(mode, path) {
                Some(new_path) => {
                    *path = new_path;
                    true
                }
                None => false,
            }
        });
        if !converted {
            log::warn!("{} could not be converted to {mode:?}", self.id);
        }

        for (role, binding) in Role::BOTH.into_iter().zip(kept) {
            let Some(binding) = binding else { continue };
            match host.as_deref_mut() {
                Some(host) => self.bindings.attach(self.id, role, binding, host.subscriptions),
                None => self.bindings.restore(role, Some(binding)),
            }
        }
        self.update();
        true
    }

    pub fn set_arrow_heads(&mut self, start: ArrowHeadStyle, end: ArrowHeadStyle) {
        self.start_head = start;
        self.end_head = end;
        self.update();
    }

    /// Move one endpoint to a scene point, then rebind both ends.
    pub fn on_handle_dragged(
        &mut self,
        role: Role,
        point: Point,
        host: Option<&mut Host<'_>>,
    ) -> bool {
        if !self.move_path_point(role, point) {
            return false;
        }
        self.update();
        if let Some(host) = host {
            self.on_edit_committed(host);
        }
        true
    }

    /// Translate the whole connector. Bindings are re-evaluated by the
    /// following [`on_edit_committed`](Self::on_edit_committed).
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.source {
            Source::Drawing { start, end } => {
                *start += delta;
                *end += delta;
            }
            Source::Committed { .. } => {}
        }
        self.transform = Affine::translate(delta) * self.transform;
        self.update();
    }

    /// Re-evaluate proximity for both endpoints and finalize bindings.
    pub fn on_edit_committed(&mut self, host: &mut Host<'_>) -> bool {
        if self.is_drawing() {
            return false;
        }
        let Some((start, end)) = self.endpoints() else {
            return false;
        };
        self.binder.preview(
            start,
            end,
            &mut *host.surface,
            self.config.snap_threshold,
            self.config.highlight,
        );
        self.finalize_bindings(host);
        true
    }

    // ─── Bindings ────────────────────────────────────────────────────────

    /// Follow a bound target to its new position.
    pub fn on_target_moved(&mut self, role: Role, surface: &dyn Surface) -> bool {
        let Some(binding) = self.bindings.get(role).copied() else {
            return false;
        };
        let Some(center) = surface.center(binding.target) else {
            log::trace!("{} target {} is gone, ignoring move", self.id, binding.target);
            return false;
        };
        if !self.move_path_point(role, binding.resolve(center)) {
            return false;
        }
        self.update();
        true
    }

    /// Re-subscribe restored bindings; drops those whose target is missing.
    pub fn reconnect_bindings(&mut self, host: &mut Host<'_>) -> usize {
        self.bindings.relink(self.id, &*host.surface, host.subscriptions)
    }

    /// Drop both bindings, dispose subscriptions, and restore highlights.
    pub fn clear_bindings(&mut self, host: &mut Host<'_>) {
        self.binder.cancel(&mut *host.surface);
        self.bindings.clear(self.id, host.subscriptions);
    }

    fn finalize_bindings(&mut self, host: &mut Host<'_>) {
        self.binder.clear_highlights(&mut *host.surface);
        let pending = self.binder.take_pending();
        for role in Role::BOTH {
            let captured = pending.get(role).and_then(|c| {
                let center = host.surface.center(c.shape)?;
                Some(Binding::capture(c.shape, c.point, center))
            });
            match captured {
                Some(binding) => self.bindings.attach(self.id, role, binding, host.subscriptions),
                None => {
                    self.bindings.detach(self.id, role, host.subscriptions);
                }
            }
        }
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Recompute shaft and heads from the current state.
    pub fn update(&mut self) {
        let local = self.local_path();
        let l = self.config.head_length;
        self.geometry = match path::extract_endpoints(&local) {
            Some(ep) => {
                let angles = path::calculate_angles(&ep);
                ConnectorGeometry {
                    shaft: path::shorten(
                        &local,
                        cutoff_distance(self.start_head, l),
                        cutoff_distance(self.end_head, l),
                        self.config.max_shorten_ratio,
                    ),
                    start_head: generate_head(ep.start, angles.start, self.start_head, l),
                    end_head: generate_head(ep.end, angles.end, self.end_head, l),
                    transform: self.transform,
                }
            }
            None => ConnectorGeometry::empty(self.transform),
        };
        self.dirty = true;
    }

    /// Path in local coordinates, centered on the connector's origin.
    fn local_path(&self) -> Path {
        match &self.source {
            Source::Drawing { start, end } => {
                let mid = start.midpoint(*end);
                path::build_path(self.mode, (*start - mid).to_point(), (*end - mid).to_point())
            }
            Source::Committed { path, offset } => path::rescale(path, *offset),
        }
    }

    /// Overwrite one endpoint with a scene point, keeping the other fixed.
    fn move_path_point(&mut self, role: Role, scene_point: Point) -> bool {
        let mode = self.mode;
        let local = self.transform.inverse() * scene_point;
        self.edit_path(role.opposite(), mode, |path, offset| {
            if !path::set_point_at(path, path::binding_anchor(mode, role), local + offset) {
                return false;
            }
            path::reroute(mode, path);
            true
        })
    }

    /// Apply `edit` to the committed path, recompute the bounding-box
    /// offset, and translate so the `keep` endpoint (addressed under
    /// `anchor_mode`) stays where it was in the scene.
    fn edit_path(
        &mut self,
        keep: Role,
        anchor_mode: RoutingMode,
        edit: impl FnOnce(&mut Path, Vec2) -> bool,
    ) -> bool {
        let Source::Committed { path, offset } = &mut self.source else {
            return false;
        };
        let Some(kept) = path::point_at(path, path::binding_anchor(anchor_mode, keep)) else {
            return false;
        };
        let before = self.transform * (kept - *offset);
        if !edit(path, *offset) {
            return false;
        }
        if let Some(bounds) = path::path_bounds(path) {
            *offset = bounds.center().to_vec2();
        }
        let after = self.transform * (kept - *offset);
        self.transform = Affine::translate(before - after) * self.transform;
        true
    }
}
