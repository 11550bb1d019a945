//! Reference host surface: a tree of shapes stored in a petgraph graph.
//!
//! Edges go from parent → child. Groups are translation-only containers;
//! a shape's scene position is the sum of its ancestors' positions plus its
//! own. Rotation applies around the shape's own center.

use crate::surface::Surface;
use kaku_core::kurbo::{Affine, Point, Rect, Vec2};
use kaku_core::{HighlightConfig, Quad, ShapeId};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ─── Shapes ──────────────────────────────────────────────────────────────

/// What a scene node is. Sizes are in the node's own units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ShapeKind {
    #[serde(skip)]
    Root,
    Group,
    Rect {
        width: f64,
        height: f64,
    },
    Ellipse {
        rx: f64,
        ry: f64,
    },
    Diamond {
        width: f64,
        height: f64,
    },
    /// Placeholder for a connector; its geometry lives in the controller.
    #[serde(skip)]
    Connector,
}

impl ShapeKind {
    /// Size of the bounding box, for kinds that have one.
    fn size(&self) -> Option<(f64, f64)> {
        match *self {
            ShapeKind::Rect { width, height } | ShapeKind::Diamond { width, height } => {
                Some((width, height))
            }
            ShapeKind::Ellipse { rx, ry } => Some((rx * 2.0, ry * 2.0)),
            ShapeKind::Root | ShapeKind::Group | ShapeKind::Connector => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Top-left corner, relative to the parent.
    pub position: Point,
    /// Rotation about the center, in radians.
    pub angle: f64,
    /// Preview glow; `None` means the shape's own styling.
    pub highlight: Option<HighlightConfig>,
    /// Insertion sequence, used for document order.
    seq: u64,
}

/// Serialized form of a non-connector shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: ShapeId,
    #[serde(flatten)]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub angle: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ShapeId>,
}

impl ShapeRecord {
    pub fn rect(id: &str, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: ShapeId::intern(id),
            kind: ShapeKind::Rect { width, height },
            x,
            y,
            angle: 0.0,
            parent: None,
        }
    }

    pub fn in_group(mut self, parent: ShapeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

// ─── Scene ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Scene {
    pub graph: StableDiGraph<Shape, ()>,
    pub root: NodeIndex,
    /// Index from ShapeId → NodeIndex for fast lookup.
    pub id_index: HashMap<ShapeId, NodeIndex>,
    next_seq: u64,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(Shape {
            id: ShapeId::intern("root"),
            kind: ShapeKind::Root,
            position: Point::ZERO,
            angle: 0.0,
            highlight: None,
            seq: 0,
        });
        Self {
            graph,
            root,
            id_index: HashMap::new(),
            next_seq: 1,
        }
    }

    /// Add a shape under `parent` (the root when `None` or unknown).
    /// Returns `None` if the id is already taken.
    pub fn add_shape(
        &mut self,
        id: ShapeId,
        kind: ShapeKind,
        position: Point,
        parent: Option<ShapeId>,
    ) -> Option<NodeIndex> {
        if self.id_index.contains_key(&id) {
            return None;
        }
        let parent_idx = match parent {
            None => self.root,
            Some(p) => match self.index_of(p) {
                Some(idx) => idx,
                None => {
                    log::warn!("parent {p} of {id} not found, adding to root");
                    self.root
                }
            },
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self.graph.add_node(Shape {
            id,
            kind,
            position,
            angle: 0.0,
            highlight: None,
            seq,
        });
        self.graph.add_edge(parent_idx, idx, ());
        self.id_index.insert(id, idx);
        Some(idx)
    }

    pub fn add_record(&mut self, record: &ShapeRecord) -> bool {
        let Some(idx) = self.add_shape(
            record.id,
            record.kind,
            Point::new(record.x, record.y),
            record.parent,
        ) else {
            return false;
        };
        self.graph[idx].angle = record.angle;
        true
    }

    /// Remove a shape and its whole subtree. Returns the removed ids.
    pub fn remove_shape(&mut self, id: ShapeId) -> Vec<ShapeId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let doomed = self.subtree(idx);
        let mut removed = Vec::with_capacity(doomed.len());
        for i in doomed {
            if let Some(shape) = self.graph.remove_node(i) {
                self.id_index.remove(&shape.id);
                removed.push(shape.id);
            }
        }
        removed
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: ShapeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children in document (insertion) order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        children.sort_by_key(|c| self.graph[*c].seq);
        children
    }

    /// `idx` followed by all of its descendants, depth-first.
    fn subtree(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(i) = stack.pop() {
            out.push(i);
            stack.extend(self.children(i).into_iter().rev());
        }
        out
    }

    /// Translate a shape (and so its subtree). Returns every moved id that
    /// has geometry, the shape itself first.
    pub fn move_shape(&mut self, id: ShapeId, delta: Vec2) -> Vec<ShapeId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        self.graph[idx].position += delta;
        self.subtree(idx)
            .into_iter()
            .map(|i| &self.graph[i])
            .filter(|s| s.kind.size().is_some())
            .map(|s| s.id)
            .collect()
    }

    /// Scene-space offset of a node's parent frame.
    fn frame_origin(&self, idx: NodeIndex) -> Vec2 {
        let mut origin = Vec2::ZERO;
        let mut current = self.parent(idx);
        while let Some(p) = current {
            origin += self.graph[p].position.to_vec2();
            current = self.parent(p);
        }
        origin
    }

    /// Unrotated bounding box in scene coordinates.
    pub fn bounds(&self, id: ShapeId) -> Option<Rect> {
        let idx = self.index_of(id)?;
        let shape = &self.graph[idx];
        let (w, h) = shape.kind.size()?;
        let origin = shape.position + self.frame_origin(idx);
        Some(Rect::from_origin_size(origin, (w, h)))
    }

    /// Reassign document order: ids in `order` first, in that sequence, then
    /// every remaining node in its current order. Unknown and repeated ids
    /// are ignored.
    pub fn restack(&mut self, order: &[ShapeId]) {
        let current = self.subtree(self.root);
        let mut placed = HashSet::new();
        let mut seq = 1;
        let listed = order.iter().filter_map(|id| self.index_of(*id));
        for idx in listed.chain(current.into_iter().skip(1)).collect::<Vec<_>>() {
            if placed.insert(idx) {
                self.graph[idx].seq = seq;
                seq += 1;
            }
        }
        self.next_seq = seq;
    }

    /// Non-connector shapes as records, parents before children.
    pub fn to_records(&self) -> Vec<ShapeRecord> {
        let mut out = Vec::new();
        for idx in self.subtree(self.root).into_iter().skip(1) {
            let shape = &self.graph[idx];
            if shape.kind == ShapeKind::Connector {
                continue;
            }
            let parent = self
                .parent(idx)
                .filter(|p| *p != self.root)
                .map(|p| self.graph[p].id);
            out.push(ShapeRecord {
                id: shape.id,
                kind: shape.kind,
                x: shape.position.x,
                y: shape.position.y,
                angle: shape.angle,
                parent,
            });
        }
        out
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for Scene {
    fn shape_ids(&self) -> Vec<ShapeId> {
        self.subtree(self.root)
            .into_iter()
            .skip(1)
            .map(|i| self.graph[i].id)
            .collect()
    }

    fn contains(&self, id: ShapeId) -> bool {
        self.id_index.contains_key(&id)
    }

    fn is_connector(&self, id: ShapeId) -> bool {
        self.get(id)
            .is_some_and(|s| s.kind == ShapeKind::Connector)
    }

    fn center(&self, id: ShapeId) -> Option<Point> {
        self.bounds(id).map(|r| r.center())
    }

    fn outline(&self, id: ShapeId) -> Option<Quad> {
        let rect = self.bounds(id)?;
        let angle = self.get(id)?.angle;
        let mut quad = Quad::from_rect(rect);
        if angle != 0.0 {
            let rotate = Affine::rotate_about(angle, rect.center());
            for corner in &mut quad.corners {
                *corner = rotate * *corner;
            }
        }
        Some(quad)
    }

    fn set_highlight(&mut self, id: ShapeId, glow: Option<HighlightConfig>) {
        if let Some(shape) = self.get_mut(id) {
            shape.highlight = glow;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(w: f64, h: f64) -> ShapeKind {
        ShapeKind::Rect {
            width: w,
            height: h,
        }
    }

    #[test]
    fn scene_basics() {
        let mut scene = Scene::new();
        let a = ShapeId::intern("scene_a");
        assert!(scene.add_shape(a, rect(100.0, 50.0), Point::new(10.0, 20.0), None).is_some());
        assert!(scene.add_shape(a, rect(1.0, 1.0), Point::ZERO, None).is_none());
        assert_eq!(scene.center(a), Some(Point::new(60.0, 45.0)));
        assert_eq!(scene.shape_ids(), vec![a]);
    }

    #[test]
    fn group_translation_reaches_children() {
        let mut scene = Scene::new();
        let group = ShapeId::intern("scene_group");
        let child = ShapeId::intern("scene_child");
        scene.add_shape(group, ShapeKind::Group, Point::new(100.0, 100.0), None);
        scene.add_shape(child, rect(10.0, 10.0), Point::new(5.0, 5.0), Some(group));
        assert_eq!(scene.center(child), Some(Point::new(110.0, 110.0)));

        let moved = scene.move_shape(group, Vec2::new(-20.0, 0.0));
        assert_eq!(moved, vec![child]);
        assert_eq!(scene.center(child), Some(Point::new(90.0, 110.0)));
        assert_eq!(scene.center(group), None);
    }

    #[test]
    fn rotated_outline_keeps_center() {
        let mut scene = Scene::new();
        let id = ShapeId::intern("scene_rot");
        scene.add_shape(id, rect(40.0, 20.0), Point::ZERO, None);
        scene.get_mut(id).unwrap().angle = std::f64::consts::FRAC_PI_2;
        let quad = scene.outline(id).unwrap();
        let center = scene.center(id).unwrap();
        for corner in quad.corners {
            // Half-diagonal of a 40×20 box.
            assert!((corner.distance(center) - 500f64.sqrt()).abs() < 1e-9);
        }
        // Rotated a quarter turn, the box is now 20 wide.
        let xs: Vec<f64> = quad.corners.iter().map(|c| c.x).collect();
        let width = xs.iter().cloned().fold(f64::MIN, f64::max)
            - xs.iter().cloned().fold(f64::MAX, f64::min);
        assert!((width - 20.0).abs() < 1e-9);
    }

    #[test]
    fn remove_takes_subtree() {
        let mut scene = Scene::new();
        let group = ShapeId::intern("scene_rm_group");
        let child = ShapeId::intern("scene_rm_child");
        scene.add_shape(group, ShapeKind::Group, Point::ZERO, None);
        scene.add_shape(child, rect(1.0, 1.0), Point::ZERO, Some(group));
        assert_eq!(scene.remove_shape(group), vec![group, child]);
        assert!(!scene.contains(child));
    }

    #[test]
    fn records_preserve_hierarchy() {
        let mut scene = Scene::new();
        let group = ShapeId::intern("scene_rec_group");
        scene.add_shape(group, ShapeKind::Group, Point::new(1.0, 2.0), None);
        scene.add_record(&ShapeRecord::rect("scene_rec_child", 3.0, 4.0, 5.0, 6.0).in_group(group));
        scene.add_shape(
            ShapeId::intern("scene_rec_arrow"),
            ShapeKind::Connector,
            Point::ZERO,
            None,
        );

        let records = scene.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].parent, Some(group));

        let json = serde_json::to_value(&records[1]).unwrap();
        assert_eq!(json["type"], "rect");
        assert_eq!(json["width"], 5.0);
        let back: ShapeRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, records[1]);
    }

    #[test]
    fn restack_reorders_siblings() {
        let mut scene = Scene::new();
        let ids = ["scene_stack_a", "scene_stack_b", "scene_stack_c"].map(ShapeId::intern);
        for id in ids {
            scene.add_shape(id, rect(1.0, 1.0), Point::ZERO, None);
        }
        scene.restack(&[ids[2], ShapeId::intern("scene_stack_ghost"), ids[0], ids[2]]);
        assert_eq!(scene.shape_ids(), vec![ids[2], ids[0], ids[1]]);

        let late = ShapeId::intern("scene_stack_late");
        scene.add_shape(late, rect(1.0, 1.0), Point::ZERO, None);
        assert_eq!(scene.shape_ids().last(), Some(&late));
    }

    #[test]
    fn highlight_is_applied_and_restored() {
        let mut scene = Scene::new();
        let id = ShapeId::intern("scene_glow");
        scene.add_shape(id, rect(1.0, 1.0), Point::ZERO, None);
        scene.set_highlight(id, Some(HighlightConfig::default()));
        assert!(scene.get(id).unwrap().highlight.is_some());
        scene.set_highlight(id, None);
        assert!(scene.get(id).unwrap().highlight.is_none());
    }
}
