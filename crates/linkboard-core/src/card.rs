//! Cards and the attachment points laid out on their edges.

use crate::camera::Camera;
use crate::endpoint::{CardId, Endpoint, NodeId, Side};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An attachment point placed along one edge of a card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardNode {
    pub side: Side,
    /// Position along the edge, 0 to 100 (left to right, top to bottom).
    pub offset_percent: f64,
}

impl CardNode {
    pub fn new(side: Side, offset_percent: f64) -> Self {
        Self {
            side,
            offset_percent: offset_percent.clamp(0.0, 100.0),
        }
    }
}

/// A movable rectangle owning attachment points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    /// Bounds in world coordinates.
    pub bounds: Rect,
    pub nodes: Vec<CardNode>,
}

impl Card {
    /// Create a card with one attachment point centered on each side.
    pub fn new(id: impl Into<CardId>, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            bounds,
            nodes: Side::ALL.iter().map(|&side| CardNode::new(side, 50.0)).collect(),
        }
    }

    /// Replace the attachment points.
    pub fn with_nodes(mut self, nodes: Vec<CardNode>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Derived ID of one of this card's attachment points.
    pub fn node_id(&self, node: &CardNode) -> NodeId {
        NodeId::derive(&self.id, node.side, node.offset_percent)
    }

    /// World position of an attachment point on the card's edge.
    pub fn anchor(&self, node: &CardNode) -> Point {
        let b = self.bounds;
        let t = node.offset_percent / 100.0;
        match node.side {
            Side::Top => Point::new(b.x0 + b.width() * t, b.y0),
            Side::Right => Point::new(b.x1, b.y0 + b.height() * t),
            Side::Bottom => Point::new(b.x0 + b.width() * t, b.y1),
            Side::Left => Point::new(b.x0, b.y0 + b.height() * t),
        }
    }

    /// Screen-space endpoints for every attachment point.
    pub fn endpoints(&self, camera: &Camera) -> Vec<Endpoint> {
        self.nodes
            .iter()
            .map(|node| Endpoint {
                card_id: self.id.clone(),
                node_id: self.node_id(node),
                side: node.side,
                position: camera.world_to_screen(self.anchor(node)),
            })
            .collect()
    }

    /// Move the card by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.bounds = self.bounds + delta;
    }

    /// Check if a world point lies on the card.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }
}
