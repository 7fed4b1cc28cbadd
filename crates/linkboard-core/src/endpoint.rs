//! Endpoint identity and the value type shared by the registry, connections and previews.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a card on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    /// Create a card ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of a single attachment point ("connection node").
///
/// Node IDs are globally unique, not just unique within a card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the node ID of an attachment point from its card, side and
    /// offset percentage along that side.
    pub fn derive(card_id: &CardId, side: Side, offset_percent: f64) -> Self {
        let offset = offset_percent.round() as i64;
        Self(format!("{card_id}-{side}-{offset}"))
    }

    /// Borrow the raw ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Card edge an attachment point sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All sides in clockwise order starting at the top.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// Lowercase name used in derived IDs.
    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }

    /// Unit vector pointing away from the card through this side (screen Y grows downward).
    pub fn outward(self) -> Vec2 {
        match self {
            Side::Top => Vec2::new(0.0, -1.0),
            Side::Right => Vec2::new(1.0, 0.0),
            Side::Bottom => Vec2::new(0.0, 1.0),
            Side::Left => Vec2::new(-1.0, 0.0),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A positioned attachment point on a card.
///
/// The registry owns the live copy. Connections and previews hold snapshots
/// of this value that are only refreshed by explicit position updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Owning card.
    pub card_id: CardId,
    /// Globally unique attachment point ID.
    pub node_id: NodeId,
    /// Card edge the point sits on.
    pub side: Side,
    /// Screen position.
    pub position: Point,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(
        card_id: impl Into<CardId>,
        node_id: impl Into<NodeId>,
        side: Side,
        position: Point,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            node_id: node_id.into(),
            side,
            position,
        }
    }

    /// Check whether this endpoint has the given `(card, node)` identity.
    pub fn is(&self, card_id: &CardId, node_id: &NodeId) -> bool {
        self.card_id == *card_id && self.node_id == *node_id
    }

    /// Check whether two endpoints refer to the same attachment point,
    /// ignoring position and side.
    pub fn same_identity(&self, other: &Endpoint) -> bool {
        self.is(&other.card_id, &other.node_id)
    }

    /// Euclidean distance from this endpoint to a point.
    pub fn distance_to(&self, point: Point) -> f64 {
        self.position.distance(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_node_id() {
        let card = CardId::from("card-1");
        let right = NodeId::derive(&card, Side::Right, 50.0);
        assert_eq!(right.as_str(), "card-1-right-50");
        let top = NodeId::derive(&card, Side::Top, 33.4);
        assert_eq!(top.as_str(), "card-1-top-33");
    }

    #[test]
    fn test_same_identity_ignores_geometry() {
        let a = Endpoint::new("A", "n1", Side::Top, Point::new(0.0, 0.0));
        let b = Endpoint::new("A", "n1", Side::Left, Point::new(10.0, 10.0));
        let c = Endpoint::new("B", "n1", Side::Top, Point::new(0.0, 0.0));
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_side_serializes_lowercase() {
        let json = serde_json::to_string(&Side::Bottom).unwrap();
        assert_eq!(json, "\"bottom\"");
    }

    #[test]
    fn test_outward_normals() {
        assert!((Side::Top.outward().y + 1.0).abs() < f64::EPSILON);
        assert!((Side::Left.outward().x + 1.0).abs() < f64::EPSILON);
    }
}
