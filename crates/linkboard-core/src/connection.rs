//! Connections between endpoints and their interior control points.

use crate::endpoint::{CardId, Endpoint, NodeId, Side};
use kurbo::{BezPath, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a connection, derived from its source and target identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Derive the ID of a link from `source` to `target`.
    ///
    /// Format: `{sourceCard}-{sourceNode}-{targetCard}-{targetNode}`.
    pub fn derive(source: &Endpoint, target: &Endpoint) -> Self {
        Self(format!(
            "{}-{}-{}-{}",
            source.card_id, source.node_id, target.card_id, target.node_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a control point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControlPointId(pub Uuid);

impl ControlPointId {
    /// Create a new random control point ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ControlPointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControlPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "control-{}", self.0)
    }
}

/// A user-placed waypoint on a connection's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: ControlPointId,
    pub position: Point,
}

impl ControlPoint {
    /// Create a control point with a fresh ID.
    pub fn new(position: Point) -> Self {
        Self {
            id: ControlPointId::new(),
            position,
        }
    }
}

/// A directed link between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// Snapshot of the source endpoint.
    pub source: Endpoint,
    /// Snapshot of the target endpoint.
    pub target: Endpoint,
    /// Control points in insertion order. Use [`Connection::sorted_control_points`]
    /// for route order.
    #[serde(default)]
    pub control_points: Vec<ControlPoint>,
    /// Whether this connection is the current selection.
    #[serde(default)]
    pub selected: bool,
}

impl Connection {
    /// Create an unselected connection with no control points.
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: ConnectionId::derive(&source, &target),
            source,
            target,
            control_points: Vec::new(),
            selected: false,
        }
    }

    /// Check if this connection involves a specific card.
    pub fn involves_card(&self, card_id: &CardId) -> bool {
        self.source.card_id == *card_id || self.target.card_id == *card_id
    }

    /// Refresh the snapshot of every end bound to `(card_id, node_id)`.
    /// Returns how many ends changed.
    pub fn update_endpoint(
        &mut self,
        card_id: &CardId,
        node_id: &NodeId,
        position: Point,
        side: Side,
    ) -> usize {
        let mut updated = 0;
        for end in [&mut self.source, &mut self.target] {
            if end.is(card_id, node_id) {
                end.position = position;
                end.side = side;
                updated += 1;
            }
        }
        updated
    }

    /// Get a control point by ID.
    pub fn control_point(&self, id: ControlPointId) -> Option<&ControlPoint> {
        self.control_points.iter().find(|cp| cp.id == id)
    }

    /// Get a mutable control point by ID.
    pub fn control_point_mut(&mut self, id: ControlPointId) -> Option<&mut ControlPoint> {
        self.control_points.iter_mut().find(|cp| cp.id == id)
    }

    /// Control points ordered by ascending distance from the source snapshot.
    ///
    /// Insertion order never affects the route. The sort is stable, so equal
    /// distances keep insertion order.
    pub fn sorted_control_points(&self) -> Vec<&ControlPoint> {
        let origin = self.source.position;
        let mut points: Vec<&ControlPoint> = self.control_points.iter().collect();
        points.sort_by(|a, b| {
            a.position
                .distance(origin)
                .total_cmp(&b.position.distance(origin))
        });
        points
    }

    /// Points the route passes through: source, sorted control points, target.
    pub fn route(&self) -> Vec<Point> {
        let mut pts = Vec::with_capacity(self.control_points.len() + 2);
        pts.push(self.source.position);
        pts.extend(self.sorted_control_points().iter().map(|cp| cp.position));
        pts.push(self.target.position);
        pts
    }

    /// Midpoint between the source and target snapshots.
    pub fn midpoint(&self) -> Point {
        self.source.position.midpoint(self.target.position)
    }

    /// Build the renderable path.
    ///
    /// Without control points this is a cubic bezier leaving each end along
    /// its side's outward normal. With control points it is a smooth curve
    /// through [`Connection::route`].
    pub fn to_path(&self) -> BezPath {
        if self.control_points.is_empty() {
            let span = half_span(self.source.position, self.target.position);
            let c1 = side_handle(self.source.position, self.source.side, span);
            let c2 = side_handle(self.target.position, self.target.side, span);
            let mut path = BezPath::new();
            path.move_to(self.source.position);
            path.curve_to(c1, c2, self.target.position);
            path
        } else {
            flowing_path(&self.route())
        }
    }

    /// Check if a point lies within `tolerance` of the route polyline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.route()
            .windows(2)
            .any(|s| distance_to_segment(point, s[0], s[1]) <= tolerance)
    }
}

/// Half of the horizontal and vertical distance between two points.
pub(crate) fn half_span(a: Point, b: Point) -> Vec2 {
    Vec2::new((b.x - a.x).abs() * 0.5, (b.y - a.y).abs() * 0.5)
}

/// Bezier handle leaving `point` outward through `side`.
pub(crate) fn side_handle(point: Point, side: Side, span: Vec2) -> Point {
    let n = side.outward();
    Point::new(point.x + n.x * span.x, point.y + n.y * span.y)
}

/// Catmull-Rom spline through `points`, converted to cubic bezier segments.
fn flowing_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(&first) = points.first() else {
        return path;
    };
    path.move_to(first);

    let tension = 0.5;
    let last = points.len() - 1;
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];

        let t1 = (p2 - p0) * tension;
        let t2 = (p3 - p1) * tension;

        path.curve_to(p1 + t1 / 3.0, p2 - t2 / 3.0, p2);
    }
    path
}

/// Distance from a point to the segment `a`-`b`.
fn distance_to_segment(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    point.distance(a + seg * t)
}
