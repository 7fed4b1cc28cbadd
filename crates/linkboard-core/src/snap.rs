//! Magnetic snapping of a dragged link end onto nearby endpoints.

use crate::endpoint::{CardId, Endpoint, NodeId};
use crate::registry::EndpointRegistry;
use kurbo::Point;

/// Default distance (in screen units) within which a link end snaps to an endpoint.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 50.0;

/// Result of a snap query.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The point the link end should be drawn at.
    pub point: Point,
    /// The endpoint that was snapped to, if any.
    pub target: Option<Endpoint>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            target: None,
        }
    }

    /// Create a result snapped onto an endpoint's exact position.
    pub fn snapped(target: Endpoint) -> Self {
        Self {
            point: target.position,
            target: Some(target),
        }
    }

    /// Check if snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.target.is_some()
    }
}

/// Nearest-endpoint lookup used on every pointer move of a link drag.
///
/// Implementations must never return the excluded `(card, node)` pair and
/// must return `None` when the nearest candidate is farther than their
/// threshold.
pub trait SnapResolver: std::fmt::Debug {
    /// Find the nearest registered endpoint to `cursor`, excluding the link's own source.
    fn find_nearest(
        &self,
        registry: &EndpointRegistry,
        cursor: Point,
        exclude_card: &CardId,
        exclude_node: &NodeId,
    ) -> Option<Endpoint>;

    /// Snap distance threshold.
    fn threshold(&self) -> f64;

    /// Resolve the drawn position of a link end against the registry.
    fn snap(
        &self,
        registry: &EndpointRegistry,
        cursor: Point,
        exclude_card: &CardId,
        exclude_node: &NodeId,
    ) -> SnapResult {
        match self.find_nearest(registry, cursor, exclude_card, exclude_node) {
            Some(target) => SnapResult::snapped(target),
            None => SnapResult::none(cursor),
        }
    }
}

/// Linear scan over every registered endpoint.
///
/// O(n) per query. Large graphs can swap in a spatially indexed resolver
/// behind [`SnapResolver`] without touching the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestScan {
    pub threshold: f64,
}

impl NearestScan {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for NearestScan {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_THRESHOLD)
    }
}

impl SnapResolver for NearestScan {
    fn find_nearest(
        &self,
        registry: &EndpointRegistry,
        cursor: Point,
        exclude_card: &CardId,
        exclude_node: &NodeId,
    ) -> Option<Endpoint> {
        nearest_endpoint(registry.iter(), cursor, exclude_card, exclude_node)
            .filter(|(_, dist)| *dist <= self.threshold)
            .map(|(endpoint, _)| endpoint.clone())
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Find the globally nearest endpoint and its distance, skipping the excluded pair.
///
/// Exact ties keep the first endpoint in iteration order.
pub fn nearest_endpoint<'a>(
    endpoints: impl IntoIterator<Item = &'a Endpoint>,
    cursor: Point,
    exclude_card: &CardId,
    exclude_node: &NodeId,
) -> Option<(&'a Endpoint, f64)> {
    let mut best: Option<(&Endpoint, f64)> = None;

    for endpoint in endpoints {
        if endpoint.is(exclude_card, exclude_node) {
            continue;
        }
        let dist = endpoint.distance_to(cursor);
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((endpoint, dist)),
        }
    }

    best
}
