//! Live registry of every attachment point on every mounted card.

use crate::endpoint::{CardId, Endpoint, NodeId};

/// Point store for the magnetic snap resolver.
///
/// Registration never touches connections. Callers that change card geometry
/// are expected to propagate the new position to connections themselves.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    /// Registered endpoints in first-registration order.
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an endpoint or replace the one with the same node ID.
    ///
    /// A replaced endpoint keeps its slot, so iteration order stays stable
    /// across layout updates.
    pub fn register(&mut self, endpoint: Endpoint) {
        match self
            .endpoints
            .iter_mut()
            .find(|e| e.node_id == endpoint.node_id)
        {
            Some(existing) => *existing = endpoint,
            None => self.endpoints.push(endpoint),
        }
    }

    /// Remove an endpoint by node ID. Returns the removed endpoint, if any.
    pub fn unregister(&mut self, node_id: &NodeId) -> Option<Endpoint> {
        let index = self.endpoints.iter().position(|e| e.node_id == *node_id)?;
        Some(self.endpoints.remove(index))
    }

    /// Remove every endpoint owned by a card. Returns how many were removed.
    pub fn unregister_card(&mut self, card_id: &CardId) -> usize {
        let before = self.endpoints.len();
        self.endpoints.retain(|e| e.card_id != *card_id);
        before - self.endpoints.len()
    }

    /// Look up an endpoint by node ID.
    pub fn get(&self, node_id: &NodeId) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.node_id == *node_id)
    }

    /// All registered endpoints.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Iterate over registered endpoints.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Side;
    use kurbo::Point;

    #[test]
    fn test_register_upserts_by_node_id() {
        let mut registry = EndpointRegistry::new();
        registry.register(Endpoint::new("A", "n1", Side::Top, Point::new(0.0, 0.0)));
        registry.register(Endpoint::new("A", "n2", Side::Right, Point::new(10.0, 0.0)));
        registry.register(Endpoint::new("A", "n1", Side::Top, Point::new(5.0, 5.0)));

        assert_eq!(registry.len(), 2);
        // Replaced in place
        assert_eq!(registry.endpoints()[0].node_id, NodeId::from("n1"));
        assert_eq!(registry.endpoints()[0].position, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_unregister_missing_is_noop() {
        let mut registry = EndpointRegistry::new();
        registry.register(Endpoint::new("A", "n1", Side::Top, Point::ZERO));
        assert!(registry.unregister(&NodeId::from("missing")).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(&NodeId::from("n1")).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_card() {
        let mut registry = EndpointRegistry::new();
        registry.register(Endpoint::new("A", "a1", Side::Top, Point::ZERO));
        registry.register(Endpoint::new("A", "a2", Side::Left, Point::ZERO));
        registry.register(Endpoint::new("B", "b1", Side::Top, Point::ZERO));

        assert_eq!(registry.unregister_card(&CardId::from("A")), 2);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&NodeId::from("b1")).is_some());
    }
}
