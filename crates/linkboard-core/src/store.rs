//! Authoritative set of committed connections.

use crate::connection::{Connection, ConnectionId, ControlPoint, ControlPointId};
use crate::endpoint::{CardId, NodeId, Side};
use kurbo::Point;
use thiserror::Error;

/// Rejected connection store mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("Connection already exists: {0}")]
    DuplicateId(ConnectionId),
    #[error("Endpoint already has an outgoing connection: {0}")]
    SourceAlreadyConnected(NodeId),
    #[error("Connection source and target are the same endpoint")]
    SelfLoop,
    #[error("Connection not found: {0}")]
    NotFound(ConnectionId),
    #[error("Control point not found: {0}")]
    ControlPointNotFound(ControlPointId),
    #[error("Connection is not selected: {0}")]
    NotSelected(ConnectionId),
}

/// Result type for store mutations.
pub type StoreResult<T> = Result<T, ConnectionError>;

/// Ordered store of connections.
///
/// Invariants held by every mutation:
/// - connection IDs are unique;
/// - a source node emits at most one connection;
/// - at most one connection is selected, and `selected_id` names it.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStore {
    connections: Vec<Connection>,
    selected: Option<ConnectionId>,
}

impl ConnectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection.
    ///
    /// Duplicate IDs and second outgoing connections from the same source
    /// are rejected, never replaced.
    pub fn add(&mut self, connection: Connection) -> StoreResult<&Connection> {
        let end = self.connections.len();
        self.insert(end, connection)
    }

    /// Insert a connection at index `at`, clamped to the end. Rejects the
    /// same connections as [`ConnectionStore::add`].
    pub fn insert(&mut self, at: usize, mut connection: Connection) -> StoreResult<&Connection> {
        if connection.source.same_identity(&connection.target) {
            return Err(ConnectionError::SelfLoop);
        }
        if self.contains(&connection.id) {
            return Err(ConnectionError::DuplicateId(connection.id));
        }
        if self.has_outgoing(&connection.source.node_id) {
            return Err(ConnectionError::SourceAlreadyConnected(
                connection.source.node_id,
            ));
        }
        connection.selected = false;
        let at = at.min(self.connections.len());
        self.connections.insert(at, connection);
        Ok(&self.connections[at])
    }

    /// Remove a connection, clearing the selection if it was selected.
    pub fn remove(&mut self, id: &ConnectionId) -> StoreResult<Connection> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ConnectionError::NotFound(id.clone()))?;
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        let mut removed = self.connections.remove(index);
        removed.selected = false;
        Ok(removed)
    }

    /// Replace the position and side snapshot of every connection end bound
    /// to `(card_id, node_id)`. Returns how many connection ends changed.
    pub fn update_position(
        &mut self,
        card_id: &CardId,
        node_id: &NodeId,
        position: Point,
        side: Side,
    ) -> usize {
        self.connections
            .iter_mut()
            .map(|c| c.update_endpoint(card_id, node_id, position, side))
            .sum()
    }

    /// Select exactly one connection, or clear the selection with `None`.
    ///
    /// Selecting an unknown ID clears the selection and returns an error.
    pub fn select(&mut self, id: Option<&ConnectionId>) -> StoreResult<()> {
        let found = id.is_none_or(|id| self.contains(id));
        self.selected = if found { id.cloned() } else { None };
        for connection in &mut self.connections {
            connection.selected = self.selected.as_ref() == Some(&connection.id);
        }
        match id {
            Some(id) if !found => Err(ConnectionError::NotFound(id.clone())),
            _ => Ok(()),
        }
    }

    /// Append a control point to a connection. Returns the new point's ID.
    pub fn add_control_point(
        &mut self,
        id: &ConnectionId,
        position: Point,
    ) -> StoreResult<ControlPointId> {
        let connection = self.get_mut_or_err(id)?;
        let point = ControlPoint::new(position);
        let point_id = point.id;
        connection.control_points.push(point);
        Ok(point_id)
    }

    /// Move a control point.
    pub fn update_control_point(
        &mut self,
        id: &ConnectionId,
        point_id: ControlPointId,
        position: Point,
    ) -> StoreResult<()> {
        let point = self
            .get_mut_or_err(id)?
            .control_point_mut(point_id)
            .ok_or(ConnectionError::ControlPointNotFound(point_id))?;
        point.position = position;
        Ok(())
    }

    /// Remove a control point.
    pub fn remove_control_point(
        &mut self,
        id: &ConnectionId,
        point_id: ControlPointId,
    ) -> StoreResult<ControlPoint> {
        let connection = self.get_mut_or_err(id)?;
        let index = connection
            .control_points
            .iter()
            .position(|cp| cp.id == point_id)
            .ok_or(ConnectionError::ControlPointNotFound(point_id))?;
        Ok(connection.control_points.remove(index))
    }

    /// Get a connection by ID.
    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == *id)
    }

    /// Check whether a connection exists.
    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.index_of(id).is_some()
    }

    /// The connection emitted by a source node, if any.
    pub fn outgoing(&self, node_id: &NodeId) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.source.node_id == *node_id)
    }

    /// Check whether a node already emits a connection.
    pub fn has_outgoing(&self, node_id: &NodeId) -> bool {
        self.outgoing(node_id).is_some()
    }

    /// Connections touching a card on either end.
    pub fn connections_for_card<'a>(
        &'a self,
        card_id: &'a CardId,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.involves_card(card_id))
    }

    /// All connections in insertion order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// ID of the selected connection.
    pub fn selected_id(&self) -> Option<&ConnectionId> {
        self.selected.as_ref()
    }

    /// The selected connection.
    pub fn selected(&self) -> Option<&Connection> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Position of a connection in insertion order.
    pub fn index_of(&self, id: &ConnectionId) -> Option<usize> {
        self.connections.iter().position(|c| c.id == *id)
    }

    fn get_mut_or_err(&mut self, id: &ConnectionId) -> StoreResult<&mut Connection> {
        self.connections
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| ConnectionError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Endpoint;

    fn link(src_card: &str, src: &str, dst_card: &str, dst: &str) -> Connection {
        Connection::new(
            Endpoint::new(src_card, src, Side::Right, Point::new(0.0, 0.0)),
            Endpoint::new(dst_card, dst, Side::Left, Point::new(100.0, 0.0)),
        )
    }

    #[test]
    fn test_add_and_get() {
        let mut store = ConnectionStore::new();
        let id = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();
        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_some());
        assert!(store.has_outgoing(&"a1".into()));
        assert!(!store.has_outgoing(&"b1".into()));
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        let err = store.add(link("A", "a1", "B", "b1")).unwrap_err();
        assert!(matches!(err, ConnectionError::DuplicateId(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_second_outgoing() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        let err = store.add(link("A", "a1", "C", "c1")).unwrap_err();
        assert_eq!(err, ConnectionError::SourceAlreadyConnected("a1".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_rejects_self_loop() {
        let mut store = ConnectionStore::new();
        let err = store.add(link("A", "a1", "A", "a1")).unwrap_err();
        assert_eq!(err, ConnectionError::SelfLoop);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut store = ConnectionStore::new();
        let id = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();
        store.select(Some(&id)).unwrap();
        assert_eq!(store.selected_id(), Some(&id));

        store.remove(&id).unwrap();
        assert!(store.selected_id().is_none());
        let missing = store.remove(&id);
        assert!(matches!(missing, Err(ConnectionError::NotFound(_))));
    }

    #[test]
    fn test_select_is_exclusive() {
        let mut store = ConnectionStore::new();
        let a = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();
        let b = store.add(link("B", "b2", "C", "c1")).unwrap().id.clone();

        store.select(Some(&a)).unwrap();
        store.select(Some(&b)).unwrap();
        let selected: Vec<_> = store.connections().iter().filter(|c| c.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, b);

        store.select(None).unwrap();
        assert!(store.connections().iter().all(|c| !c.selected));
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut store = ConnectionStore::new();
        let a = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();
        store.select(Some(&a)).unwrap();
        assert!(store.select(Some(&"missing".into())).is_err());
        assert!(store.selected_id().is_none());
        assert!(!store.get(&a).unwrap().selected);
    }

    #[test]
    fn test_update_position_matches_both_ends() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        store.add(link("B", "b1", "C", "c1")).unwrap();
        let untouched = store.add(link("C", "c2", "D", "d1")).unwrap().clone();

        let moved = Point::new(7.0, 8.0);
        let n = store.update_position(&"B".into(), &"b1".into(), moved, Side::Top);
        assert_eq!(n, 2);

        let conns = store.connections();
        assert_eq!(conns[0].target.position, moved);
        assert_eq!(conns[0].target.side, Side::Top);
        assert_eq!(conns[0].source.position, Point::new(0.0, 0.0));
        assert_eq!(conns[1].source.position, moved);
        assert_eq!(conns[2], untouched);
    }

    #[test]
    fn test_insert_at_index_keeps_checks() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        store.add(link("B", "b2", "C", "c1")).unwrap();

        let front = link("C", "c2", "A", "a2");
        let front_id = store.insert(0, front).unwrap().id.clone();
        assert_eq!(store.index_of(&front_id), Some(0));
        let back = link("D", "d1", "A", "a2");
        let back_id = store.insert(99, back).unwrap().id.clone();
        assert_eq!(store.index_of(&back_id), Some(3));

        let err = store.insert(0, link("A", "a1", "D", "d2")).unwrap_err();
        assert_eq!(err, ConnectionError::SourceAlreadyConnected("a1".into()));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_connections_for_card() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        store.add(link("B", "b2", "C", "c1")).unwrap();
        store.add(link("C", "c2", "D", "d1")).unwrap();

        let card = CardId::from("B");
        let ids: Vec<&str> = store
            .connections_for_card(&card)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["A-a1-B-b1", "B-b2-C-c1"]);
    }

    #[test]
    fn test_update_position_requires_card_and_node() {
        let mut store = ConnectionStore::new();
        store.add(link("A", "a1", "B", "b1")).unwrap();
        let n = store.update_position(&"Z".into(), &"b1".into(), Point::ZERO, Side::Top);
        assert_eq!(n, 0);
    }

    #[test]
    fn test_control_point_lifecycle() {
        let mut store = ConnectionStore::new();
        let id = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();

        let cp = store.add_control_point(&id, Point::ZERO).unwrap();
        let moved = Point::new(60.0, 30.0);
        store.update_control_point(&id, cp, moved).unwrap();
        assert_eq!(
            store.get(&id).unwrap().control_point(cp).unwrap().position,
            Point::new(60.0, 30.0)
        );

        let removed = store.remove_control_point(&id, cp).unwrap();
        assert_eq!(removed.id, cp);
        assert!(store.get(&id).unwrap().control_points.is_empty());
    }

    #[test]
    fn test_control_point_not_found() {
        let mut store = ConnectionStore::new();
        let id = store.add(link("A", "a1", "B", "b1")).unwrap().id.clone();
        let missing = ControlPointId::new();

        assert_eq!(
            store.update_control_point(&id, missing, Point::ZERO),
            Err(ConnectionError::ControlPointNotFound(missing))
        );
        assert!(matches!(
            store.add_control_point(&"nope".into(), Point::ZERO),
            Err(ConnectionError::NotFound(_))
        ));
        assert!(store.get(&id).unwrap().control_points.is_empty());
    }
}
