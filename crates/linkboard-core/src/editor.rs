//! Interactive editing of control points on the selected connection.

use crate::connection::{ConnectionId, ControlPointId};
use crate::store::{ConnectionError, ConnectionStore, StoreResult};
use kurbo::Point;

/// The control point currently held by the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraggedControlPoint {
    pub connection_id: ConnectionId,
    pub point_id: ControlPointId,
}

/// Control point editing sub-state.
///
/// Adding, grabbing and removing points is only possible on the selected
/// connection. At most one point is dragged at a time.
#[derive(Debug, Clone, Default)]
pub struct ControlPointEditor {
    dragging: Option<DraggedControlPoint>,
}

impl ControlPointEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The point being dragged, if any.
    pub fn dragging(&self) -> Option<&DraggedControlPoint> {
        self.dragging.as_ref()
    }

    /// Check if a point is being dragged.
    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Add a point to `connection_id` if it is the selected connection.
    pub fn add_to_selected(
        &self,
        store: &mut ConnectionStore,
        connection_id: &ConnectionId,
        position: Point,
    ) -> StoreResult<ControlPointId> {
        require_selected(store, connection_id)?;
        store.add_control_point(connection_id, position)
    }

    /// Remove a point from the selected connection, releasing it if it was being dragged.
    pub fn remove_from_selected(
        &mut self,
        store: &mut ConnectionStore,
        connection_id: &ConnectionId,
        point_id: ControlPointId,
    ) -> StoreResult<()> {
        require_selected(store, connection_id)?;
        store.remove_control_point(connection_id, point_id)?;
        self.forget_point(point_id);
        Ok(())
    }

    /// Grab a point of the selected connection. Replaces any previous grab.
    ///
    /// Fails with `NotSelected` when the point belongs to a connection that
    /// is not the selection.
    pub fn begin_drag(
        &mut self,
        store: &ConnectionStore,
        point_id: ControlPointId,
    ) -> StoreResult<()> {
        let owner = store
            .connections()
            .iter()
            .find(|c| c.control_point(point_id).is_some())
            .ok_or(ConnectionError::ControlPointNotFound(point_id))?;
        if store.selected_id() != Some(&owner.id) {
            return Err(ConnectionError::NotSelected(owner.id.clone()));
        }
        self.dragging = Some(DraggedControlPoint {
            connection_id: owner.id.clone(),
            point_id,
        });
        Ok(())
    }

    /// Move the grabbed point. Returns `false` when nothing is grabbed or the
    /// point no longer exists.
    pub fn drag_to(&self, store: &mut ConnectionStore, position: Point) -> bool {
        let Some(dragged) = &self.dragging else {
            return false;
        };
        store
            .update_control_point(&dragged.connection_id, dragged.point_id, position)
            .is_ok()
    }

    /// Release the grabbed point.
    pub fn end_drag(&mut self) -> Option<DraggedControlPoint> {
        self.dragging.take()
    }

    /// Drop the grab if it refers to a point that was removed.
    pub fn forget_point(&mut self, point_id: ControlPointId) {
        if self
            .dragging
            .as_ref()
            .is_some_and(|d| d.point_id == point_id)
        {
            self.dragging = None;
        }
    }

    /// Drop the grab if it belongs to a connection that was removed or deselected.
    pub fn forget_connection(&mut self, connection_id: &ConnectionId) {
        if self
            .dragging
            .as_ref()
            .is_some_and(|d| d.connection_id == *connection_id)
        {
            self.dragging = None;
        }
    }
}

fn require_selected(store: &ConnectionStore, connection_id: &ConnectionId) -> StoreResult<()> {
    if !store.contains(connection_id) {
        return Err(ConnectionError::NotFound(connection_id.clone()));
    }
    if store.selected_id() != Some(connection_id) {
        return Err(ConnectionError::NotSelected(connection_id.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::endpoint::{Endpoint, Side};

    fn store_with_link() -> (ConnectionStore, ConnectionId) {
        let mut store = ConnectionStore::new();
        let id = store
            .add(Connection::new(
                Endpoint::new("A", "a1", Side::Right, Point::ZERO),
                Endpoint::new("B", "b1", Side::Left, Point::new(100.0, 0.0)),
            ))
            .unwrap()
            .id
            .clone();
        (store, id)
    }

    #[test]
    fn test_add_requires_selection() {
        let (mut store, id) = store_with_link();
        let editor = ControlPointEditor::new();

        let err = editor
            .add_to_selected(&mut store, &id, Point::new(50.0, 50.0))
            .unwrap_err();
        assert_eq!(err, ConnectionError::NotSelected(id.clone()));

        store.select(Some(&id)).unwrap();
        editor
            .add_to_selected(&mut store, &id, Point::new(50.0, 50.0))
            .unwrap();
        assert_eq!(store.get(&id).unwrap().control_points.len(), 1);
    }

    #[test]
    fn test_drag_moves_point() {
        let (mut store, id) = store_with_link();
        store.select(Some(&id)).unwrap();
        let mut editor = ControlPointEditor::new();
        let cp = editor
            .add_to_selected(&mut store, &id, Point::new(50.0, 50.0))
            .unwrap();

        editor.begin_drag(&store, cp).unwrap();
        assert!(editor.drag_to(&mut store, Point::new(55.0, 70.0)));
        assert_eq!(
            store.get(&id).unwrap().control_point(cp).unwrap().position,
            Point::new(55.0, 70.0)
        );

        assert!(editor.end_drag().is_some());
        assert!(!editor.drag_to(&mut store, Point::ZERO));
    }

    #[test]
    fn test_single_drag_target() {
        let (mut store, id) = store_with_link();
        store.select(Some(&id)).unwrap();
        let mut editor = ControlPointEditor::new();
        let first = editor.add_to_selected(&mut store, &id, Point::ZERO);
        let second = editor.add_to_selected(&mut store, &id, Point::ZERO);
        let (first, second) = (first.unwrap(), second.unwrap());

        editor.begin_drag(&store, first).unwrap();
        editor.begin_drag(&store, second).unwrap();
        assert_eq!(editor.dragging().unwrap().point_id, second);
    }

    #[test]
    fn test_begin_drag_needs_selected_owner() {
        let (mut store, id) = store_with_link();
        store.select(Some(&id)).unwrap();
        let mut editor = ControlPointEditor::new();
        let pos = Point::new(30.0, 10.0);
        let cp = editor.add_to_selected(&mut store, &id, pos).unwrap();

        store.select(None).unwrap();
        let err = editor.begin_drag(&store, cp).unwrap_err();
        assert_eq!(err, ConnectionError::NotSelected(id));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_begin_drag_unknown_point() {
        let (mut store, id) = store_with_link();
        store.select(Some(&id)).unwrap();
        let mut editor = ControlPointEditor::new();
        let missing = ControlPointId::new();

        let err = editor.begin_drag(&store, missing).unwrap_err();
        assert_eq!(err, ConnectionError::ControlPointNotFound(missing));
        assert!(!editor.is_dragging());
    }

    #[test]
    fn test_remove_releases_drag() {
        let (mut store, id) = store_with_link();
        store.select(Some(&id)).unwrap();
        let mut editor = ControlPointEditor::new();
        let pos = Point::new(30.0, 10.0);
        let cp = editor.add_to_selected(&mut store, &id, pos).unwrap();
        editor.begin_drag(&store, cp).unwrap();

        editor.remove_from_selected(&mut store, &id, cp).unwrap();
        assert!(!editor.is_dragging());
        assert!(store.get(&id).unwrap().control_points.is_empty());
    }
}
