//! Connection engine: the single context object owning registry, store and gesture state.
//!
//! Every public command is one complete state transition. Renderers only
//! ever observe the state before or after a command, never in between.

use crate::camera::Camera;
use crate::card::Card;
use crate::config::{EngineConfig, ReconnectPolicy};
use crate::connection::{Connection, ConnectionId, ControlPointId};
use crate::editor::ControlPointEditor;
use crate::endpoint::{CardId, Endpoint, NodeId, Side};
use crate::preview::PreviewConnection;
use crate::registry::EndpointRegistry;
use crate::snap::{NearestScan, SnapResolver};
use crate::store::ConnectionStore;
use kurbo::Point;

/// Owns all connection state for one canvas.
#[derive(Debug)]
pub struct ConnectionEngine {
    config: EngineConfig,
    registry: EndpointRegistry,
    store: ConnectionStore,
    preview: Option<PreviewConnection>,
    editor: ControlPointEditor,
    resolver: Box<dyn SnapResolver>,
}

impl Default for ConnectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with a configuration. An invalid configuration is
    /// replaced by the defaults.
    pub fn with_config(config: EngineConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("{}; falling back to default engine config", e);
                EngineConfig::default()
            }
        };
        Self {
            resolver: Box::new(NearestScan::new(config.snap_threshold)),
            config,
            registry: EndpointRegistry::new(),
            store: ConnectionStore::new(),
            preview: None,
            editor: ControlPointEditor::new(),
        }
    }

    /// Replace the snap resolver. The configured snap threshold follows the
    /// resolver's own.
    pub fn with_resolver(mut self, resolver: impl SnapResolver + 'static) -> Self {
        self.config.snap_threshold = resolver.threshold();
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Queries ---

    /// All committed connections.
    pub fn connections(&self) -> &[Connection] {
        self.store.connections()
    }

    /// Get a connection by ID.
    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.store.get(id)
    }

    /// The in-flight link, if a drag is active.
    pub fn preview(&self) -> Option<&PreviewConnection> {
        self.preview.as_ref()
    }

    /// Check if a link drag is active.
    pub fn is_dragging(&self) -> bool {
        self.preview.is_some()
    }

    pub fn selected_connection_id(&self) -> Option<&ConnectionId> {
        self.store.selected_id()
    }

    pub fn dragging_control_point_id(&self) -> Option<ControlPointId> {
        self.editor.dragging().map(|d| d.point_id)
    }

    /// Every registered endpoint.
    pub fn endpoints(&self) -> &[Endpoint] {
        self.registry.endpoints()
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ConnectionStore {
        &self.store
    }

    /// Check whether a node already emits a connection.
    pub fn has_outgoing_connection(&self, node_id: &NodeId) -> bool {
        self.store.has_outgoing(node_id)
    }

    /// Check whether a card's endpoints should be highlighted as drop targets.
    pub fn is_drop_target(&self, card_id: &CardId) -> bool {
        self.preview
            .as_ref()
            .is_some_and(|p| p.source.card_id != *card_id)
    }

    /// Topmost connection whose route passes within the hit tolerance of `point`.
    pub fn connection_at(&self, point: Point) -> Option<&ConnectionId> {
        self.store
            .connections()
            .iter()
            .rev()
            .find(|c| c.hit_test(point, self.config.hit_tolerance))
            .map(|c| &c.id)
    }

    // --- Link creation ---

    /// Press on an endpoint: open a preview, or reconnect the endpoint's
    /// existing outgoing connection.
    pub fn start_connection(
        &mut self,
        card_id: impl Into<CardId>,
        position: Point,
        side: Side,
        node_id: impl Into<NodeId>,
    ) {
        let source = Endpoint::new(card_id, node_id, side, position);
        self.abort_preview();
        self.clear_selection();

        if let Some(existing) = self.store.outgoing(&source.node_id) {
            let existing_id = existing.id.clone();
            self.begin_reconnect(&existing_id, source);
            return;
        }

        log::debug!(
            "Start connection from {}/{}",
            source.card_id,
            source.node_id
        );
        self.preview = Some(PreviewConnection::new(source));
    }

    /// Remove `connection_id` and open a reconnecting preview from the given
    /// source. Returns `false` if the connection does not exist.
    pub fn start_reconnecting_connection(
        &mut self,
        connection_id: &ConnectionId,
        card_id: impl Into<CardId>,
        position: Point,
        side: Side,
        node_id: impl Into<NodeId>,
    ) -> bool {
        if !self.store.contains(connection_id) {
            log::debug!("Cannot reconnect missing connection {}", connection_id);
            return false;
        }
        let source = Endpoint::new(card_id, node_id, side, position);
        self.abort_preview();
        self.clear_selection();
        self.begin_reconnect(connection_id, source)
    }

    fn begin_reconnect(&mut self, connection_id: &ConnectionId, source: Endpoint) -> bool {
        let index = self.store.index_of(connection_id);
        match self.store.remove(connection_id) {
            Ok(original) => {
                self.editor.forget_connection(connection_id);
                log::debug!(
                    "Start reconnection of {} from {}/{}",
                    connection_id,
                    source.card_id,
                    source.node_id
                );
                let mut preview = PreviewConnection::reconnecting(source, original);
                preview.original_index = index;
                self.preview = Some(preview);
                true
            }
            Err(e) => {
                log::warn!("{}", e);
                false
            }
        }
    }

    /// Pointer move during a drag. The drawn end snaps onto the nearest
    /// endpoint in range. Returns `false` if no drag is active.
    pub fn move_preview_connection(&mut self, cursor: Point) -> bool {
        let Some(preview) = self.preview.as_mut() else {
            return false;
        };
        let snap = self.resolver.snap(
            &self.registry,
            cursor,
            &preview.source.card_id,
            &preview.source.node_id,
        );
        log::trace!(
            "Preview moved to {:?} (snapped: {})",
            snap.point,
            snap.is_snapped()
        );
        preview.cursor_position = snap.point;
        preview.magnetic_target = snap.target;
        true
    }

    /// Release on an endpoint: commit the preview as a connection.
    ///
    /// Returns `false` without creating anything when no drag is active or
    /// the target is the preview's own source.
    pub fn end_connection(
        &mut self,
        card_id: impl Into<CardId>,
        position: Point,
        side: Side,
        node_id: impl Into<NodeId>,
    ) -> bool {
        self.end_connection_at(Endpoint::new(card_id, node_id, side, position))
    }

    /// [`ConnectionEngine::end_connection`] with an endpoint value.
    pub fn end_connection_at(&mut self, target: Endpoint) -> bool {
        let Some(preview) = self.preview.take() else {
            return false;
        };

        if preview.source.same_identity(&target) {
            log::debug!("Dropped connection onto its own source {}", target.node_id);
            self.finish_aborted(preview);
            return false;
        }

        let connection = Connection::new(preview.source.clone(), target);
        match self.store.add(connection) {
            Ok(added) => {
                log::debug!("Created connection {}", added.id);
                true
            }
            Err(e) => {
                log::warn!("Connection rejected: {}", e);
                self.finish_aborted(preview);
                false
            }
        }
    }

    /// Commit onto the endpoint the preview is currently snapped to.
    /// Returns `false` if there is no drag or no magnetic target.
    pub fn commit_magnetic_target(&mut self) -> bool {
        let Some(target) = self
            .preview
            .as_ref()
            .and_then(|p| p.magnetic_target.clone())
        else {
            return false;
        };
        self.end_connection_at(target)
    }

    /// Drop the preview without creating a connection.
    pub fn cancel_connection(&mut self) {
        if self.abort_preview() {
            log::debug!("Connection cancelled");
        }
    }

    /// Abort any active preview. Returns `true` if one existed.
    fn abort_preview(&mut self) -> bool {
        match self.preview.take() {
            Some(preview) => {
                self.finish_aborted(preview);
                true
            }
            None => false,
        }
    }

    fn finish_aborted(&mut self, preview: PreviewConnection) {
        if self.config.reconnect_policy != ReconnectPolicy::Restore {
            return;
        }
        let index = preview.original_index.unwrap_or(self.store.len());
        if let Some(original) = preview.original_connection {
            let id = original.id.clone();
            match self.store.insert(index, original) {
                Ok(_) => log::debug!("Restored connection {}", id),
                Err(e) => log::warn!("Could not restore connection {}: {}", id, e),
            }
        }
    }

    // --- Structure and selection ---

    /// Delete a connection. Returns `false` if it does not exist.
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> bool {
        match self.store.remove(connection_id) {
            Ok(_) => {
                self.editor.forget_connection(connection_id);
                log::debug!("Removed connection {}", connection_id);
                true
            }
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Delete the selected connection, if any.
    pub fn remove_selected_connection(&mut self) -> bool {
        match self.store.selected_id().cloned() {
            Some(id) => self.remove_connection(&id),
            None => false,
        }
    }

    /// Select one connection or clear the selection. Returns `false` if the
    /// ID is unknown (the selection is cleared in that case).
    pub fn select_connection(&mut self, connection_id: Option<&ConnectionId>) -> bool {
        if let Some(dragged) = self.editor.dragging() {
            if Some(&dragged.connection_id) != connection_id {
                self.editor.end_drag();
            }
        }
        match self.store.select(connection_id) {
            Ok(()) => {
                log::debug!("Selection: {:?}", connection_id.map(ConnectionId::as_str));
                true
            }
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Select an unselected connection, or deselect it if already selected.
    pub fn toggle_connection_selection(&mut self, connection_id: &ConnectionId) -> bool {
        if self.store.selected_id() == Some(connection_id) {
            self.select_connection(None)
        } else {
            self.select_connection(Some(connection_id))
        }
    }

    fn clear_selection(&mut self) {
        if self.store.selected_id().is_some() {
            self.select_connection(None);
        }
    }

    // --- Control points ---

    /// Append a control point to any connection.
    pub fn add_control_point(
        &mut self,
        connection_id: &ConnectionId,
        position: Point,
    ) -> Option<ControlPointId> {
        match self.store.add_control_point(connection_id, position) {
            Ok(cp) => {
                log::debug!("Added control point {} to {}", cp, connection_id);
                Some(cp)
            }
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        }
    }

    /// Move a control point. Returns `false` if the connection or point is absent.
    pub fn update_control_point(
        &mut self,
        connection_id: &ConnectionId,
        point_id: ControlPointId,
        position: Point,
    ) -> bool {
        self.store
            .update_control_point(connection_id, point_id, position)
            .inspect_err(|e| log::debug!("{}", e))
            .is_ok()
    }

    /// Remove a control point. Returns `false` if the connection or point is absent.
    pub fn remove_control_point(
        &mut self,
        connection_id: &ConnectionId,
        point_id: ControlPointId,
    ) -> bool {
        match self.store.remove_control_point(connection_id, point_id) {
            Ok(_) => {
                self.editor.forget_point(point_id);
                log::debug!("Removed control point {} from {}", point_id, connection_id);
                true
            }
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Double activation on a connection's path: add a control point if the
    /// connection is selected.
    pub fn double_activate_connection(
        &mut self,
        connection_id: &ConnectionId,
        position: Point,
    ) -> Option<ControlPointId> {
        match self
            .editor
            .add_to_selected(&mut self.store, connection_id, position)
        {
            Ok(cp) => {
                log::debug!("Added control point {} to {}", cp, connection_id);
                Some(cp)
            }
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        }
    }

    /// Secondary activation on a control point: remove it immediately if its
    /// connection is selected.
    pub fn secondary_activate_control_point(
        &mut self,
        connection_id: &ConnectionId,
        point_id: ControlPointId,
    ) -> bool {
        match self
            .editor
            .remove_from_selected(&mut self.store, connection_id, point_id)
        {
            Ok(()) => {
                log::debug!("Removed control point {} from {}", point_id, connection_id);
                true
            }
            Err(e) => {
                log::debug!("{}", e);
                false
            }
        }
    }

    /// Grab a control point of the selected connection.
    pub fn start_dragging_control_point(&mut self, point_id: ControlPointId) -> bool {
        self.editor
            .begin_drag(&self.store, point_id)
            .inspect_err(|e| log::debug!("{}", e))
            .is_ok()
    }

    /// Move the grabbed control point.
    pub fn drag_control_point_to(&mut self, position: Point) -> bool {
        self.editor.drag_to(&mut self.store, position)
    }

    /// Release the grabbed control point.
    pub fn end_dragging_control_point(&mut self) {
        self.editor.end_drag();
    }

    // --- Endpoint geometry ---

    /// Register or refresh an endpoint in the registry.
    pub fn register_connection_point(&mut self, endpoint: Endpoint) {
        self.registry.register(endpoint);
    }

    /// Remove an endpoint from the registry. Connections keep their last snapshot.
    pub fn unregister_connection_point(&mut self, node_id: &NodeId) -> bool {
        self.registry.unregister(node_id).is_some()
    }

    /// Propagate a new endpoint position to every connection end bound to it
    /// and to the active preview's source. Returns how many connection ends changed.
    pub fn update_connection_node_position(
        &mut self,
        card_id: impl Into<CardId>,
        node_id: impl Into<NodeId>,
        position: Point,
        side: Side,
    ) -> usize {
        let card_id = card_id.into();
        let node_id = node_id.into();
        if let Some(preview) = self.preview.as_mut() {
            if preview.source.is(&card_id, &node_id) {
                preview.source.position = position;
                preview.source.side = side;
            }
            if let Some(original) = preview.original_connection.as_mut() {
                original.update_endpoint(&card_id, &node_id, position, side);
            }
        }
        let updated = self
            .store
            .update_position(&card_id, &node_id, position, side);
        log::trace!(
            "Node {}/{} moved, {} connection ends updated",
            card_id,
            node_id,
            updated
        );
        updated
    }

    /// Report a card's current layout: register every endpoint and
    /// propagate positions to connections.
    pub fn layout_card(&mut self, card: &Card, camera: &Camera) {
        for endpoint in card.endpoints(camera) {
            self.update_connection_node_position(
                endpoint.card_id.clone(),
                endpoint.node_id.clone(),
                endpoint.position,
                endpoint.side,
            );
            self.registry.register(endpoint);
        }
    }

    /// Unregister every endpoint of a card being torn down.
    pub fn unmount_card(&mut self, card: &Card) -> usize {
        let attached = self.store.connections_for_card(&card.id).count();
        if attached > 0 {
            log::debug!(
                "Card {} unmounted with {} connections keeping stale snapshots",
                card.id,
                attached
            );
        }
        self.registry.unregister_card(&card.id)
    }
}
