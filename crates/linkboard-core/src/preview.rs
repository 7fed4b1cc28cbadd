//! The in-flight link drawn while a connection drag is active.

use crate::connection::{Connection, ConnectionId, half_span, side_handle};
use crate::endpoint::Endpoint;
use kurbo::{BezPath, Point};

/// Transient link from the pressed endpoint to the cursor.
///
/// At most one exists per engine, between gesture start and gesture end.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConnection {
    /// Snapshot of the pressed endpoint.
    pub source: Endpoint,
    /// Drawn end of the link: the raw cursor, or the snapped endpoint's position.
    pub cursor_position: Point,
    /// Endpoint the cursor is currently snapped to.
    pub magnetic_target: Option<Endpoint>,
    /// Whether this drag replaces an existing outgoing connection.
    pub is_reconnecting: bool,
    /// ID of the connection removed when the reconnection started.
    pub original_connection_id: Option<ConnectionId>,
    /// The removed connection itself, kept for `ReconnectPolicy::Restore`.
    /// Its endpoint snapshots track position updates during the drag.
    pub(crate) original_connection: Option<Connection>,
    /// Store index the removed connection occupied.
    pub(crate) original_index: Option<usize>,
}

impl PreviewConnection {
    /// Start a fresh preview at the source endpoint.
    pub fn new(source: Endpoint) -> Self {
        Self {
            cursor_position: source.position,
            source,
            magnetic_target: None,
            is_reconnecting: false,
            original_connection_id: None,
            original_connection: None,
            original_index: None,
        }
    }

    /// Start a preview that replaces `original`.
    pub fn reconnecting(source: Endpoint, original: Connection) -> Self {
        Self {
            is_reconnecting: true,
            original_connection_id: Some(original.id.clone()),
            original_connection: Some(original),
            ..Self::new(source)
        }
    }

    /// Build the renderable path from the source to the drawn cursor position.
    pub fn to_path(&self) -> BezPath {
        let from = self.source.position;
        let to = self.cursor_position;
        let c1 = side_handle(from, self.source.side, half_span(from, to));
        let mut path = BezPath::new();
        path.move_to(from);
        path.curve_to(c1, to, to);
        path
    }
}
