//! Linkboard Core Library
//!
//! Platform-agnostic connection engine for linking cards on a canvas: endpoint
//! registry, magnetic snapping, link previews, control points and
//! gesture routing.

pub mod camera;
pub mod card;
pub mod config;
pub mod connection;
pub mod editor;
pub mod endpoint;
pub mod engine;
pub mod input;
pub mod preview;
pub mod registry;
pub mod snap;
pub mod store;

pub use camera::Camera;
pub use card::{Card, CardNode};
pub use config::{ConfigError, EngineConfig, ReconnectPolicy};
pub use connection::{Connection, ConnectionId, ControlPoint, ControlPointId};
pub use editor::{ControlPointEditor, DraggedControlPoint};
pub use endpoint::{CardId, Endpoint, NodeId, Side};
pub use engine::ConnectionEngine;
pub use input::{
    GestureAction, GestureRouter, HitTarget, KeyEvent, MouseButton, PointerEvent, hit_target,
};
pub use preview::PreviewConnection;
pub use registry::EndpointRegistry;
pub use snap::{DEFAULT_SNAP_THRESHOLD, NearestScan, SnapResolver, SnapResult};
pub use store::{ConnectionError, ConnectionStore, StoreResult};
