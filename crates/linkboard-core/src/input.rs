//! Gesture routing: pointer and key events with hit targets, mapped onto engine commands.
//!
//! The host forwards every pointer event here from its top-level event
//! source, including releases outside the pressed element, so an active drag
//! always ends on pointer-up.

use crate::config::EngineConfig;
use crate::connection::{ConnectionId, ControlPointId};
use crate::endpoint::Endpoint;
use crate::engine::ConnectionEngine;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Radius around an endpoint that counts as pressing it, in screen units.
pub const ENDPOINT_HIT_RADIUS: f64 = 7.0;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position } => position,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// What is under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub enum HitTarget {
    Endpoint(Endpoint),
    ControlPoint {
        connection_id: ConnectionId,
        point_id: ControlPointId,
    },
    ConnectionPath(ConnectionId),
    Background,
}

/// Engine transition performed for an event.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureAction {
    None,
    StartedConnection,
    MovedPreview,
    CommittedConnection,
    CancelledConnection,
    SelectionChanged,
    AddedControlPoint(ControlPointId),
    RemovedControlPoint,
    StartedPointDrag,
    MovedPoint,
    EndedPointDrag,
    RemovedConnection,
}

/// Find what lies under a screen point.
///
/// Priority: control points of the selected connection, endpoints, connection
/// routes, background.
pub fn hit_target(engine: &ConnectionEngine, point: Point) -> HitTarget {
    let tolerance = engine.config().hit_tolerance;

    if let Some(selected) = engine.store().selected() {
        if let Some(cp) = selected
            .control_points
            .iter()
            .find(|cp| cp.position.distance(point) <= tolerance)
        {
            return HitTarget::ControlPoint {
                connection_id: selected.id.clone(),
                point_id: cp.id,
            };
        }
    }

    if let Some(endpoint) = engine
        .endpoints()
        .iter()
        .find(|e| e.distance_to(point) <= ENDPOINT_HIT_RADIUS)
    {
        return HitTarget::Endpoint(endpoint.clone());
    }

    match engine.connection_at(point) {
        Some(id) => HitTarget::ConnectionPath(id.clone()),
        None => HitTarget::Background,
    }
}

/// Turns raw pointer and key events into engine commands.
#[derive(Debug, Clone, Default)]
pub struct GestureRouter {
    /// Last click time for double-click detection.
    last_click_time: Option<Instant>,
    /// Last click position for double-click detection.
    last_click_position: Option<Point>,
}

impl GestureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a pointer event, timestamped now.
    pub fn handle(
        &mut self,
        engine: &mut ConnectionEngine,
        event: PointerEvent,
        target: HitTarget,
    ) -> GestureAction {
        self.handle_at(engine, event, target, Instant::now())
    }

    /// Route a pointer event with an explicit timestamp.
    pub fn handle_at(
        &mut self,
        engine: &mut ConnectionEngine,
        event: PointerEvent,
        target: HitTarget,
        now: Instant,
    ) -> GestureAction {
        match event {
            PointerEvent::Down { position, button } => match button {
                MouseButton::Left => {
                    let double_click = self.register_click(engine.config(), position, now);
                    self.press(engine, position, target, double_click)
                }
                MouseButton::Right => self.secondary_press(engine, target),
                // Middle button pans the scene, which is not ours
                MouseButton::Middle => GestureAction::None,
            },
            PointerEvent::Move { position } => {
                if engine.move_preview_connection(position) {
                    GestureAction::MovedPreview
                } else if engine.drag_control_point_to(position) {
                    GestureAction::MovedPoint
                } else {
                    GestureAction::None
                }
            }
            PointerEvent::Up { button, .. } => match button {
                MouseButton::Left => self.release(engine, target),
                _ => GestureAction::None,
            },
        }
    }

    /// Route a key event.
    pub fn handle_key(&mut self, engine: &mut ConnectionEngine, event: &KeyEvent) -> GestureAction {
        let KeyEvent::Pressed(key) = event else {
            return GestureAction::None;
        };
        match key.as_str() {
            "Delete" | "Backspace" if engine.remove_selected_connection() => {
                GestureAction::RemovedConnection
            }
            "Escape" if engine.is_dragging() => {
                engine.cancel_connection();
                GestureAction::CancelledConnection
            }
            _ => GestureAction::None,
        }
    }

    fn press(
        &mut self,
        engine: &mut ConnectionEngine,
        position: Point,
        target: HitTarget,
        double_click: bool,
    ) -> GestureAction {
        match target {
            HitTarget::Endpoint(endpoint) => {
                engine.start_connection(
                    endpoint.card_id,
                    endpoint.position,
                    endpoint.side,
                    endpoint.node_id,
                );
                GestureAction::StartedConnection
            }
            HitTarget::ControlPoint { point_id, .. } => {
                if engine.start_dragging_control_point(point_id) {
                    GestureAction::StartedPointDrag
                } else {
                    GestureAction::None
                }
            }
            HitTarget::ConnectionPath(id) if double_click => {
                if engine.selected_connection_id() != Some(&id) {
                    engine.select_connection(Some(&id));
                }
                match engine.double_activate_connection(&id, position) {
                    Some(cp) => GestureAction::AddedControlPoint(cp),
                    None => GestureAction::None,
                }
            }
            HitTarget::ConnectionPath(id) => {
                if engine.toggle_connection_selection(&id) {
                    GestureAction::SelectionChanged
                } else {
                    GestureAction::None
                }
            }
            HitTarget::Background => {
                if engine.selected_connection_id().is_some() && engine.select_connection(None) {
                    GestureAction::SelectionChanged
                } else {
                    GestureAction::None
                }
            }
        }
    }

    fn secondary_press(
        &mut self,
        engine: &mut ConnectionEngine,
        target: HitTarget,
    ) -> GestureAction {
        match target {
            HitTarget::ControlPoint {
                connection_id,
                point_id,
            } if engine.secondary_activate_control_point(&connection_id, point_id) => {
                GestureAction::RemovedControlPoint
            }
            _ => GestureAction::None,
        }
    }

    fn release(&mut self, engine: &mut ConnectionEngine, target: HitTarget) -> GestureAction {
        if engine.dragging_control_point_id().is_some() {
            engine.end_dragging_control_point();
            return GestureAction::EndedPointDrag;
        }
        if !engine.is_dragging() {
            return GestureAction::None;
        }

        let committed = match target {
            HitTarget::Endpoint(endpoint) => engine.end_connection_at(endpoint),
            _ => engine.commit_magnetic_target(),
        };
        if committed {
            GestureAction::CommittedConnection
        } else {
            // A rejected drop has already cleared the preview
            engine.cancel_connection();
            GestureAction::CancelledConnection
        }
    }

    /// Record a left press and report whether it completes a double click.
    fn register_click(&mut self, config: &EngineConfig, position: Point, now: Instant) -> bool {
        let window = Duration::from_millis(config.double_click_ms);

        if let (Some(time), Some(pos)) = (self.last_click_time, self.last_click_position) {
            let elapsed = now.saturating_duration_since(time);
            if elapsed < window && position.distance(pos) < config.double_click_distance {
                // Reset to prevent triple-click being detected as another double-click
                self.last_click_time = None;
                self.last_click_position = None;
                return true;
            }
        }

        self.last_click_time = Some(now);
        self.last_click_position = Some(position);
        false
    }
}
