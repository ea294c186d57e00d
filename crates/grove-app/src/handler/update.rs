//! Main update function - handles state transitions (TEA pattern)
//!
//! Handler implementations live in:
//! - `command`: tree commands
//! - `pointer`: pointer and drag messages
//! - `keys`: key-to-message mapping
//! - `load`: async load results

use crate::message::Message;
use crate::state::AppState;
use tracing::debug;

use super::{command, keys::handle_key, load, pending_loads, pointer, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    let mut result = match message {
        Message::Quit => {
            state.should_quit = true;
            UpdateResult::none()
        }

        Message::Key(key) => {
            if let Some(msg) = handle_key(state, key) {
                UpdateResult::message(msg)
            } else {
                UpdateResult::none()
            }
        }

        Message::Tick => pointer::handle_tick(state),

        // ─────────────────────────────────────────────────────────
        // Pointer / Drag Messages
        // ─────────────────────────────────────────────────────────
        Message::PointerDown { point, .. } => pointer::handle_pointer_down(state, point),
        Message::PointerMove { point, modifiers } => {
            pointer::handle_pointer_move(state, point, modifiers)
        }
        Message::PointerUp { point, modifiers } => {
            pointer::handle_pointer_up(state, point, modifiers)
        }
        Message::ForeignDragStart { item, point } => {
            state.drag.begin_foreign_drag(item, point);
            UpdateResult::none()
        }
        Message::CancelDrag => {
            if state.drag.cancel() {
                state.set_status("Drag cancelled");
            }
            UpdateResult::none()
        }
        Message::Layout(layout) => {
            state.drag.register(&mut state.registry, layout);
            UpdateResult::none()
        }
        Message::Focus(instance) => {
            state.registry.focus(instance);
            UpdateResult::none()
        }
        Message::FocusNext => {
            state.registry.focus_next();
            debug!("Focus moved to tree {:?}", state.registry.focused());
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Tree Commands
        // ─────────────────────────────────────────────────────────
        Message::Command { instance, command } => {
            command::handle_command(state, instance, command)
        }

        // ─────────────────────────────────────────────────────────
        // Async Load Results
        // ─────────────────────────────────────────────────────────
        Message::ChildrenLoaded {
            instance,
            node,
            generation,
            nodes,
        } => load::handle_children_loaded(state, instance, node, generation, nodes),
        Message::ChildrenLoadFailed {
            instance,
            node,
            generation,
            error,
        } => load::handle_children_load_failed(state, instance, node, generation, error),
        Message::ChildrenLoadTimeout {
            instance,
            node,
            generation,
        } => load::handle_children_load_timeout(state, instance, node, generation),
    };

    // Any operation above may have queued fetches (open, refresh, drag open-ahead).
    if result.action.is_none() {
        result.action = pending_loads(state);
    }
    result
}
