//! Pointer and drag message handlers

use std::time::Instant;

use grove_core::Point;
use tracing::debug;

use crate::drag::DropOutcome;
use crate::input_key::Modifiers;
use crate::message::{Message, TreeCommand};
use crate::state::AppState;

use super::UpdateResult;

/// Handle pointer press
pub fn handle_pointer_down(state: &mut AppState, point: Point) -> UpdateResult {
    state.drag.pointer_down(&mut state.registry, point);
    UpdateResult::none()
}

/// Handle pointer movement (arms into a drag, re-validates the drop)
pub fn handle_pointer_move(state: &mut AppState, point: Point, modifiers: Modifiers) -> UpdateResult {
    state
        .drag
        .pointer_move(&state.registry, point, modifiers, Instant::now());
    UpdateResult::none()
}

/// Handle pointer release: a click selects, a drag commits or discards
pub fn handle_pointer_up(state: &mut AppState, point: Point, modifiers: Modifiers) -> UpdateResult {
    let outcome = state.drag.pointer_up(&mut state.registry, point, modifiers);
    debug!("Pointer up: {:?}", outcome);

    let follow_up = match &outcome {
        DropOutcome::Clicked {
            instance,
            node,
            additive,
        } => Some(Message::command(
            *instance,
            TreeCommand::Select {
                node: node.clone(),
                additive: *additive,
            },
        )),
        DropOutcome::Moved { nodes, .. } => {
            state.set_status(format!("Moved {} node(s)", nodes.len()));
            None
        }
        DropOutcome::Copied { nodes, .. } => {
            state.set_status(format!("Copied {} node(s)", nodes.len()));
            None
        }
        DropOutcome::Created { node, .. } => {
            state.set_status(format!("Created {node}"));
            None
        }
        DropOutcome::Removed { nodes, .. } => {
            state.set_status(format!("Removed {} node(s)", nodes.len()));
            None
        }
        DropOutcome::Failed { code } => {
            state.set_status(code.clone());
            None
        }
        DropOutcome::None | DropOutcome::Discarded | DropOutcome::Vetoed => None,
    };
    state.last_drop = Some(outcome);

    match follow_up {
        Some(msg) => UpdateResult::message(msg),
        None => UpdateResult::none(),
    }
}

/// Handle the periodic tick: open-ahead timer and auto-scroll
pub fn handle_tick(state: &mut AppState) -> UpdateResult {
    state.drag.tick(&mut state.registry, Instant::now());
    UpdateResult::none()
}
