//! Key event handlers for the focused tree

use crate::input_key::InputKey;
use crate::instance::{Direction, NewNode};
use crate::message::{Message, TreeCommand};
use crate::registry::InstanceId;
use crate::state::AppState;

/// Convert key events to messages based on what the focused tree is doing
pub fn handle_key(state: &AppState, key: InputKey) -> Option<Message> {
    if key == InputKey::CharCtrl('c') {
        return Some(Message::Quit);
    }
    if state.drag.is_dragging() {
        return handle_key_dragging(key);
    }
    let instance = state.focused()?;
    if state.is_renaming() {
        return handle_key_rename(key).map(|c| Message::command(instance, c));
    }
    handle_key_normal(state, instance, key)
}

/// Escape aborts a drag; everything else waits for the drop
fn handle_key_dragging(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Esc => Some(Message::CancelDrag),
        _ => None,
    }
}

/// Inline rename editing
fn handle_key_rename(key: InputKey) -> Option<TreeCommand> {
    match key {
        InputKey::Char(c) => Some(TreeCommand::RenameInput(c)),
        InputKey::Backspace => Some(TreeCommand::RenameBackspace),
        InputKey::Enter => Some(TreeCommand::CommitRename),
        InputKey::Esc => Some(TreeCommand::CancelRename),
        _ => None,
    }
}

/// Navigation and editing shortcuts
fn handle_key_normal(state: &AppState, instance: InstanceId, key: InputKey) -> Option<Message> {
    let tree = state.registry.get(instance)?;
    let cursor = tree
        .hovered()
        .or_else(|| tree.selected().last())
        .cloned();

    let command = match key {
        InputKey::Char('q') => return Some(Message::Quit),
        InputKey::Tab | InputKey::BackTab => return Some(Message::FocusNext),

        // Cursor movement
        InputKey::Up | InputKey::Char('k') => TreeCommand::Navigate(Direction::Up),
        InputKey::Down | InputKey::Char('j') => TreeCommand::Navigate(Direction::Down),
        InputKey::Left | InputKey::Char('h') => TreeCommand::Navigate(Direction::Left),
        InputKey::Right | InputKey::Char('l') => TreeCommand::Navigate(Direction::Right),
        InputKey::Home | InputKey::PageUp => TreeCommand::Navigate(Direction::First),
        InputKey::End | InputKey::PageDown => TreeCommand::Navigate(Direction::Last),

        // Selection
        InputKey::Char(' ') => TreeCommand::Select {
            node: cursor?,
            additive: false,
        },
        InputKey::CharCtrl(' ') => TreeCommand::Select {
            node: cursor?,
            additive: true,
        },
        InputKey::Esc => TreeCommand::DeselectAll,

        // Open / close
        InputKey::Enter => TreeCommand::Toggle(cursor?),
        InputKey::Char('*') => TreeCommand::OpenAll(None),
        InputKey::Char('-') => TreeCommand::CloseAll(None),

        // Editing
        InputKey::F(2) => TreeCommand::Rename(cursor),
        InputKey::Delete => TreeCommand::Remove(None),
        InputKey::Char('n') => TreeCommand::Create {
            parent: cursor,
            node: NewNode::default(),
        },
        InputKey::Char('N') => TreeCommand::Create {
            parent: None,
            node: NewNode::default(),
        },

        // Instance
        InputKey::Char('r') | InputKey::F(5) => TreeCommand::Refresh,
        InputKey::Char('L') if tree.is_locked() => TreeCommand::Unlock,
        InputKey::Char('L') => TreeCommand::Lock,

        _ => return None,
    };
    Some(Message::command(instance, command))
}
