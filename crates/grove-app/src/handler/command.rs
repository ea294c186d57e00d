//! Tree command handlers
//!
//! Failures have already been reported through the instance's `error`
//! callback; here they only end up in the status line.

use grove_core::prelude::*;

use crate::message::TreeCommand;
use crate::registry::InstanceId;
use crate::state::AppState;

use super::UpdateResult;

/// Apply `command` to `instance`
pub fn handle_command(
    state: &mut AppState,
    instance: InstanceId,
    command: TreeCommand,
) -> UpdateResult {
    let outcome = match command {
        TreeCommand::Transfer {
            target,
            nodes,
            reference,
            position,
            copy,
        } => state
            .registry
            .transfer(instance, target, &nodes, &reference, position, copy)
            .map(|moved| {
                moved.map(|ids| {
                    let verb = if copy { "Copied" } else { "Moved" };
                    format!("{verb} {} node(s) to tree {target}", ids.len())
                })
            }),
        command => apply(state, instance, command),
    };

    match outcome {
        Ok(Some(status)) => state.set_status(status),
        Ok(None) => {}
        Err(e) => {
            debug!("Command on tree {} failed: {}", instance, e);
            state.set_status(e.code());
        }
    }
    UpdateResult::none()
}

/// Run a single-instance command. Returns an optional status line.
fn apply(
    state: &mut AppState,
    instance: InstanceId,
    command: TreeCommand,
) -> Result<Option<String>> {
    let Some(tree) = state.registry.get_mut(instance) else {
        warn!("Command {:?} for unknown tree {}", command, instance);
        return Err(Error::invalid_operation("TREE: NOT FOUND"));
    };

    match command {
        TreeCommand::Select { node, additive } => {
            tree.select_node(&node, additive)?;
            Ok(None)
        }
        TreeCommand::Deselect(node) => {
            tree.deselect_node(&node)?;
            Ok(None)
        }
        TreeCommand::DeselectAll => {
            tree.deselect_all()?;
            Ok(None)
        }
        TreeCommand::Hover(node) => {
            tree.hover_node(node.as_ref());
            Ok(None)
        }

        TreeCommand::Open(node) => tree.open_node(&node).map(|_| None),
        TreeCommand::Close(node) => tree.close_node(&node).map(|_| None),
        TreeCommand::Toggle(node) => tree.toggle_node(&node).map(|_| None),
        TreeCommand::OpenAll(root) => tree.open_all(root.as_ref()).map(|_| None),
        TreeCommand::CloseAll(root) => tree.close_all(root.as_ref()).map(|_| None),

        TreeCommand::Create { parent, node } => Ok(tree
            .create_node(parent.as_ref(), node)?
            .map(|id| format!("Created {id}"))),
        TreeCommand::Rename(node) => tree.rename(node.as_ref()).map(|_| None),
        TreeCommand::RenameTo { node, title } => tree.rename_node(&node, &title).map(|_| None),
        TreeCommand::RenameInput(c) => {
            tree.rename_input(c);
            Ok(None)
        }
        TreeCommand::RenameBackspace => {
            tree.rename_backspace();
            Ok(None)
        }
        TreeCommand::CommitRename => tree.commit_rename().map(|_| None),
        TreeCommand::CancelRename => {
            tree.cancel_rename();
            Ok(None)
        }
        TreeCommand::Remove(node) => {
            let removed = tree.remove(node.as_ref())?;
            Ok((!removed.is_empty()).then(|| format!("Removed {} node(s)", removed.len())))
        }

        TreeCommand::Move {
            nodes,
            reference,
            position,
        } => tree.move_nodes(&nodes, &reference, position).map(|_| None),
        TreeCommand::Copy {
            nodes,
            reference,
            position,
        } => {
            let copies = tree.copy_nodes(&nodes, &reference, position)?;
            Ok((!copies.is_empty()).then(|| format!("Copied {} node(s)", copies.len())))
        }
        // Handled in `handle_command`: it needs two instances.
        TreeCommand::Transfer { .. } => Ok(None),

        TreeCommand::Lock => {
            tree.lock();
            Ok(Some("Locked".to_string()))
        }
        TreeCommand::Unlock => {
            tree.unlock();
            Ok(Some("Unlocked".to_string()))
        }
        TreeCommand::Refresh => tree.refresh().map(|_| None),
        TreeCommand::Search(text) => {
            let matches = tree.search(&text);
            if let Some(first) = matches.first() {
                tree.hover_node(Some(first));
            }
            Ok(Some(format!("{} match(es) for {:?}", matches.len(), text)))
        }
        TreeCommand::Navigate(direction) => {
            tree.navigate(direction);
            Ok(None)
        }
    }
}
