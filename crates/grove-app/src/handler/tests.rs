//! Tests for the key mapping and update dispatch

use grove_core::{DeclaredState, NodeId};

use super::*;
use crate::config::TreeOptions;
use crate::input_key::InputKey;
use crate::instance::{Direction, TreeInstance};
use crate::message::TreeCommand;
use crate::persistence::MemoryStore;
use crate::registry::next_instance_id;
use crate::test_utils::{sample_options, typed, Recorder};

fn state_with(options: TreeOptions) -> (AppState, InstanceId) {
    let mut state = AppState::new();
    let mut instance = TreeInstance::new(
        next_instance_id(),
        options,
        Box::new(Recorder::default()),
        Box::new(MemoryStore::new()),
    );
    instance.initialize().unwrap();
    let id = state.registry.insert(instance);
    (state, id)
}

fn command_of(msg: Option<Message>) -> Option<TreeCommand> {
    match msg {
        Some(Message::Command { command, .. }) => Some(command),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Key mapping
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_quit_keys() {
    let (state, _) = state_with(sample_options());
    assert!(matches!(handle_key(&state, InputKey::Char('q')), Some(Message::Quit)));
    assert!(matches!(handle_key(&state, InputKey::CharCtrl('c')), Some(Message::Quit)));
}

#[test]
fn test_navigation_keys() {
    let (state, _) = state_with(sample_options());
    assert_eq!(
        command_of(handle_key(&state, InputKey::Char('j'))),
        Some(TreeCommand::Navigate(Direction::Down))
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::Up)),
        Some(TreeCommand::Navigate(Direction::Up))
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::End)),
        Some(TreeCommand::Navigate(Direction::Last))
    );
    assert!(matches!(handle_key(&state, InputKey::Tab), Some(Message::FocusNext)));
}

#[test]
fn test_cursor_keys_need_a_cursor() {
    let (state, _) = state_with(sample_options());
    assert!(handle_key(&state, InputKey::Enter).is_none());
    assert!(handle_key(&state, InputKey::Char(' ')).is_none());
}

#[test]
fn test_cursor_keys_use_hovered_node() {
    let (mut state, id) = state_with(sample_options());
    let home = NodeId::new("home");
    state.registry.get_mut(id).unwrap().hover_node(Some(&home));

    assert_eq!(
        command_of(handle_key(&state, InputKey::Enter)),
        Some(TreeCommand::Toggle(home.clone()))
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::CharCtrl(' '))),
        Some(TreeCommand::Select {
            node: home.clone(),
            additive: true
        })
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::F(2))),
        Some(TreeCommand::Rename(Some(home.clone())))
    );
    assert!(matches!(
        command_of(handle_key(&state, InputKey::Char('n'))),
        Some(TreeCommand::Create { parent: Some(p), .. }) if p == home
    ));
}

#[test]
fn test_lock_key_toggles() {
    let (mut state, id) = state_with(sample_options());
    assert_eq!(
        command_of(handle_key(&state, InputKey::Char('L'))),
        Some(TreeCommand::Lock)
    );
    state.registry.get_mut(id).unwrap().lock();
    assert_eq!(
        command_of(handle_key(&state, InputKey::Char('L'))),
        Some(TreeCommand::Unlock)
    );
}

#[test]
fn test_rename_mode_captures_characters() {
    let (mut state, id) = state_with(sample_options());
    state
        .registry
        .get_mut(id)
        .unwrap()
        .rename(Some(&NodeId::new("second")))
        .unwrap();
    assert!(state.is_renaming());

    assert_eq!(
        command_of(handle_key(&state, InputKey::Char('q'))),
        Some(TreeCommand::RenameInput('q'))
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::Enter)),
        Some(TreeCommand::CommitRename)
    );
    assert_eq!(
        command_of(handle_key(&state, InputKey::Esc)),
        Some(TreeCommand::CancelRename)
    );
    assert!(handle_key(&state, InputKey::Down).is_none());
}

#[test]
fn test_no_focus_ignores_keys() {
    let state = AppState::new();
    assert!(handle_key(&state, InputKey::Down).is_none());
}

// ─────────────────────────────────────────────────────────────────────────
// Update
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn test_update_quit() {
    let mut state = AppState::new();
    let result = update(&mut state, Message::Quit);
    assert!(state.should_quit);
    assert!(result.message.is_none());
    assert!(result.action.is_none());
}

#[test]
fn test_update_key_returns_follow_up() {
    let (mut state, id) = state_with(sample_options());
    let result = update(&mut state, Message::Key(InputKey::Down));
    assert!(matches!(
        result.message,
        Some(Message::Command { instance, command: TreeCommand::Navigate(Direction::Down) })
            if instance == id
    ));
}

#[test]
fn test_open_of_pending_node_returns_load_action() {
    let mut options = TreeOptions::with_nodes(vec![
        typed("lazy", "folder").with_state(DeclaredState::Closed)
    ]);
    options.data.timeout_ms = 250;
    let (mut state, id) = state_with(options);

    let result = update(
        &mut state,
        Message::command(id, TreeCommand::Open(NodeId::new("lazy"))),
    );
    let Some(UpdateAction::LoadChildren(jobs)) = result.action else {
        panic!("expected a load action");
    };
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].instance, id);
    assert_eq!(jobs[0].request.node, Some(NodeId::new("lazy")));
    assert_eq!(jobs[0].timeout, Duration::from_millis(250));

    // Requests are handed out once.
    assert!(pending_loads(&mut state).is_none());
}

#[test]
fn test_command_error_sets_status_code() {
    let (mut state, id) = state_with(sample_options());
    update(
        &mut state,
        Message::command(id, TreeCommand::Open(NodeId::new("missing"))),
    );
    assert_eq!(state.status.as_deref(), Some("NODE: NOT FOUND"));
}

#[test]
fn test_search_hovers_first_match() {
    let (mut state, id) = state_with(sample_options());
    update(
        &mut state,
        Message::command(id, TreeCommand::Search("b".to_string())),
    );
    let instance = state.registry.get(id).unwrap();
    assert_eq!(instance.hovered(), Some(&NodeId::new("b")));
    assert_eq!(state.status.as_deref(), Some("1 match(es) for \"b\""));
}

#[test]
fn test_stale_load_result_is_ignored() {
    let mut options = TreeOptions::with_nodes(vec![
        typed("lazy", "folder").with_state(DeclaredState::Closed)
    ]);
    options.data.async_load = true;
    let (mut state, id) = state_with(options);
    update(
        &mut state,
        Message::command(id, TreeCommand::Open(NodeId::new("lazy"))),
    );

    update(
        &mut state,
        Message::ChildrenLoaded {
            instance: id,
            node: Some(NodeId::new("lazy")),
            generation: 999,
            nodes: vec![typed("child", "file")],
        },
    );
    let instance = state.registry.get(id).unwrap();
    assert!(!instance.tree().contains(&NodeId::new("child")));
    assert!(instance.is_loading(Some(&NodeId::new("lazy"))));
}
