//! Message types for the engine (TEA pattern)

use grove_core::{DropPosition, NodeData, NodeId, Point};

use crate::drag::{ContainerLayout, ForeignItem};
use crate::input_key::{InputKey, Modifiers};
use crate::instance::{Direction, NewNode};
use crate::registry::InstanceId;

/// An operation addressed to one tree instance.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeCommand {
    Select { node: NodeId, additive: bool },
    Deselect(NodeId),
    DeselectAll,
    Hover(Option<NodeId>),

    Open(NodeId),
    Close(NodeId),
    Toggle(NodeId),
    /// `None` opens the whole tree.
    OpenAll(Option<NodeId>),
    CloseAll(Option<NodeId>),

    /// `parent: None` creates at the root level.
    Create {
        parent: Option<NodeId>,
        node: NewNode,
    },
    /// Start an inline rename; `None` renames the last selected node.
    Rename(Option<NodeId>),
    RenameTo { node: NodeId, title: String },
    RenameInput(char),
    RenameBackspace,
    CommitRename,
    CancelRename,
    /// `None` removes every selected node.
    Remove(Option<NodeId>),

    Move {
        nodes: Vec<NodeId>,
        reference: NodeId,
        position: DropPosition,
    },
    Copy {
        nodes: Vec<NodeId>,
        reference: NodeId,
        position: DropPosition,
    },
    /// Move (or copy) nodes of this instance into another one.
    Transfer {
        target: InstanceId,
        nodes: Vec<NodeId>,
        reference: NodeId,
        position: DropPosition,
        copy: bool,
    },

    Lock,
    Unlock,
    Refresh,
    Search(String),
    Navigate(Direction),
}

/// All possible messages in the engine
#[derive(Debug, Clone)]
pub enum Message {
    /// Keyboard event, routed to the focused instance
    Key(InputKey),

    /// Periodic tick: drag open-ahead and auto-scroll
    Tick,

    /// Stop the runner
    Quit,

    // ─────────────────────────────────────────────────────────
    // Pointer / Drag Messages
    // ─────────────────────────────────────────────────────────
    PointerDown {
        point: Point,
        modifiers: Modifiers,
    },
    PointerMove {
        point: Point,
        modifiers: Modifiers,
    },
    PointerUp {
        point: Point,
        modifiers: Modifiers,
    },
    /// Something from outside every tree started being dragged
    ForeignDragStart {
        item: ForeignItem,
        point: Point,
    },
    /// Abort the active drag without side effects
    CancelDrag,
    /// A view reported where an instance and its rows are drawn
    Layout(ContainerLayout),
    /// Give keyboard focus to an instance
    Focus(InstanceId),
    FocusNext,

    // ─────────────────────────────────────────────────────────
    // Tree Commands
    // ─────────────────────────────────────────────────────────
    Command {
        instance: InstanceId,
        command: TreeCommand,
    },

    // ─────────────────────────────────────────────────────────
    // Async Load Results
    // ─────────────────────────────────────────────────────────
    /// Children (or the root level, for `node: None`) arrived
    ChildrenLoaded {
        instance: InstanceId,
        node: Option<NodeId>,
        generation: u64,
        nodes: Vec<NodeData>,
    },
    ChildrenLoadFailed {
        instance: InstanceId,
        node: Option<NodeId>,
        generation: u64,
        error: String,
    },
    ChildrenLoadTimeout {
        instance: InstanceId,
        node: Option<NodeId>,
        generation: u64,
    },
}

impl Message {
    /// Shorthand for [`Message::Command`].
    pub fn command(instance: InstanceId, command: TreeCommand) -> Self {
        Message::Command { instance, command }
    }
}
