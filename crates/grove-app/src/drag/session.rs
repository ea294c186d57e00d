//! State of one drag gesture

use std::time::Instant;

use grove_core::{DropPosition, NodeData, NodeId, Point};

use crate::registry::InstanceId;

/// An item dragged in from outside every tree (a palette entry, a file).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForeignItem {
    pub id: String,
    pub title: String,
    /// Matched against the target's `droppable` list.
    pub classes: Vec<String>,
    /// Full node payload; without it a leaf is built from `id` and `title`.
    pub data: Option<NodeData>,
}

impl ForeignItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Add space separated class names.
    pub fn with_class(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_data(mut self, data: NodeData) -> Self {
        self.data = Some(data);
        self
    }
}

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragSource {
    Tree {
        instance: InstanceId,
        nodes: Vec<NodeId>,
    },
    Foreign(ForeignItem),
}

impl DragSource {
    pub fn origin(&self) -> Option<InstanceId> {
        match self {
            DragSource::Tree { instance, .. } => Some(*instance),
            DragSource::Foreign(_) => None,
        }
    }
}

/// Floating label that follows the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct DragProxy {
    pub title: String,
    pub position: Point,
}

/// A drop that passed validation at the current pointer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMove {
    pub instance: InstanceId,
    pub reference: NodeId,
    pub position: DropPosition,
}

/// Visual feedback for the current pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DropCue {
    /// Over empty container space.
    #[default]
    None,
    /// Insertion marker on a row boundary (or the row centre for inside).
    Marker {
        instance: InstanceId,
        x: f32,
        y: f32,
        width: f32,
    },
    /// The drop would be refused (or would delete, with `drag_out_delete`).
    Remove,
}

/// Node the pointer rests on, for expanding closed targets.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HoverTimer {
    pub instance: InstanceId,
    pub node: NodeId,
    pub since: Instant,
    pub fired: bool,
}

/// One active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: DragSource,
    pub proxy: DragProxy,
    pub pointer: Point,
    /// Instance under the pointer, if any.
    pub target: Option<InstanceId>,
    pub candidate: Option<CandidateMove>,
    pub cue: DropCue,
    pub copy_modifier: bool,
    pub(crate) hover: Option<HoverTimer>,
}

impl DragSession {
    pub fn new(source: DragSource, title: String, pointer: Point) -> Self {
        Self {
            source,
            proxy: DragProxy {
                title,
                position: pointer,
            },
            pointer,
            target: None,
            candidate: None,
            cue: DropCue::None,
            copy_modifier: false,
            hover: None,
        }
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self.source, DragSource::Foreign(_))
    }

    /// Dragged node ids, empty for foreign drags.
    pub fn nodes(&self) -> &[NodeId] {
        match &self.source {
            DragSource::Tree { nodes, .. } => nodes,
            DragSource::Foreign(_) => &[],
        }
    }
}
