//! # Drag Session Controller
//!
//! One controller per engine tracks the single active drag across every
//! registered tree container.
//!
//! ```text
//! Idle ──pointer down on a row──▶ Armed ──moved past threshold──▶ Dragging
//!   ▲                               │                               │
//!   └──────── pointer up (click) ───┘◀── pointer up (drop) / cancel ┘
//! ```
//!
//! Views report their geometry as [`ContainerLayout`]s; pointer events are
//! hit-tested against them. Every move while dragging re-validates the drop
//! with the target instance's rules, so the cue always reflects what a
//! release would do.

pub mod layout;
pub mod session;

use std::time::{Duration, Instant};

use grove_core::prelude::*;
use grove_core::{MoveSubject, NodeId, NodeState, Point};

use crate::config::DragSettings;
use crate::input_key::Modifiers;
use crate::registry::{InstanceId, InstanceRegistry};

pub use layout::{drop_position, marker_y, ContainerLayout, RowLayout};
pub use session::{CandidateMove, DragProxy, DragSession, DragSource, DropCue, ForeignItem};

use session::HoverTimer;

/// Controller state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragPhase {
    #[default]
    Idle,
    /// Pointer is down on a row but has not moved far enough.
    Armed {
        instance: InstanceId,
        node: NodeId,
        start: Point,
        draggable: bool,
    },
    Dragging(DragSession),
}

/// What a pointer release did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No gesture was in progress.
    None,
    /// Pressed and released without dragging.
    Clicked {
        instance: InstanceId,
        node: NodeId,
        additive: bool,
    },
    Moved {
        instance: InstanceId,
        nodes: Vec<NodeId>,
    },
    Copied {
        instance: InstanceId,
        nodes: Vec<NodeId>,
    },
    /// A foreign item became a node.
    Created { instance: InstanceId, node: NodeId },
    /// Dropped outside every tree with `drag_out_delete`.
    Removed {
        instance: InstanceId,
        nodes: Vec<NodeId>,
    },
    /// Released without a valid target.
    Discarded,
    /// A `before_*` callback refused.
    Vetoed,
    /// The operation failed; the code was already reported.
    Failed { code: String },
}

/// Owns the drag state machine and the registered container geometry.
#[derive(Debug, Default)]
pub struct DragSessionController {
    /// Registration order; later containers are hit-tested first.
    layouts: Vec<ContainerLayout>,
    phase: DragPhase,
}

fn drag_settings(registry: &InstanceRegistry, instance: Option<InstanceId>) -> DragSettings {
    instance
        .and_then(|id| registry.get(id))
        .map(|i| i.options().drag.clone())
        .unwrap_or_default()
}

impl DragSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Register (or update) a container's geometry. Also updates the
    /// instance's scroll bounds.
    pub fn register(&mut self, registry: &mut InstanceRegistry, layout: ContainerLayout) {
        if let Some(instance) = registry.get_mut(layout.instance) {
            let (max_x, max_y) = layout.scroll_bounds();
            instance.viewport_mut().set_bounds(max_x, max_y);
        }
        match self
            .layouts
            .iter_mut()
            .find(|l| l.instance == layout.instance)
        {
            Some(existing) => *existing = layout,
            None => self.layouts.push(layout),
        }
    }

    /// Forget a container. A drag from it is cancelled.
    pub fn unregister(&mut self, instance: InstanceId) {
        self.layouts.retain(|l| l.instance != instance);
        let involved = match &self.phase {
            DragPhase::Armed { instance: i, .. } => *i == instance,
            DragPhase::Dragging(s) => s.source.origin() == Some(instance),
            DragPhase::Idle => false,
        };
        if involved {
            self.cancel();
        }
    }

    pub fn layout(&self, instance: InstanceId) -> Option<&ContainerLayout> {
        self.layouts.iter().find(|l| l.instance == instance)
    }

    fn container_at(&self, p: Point) -> Option<&ContainerLayout> {
        self.layouts.iter().rev().find(|l| l.contains(p))
    }

    // ─────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.phase {
            DragPhase::Dragging(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging(_))
    }

    /// Abort any gesture without side effects. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        let active = self.phase != DragPhase::Idle;
        if active {
            debug!("Drag cancelled");
        }
        self.phase = DragPhase::Idle;
        active
    }

    // ─────────────────────────────────────────────────────────────────────
    // Pointer events
    // ─────────────────────────────────────────────────────────────────────

    /// Press at `point`. Focuses the container under the pointer and arms a
    /// drag on the row hit. Returns whether a row was hit.
    pub fn pointer_down(&mut self, registry: &mut InstanceRegistry, point: Point) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.phase = DragPhase::Idle;
        let Some(layout) = self.container_at(point) else {
            return false;
        };
        let instance = layout.instance;
        registry.focus(instance);
        let Some(row) = layout.row_at(point) else {
            return false;
        };
        let node = row.node.clone();
        let draggable = registry
            .get(instance)
            .is_some_and(|i| !i.is_locked() && i.is_draggable(&node));
        self.phase = DragPhase::Armed {
            instance,
            node,
            start: point,
            draggable,
        };
        true
    }

    /// Start dragging an item that belongs to no tree.
    pub fn begin_foreign_drag(&mut self, item: ForeignItem, point: Point) {
        debug!("Foreign drag started: {}", item.id);
        let title = item.title.clone();
        self.phase = DragPhase::Dragging(DragSession::new(DragSource::Foreign(item), title, point));
    }

    /// Pointer moved. Returns whether the drag state changed.
    pub fn pointer_move(
        &mut self,
        registry: &InstanceRegistry,
        point: Point,
        modifiers: Modifiers,
        now: Instant,
    ) -> bool {
        if let DragPhase::Armed {
            instance,
            node,
            start,
            draggable,
        } = &self.phase
        {
            let settings = drag_settings(registry, Some(*instance));
            if !*draggable || point.max_axis_distance(*start) < settings.threshold {
                return false;
            }
            let Some(source) = registry.get(*instance) else {
                return false;
            };
            let nodes = source.drag_sources(node);
            if nodes.is_empty() {
                return false;
            }
            let title = if nodes.len() > 1 {
                source.options().lang.multiple_selection.clone()
            } else {
                source.title(&nodes[0]).unwrap_or_default().to_string()
            };
            debug!("Drag started in tree {}: {:?}", instance, nodes);
            let session = DragSession::new(
                DragSource::Tree {
                    instance: *instance,
                    nodes,
                },
                title,
                point,
            );
            self.phase = DragPhase::Dragging(session);
        }

        let DragPhase::Dragging(session) = &mut self.phase else {
            return false;
        };
        let (dx, dy) = drag_settings(registry, session.source.origin()).proxy_offset;
        session.pointer = point;
        session.proxy.position = point.offset(dx, dy);
        session.copy_modifier = modifiers.ctrl;
        resolve_target(&self.layouts, registry, session, now);
        true
    }

    /// Engine tick while dragging: expand a closed node the pointer has
    /// rested on, and auto-scroll near container edges. Returns whether
    /// anything changed.
    pub fn tick(&mut self, registry: &mut InstanceRegistry, now: Instant) -> bool {
        let DragPhase::Dragging(session) = &mut self.phase else {
            return false;
        };
        let mut changed = false;

        if let Some(timer) = session.hover.as_mut().filter(|t| !t.fired) {
            let delay = Duration::from_millis(drag_settings(registry, Some(timer.instance)).open_ahead_ms);
            if now.saturating_duration_since(timer.since) >= delay {
                timer.fired = true;
                if let Some(instance) = registry
                    .get_mut(timer.instance)
                    .filter(|i| !i.is_locked())
                {
                    match instance.open_node(&timer.node) {
                        Ok(opened) => changed |= opened,
                        Err(e) => debug!("Open-ahead on {} failed: {}", timer.node, e),
                    }
                }
            }
        }

        let pointer = session.pointer;
        if let Some(layout) = self.layouts.iter().rev().find(|l| l.contains(pointer)) {
            let settings = drag_settings(registry, Some(layout.instance));
            let view = &layout.viewport;
            let step = settings.scroll_step;

            let dy = if pointer.y < view.top() + settings.scroll_margin_y {
                -step
            } else if pointer.y >= view.bottom() - settings.scroll_margin_y {
                step
            } else {
                0.0
            };
            let dx = if !layout.overflows_x() {
                0.0
            } else if pointer.x < view.left() + settings.scroll_margin_x {
                -step
            } else if pointer.x >= view.right() - settings.scroll_margin_x {
                step
            } else {
                0.0
            };

            if dx != 0.0 || dy != 0.0 {
                if let Some(instance) = registry.get_mut(layout.instance) {
                    changed |= instance.viewport_mut().scroll_by(dx, dy);
                }
            }
        }
        changed
    }

    /// Release at `point`: commit the candidate drop, or report a click.
    /// The controller is `Idle` afterwards on every path.
    pub fn pointer_up(
        &mut self,
        registry: &mut InstanceRegistry,
        point: Point,
        modifiers: Modifiers,
    ) -> DropOutcome {
        match std::mem::take(&mut self.phase) {
            DragPhase::Idle => DropOutcome::None,
            DragPhase::Armed { instance, node, .. } => DropOutcome::Clicked {
                instance,
                node,
                additive: modifiers.ctrl,
            },
            DragPhase::Dragging(mut session) => {
                session.pointer = point;
                session.copy_modifier = modifiers.ctrl;
                resolve_target(&self.layouts, registry, &mut session, Instant::now());
                commit(registry, session)
            }
        }
    }
}

/// Re-evaluate target, candidate and cue for the session's pointer.
fn resolve_target(
    layouts: &[ContainerLayout],
    registry: &InstanceRegistry,
    session: &mut DragSession,
    now: Instant,
) {
    session.candidate = None;
    let Some(layout) = layouts.iter().rev().find(|l| l.contains(session.pointer)) else {
        session.target = None;
        session.cue = DropCue::Remove;
        session.hover = None;
        return;
    };
    session.target = Some(layout.instance);

    let Some(target) = registry.get(layout.instance) else {
        session.cue = DropCue::Remove;
        session.hover = None;
        return;
    };
    if let Some(origin) = session.source.origin() {
        let origin_multitree = registry
            .get(origin)
            .is_some_and(|o| o.options().rules.multitree);
        if origin != layout.instance && (!origin_multitree || !target.options().rules.multitree) {
            session.cue = DropCue::Remove;
            session.hover = None;
            return;
        }
    }

    let Some(row) = layout.row_at(session.pointer) else {
        session.cue = DropCue::None;
        session.hover = None;
        return;
    };
    let position = drop_position(&row.rect, session.pointer.y);

    let closed = target.tree().get(&row.node).map(|n| n.state()) == Some(NodeState::Closed);
    if position == grove_core::DropPosition::Inside && closed {
        let same = session
            .hover
            .as_ref()
            .is_some_and(|h| h.instance == layout.instance && h.node == row.node);
        if !same {
            session.hover = Some(HoverTimer {
                instance: layout.instance,
                node: row.node.clone(),
                since: now,
                fired: false,
            });
        }
    } else {
        session.hover = None;
    }

    let verdict = if target.is_locked() {
        Err(Error::Locked)
    } else {
        match &session.source {
            DragSource::Tree { instance, nodes } if *instance == layout.instance => {
                if target.options().rules.drag_copy.is_copy(session.copy_modifier) {
                    target.can_copy(nodes, &row.node, position)
                } else {
                    target.can_move(nodes, &row.node, position)
                }
            }
            DragSource::Tree { instance, nodes } => match registry.get(*instance) {
                Some(origin) => {
                    let mut subjects = origin.outgoing_subjects(nodes);
                    target.can_receive(&mut subjects, &row.node, position)
                }
                None => Err(Error::invalid_operation("TREE: NOT FOUND")),
            },
            DragSource::Foreign(item) => {
                let mut subjects = vec![MoveSubject::foreign(item.id.as_str(), item.classes.clone())];
                target.can_receive(&mut subjects, &row.node, position)
            }
        }
    };

    match verdict {
        Ok(()) => {
            session.cue = DropCue::Marker {
                instance: layout.instance,
                x: row.rect.left(),
                y: marker_y(&row.rect, position),
                width: row.rect.width,
            };
            session.candidate = Some(CandidateMove {
                instance: layout.instance,
                reference: row.node.clone(),
                position,
            });
        }
        Err(e) => {
            trace!("Drop on {} {} refused: {}", position, row.node, e);
            session.cue = DropCue::Remove;
        }
    }
}

fn commit(registry: &mut InstanceRegistry, session: DragSession) -> DropOutcome {
    let failed = |e: Error| DropOutcome::Failed { code: e.code() };
    match (session.candidate, session.source) {
        (Some(c), DragSource::Tree { instance, nodes }) => {
            let copy = registry
                .get(instance)
                .is_some_and(|o| o.options().rules.drag_copy.is_copy(session.copy_modifier));
            match registry.transfer(instance, c.instance, &nodes, &c.reference, c.position, copy) {
                Ok(Some(nodes)) if copy => DropOutcome::Copied {
                    instance: c.instance,
                    nodes,
                },
                Ok(Some(nodes)) => DropOutcome::Moved {
                    instance: c.instance,
                    nodes,
                },
                Ok(None) => DropOutcome::Vetoed,
                Err(e) => failed(e),
            }
        }
        (Some(c), DragSource::Foreign(item)) => {
            let Some(target) = registry.get_mut(c.instance) else {
                return DropOutcome::Discarded;
            };
            match target.drop_foreign(&item, &c.reference, c.position) {
                Ok(Some(node)) => DropOutcome::Created {
                    instance: c.instance,
                    node,
                },
                Ok(None) => DropOutcome::Vetoed,
                Err(e) => failed(e),
            }
        }
        (None, DragSource::Tree { instance, nodes }) if session.target.is_none() => {
            let Some(origin) = registry.get_mut(instance) else {
                return DropOutcome::Discarded;
            };
            if !origin.options().rules.drag_out_delete {
                return DropOutcome::Discarded;
            }
            match origin.remove_nodes(&nodes) {
                Ok(nodes) => DropOutcome::Removed { instance, nodes },
                Err(e) => failed(e),
            }
        }
        _ => DropOutcome::Discarded,
    }
}
