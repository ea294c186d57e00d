//! Main render/view function (View in TEA pattern)

use grove_app::drag::DropCue;
use grove_app::state::AppState;
use grove_app::ContainerLayout;
use ratatui::layout::Rect;
use ratatui::text::Span;
use ratatui::widgets::Clear;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::layout;
use crate::theme::styles;
use crate::widgets::{tree_view, StatusBar, TreeView};

/// Scroll every tree to the row it asked to reveal. Runs before drawing so
/// the view and the reported layout agree.
pub fn reveal(state: &mut AppState, area: Rect) {
    let areas = layout::create(area, state.registry.len());
    let ids = state.registry.ids().to_vec();
    for (id, tree_area) in ids.into_iter().zip(areas.trees) {
        if let Some(instance) = state.registry.get_mut(id) {
            tree_view::reveal_requested(instance, tree_area);
        }
    }
}

/// Render the complete UI (View function in TEA)
///
/// Returns the geometry of every tree as drawn, for the engine's
/// hit-testing.
pub fn view(frame: &mut Frame, state: &AppState) -> Vec<ContainerLayout> {
    let area = frame.area();
    let areas = layout::create(area, state.registry.len());
    let focused = state.focused();
    let session = state.drag.session();

    let mut layouts = Vec::with_capacity(areas.trees.len());
    for (instance, tree_area) in state.registry.iter().zip(areas.trees.iter().copied()) {
        let marker = match session.map(|s| s.cue) {
            Some(DropCue::Marker { instance: id, y, .. }) if id == instance.id() => Some(y),
            _ => None,
        };
        frame.render_widget(
            TreeView::new(instance)
                .focused(focused == Some(instance.id()))
                .marker(marker),
            tree_area,
        );
        layouts.push(tree_view::container_layout(instance, tree_area));
    }

    frame.render_widget(StatusBar::new(state), areas.status);

    if let Some(session) = session {
        render_proxy(frame, area, &session.proxy.title, session.proxy.position, session.cue);
    }
    layouts
}

/// Floating label next to the pointer while dragging
fn render_proxy(
    frame: &mut Frame,
    screen: Rect,
    title: &str,
    position: grove_core::Point,
    cue: DropCue,
) {
    let allowed = matches!(cue, DropCue::Marker { .. });
    let label = if allowed {
        format!(" {title} ")
    } else {
        format!(" ✗ {title} ")
    };
    let x = (position.x.max(0.0) as u16).min(screen.right().saturating_sub(1));
    let y = (position.y.max(0.0) as u16).min(screen.bottom().saturating_sub(1));
    let width = (label.width() as u16).min(screen.right().saturating_sub(x));
    if width == 0 {
        return;
    }
    let rect = Rect::new(x, y, width, 1);
    frame.render_widget(Clear, rect);
    frame.render_widget(Span::styled(label, styles::drag_proxy(allowed)), rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_app::config::TreeOptions;
    use grove_app::instance::TreeInstance;
    use grove_app::persistence::MemoryStore;
    use grove_app::registry::next_instance_id;
    use grove_app::NoopCallbacks;
    use grove_core::{NodeData, NodeId, RuleScope};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn state_with_trees(count: usize) -> AppState {
        let mut state = AppState::new();
        for _ in 0..count {
            let mut options = TreeOptions::with_nodes(vec![
                NodeData::new("home", "Home"),
                NodeData::new("second", "Second"),
            ]);
            options.rules.draggable = RuleScope::All;
            options.drag = crate::runner::terminal_drag_settings();
            let mut instance = TreeInstance::new(
                next_instance_id(),
                options,
                Box::new(NoopCallbacks),
                Box::new(MemoryStore::new()),
            );
            instance.initialize().unwrap();
            state.registry.insert(instance);
        }
        state
    }

    #[test]
    fn test_view_reports_one_layout_per_tree() {
        let state = state_with_trees(2);
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let mut layouts = Vec::new();
        terminal
            .draw(|frame| layouts = view(frame, &state))
            .unwrap();

        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].rows[0].node, NodeId::new("home"));
        assert!(layouts[1].viewport.x >= 30.0);
    }

    #[test]
    fn test_proxy_drawn_while_dragging() {
        let mut state = state_with_trees(1);
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let mut layouts = Vec::new();
        terminal
            .draw(|frame| layouts = view(frame, &state))
            .unwrap();
        for layout in layouts {
            state.drag.register(&mut state.registry, layout);
        }

        // Press on Second (screen row 2) and drag onto Home (row 1).
        let now = std::time::Instant::now();
        let modifiers = grove_app::Modifiers::NONE;
        state
            .drag
            .pointer_down(&mut state.registry, grove_core::Point::new(5.5, 2.5));
        state.drag.pointer_move(
            &state.registry,
            grove_core::Point::new(5.5, 1.5),
            modifiers,
            now,
        );
        assert!(state.drag.is_dragging());

        terminal.draw(|frame| {
            view(frame, &state);
        })
        .unwrap();
        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains(" Second "));
        assert!(rendered.contains('▶'));
    }
}
