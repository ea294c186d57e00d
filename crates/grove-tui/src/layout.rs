//! Screen layout definitions for the TUI
//!
//! Trees are placed side by side in equal columns above a one-line status
//! bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Screen areas for the main layout
#[derive(Debug, Clone)]
pub struct ScreenAreas {
    /// One bordered panel per tree, left to right in registration order
    pub trees: Vec<Rect>,

    /// Status line (last message + key hints)
    pub status: Rect,
}

/// Create the main screen layout for `tree_count` trees
pub fn create(area: Rect, tree_count: usize) -> ScreenAreas {
    let [main, status] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

    let trees = if tree_count == 0 {
        Vec::new()
    } else {
        let constraints = vec![Constraint::Ratio(1, tree_count as u32); tree_count];
        Layout::horizontal(constraints).split(main).to_vec()
    };

    ScreenAreas { trees, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_tree_fills_main_area() {
        let layout = create(Rect::new(0, 0, 80, 24), 1);
        assert_eq!(layout.trees, vec![Rect::new(0, 0, 80, 23)]);
        assert_eq!(layout.status, Rect::new(0, 23, 80, 1));
    }

    #[test]
    fn test_two_trees_split_horizontally() {
        let layout = create(Rect::new(0, 0, 80, 24), 2);
        assert_eq!(layout.trees.len(), 2);
        assert_eq!(layout.trees[0].width, 40);
        assert_eq!(layout.trees[1].x, 40);
        assert_eq!(layout.trees[1].height, 23);
    }

    #[test]
    fn test_no_trees() {
        let layout = create(Rect::new(0, 0, 80, 24), 0);
        assert!(layout.trees.is_empty());
        assert_eq!(layout.status.y, 23);
    }
}
