//! Terminal event polling
//!
//! Mouse cells become pointer events in cell units. A row is one cell high,
//! so the drop position inside it cannot come from the pointer alone:
//! Shift aims at the row's top third (drop before), Alt at its bottom third
//! (drop after), and no modifier at its centre (drop inside).

use crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use grove_app::message::Message;
use grove_app::{InputKey, Modifiers};
use grove_core::prelude::*;
use grove_core::Point;
use std::time::{Duration, Instant};

/// Convert crossterm KeyEvent to InputKey
pub fn key_event_to_input(key: crossterm::event::KeyEvent) -> Option<InputKey> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputKey::CharCtrl(c))
        }
        KeyCode::Char(c) => Some(InputKey::Char(c)),
        KeyCode::Enter => Some(InputKey::Enter),
        KeyCode::Esc => Some(InputKey::Esc),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(InputKey::BackTab),
        KeyCode::Tab => Some(InputKey::Tab),
        KeyCode::BackTab => Some(InputKey::BackTab),
        KeyCode::Backspace => Some(InputKey::Backspace),
        KeyCode::Delete => Some(InputKey::Delete),
        KeyCode::Up => Some(InputKey::Up),
        KeyCode::Down => Some(InputKey::Down),
        KeyCode::Left => Some(InputKey::Left),
        KeyCode::Right => Some(InputKey::Right),
        KeyCode::Home => Some(InputKey::Home),
        KeyCode::End => Some(InputKey::End),
        KeyCode::PageUp => Some(InputKey::PageUp),
        KeyCode::PageDown => Some(InputKey::PageDown),
        KeyCode::F(n) => Some(InputKey::F(n)),
        _ => None, // Unsupported keys ignored
    }
}

fn modifiers(m: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: m.contains(KeyModifiers::CONTROL),
        shift: m.contains(KeyModifiers::SHIFT),
        alt: m.contains(KeyModifiers::ALT),
    }
}

/// Point inside cell `(column, row)` aimed at by the held modifiers.
pub fn cell_point(column: u16, row: u16, modifiers: Modifiers) -> Point {
    let dy = if modifiers.shift {
        0.1
    } else if modifiers.alt {
        0.9
    } else {
        0.5
    };
    Point::new(column as f32 + 0.5, row as f32 + dy)
}

/// Convert crossterm MouseEvent to a pointer message
pub fn mouse_event_to_message(mouse: MouseEvent) -> Option<Message> {
    let modifiers = modifiers(mouse.modifiers);
    let point = cell_point(mouse.column, mouse.row, modifiers);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Message::PointerDown { point, modifiers }),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(Message::PointerMove { point, modifiers })
        }
        MouseEventKind::Up(MouseButton::Left) => Some(Message::PointerUp { point, modifiers }),
        MouseEventKind::ScrollUp => Some(Message::Key(InputKey::Up)),
        MouseEventKind::ScrollDown => Some(Message::Key(InputKey::Down)),
        _ => None,
    }
}

/// Interval between ticks (20 FPS)
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Fixed tick schedule. Tick drives open-ahead and auto-scroll while
/// dragging, so it must keep firing while pointer events stream in.
#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    last: Instant,
    interval: Duration,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: Instant::now(),
            interval,
        }
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.saturating_duration_since(self.last))
    }

    /// Whether a tick is due at `now`; if so the schedule advances.
    pub fn due(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        true
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

fn event_to_message(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind == event::KeyEventKind::Press => {
            key_event_to_input(key).map(Message::Key)
        }
        Event::Mouse(mouse) => mouse_event_to_message(mouse),
        _ => None,
    }
}

/// Poll for terminal events until the next tick is due. The tick follows
/// any event read in the same call.
pub fn poll(ticker: &mut Ticker) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    if event::poll(ticker.remaining(Instant::now()))? {
        messages.extend(event_to_message(event::read()?));
    }
    if ticker.due(Instant::now()) {
        messages.push(Message::Tick);
    }
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn mouse(kind: MouseEventKind, column: u16, row: u16, modifiers: KeyModifiers) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers,
        }
    }

    #[test]
    fn test_char_conversion() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(key_event_to_input(key), Some(InputKey::Char('a')));
    }

    #[test]
    fn test_char_with_ctrl_conversion() {
        let key = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::CONTROL);
        assert_eq!(key_event_to_input(key), Some(InputKey::CharCtrl(' ')));
    }

    #[test]
    fn test_backtab_with_shift() {
        let key = KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT);
        assert_eq!(key_event_to_input(key), Some(InputKey::BackTab));
    }

    #[test]
    fn test_function_key_conversion() {
        let key = KeyEvent::new(KeyCode::F(2), KeyModifiers::NONE);
        assert_eq!(key_event_to_input(key), Some(InputKey::F(2)));
    }

    #[test]
    fn test_unsupported_key_returns_none() {
        let key = KeyEvent::new(KeyCode::Insert, KeyModifiers::NONE);
        assert_eq!(key_event_to_input(key), None);
    }

    #[test]
    fn test_cell_point_aims_by_modifier() {
        assert_eq!(cell_point(4, 2, Modifiers::NONE), Point::new(4.5, 2.5));
        let shift = Modifiers {
            shift: true,
            ..Modifiers::NONE
        };
        assert!((cell_point(4, 2, shift).y - 2.1).abs() < 1e-6);
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert!((cell_point(4, 2, alt).y - 2.9).abs() < 1e-6);
    }

    #[test]
    fn test_left_press_drag_release() {
        let down = mouse_event_to_message(mouse(
            MouseEventKind::Down(MouseButton::Left),
            3,
            1,
            KeyModifiers::NONE,
        ));
        assert!(matches!(down, Some(Message::PointerDown { point, .. }) if point == Point::new(3.5, 1.5)));

        let drag = mouse_event_to_message(mouse(
            MouseEventKind::Drag(MouseButton::Left),
            3,
            4,
            KeyModifiers::CONTROL,
        ));
        assert!(matches!(drag, Some(Message::PointerMove { modifiers, .. }) if modifiers.ctrl));

        let up = mouse_event_to_message(mouse(
            MouseEventKind::Up(MouseButton::Left),
            3,
            4,
            KeyModifiers::NONE,
        ));
        assert!(matches!(up, Some(Message::PointerUp { .. })));
    }

    #[test]
    fn test_right_button_ignored() {
        let msg = mouse_event_to_message(mouse(
            MouseEventKind::Down(MouseButton::Right),
            0,
            0,
            KeyModifiers::NONE,
        ));
        assert!(msg.is_none());
    }

    #[test]
    fn test_ticker_fires_on_schedule_regardless_of_events() {
        let start = Instant::now();
        let mut ticker = Ticker {
            last: start,
            interval: Duration::from_millis(50),
        };

        // Events every 10ms never starve the tick
        let fired: Vec<u64> = (1..=12)
            .map(|i| i * 10)
            .filter(|ms| ticker.due(start + Duration::from_millis(*ms)))
            .collect();
        assert_eq!(fired, vec![50, 100]);
        assert_eq!(
            ticker.remaining(start + Duration::from_millis(120)),
            Duration::from_millis(30)
        );
        assert_eq!(ticker.remaining(start + Duration::from_millis(400)), Duration::ZERO);
    }

    #[test]
    fn test_release_key_is_ignored() {
        let mut key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        key.kind = event::KeyEventKind::Release;
        assert!(event_to_message(Event::Key(key)).is_none());
    }

    #[test]
    fn test_wheel_moves_cursor() {
        let msg = mouse_event_to_message(mouse(MouseEventKind::ScrollDown, 0, 0, KeyModifiers::NONE));
        assert!(matches!(msg, Some(Message::Key(InputKey::Down))));
    }
}
