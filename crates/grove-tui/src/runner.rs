//! Main TUI runner - entry point and event loop
//!
//! Contains the application lifecycle:
//! - `run`: Set up the terminal, drive the engine, restore the terminal
//! - `run_loop`: Draw, report layouts, feed terminal events to the engine

use grove_app::config::DragSettings;
use grove_app::message::Message;
use grove_app::{ContainerLayout, Engine};
use grove_core::prelude::*;
use ratatui::layout::Rect;
use ratatui::DefaultTerminal;

use super::{event, render, terminal};

/// Drag tuning for one-cell rows: start after one cell, scroll one row at a
/// time, keep the proxy just right of the pointer.
pub fn terminal_drag_settings() -> DragSettings {
    DragSettings {
        threshold: 1.0,
        scroll_margin_y: 1.0,
        scroll_margin_x: 2.0,
        scroll_step: 1.0,
        proxy_offset: (2.0, 0.0),
        ..DragSettings::default()
    }
}

/// Run the TUI until the user quits
///
/// Must be called inside a tokio runtime: the engine spawns fetches.
pub async fn run(mut engine: Engine) -> Result<()> {
    // Install panic hook for terminal restoration
    terminal::install_panic_hook();

    let mut term = ratatui::init();
    if let Err(e) = terminal::enable_mouse() {
        warn!("Mouse capture unavailable, keyboard only: {}", e);
    }
    info!("Grove TUI started with {} tree(s)", engine.state.registry.len());

    let result = run_loop(&mut term, &mut engine);

    terminal::disable_mouse();
    ratatui::restore();
    result
}

/// Main event loop
fn run_loop(term: &mut DefaultTerminal, engine: &mut Engine) -> Result<()> {
    let mut reported: Vec<ContainerLayout> = Vec::new();
    let mut ticker = event::Ticker::default();

    while !engine.should_quit() {
        // Fetch results that arrived since the last frame
        engine.drain_pending_messages();

        let size = term.size()?;
        render::reveal(&mut engine.state, Rect::new(0, 0, size.width, size.height));

        let mut layouts = Vec::new();
        term.draw(|frame| layouts = render::view(frame, &engine.state))?;

        // Hit-testing follows what is on screen
        if layouts != reported {
            for layout in &layouts {
                engine.process_message(Message::Layout(layout.clone()));
            }
            reported = layouts;
        }

        for message in event::poll(&mut ticker)? {
            engine.process_message(message);
        }
    }

    info!("Grove TUI exiting");
    Ok(())
}
