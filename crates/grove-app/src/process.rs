//! Message processing
//!
//! Runs the TEA update loop for one message, following up messages and
//! dispatching actions.

use std::collections::VecDeque;

use tokio::sync::mpsc;

use crate::actions::{handle_action, FetcherMap};
use crate::handler;
use crate::message::Message;
use crate::state::AppState;

/// Process a message through the TEA update function
pub fn process_message(
    state: &mut AppState,
    message: Message,
    msg_tx: &mpsc::Sender<Message>,
    fetchers: &FetcherMap,
) {
    let mut queue = VecDeque::from([message]);
    while let Some(m) = queue.pop_front() {
        let result = handler::update(state, m);

        // Handle any action; loads answered locally wait behind follow-ups
        if let Some(action) = result.action {
            queue.extend(handle_action(action, msg_tx, fetchers));
        }

        // Continue with follow-up message
        if let Some(next) = result.message {
            queue.push_front(next);
        }
    }
}
