//! Action handlers: UpdateAction dispatch and background task spawning

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::handler::{LoadJob, UpdateAction};
use crate::loader::{spawn_load_children, Fetcher};
use crate::message::Message;
use crate::registry::InstanceId;

/// Fetchers attached to instances, keyed by instance
pub type FetcherMap = HashMap<InstanceId, Fetcher>;

/// Execute an action by spawning background tasks
///
/// Loads with nothing to fetch are answered on the spot; their results are
/// returned for the caller to process right away.
pub fn handle_action(
    action: UpdateAction,
    msg_tx: &mpsc::Sender<Message>,
    fetchers: &FetcherMap,
) -> Vec<Message> {
    match action {
        UpdateAction::LoadChildren(jobs) => jobs
            .into_iter()
            .filter_map(|job| dispatch_load(job, msg_tx, fetchers))
            .collect(),
    }
}

fn dispatch_load(
    job: LoadJob,
    msg_tx: &mpsc::Sender<Message>,
    fetchers: &FetcherMap,
) -> Option<Message> {
    let LoadJob {
        instance,
        request,
        timeout,
    } = job;
    match fetchers.get(&instance) {
        Some(fetcher) => {
            spawn_load_children(instance, request, fetcher.clone(), timeout, msg_tx.clone());
            None
        }
        None => {
            // Nothing to ask: the node has no children after all.
            debug!(
                "Tree {} has no fetcher, answering {:?} with no children",
                instance, request.node
            );
            Some(Message::ChildrenLoaded {
                instance,
                node: request.node,
                generation: request.generation,
                nodes: Vec::new(),
            })
        }
    }
}
