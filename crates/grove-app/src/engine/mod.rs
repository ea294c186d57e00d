//! Engine - owns every tree instance, the drag controller and the message loop
//!
//! Hosts create trees through the engine, feed it [`Message`]s (pointer,
//! key, layout, commands) and drain the channel that background fetches
//! report into. Everything runs on the caller's thread; only fetches are
//! spawned onto tokio, so methods that may start a fetch must be called
//! from inside a tokio runtime.


use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::actions::{handle_action, FetcherMap};
use crate::callbacks::TreeCallbacks;
use crate::config::TreeOptions;
use crate::handler;
use crate::instance::TreeInstance;
use crate::loader::{Fetcher, FileFetcher};
use crate::message::Message;
use crate::persistence::KeyValueStore;
use crate::process;
use crate::registry::{next_instance_id, InstanceId};
use crate::state::AppState;

/// Orchestration engine for Grove.
pub struct Engine {
    /// TEA state (the Model)
    pub state: AppState,

    /// Sender half of the message channel.
    /// Clone this to give to input sources (terminal events, host code).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Fetcher per instance; instances without one never load remotely.
    fetchers: FetcherMap,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("fetchers", &self.fetchers.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with no trees and a message channel (capacity 256).
    pub fn new() -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        Self {
            state: AppState::new(),
            msg_tx,
            msg_rx,
            fetchers: FetcherMap::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Instances
    // ─────────────────────────────────────────────────────────────────────

    /// Create and load a tree. A `data.url` gets a [`FileFetcher`].
    pub fn create_tree(
        &mut self,
        options: TreeOptions,
        callbacks: impl TreeCallbacks + 'static,
        store: impl KeyValueStore + 'static,
    ) -> InstanceId {
        let kind = options.data.kind;
        let fetcher = options
            .data
            .url
            .as_deref()
            .map(|url| FileFetcher::from_url(url).map(|f| f.with_kind(kind)));
        let id = next_instance_id();
        let mut instance = TreeInstance::new(id, options, Box::new(callbacks), Box::new(store));
        match fetcher {
            Some(Ok(fetcher)) => {
                self.fetchers.insert(id, fetcher.into());
            }
            Some(Err(e)) => {
                instance.report(e);
            }
            None => {}
        }
        self.insert_tree(instance)
    }

    /// Create and load a tree whose data comes from `fetcher`. Inline
    /// `data.nodes`/`data.json` still provide the root level when set;
    /// the fetcher then only serves children.
    pub fn create_tree_with_fetcher(
        &mut self,
        options: TreeOptions,
        callbacks: impl TreeCallbacks + 'static,
        store: impl KeyValueStore + 'static,
        fetcher: impl Into<Fetcher>,
    ) -> InstanceId {
        let id = next_instance_id();
        let mut instance = TreeInstance::new(id, options, Box::new(callbacks), Box::new(store));
        instance.set_remote_root(true);
        self.fetchers.insert(id, fetcher.into());
        self.insert_tree(instance)
    }

    fn insert_tree(&mut self, mut instance: TreeInstance) -> InstanceId {
        let id = instance.id();
        if let Err(e) = instance.initialize() {
            debug!("Tree {} initial load failed: {}", id, e);
        }
        self.state.registry.insert(instance);
        self.dispatch_pending_loads();
        info!("Created tree {} ({} trees)", id, self.state.registry.len());
        id
    }

    /// Remove a tree. Its outstanding fetches are ignored when they return.
    pub fn destroy_tree(&mut self, id: InstanceId) -> Option<TreeInstance> {
        self.state.drag.unregister(id);
        self.fetchers.remove(&id);
        let removed = self.state.registry.remove(id);
        if removed.is_some() {
            info!("Destroyed tree {}", id);
        }
        removed
    }

    pub fn tree(&self, id: InstanceId) -> Option<&TreeInstance> {
        self.state.registry.get(id)
    }

    /// Direct access for host code. Fetches queued through it start on the
    /// next processed message.
    pub fn tree_mut(&mut self, id: InstanceId) -> Option<&mut TreeInstance> {
        self.state.registry.get_mut(id)
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit
    }

    // ─────────────────────────────────────────────────────────────────────
    // Message loop
    // ─────────────────────────────────────────────────────────────────────

    /// Process a single message through the TEA update cycle.
    pub fn process_message(&mut self, msg: Message) {
        process::process_message(&mut self.state, msg, &self.msg_tx, &self.fetchers);
    }

    /// Process every message already waiting in the channel. Returns how
    /// many were processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Wait until no tree has a fetch outstanding.
    pub async fn settle(&mut self) {
        loop {
            self.drain_pending_messages();
            self.dispatch_pending_loads();
            if !self.state.registry.iter().any(|i| i.has_pending_loads()) {
                return;
            }
            match self.msg_rx.recv().await {
                Some(msg) => self.process_message(msg),
                None => return,
            }
        }
    }

    fn dispatch_pending_loads(&mut self) {
        if let Some(action) = handler::pending_loads(&mut self.state) {
            for msg in handle_action(action, &self.msg_tx, &self.fetchers) {
                self.process_message(msg);
            }
        }
    }
}
