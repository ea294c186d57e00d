//! Asynchronous child loading
//!
//! A [`TreeFetcher`] answers "give me the direct children of this node".
//! [`spawn_load_children`] runs one fetch on a tokio task, bounded by the
//! instance's timeout, and reports back through the engine's message
//! channel as `ChildrenLoaded`, `ChildrenLoadFailed` or `ChildrenLoadTimeout`.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use grove_core::prelude::*;
use grove_core::{DataKind, NodeData, NodeId};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::sync::mpsc;

use crate::instance::LoadRequest;
use crate::message::Message;
use crate::registry::InstanceId;

/// Request parameter for a fetch: the node id, `"0"` for the root level.
pub fn request_id(node: Option<&NodeId>) -> &str {
    node.map(NodeId::as_str).unwrap_or("0")
}

/// Source of node children
#[trait_variant::make(TreeFetcher: Send)]
pub trait LocalTreeFetcher {
    /// Direct children of `node` (`None` = root level) in the data contract.
    async fn fetch_children(&self, node: Option<&NodeId>) -> Result<Vec<NodeData>>;
}

// ─────────────────────────────────────────────────────────────────────────
// StaticFetcher
// ─────────────────────────────────────────────────────────────────────────

/// In-memory payloads keyed by request id. Unknown ids answer `[]`.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    responses: HashMap<String, Vec<NodeData>>,
    failures: HashSet<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(self, nodes: Vec<NodeData>) -> Self {
        self.with_children("0", nodes)
    }

    pub fn with_children(mut self, id: impl Into<String>, nodes: Vec<NodeData>) -> Self {
        self.responses.insert(id.into(), nodes);
        self
    }

    /// Make fetches for `id` fail with `LOAD: FAILED`.
    pub fn with_failure(mut self, id: impl Into<String>) -> Self {
        self.failures.insert(id.into());
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches started, shared between clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TreeFetcher for StaticFetcher {
    async fn fetch_children(&self, node: Option<&NodeId>) -> Result<Vec<NodeData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let id = request_id(node);
        if self.failures.contains(id) {
            return Err(Error::load_failed(format!("no data for id={id}")));
        }
        Ok(self.responses.get(id).cloned().unwrap_or_default())
    }
}

// ─────────────────────────────────────────────────────────────────────────
// FileFetcher
// ─────────────────────────────────────────────────────────────────────────

/// Reads `<dir>/<id>.<ext>`, the root level from `<dir>/_root.<ext>`. The
/// extension and parser follow the configured [`DataKind`].
///
/// Ids are percent-encoded before they become file names, so an id can never
/// name a path outside `dir`.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    dir: PathBuf,
    kind: DataKind,
}

const ROOT_STEM: &str = "_root";

/// Bytes that must not reach the file system verbatim in a file name.
const FILE_NAME: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'%')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|');

impl FileFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            kind: DataKind::default(),
        }
    }

    /// Read files of `kind` instead of JSON.
    pub fn with_kind(mut self, kind: DataKind) -> Self {
        self.kind = kind;
        self
    }

    /// Build from a `data.url` value: a `file://` URL or a plain path.
    pub fn from_url(location: &str) -> Result<Self> {
        match url::Url::parse(location) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::new)
                .map_err(|_| Error::config(format!("Invalid file URL: {location}"))),
            Ok(url) if url.scheme().len() > 1 => Err(Error::config(format!(
                "Unsupported data URL scheme '{}'",
                url.scheme()
            ))),
            // Relative paths and Windows drive letters are not URLs.
            _ => Ok(Self::new(location)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, node: Option<&NodeId>) -> PathBuf {
        let stem = match node {
            Some(id) => utf8_percent_encode(id.as_str(), FILE_NAME).to_string(),
            None => ROOT_STEM.to_string(),
        };
        self.dir.join(format!("{stem}.{}", self.kind.extension()))
    }
}

impl TreeFetcher for FileFetcher {
    async fn fetch_children(&self, node: Option<&NodeId>) -> Result<Vec<NodeData>> {
        let path = self.path_for(node);
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::load_failed(format!("{}: {}", path.display(), e)))?;
        self.kind
            .parse(&body)
            .map_err(|e| Error::load_failed(format!("{}: {}", path.display(), e)))
    }
}

// ─────────────────────────────────────────────────────────────────────────
// SharedFetcher
// ─────────────────────────────────────────────────────────────────────────

/// Boxed future returned by a [`SharedFetcher`] closure.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<NodeData>>> + Send>>;

/// Host-supplied fetch closure.
#[derive(Clone)]
pub struct SharedFetcher {
    fetch: Arc<dyn Fn(Option<NodeId>) -> FetchFuture + Send + Sync>,
}

impl SharedFetcher {
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(Option<NodeId>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<NodeData>>> + Send + 'static,
    {
        Self {
            fetch: Arc::new(move |node| Box::pin(fetch(node))),
        }
    }
}

impl std::fmt::Debug for SharedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFetcher").finish_non_exhaustive()
    }
}

impl TreeFetcher for SharedFetcher {
    async fn fetch_children(&self, node: Option<&NodeId>) -> Result<Vec<NodeData>> {
        (self.fetch)(node.cloned()).await
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Fetcher
// ─────────────────────────────────────────────────────────────────────────

/// The fetcher attached to an instance.
#[derive(Debug, Clone)]
pub enum Fetcher {
    Static(StaticFetcher),
    File(FileFetcher),
    Shared(SharedFetcher),
}

impl From<StaticFetcher> for Fetcher {
    fn from(f: StaticFetcher) -> Self {
        Fetcher::Static(f)
    }
}

impl From<FileFetcher> for Fetcher {
    fn from(f: FileFetcher) -> Self {
        Fetcher::File(f)
    }
}

impl From<SharedFetcher> for Fetcher {
    fn from(f: SharedFetcher) -> Self {
        Fetcher::Shared(f)
    }
}

impl TreeFetcher for Fetcher {
    async fn fetch_children(&self, node: Option<&NodeId>) -> Result<Vec<NodeData>> {
        match self {
            Fetcher::Static(f) => TreeFetcher::fetch_children(f, node).await,
            Fetcher::File(f) => TreeFetcher::fetch_children(f, node).await,
            Fetcher::Shared(f) => TreeFetcher::fetch_children(f, node).await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Spawning
// ─────────────────────────────────────────────────────────────────────────

/// Spawn a background task that fetches the children named by `request`.
///
/// Sends `Message::ChildrenLoaded` on success, `Message::ChildrenLoadFailed`
/// on error, or `Message::ChildrenLoadTimeout` when `timeout` elapses first.
pub fn spawn_load_children<F>(
    instance: InstanceId,
    request: LoadRequest,
    fetcher: F,
    timeout: Duration,
    msg_tx: mpsc::Sender<Message>,
) where
    F: TreeFetcher + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let LoadRequest { node, generation } = request;
        let fetch_result =
            tokio::time::timeout(timeout, TreeFetcher::fetch_children(&fetcher, node.as_ref())).await;

        let msg = match fetch_result {
            Err(_timeout) => {
                warn!(
                    "LoadChildren timed out after {}ms for tree {} node id={}",
                    timeout.as_millis(),
                    instance,
                    request_id(node.as_ref())
                );
                Message::ChildrenLoadTimeout {
                    instance,
                    node,
                    generation,
                }
            }
            Ok(Ok(nodes)) => Message::ChildrenLoaded {
                instance,
                node,
                generation,
                nodes,
            },
            Ok(Err(e)) => {
                warn!(
                    "LoadChildren failed for tree {} node id={}: {}",
                    instance,
                    request_id(node.as_ref()),
                    e
                );
                Message::ChildrenLoadFailed {
                    instance,
                    node,
                    generation,
                    error: e.to_string(),
                }
            }
        };

        if msg_tx.send(msg).await.is_err() {
            debug!("LoadChildren: engine gone before tree {} load finished", instance);
        }
    });
}
