//! [TreeController] orchestrates the cache, the view and the server
//! transport. It is the single writer for both shared structures; widget
//! callbacks and pushed server messages all funnel through it.
//!
//! Concurrency model: methods run on a single-threaded runtime and never
//! hold a lock across an await point. Interleavings happen only at
//! transport calls, which is why reload applies a fully validated cache in
//! one swap instead of mutating in place.
use parking_lot::{Mutex, RwLock};
use std::{str::FromStr, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    cache::TreeCache,
    config::TreeConfig,
    error::CanopyError,
    event::{requires_reload, NavigationRequest, NavigationResult, TreeMessage},
    paths::{find_any_path, resolve_run_path, NotePath},
    properties::{BranchId, NoteId},
    transport::{CreateNoteRequest, CreateTarget, Transport},
    view::{TreeView, VisualNodeId},
};

/// Keyboard shortcuts routed to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Create a trailing sibling of the active node.
    CreateSiblingAfter,
    /// Create a child of the active node.
    CreateChild,
    /// Hand the current selection off for deletion.
    DeleteSelection,
    /// Scroll the active node into view.
    ScrollToCurrent,
    /// Collapse everything except the root.
    CollapseAll,
}

/// One row of the "also appears in" listing for a cloned note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorPath {
    /// Path from just below the root down to the note itself.
    pub path: NotePath,
    pub parent_note_id: NoteId,
    /// Whether this is the placement the focused visual node displays.
    pub is_current: bool,
}

#[derive(Clone)]
pub struct TreeController {
    cache: Arc<RwLock<TreeCache>>,
    view: Arc<RwLock<TreeView>>,
    transport: Arc<dyn Transport>,
    config: TreeConfig,
    nav_tx: mpsc::UnboundedSender<NavigationResult>,
    /// Pending recent-notes commit, replaced wholesale on every activation.
    recent_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TreeController {
    /// The receiver carries navigation output for the embedding shell. Drop
    /// it and subsequent activations fail with [CanopyError::Service].
    pub fn new(
        transport: Arc<dyn Transport>,
        config: TreeConfig,
    ) -> (TreeController, mpsc::UnboundedReceiver<NavigationResult>) {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        (
            TreeController {
                cache: Arc::new(RwLock::new(TreeCache::default())),
                view: Arc::new(RwLock::new(TreeView::default())),
                transport,
                config,
                nav_tx,
                recent_task: Arc::new(Mutex::new(None)),
            },
            nav_rx,
        )
    }

    /// Initial load or external fragment change. On initial load an address
    /// bar fragment takes precedence over the server's start path; with
    /// neither, the root itself is activated.
    pub async fn load(&self, request: NavigationRequest) -> Result<(), CanopyError> {
        match request {
            NavigationRequest::Load { fragment } => {
                let start_path = self.reload().await?;
                let path = fragment
                    .or(start_path)
                    .unwrap_or_else(|| NotePath::from(vec![NoteId::root()]));
                if let Err(err) = self.activate_note(&path, false) {
                    // A start path naming a deleted note falls back to root.
                    tracing::warn!("Cannot activate start path {path}: {err}");
                    self.activate_note(&NotePath::from(vec![NoteId::root()]), false)?;
                }
            }
            NavigationRequest::FragmentChanged(path) => {
                self.activate_note(&path, false)?;
            }
        }
        Ok(())
    }

    /// Fetch a fresh snapshot and swap it in. The view rebuild preserves
    /// expansion by branch id and re-activates the surviving active edge.
    /// Returns the server's start path, when it sent one.
    pub async fn reload(&self) -> Result<Option<NotePath>, CanopyError> {
        let snapshot = self.transport.load_tree().await?;
        let fresh = TreeCache::from_snapshot(&snapshot)?;
        tracing::debug!(
            "Reloaded tree: {} notes, {} branches",
            fresh.note_count(),
            fresh.branch_count()
        );
        {
            let mut cache = self.cache.write();
            *cache = fresh;
            self.view.write().reload(&cache);
        }
        Ok(snapshot
            .start_note_path
            .as_deref()
            .map(NotePath::parse)
            .filter(|path| !path.is_empty()))
    }

    /// Server push dispatch. A sync batch triggers at most one reload, and
    /// only when it names note or branch entities.
    pub async fn handle_message(&self, message: TreeMessage) -> Result<(), CanopyError> {
        match message {
            TreeMessage::RefreshTree => {
                self.reload().await?;
            }
            TreeMessage::Sync(batch) => {
                if requires_reload(&batch) {
                    self.reload().await?;
                } else {
                    tracing::debug!("Ignoring sync batch of {} records", batch.len());
                }
            }
        }
        Ok(())
    }

    /// Expand ancestors down to the note the path names, repairing the path
    /// against the cache first. Programmatic expansion is view-only and is
    /// not persisted to the server. A note the view cannot show (no
    /// materializable edge) degrades to a warning and `Ok(None)`.
    pub fn expand_to_note(&self, path: &NotePath) -> Result<Option<VisualNodeId>, CanopyError> {
        let cache = self.cache.read();
        let run_path = resolve_run_path(path, &cache)?;
        let mut view = self.view.write();
        let Some(mut current) = view.root() else {
            return Ok(None);
        };
        let mut hops = run_path.iter();
        // The first hop is the root sentinel, which `current` already is.
        hops.next();
        for hop in hops {
            view.set_expanded(current, true, &cache);
            let parent_note_id = view.node(current).map(|node| node.note_id.clone());
            match view.find_child_node(hop, parent_note_id.as_ref()) {
                Some(next) => current = next,
                None => {
                    tracing::warn!(
                        "Cannot find tree node for note {hop} on path {run_path}"
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    /// Activate the node the path names: expand to it, mark it active, push
    /// its canonical path to the address bar and schedule the debounced
    /// recent-notes commit.
    pub fn activate_note(
        &self,
        path: &NotePath,
        is_new: bool,
    ) -> Result<Option<VisualNodeId>, CanopyError> {
        match self.expand_to_note(path)? {
            Some(node_id) => {
                self.finish_activation(node_id, is_new)?;
                Ok(Some(node_id))
            }
            None => Ok(None),
        }
    }

    fn finish_activation(&self, node_id: VisualNodeId, is_new: bool) -> Result<(), CanopyError> {
        let (canonical, branch_id, note_id) = {
            let mut view = self.view.write();
            if !view.activate(node_id) {
                return Err(CanopyError::NotFound(format!(
                    "No visual node {node_id}"
                )));
            }
            let node = view.node(node_id).ok_or_else(|| {
                CanopyError::NotFound(format!("No visual node {node_id}"))
            })?;
            let canonical = view.note_path(node_id).ok_or_else(|| {
                CanopyError::Cache(format!("Visual node {node_id} has a broken ancestor chain"))
            })?;
            (canonical, node.branch_id.clone(), node.note_id.clone())
        };
        self.nav_tx
            .send(NavigationResult::Fragment(canonical.clone()))?;
        if is_new {
            self.nav_tx.send(NavigationResult::NewNoteCreated(note_id))?;
        }
        if let Some(branch_id) = branch_id {
            self.schedule_recent_note(branch_id, canonical);
        }
        Ok(())
    }

    /// Canonical path of the active node, derived from its displayed
    /// ancestor chain.
    pub fn current_note_path(&self) -> Option<NotePath> {
        let view = self.view.read();
        view.active().and_then(|id| view.note_path(id))
    }

    /// Every placement of a cloned note, one row per branch. Paths omit the
    /// root sentinel.
    pub fn ancestor_paths(
        &self,
        note_id: &NoteId,
        focused: Option<VisualNodeId>,
    ) -> Result<Vec<AncestorPath>, CanopyError> {
        let cache = self.cache.read();
        let view = self.view.read();
        let focused_parent = focused
            .and_then(|id| view.node(id))
            .and_then(|node| node.parent_note_id.clone());
        let mut rows = Vec::new();
        for branch in cache.branches_for_note(note_id) {
            let parent = branch.parent_note_id.clone();
            let path = if parent.is_root() {
                NotePath::from(vec![note_id.clone()])
            } else {
                find_any_path(&parent, &cache)?.child(note_id.clone())
            };
            rows.push(AncestorPath {
                path,
                is_current: focused_parent.as_ref() == Some(&parent),
                parent_note_id: parent,
            });
        }
        Ok(rows)
    }

    /// Update a branch prefix and re-render the affected clone's title. The
    /// edit is local; persistence is the attribute dialog's concern.
    pub fn set_prefix(
        &self,
        branch_id: &BranchId,
        prefix: Option<String>,
    ) -> Result<(), CanopyError> {
        let note_id = {
            let mut cache = self.cache.write();
            let branch = cache.branch_mut(branch_id).ok_or_else(|| {
                CanopyError::NotFound(format!("No branch {branch_id}"))
            })?;
            branch.prefix = prefix;
            let note_id = branch.note_id.clone();
            self.view.write().render_titles(&note_id, &cache);
            note_id
        };
        tracing::debug!("Updated prefix on branch {branch_id} of note {note_id}");
        Ok(())
    }

    /// Update a note title across all of its clones.
    pub fn set_note_title(&self, note_id: &NoteId, title: &str) -> Result<(), CanopyError> {
        let mut cache = self.cache.write();
        let note = cache.note_mut(note_id).ok_or_else(|| {
            CanopyError::NotFound(format!("No note {note_id}"))
        })?;
        note.title = title.to_string();
        self.view.write().render_titles(note_id, &cache);
        Ok(())
    }

    /// Flip the protection flag on a note and every clone displaying it.
    pub fn set_protected(&self, note_id: &NoteId, is_protected: bool) -> Result<(), CanopyError> {
        let mut cache = self.cache.write();
        let note = cache.note_mut(note_id).ok_or_else(|| {
            CanopyError::NotFound(format!("No note {note_id}"))
        })?;
        note.is_protected = is_protected;
        self.view.write().set_protected(note_id, is_protected);
        Ok(())
    }

    /// Create a note relative to an existing visual node. The target string
    /// is validated before anything is sent; an unrecognized target fails
    /// with a BadRequest-class error and no side effects.
    pub async fn create_note(
        &self,
        node_id: VisualNodeId,
        target: &str,
        is_protected: bool,
    ) -> Result<Option<VisualNodeId>, CanopyError> {
        let target = CreateTarget::from_str(target)?;
        let (parent_note_id, target_branch_id) = {
            let view = self.view.read();
            let node = view.node(node_id).ok_or_else(|| {
                CanopyError::NotFound(format!("No visual node {node_id}"))
            })?;
            match target {
                CreateTarget::After => {
                    let parent = node.parent_note_id.clone().ok_or_else(|| {
                        CanopyError::Command(
                            "Cannot create a sibling of the root".to_string(),
                        )
                    })?;
                    (parent, node.branch_id.clone())
                }
                CreateTarget::Into => (node.note_id.clone(), node.branch_id.clone()),
            }
        };
        let request = CreateNoteRequest {
            title: self.config.new_note_title.clone(),
            target,
            target_branch_id,
            is_protected,
        };
        let response = self.transport.create_note(&parent_note_id, request).await?;
        let new_id = {
            let mut cache = self.cache.write();
            cache.add(response.note.clone(), response.branch.clone());
            let mut view = self.view.write();
            match target {
                CreateTarget::After => {
                    view.insert_sibling_after(node_id, &response.note, &response.branch)
                }
                CreateTarget::Into => {
                    view.insert_child(node_id, &response.note, &response.branch, &cache)
                }
            }
        };
        match new_id {
            Some(new_id) => {
                self.finish_activation(new_id, true)?;
                Ok(Some(new_id))
            }
            None => {
                tracing::warn!(
                    "Created note {} but could not place it in the view",
                    response.note.note_id
                );
                Ok(None)
            }
        }
    }

    /// Create a note directly under the root.
    pub async fn create_top_level_note(&self) -> Result<Option<VisualNodeId>, CanopyError> {
        let root = self.view.read().root().ok_or_else(|| {
            CanopyError::Cache("Tree has not been loaded".to_string())
        })?;
        self.create_note(root, "into", false).await
    }

    /// Ask the server to sort a note's children alphabetically, then reload
    /// to pick up the new order.
    pub async fn sort_alphabetically(&self, note_id: &NoteId) -> Result<(), CanopyError> {
        self.transport.sort_children(note_id).await?;
        self.reload().await?;
        Ok(())
    }

    /// User-driven expand/collapse. Unlike programmatic expansion this is
    /// persisted, so the state survives the next snapshot.
    pub async fn toggle_expanded(&self, node_id: VisualNodeId) -> Result<(), CanopyError> {
        let (branch_id, expanded) = {
            let cache = self.cache.read();
            let mut view = self.view.write();
            let node = view.node(node_id).ok_or_else(|| {
                CanopyError::NotFound(format!("No visual node {node_id}"))
            })?;
            let Some(branch_id) = node.branch_id.clone() else {
                // root stays expanded
                return Ok(());
            };
            let expanded = !node.expanded;
            view.set_expanded(node_id, expanded, &cache);
            (branch_id, expanded)
        };
        if let Some(branch) = self.cache.write().branch_mut(&branch_id) {
            branch.is_expanded = expanded;
        }
        self.transport.set_expanded(&branch_id, expanded).await?;
        Ok(())
    }

    /// Keyboard dispatch. Commands that need an active node degrade to a
    /// warning when there is none.
    pub async fn handle_key(&self, command: KeyCommand) -> Result<(), CanopyError> {
        let active = self.view.read().active();
        match command {
            KeyCommand::CreateSiblingAfter | KeyCommand::CreateChild => {
                let Some(node_id) = active else {
                    tracing::warn!("No active node for {command:?}");
                    return Ok(());
                };
                let is_protected = self
                    .view
                    .read()
                    .node(node_id)
                    .map(|node| node.is_protected)
                    .unwrap_or(false);
                let target = match command {
                    KeyCommand::CreateChild => "into",
                    _ => "after",
                };
                self.create_note(node_id, target, is_protected).await?;
            }
            KeyCommand::DeleteSelection => {
                let selection = {
                    let view = self.view.read();
                    let mut nodes = view.selected_nodes();
                    if nodes.is_empty() {
                        nodes.extend(view.active());
                    }
                    nodes
                };
                if selection.is_empty() {
                    tracing::warn!("No selection to delete");
                    return Ok(());
                }
                self.nav_tx
                    .send(NavigationResult::DeleteRequested(selection))?;
            }
            KeyCommand::ScrollToCurrent => {
                let Some(node_id) = active else {
                    tracing::warn!("No active node to scroll to");
                    return Ok(());
                };
                self.nav_tx.send(NavigationResult::ScrollToActive(node_id))?;
            }
            KeyCommand::CollapseAll => {
                self.view.write().collapse_all();
            }
        }
        Ok(())
    }

    /// Replace any pending recent-notes commit with a fresh delayed one. The
    /// commit only fires if the user is still on the same path when the
    /// delay elapses; rapid navigation keeps cancelling the previous task.
    fn schedule_recent_note(&self, branch_id: BranchId, path: NotePath) {
        let mut slot = self.recent_task.lock();
        if let Some(pending) = slot.take() {
            pending.abort();
        }
        let controller = self.clone();
        let delay = self.config.recent_note_delay();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if controller.current_note_path().as_ref() != Some(&path) {
                return;
            }
            if let Err(err) = controller
                .transport
                .put_recent_note(&branch_id, &path.encoded())
                .await
            {
                tracing::warn!("Failed to record recent note {path}: {err}");
            }
        }));
    }

    pub fn cache(&self) -> Arc<RwLock<TreeCache>> {
        self.cache.clone()
    }

    pub fn view(&self) -> Arc<RwLock<TreeView>> {
        self.view.clone()
    }
}

impl std::fmt::Debug for TreeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeController")
            .field("notes", &self.cache.read().note_count())
            .field("visual_nodes", &self.view.read().node_count())
            .finish()
    }
}
