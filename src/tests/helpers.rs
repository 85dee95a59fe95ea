//! Shared test utilities: entity builders, snapshot assembly and an
//! in-memory server fake.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    config::TreeConfig,
    controller::TreeController,
    error::CanopyError,
    event::NavigationResult,
    properties::{Branch, BranchId, Note, NoteId},
    transport::{CreateNoteRequest, CreateNoteResponse, Transport, TreeSnapshot},
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn note(note_id: &str, title: &str) -> Note {
    Note::new(note_id, title)
}

pub fn branch(branch_id: &str, note_id: &str, parent_note_id: &str) -> Branch {
    Branch::new(branch_id, note_id, parent_note_id)
}

pub fn snapshot(notes: Vec<Note>, branches: Vec<Branch>) -> TreeSnapshot {
    TreeSnapshot {
        start_note_path: None,
        notes,
        branches,
        relations: Vec::new(),
    }
}

/// In-memory server double. Records every call and keeps its snapshot
/// mutable so created notes show up on the next reload.
pub struct FakeTransport {
    pub snapshot: Mutex<TreeSnapshot>,
    /// Call log, one compact line per endpoint hit.
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl FakeTransport {
    pub fn new(snapshot: TreeSnapshot) -> Arc<FakeTransport> {
        Arc::new(FakeTransport {
            snapshot: Mutex::new(snapshot),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn load_tree(&self) -> Result<TreeSnapshot, CanopyError> {
        self.calls.lock().push("load_tree".to_string());
        Ok(self.snapshot.lock().clone())
    }

    async fn create_note(
        &self,
        parent_note_id: &NoteId,
        request: CreateNoteRequest,
    ) -> Result<CreateNoteResponse, CanopyError> {
        self.calls
            .lock()
            .push(format!("create_note:{parent_note_id}"));
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut new_note = Note::new(format!("new{seq}").as_str(), request.title.as_str());
        new_note.is_protected = request.is_protected;
        let new_branch = Branch::new(
            format!("newBranch{seq}").as_str(),
            new_note.note_id.as_str(),
            parent_note_id.as_str(),
        );
        let mut snapshot = self.snapshot.lock();
        snapshot.notes.push(new_note.clone());
        snapshot.branches.push(new_branch.clone());
        Ok(CreateNoteResponse {
            note: new_note,
            branch: new_branch,
        })
    }

    async fn sort_children(&self, note_id: &NoteId) -> Result<(), CanopyError> {
        self.calls.lock().push(format!("sort:{note_id}"));
        Ok(())
    }

    async fn set_expanded(
        &self,
        branch_id: &BranchId,
        is_expanded: bool,
    ) -> Result<(), CanopyError> {
        self.calls
            .lock()
            .push(format!("set_expanded:{branch_id}:{is_expanded}"));
        let mut snapshot = self.snapshot.lock();
        if let Some(branch) = snapshot
            .branches
            .iter_mut()
            .find(|branch| &branch.branch_id == branch_id)
        {
            branch.is_expanded = is_expanded;
        }
        Ok(())
    }

    async fn put_recent_note(
        &self,
        branch_id: &BranchId,
        encoded_path: &str,
    ) -> Result<(), CanopyError> {
        self.calls
            .lock()
            .push(format!("recent:{branch_id}:{encoded_path}"));
        Ok(())
    }
}

/// A controller wired to a [FakeTransport] over the given snapshot.
pub fn test_controller(
    snapshot: TreeSnapshot,
) -> (
    TreeController,
    UnboundedReceiver<NavigationResult>,
    Arc<FakeTransport>,
) {
    init_logging();
    let transport = FakeTransport::new(snapshot);
    let (controller, nav_rx) = TreeController::new(transport.clone(), TreeConfig::default());
    (controller, nav_rx, transport)
}

/// Drain all navigation results currently queued.
pub fn drain(nav_rx: &mut UnboundedReceiver<NavigationResult>) -> Vec<NavigationResult> {
    let mut results = Vec::new();
    while let Ok(result) = nav_rx.try_recv() {
        results.push(result);
    }
    results
}
