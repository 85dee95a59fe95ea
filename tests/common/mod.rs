//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use canopy_core::{
    error::CanopyError,
    properties::{Branch, BranchId, Note, NoteId},
    transport::{CreateNoteRequest, CreateNoteResponse, Transport, TreeSnapshot},
};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times - subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub fn note(note_id: &str, title: &str) -> Note {
    Note::new(note_id, title)
}

#[allow(dead_code)]
pub fn branch(branch_id: &str, note_id: &str, parent_note_id: &str) -> Branch {
    Branch::new(branch_id, note_id, parent_note_id)
}

#[allow(dead_code)]
pub fn snapshot(notes: Vec<Note>, branches: Vec<Branch>) -> TreeSnapshot {
    TreeSnapshot {
        start_note_path: None,
        notes,
        branches,
        relations: Vec::new(),
    }
}

/// Server double backed by a mutable snapshot. Tests mutate the snapshot to
/// simulate server-side changes, then push sync messages.
pub struct RecordingTransport {
    pub snapshot: Mutex<TreeSnapshot>,
    pub calls: Mutex<Vec<String>>,
    next_id: AtomicUsize,
}

impl RecordingTransport {
    #[allow(dead_code)]
    pub fn new(snapshot: TreeSnapshot) -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport {
            snapshot: Mutex::new(snapshot),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
        })
    }

    #[allow(dead_code)]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
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
        let mut held = self.snapshot.lock();
        held.notes.push(new_note.clone());
        held.branches.push(new_branch.clone());
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
