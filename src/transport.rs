//! The server boundary: full-snapshot fetch plus the handful of mutation
//! endpoints the tree core drives. Implementations wrap whatever HTTP/IPC
//! stack the embedding application uses; tests substitute in-memory fakes.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    error::CanopyError,
    properties::{Branch, BranchId, Note, NoteId},
};

/// Full tree snapshot as returned by `GET tree`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    /// Server-suggested path to activate after load. An address-bar fragment
    /// takes precedence when present.
    #[serde(default)]
    pub start_note_path: Option<String>,
    pub notes: Vec<Note>,
    pub branches: Vec<Branch>,
    /// Auxiliary relation records. Carried on the wire for other consumers;
    /// the tree core does not interpret them.
    #[serde(default)]
    pub relations: Vec<serde_json::Value>,
}

/// Where a created note lands relative to the target branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateTarget {
    /// Trailing sibling of the target node.
    After,
    /// New child of the target node.
    Into,
}

impl FromStr for CreateTarget {
    type Err = CanopyError;

    /// Unrecognized targets fail fast with a BadRequest-class error; there
    /// is no silent fallback.
    fn from_str(s: &str) -> Result<CreateTarget, CanopyError> {
        match s {
            "after" => Ok(CreateTarget::After),
            "into" => Ok(CreateTarget::Into),
            other => Err(CanopyError::Command(format!(
                "Unrecognized create target: {other}"
            ))),
        }
    }
}

/// Body of `POST notes/{parentNoteId}/children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: String,
    pub target: CreateTarget,
    /// Positioning anchor for `after` targets. Absent when creating under
    /// the root sentinel, which has no branch of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_branch_id: Option<BranchId>,
    pub is_protected: bool,
}

/// Server response to a note creation: the new entities, ids assigned
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNoteResponse {
    pub note: Note,
    pub branch: Branch,
}

/// Async server contract. Every call is a suspension point; no retry logic
/// lives at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET tree`, the full snapshot of notes, branches and relations.
    async fn load_tree(&self) -> Result<TreeSnapshot, CanopyError>;

    /// `POST notes/{parentNoteId}/children`
    async fn create_note(
        &self,
        parent_note_id: &NoteId,
        request: CreateNoteRequest,
    ) -> Result<CreateNoteResponse, CanopyError>;

    /// `PUT notes/{noteId}/sort`
    async fn sort_children(&self, note_id: &NoteId) -> Result<(), CanopyError>;

    /// `PUT branches/{branchId}/expanded/{0|1}`
    async fn set_expanded(&self, branch_id: &BranchId, is_expanded: bool)
        -> Result<(), CanopyError>;

    /// `PUT recent-notes/{branchId}/{urlEncodedPath}`
    async fn put_recent_note(
        &self,
        branch_id: &BranchId,
        encoded_path: &str,
    ) -> Result<(), CanopyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_target_parsing() {
        assert_eq!(CreateTarget::from_str("after").unwrap(), CreateTarget::After);
        assert_eq!(CreateTarget::from_str("into").unwrap(), CreateTarget::Into);
        assert!(matches!(
            CreateTarget::from_str("sideways"),
            Err(CanopyError::Command(_))
        ));
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot: TreeSnapshot = serde_json::from_str(
            r#"{
                "startNotePath": "root/a",
                "notes": [{"noteId": "a", "title": "A"}],
                "branches": [{"branchId": "b1", "noteId": "a", "parentNoteId": "root"}],
                "relations": [{"name": "link", "sourceNoteId": "a", "targetNoteId": "a"}]
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.start_note_path.as_deref(), Some("root/a"));
        assert_eq!(snapshot.notes.len(), 1);
        assert_eq!(snapshot.branches.len(), 1);
        assert_eq!(snapshot.relations.len(), 1);
    }
}
