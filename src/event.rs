//! Messaging and navigation event types.
//!
//! [TreeMessage] models the two notification classes delivered by the server
//! push channel: a generic refresh signal and entity sync batches.
//! [NavigationRequest] / [NavigationResult] make the address-bar fragment an
//! explicit input/output of the controller instead of ambient document state,
//! so navigation is deterministic under test.
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::{paths::NotePath, properties::NoteId, view::VisualNodeId};

/// Entity kind tag on a sync record. Only `notes` and `branches` invalidate
/// the displayed structure; everything else is ignored by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Notes,
    Branches,
    Relations,
    Options,
    #[serde(other)]
    Other,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Notes => write!(f, "notes"),
            EntityKind::Branches => write!(f, "branches"),
            EntityKind::Relations => write!(f, "relations"),
            EntityKind::Options => write!(f, "options"),
            EntityKind::Other => write!(f, "other"),
        }
    }
}

/// One change record within an entity sync batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub entity_name: EntityKind,
    #[serde(default)]
    pub entity_id: Option<String>,
}

impl SyncRecord {
    pub fn new(entity_name: EntityKind) -> SyncRecord {
        SyncRecord {
            entity_name,
            entity_id: None,
        }
    }
}

/// Coarse-grained invalidation: the displayed structure is considered stale
/// iff the batch names `notes` or `branches`. No incremental patching.
pub fn requires_reload(batch: &[SyncRecord]) -> bool {
    batch.iter().any(|record| {
        matches!(
            record.entity_name,
            EntityKind::Notes | EntityKind::Branches
        )
    })
}

/// A notification from the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "data")]
pub enum TreeMessage {
    /// Named signal requesting an unconditional reload of the displayed
    /// structure from the server.
    RefreshTree,
    /// A batch of entity change records.
    Sync(Vec<SyncRecord>),
}

impl Display for TreeMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeMessage::RefreshTree => write!(f, "RefreshTree"),
            TreeMessage::Sync(batch) => write!(f, "Sync[{}]", batch.len()),
        }
    }
}

/// Navigation input to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationRequest {
    /// Initial load. A fragment parsed from the address bar, when present,
    /// takes precedence over the server-provided start path.
    Load { fragment: Option<NotePath> },
    /// External fragment-change event (back/forward, pasted link).
    FragmentChanged(NotePath),
}

/// Navigation output from the controller, consumed by the embedding shell
/// (address bar, content view, widget).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    /// Write the canonical path of the newly activated node to the address
    /// bar fragment.
    Fragment(NotePath),
    /// The content-view collaborator should reset its new-note state.
    NewNoteCreated(NoteId),
    /// The widget should scroll the active node into view and focus it.
    ScrollToActive(VisualNodeId),
    /// The selection should be deleted by the tree-changes collaborator.
    DeleteRequested(Vec<VisualNodeId>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_reload_coarsening() {
        let relations_only = vec![
            SyncRecord::new(EntityKind::Relations),
            SyncRecord::new(EntityKind::Options),
        ];
        assert!(!requires_reload(&relations_only));

        let with_notes = vec![
            SyncRecord::new(EntityKind::Relations),
            SyncRecord::new(EntityKind::Notes),
        ];
        assert!(requires_reload(&with_notes));

        let with_branches = vec![SyncRecord::new(EntityKind::Branches)];
        assert!(requires_reload(&with_branches));

        assert!(!requires_reload(&[]));
    }

    #[test]
    fn test_sync_record_wire_shape() {
        let record: SyncRecord =
            serde_json::from_str(r#"{"entityName": "branches", "entityId": "b12"}"#).unwrap();
        assert_eq!(record.entity_name, EntityKind::Branches);
        assert_eq!(record.entity_id.as_deref(), Some("b12"));

        // unknown entity kinds deserialize and are ignored by the predicate
        let record: SyncRecord =
            serde_json::from_str(r#"{"entityName": "recent_notes"}"#).unwrap();
        assert_eq!(record.entity_name, EntityKind::Other);
        assert!(!requires_reload(&[record]));
    }
}
