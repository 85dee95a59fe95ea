//! [crate::properties] contains the basic building blocks of the note tree:
//! entity identifiers, the [Note] and [Branch] entities, the root sentinel,
//! and display-title rendering.
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub use uuid::Uuid;

/// The distinguished identifier denoting the top of the hierarchy. The root
/// is a sentinel, not a real note: it has no incoming [Branch] edge and no
/// entity record of its own.
pub const ROOT_NOTE_ID: &str = "root";

/// Identity of a [Note]. Opaque server-assigned string, unique per note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn root() -> NoteId {
        NoteId(ROOT_NOTE_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_NOTE_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a fresh client-side id. Server-assigned ids are authoritative;
    /// this exists for local/demo transports.
    pub fn random() -> NoteId {
        NoteId(Uuid::new_v4().simple().to_string())
    }
}

impl From<String> for NoteId {
    fn from(value: String) -> NoteId {
        NoteId(value)
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> NoteId {
        NoteId(value.to_string())
    }
}

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a [Branch] edge. Distinct from [NoteId] because the same note
/// can have many incoming edges (clones), each with its own branch identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn random() -> BranchId {
        BranchId(Uuid::new_v4().simple().to_string())
    }
}

impl From<String> for BranchId {
    fn from(value: String) -> BranchId {
        BranchId(value)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> BranchId {
        BranchId(value.to_string())
    }
}

impl Display for BranchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content entity. Owns no structural pointers itself; parent/child
/// relationships live in [Branch] records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: NoteId,
    pub title: String,
    /// Opaque protection flag. Carried through to visual nodes, never
    /// interpreted by this crate.
    #[serde(default)]
    pub is_protected: bool,
}

impl Note {
    pub fn new<I: Into<NoteId>, T: Into<String>>(note_id: I, title: T) -> Note {
        Note {
            note_id: note_id.into(),
            title: title.into(),
            is_protected: false,
        }
    }
}

/// One directed edge recording that `note_id` is a child of `parent_note_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub branch_id: BranchId,
    pub note_id: NoteId,
    pub parent_note_id: NoteId,
    /// Optional display string prepended to the note title for this edge only.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Server-persisted UI expansion state.
    #[serde(default)]
    pub is_expanded: bool,
}

impl Branch {
    pub fn new<B, N, P>(branch_id: B, note_id: N, parent_note_id: P) -> Branch
    where
        B: Into<BranchId>,
        N: Into<NoteId>,
        P: Into<NoteId>,
    {
        Branch {
            branch_id: branch_id.into(),
            note_id: note_id.into(),
            parent_note_id: parent_note_id.into(),
            prefix: None,
            is_expanded: false,
        }
    }
}

/// Render the display title for one edge: `"{prefix} - {title}"` when the
/// branch carries a prefix, else the bare title, escaped for HTML display.
pub fn display_title(title: &str, prefix: Option<&str>) -> String {
    let raw = match prefix {
        Some(p) if !p.is_empty() => format!("{p} - {title}"),
        _ => title.to_string(),
    };
    html_escape::encode_text(&raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_with_prefix() {
        assert_eq!(display_title("Groceries", Some("TODO")), "TODO - Groceries");
        assert_eq!(display_title("Groceries", None), "Groceries");
        assert_eq!(display_title("Groceries", Some("")), "Groceries");
    }

    #[test]
    fn test_display_title_escapes_html() {
        assert_eq!(
            display_title("<b>Groceries</b>", None),
            "&lt;b&gt;Groceries&lt;/b&gt;"
        );
        assert_eq!(
            display_title("Fish & Chips", Some("<i>")),
            "&lt;i&gt; - Fish &amp; Chips"
        );
    }

    #[test]
    fn test_root_sentinel() {
        assert!(NoteId::root().is_root());
        assert!(!NoteId::from("rootish").is_root());
        assert_eq!(NoteId::root().as_str(), ROOT_NOTE_ID);
    }

    #[test]
    fn test_entity_wire_shape() {
        let branch: Branch = serde_json::from_str(
            r#"{"branchId": "b1", "noteId": "n1", "parentNoteId": "root", "prefix": "TODO", "isExpanded": true}"#,
        )
        .unwrap();
        assert_eq!(branch.branch_id, BranchId::from("b1"));
        assert_eq!(branch.parent_note_id, NoteId::root());
        assert_eq!(branch.prefix.as_deref(), Some("TODO"));
        assert!(branch.is_expanded);

        let note: Note = serde_json::from_str(r#"{"noteId": "n1", "title": "First"}"#).unwrap();
        assert_eq!(note.note_id, NoteId::from("n1"));
        assert!(!note.is_protected);
    }
}
