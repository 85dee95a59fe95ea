use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use url::Url;

use crate::{
    error::CanopyError,
    properties::NoteId,
};

/// Separator between note ids in the textual form of a path.
pub const PATH_SEPARATOR: char = '/';

/// An ordered sequence of note ids describing one route from an ancestor
/// toward a descendant, serialized root-to-leaf (`"root/a/b"`). Paths are
/// transient derived values: they are parsed from address-bar fragments and
/// bookmarks, repaired against the live edge set, and regenerated from
/// visual nodes, but never persisted structurally.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotePath(Vec<NoteId>);

impl NotePath {
    pub fn new(ids: Vec<NoteId>) -> NotePath {
        NotePath(ids)
    }

    /// Parse a textual path. Empty segments are dropped, so `"a//b/"` and
    /// `"a/b"` parse identically.
    pub fn parse(text: &str) -> NotePath {
        NotePath(
            text.split(PATH_SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .map(NoteId::from)
                .collect(),
        )
    }

    /// Extract the note path from a full URL's fragment, e.g.
    /// `"https://host/app#root/a/b"`. `Ok(None)` when the URL carries no
    /// fragment.
    pub fn from_url(url: &str) -> Result<Option<NotePath>, CanopyError> {
        let parsed = Url::parse(url)?;
        Ok(parsed
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(NotePath::parse))
    }

    /// The target note of this path, i.e. the final id.
    pub fn leaf(&self) -> Option<&NoteId> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteId> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_root(&self) -> bool {
        self.0.iter().any(|id| id.is_root())
    }

    /// A new path with `note_id` appended.
    pub fn child(&self, note_id: NoteId) -> NotePath {
        let mut ids = self.0.clone();
        ids.push(note_id);
        NotePath(ids)
    }

    /// Percent-encoded textual form, as used in the recent-notes endpoint
    /// path segment.
    pub fn encoded(&self) -> String {
        urlencoding::encode(&self.to_string()).into_owned()
    }

    /// True when this is the single-element path of the root sentinel.
    pub fn is_root_path(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_root()
    }
}

impl From<Vec<NoteId>> for NotePath {
    fn from(ids: Vec<NoteId>) -> NotePath {
        NotePath(ids)
    }
}

impl From<&str> for NotePath {
    fn from(text: &str) -> NotePath {
        NotePath::parse(text)
    }
}

impl Display for NotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for id in &self.0 {
            if !first {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}

impl IntoIterator for NotePath {
    type Item = NoteId;
    type IntoIter = std::vec::IntoIter<NoteId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NotePath {
    type Item = &'a NoteId;
    type IntoIter = std::slice::Iter<'a, NoteId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
