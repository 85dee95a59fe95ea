//! [TreeCache] is the local entity cache: [Note] and [Branch] records keyed
//! by id, plus an explicit adjacency map over branch edges. The server is the
//! source of truth; the cache is rebuilt wholesale from snapshots and patched
//! in place by optimistic mutations.
//!
//! Edges are independent [Branch] records, not owned child pointers: the
//! same note may appear under many parents (clones), so the structure is a
//! DAG queried through the adjacency maps rather than a tree of owned
//! children.
use std::collections::BTreeMap;

use petgraph::{algo::is_cyclic_directed, Graph};

use crate::{
    error::CanopyError,
    properties::{Branch, BranchId, Note, NoteId},
    transport::TreeSnapshot,
};

#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    notes: BTreeMap<NoteId, Note>,
    branches: BTreeMap<BranchId, Branch>,
    /// child note -> incoming branch ids, in insertion order. This ordering
    /// is the crate's "first parent" contract: snapshot order first, then
    /// optimistic [TreeCache::add]s, and the path-repair tie-break depends
    /// on it being stable.
    parents: BTreeMap<NoteId, Vec<BranchId>>,
    /// parent note -> outgoing branch ids, in insertion order.
    children: BTreeMap<NoteId, Vec<BranchId>>,
}

impl TreeCache {
    /// Rebuild the cache from a full server snapshot. Fails with
    /// [CanopyError::Cache] when the branch edges contain a cycle, since the
    /// leaf-to-root walks in path resolution terminate only on acyclic
    /// structures.
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Result<TreeCache, CanopyError> {
        let mut cache = TreeCache::default();
        for note in &snapshot.notes {
            cache.notes.insert(note.note_id.clone(), note.clone());
        }
        for branch in &snapshot.branches {
            cache.insert_branch(branch.clone());
        }
        cache.validate_acyclic()?;
        Ok(cache)
    }

    fn insert_branch(&mut self, branch: Branch) {
        if self.branches.contains_key(&branch.branch_id) {
            // Entity refresh for a known edge; adjacency is unchanged.
            self.branches.insert(branch.branch_id.clone(), branch);
            return;
        }
        let duplicate_edge = self
            .parents
            .get(&branch.note_id)
            .map(|bids| {
                bids.iter()
                    .filter_map(|bid| self.branches.get(bid))
                    .any(|existing| existing.parent_note_id == branch.parent_note_id)
            })
            .unwrap_or(false);
        if duplicate_edge {
            tracing::warn!(
                "Ignoring duplicate edge {} -> {} (branch {})",
                branch.parent_note_id,
                branch.note_id,
                branch.branch_id
            );
            return;
        }
        self.parents
            .entry(branch.note_id.clone())
            .or_default()
            .push(branch.branch_id.clone());
        self.children
            .entry(branch.parent_note_id.clone())
            .or_default()
            .push(branch.branch_id.clone());
        self.branches.insert(branch.branch_id.clone(), branch);
    }

    fn validate_acyclic(&self) -> Result<(), CanopyError> {
        let mut graph = Graph::<(), ()>::new();
        let mut indices = BTreeMap::new();
        for branch in self.branches.values() {
            let parent_idx = *indices
                .entry(branch.parent_note_id.clone())
                .or_insert_with(|| graph.add_node(()));
            let child_idx = *indices
                .entry(branch.note_id.clone())
                .or_insert_with(|| graph.add_node(()));
            graph.add_edge(parent_idx, child_idx, ());
        }
        if is_cyclic_directed(&graph) {
            return Err(CanopyError::Cache(
                "branch edges contain a cycle; refusing to build tree cache".to_string(),
            ));
        }
        Ok(())
    }

    pub fn note(&self, note_id: &NoteId) -> Option<&Note> {
        self.notes.get(note_id)
    }

    pub fn note_mut(&mut self, note_id: &NoteId) -> Option<&mut Note> {
        self.notes.get_mut(note_id)
    }

    pub fn branch(&self, branch_id: &BranchId) -> Option<&Branch> {
        self.branches.get(branch_id)
    }

    pub fn branch_mut(&mut self, branch_id: &BranchId) -> Option<&mut Branch> {
        self.branches.get_mut(branch_id)
    }

    pub fn contains_note(&self, note_id: &NoteId) -> bool {
        self.notes.contains_key(note_id)
    }

    /// Current parent set of `child`, in first-parent order (see the field
    /// docs on `parents`). Returns `None` when the cache has no record of the
    /// note at all, which callers treat as corruption; a known note with no
    /// incoming edges yields `Some` of an empty list.
    pub fn parent_note_ids(&self, child: &NoteId) -> Option<Vec<NoteId>> {
        if !self.notes.contains_key(child) {
            return None;
        }
        Some(
            self.parents
                .get(child)
                .map(|bids| {
                    bids.iter()
                        .filter_map(|bid| self.branches.get(bid))
                        .map(|branch| branch.parent_note_id.clone())
                        .collect()
                })
                .unwrap_or_default(),
        )
    }

    /// Outgoing edges of `parent`, in insertion order.
    pub fn child_branches(&self, parent: &NoteId) -> Vec<&Branch> {
        self.children
            .get(parent)
            .map(|bids| bids.iter().filter_map(|bid| self.branches.get(bid)).collect())
            .unwrap_or_default()
    }

    pub fn has_children(&self, parent: &NoteId) -> bool {
        self.children
            .get(parent)
            .map(|bids| !bids.is_empty())
            .unwrap_or(false)
    }

    /// The branch realizing the edge `parent -> note`, if one exists.
    pub fn branch_for_edge(&self, note: &NoteId, parent: &NoteId) -> Option<&Branch> {
        self.parents.get(note).and_then(|bids| {
            bids.iter()
                .filter_map(|bid| self.branches.get(bid))
                .find(|branch| &branch.parent_note_id == parent)
        })
    }

    /// All branch ids currently displaying `note` (one per clone).
    pub fn branches_for_note(&self, note: &NoteId) -> Vec<&Branch> {
        self.parents
            .get(note)
            .map(|bids| bids.iter().filter_map(|bid| self.branches.get(bid)).collect())
            .unwrap_or_default()
    }

    /// Optimistic insert after a successful server-side create. The branch is
    /// appended last, so it never displaces an existing first parent.
    pub fn add(&mut self, note: Note, branch: Branch) {
        self.notes.insert(note.note_id.clone(), note);
        self.insert_branch(branch);
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }
}
