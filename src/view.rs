//! [TreeView] models the displayed widget state: one visual node per
//! (note, parent) edge, so a cloned note shows up once under each of its
//! parents. Visual nodes are projections of [Branch] edges: the set of
//! visual nodes for a note changes only when branch edges are added or
//! removed.
//!
//! Child lists are materialized lazily, mirroring a lazy-loading widget:
//! `children == None` means the subtree has not been built yet, and
//! expansion materializes it from the cache on demand. The rendering,
//! scrolling and focus handling of a real widget live outside this crate;
//! this structure is the state those widgets diff against.
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

use crate::{
    cache::TreeCache,
    properties::{display_title, Branch, BranchId, Note, NoteId},
};

/// Identity of one visual node. Stable for the lifetime of a view build;
/// reload allocates fresh ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VisualNodeId(u64);

impl Display for VisualNodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "vn{}", self.0)
    }
}

/// One on-screen representation of a single edge.
#[derive(Debug, Clone)]
pub struct VisualNode {
    pub id: VisualNodeId,
    pub note_id: NoteId,
    /// `None` only for the synthetic root node.
    pub parent_note_id: Option<NoteId>,
    /// `None` only for the synthetic root node; the sentinel has no branch.
    pub branch_id: Option<BranchId>,
    /// Rendered display title (prefix applied, HTML-escaped).
    pub title: String,
    pub is_protected: bool,
    pub expanded: bool,
    /// Whether the node is presented as expandable.
    pub folder: bool,
    /// `None` until the child list is materialized (lazy subtree).
    children: Option<Vec<VisualNodeId>>,
    parent: Option<VisualNodeId>,
}

impl VisualNode {
    pub fn children(&self) -> Option<&[VisualNodeId]> {
        self.children.as_deref()
    }

    pub fn parent(&self) -> Option<VisualNodeId> {
        self.parent
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeView {
    nodes: BTreeMap<VisualNodeId, VisualNode>,
    /// Index from note id to every visual node currently displaying it.
    by_note: BTreeMap<NoteId, Vec<VisualNodeId>>,
    root: Option<VisualNodeId>,
    active: Option<VisualNodeId>,
    selected: BTreeSet<VisualNodeId>,
    next_id: u64,
}

impl TreeView {
    /// Rebuild the whole view from the cache, preserving expansion state for
    /// branches that survived and re-activating the previously active edge
    /// when it still exists. Scroll/focus preservation is the widget's job,
    /// not this structure's.
    pub fn reload(&mut self, cache: &TreeCache) {
        let kept_expanded: BTreeSet<BranchId> = self
            .nodes
            .values()
            .filter(|node| node.expanded)
            .filter_map(|node| node.branch_id.clone())
            .collect();
        let active_edge = self
            .active
            .and_then(|id| self.nodes.get(&id))
            .map(|node| (node.note_id.clone(), node.parent_note_id.clone()));

        self.nodes.clear();
        self.by_note.clear();
        self.selected.clear();
        self.active = None;

        // The root sentinel is synthesized; it has no entity and cannot be
        // collapsed.
        let root_id = self.alloc(
            NoteId::root(),
            None,
            None,
            String::new(),
            false,
            true,
            true,
            None,
        );
        self.root = Some(root_id);

        let mut stack = vec![root_id];
        while let Some(node_id) = stack.pop() {
            for child_id in self.materialize_children(node_id, cache) {
                let expand = self
                    .nodes
                    .get(&child_id)
                    .map(|child| {
                        child.expanded
                            || child
                                .branch_id
                                .as_ref()
                                .map(|bid| kept_expanded.contains(bid))
                                .unwrap_or(false)
                    })
                    .unwrap_or(false);
                if expand {
                    if let Some(child) = self.nodes.get_mut(&child_id) {
                        child.expanded = true;
                    }
                    stack.push(child_id);
                }
            }
        }

        if let Some((note_id, parent)) = active_edge {
            if let Some(id) = self.find_child_node(&note_id, parent.as_ref()) {
                self.activate(id);
            }
        }
    }

    /// Materialize the child list of `node_id` from the cache (on-demand
    /// subtree loading). Idempotent: an already-materialized list is
    /// returned as-is.
    pub fn ensure_children(&mut self, node_id: VisualNodeId, cache: &TreeCache) -> Vec<VisualNodeId> {
        self.materialize_children(node_id, cache)
    }

    fn materialize_children(
        &mut self,
        node_id: VisualNodeId,
        cache: &TreeCache,
    ) -> Vec<VisualNodeId> {
        let note_id = match self.nodes.get(&node_id) {
            Some(node) => {
                if let Some(existing) = &node.children {
                    return existing.clone();
                }
                node.note_id.clone()
            }
            None => return Vec::new(),
        };

        let mut child_ids = Vec::new();
        let mut seen = BTreeSet::new();
        for branch in cache
            .child_branches(&note_id)
            .into_iter()
            .cloned()
            .collect::<Vec<Branch>>()
        {
            // One visual node per distinct (note, parent) edge.
            if !seen.insert(branch.note_id.clone()) {
                continue;
            }
            let Some(note) = cache.note(&branch.note_id) else {
                tracing::warn!(
                    "Branch {} references unknown note {}",
                    branch.branch_id,
                    branch.note_id
                );
                continue;
            };
            let title = display_title(&note.title, branch.prefix.as_deref());
            let folder = cache.has_children(&branch.note_id);
            let child_id = self.alloc(
                branch.note_id.clone(),
                Some(note_id.clone()),
                Some(branch.branch_id.clone()),
                title,
                note.is_protected,
                branch.is_expanded,
                folder,
                Some(node_id),
            );
            child_ids.push(child_id);
        }

        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.children = Some(child_ids.clone());
            if !child_ids.is_empty() {
                node.folder = true;
            }
        }
        child_ids
    }

    #[allow(clippy::too_many_arguments)]
    fn alloc(
        &mut self,
        note_id: NoteId,
        parent_note_id: Option<NoteId>,
        branch_id: Option<BranchId>,
        title: String,
        is_protected: bool,
        expanded: bool,
        folder: bool,
        parent: Option<VisualNodeId>,
    ) -> VisualNodeId {
        let id = VisualNodeId(self.next_id);
        self.next_id += 1;
        self.by_note.entry(note_id.clone()).or_default().push(id);
        self.nodes.insert(
            id,
            VisualNode {
                id,
                note_id,
                parent_note_id,
                branch_id,
                title,
                is_protected,
                expanded,
                folder,
                children: None,
                parent,
            },
        );
        id
    }

    pub fn node(&self, id: VisualNodeId) -> Option<&VisualNode> {
        self.nodes.get(&id)
    }

    pub fn root(&self) -> Option<VisualNodeId> {
        self.root
    }

    pub fn active(&self) -> Option<VisualNodeId> {
        self.active
    }

    /// All visual nodes currently displaying `note_id` (one per clone).
    pub fn nodes_by_note(&self, note_id: &NoteId) -> Vec<VisualNodeId> {
        self.by_note.get(note_id).cloned().unwrap_or_default()
    }

    pub fn nodes_by_branch(&self, branch_id: &BranchId) -> Vec<VisualNodeId> {
        self.nodes
            .values()
            .filter(|node| node.branch_id.as_ref() == Some(branch_id))
            .map(|node| node.id)
            .collect()
    }

    /// The visual node showing `note_id` under the given displayed parent.
    /// `parent == None` matches only the synthetic root.
    pub fn find_child_node(
        &self,
        note_id: &NoteId,
        parent: Option<&NoteId>,
    ) -> Option<VisualNodeId> {
        self.by_note.get(note_id).and_then(|ids| {
            ids.iter()
                .find(|id| {
                    self.nodes
                        .get(id)
                        .map(|node| node.parent_note_id.as_ref() == parent)
                        .unwrap_or(false)
                })
                .copied()
        })
    }

    /// Expand or collapse a node. Expansion materializes the child list when
    /// the subtree has not been loaded yet.
    pub fn set_expanded(&mut self, node_id: VisualNodeId, expanded: bool, cache: &TreeCache) {
        if expanded {
            self.materialize_children(node_id, cache);
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            if node.parent.is_none() {
                // root can't be collapsed
                node.expanded = true;
                return;
            }
            node.expanded = expanded;
        }
    }

    /// Mark `node_id` as the single active node and reduce the selection to
    /// it.
    pub fn activate(&mut self, node_id: VisualNodeId) -> bool {
        if !self.nodes.contains_key(&node_id) {
            return false;
        }
        self.active = Some(node_id);
        self.clear_selected();
        true
    }

    /// Drop all selection marks except the active node's.
    pub fn clear_selected(&mut self) {
        self.selected.clear();
        if let Some(active) = self.active {
            self.selected.insert(active);
        }
    }

    pub fn set_selected(&mut self, node_id: VisualNodeId, selected: bool) {
        if selected {
            if self.nodes.contains_key(&node_id) {
                self.selected.insert(node_id);
            }
        } else {
            self.selected.remove(&node_id);
        }
    }

    pub fn selected_nodes(&self) -> Vec<VisualNodeId> {
        self.selected.iter().copied().collect()
    }

    /// Collapse every node except the root.
    pub fn collapse_all(&mut self) {
        let root = self.root;
        for node in self.nodes.values_mut() {
            if Some(node.id) != root {
                node.expanded = false;
            }
        }
    }

    /// Derive the textual path of a visual node by walking its displayed
    /// ancestor chain. The chain is already materialized and trusted, so no
    /// DAG validation happens here; the result starts with the root sentinel.
    pub fn note_path(&self, node_id: VisualNodeId) -> Option<crate::paths::NotePath> {
        let mut ids = Vec::new();
        let mut cursor = Some(node_id);
        while let Some(id) = cursor {
            let node = self.nodes.get(&id)?;
            ids.push(node.note_id.clone());
            cursor = node.parent;
        }
        ids.reverse();
        Some(crate::paths::NotePath::from(ids))
    }

    /// Optimistic insert of a freshly created note directly after `anchor`
    /// in its parent's child list. The anchor's own child count is
    /// untouched.
    pub fn insert_sibling_after(
        &mut self,
        anchor: VisualNodeId,
        note: &Note,
        branch: &Branch,
    ) -> Option<VisualNodeId> {
        let (parent_id, parent_note_id) = {
            let anchor_node = self.nodes.get(&anchor)?;
            (anchor_node.parent?, anchor_node.parent_note_id.clone()?)
        };
        let title = display_title(&note.title, branch.prefix.as_deref());
        let new_id = self.alloc(
            note.note_id.clone(),
            Some(parent_note_id),
            Some(branch.branch_id.clone()),
            title,
            note.is_protected,
            false,
            false,
            Some(parent_id),
        );
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            if let Some(children) = parent.children.as_mut() {
                let pos = children
                    .iter()
                    .position(|id| *id == anchor)
                    .map(|idx| idx + 1)
                    .unwrap_or(children.len());
                children.insert(pos, new_id);
            } else {
                parent.children = Some(vec![new_id]);
            }
        }
        Some(new_id)
    }

    /// Optimistic insert of a freshly created note as a child of `parent_id`,
    /// converting a childless collapsed node into an expanded folder. The
    /// branch must already be in the cache.
    pub fn insert_child(
        &mut self,
        parent_id: VisualNodeId,
        note: &Note,
        branch: &Branch,
        cache: &TreeCache,
    ) -> Option<VisualNodeId> {
        let (materialized, parent_note_id) = {
            let parent = self.nodes.get(&parent_id)?;
            (parent.children.is_some(), parent.note_id.clone())
        };
        if !materialized {
            // Lazy subtree: materializing pulls the new branch from the cache.
            self.materialize_children(parent_id, cache);
        } else {
            let title = display_title(&note.title, branch.prefix.as_deref());
            let new_id = self.alloc(
                note.note_id.clone(),
                Some(parent_note_id.clone()),
                Some(branch.branch_id.clone()),
                title,
                note.is_protected,
                false,
                false,
                Some(parent_id),
            );
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                if let Some(children) = parent.children.as_mut() {
                    children.push(new_id);
                }
            }
        }
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.folder = true;
            parent.expanded = true;
        }
        self.find_child_node(&note.note_id, Some(&parent_note_id))
    }

    /// Re-render the display title on every clone of `note_id` from the
    /// current cache state.
    pub fn render_titles(&mut self, note_id: &NoteId, cache: &TreeCache) {
        let Some(note) = cache.note(note_id) else {
            return;
        };
        for id in self.nodes_by_note(note_id) {
            let prefix = self
                .nodes
                .get(&id)
                .and_then(|node| node.branch_id.clone())
                .and_then(|bid| cache.branch(&bid).and_then(|branch| branch.prefix.clone()));
            if let Some(node) = self.nodes.get_mut(&id) {
                node.title = display_title(&note.title, prefix.as_deref());
            }
        }
    }

    /// Flip the protection flag on every clone of `note_id`.
    pub fn set_protected(&mut self, note_id: &NoteId, is_protected: bool) {
        for id in self.nodes_by_note(note_id) {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.is_protected = is_protected;
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
