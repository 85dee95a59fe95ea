//! Path resolution and repair against the live edge set.
//!
//! Paths embedded in bookmarks, links, and address-bar fragments go stale
//! because the DAG is mutable: notes move, branches get deleted server-side.
//! Rather than failing hard, [resolve_run_path] degrades gracefully to *any*
//! currently-valid path to the same target note, trading path stability for
//! availability. This is best-effort reachability repair, not strict path
//! validation.
use crate::{cache::TreeCache, error::CanopyError, paths::NotePath, properties::NoteId};

/// Resolve a textual path to a sequence of note ids, root to target, that
/// consists only of edges currently known to the cache.
///
/// The walk is leaf-driven: the input is reversed, the root sentinel is
/// appended if absent, and each hop from an accepted child to a candidate
/// parent is checked against the child's actual parent set. When the
/// candidate parent is no longer among them, the walk repairs by splicing in
/// [find_any_path] of the *first* actual parent and terminating early; the
/// repaired prefix replaces everything from the failed hop to root.
///
/// Valid input paths come back unchanged (apart from gaining a root prefix
/// when the input lacked one).
pub fn resolve_run_path(note_path: &NotePath, cache: &TreeCache) -> Result<NotePath, CanopyError> {
    let mut path: Vec<NoteId> = note_path.iter().rev().cloned().collect();
    if !path.iter().any(|id| id.is_root()) {
        path.push(NoteId::root());
    }

    let mut effective: Vec<NoteId> = Vec::new();
    let mut child: Option<NoteId> = None;

    for parent_id in path {
        if let Some(child_id) = &child {
            let parents = cache.parent_note_ids(child_id).ok_or_else(|| {
                CanopyError::MissingParents(child_id.to_string())
            })?;

            if !parents.contains(&parent_id) {
                tracing::debug!(
                    "Did not find parent '{}' for child '{}', available parents: {:?}",
                    parent_id,
                    child_id,
                    parents
                );

                let first = parents.first().cloned().ok_or_else(|| {
                    CanopyError::Unreachable(child_id.to_string())
                })?;
                // Empty when the first parent is the root itself.
                let repaired = find_any_path(&first, cache)?;
                for id in repaired.iter().rev() {
                    effective.push(id.clone());
                }
                effective.push(NoteId::root());
                break;
            }
        }

        effective.push(parent_id.clone());
        child = Some(parent_id);
    }

    effective.reverse();
    Ok(NotePath::from(effective))
}

/// Compute some currently-valid path reaching `note_id`, by repeatedly
/// following the *first* parent from each note's current parent set until
/// the root sentinel is reached. The result starts at the first note below
/// root (display convention: no leading `root/`) and ends with `note_id`.
///
/// Deterministic only insofar as the cache's parent ordering is; see
/// [TreeCache::parent_note_ids] for the ordering contract. Termination rests
/// on the acyclicity the cache validates at snapshot load.
pub fn find_any_path(note_id: &NoteId, cache: &TreeCache) -> Result<NotePath, CanopyError> {
    let mut path: Vec<NoteId> = Vec::new();
    let mut cur = note_id.clone();

    while !cur.is_root() {
        path.push(cur.clone());

        let parents = cache
            .parent_note_ids(&cur)
            .ok_or_else(|| CanopyError::MissingParents(cur.to_string()))?;

        cur = parents
            .first()
            .cloned()
            .ok_or_else(|| CanopyError::Orphan(cur.to_string()))?;
    }

    path.reverse();
    Ok(NotePath::from(path))
}
