//! End-to-end navigation over the public API: load a tree, follow server
//! pushes off the wire, repair a stale address-bar path and create a note.

mod common;

use common::{branch, init_logging, note, snapshot, RecordingTransport};
use test_log::test;

use canopy_core::{
    config::TreeConfig,
    controller::TreeController,
    event::{NavigationRequest, NavigationResult, TreeMessage},
    paths::NotePath,
    properties::NoteId,
    transport::TreeSnapshot,
};

/// root -> projects -> rust -> canopy, root -> archive.
fn project_snapshot() -> TreeSnapshot {
    let mut snap = snapshot(
        vec![
            note("projects", "Projects"),
            note("rust", "Rust"),
            note("canopy", "Canopy"),
            note("archive", "Archive"),
        ],
        vec![
            branch("bProjects", "projects", "root"),
            branch("bRust", "rust", "projects"),
            branch("bCanopy", "canopy", "rust"),
            branch("bArchive", "archive", "root"),
        ],
    );
    snap.start_note_path = Some("root/projects/rust/canopy".to_string());
    snap
}

fn fragments(results: &[NavigationResult]) -> Vec<String> {
    results
        .iter()
        .filter_map(|result| match result {
            NavigationResult::Fragment(path) => Some(path.to_string()),
            _ => None,
        })
        .collect()
}

#[test(tokio::test)]
async fn test_navigation_session() {
    init_logging();
    let transport = RecordingTransport::new(project_snapshot());
    let (controller, mut nav_rx) =
        TreeController::new(transport.clone(), TreeConfig::default());

    // Initial load lands on the server's start path.
    controller
        .load(NavigationRequest::Load { fragment: None })
        .await
        .unwrap();
    let results: Vec<NavigationResult> = {
        let mut out = Vec::new();
        while let Ok(result) = nav_rx.try_recv() {
            out.push(result);
        }
        out
    };
    assert_eq!(fragments(&results), vec!["root/projects/rust/canopy"]);
    assert_eq!(transport.call_count("load_tree"), 1);

    // The server grows a sibling and pushes a sync batch over the wire.
    {
        let mut held = transport.snapshot.lock();
        held.notes.push(note("tokio", "Tokio"));
        held.branches.push(branch("bTokio", "tokio", "rust"));
    }
    let message: TreeMessage = serde_json::from_str(
        r#"{"type": "sync", "data": [
            {"entityName": "notes", "entityId": "tokio"},
            {"entityName": "branches", "entityId": "bTokio"}
        ]}"#,
    )
    .unwrap();
    controller.handle_message(message).await.unwrap();
    assert_eq!(transport.call_count("load_tree"), 2);

    // The reload kept the active note and the new sibling is visible.
    assert_eq!(
        controller.current_note_path().unwrap().to_string(),
        "root/projects/rust/canopy"
    );
    {
        let view = controller.view();
        let view = view.read();
        assert!(view
            .find_child_node(&NoteId::from("tokio"), Some(&NoteId::from("rust")))
            .is_some());
    }

    // An attribute-only sync batch leaves the tree alone.
    let message: TreeMessage = serde_json::from_str(
        r#"{"type": "sync", "data": [{"entityName": "relations", "entityId": "r1"}]}"#,
    )
    .unwrap();
    controller.handle_message(message).await.unwrap();
    assert_eq!(transport.call_count("load_tree"), 2);

    // A stale bookmark claims canopy sits directly under projects; the
    // resolver splices the real placement back in.
    controller
        .load(NavigationRequest::FragmentChanged(NotePath::parse(
            "root/projects/canopy",
        )))
        .await
        .unwrap();
    let results: Vec<NavigationResult> = {
        let mut out = Vec::new();
        while let Ok(result) = nav_rx.try_recv() {
            out.push(result);
        }
        out
    };
    assert_eq!(fragments(&results), vec!["root/projects/rust/canopy"]);

    // Creating a child of the active note activates it and reports it as new.
    let active = controller.view().read().active().unwrap();
    controller.create_note(active, "into", false).await.unwrap();
    let results: Vec<NavigationResult> = {
        let mut out = Vec::new();
        while let Ok(result) = nav_rx.try_recv() {
            out.push(result);
        }
        out
    };
    assert_eq!(
        fragments(&results),
        vec!["root/projects/rust/canopy/new1"]
    );
    assert!(results
        .iter()
        .any(|result| matches!(result, NavigationResult::NewNoteCreated(_))));
}
