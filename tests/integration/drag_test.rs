//! Integration tests for drag and drop.

mod helpers;

use helpers::{TestLibrary, fid, ids_in, iid};
use vault_core::types::FolderFilter;
use vault_entity::drag::DragPayload;
use vault_entity::item::FileBlob;
use vault_service::{DragData, DropResult, DropZone};

async fn library() -> TestLibrary {
    TestLibrary::builder()
        .folder("x", "Inbox", None)
        .folder("y", "Sorted", None)
        .item("m1", "tiger.stl", "x")
        .item("m2", "lion.stl", "x")
        .item("m3", "bear.stl", "x")
        .build()
        .await
}

fn stl(name: &str) -> FileBlob {
    FileBlob::new(name, b"solid test".to_vec())
}

#[tokio::test]
async fn test_dragging_unselected_item_leaves_selection() {
    let t = library().await;
    let lib = &t.library;
    lib.toggle_selection(&iid("m1"));
    lib.toggle_selection(&iid("m2"));

    let data = lib.begin_item_drag(&iid("m3"));
    let zone = DropZone::Folder(fid("y"));
    assert_eq!(
        lib.drag_enter(&zone, &data),
        Some(DragPayload::ItemMove {
            item_ids: vec![iid("m3")]
        })
    );
    assert_eq!(lib.drop_target(), Some(fid("y")));

    let result = lib.drop(&zone, &data).await.expect("drop");
    assert!(matches!(result, DropResult::Moved(ref outcome) if outcome.is_confirmed()));

    assert_eq!(ids_in(lib, "y"), ["m3"]);
    assert_eq!(ids_in(lib, "x"), ["m1", "m2"]);
    assert_eq!(lib.selection(), vec![iid("m1"), iid("m2")]);
    assert_eq!(lib.drop_target(), None);

    let calls = t.store.calls_for("bulk_move_items");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ids, ["m3"]);
}

#[tokio::test]
async fn test_dragging_selected_item_moves_selection() {
    let t = library().await;
    let lib = &t.library;
    lib.toggle_selection(&iid("m1"));
    lib.toggle_selection(&iid("m2"));

    let data = lib.begin_item_drag(&iid("m2"));
    lib.drop(&DropZone::Folder(fid("y")), &data)
        .await
        .expect("drop");

    assert_eq!(ids_in(lib, "y"), ["m1", "m2"]);
    assert!(lib.selection().is_empty());
}

#[tokio::test]
async fn test_drop_on_current_folder_is_a_no_op() {
    let t = library().await;
    let data = t.library.begin_item_drag(&iid("m1"));

    let result = t
        .library
        .drop(&DropZone::Folder(fid("x")), &data)
        .await
        .expect("drop");
    assert!(matches!(result, DropResult::Ignored));
    assert_eq!(t.store.mutation_count(), 0);
}

#[tokio::test]
async fn test_item_drop_on_canvas_is_ignored() {
    let t = library().await;
    let data = t.library.begin_item_drag(&iid("m1"));
    assert!(t.library.drag_enter(&DropZone::Canvas, &data).is_some());
    assert!(!t.library.canvas_active());

    let result = t.library.drop(&DropZone::Canvas, &data).await.expect("drop");
    assert!(matches!(result, DropResult::Ignored));
    assert_eq!(t.store.mutation_count(), 0);
}

#[tokio::test]
async fn test_file_drop_on_folder_uploads_there() {
    let t = library().await;
    let lib = &t.library;
    let data = DragData::with_files(vec![stl("wolf.stl"), stl("fox.stl")]);

    let result = lib
        .drop(&DropZone::Folder(fid("y")), &data)
        .await
        .expect("drop");
    let DropResult::Uploaded(report) = result else {
        panic!("expected an upload");
    };
    assert!(report.is_complete());
    assert_eq!(report.uploaded.len(), 2);
    assert!(report.uploaded.iter().all(|item| item.folder_id == fid("y")));
    assert_eq!(t.calls("upload_item"), 2);
    assert_eq!(lib.uploads_in_flight(), 0);
    assert!(lib.pending_upload().is_none());
}

#[tokio::test]
async fn test_file_drop_on_root_canvas_asks_for_destination() {
    let t = library().await;
    let lib = &t.library;
    let data = DragData::with_files(vec![stl("wolf.stl")]);

    assert!(lib.drag_enter(&DropZone::Canvas, &data).is_some());
    assert!(lib.canvas_active());

    let result = lib.drop(&DropZone::Canvas, &data).await.expect("drop");
    let DropResult::AwaitingDestination(pending) = result else {
        panic!("expected a pending upload");
    };
    assert!(!lib.canvas_active());
    assert_eq!(pending.suggested_folder, Some(fid("x")));
    assert_eq!(t.calls("upload_item"), 0);

    lib.set_pending_upload_tags("animal, , animal, wild").expect("tags");
    let report = lib.confirm_upload(&fid("y")).await.expect("confirm");
    assert_eq!(report.uploaded.len(), 1);
    let item = &report.uploaded[0];
    assert_eq!(item.folder_id, fid("y"));
    assert!(item.has_tag("animal") && item.has_tag("wild"));
    assert_eq!(item.tags.len(), 2);
    assert!(lib.pending_upload().is_none());
}

#[tokio::test]
async fn test_file_drop_on_canvas_inside_folder_uploads_there() {
    let t = library().await;
    let lib = &t.library;
    lib.navigate(FolderFilter::Folder(fid("y"))).expect("navigate");

    let data = DragData::with_files(vec![stl("wolf.stl")]);
    let result = lib.drop(&DropZone::Canvas, &data).await.expect("drop");
    assert!(matches!(result, DropResult::Uploaded(_)));
    assert_eq!(lib.visible_items().len(), 1);
}

#[tokio::test]
async fn test_unrelated_drag_is_ignored() {
    let t = library().await;
    let data = DragData::new().set_data("text/plain", r#"{"itemIds":["m1"]}"#);

    assert!(t.library.drag_enter(&DropZone::Folder(fid("y")), &data).is_none());
    assert_eq!(t.library.drop_target(), None);
    let result = t
        .library
        .drop(&DropZone::Folder(fid("y")), &data)
        .await
        .expect("drop");
    assert!(matches!(result, DropResult::Ignored));
    assert_eq!(t.store.mutation_count(), 0);
}

#[tokio::test]
async fn test_leave_into_same_zone_keeps_highlight() {
    let t = library().await;
    let lib = &t.library;
    let data = lib.begin_item_drag(&iid("m1"));
    let zone = DropZone::Folder(fid("y"));

    lib.drag_enter(&zone, &data);
    lib.drag_leave(&zone, Some(&zone));
    assert_eq!(lib.drop_target(), Some(fid("y")));
    lib.drag_leave(&zone, None);
    assert_eq!(lib.drop_target(), None);
}
