//! Integration tests for bulk operations.

mod helpers;

use std::io::{Cursor, Read};

use helpers::{TestLibrary, fid, ids_in, iid};
use vault_core::types::FolderFilter;
use vault_service::{BulkTarget, PendingDelete};
use zip::ZipArchive;

async fn library() -> TestLibrary {
    TestLibrary::builder()
        .folder("a", "Armory", None)
        .folder("x", "Vehicles", None)
        .tagged_item("m1", "tank.stl", "a", &["armor"])
        .tagged_item("m2", "jeep.stl", "a", &["armor", "wheels"])
        .item("m3", "truck.stl", "a")
        .item("m4", "plane.stl", "a")
        .build()
        .await
}

fn select(t: &TestLibrary, ids: &[&str]) {
    for id in ids {
        t.library.toggle_selection(&iid(id));
    }
}

#[tokio::test]
async fn test_bulk_move_selection() {
    let t = library().await;
    select(&t, &["m1", "m2", "m3"]);

    let outcome = t.library.move_selection(&fid("x")).await.expect("move");
    assert!(outcome.is_confirmed());

    assert_eq!(ids_in(&t.library, "x"), ["m1", "m2", "m3"]);
    assert_eq!(ids_in(&t.library, "a"), ["m4"]);
    assert!(t.library.selection().is_empty());

    let calls = t.store.calls_for("bulk_move_items");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ids, ["m1", "m2", "m3"]);
    assert_eq!(t.store.mutation_count(), 1);

    let reopened = t.reopen().await;
    assert_eq!(ids_in(&reopened, "x"), ["m1", "m2", "m3"]);
}

#[tokio::test]
async fn test_bulk_move_rejects_unknown_destination() {
    let t = library().await;
    select(&t, &["m1"]);

    let err = t
        .library
        .move_selection(&fid("nowhere"))
        .await
        .expect_err("unknown folder");
    assert!(err.is_validation());
    assert_eq!(t.store.mutation_count(), 0);
    assert_eq!(t.library.selection(), vec![iid("m1")]);
}

#[tokio::test]
async fn test_bulk_action_without_selection() {
    let t = library().await;

    let err = t.library.move_selection(&fid("x")).await.expect_err("empty");
    assert!(err.is_validation());
    assert!(t.library.request_selection_delete().is_err());
    assert!(t.library.download_selection().await.is_err());
    assert_eq!(t.store.mutation_count(), 0);
}

#[tokio::test]
async fn test_bulk_tag_unions_tags() {
    let t = library().await;
    select(&t, &["m1", "m2", "m3"]);

    let outcome = t.library.tag_selection("armor, new").await.expect("tag");
    assert!(outcome.is_confirmed());
    assert!(t.library.selection().is_empty());

    for id in ["m1", "m2", "m3"] {
        let item = t.library.item(&iid(id)).expect("item");
        assert!(item.has_tag("armor"), "{id} keeps armor");
        assert!(item.has_tag("new"), "{id} gains new");
        assert_eq!(
            item.tags.iter().filter(|tag| tag.as_str() == "armor").count(),
            1
        );
    }
    assert!(t.library.item(&iid("m2")).expect("item").has_tag("wheels"));
    assert!(!t.library.item(&iid("m4")).expect("item").has_tag("new"));
    assert_eq!(t.calls("bulk_tag_items"), 1);
}

#[tokio::test]
async fn test_bulk_tag_keeps_commas_inside_tags() {
    let t = library().await;
    let tags = vec![
        "scale 1:35, resin".to_string(),
        " resin ".to_string(),
        "resin".to_string(),
        "  ".to_string(),
    ];

    let outcome = t
        .library
        .bulk()
        .tag_items(BulkTarget::Explicit(vec![iid("m4")]), &tags)
        .await
        .expect("tag");
    assert!(outcome.is_confirmed());

    let item = t.library.item(&iid("m4")).expect("item");
    let tags: Vec<&str> = item.tags.iter().map(String::as_str).collect();
    assert_eq!(tags, ["resin", "scale 1:35, resin"]);
}

#[tokio::test]
async fn test_bulk_delete_requires_confirmation() {
    let t = library().await;
    select(&t, &["m2", "m4"]);

    let pending = t.library.request_selection_delete().expect("request");
    assert_eq!(
        pending,
        PendingDelete::Items {
            ids: vec![iid("m2"), iid("m4")],
            from_selection: true,
        }
    );
    assert_eq!(t.store.mutation_count(), 0);
    assert_eq!(t.library.items().len(), 4);

    let outcome = t.library.confirm_delete().await.expect("confirm");
    assert!(outcome.is_confirmed());
    assert_eq!(t.library.items().len(), 2);
    assert!(t.library.selection().is_empty());
    assert_eq!(t.calls("bulk_delete_items"), 1);
    assert_eq!(t.store.items().await.len(), 2);

    let usage = t.library.usage();
    let expected: u64 = t.library.items().iter().map(|i| i.size).sum();
    assert_eq!(usage.used, expected);
}

#[tokio::test]
async fn test_single_delete_closes_detail_view() {
    let t = library().await;
    t.library.open_item(&iid("m3")).expect("open");

    t.library.request_item_delete(&iid("m3")).expect("request");
    let outcome = t.library.confirm_delete().await.expect("confirm");
    assert!(outcome.is_confirmed());

    assert!(t.library.item(&iid("m3")).is_none());
    assert!(t.library.opened_item().is_none());
    assert_eq!(t.calls("delete_item"), 1);
}

#[tokio::test]
async fn test_confirm_without_request() {
    let t = library().await;
    let err = t.library.confirm_delete().await.expect_err("nothing pending");
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_download_selection_to_disk() {
    let t = library().await;
    t.library
        .navigate(FolderFilter::Folder(fid("a")))
        .expect("navigate");
    select(&t, &["m1", "m3"]);

    let archive = t.library.download_selection().await.expect("download");
    assert!(!archive.is_partial());
    assert_eq!(archive.entries.len(), 2);
    assert!(t.library.selection().is_empty());
    assert_eq!(t.store.mutation_count(), 0);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = archive.save_to(dir.path()).await.expect("save");
    assert!(path.starts_with(dir.path()));

    let bytes = std::fs::read(&path).expect("read archive");
    let mut zip = ZipArchive::new(Cursor::new(bytes)).expect("zip");
    let mut body = String::new();
    zip.by_name("tank.stl")
        .expect("tank entry")
        .read_to_string(&mut body)
        .expect("read entry");
    assert_eq!(body, "solid m1");
}

#[tokio::test]
async fn test_partial_download_reports_failures() {
    let t = library().await;
    select(&t, &["m1", "m2"]);
    t.store.fail_operation("download_item");
    let mut notices = t.library.subscribe();

    let archive = t.library.download_selection().await.expect("download");
    assert!(archive.is_partial());
    assert!(archive.entries.is_empty());
    assert_eq!(archive.failures.len(), 2);

    let notice = notices.try_recv().expect("warning notice");
    assert!(!notice.is_error());
    assert_eq!(notice.operation, "bulk_download");
}
