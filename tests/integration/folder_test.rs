//! Integration tests for folder management.

mod helpers;

use helpers::{TestLibrary, fid};
use vault_core::types::FolderFilter;
use vault_service::PendingDelete;

#[tokio::test]
async fn test_nested_folder_delete_ordering() {
    let t = TestLibrary::builder().build().await;
    let lib = &t.library;

    let vehicles = lib
        .create_folder("Vehicles", None)
        .await
        .expect("create")
        .folder()
        .cloned()
        .expect("vehicles confirmed");
    assert!(vehicles.parent_id.is_none());
    assert!(!vehicles.is_pending());

    let tanks = lib
        .create_folder("Tanks", Some(vehicles.id.clone()))
        .await
        .expect("create")
        .folder()
        .cloned()
        .expect("tanks confirmed");
    assert_eq!(tanks.parent_id.as_ref(), Some(&vehicles.id));

    let before = t.store.mutation_count();
    let err = lib
        .request_folder_delete(&vehicles.id)
        .expect_err("non-empty folder");
    assert!(err.is_validation());
    assert!(err.message.contains("Folder must be empty"));
    assert_eq!(t.store.mutation_count(), before);
    assert!(lib.pending_delete().is_none());

    lib.request_folder_delete(&tanks.id).expect("tanks is empty");
    assert!(lib.confirm_delete().await.expect("confirm").is_confirmed());
    assert!(lib.folder(&tanks.id).is_none());

    lib.request_folder_delete(&vehicles.id)
        .expect("vehicles is now empty");
    assert!(lib.confirm_delete().await.expect("confirm").is_confirmed());
    assert!(lib.folders().is_empty());
    assert!(t.store.folders().await.is_empty());
    assert_eq!(t.calls("delete_folder"), 2);
}

#[tokio::test]
async fn test_folder_with_items_is_not_deleted() {
    let t = TestLibrary::builder()
        .folder("f1", "Props", None)
        .item("m1", "crate.stl", "f1")
        .build()
        .await;

    let err = t
        .library
        .request_folder_delete(&fid("f1"))
        .expect_err("folder holds a model");
    assert!(err.is_validation());
    assert_eq!(t.store.mutation_count(), 0);
    assert!(t.library.folder(&fid("f1")).is_some());
}

#[tokio::test]
async fn test_cancelled_folder_delete_touches_nothing() {
    let t = TestLibrary::builder()
        .folder("f1", "Empty", None)
        .build()
        .await;

    let pending = t.library.request_folder_delete(&fid("f1")).expect("request");
    assert_eq!(pending, PendingDelete::Folder(fid("f1")));
    assert_eq!(t.library.cancel_delete(), Some(pending));
    assert_eq!(t.store.mutation_count(), 0);
    assert!(t.library.folder(&fid("f1")).is_some());
}

#[tokio::test]
async fn test_deleting_active_folder_returns_to_root() {
    let t = TestLibrary::builder()
        .folder("f1", "Scratch", None)
        .build()
        .await;
    let lib = &t.library;

    lib.navigate(FolderFilter::Folder(fid("f1"))).expect("navigate");
    lib.request_folder_delete(&fid("f1")).expect("request");
    lib.confirm_delete().await.expect("confirm");

    assert_eq!(lib.navigation(), FolderFilter::All);
}

#[tokio::test]
async fn test_tree_breadcrumbs_and_rename() {
    let t = TestLibrary::builder()
        .folder("root", "Vehicles", None)
        .folder("mid", "Tanks", Some("root"))
        .folder("leaf", "Heavy", Some("mid"))
        .folder("other", "Animals", None)
        .item("m1", "tiger.stl", "leaf")
        .build()
        .await;
    let lib = &t.library;

    let tree = lib.folder_tree();
    let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Animals", "Vehicles"]);
    assert_eq!(tree[1].children[0].children[0].item_count, 1);

    lib.navigate(FolderFilter::Folder(fid("leaf"))).expect("navigate");
    let crumbs: Vec<String> = lib.breadcrumbs().into_iter().map(|f| f.name).collect();
    assert_eq!(crumbs, ["Vehicles", "Tanks", "Heavy"]);
    assert_eq!(lib.expansion_path(&fid("leaf")), vec![fid("root"), fid("mid")]);

    let outcome = lib.rename_folder(&fid("mid"), "  Armor  ").await.expect("rename");
    assert!(outcome.is_confirmed());
    assert_eq!(lib.folder(&fid("mid")).map(|f| f.name).as_deref(), Some("Armor"));
}

#[tokio::test]
async fn test_navigate_to_unknown_folder() {
    let t = TestLibrary::builder().build().await;
    let err = t
        .library
        .navigate(FolderFilter::Folder(fid("ghost")))
        .expect_err("unknown folder");
    assert_eq!(err.kind, vault_core::error::ErrorKind::NotFound);
}
