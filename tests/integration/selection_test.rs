//! Integration tests for selection and navigation.

mod helpers;

use helpers::{TestLibrary, fid, iid};
use vault_core::types::FolderFilter;
use vault_service::{ItemQuery, ItemSort};

async fn library() -> TestLibrary {
    TestLibrary::builder()
        .folder("a", "Animals", None)
        .folder("b", "Buildings", None)
        .item("m1", "tiger.stl", "a")
        .item("m2", "lion.stl", "a")
        .item("m3", "tower.3mf", "b")
        .build()
        .await
}

#[tokio::test]
async fn test_select_all_twice_clears() {
    let t = library().await;
    let lib = &t.library;
    lib.navigate(FolderFilter::Folder(fid("a"))).expect("navigate");

    lib.select_all();
    assert_eq!(lib.selection(), vec![iid("m1"), iid("m2")]);

    lib.select_all();
    assert!(lib.selection().is_empty());
}

#[tokio::test]
async fn test_select_all_replaces_partial_selection() {
    let t = library().await;
    let lib = &t.library;

    assert!(lib.toggle_selection(&iid("m3")));
    lib.select_all();
    assert_eq!(lib.selection().len(), 3);
}

#[tokio::test]
async fn test_navigation_clears_selection() {
    let t = library().await;
    let lib = &t.library;

    lib.toggle_selection(&iid("m1"));
    lib.toggle_selection(&iid("m3"));
    lib.navigate(FolderFilter::Folder(fid("b"))).expect("navigate");
    assert!(lib.selection().is_empty());

    lib.toggle_selection(&iid("m3"));
    lib.navigate(FolderFilter::Folder(fid("b"))).expect("same folder");
    assert!(lib.selection().is_empty());
}

#[tokio::test]
async fn test_toggle_is_symmetric() {
    let t = library().await;
    let lib = &t.library;

    assert!(lib.toggle_selection(&iid("m2")));
    assert!(!lib.toggle_selection(&iid("m2")));
    assert!(lib.selection().is_empty());
}

#[tokio::test]
async fn test_visible_items_follow_navigation() {
    let t = library().await;
    let lib = &t.library;

    let all: Vec<String> = lib.visible_items().into_iter().map(|i| i.name).collect();
    assert_eq!(all, ["tower.3mf", "lion.stl", "tiger.stl"]);
    assert!(lib.visible_subfolders().is_empty());

    lib.navigate(FolderFilter::Folder(fid("b"))).expect("navigate");
    let names: Vec<String> = lib.visible_items().into_iter().map(|i| i.name).collect();
    assert_eq!(names, ["tower.3mf"]);
}

#[tokio::test]
async fn test_open_item_detail_view() {
    let t = library().await;
    let lib = &t.library;

    let item = lib.open_item(&iid("m2")).expect("open");
    assert_eq!(item.name, "lion.stl");
    assert_eq!(lib.opened_item().map(|i| i.id), Some(iid("m2")));
    lib.close_item();
    assert!(lib.opened_item().is_none());
}

#[tokio::test]
async fn test_search_and_sort_visible_listing() {
    let t = TestLibrary::builder()
        .folder("a", "Animals", None)
        .folder("r", "Reptiles", Some("a"))
        .folder("s", "Big cats", Some("a"))
        .tagged_item("m1", "tiger.stl", "a", &["Cat"])
        .item("m2", "lion.stl", "a")
        .tagged_item("m3", "Lynx.3mf", "a", &["cat"])
        .item("m4", "gecko.stl", "r")
        .build()
        .await;
    let lib = &t.library;
    lib.navigate(FolderFilter::Folder(fid("a"))).expect("navigate");

    let ids = |query: &ItemQuery| -> Vec<String> {
        lib.visible_items_with(query)
            .into_iter()
            .map(|item| item.id.to_string())
            .collect()
    };
    assert_eq!(ids(&ItemQuery::search("CAT")), ["m3", "m1"]);
    assert_eq!(ids(&ItemQuery::search(" LI ")), ["m2"]);
    assert_eq!(
        ids(&ItemQuery::default().sorted(ItemSort::NameAsc)),
        ["m2", "m3", "m1"]
    );
    assert_eq!(
        ids(&ItemQuery::search("cat").sorted(ItemSort::DateAsc)),
        ["m1", "m3"]
    );

    let folders = |query: &ItemQuery| -> Vec<String> {
        lib.visible_subfolders_with(query)
            .into_iter()
            .map(|folder| folder.name)
            .collect()
    };
    assert_eq!(folders(&ItemQuery::default()), ["Big cats", "Reptiles"]);
    assert_eq!(folders(&ItemQuery::search("CATS")), ["Big cats"]);
    assert_eq!(lib.visible_items().len(), 3);
}
