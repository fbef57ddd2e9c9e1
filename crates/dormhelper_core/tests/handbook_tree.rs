use dormhelper_core::{
    HandbookRepository, MigrationStage, RepoError, Store, StoreConfig, ValidationError,
};
use rusqlite::Connection;

fn setup() -> Store {
    Store::open_in_memory().unwrap().0
}

fn titles(nodes: &[dormhelper_core::HandbookNode]) -> Vec<&str> {
    nodes.iter().map(|node| node.title.as_str()).collect()
}

#[test]
fn children_are_ordered_by_sort_order_then_id() {
    let store = setup();
    let handbook = store.handbook();
    handbook.add("Third", "", None, 2).unwrap();
    handbook.add("First", "", None, 0).unwrap();
    handbook.add("Second", "", None, 1).unwrap();
    handbook.add("First tie", "", None, 0).unwrap();

    let roots = handbook.children(None).unwrap();

    assert_eq!(titles(&roots), vec!["First", "First tie", "Second", "Third"]);
}

#[test]
fn children_lists_only_direct_descendants() {
    let store = setup();
    let handbook = store.handbook();
    let rules = handbook.add("Rules", "House rules", None, 0).unwrap();
    let quiet = handbook
        .add("Quiet hours", "22:00 to 07:00", Some(rules), 1)
        .unwrap();
    handbook
        .add("Guests", "Register at the desk", Some(rules), 0)
        .unwrap();
    handbook.add("Weekends", "23:00", Some(quiet), 0).unwrap();

    let children = handbook.children(Some(rules)).unwrap();

    assert_eq!(titles(&children), vec!["Guests", "Quiet hours"]);
    assert!(children.iter().all(|node| node.parent_id == Some(rules)));
    assert_eq!(titles(&handbook.children(None).unwrap()), vec!["Rules"]);
}

#[test]
fn get_returns_stored_node() {
    let store = setup();
    let handbook = store.handbook();
    let id = handbook.add("  Laundry ", "Basement", None, 3).unwrap();

    let node = handbook.get(id).unwrap().unwrap();

    assert_eq!(node.title, "Laundry");
    assert_eq!(node.content, "Basement");
    assert_eq!(node.sort_order, 3);
    assert_eq!(node.parent_id, None);
    assert!(handbook.get(id + 1).unwrap().is_none());
}

#[test]
fn add_rejects_unknown_parent_and_blank_title() {
    let store = setup();
    let handbook = store.handbook();

    assert!(matches!(
        handbook.add("Orphan", "", Some(42), 0),
        Err(RepoError::ParentNotFound(42))
    ));
    assert!(matches!(
        handbook.add(" ", "", None, 0),
        Err(RepoError::Validation(ValidationError::EmptyField("title")))
    ));
    assert!(handbook.children(None).unwrap().is_empty());
}

#[test]
fn delete_by_title_lifts_children_after_existing_siblings() {
    let store = setup();
    let handbook = store.handbook();
    let root = handbook.add("Living", "", None, 0).unwrap();
    handbook.add("Keys", "", Some(root), 5).unwrap();
    let kitchen = handbook.add("Kitchen", "", Some(root), 1).unwrap();
    let stove = handbook.add("Stove", "", Some(kitchen), 0).unwrap();
    let fridge = handbook.add("Fridge", "", Some(kitchen), 1).unwrap();

    assert_eq!(handbook.delete_by_title("Kitchen").unwrap(), 1);

    assert!(handbook.get(kitchen).unwrap().is_none());
    let children = handbook.children(Some(root)).unwrap();
    assert_eq!(titles(&children), vec!["Keys", "Stove", "Fridge"]);
    let stove = handbook.get(stove).unwrap().unwrap();
    let fridge = handbook.get(fridge).unwrap().unwrap();
    assert_eq!(stove.sort_order, 6);
    assert_eq!(fridge.sort_order, 7);
}

#[test]
fn delete_by_title_of_root_promotes_children_to_roots() {
    let store = setup();
    let handbook = store.handbook();
    handbook.add("Contacts", "", None, 0).unwrap();
    let old = handbook.add("Old section", "", None, 1).unwrap();
    handbook.add("Still useful", "", Some(old), 0).unwrap();

    assert_eq!(handbook.delete_by_title(" Old section ").unwrap(), 1);

    let roots = handbook.children(None).unwrap();
    assert_eq!(titles(&roots), vec!["Contacts", "Still useful"]);
    assert_eq!(roots[1].sort_order, 2);
}

#[test]
fn delete_by_title_removes_every_match_and_reports_zero_for_none() {
    let store = setup();
    let handbook = store.handbook();
    let outer = handbook.add("Draft", "", None, 0).unwrap();
    handbook.add("Draft", "", Some(outer), 0).unwrap();
    handbook.add("Kept", "", None, 1).unwrap();

    assert_eq!(handbook.delete_by_title("Draft").unwrap(), 2);
    assert_eq!(titles(&handbook.children(None).unwrap()), vec!["Kept"]);
    assert_eq!(handbook.delete_by_title("Draft").unwrap(), 0);
}

#[test]
fn orphaned_nodes_from_unenforced_stores_become_roots_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dormhelper.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = OFF;
             CREATE TABLE handbook (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 parent_id INTEGER REFERENCES handbook(id) ON DELETE SET NULL,
                 title TEXT NOT NULL,
                 content TEXT,
                 sort_order INTEGER DEFAULT 0
             );
             INSERT INTO handbook (id, parent_id, title) VALUES (1, NULL, 'Campus');
             INSERT INTO handbook (id, parent_id, title) VALUES (2, 1, 'Building');
             INSERT INTO handbook (id, parent_id, title) VALUES (3, 2, 'Laundry');
             DELETE FROM handbook WHERE id = 1;",
        )
        .unwrap();
    }

    let (store, report) = Store::open(&StoreConfig::at(&path)).unwrap();

    assert!(report
        .warnings
        .iter()
        .all(|warning| warning.stage != MigrationStage::Backfill("handbook_orphans")));
    let handbook = store.handbook();
    assert_eq!(titles(&handbook.children(None).unwrap()), vec!["Building"]);

    assert_eq!(handbook.delete_by_title("Building").unwrap(), 1);
    let roots = handbook.children(None).unwrap();
    assert_eq!(titles(&roots), vec!["Laundry"]);
    assert_eq!(roots[0].parent_id, None);
}

#[test]
fn delete_by_title_treats_dangling_parent_as_root_level() {
    let store = setup();
    let conn = store.connection();
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         INSERT INTO handbook (id, parent_id, title, content, sort_order)
         VALUES (10, 99, 'Stray section', '', 0);
         INSERT INTO handbook (id, parent_id, title, content, sort_order)
         VALUES (11, 10, 'Stray page', '', 0);
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();
    let handbook = store.handbook();
    handbook.add("Contacts", "", None, 0).unwrap();

    assert_eq!(handbook.delete_by_title("Stray section").unwrap(), 1);

    let roots = handbook.children(None).unwrap();
    assert_eq!(titles(&roots), vec!["Contacts", "Stray page"]);
    assert_eq!(roots[1].sort_order, 1);
}
