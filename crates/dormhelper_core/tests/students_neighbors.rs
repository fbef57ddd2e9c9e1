use dormhelper_core::{
    NeighborRepository, ProfileUpsert, RepoError, Store, StudentRepository, ValidationError,
};

fn setup() -> Store {
    Store::open_in_memory().unwrap().0
}

#[test]
fn add_and_find_students_by_room() {
    let store = setup();
    let students = store.students();
    let bo = students.add("Bo Chen", Some("101"), Some("1")).unwrap();
    let ann = students.add(" Ann Lee ", Some(" 101 "), None).unwrap();
    students.add("Cy Diaz", Some("202"), Some("2")).unwrap();

    let in_room = students.find_by_room("101").unwrap();

    let ids: Vec<_> = in_room.iter().map(|student| student.id).collect();
    assert_eq!(ids, vec![ann, bo]);
    assert_eq!(in_room[0].full_name, "Ann Lee");
    assert_eq!(in_room[0].room.as_deref(), Some("101"));
    assert!(in_room[0].created_at.is_some());
    assert!(students.find_by_room("999").unwrap().is_empty());
}

#[test]
fn find_by_name_and_room_matches_missing_room_as_null() {
    let store = setup();
    let students = store.students();
    let roomless = students.add("Dee Fox", None, None).unwrap();
    let roomed = students.add("Dee Fox", Some("303"), None).unwrap();

    let found = students.find_by_name_and_room("Dee Fox", None).unwrap();
    assert_eq!(found.map(|student| student.id), Some(roomless));

    let found = students
        .find_by_name_and_room(" Dee Fox ", Some("303"))
        .unwrap();
    assert_eq!(found.map(|student| student.id), Some(roomed));

    assert!(students
        .find_by_name_and_room("Dee Fox", Some("404"))
        .unwrap()
        .is_none());
}

#[test]
fn upsert_profile_inserts_then_updates_same_identity() {
    let store = setup();
    let students = store.students();

    let first = students.upsert_profile("Ann Lee", "101", None).unwrap();
    let inserted = match first {
        ProfileUpsert::Inserted(id) => id,
        other => panic!("expected insert, got {other:?}"),
    };

    let second = students
        .upsert_profile(" Ann Lee ", " 101 ", Some("1"))
        .unwrap();
    assert_eq!(second, ProfileUpsert::Updated(inserted));

    let student = students.get(inserted).unwrap().unwrap();
    assert_eq!(student.floor.as_deref(), Some("1"));
    assert_eq!(students.find_by_room("101").unwrap().len(), 1);

    let moved = students.upsert_profile("Ann Lee", "102", None).unwrap();
    assert!(matches!(moved, ProfileUpsert::Inserted(id) if id != inserted));
}

#[test]
fn upsert_profile_requires_room_and_name() {
    let store = setup();
    let students = store.students();

    assert!(matches!(
        students.upsert_profile("Ann Lee", "  ", None),
        Err(RepoError::Validation(ValidationError::EmptyField("room")))
    ));
    assert!(matches!(
        students.add("", None, None),
        Err(RepoError::Validation(ValidationError::EmptyField("full_name")))
    ));
}

#[test]
fn update_rewrites_profile_fields() {
    let store = setup();
    let students = store.students();
    let id = students.add("Bo Chen", Some("101"), Some("1")).unwrap();

    assert!(students.update(id, "Bo Chen", Some("205"), None).unwrap());
    assert!(!students.update(id + 1, "Nobody", None, None).unwrap());

    let student = students.get(id).unwrap().unwrap();
    assert_eq!(student.room.as_deref(), Some("205"));
    assert_eq!(student.floor, None);
}

#[test]
fn neighbors_are_listed_per_student_and_deleted_with_it() {
    let store = setup();
    let students = store.students();
    let neighbors = store.neighbors();
    let ann = students.add("Ann Lee", Some("101"), None).unwrap();
    let bo = students.add("Bo Chen", Some("102"), None).unwrap();
    let first = neighbors.add(ann, "Cy Diaz", Some("+1 555 0100")).unwrap();
    let second = neighbors.add(ann, " Dee Fox ", None).unwrap();
    neighbors.add(bo, "Eve Gray", None).unwrap();

    let listed = neighbors.list_by_student(ann).unwrap();
    let ids: Vec<_> = listed.iter().map(|neighbor| neighbor.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(listed[1].name, "Dee Fox");
    assert_eq!(listed[0].contact.as_deref(), Some("+1 555 0100"));

    assert!(students.delete(ann).unwrap());
    assert!(!students.delete(ann).unwrap());

    assert!(students.get(ann).unwrap().is_none());
    assert!(neighbors.list_by_student(ann).unwrap().is_empty());
    assert_eq!(neighbors.list_by_student(bo).unwrap().len(), 1);
}

#[test]
fn neighbor_for_missing_student_is_rejected() {
    let store = setup();

    let err = store.neighbors().add(404, "Ghost", None).unwrap_err();

    assert!(matches!(err, RepoError::Db(_)));
    assert!(store.neighbors().list_by_student(404).unwrap().is_empty());
}

#[test]
fn student_serializes_to_flat_record() {
    let store = setup();
    let id = store
        .students()
        .add("Ann Lee", Some("101"), Some("1"))
        .unwrap();

    let student = store.students().get(id).unwrap().unwrap();
    let value = serde_json::to_value(&student).unwrap();

    assert_eq!(value["full_name"], "Ann Lee");
    assert_eq!(value["room"], "101");
    assert_eq!(value["floor"], "1");
}

#[test]
fn store_cascades_neighbor_rows_on_raw_student_delete() {
    let store = setup();
    let ann = store.students().add("Ann Lee", Some("101"), None).unwrap();
    store.neighbors().add(ann, "Cy Diaz", None).unwrap();
    store.neighbors().add(ann, "Dee Fox", None).unwrap();

    let removed = store
        .connection()
        .execute("DELETE FROM students WHERE id = ?1;", [ann])
        .unwrap();

    assert_eq!(removed, 1);
    assert!(store.neighbors().list_by_student(ann).unwrap().is_empty());
    let leftover: i64 = store
        .connection()
        .query_row("SELECT COUNT(*) FROM neighbors;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(leftover, 0);
}
