use blueprints_core::db::migrations::latest_version;
use blueprints_core::db::open_db_in_memory;
use blueprints_core::{
    Blueprint, BlueprintRepository, BlueprintService, BlueprintValidationError, Point, RepoError,
    SqliteBlueprintRepository,
};
use rusqlite::Connection;

fn house() -> Blueprint {
    Blueprint::new("john", "house", vec![Point::new(0, 0), Point::new(10, 0)])
}

fn point_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM points;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn save_and_get_one_roundtrip_preserves_point_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    let blueprint = Blueprint::new(
        "ann",
        "zigzag",
        vec![
            Point::new(5, 5),
            Point::new(-3, 7),
            Point::new(0, 0),
            Point::new(5, 5),
        ],
    );
    repo.save(&blueprint).unwrap();

    let loaded = repo.get_one("ann", "zigzag").unwrap();
    assert_eq!(loaded, blueprint);
}

#[test]
fn save_accepts_empty_point_sequence() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    repo.save(&Blueprint::new("ann", "blank", Vec::new()))
        .unwrap();

    let loaded = repo.get_one("ann", "blank").unwrap();
    assert!(loaded.points.is_empty());
}

#[test]
fn duplicate_save_fails_and_leaves_existing_blueprint_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    repo.save(&house()).unwrap();

    let duplicate = Blueprint::new("john", "house", vec![Point::new(99, 99)]);
    let err = repo.save(&duplicate).unwrap_err();
    assert!(matches!(
        err,
        RepoError::AlreadyExists { ref author, ref name } if author == "john" && name == "house"
    ));

    assert_eq!(repo.get_one("john", "house").unwrap(), house());
    drop(repo);
    assert_eq!(point_count(&conn), 2);
}

#[test]
fn save_rejects_blank_natural_key_before_writing() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    let err = repo
        .save(&Blueprint::new("   ", "house", vec![Point::new(1, 1)]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BlueprintValidationError::BlankAuthor)
    ));
    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn get_one_on_absent_key_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    repo.save(&house()).unwrap();

    let err = repo.get_one("john", "garage").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(ref message) if message == "Blueprint not found"));
}

#[test]
fn get_by_author_on_empty_store_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    let err = repo.get_by_author("nobody").unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound(ref message) if message == "No blueprints found for author: nobody"
    ));
}

#[test]
fn get_by_author_returns_only_that_author_sorted_by_name() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    repo.save(&Blueprint::new("john", "tower", vec![Point::new(1, 1)]))
        .unwrap();
    repo.save(&house()).unwrap();
    repo.save(&Blueprint::new("ann", "house", Vec::new()))
        .unwrap();

    let blueprints = repo.get_by_author("john").unwrap();
    let names: Vec<_> = blueprints.iter().map(|bp| bp.name.as_str()).collect();
    assert_eq!(names, vec!["house", "tower"]);
    assert!(blueprints.iter().all(|bp| bp.author == "john"));
    assert_eq!(blueprints[0].points, house().points);
}

#[test]
fn get_all_on_empty_store_is_empty_not_error() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    assert!(repo.get_all().unwrap().is_empty());
}

#[test]
fn get_all_keeps_points_attached_to_their_owner() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    let ann = Blueprint::new("ann", "plan", vec![Point::new(7, 8)]);
    let empty = Blueprint::new("bob", "draft", Vec::new());
    repo.save(&house()).unwrap();
    repo.save(&empty).unwrap();
    repo.save(&ann).unwrap();

    let all = repo.get_all().unwrap();
    assert_eq!(all, vec![ann, empty, house()]);
}

#[test]
fn add_point_appends_exactly_one_point_at_the_end() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    repo.save(&house()).unwrap();

    repo.add_point("john", "house", Point::new(10, 10)).unwrap();

    let loaded = repo.get_one("john", "house").unwrap();
    assert_eq!(
        loaded.points,
        vec![Point::new(0, 0), Point::new(10, 0), Point::new(10, 10)]
    );
}

#[test]
fn add_point_on_absent_blueprint_is_not_found_without_side_effects() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    repo.save(&house()).unwrap();

    let err = repo
        .add_point("john", "garage", Point::new(1, 1))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));

    drop(repo);
    assert_eq!(point_count(&conn), 2);
}

#[test]
fn writes_are_visible_to_other_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let mut writer = blueprints_core::db::open_db(&path).unwrap();
    let mut reader = blueprints_core::db::open_db(&path).unwrap();

    let mut repo = SqliteBlueprintRepository::try_new(&mut writer).unwrap();
    repo.save(&house()).unwrap();
    repo.add_point("john", "house", Point::new(10, 10)).unwrap();

    let reader_repo = SqliteBlueprintRepository::try_new(&mut reader).unwrap();
    assert_eq!(reader_repo.get_one("john", "house").unwrap().points.len(), 3);
}

#[test]
fn service_wraps_repository_calls() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();
    let mut service = BlueprintService::new(repo);

    assert!(service.get_all_blueprints().unwrap().is_empty());

    service
        .add_new_blueprint("john", "house", house().points)
        .unwrap();
    service.add_point("john", "house", 10, 10).unwrap();

    let fetched = service.get_blueprint("john", "house").unwrap();
    assert_eq!(fetched.points.last(), Some(&Point::new(10, 10)));
    assert_eq!(service.get_blueprints_by_author("john").unwrap().len(), 1);
    assert!(matches!(
        service.add_new_blueprint("john", "house", Vec::new()),
        Err(RepoError::AlreadyExists { .. })
    ));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteBlueprintRepository::try_new(&mut conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_blueprints_table() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBlueprintRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("blueprints"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_points_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE blueprints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author TEXT NOT NULL,
            name TEXT NOT NULL
        );
        CREATE TABLE points (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            x INTEGER NOT NULL,
            y INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBlueprintRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "points",
            column: "blueprint_id"
        })
    ));
}

#[test]
fn corrupted_blueprint_row_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO blueprints (author, name) VALUES ('', 'ghost');",
        [],
    )
    .unwrap();
    let repo = SqliteBlueprintRepository::try_new(&mut conn).unwrap();

    assert!(matches!(repo.get_all(), Err(RepoError::InvalidData(_))));
}
