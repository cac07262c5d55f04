//! Blueprint repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the persistence port over `blueprints` and `points` storage.
//! - Translate rows to domain values with explicit mapping functions.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `(author, name)` is unique; the `UNIQUE` constraint is authoritative and
//!   the pre-insert lookup only fails fast.
//! - A blueprint and its initial points are written in one transaction.
//! - Points are read back in insertion order (`points.id ASC`).
//! - Absent keys surface as `NotFound`, never as empty sentinels.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::blueprint::{Blueprint, BlueprintValidationError, Point};
use log::info;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Params, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const BLUEPRINT_SELECT_SQL: &str = "SELECT
    b.id AS blueprint_id,
    b.author AS author,
    b.name AS name,
    p.x AS x,
    p.y AS y
FROM blueprints b
LEFT JOIN points p ON p.blueprint_id = b.id";

const BLUEPRINT_ORDER_SQL: &str = "ORDER BY b.author ASC, b.name ASC, p.id ASC";

const BLUEPRINT_NOT_FOUND: &str = "Blueprint not found";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for blueprint persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BlueprintValidationError),
    Db(DbError),
    /// Carries a caller-facing description of what was missing.
    NotFound(String),
    AlreadyExists {
        author: String,
        name: String,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(message) => write!(f, "{message}"),
            Self::AlreadyExists { author, name } => {
                write!(f, "blueprint already exists: {author}/{name}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted blueprint data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is older than required {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlueprintValidationError> for RepoError {
    fn from(value: BlueprintValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence port for blueprint storage.
pub trait BlueprintRepository {
    /// Persists a new blueprint with its current points.
    fn save(&mut self, blueprint: &Blueprint) -> RepoResult<()>;
    /// Loads one blueprint by natural key.
    fn get_one(&self, author: &str, name: &str) -> RepoResult<Blueprint>;
    /// Loads every blueprint of `author`, ordered by name. Empty is `NotFound`.
    fn get_by_author(&self, author: &str) -> RepoResult<Vec<Blueprint>>;
    /// Loads every blueprint, ordered by `(author, name)`.
    fn get_all(&self) -> RepoResult<Vec<Blueprint>>;
    /// Appends one point at the end of the named blueprint.
    fn add_point(&mut self, author: &str, name: &str, point: Point) -> RepoResult<()>;
}

/// SQLite-backed blueprint repository.
pub struct SqliteBlueprintRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBlueprintRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BlueprintRepository for SqliteBlueprintRepository<'_> {
    fn save(&mut self, blueprint: &Blueprint) -> RepoResult<()> {
        blueprint.validate()?;
        let started_at = Instant::now();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_blueprint_id(&tx, &blueprint.author, &blueprint.name)?.is_some() {
            return Err(already_exists(blueprint));
        }

        if let Err(err) = tx.execute(
            "INSERT INTO blueprints (author, name) VALUES (?1, ?2);",
            params![blueprint.author.as_str(), blueprint.name.as_str()],
        ) {
            if is_unique_violation(&err) {
                return Err(already_exists(blueprint));
            }
            return Err(err.into());
        }
        let blueprint_id = tx.last_insert_rowid();

        {
            let mut stmt =
                tx.prepare("INSERT INTO points (x, y, blueprint_id) VALUES (?1, ?2, ?3);")?;
            for point in &blueprint.points {
                stmt.execute(params![point.x, point.y, blueprint_id])?;
            }
        }
        tx.commit()?;

        info!(
            "event=blueprint_save module=repo status=ok point_count={} duration_ms={}",
            blueprint.points.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn get_one(&self, author: &str, name: &str) -> RepoResult<Blueprint> {
        load_blueprints(
            self.conn,
            "WHERE b.author = ?1 AND b.name = ?2",
            params![author, name],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| RepoError::NotFound(BLUEPRINT_NOT_FOUND.to_string()))
    }

    fn get_by_author(&self, author: &str) -> RepoResult<Vec<Blueprint>> {
        let blueprints = load_blueprints(self.conn, "WHERE b.author = ?1", params![author])?;
        if blueprints.is_empty() {
            return Err(RepoError::NotFound(format!(
                "No blueprints found for author: {author}"
            )));
        }
        Ok(blueprints)
    }

    fn get_all(&self) -> RepoResult<Vec<Blueprint>> {
        load_blueprints(self.conn, "", [])
    }

    fn add_point(&mut self, author: &str, name: &str, point: Point) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(blueprint_id) = find_blueprint_id(&tx, author, name)? else {
            return Err(RepoError::NotFound(BLUEPRINT_NOT_FOUND.to_string()));
        };

        tx.execute(
            "INSERT INTO points (x, y, blueprint_id) VALUES (?1, ?2, ?3);",
            params![point.x, point.y, blueprint_id],
        )?;
        tx.commit()?;

        info!("event=blueprint_add_point module=repo status=ok");
        Ok(())
    }
}

/// Runs one joined blueprint/point query and folds rows into aggregates.
///
/// Rows arrive grouped by blueprint because of `BLUEPRINT_ORDER_SQL`.
fn load_blueprints<P: Params>(
    conn: &Connection,
    filter_sql: &str,
    params: P,
) -> RepoResult<Vec<Blueprint>> {
    let mut stmt = conn.prepare(&format!(
        "{BLUEPRINT_SELECT_SQL} {filter_sql} {BLUEPRINT_ORDER_SQL};"
    ))?;
    let mut rows = stmt.query(params)?;

    let mut blueprints: Vec<Blueprint> = Vec::new();
    let mut current_id: Option<i64> = None;
    while let Some(row) = rows.next()? {
        let blueprint_id: i64 = row.get("blueprint_id")?;
        if current_id != Some(blueprint_id) {
            blueprints.push(parse_blueprint_row(row)?);
            current_id = Some(blueprint_id);
        }
        if let Some(point) = parse_point_row(row)? {
            if let Some(blueprint) = blueprints.last_mut() {
                blueprint.add_point(point);
            }
        }
    }

    Ok(blueprints)
}

fn parse_blueprint_row(row: &Row<'_>) -> RepoResult<Blueprint> {
    let blueprint = Blueprint::new(
        row.get::<_, String>("author")?,
        row.get::<_, String>("name")?,
        Vec::new(),
    );
    blueprint.validate().map_err(|err| {
        RepoError::InvalidData(format!("blueprints row violates invariants: {err}"))
    })?;
    Ok(blueprint)
}

fn parse_point_row(row: &Row<'_>) -> RepoResult<Option<Point>> {
    let x: Option<i32> = row.get("x")?;
    let y: Option<i32> = row.get("y")?;
    match (x, y) {
        (Some(x), Some(y)) => Ok(Some(Point::new(x, y))),
        (None, None) => Ok(None),
        _ => Err(RepoError::InvalidData(
            "points row has only one coordinate set".to_string(),
        )),
    }
}

fn find_blueprint_id(conn: &Connection, author: &str, name: &str) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM blueprints WHERE author = ?1 AND name = ?2;",
            params![author, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id)
}

fn already_exists(blueprint: &Blueprint) -> RepoError {
    RepoError::AlreadyExists {
        author: blueprint.author.clone(),
        name: blueprint.name.clone(),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED: &[(&str, &[&str])] = &[
        ("blueprints", &["id", "author", "name"]),
        ("points", &["id", "x", "y", "blueprint_id"]),
    ];
    for (table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(*table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: *table,
                    column: *column,
                });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
