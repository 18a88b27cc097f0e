// Aquafarm
// Copyright 2024 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction to manipulate farms, ponds, and the request log.
//!
//! The facilities in this module provide an abstraction over different database systems.  The
//! PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests.
//!
//! Name uniqueness for farms and ponds is enforced by the schema: the insert or update that
//! loses a race surfaces as `DbError::AlreadyExists` instead of corrupting the data.  The
//! `farm_id` column of ponds deliberately carries no constraint, as referential integrity
//! against farms is a write-time business rule, not a standing one.

use crate::model::{EndpointStatistics, Farm, FarmName, LogEntry, ModelError, Pond, PondName};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub mod postgres;
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// This type provides a generic mechanism to access a typed instance of a database, which is
/// needed by sqlx to offer type safety guarantees during query compilation.  Users of this type
/// are forced to destructure it and issue different calls for each database.
///
/// Every operation in this service is a single statement, so the executors wrap the shareable
/// connection pools directly and there is no transaction-backed variant.
pub enum Executor {
    /// A PostgreSQL executor that can be used in `sqlx` operations.
    Postgres(sqlx::PgPool),

    /// A SQLite executor that can be used in `sqlx` operations.
    Sqlite(sqlx::SqlitePool),
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    fn ex(&self) -> Executor;

    /// Closes the connection pool, failing any operation issued after this point.
    async fn close(&self);
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(pool) => postgres::run_schema(pool, include_str!("postgres.sql")).await,
        Executor::Sqlite(pool) => sqlite::run_schema(pool, include_str!("sqlite.sql")).await,
    }
}

impl TryFrom<PgRow> for Farm {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        Ok(Farm::new(id, FarmName::new(name)?))
    }
}

impl TryFrom<SqliteRow> for Farm {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        Ok(Farm::new(id, FarmName::new(name)?))
    }
}

impl TryFrom<PgRow> for Pond {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let farm_id: i64 = row.try_get("farm_id").map_err(postgres::map_sqlx_error)?;
        Ok(Pond::new(id, PondName::new(name)?, farm_id))
    }
}

impl TryFrom<SqliteRow> for Pond {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let farm_id: i64 = row.try_get("farm_id").map_err(sqlite::map_sqlx_error)?;
        Ok(Pond::new(id, PondName::new(name)?, farm_id))
    }
}

/// Creates a new farm named `name` and returns it with its storage-assigned identifier.
pub(crate) async fn create_farm(ex: &mut Executor, name: &FarmName) -> DbResult<Farm> {
    let id: i64 = match ex {
        Executor::Postgres(pool) => {
            let query_str = "INSERT INTO farms (name) VALUES ($1) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_one(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        Executor::Sqlite(pool) => {
            let query_str = "INSERT INTO farms (name) VALUES (?) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_one(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }
    };
    Ok(Farm::new(id, name.clone()))
}

/// Gets all existing farms in storage iteration order.
pub(crate) async fn get_farms(ex: &mut Executor) -> DbResult<Vec<Farm>> {
    match ex {
        Executor::Postgres(pool) => {
            let rows = sqlx::query("SELECT id, name FROM farms")
                .fetch_all(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Farm::try_from).collect()
        }

        Executor::Sqlite(pool) => {
            let rows = sqlx::query("SELECT id, name FROM farms")
                .fetch_all(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Farm::try_from).collect()
        }
    }
}

/// Gets the farm with identifier `id`, or `None` if it does not exist.
pub(crate) async fn get_farm_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Farm>> {
    match ex {
        Executor::Postgres(pool) => {
            let query_str = "SELECT id, name FROM farms WHERE id = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Farm::try_from(row)?)),
            }
        }

        Executor::Sqlite(pool) => {
            let query_str = "SELECT id, name FROM farms WHERE id = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Farm::try_from(row)?)),
            }
        }
    }
}

/// Gets the farm named `name` (exact, case-sensitive match), or `None` if it does not exist.
pub(crate) async fn get_farm_by_name(ex: &mut Executor, name: &FarmName) -> DbResult<Option<Farm>> {
    match ex {
        Executor::Postgres(pool) => {
            let query_str = "SELECT id, name FROM farms WHERE name = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_optional(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Farm::try_from(row)?)),
            }
        }

        Executor::Sqlite(pool) => {
            let query_str = "SELECT id, name FROM farms WHERE name = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_optional(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Farm::try_from(row)?)),
            }
        }
    }
}

/// Renames the farm with identifier `id` to `name`.
pub(crate) async fn update_farm(ex: &mut Executor, id: i64, name: &FarmName) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(pool) => {
            let query_str = "UPDATE farms SET name = $1 WHERE id = $2";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(pool) => {
            let query_str = "UPDATE farms SET name = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the farm with identifier `id`.  Ponds that reference the farm are left untouched.
pub(crate) async fn delete_farm(ex: &mut Executor, id: i64) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(pool) => {
            let query_str = "DELETE FROM farms WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(pool) => {
            let query_str = "DELETE FROM farms WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

/// Creates a new pond named `name` under farm `farm_id` and returns it with its
/// storage-assigned identifier.  The existence of the farm is not checked here.
pub(crate) async fn create_pond(
    ex: &mut Executor,
    name: &PondName,
    farm_id: i64,
) -> DbResult<Pond> {
    let id: i64 = match ex {
        Executor::Postgres(pool) => {
            let query_str = "INSERT INTO ponds (name, farm_id) VALUES ($1, $2) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(farm_id)
                .fetch_one(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        Executor::Sqlite(pool) => {
            let query_str = "INSERT INTO ponds (name, farm_id) VALUES (?, ?) RETURNING id";
            let row = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(farm_id)
                .fetch_one(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }
    };
    Ok(Pond::new(id, name.clone(), farm_id))
}

/// Gets all existing ponds in storage iteration order.
pub(crate) async fn get_ponds(ex: &mut Executor) -> DbResult<Vec<Pond>> {
    match ex {
        Executor::Postgres(pool) => {
            let rows = sqlx::query("SELECT id, name, farm_id FROM ponds")
                .fetch_all(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Pond::try_from).collect()
        }

        Executor::Sqlite(pool) => {
            let rows = sqlx::query("SELECT id, name, farm_id FROM ponds")
                .fetch_all(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Pond::try_from).collect()
        }
    }
}

/// Gets the pond with identifier `id`, or `None` if it does not exist.
pub(crate) async fn get_pond_by_id(ex: &mut Executor, id: i64) -> DbResult<Option<Pond>> {
    match ex {
        Executor::Postgres(pool) => {
            let query_str = "SELECT id, name, farm_id FROM ponds WHERE id = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Pond::try_from(row)?)),
            }
        }

        Executor::Sqlite(pool) => {
            let query_str = "SELECT id, name, farm_id FROM ponds WHERE id = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(id)
                .fetch_optional(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Pond::try_from(row)?)),
            }
        }
    }
}

/// Gets the pond named `name` (exact, case-sensitive match), or `None` if it does not exist.
pub(crate) async fn get_pond_by_name(ex: &mut Executor, name: &PondName) -> DbResult<Option<Pond>> {
    match ex {
        Executor::Postgres(pool) => {
            let query_str = "SELECT id, name, farm_id FROM ponds WHERE name = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_optional(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Pond::try_from(row)?)),
            }
        }

        Executor::Sqlite(pool) => {
            let query_str = "SELECT id, name, farm_id FROM ponds WHERE name = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(name.as_str())
                .fetch_optional(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match maybe_row {
                None => Ok(None),
                Some(row) => Ok(Some(Pond::try_from(row)?)),
            }
        }
    }
}

/// Updates the pond with identifier `id` to be named `name` and belong to farm `farm_id`.
pub(crate) async fn update_pond(
    ex: &mut Executor,
    id: i64,
    name: &PondName,
    farm_id: i64,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(pool) => {
            let query_str = "UPDATE ponds SET name = $1, farm_id = $2 WHERE id = $3";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(farm_id)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(pool) => {
            let query_str = "UPDATE ponds SET name = ?, farm_id = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(name.as_str())
                .bind(farm_id)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the pond with identifier `id`.
pub(crate) async fn delete_pond(ex: &mut Executor, id: i64) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(pool) => {
            let query_str = "DELETE FROM ponds WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(pool) => {
            let query_str = "DELETE FROM ponds WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id)
                .execute(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}

/// Appends `entry` to the request log.
pub(crate) async fn create_log(ex: &mut Executor, entry: &LogEntry) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Postgres(pool) => {
            let query_str =
                "INSERT INTO logs (endpoint, user_agent, created_at) VALUES ($1, $2, $3)";
            let done = sqlx::query(query_str)
                .bind(entry.endpoint().as_str())
                .bind(entry.user_agent().as_str())
                .bind(*entry.created_at())
                .execute(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        Executor::Sqlite(pool) => {
            let (created_at_secs, created_at_nsecs) = sqlite::unpack_timestamp(*entry.created_at());

            let query_str = "
                INSERT INTO logs (endpoint, user_agent, created_at_secs, created_at_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(entry.endpoint().as_str())
                .bind(entry.user_agent().as_str())
                .bind(created_at_secs)
                .bind(created_at_nsecs)
                .execute(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Gets the distinct set of endpoint labels that appear in the request log.
pub(crate) async fn get_distinct_endpoints(ex: &mut Executor) -> DbResult<Vec<String>> {
    match ex {
        Executor::Postgres(pool) => {
            let rows = sqlx::query("SELECT DISTINCT endpoint FROM logs")
                .fetch_all(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let mut endpoints = Vec::with_capacity(rows.len());
            for row in rows {
                endpoints.push(row.try_get("endpoint").map_err(postgres::map_sqlx_error)?);
            }
            Ok(endpoints)
        }

        Executor::Sqlite(pool) => {
            let rows = sqlx::query("SELECT DISTINCT endpoint FROM logs")
                .fetch_all(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut endpoints = Vec::with_capacity(rows.len());
            for row in rows {
                endpoints.push(row.try_get("endpoint").map_err(sqlite::map_sqlx_error)?);
            }
            Ok(endpoints)
        }
    }
}

/// Computes the call count and distinct user agent count for the log rows tagged with
/// `endpoint`.  An endpoint with no rows yields zero counts.
pub(crate) async fn get_endpoint_statistics(
    ex: &mut Executor,
    endpoint: &str,
) -> DbResult<EndpointStatistics> {
    match ex {
        Executor::Postgres(pool) => {
            let query_str = "
                SELECT
                    COUNT(*) AS count,
                    COUNT(DISTINCT user_agent) AS unique_user_agent
                FROM logs
                WHERE endpoint = $1";
            let row = sqlx::query(query_str)
                .bind(endpoint)
                .fetch_one(&*pool)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let count: i64 = row.try_get("count").map_err(postgres::map_sqlx_error)?;
            let unique_user_agent: i64 =
                row.try_get("unique_user_agent").map_err(postgres::map_sqlx_error)?;
            Ok(EndpointStatistics::new(count, unique_user_agent))
        }

        Executor::Sqlite(pool) => {
            let query_str = "
                SELECT
                    COUNT(*) AS count,
                    COUNT(DISTINCT user_agent) AS unique_user_agent
                FROM logs
                WHERE endpoint = ?";
            let row = sqlx::query(query_str)
                .bind(endpoint)
                .fetch_one(&*pool)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let count: i64 = row.try_get("count").map_err(sqlite::map_sqlx_error)?;
            let unique_user_agent: i64 =
                row.try_get("unique_user_agent").map_err(sqlite::map_sqlx_error)?;
            Ok(EndpointStatistics::new(count, unique_user_agent))
        }
    }
}
