// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Row};
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::entity::{bind_value, format_timestamp, Entity, Timestamped};

/// Owns the connection pool of one entity family and turns generic entity
/// calls into SQL.
#[derive(Debug, Clone)]
pub struct StorageEngine {
    pool: SqlitePool,
}

impl StorageEngine {
    /// Connect to `dsn`. With `quiet` set, sqlx statement and slow-query
    /// logging is switched off.
    pub async fn open(dsn: &str, quiet: bool) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(dsn)
            .map_err(Error::store("could not parse database DSN"))?
            .create_if_missing(true);
        if quiet {
            options = options.disable_statement_logging();
        }

        let mut pool_options = SqlitePoolOptions::new();
        if is_memory_dsn(dsn) {
            // An in-memory database vanishes with its last connection; keep
            // exactly one alive for the pool's lifetime.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(Error::store("could not open database"))?;

        debug!(dsn = %dsn, quiet, "Opened storage engine");
        Ok(Self { pool })
    }

    /// Create the entity's table if missing, then add any column the table
    /// lacks. Existing columns and rows are never touched.
    pub async fn ensure_schema<E: Entity>(&self) -> Result<()> {
        let migrate_err = || format!("could not auto migrate {}", E::TABLE);

        let columns = E::COLUMNS
            .iter()
            .map(|c| format!("{} {}", c.name, c.decl))
            .collect::<Vec<_>>()
            .join(", ");
        sqlx::query(&format!("CREATE TABLE IF NOT EXISTS {} ({})", E::TABLE, columns))
            .execute(&self.pool)
            .await
            .map_err(Error::store(migrate_err()))?;

        let existing: HashSet<String> = sqlx::query(&format!("PRAGMA table_info({})", E::TABLE))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store(migrate_err()))?
            .iter()
            .map(|row| row.try_get::<String, _>("name"))
            .collect::<std::result::Result<_, _>>()
            .map_err(Error::store(migrate_err()))?;

        for column in E::COLUMNS.iter().filter(|c| !existing.contains(c.name)) {
            info!(table = E::TABLE, column = column.name, "Migrating schema: adding column");
            sqlx::query(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                E::TABLE,
                column.name,
                column.decl
            ))
            .execute(&self.pool)
            .await
            .map_err(Error::store(migrate_err()))?;
        }

        for column in E::COLUMNS.iter().filter(|c| c.indexed) {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table} ({column})",
                table = E::TABLE,
                column = column.name
            ))
            .execute(&self.pool)
            .await
            .map_err(Error::store(migrate_err()))?;
        }

        info!(table = E::TABLE, "Initialized schema");
        Ok(())
    }

    pub async fn fetch_all<E: Entity>(&self) -> Result<Vec<E>> {
        let message = || format!("could not get all {} items", E::NAME);
        let rows = sqlx::query(&format!("SELECT * FROM {} ORDER BY rowid", E::TABLE))
            .fetch_all(&self.pool)
            .await
            .map_err(Error::store(message()))?;

        rows.iter()
            .map(E::from_row)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::store(message()))
    }

    pub async fn fetch_by_id<E: Entity>(&self, id: &E::Id) -> Result<Option<E>> {
        let message = || format!("could not find {} item with ID {:?}", E::NAME, id.to_string());
        let sql = format!("SELECT * FROM {} WHERE {} = ?1", E::TABLE, E::ID_COLUMN);
        let row = bind_value(sqlx::query(&sql), id.clone().into())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::store(message()))?;

        row.as_ref()
            .map(E::from_row)
            .transpose()
            .map_err(Error::store(message()))
    }

    /// Insert a row and return the engine-assigned rowid.
    pub async fn insert<E: Entity>(&self, entity: &E) -> Result<i64> {
        let values = entity.values();
        let columns = values.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
        let placeholders = (1..=values.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO {} ({}) VALUES ({})", E::TABLE, columns, placeholders);

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = bind_value(query, value);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(Error::store(format!("could not create {} item", E::NAME)))?;
        Ok(result.last_insert_rowid())
    }

    /// Overwrite every non-id column of the row addressed by the entity's id.
    pub async fn replace<E: Entity>(&self, entity: &E) -> Result<u64> {
        let values = entity
            .values()
            .into_iter()
            .filter(|(column, _)| *column != E::ID_COLUMN)
            .collect::<Vec<_>>();
        let assignments = values
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            E::TABLE,
            assignments,
            E::ID_COLUMN,
            values.len() + 1
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = bind_value(query, value);
        }
        query = bind_value(query, entity.id().into());

        let result = query
            .execute(&self.pool)
            .await
            .map_err(Error::store(format!("could not update {} item", E::NAME)))?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_id<E: Entity>(&self, id: &E::Id) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", E::TABLE, E::ID_COLUMN);
        let result = bind_value(sqlx::query(&sql), id.clone().into())
            .execute(&self.pool)
            .await
            .map_err(Error::store(format!(
                "could not delete {} item {:?}",
                E::NAME,
                id.to_string()
            )))?;
        Ok(result.rows_affected())
    }

    /// Delete every row created strictly before `cutoff`.
    pub async fn delete_before<E: Timestamped>(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} < ?1", E::TABLE, E::CREATED_AT_COLUMN);
        let result = sqlx::query(&sql)
            .bind(format_timestamp(&cutoff))
            .execute(&self.pool)
            .await
            .map_err(Error::store(format!(
                "could not delete {} items older than {:?}",
                E::NAME,
                cutoff.format("%Y-%m-%d %H:%M:%S").to_string()
            )))?;
        Ok(result.rows_affected())
    }

    /// Remove every row of the entity's table.
    #[cfg(test)]
    pub async fn truncate<E: Entity>(&self) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {}", E::TABLE))
            .execute(&self.pool)
            .await
            .map_err(Error::store("could not truncate"))?;
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed storage engine");
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.contains(":memory:") || dsn.contains("mode=memory")
}
