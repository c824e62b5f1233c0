//! Waypoint persistence using SQLite with sqlx.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use planner_common::{NewWaypoint, PlannerError, PlannerResult, Waypoint};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS waypoints (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )
"#;

/// Append-only waypoint storage.
#[async_trait]
pub trait WaypointStore: Send + Sync {
    /// Insert a waypoint and return it with its assigned id.
    async fn create(&self, waypoint: &NewWaypoint) -> PlannerResult<Waypoint>;

    /// Every waypoint, in insertion order.
    async fn list_all(&self) -> PlannerResult<Vec<Waypoint>>;
}

fn db_error(action: &str, err: sqlx::Error) -> PlannerError {
    PlannerError::DatabaseError(format!("{} failed: {}", action, err))
}

/// [`WaypointStore`] over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteWaypointStore {
    pool: SqlitePool,
}

impl SqliteWaypointStore {
    /// Open or create the database at `path`.
    pub async fn open(path: &Path) -> PlannerResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Connection", e))?;

        let store = Self { pool };
        store.migrate().await?;

        info!(path = %path.display(), "Opened waypoint database");
        Ok(store)
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> PlannerResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        // One connection that never recycles: each connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Connection", e))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> PlannerResult<()> {
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Migration", e))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl WaypointStore for SqliteWaypointStore {
    async fn create(&self, waypoint: &NewWaypoint) -> PlannerResult<Waypoint> {
        waypoint
            .validate()
            .map_err(|message| PlannerError::invalid_parameter("waypoint", message))?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO waypoints (name, latitude, longitude, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&waypoint.name)
        .bind(waypoint.latitude)
        .bind(waypoint.longitude)
        .bind(&waypoint.description)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Insert", e))?;

        let id = result.last_insert_rowid();
        debug!(id = id, name = %waypoint.name, "Created waypoint");

        Ok(Waypoint {
            id,
            name: waypoint.name.clone(),
            latitude: waypoint.latitude,
            longitude: waypoint.longitude,
            description: waypoint.description.clone(),
        })
    }

    async fn list_all(&self) -> PlannerResult<Vec<Waypoint>> {
        let rows: Vec<(i64, String, f64, f64, Option<String>)> = sqlx::query_as(
            "SELECT id, name, latitude, longitude, description FROM waypoints ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Query", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, latitude, longitude, description)| Waypoint {
                id,
                name,
                latitude,
                longitude,
                description,
            })
            .collect())
    }
}
