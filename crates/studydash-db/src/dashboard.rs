//! Dashboard document repository implementation.
//!
//! Each collection lives in its own JSONB column of `user_dashboard_data`.
//! Rows are read back through the typed document model, so a column holding
//! `null` or an older shape comes out as its empty default.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use sqlx::types::Json;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use studydash_core::{DashboardDocument, DashboardRepository, Error, Result};

/// (column, document key) pairs for every JSONB column.
const DOCUMENT_COLUMNS: [(&str, &str); 8] = [
    ("courses", "courses"),
    ("calendar_events", "calendarEvents"),
    ("mind_space_items", "mindSpaceItems"),
    ("timetable", "timetable"),
    ("files", "files"),
    ("grades", "grades"),
    ("semesters", "semesters"),
    ("property_definitions", "propertyDefinitions"),
];

/// PostgreSQL implementation of DashboardRepository.
pub struct PgDashboardRepository {
    pool: Pool<Postgres>,
}

impl PgDashboardRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Split a document into its column values, in [`DOCUMENT_COLUMNS`] order.
fn document_to_columns(doc: &DashboardDocument) -> Result<Vec<JsonValue>> {
    let mut object = match serde_json::to_value(doc)? {
        JsonValue::Object(map) => map,
        _ => return Err(Error::Internal("document did not serialize to an object".into())),
    };
    Ok(DOCUMENT_COLUMNS
        .iter()
        .map(|(_, key)| object.remove(*key).unwrap_or(JsonValue::Null))
        .collect())
}

/// Reassemble a document from its column values.
fn document_from_columns(
    columns: Vec<(&'static str, Option<JsonValue>)>,
    seed_version: Option<i32>,
) -> Result<DashboardDocument> {
    let mut object = Map::new();
    for (key, value) in columns {
        match value {
            Some(JsonValue::Null) | None => {}
            Some(value) => {
                object.insert(key.to_string(), value);
            }
        }
    }
    if let Some(version) = seed_version.filter(|v| *v >= 0) {
        object.insert("seedVersion".to_string(), JsonValue::from(version));
    }
    Ok(serde_json::from_value(JsonValue::Object(object))?)
}

#[async_trait]
impl DashboardRepository for PgDashboardRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<DashboardDocument>> {
        let row = sqlx::query(
            r#"
            SELECT courses, calendar_events, mind_space_items, timetable, files, grades,
                   semesters, property_definitions, seed_version
            FROM user_dashboard_data
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let columns = DOCUMENT_COLUMNS
            .iter()
            .map(|(column, key)| (*key, row.get::<Option<JsonValue>, _>(*column)))
            .collect();
        let doc = document_from_columns(columns, row.get("seed_version"))?;
        Ok(Some(doc))
    }

    async fn upsert(&self, user_id: Uuid, doc: &DashboardDocument) -> Result<()> {
        let start = Instant::now();
        let mut columns = document_to_columns(doc)?.into_iter().map(Json);
        let mut next = || columns.next().unwrap_or(Json(JsonValue::Null));

        sqlx::query(
            r#"
            INSERT INTO user_dashboard_data (
                user_id, courses, calendar_events, mind_space_items, timetable, files, grades,
                semesters, property_definitions, seed_version, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                courses = EXCLUDED.courses,
                calendar_events = EXCLUDED.calendar_events,
                mind_space_items = EXCLUDED.mind_space_items,
                timetable = EXCLUDED.timetable,
                files = EXCLUDED.files,
                grades = EXCLUDED.grades,
                semesters = EXCLUDED.semesters,
                property_definitions = EXCLUDED.property_definitions,
                seed_version = EXCLUDED.seed_version,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(next())
        .bind(doc.seed_version.map(|v| v as i32))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "dashboard",
            op = "upsert",
            user_id = %user_id,
            item_count = doc.courses.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Dashboard document saved"
        );
        Ok(())
    }
}
