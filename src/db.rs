use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

use crate::catalog;
use crate::error::StoreError;
use crate::models::{
    BodyMapSelection, Category, EmotionScale, Frequency, Location, Report, ReportDraft,
    ReportStatus, ReportUpdate, SafetyThermometer, Symbol, SymbolSelection,
};
use crate::store::ReportStore;

const REPORT_COLUMNS: &str = "id, student_id, student_name, symbols, body_map, emotion_level, \
     location, frequency, safety_level, status, teacher_notes, created_at";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads the built-in symbol catalog and location list. Safe to rerun.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    for (position, symbol) in catalog::symbols().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO incident_reports.symbols (id, label, category, position)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET label = EXCLUDED.label, category = EXCLUDED.category, position = EXCLUDED.position
            "#,
        )
        .bind(&symbol.id)
        .bind(&symbol.label)
        .bind(symbol.category.as_str())
        .bind(position as i32)
        .execute(pool)
        .await?;
    }

    for (position, location) in catalog::default_locations().iter().enumerate() {
        upsert_location(pool, location, position as i32).await?;
    }

    Ok(())
}

async fn upsert_location(pool: &PgPool, location: &Location, position: i32) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO incident_reports.locations (id, name, icon, position)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, icon = EXCLUDED.icon, position = EXCLUDED.position
        "#,
    )
    .bind(&location.id)
    .bind(&location.name)
    .bind(&location.icon)
    .bind(position)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn import_locations_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: String,
        name: String,
        icon: String,
        position: Option<i32>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut imported = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let location = Location {
            id: row.id.trim().to_string(),
            name: row.name,
            icon: row.icon,
        };
        let position = row.position.unwrap_or(index as i32);
        if upsert_location(pool, &location, position).await? > 0 {
            imported += 1;
        }
    }

    Ok(imported)
}

/// Postgres-backed report store.
#[derive(Debug, Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn decode_level(value: i16, field: &str) -> Result<u8, StoreError> {
    u8::try_from(value).map_err(|_| StoreError::Decode(format!("{field} level {value}")))
}

fn report_from_row(row: &PgRow) -> Result<Report, StoreError> {
    let decode = |err: crate::error::ValidationError| StoreError::Decode(err.to_string());

    let Json(symbols): Json<Vec<SymbolSelection>> = row.try_get("symbols")?;
    let body_map: Option<Json<Vec<BodyMapSelection>>> = row.try_get("body_map")?;
    let Json(location): Json<Location> = row.try_get("location")?;
    let emotion_level = decode_level(row.try_get("emotion_level")?, "emotion")?;
    let safety_level = decode_level(row.try_get("safety_level")?, "safety")?;
    let frequency: String = row.try_get("frequency")?;
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;

    Ok(Report {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        student_name: row.try_get("student_name")?,
        symbols,
        body_map: body_map.map(|Json(points)| points),
        emotion: EmotionScale::from_level(emotion_level).map_err(decode)?,
        location,
        frequency: frequency.parse::<Frequency>().map_err(decode)?,
        safety: SafetyThermometer::from_level(safety_level).map_err(decode)?,
        status: status.parse::<ReportStatus>().map_err(decode)?,
        teacher_notes: row.try_get("teacher_notes")?,
        created_at,
    })
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn list_locations(&self) -> Result<Vec<Location>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, icon FROM incident_reports.locations ORDER BY position, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut locations = Vec::with_capacity(rows.len());
        for row in rows {
            locations.push(Location {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                icon: row.try_get("icon")?,
            });
        }
        Ok(locations)
    }

    async fn list_symbols_by_category(&self, category: Category) -> Result<Vec<Symbol>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, label FROM incident_reports.symbols WHERE category = $1 ORDER BY position, id",
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut symbols = Vec::with_capacity(rows.len());
        for row in rows {
            symbols.push(Symbol {
                id: row.try_get("id")?,
                label: row.try_get("label")?,
                category,
            });
        }
        Ok(symbols)
    }

    async fn create_report(&self, draft: &ReportDraft) -> Result<Report, StoreError> {
        draft.validate()?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO incident_reports.reports
            (id, student_id, student_name, symbols, body_map, emotion_level,
             location, frequency, safety_level, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id)
        .bind(&draft.student_id)
        .bind(&draft.student_name)
        .bind(Json(&draft.symbols))
        .bind(draft.body_map.as_ref().map(Json))
        .bind(i16::from(draft.emotion.level))
        .bind(Json(&draft.location))
        .bind(draft.frequency.as_str())
        .bind(i16::from(draft.safety.level))
        .bind(ReportStatus::Pending.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        info!(report_id = %id, student_id = %draft.student_id, "report stored");
        Ok(Report::from_draft(draft.clone(), id, created_at))
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM incident_reports.reports ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(report_from_row).collect()
    }

    async fn list_reports_for_student(&self, student_id: &str) -> Result<Vec<Report>, StoreError> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM incident_reports.reports \
             WHERE student_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(report_from_row).collect()
    }

    async fn update_report(&self, id: Uuid, update: &ReportUpdate) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE incident_reports.reports
            SET status = COALESCE($2, status),
                teacher_notes = COALESCE($3, teacher_notes)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.status.map(ReportStatus::as_str))
        .bind(update.teacher_notes.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        info!(report_id = %id, status = ?update.status, "report updated");
        Ok(())
    }
}
