use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteExecutor;

/// One booked interval on a staff member's timeline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookedSlot {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Loads the timeline for one staff member: every appointment still holding
/// its interval (pending or confirmed), ordered by start time. Cancelled,
/// completed, and no-show rows have released their slot and are excluded.
pub async fn booked_slots<'e, E>(
    executor: E,
    staff_id: &str,
) -> Result<Vec<BookedSlot>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, BookedSlot>(
        r#"SELECT id, start_time, end_time
           FROM appointments
           WHERE staff_id = ? AND status IN ('pending', 'confirmed')
           ORDER BY start_time"#,
    )
    .bind(staff_id)
    .fetch_all(executor)
    .await
}
