use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::AppointmentRow;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"));

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn fetch_appointment(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(
        r#"SELECT id, shop_id, client_id, service_id, staff_id, start_time, end_time,
                  status, total_price_cents, notes, created_at, confirmed_at,
                  completed_at, cancelled_at, cancellation_reason
           FROM appointments
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(appointment_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_appointment_for_client(
    pool: &SqlitePool,
    appointment_id: &str,
    client_id: &str,
) -> Result<Option<AppointmentRow>, sqlx::Error> {
    sqlx::query_as::<_, AppointmentRow>(
        r#"SELECT id, shop_id, client_id, service_id, staff_id, start_time, end_time,
                  status, total_price_cents, notes, created_at, confirmed_at,
                  completed_at, cancelled_at, cancellation_reason
           FROM appointments
           WHERE id = ? AND client_id = ?
           LIMIT 1"#,
    )
    .bind(appointment_id)
    .bind(client_id)
    .fetch_optional(pool)
    .await
}

/// Best-effort audit row. Failures are logged and swallowed; the audit trail
/// never fails a booking.
pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    appointment_id: Option<&str>,
) {
    let result = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, appointment_id)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now())
    .bind(appointment_id)
    .execute(pool)
    .await;
    if let Err(err) = result {
        log::warn!("Failed to record activity '{kind}': {err}");
    }
}

/// Seeds a demo shop with services and staff when SEED_DEMO=true and the
/// catalog is empty. Useful for local runs against a fresh database.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let seed = env::var("SEED_DEMO").unwrap_or_else(|_| "false".to_string());
    if seed != "true" {
        return Ok(());
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM shops")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let shop_id = new_id();
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO shops
           (id, name, description, phone, email, timezone, currency,
            auto_confirm_bookings, is_active, created_at)
           VALUES (?, ?, ?, ?, ?, 'UTC', 'USD', 0, 1, ?)"#,
    )
    .bind(&shop_id)
    .bind("Fade District")
    .bind("Walk in scruffy, walk out sharp.")
    .bind("+1 555 0100")
    .bind("hello@fadedistrict.example")
    .bind(now)
    .execute(pool)
    .await?;

    let services = [
        ("Signature Cut", 45_i64, 4500_i64),
        ("Fade & Line-Up", 35, 3800),
        ("Beard Sculpt", 25, 2500),
        ("Full Grooming", 60, 6500),
    ];
    for (order, (name, duration, price)) in services.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO services
               (id, shop_id, name, duration_minutes, base_price_cents, is_active, display_order)
               VALUES (?, ?, ?, ?, ?, 1, ?)"#,
        )
        .bind(new_id())
        .bind(&shop_id)
        .bind(name)
        .bind(duration)
        .bind(price)
        .bind(order as i64)
        .execute(pool)
        .await?;
    }

    for name in ["Marco Reyes", "Jules Okafor"] {
        sqlx::query(
            r#"INSERT INTO staff (id, shop_id, name, is_active, accepts_bookings)
               VALUES (?, ?, ?, 1, 1)"#,
        )
        .bind(new_id())
        .bind(&shop_id)
        .bind(name)
        .execute(pool)
        .await?;
    }

    log::info!("Seeded demo shop {shop_id}");
    Ok(())
}
