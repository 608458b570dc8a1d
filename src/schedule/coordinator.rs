use chrono::{DateTime, Duration, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{conflict, timeline};
use crate::{
    db,
    error::{BookingError, ResourceKind},
    models::{AppointmentRow, AppointmentStatus, ServiceRow},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub shop_id: String,
    pub client_id: String,
    pub service_id: String,
    pub staff_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub appointment_id: String,
    pub start_time: DateTime<Utc>,
    pub staff_id: Option<String>,
}

/// Books an appointment: resolves the service, derives the end time from its
/// duration, and inserts the row only if the interval is free on the staff
/// member's timeline. The conflict check and the insert happen under the
/// staff member's lock inside one transaction, so of two concurrent
/// overlapping requests for the same staff exactly one succeeds. Bookings
/// without a staff member skip the check; unassigned capacity is unbounded.
pub async fn book(
    state: &AppState,
    request: BookingRequest,
) -> Result<AppointmentRow, BookingError> {
    let service = resolve_service(&state.db, &request.service_id, &request.shop_id).await?;
    if service.duration_minutes <= 0 {
        return Err(BookingError::Validation(
            "Service duration must be positive".to_string(),
        ));
    }
    let auto_confirm = shop_auto_confirm(&state.db, &request.shop_id).await?;
    if let Some(staff_id) = &request.staff_id {
        ensure_staff_bookable(&state.db, staff_id, &request.shop_id).await?;
    }

    let end_time = request.start_time + Duration::minutes(service.duration_minutes);
    let now = Utc::now();
    let appointment_id = db::new_id();
    let status = if auto_confirm {
        AppointmentStatus::Confirmed
    } else {
        AppointmentStatus::Pending
    };
    let confirmed_at = auto_confirm.then_some(now);

    match &request.staff_id {
        Some(staff_id) => {
            let lock = state.staff_locks.lock_for(staff_id);
            let _guard = lock.lock().await;

            let mut tx = state.db.begin().await?;
            let slots = timeline::booked_slots(&mut *tx, staff_id).await?;
            if conflict::has_conflict(&slots, request.start_time, end_time, None) {
                // Dropping the transaction rolls back; nothing was written.
                return Err(BookingError::SlotUnavailable);
            }
            insert_appointment(
                &mut tx,
                &appointment_id,
                &request,
                end_time,
                status,
                service.base_price_cents,
                now,
                confirmed_at,
            )
            .await?;
            tx.commit().await?;
        }
        None => {
            let mut tx = state.db.begin().await?;
            insert_appointment(
                &mut tx,
                &appointment_id,
                &request,
                end_time,
                status,
                service.base_price_cents,
                now,
                confirmed_at,
            )
            .await?;
            tx.commit().await?;
        }
    }

    db::log_activity(
        &state.db,
        "appointment_created",
        &format!(
            "New {} appointment for client {}.",
            status, request.client_id
        ),
        Some(&appointment_id),
    )
    .await;

    db::fetch_appointment(&state.db, &appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))
}

/// Moves an appointment to a new start time and optionally a new staff
/// member, keeping its booked duration. The conflict check excludes the
/// appointment's own interval, so moving to its current time always
/// succeeds. The status falls back to pending; a reschedule is never
/// auto-confirmed.
pub async fn reschedule(
    state: &AppState,
    request: RescheduleRequest,
) -> Result<AppointmentRow, BookingError> {
    let current = db::fetch_appointment(&state.db, &request.appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))?;
    if current.status.is_terminal() {
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: AppointmentStatus::Pending,
        });
    }

    if let Some(staff_id) = &request.staff_id {
        ensure_staff_bookable(&state.db, staff_id, &current.shop_id).await?;
    }
    let target_staff = request.staff_id.clone().or_else(|| current.staff_id.clone());

    let duration = current.end_time - current.start_time;
    let end_time = request.start_time + duration;

    match &target_staff {
        Some(staff_id) => {
            let lock = state.staff_locks.lock_for(staff_id);
            let _guard = lock.lock().await;

            let mut tx = state.db.begin().await?;
            let slots = timeline::booked_slots(&mut *tx, staff_id).await?;
            if conflict::has_conflict(
                &slots,
                request.start_time,
                end_time,
                Some(current.id.as_str()),
            ) {
                return Err(BookingError::SlotUnavailable);
            }
            apply_reschedule(&mut tx, &current.id, request.start_time, end_time, &target_staff)
                .await?;
            tx.commit().await?;
        }
        None => {
            let mut tx = state.db.begin().await?;
            apply_reschedule(&mut tx, &current.id, request.start_time, end_time, &target_staff)
                .await?;
            tx.commit().await?;
        }
    }

    db::log_activity(
        &state.db,
        "appointment_rescheduled",
        &format!("Appointment {} rescheduled.", current.id),
        Some(&current.id),
    )
    .await;

    db::fetch_appointment(&state.db, &current.id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))
}

async fn resolve_service(
    pool: &SqlitePool,
    service_id: &str,
    shop_id: &str,
) -> Result<ServiceRow, BookingError> {
    sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, shop_id, name, description, duration_minutes, base_price_cents,
                  is_active, display_order
           FROM services
           WHERE id = ? AND shop_id = ? AND is_active = 1"#,
    )
    .bind(service_id)
    .bind(shop_id)
    .fetch_optional(pool)
    .await?
    .ok_or(BookingError::NotFound(ResourceKind::Service))
}

async fn shop_auto_confirm(pool: &SqlitePool, shop_id: &str) -> Result<bool, BookingError> {
    let flag = sqlx::query_scalar::<_, i64>(
        "SELECT auto_confirm_bookings FROM shops WHERE id = ? AND is_active = 1",
    )
    .bind(shop_id)
    .fetch_optional(pool)
    .await?
    .ok_or(BookingError::NotFound(ResourceKind::Shop))?;
    Ok(flag != 0)
}

async fn ensure_staff_bookable(
    pool: &SqlitePool,
    staff_id: &str,
    shop_id: &str,
) -> Result<(), BookingError> {
    let found = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM staff
           WHERE id = ? AND shop_id = ? AND is_active = 1 AND accepts_bookings = 1"#,
    )
    .bind(staff_id)
    .bind(shop_id)
    .fetch_one(pool)
    .await?;
    if found == 0 {
        return Err(BookingError::NotFound(ResourceKind::Staff));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_appointment(
    tx: &mut Transaction<'_, Sqlite>,
    appointment_id: &str,
    request: &BookingRequest,
    end_time: DateTime<Utc>,
    status: AppointmentStatus,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO appointments
           (id, shop_id, client_id, service_id, staff_id, start_time, end_time,
            status, total_price_cents, notes, created_at, confirmed_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(appointment_id)
    .bind(&request.shop_id)
    .bind(&request.client_id)
    .bind(&request.service_id)
    .bind(&request.staff_id)
    .bind(request.start_time)
    .bind(end_time)
    .bind(status)
    .bind(total_price_cents)
    .bind(&request.notes)
    .bind(created_at)
    .bind(confirmed_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn apply_reschedule(
    tx: &mut Transaction<'_, Sqlite>,
    appointment_id: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    staff_id: &Option<String>,
) -> Result<(), BookingError> {
    // The status predicate re-validates under the write: a cancel (or other
    // terminal transition) committed after the initial fetch must not be
    // overwritten.
    let updated = sqlx::query(
        r#"UPDATE appointments
           SET start_time = ?, end_time = ?, staff_id = ?,
               status = ?, confirmed_at = NULL
           WHERE id = ? AND status IN ('pending', 'confirmed')"#,
    )
    .bind(start_time)
    .bind(end_time)
    .bind(staff_id)
    .bind(AppointmentStatus::Pending)
    .bind(appointment_id)
    .execute(&mut **tx)
    .await?;
    if updated.rows_affected() == 0 {
        let from = sqlx::query_scalar::<_, AppointmentStatus>(
            "SELECT status FROM appointments WHERE id = ?",
        )
        .bind(appointment_id)
        .fetch_one(&mut **tx)
        .await?;
        return Err(BookingError::InvalidTransition {
            from,
            to: AppointmentStatus::Pending,
        });
    }
    Ok(())
}
