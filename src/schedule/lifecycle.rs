use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    db,
    error::{BookingError, ResourceKind},
    models::{AppointmentRow, AppointmentStatus},
};

/// The transition table. Everything not listed here is invalid, which makes
/// completed, cancelled, and no_show terminal.
pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed)
            | (Pending | Confirmed, Cancelled)
            | (Pending | Confirmed, Completed)
            | (Pending | Confirmed, NoShow)
    )
}

fn ensure_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), BookingError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from, to })
    }
}

/// Staff/owner confirmation of a pending appointment. Stamps `confirmed_at`.
pub async fn confirm(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<AppointmentRow, BookingError> {
    let current = db::fetch_appointment(pool, appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))?;
    ensure_transition(current.status, AppointmentStatus::Confirmed)?;

    let updated = sqlx::query(
        "UPDATE appointments SET status = ?, confirmed_at = ? WHERE id = ? AND status = ?",
    )
    .bind(AppointmentStatus::Confirmed)
    .bind(Utc::now())
    .bind(appointment_id)
    .bind(current.status)
    .execute(pool)
    .await?;
    if updated.rows_affected() == 0 {
        // Status changed under us; report against the stale view.
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: AppointmentStatus::Confirmed,
        });
    }

    db::log_activity(
        pool,
        "appointment_confirmed",
        &format!("Appointment {appointment_id} confirmed."),
        Some(appointment_id),
    )
    .await;

    refreshed(pool, appointment_id).await
}

/// Client cancellation. Stamps `cancelled_at` and the optional reason; the
/// vacated interval is immediately available for new bookings. The
/// appointment must belong to `client_id`, otherwise it is reported as not
/// found.
pub async fn cancel(
    pool: &SqlitePool,
    appointment_id: &str,
    client_id: &str,
    reason: Option<String>,
) -> Result<AppointmentRow, BookingError> {
    let current = db::fetch_appointment_for_client(pool, appointment_id, client_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))?;
    ensure_transition(current.status, AppointmentStatus::Cancelled)?;

    let updated = sqlx::query(
        r#"UPDATE appointments
           SET status = ?, cancelled_at = ?, cancellation_reason = ?
           WHERE id = ? AND status = ?"#,
    )
    .bind(AppointmentStatus::Cancelled)
    .bind(Utc::now())
    .bind(&reason)
    .bind(appointment_id)
    .bind(current.status)
    .execute(pool)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: AppointmentStatus::Cancelled,
        });
    }

    db::log_activity(
        pool,
        "appointment_cancelled",
        &format!("Appointment {appointment_id} cancelled."),
        Some(appointment_id),
    )
    .await;

    refreshed(pool, appointment_id).await
}

/// Marks the appointment done. Stamps `completed_at`; notes, when provided,
/// replace the stored ones. Whether the start time has elapsed is shop
/// policy, not enforced here.
pub async fn complete(
    pool: &SqlitePool,
    appointment_id: &str,
    notes: Option<String>,
) -> Result<AppointmentRow, BookingError> {
    let current = db::fetch_appointment(pool, appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))?;
    ensure_transition(current.status, AppointmentStatus::Completed)?;

    let updated = sqlx::query(
        r#"UPDATE appointments
           SET status = ?, completed_at = ?, notes = COALESCE(?, notes)
           WHERE id = ? AND status = ?"#,
    )
    .bind(AppointmentStatus::Completed)
    .bind(Utc::now())
    .bind(&notes)
    .bind(appointment_id)
    .bind(current.status)
    .execute(pool)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: AppointmentStatus::Completed,
        });
    }

    db::log_activity(
        pool,
        "appointment_completed",
        &format!("Appointment {appointment_id} completed."),
        Some(appointment_id),
    )
    .await;

    refreshed(pool, appointment_id).await
}

/// Records that the client never showed up. Terminal, frees the interval.
pub async fn mark_no_show(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<AppointmentRow, BookingError> {
    let current = db::fetch_appointment(pool, appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))?;
    ensure_transition(current.status, AppointmentStatus::NoShow)?;

    let updated = sqlx::query("UPDATE appointments SET status = ? WHERE id = ? AND status = ?")
        .bind(AppointmentStatus::NoShow)
        .bind(appointment_id)
        .bind(current.status)
        .execute(pool)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: AppointmentStatus::NoShow,
        });
    }

    db::log_activity(
        pool,
        "appointment_no_show",
        &format!("Appointment {appointment_id} marked as no-show."),
        Some(appointment_id),
    )
    .await;

    refreshed(pool, appointment_id).await
}

async fn refreshed(
    pool: &SqlitePool,
    appointment_id: &str,
) -> Result<AppointmentRow, BookingError> {
    db::fetch_appointment(pool, appointment_id)
        .await?
        .ok_or(BookingError::NotFound(ResourceKind::Appointment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn pending_can_move_anywhere_but_stays_out_of_nothing() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Pending, Cancelled));
        assert!(can_transition(Pending, Completed));
        assert!(can_transition(Pending, NoShow));
    }

    #[test]
    fn confirmed_cannot_go_back_to_pending() {
        assert!(!can_transition(Confirmed, Pending));
        assert!(can_transition(Confirmed, Cancelled));
        assert!(can_transition(Confirmed, Completed));
        assert!(can_transition(Confirmed, NoShow));
    }

    #[test]
    fn terminal_states_are_immutable() {
        for from in [Completed, Cancelled, NoShow] {
            for to in [Pending, Confirmed, Completed, Cancelled, NoShow] {
                assert!(!can_transition(from, to), "{from} -> {to} must be invalid");
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        for status in [Pending, Confirmed, Completed, Cancelled, NoShow] {
            assert!(!can_transition(status, status));
        }
    }
}
