use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::BookingError,
    models::{AppointmentListRow, AppointmentRow, AppointmentStatus},
    schedule::{
        coordinator::{self, BookingRequest, RescheduleRequest},
        lifecycle,
    },
    state::AppState,
};

const CLIENT_HEADER: &str = "X-Client-Id";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppointmentPayload {
    shop_id: String,
    service_id: String,
    staff_id: Option<String>,
    start_time: DateTime<Utc>,
    notes: Option<String>,
}

#[derive(Deserialize, Default)]
struct CancelPayload {
    reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct CompletePayload {
    notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReschedulePayload {
    start_time: DateTime<Utc>,
    staff_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentResponse {
    id: String,
    shop_id: String,
    service_id: String,
    staff_id: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: AppointmentStatus,
    total_price: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
}

impl From<AppointmentRow> for AppointmentResponse {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            shop_id: row.shop_id,
            service_id: row.service_id,
            staff_id: row.staff_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            total_price: row.total_price_cents,
            notes: row.notes,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentSummary {
    id: String,
    shop_id: String,
    shop_name: String,
    service_id: String,
    service_name: String,
    duration: i64,
    staff_id: Option<String>,
    staff_name: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    status: AppointmentStatus,
    total_price: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/appointments")
            .route(web::get().to(list_appointments))
            .route(web::post().to(create_appointment)),
    )
    .service(web::resource("/appointments/{id}/cancel").route(web::patch().to(cancel_appointment)))
    .service(
        web::resource("/appointments/{id}/confirm").route(web::patch().to(confirm_appointment)),
    )
    .service(
        web::resource("/appointments/{id}/complete").route(web::patch().to(complete_appointment)),
    )
    .service(web::resource("/appointments/{id}/no-show").route(web::patch().to(no_show_appointment)))
    .service(
        web::resource("/appointments/{id}/reschedule")
            .route(web::patch().to(reschedule_appointment)),
    );
}

/// The caller's identity as issued by the external auth service.
fn client_id(req: &HttpRequest) -> Result<String, BookingError> {
    req.headers()
        .get(CLIENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .ok_or_else(|| BookingError::Validation(format!("{CLIENT_HEADER} header is required")))
}

fn normalize_staff(staff_id: Option<String>) -> Option<String> {
    staff_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

async fn list_appointments(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, BookingError> {
    let client = client_id(&req)?;
    let rows = sqlx::query_as::<_, AppointmentListRow>(
        r#"SELECT a.id, a.shop_id, sh.name AS shop_name,
                  a.service_id, s.name AS service_name, s.duration_minutes,
                  a.staff_id, st.name AS staff_name,
                  a.start_time, a.end_time, a.status, a.total_price_cents,
                  a.notes, a.created_at
           FROM appointments a
           JOIN services s ON a.service_id = s.id
           JOIN shops sh ON a.shop_id = sh.id
           LEFT JOIN staff st ON a.staff_id = st.id
           WHERE a.client_id = ?
           ORDER BY a.start_time DESC"#,
    )
    .bind(&client)
    .fetch_all(&state.db)
    .await?;

    let appointments: Vec<AppointmentSummary> = rows
        .into_iter()
        .map(|row| AppointmentSummary {
            id: row.id,
            shop_id: row.shop_id,
            shop_name: row.shop_name,
            service_id: row.service_id,
            service_name: row.service_name,
            duration: row.duration_minutes,
            staff_id: row.staff_id,
            staff_name: row.staff_name,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            total_price: row.total_price_cents,
            notes: row.notes,
            created_at: row.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(appointments))
}

async fn create_appointment(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<CreateAppointmentPayload>,
) -> Result<HttpResponse, BookingError> {
    let client = client_id(&req)?;
    let payload = payload.into_inner();

    let appointment = coordinator::book(
        &state,
        BookingRequest {
            shop_id: payload.shop_id,
            client_id: client,
            service_id: payload.service_id,
            staff_id: normalize_staff(payload.staff_id),
            start_time: payload.start_time,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(AppointmentResponse::from(appointment)))
}

async fn cancel_appointment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: Option<web::Json<CancelPayload>>,
) -> Result<HttpResponse, BookingError> {
    let client = client_id(&req)?;
    let appointment_id = path.into_inner();
    let reason = payload.map(web::Json::into_inner).unwrap_or_default().reason;

    let appointment = lifecycle::cancel(&state.db, &appointment_id, &client, reason).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

async fn confirm_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let appointment = lifecycle::confirm(&state.db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

async fn complete_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Option<web::Json<CompletePayload>>,
) -> Result<HttpResponse, BookingError> {
    let notes = payload.map(web::Json::into_inner).unwrap_or_default().notes;
    let appointment = lifecycle::complete(&state.db, &path.into_inner(), notes).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

async fn no_show_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let appointment = lifecycle::mark_no_show(&state.db, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

async fn reschedule_appointment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReschedulePayload>,
) -> Result<HttpResponse, BookingError> {
    let payload = payload.into_inner();
    let appointment = coordinator::reschedule(
        &state,
        RescheduleRequest {
            appointment_id: path.into_inner(),
            start_time: payload.start_time,
            staff_id: normalize_staff(payload.staff_id),
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}
