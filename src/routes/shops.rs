use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{BookingError, ResourceKind},
    models::{ServiceRow, ShopRow, StaffRow},
    state::AppState,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShopSummary {
    id: String,
    name: String,
    description: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    timezone: String,
    currency: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceResponse {
    id: String,
    name: String,
    description: Option<String>,
    duration: i64,
    price: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StaffResponse {
    id: String,
    name: String,
    bio: Option<String>,
    accepts_bookings: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShopDetail {
    id: String,
    name: String,
    description: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    timezone: String,
    currency: String,
    auto_confirm_bookings: bool,
    services: Vec<ServiceResponse>,
    staff: Vec<StaffResponse>,
    created_at: DateTime<Utc>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/shops").route(web::get().to(list_shops)))
        .service(web::resource("/shops/{id}").route(web::get().to(shop_detail)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn list_shops(state: web::Data<AppState>) -> Result<HttpResponse, BookingError> {
    let rows = sqlx::query_as::<_, ShopRow>(
        r#"SELECT id, name, description, phone, email, timezone, currency,
                  auto_confirm_bookings, is_active, created_at
           FROM shops
           WHERE is_active = 1
           ORDER BY created_at DESC"#,
    )
    .fetch_all(&state.db)
    .await?;

    let shops: Vec<ShopSummary> = rows
        .into_iter()
        .map(|shop| ShopSummary {
            id: shop.id,
            name: shop.name,
            description: shop.description,
            phone: shop.phone,
            email: shop.email,
            timezone: shop.timezone,
            currency: shop.currency,
            created_at: shop.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(shops))
}

async fn shop_detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BookingError> {
    let shop_id = path.into_inner();
    let shop = sqlx::query_as::<_, ShopRow>(
        r#"SELECT id, name, description, phone, email, timezone, currency,
                  auto_confirm_bookings, is_active, created_at
           FROM shops
           WHERE id = ? AND is_active = 1
           LIMIT 1"#,
    )
    .bind(&shop_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(BookingError::NotFound(ResourceKind::Shop))?;

    let services = sqlx::query_as::<_, ServiceRow>(
        r#"SELECT id, shop_id, name, description, duration_minutes, base_price_cents,
                  is_active, display_order
           FROM services
           WHERE shop_id = ? AND is_active = 1
           ORDER BY display_order, name"#,
    )
    .bind(&shop_id)
    .fetch_all(&state.db)
    .await?;

    let staff = sqlx::query_as::<_, StaffRow>(
        r#"SELECT id, shop_id, name, bio, is_active, accepts_bookings
           FROM staff
           WHERE shop_id = ? AND is_active = 1
           ORDER BY name"#,
    )
    .bind(&shop_id)
    .fetch_all(&state.db)
    .await?;

    Ok(HttpResponse::Ok().json(ShopDetail {
        id: shop.id,
        name: shop.name,
        description: shop.description,
        phone: shop.phone,
        email: shop.email,
        timezone: shop.timezone,
        currency: shop.currency,
        auto_confirm_bookings: shop.auto_confirm_bookings != 0,
        services: services
            .into_iter()
            .map(|service| ServiceResponse {
                id: service.id,
                name: service.name,
                description: service.description,
                duration: service.duration_minutes,
                price: service.base_price_cents,
            })
            .collect(),
        staff: staff
            .into_iter()
            .map(|member| StaffResponse {
                id: member.id,
                name: member.name,
                bio: member.bio,
                accepts_bookings: member.accepts_bookings != 0,
            })
            .collect(),
        created_at: shop.created_at,
    }))
}
