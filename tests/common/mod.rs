#![allow(dead_code)]

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use shearbook::{db, schedule::coordinator::BookingRequest, state::AppState};

pub const SHOP: &str = "shop-main";
pub const SHOP_AUTO: &str = "shop-auto";
pub const SVC_CUT: &str = "svc-cut"; // 30 min
pub const SVC_GROOM: &str = "svc-groom"; // 60 min
pub const SVC_RETIRED: &str = "svc-retired"; // inactive
pub const SVC_AUTO: &str = "svc-auto"; // 30 min, auto-confirm shop
pub const STAFF_A: &str = "staff-a";
pub const STAFF_B: &str = "staff-b";
pub const STAFF_AUTO: &str = "staff-auto";
pub const STAFF_RETIRED: &str = "staff-retired";
pub const CLIENT: &str = "client-1";

pub async fn setup() -> AppState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    seed_catalog(&pool).await;
    AppState::new(pool)
}

async fn seed_catalog(pool: &SqlitePool) {
    let now = Utc::now();
    for (id, name, auto_confirm) in [(SHOP, "Fade District", 0), (SHOP_AUTO, "Quick Clips", 1)] {
        sqlx::query(
            r#"INSERT INTO shops
               (id, name, timezone, currency, auto_confirm_bookings, is_active, created_at)
               VALUES (?, ?, 'UTC', 'USD', ?, 1, ?)"#,
        )
        .bind(id)
        .bind(name)
        .bind(auto_confirm)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, shop, name, duration, price, active) in [
        (SVC_CUT, SHOP, "Signature Cut", 30_i64, 3000_i64, 1_i64),
        (SVC_GROOM, SHOP, "Full Grooming", 60, 6500, 1),
        (SVC_RETIRED, SHOP, "Hot Towel Shave", 25, 2000, 0),
        (SVC_AUTO, SHOP_AUTO, "Express Cut", 30, 2500, 1),
    ] {
        sqlx::query(
            r#"INSERT INTO services
               (id, shop_id, name, duration_minutes, base_price_cents, is_active, display_order)
               VALUES (?, ?, ?, ?, ?, ?, 0)"#,
        )
        .bind(id)
        .bind(shop)
        .bind(name)
        .bind(duration)
        .bind(price)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
    }

    for (id, shop, name, active) in [
        (STAFF_A, SHOP, "Marco Reyes", 1_i64),
        (STAFF_B, SHOP, "Jules Okafor", 1),
        (STAFF_AUTO, SHOP_AUTO, "Dana Voss", 1),
        (STAFF_RETIRED, SHOP, "Old Pete", 0),
    ] {
        sqlx::query(
            r#"INSERT INTO staff (id, shop_id, name, is_active, accepts_bookings)
               VALUES (?, ?, ?, ?, 1)"#,
        )
        .bind(id)
        .bind(shop)
        .bind(name)
        .bind(active)
        .execute(pool)
        .await
        .unwrap();
    }
}

/// A fixed test day so interval arithmetic reads as wall-clock times.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
}

pub fn booking(service: &str, staff: Option<&str>, start: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        shop_id: SHOP.to_string(),
        client_id: CLIENT.to_string(),
        service_id: service.to_string(),
        staff_id: staff.map(String::from),
        start_time: start,
        notes: None,
    }
}
