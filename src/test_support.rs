use std::str::FromStr;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::db;
use crate::models::restrictions::PRICE_MIN;
use crate::routes;
use crate::state::AppState;

pub const OWNER_1: i64 = 111;
pub const OWNER_2: i64 = 222;
pub const MSK: &str = "Москва";
pub const SPB: &str = "Санкт-Петербург";
pub const OWNER_1_ABOUT: &str = "Уютное пространство...";

pub struct SeededListings {
    pub msk_listing: i64,
    pub spb_listing: i64,
}

/// A single connection, so every query sees the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .unwrap();
    db::create_schema(&pool).await.unwrap();
    pool
}

pub fn test_app(
    pool: SqlitePool,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(AppState::new(pool)))
        .configure(routes::configure)
}

pub async fn insert_user(pool: &SqlitePool, telegram_id: i64) -> i64 {
    sqlx::query("INSERT INTO telegram_users (telegram_id) VALUES (?)")
        .bind(telegram_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_location(pool: &SqlitePool, name: &str) -> i64 {
    sqlx::query("INSERT INTO locations (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub async fn insert_coliving(
    pool: &SqlitePool,
    host_id: i64,
    location_id: i64,
    price: i64,
    about: Option<&str>,
) -> i64 {
    sqlx::query(
        "INSERT INTO colivings (host_id, location_id, price, room_type, about) VALUES (?, ?, ?, 'room', ?)",
    )
    .bind(host_id)
    .bind(location_id)
    .bind(price)
    .bind(about)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

/// Two hosts, each with one cheapest-room listing: 111 in Moscow and 222 in
/// Saint Petersburg.
pub async fn seed_listings(pool: &SqlitePool) -> SeededListings {
    let owner_1 = insert_user(pool, OWNER_1).await;
    let msk = insert_location(pool, MSK).await;
    let msk_listing = insert_coliving(pool, owner_1, msk, PRICE_MIN, Some(OWNER_1_ABOUT)).await;

    let owner_2 = insert_user(pool, OWNER_2).await;
    let spb = insert_location(pool, SPB).await;
    let spb_listing = insert_coliving(pool, owner_2, spb, PRICE_MIN, None).await;

    SeededListings { msk_listing, spb_listing }
}

/// `/colivings` with the pairs form-encoded into the query string.
pub fn colivings_uri(pairs: &[(&str, &str)]) -> String {
    let url = reqwest::Url::parse_with_params("http://localhost/colivings", pairs).unwrap();
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}
