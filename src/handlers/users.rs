use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::error::{ApiError, ApiResult};
use crate::handlers::colivings::coliving_exists;
use crate::i18n::{self, Locale, Message};
use crate::models::restrictions::NAME_MAX_LEN;
use crate::models::{CreateTelegramUserRequest, TelegramUser};
use crate::state::AppState;
use crate::validation::{FieldErrors, FieldKind, FieldRule, Mode, Schema};

static RESIDENCE_RULES: [FieldRule; 1] = [FieldRule::optional(
    "residence",
    FieldKind::Integer { min: 1, max: i64::MAX },
)
.nullable()];
static RESIDENCE_SCHEMA: Schema = Schema::new(&RESIDENCE_RULES);

const SELECT_USER: &str = "SELECT telegram_id, username, first_name, last_name, residence_id, created_at
     FROM telegram_users
     WHERE telegram_id = ?
     LIMIT 1";

pub async fn create_or_get_user(
    req: HttpRequest,
    data: web::Json<CreateTelegramUserRequest>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let user_req = data.into_inner();
    let pool = &state.pool;

    if let Some(existing) = fetch_user(pool, user_req.telegram_id).await? {
        return Ok(HttpResponse::Ok().json(existing));
    }

    let mut errors = FieldErrors::new(locale);
    if user_req.telegram_id <= 0 {
        errors.add("telegram_id", Message::MinValue(1));
    }
    let username = normalize("username", user_req.username.as_deref(), &mut errors);
    let first_name = normalize("first_name", user_req.first_name.as_deref(), &mut errors);
    let last_name = normalize("last_name", user_req.last_name.as_deref(), &mut errors);
    errors.into_result()?;

    let result = sqlx::query(
        "INSERT INTO telegram_users (telegram_id, username, first_name, last_name)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(telegram_id) DO NOTHING",
    )
    .bind(user_req.telegram_id)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .execute(pool)
    .await?;

    let user = fetch_user(pool, user_req.telegram_id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
    if result.rows_affected() == 0 {
        return Ok(HttpResponse::Ok().json(user));
    }
    log::info!("registered telegram user {}", user_req.telegram_id);
    Ok(HttpResponse::Created().json(user))
}

pub async fn get_user(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let telegram_id = path.into_inner();

    match fetch_user(&state.pool, telegram_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound(Message::UserNotFound.render(locale))),
    }
}

/// Links the user to the coliving they live in, or unlinks them on `null`.
pub async fn update_residence(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let telegram_id = path.into_inner();
    let pool = &state.pool;

    if fetch_user(pool, telegram_id).await?.is_none() {
        return Err(ApiError::NotFound(Message::UserNotFound.render(locale)));
    }

    let (fields, mut errors) = RESIDENCE_SCHEMA.validate(&body, Mode::Partial, locale);
    let residence = fields.nullable_int("residence");
    if let Some(Some(coliving_id)) = residence {
        if !coliving_exists(pool, coliving_id).await? {
            errors.add("residence", Message::DoesNotExist(coliving_id.to_string()));
        }
    }
    if !errors.is_empty() {
        log::debug!("rejected residence update for {}: {:?}", telegram_id, errors);
    }
    errors.into_result()?;

    if let Some(residence) = residence {
        store_residence(pool, telegram_id, residence, locale).await?;
        log::info!("user {} residence set to {:?}", telegram_id, residence);
    }

    match fetch_user(pool, telegram_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound(Message::UserNotFound.render(locale))),
    }
}

/// The coliving may be deleted after it was looked up; the foreign key then
/// rejects the update and it is reported against `residence`.
async fn store_residence(
    pool: &SqlitePool,
    telegram_id: i64,
    residence: Option<i64>,
    locale: Locale,
) -> ApiResult<()> {
    let result = sqlx::query("UPDATE telegram_users SET residence_id = ? WHERE telegram_id = ?")
        .bind(residence)
        .bind(telegram_id)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => {
            let mut errors = FieldErrors::new(locale);
            let missing = residence.map(|id| id.to_string()).unwrap_or_default();
            errors.add("residence", Message::DoesNotExist(missing));
            Err(ApiError::Validation(errors))
        }
        Err(e) => Err(e.into()),
    }
}

// SQLITE_CONSTRAINT_FOREIGNKEY
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("787") || db.message().contains("FOREIGN KEY constraint failed")
        }
        _ => false,
    }
}

async fn fetch_user(pool: &SqlitePool, telegram_id: i64) -> Result<Option<TelegramUser>, sqlx::Error> {
    let row = sqlx::query(SELECT_USER)
        .bind(telegram_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

fn user_from_row(r: &SqliteRow) -> TelegramUser {
    TelegramUser {
        telegram_id: r.get::<i64, _>("telegram_id"),
        username: r.try_get::<Option<String>, _>("username").unwrap_or(None),
        first_name: r.try_get::<Option<String>, _>("first_name").unwrap_or(None),
        last_name: r.try_get::<Option<String>, _>("last_name").unwrap_or(None),
        residence: r.try_get::<Option<i64>, _>("residence_id").unwrap_or(None),
        created_at: r.get::<String, _>("created_at"),
    }
}

// Empty strings are stored as NULL.
fn normalize(field: &str, value: Option<&str>, errors: &mut FieldErrors) -> Option<String> {
    let value = value.map(str::trim).filter(|s| !s.is_empty())?;
    if value.chars().count() > NAME_MAX_LEN {
        errors.add(field, Message::MaxLength(NAME_MAX_LEN));
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use futures_util::future;
    use serde_json::{json, Value};

    use super::store_residence;
    use crate::error::ApiError;
    use crate::i18n::Locale;
    use crate::test_support::{self, SeededListings, OWNER_1};

    #[actix_web::test]
    async fn attach_user_to_coliving() {
        let pool = test_support::test_pool().await;
        let SeededListings { msk_listing, .. } = test_support::seed_listings(&pool).await;
        let app = test::init_service(test_support::test_app(pool)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/users/{}", OWNER_1))
            .set_json(json!({"residence": msk_listing}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/users/{}", OWNER_1)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["residence"], json!(msk_listing));
    }

    #[actix_web::test]
    async fn detach_user_from_coliving() {
        let pool = test_support::test_pool().await;
        let SeededListings { msk_listing, .. } = test_support::seed_listings(&pool).await;
        sqlx::query("UPDATE telegram_users SET residence_id = ? WHERE telegram_id = ?")
            .bind(msk_listing)
            .bind(OWNER_1)
            .execute(&pool)
            .await
            .unwrap();
        let app = test::init_service(test_support::test_app(pool.clone())).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/users/{}", OWNER_1))
            .set_json(json!({"residence": null}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let residence = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT residence_id FROM telegram_users WHERE telegram_id = ?",
        )
        .bind(OWNER_1)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(residence, None);
    }

    #[actix_web::test]
    async fn update_with_unknown_telegram_id() {
        let pool = test_support::test_pool().await;
        test_support::seed_listings(&pool).await;
        let app = test::init_service(test_support::test_app(pool)).await;

        let req = test::TestRequest::patch()
            .uri("/users/999")
            .set_json(json!({"residence": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn update_with_unknown_residence_id() {
        let pool = test_support::test_pool().await;
        test_support::seed_listings(&pool).await;
        let app = test::init_service(test_support::test_app(pool)).await;

        for residence in [json!(999), json!("abc"), json!(true)] {
            let req = test::TestRequest::patch()
                .uri(&format!("/users/{}", OWNER_1))
                .set_json(json!({"residence": residence}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "residence {}", residence);
        }
    }

    #[actix_web::test]
    async fn deleting_coliving_clears_residence() {
        let pool = test_support::test_pool().await;
        let SeededListings { msk_listing, .. } = test_support::seed_listings(&pool).await;
        let app = test::init_service(test_support::test_app(pool)).await;

        let req = test::TestRequest::patch()
            .uri(&format!("/users/{}", OWNER_1))
            .set_json(json!({"residence": msk_listing}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/colivings/{}", msk_listing))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri(&format!("/users/{}", OWNER_1)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["residence"], Value::Null);
    }

    #[actix_web::test]
    async fn residence_removed_before_update_is_a_field_error() {
        let pool = test_support::test_pool().await;
        test_support::seed_listings(&pool).await;

        let result = store_residence(&pool, OWNER_1, Some(999), Locale::En).await;
        match result {
            Err(ApiError::Validation(errors)) => assert_eq!(
                errors.get("residence"),
                Some(&["Object \"999\" does not exist.".to_string()][..])
            ),
            other => panic!("expected a residence field error, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn concurrent_registration_returns_the_same_user() {
        let pool = test_support::test_pool().await;
        let app = test::init_service(test_support::test_app(pool.clone())).await;
        let payload = json!({"telegram_id": 777, "first_name": "Лёша"});

        let first = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let second = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let (first, second) =
            future::join(test::call_service(&app, first), test::call_service(&app, second)).await;

        let mut statuses = vec![first.status(), second.status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CREATED]);

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM telegram_users WHERE telegram_id = 777")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn create_or_get_user() {
        let pool = test_support::test_pool().await;
        let app = test::init_service(test_support::test_app(pool)).await;
        let payload = json!({"telegram_id": 555, "username": "", "first_name": "Аня"});

        let req = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["username"], Value::Null);
        assert_eq!(body["first_name"], json!("Аня"));
        assert_eq!(body["residence"], Value::Null);

        let req = test::TestRequest::post().uri("/users").set_json(&payload).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/users/556").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
