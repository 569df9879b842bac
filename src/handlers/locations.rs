use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;
use sqlx::Row;

use crate::error::{ApiError, ApiResult};
use crate::i18n::{self, Message};
use crate::models::restrictions::LOCATION_NAME_MAX_LEN;
use crate::models::Location;
use crate::state::AppState;
use crate::validation::{FieldErrors, FieldKind, FieldRule, Mode, Schema};

static LOCATION_RULES: [FieldRule; 1] = [FieldRule::required(
    "name",
    FieldKind::Text { max_len: LOCATION_NAME_MAX_LEN, allow_blank: false },
)];
static LOCATION_SCHEMA: Schema = Schema::new(&LOCATION_RULES);

pub async fn list_locations(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let rows = sqlx::query("SELECT id, name FROM locations ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<Location> = rows
        .into_iter()
        .map(|r| Location {
            id: r.get::<i64, _>("id"),
            name: r.get::<String, _>("name"),
        })
        .collect();
    Ok(HttpResponse::Ok().json(items))
}

pub async fn create_location(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let pool = &state.pool;

    let (fields, mut errors) = LOCATION_SCHEMA.validate(&body, Mode::Create, locale);
    errors.into_result()?;

    let Some(name) = fields.text("name") else {
        return Err(ApiError::BadRequest(Message::InvalidInput.render(locale)));
    };
    // Duplicate names are reported by the unique index, not a prior lookup.
    let result = sqlx::query("INSERT INTO locations (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        let mut errors = FieldErrors::new(locale);
        errors.add("name", Message::AlreadyExists);
        return Err(ApiError::Validation(errors));
    }
    log::info!("location {:?} created", name);

    Ok(HttpResponse::Created().json(Location {
        id: result.last_insert_rowid(),
        name: name.to_string(),
    }))
}
