use std::collections::HashMap;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite, SqlitePool};

use crate::error::{ApiError, ApiResult};
use crate::handlers::filters::ColivingFilter;
use crate::i18n::{self, Message};
use crate::models::restrictions::{
    ABOUT_MAX_LEN, FILE_ID_MAX_LEN, LOCATION_NAME_MAX_LEN, PRICE_MAX, PRICE_MIN,
};
use crate::models::{Coliving, ColivingImage, RoomType};
use crate::state::AppState;
use crate::validation::{FieldKind, FieldRule, Mode, Schema};

const LOCATION_KIND: FieldKind = FieldKind::Text { max_len: LOCATION_NAME_MAX_LEN, allow_blank: false };
const PRICE_KIND: FieldKind = FieldKind::Integer { min: PRICE_MIN, max: PRICE_MAX };
const ROOM_TYPE_KIND: FieldKind = FieldKind::Choice(&RoomType::NAMES);
const ABOUT_KIND: FieldKind = FieldKind::Text { max_len: ABOUT_MAX_LEN, allow_blank: true };

static CREATE_RULES: [FieldRule; 6] = [
    FieldRule::required("host", FieldKind::Integer { min: 1, max: i64::MAX }),
    FieldRule::required("location", LOCATION_KIND),
    FieldRule::required("price", PRICE_KIND),
    FieldRule::required("room_type", ROOM_TYPE_KIND),
    FieldRule::optional("about", ABOUT_KIND).nullable(),
    FieldRule::optional("is_visible", FieldKind::Boolean),
];
static CREATE_SCHEMA: Schema = Schema::new(&CREATE_RULES);

// The host is fixed once the listing exists.
static UPDATE_RULES: [FieldRule; 5] = [
    FieldRule::optional("location", LOCATION_KIND),
    FieldRule::optional("price", PRICE_KIND),
    FieldRule::optional("room_type", ROOM_TYPE_KIND),
    FieldRule::optional("about", ABOUT_KIND).nullable(),
    FieldRule::optional("is_visible", FieldKind::Boolean),
];
static UPDATE_SCHEMA: Schema = Schema::new(&UPDATE_RULES);

static IMAGE_RULES: [FieldRule; 1] = [FieldRule::required(
    "file_id",
    FieldKind::Text { max_len: FILE_ID_MAX_LEN, allow_blank: false },
)];
static IMAGE_SCHEMA: Schema = Schema::new(&IMAGE_RULES);

const SELECT_COLIVINGS: &str = "SELECT c.id, u.telegram_id AS host, l.name AS location, c.price, c.room_type, c.about, c.is_visible
     FROM colivings c
     JOIN telegram_users u ON u.id = c.host_id
     JOIN locations l ON l.id = c.location_id
     WHERE 1 = 1";

pub async fn list_colivings(
    query: web::Query<HashMap<String, String>>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let filter = ColivingFilter::from_query(&query);
    let pool = &state.pool;

    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLIVINGS);
    filter.push_conditions(&mut qb);
    qb.push(" ORDER BY c.id");

    let rows = qb.build().fetch_all(pool).await?;
    let mut colivings = rows
        .iter()
        .map(coliving_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    attach_images(pool, &mut colivings).await?;

    Ok(HttpResponse::Ok().json(colivings))
}

pub async fn get_coliving(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let id = path.into_inner();

    match fetch_coliving(&state.pool, id).await? {
        Some(coliving) => Ok(HttpResponse::Ok().json(coliving)),
        None => Err(ApiError::NotFound(Message::ColivingNotFound.render(locale))),
    }
}

pub async fn create_coliving(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let pool = &state.pool;

    let (fields, mut errors) = CREATE_SCHEMA.validate(&body, Mode::Create, locale);

    let mut host_id = None;
    if let Some(telegram_id) = fields.int("host") {
        host_id = user_pk(pool, telegram_id).await?;
        if host_id.is_none() {
            errors.add("host", Message::DoesNotExist(telegram_id.to_string()));
        }
    }
    let mut location_id = None;
    if let Some(name) = fields.text("location") {
        location_id = location_pk(pool, name).await?;
        if location_id.is_none() {
            errors.add("location", Message::DoesNotExist(name.to_string()));
        }
    }
    if !errors.is_empty() {
        log::debug!("rejected coliving create: {:?}", errors);
    }
    errors.into_result()?;

    let (Some(host_id), Some(location_id), Some(price), Some(room_type)) = (
        host_id,
        location_id,
        fields.int("price"),
        fields.text("room_type"),
    ) else {
        return Err(ApiError::BadRequest(Message::InvalidInput.render(locale)));
    };
    let about = fields.nullable_text("about").flatten();
    let is_visible = fields.bool("is_visible").unwrap_or(true);

    let result = sqlx::query(
        "INSERT INTO colivings (host_id, location_id, price, room_type, about, is_visible)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(host_id)
    .bind(location_id)
    .bind(price)
    .bind(room_type)
    .bind(about)
    .bind(is_visible)
    .execute(pool)
    .await?;

    let id = result.last_insert_rowid();
    log::info!("coliving {} created by host {}", id, host_id);

    let coliving = fetch_coliving(pool, id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
    Ok(HttpResponse::Created().json(coliving))
}

pub async fn update_coliving(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let id = path.into_inner();
    let pool = &state.pool;

    if !coliving_exists(pool, id).await? {
        return Err(ApiError::NotFound(Message::ColivingNotFound.render(locale)));
    }

    let (fields, mut errors) = UPDATE_SCHEMA.validate(&body, Mode::Partial, locale);

    let mut location_id = None;
    if let Some(name) = fields.text("location") {
        location_id = location_pk(pool, name).await?;
        if location_id.is_none() {
            errors.add("location", Message::DoesNotExist(name.to_string()));
        }
    }
    if !errors.is_empty() {
        log::debug!("rejected coliving {} update: {:?}", id, errors);
    }
    errors.into_result()?;

    if !fields.is_empty() {
        // `id = id` anchors the list so every assignment can lead with a comma.
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE colivings SET id = id");
        if let Some(location_id) = location_id {
            qb.push(", location_id = ").push_bind(location_id);
        }
        if let Some(price) = fields.int("price") {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(room_type) = fields.text("room_type") {
            qb.push(", room_type = ").push_bind(room_type.to_string());
        }
        if let Some(about) = fields.nullable_text("about") {
            qb.push(", about = ").push_bind(about.map(str::to_string));
        }
        if let Some(is_visible) = fields.bool("is_visible") {
            qb.push(", is_visible = ").push_bind(is_visible);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.build().execute(pool).await?;
        log::info!("coliving {} updated", id);
    }

    match fetch_coliving(pool, id).await? {
        Some(coliving) => Ok(HttpResponse::Ok().json(coliving)),
        None => Err(ApiError::NotFound(Message::ColivingNotFound.render(locale))),
    }
}

pub async fn delete_coliving(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let id = path.into_inner();

    let result = sqlx::query("DELETE FROM colivings WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(Message::ColivingNotFound.render(locale)));
    }
    log::info!("coliving {} deleted", id);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn add_image(
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let locale = i18n::detect_locale(&req);
    let id = path.into_inner();
    let pool = &state.pool;

    if !coliving_exists(pool, id).await? {
        return Err(ApiError::NotFound(Message::ColivingNotFound.render(locale)));
    }

    let (fields, errors) = IMAGE_SCHEMA.validate(&body, Mode::Create, locale);
    errors.into_result()?;
    let Some(file_id) = fields.text("file_id") else {
        return Err(ApiError::BadRequest(Message::InvalidInput.render(locale)));
    };

    sqlx::query("INSERT INTO coliving_images (coliving_id, file_id) VALUES (?, ?)")
        .bind(id)
        .bind(file_id)
        .execute(pool)
        .await?;

    let coliving = fetch_coliving(pool, id)
        .await?
        .ok_or(ApiError::Database(sqlx::Error::RowNotFound))?;
    Ok(HttpResponse::Created().json(coliving))
}

pub(crate) async fn coliving_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(1) FROM colivings WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

async fn fetch_coliving(pool: &SqlitePool, id: i64) -> Result<Option<Coliving>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLIVINGS);
    qb.push(" AND c.id = ").push_bind(id);

    let Some(row) = qb.build().fetch_optional(pool).await? else {
        return Ok(None);
    };
    let mut colivings = vec![coliving_from_row(&row)?];
    attach_images(pool, &mut colivings).await?;
    Ok(colivings.pop())
}

async fn user_pk(pool: &SqlitePool, telegram_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM telegram_users WHERE telegram_id = ? LIMIT 1")
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
}

async fn location_pk(pool: &SqlitePool, name: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM locations WHERE name = ? LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

fn coliving_from_row(row: &SqliteRow) -> Result<Coliving, sqlx::Error> {
    let room_type = row
        .get::<String, _>("room_type")
        .parse::<RoomType>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Coliving {
        id: row.get::<i64, _>("id"),
        host: row.get::<i64, _>("host"),
        location: row.get::<String, _>("location"),
        price: row.get::<i64, _>("price"),
        room_type,
        about: row.try_get::<Option<String>, _>("about").unwrap_or(None),
        is_visible: row.get::<bool, _>("is_visible"),
        images: Vec::new(),
    })
}

async fn attach_images(pool: &SqlitePool, colivings: &mut [Coliving]) -> Result<(), sqlx::Error> {
    if colivings.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, coliving_id, file_id FROM coliving_images WHERE coliving_id IN (",
    );
    for (i, coliving) in colivings.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push_bind(coliving.id);
    }
    qb.push(") ORDER BY id");

    let rows = qb.build().fetch_all(pool).await?;
    let mut by_coliving: HashMap<i64, Vec<ColivingImage>> = HashMap::new();
    for row in rows {
        by_coliving
            .entry(row.get::<i64, _>("coliving_id"))
            .or_default()
            .push(ColivingImage {
                id: row.get::<i64, _>("id"),
                file_id: row.get::<String, _>("file_id"),
            });
    }

    for coliving in colivings.iter_mut() {
        if let Some(images) = by_coliving.remove(&coliving.id) {
            coliving.images = images;
        }
    }
    Ok(())
}
