use actix_web::{web, HttpRequest, HttpResponse, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    auth::{new_id, require_admin},
    db::{self, log_activity},
    error::ApiError,
    filters::{self, CategoryFilter},
    models::RoomType,
    pricing,
    state::{AppState, CacheEvent},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateRoomPayload {
    #[validate(length(min = 1, message = "Room name is required"))]
    name: String,
    #[serde(rename = "type")]
    room_type: RoomType,
    #[validate(range(min = 0.01, message = "Price per night must be positive"))]
    price_per_night: f64,
    #[validate(range(min = 0.01, message = "Offer price must be positive"))]
    offer_price: Option<f64>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    capacity: i64,
    #[validate(range(min = 1, message = "Bed count must be at least 1"))]
    beds: i64,
    #[serde(default = "default_bed_type")]
    bed_type: String,
    #[serde(default)]
    amenities: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    is_available: bool,
    /// Base64 data URLs; decoded and stored inline.
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateRoomPayload {
    #[validate(length(min = 1, message = "Room name is required"))]
    name: String,
    #[serde(rename = "type")]
    room_type: RoomType,
    #[validate(range(min = 0.01, message = "Price per night must be positive"))]
    price_per_night: f64,
    #[validate(range(min = 0.01, message = "Offer price must be positive"))]
    offer_price: Option<f64>,
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    capacity: i64,
    #[validate(range(min = 1, message = "Bed count must be at least 1"))]
    beds: i64,
    #[serde(default = "default_bed_type")]
    bed_type: String,
    #[serde(default)]
    amenities: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_true")]
    is_available: bool,
    #[serde(default)]
    images_to_add: Vec<String>,
    #[serde(default)]
    images_to_delete: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(rename = "type")]
    room_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteQuery {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

fn default_bed_type() -> String {
    "Double".to_string()
}

fn default_true() -> bool {
    true
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/room")
            .service(
                web::resource("")
                    .route(web::get().to(list_rooms))
                    .route(web::post().to(create_room)),
            )
            .service(web::resource("/type/{room_type}").route(web::get().to(list_by_type)))
            .service(web::resource("/{id}/quote").route(web::get().to(quote_room)))
            .service(web::resource("/{id}/images/{image_id}").route(web::get().to(serve_image)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_room))
                    .route(web::patch().to(update_room))
                    .route(web::delete().to(delete_room)),
            ),
    );
}

async fn list_rooms(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let filter = parse_category(query.room_type.as_deref())?;
    let rooms = db::load_rooms(&state.db).await?;
    Ok(HttpResponse::Ok().json(filters::rooms_in_category(rooms, filter)))
}

async fn list_by_type(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let filter = parse_category(Some(path.as_str()))?;
    let rooms = db::load_rooms(&state.db).await?;
    let rooms = filters::rooms_in_category(rooms, filter);
    Ok(HttpResponse::Ok().json(json!({ "count": rooms.len(), "rooms": rooms })))
}

fn parse_category(value: Option<&str>) -> Result<CategoryFilter, ApiError> {
    match value {
        None => Ok(CategoryFilter::All),
        Some(raw) => CategoryFilter::parse(raw)
            .ok_or_else(|| ApiError::Validation(format!("Unknown room type {raw}"))),
    }
}

/// Booking-summary math for a prospective stay. Purely derived from the
/// room's rates and the date range; an inverted or same-day range clamps to
/// one night here instead of failing, because this feeds the summary panel
/// while the visitor is still editing dates.
async fn quote_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse, ApiError> {
    let room = db::load_room(&state.db, &path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Room"))?;
    let quote = pricing::quote(
        room.price_per_night,
        room.offer_price,
        query.check_in,
        query.check_out,
    );
    Ok(HttpResponse::Ok().json(quote))
}

async fn get_room(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let room = db::load_room(&state.db, &path.into_inner())
        .await?
        .ok_or(ApiError::NotFound("Room"))?;
    Ok(HttpResponse::Ok().json(room))
}

async fn create_room(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<CreateRoomPayload>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_admin(&req, &state).await?;
    let payload = payload.into_inner();
    payload.validate()?;

    let images = decode_images(&payload.images)?;

    let room_id = new_id();
    sqlx::query(
        r#"INSERT INTO rooms
           (id, name, room_type, price_per_night, offer_price, capacity, beds, bed_type,
            amenities, description, is_available, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&room_id)
    .bind(payload.name.trim())
    .bind(payload.room_type.as_str())
    .bind(payload.price_per_night)
    .bind(payload.offer_price)
    .bind(payload.capacity)
    .bind(payload.beds)
    .bind(payload.bed_type.trim())
    .bind(serde_json::to_string(&payload.amenities).unwrap_or_else(|_| "[]".to_string()))
    .bind(payload.description.trim())
    .bind(payload.is_available as i64)
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    store_images(&state.db, &room_id, images, 0).await?;

    log_activity(
        &state.db,
        "room_created",
        &format!("{} added room {}.", admin.name, payload.name.trim()),
        Some(&admin.id),
        None,
    )
    .await;
    state.publish(CacheEvent::rooms_changed(&room_id));

    let room = db::load_room(&state.db, &room_id)
        .await?
        .ok_or(ApiError::NotFound("Room"))?;
    Ok(HttpResponse::Created().json(room))
}

async fn update_room(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Json<UpdateRoomPayload>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_admin(&req, &state).await?;
    let room_id = path.into_inner();
    let payload = payload.into_inner();
    payload.validate()?;

    let exists = sqlx::query_as::<_, (String,)>("SELECT id FROM rooms WHERE id = ? LIMIT 1")
        .bind(&room_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("Room"));
    }

    let new_images = decode_images(&payload.images_to_add)?;

    sqlx::query(
        r#"UPDATE rooms
           SET name = ?, room_type = ?, price_per_night = ?, offer_price = ?, capacity = ?,
               beds = ?, bed_type = ?, amenities = ?, description = ?, is_available = ?
           WHERE id = ?"#,
    )
    .bind(payload.name.trim())
    .bind(payload.room_type.as_str())
    .bind(payload.price_per_night)
    .bind(payload.offer_price)
    .bind(payload.capacity)
    .bind(payload.beds)
    .bind(payload.bed_type.trim())
    .bind(serde_json::to_string(&payload.amenities).unwrap_or_else(|_| "[]".to_string()))
    .bind(payload.description.trim())
    .bind(payload.is_available as i64)
    .bind(&room_id)
    .execute(&state.db)
    .await?;

    for image_id in &payload.images_to_delete {
        sqlx::query("DELETE FROM room_images WHERE room_id = ? AND id = ?")
            .bind(&room_id)
            .bind(image_id)
            .execute(&state.db)
            .await?;
    }

    let next_position = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM room_images WHERE room_id = ?",
    )
    .bind(&room_id)
    .fetch_one(&state.db)
    .await?;
    store_images(&state.db, &room_id, new_images, next_position).await?;

    log_activity(
        &state.db,
        "room_updated",
        &format!("{} updated room {}.", admin.name, payload.name.trim()),
        Some(&admin.id),
        None,
    )
    .await;
    state.publish(CacheEvent::rooms_changed(&room_id));

    let room = db::load_room(&state.db, &room_id)
        .await?
        .ok_or(ApiError::NotFound("Room"))?;
    Ok(HttpResponse::Ok().json(room))
}

async fn delete_room(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_admin(&req, &state).await?;
    let room_id = path.into_inner();

    let room = db::load_room(&state.db, &room_id)
        .await?
        .ok_or(ApiError::NotFound("Room"))?;

    // Images go with the room via the foreign key cascade.
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(&room_id)
        .execute(&state.db)
        .await?;

    log_activity(
        &state.db,
        "room_deleted",
        &format!("{} deleted room {}.", admin.name, room.name),
        Some(&admin.id),
        None,
    )
    .await;
    state.publish(CacheEvent::rooms_changed(&room_id));

    Ok(HttpResponse::Ok().json(json!({ "ok": true })))
}

async fn serve_image(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ApiError> {
    let (room_id, image_id) = path.into_inner();
    let row = sqlx::query_as::<_, (String, Vec<u8>)>(
        "SELECT content_type, data FROM room_images WHERE room_id = ? AND id = ? LIMIT 1",
    )
    .bind(&room_id)
    .bind(&image_id)
    .fetch_optional(&state.db)
    .await?;

    let Some((content_type, data)) = row else {
        return Err(ApiError::NotFound("Image"));
    };
    Ok(HttpResponse::Ok().content_type(content_type).body(data))
}

/// Decode `data:<mime>;base64,<payload>` strings into typed blobs.
fn decode_images(images: &[String]) -> Result<Vec<(String, Vec<u8>)>, ApiError> {
    images.iter().map(|image| decode_data_url(image)).collect()
}

fn decode_data_url(data_url: &str) -> Result<(String, Vec<u8>), ApiError> {
    let invalid = || ApiError::Validation("Images must be base64 data URLs".to_string());

    let rest = data_url.strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let content_type = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    let content_type = if content_type.is_empty() {
        "application/octet-stream"
    } else {
        content_type
    };
    let bytes = BASE64.decode(payload).map_err(|_| invalid())?;
    Ok((content_type.to_string(), bytes))
}

async fn store_images(
    pool: &SqlitePool,
    room_id: &str,
    images: Vec<(String, Vec<u8>)>,
    start_position: i64,
) -> Result<(), ApiError> {
    for (offset, (content_type, data)) in images.into_iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO room_images (id, room_id, content_type, data, position, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(new_id())
        .bind(room_id)
        .bind(content_type)
        .bind(data)
        .bind(start_position + offset as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;
    }
    Ok(())
}
