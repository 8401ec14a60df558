use std::collections::HashMap;
use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    error::ApiError,
    models::{
        ActivityRow, OrderDetailRow, OrderView, RoomImageView, RoomRow, RoomSummary, RoomType,
        RoomView, Role, UserSummary,
    },
    pricing,
    workflow::OrderStatus,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
        .bind(Role::Admin.as_str())
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@roomstay.local".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Super Admin".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO users (id, name, email, role, password_hash, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email)
    .bind(Role::Admin.as_str())
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn log_activity(
    pool: &SqlitePool,
    kind: &str,
    message: &str,
    user_id: Option<&str>,
    order_id: Option<&str>,
) {
    let _ = sqlx::query(
        r#"INSERT INTO activities (id, kind, message, created_at, user_id, order_id)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .bind(order_id)
    .execute(pool)
    .await;
}

pub async fn recent_activities(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<ActivityRow>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRow>(
        "SELECT message, created_at FROM activities ORDER BY created_at DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub fn image_url(room_id: &str, image_id: &str) -> String {
    format!("/api/room/{room_id}/images/{image_id}")
}

/// Rooms in insertion order, each with its ordered image references.
pub async fn load_rooms(pool: &SqlitePool) -> Result<Vec<RoomView>, ApiError> {
    let rows = sqlx::query_as::<_, RoomRow>(
        r#"SELECT id, name, room_type, price_per_night, offer_price, capacity, beds,
                  bed_type, amenities, description, is_available, created_at
           FROM rooms
           ORDER BY created_at ASC, rowid ASC"#,
    )
    .fetch_all(pool)
    .await?;

    let image_rows = sqlx::query_as::<_, (String, String)>(
        "SELECT id, room_id FROM room_images ORDER BY position ASC, created_at ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut images_by_room: HashMap<String, Vec<RoomImageView>> = HashMap::new();
    for (image_id, room_id) in image_rows {
        let url = image_url(&room_id, &image_id);
        images_by_room
            .entry(room_id)
            .or_default()
            .push(RoomImageView { id: image_id, url });
    }

    rows.into_iter()
        .map(|row| {
            let images = images_by_room.remove(&row.id).unwrap_or_default();
            room_to_view(row, images)
        })
        .collect()
}

pub async fn load_room(pool: &SqlitePool, room_id: &str) -> Result<Option<RoomView>, ApiError> {
    let row = sqlx::query_as::<_, RoomRow>(
        r#"SELECT id, name, room_type, price_per_night, offer_price, capacity, beds,
                  bed_type, amenities, description, is_available, created_at
           FROM rooms
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let image_rows = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM room_images WHERE room_id = ? ORDER BY position ASC, created_at ASC",
    )
    .bind(room_id)
    .fetch_all(pool)
    .await?;

    let images = image_rows
        .into_iter()
        .map(|(image_id,)| {
            let url = image_url(&row.id, &image_id);
            RoomImageView { id: image_id, url }
        })
        .collect();

    room_to_view(row, images).map(Some)
}

fn room_to_view(row: RoomRow, images: Vec<RoomImageView>) -> Result<RoomView, ApiError> {
    let room_type = RoomType::parse(&row.room_type)
        .ok_or_else(|| ApiError::Internal(format!("Room {} has unknown type {}", row.id, row.room_type)))?;
    let amenities: Vec<String> = serde_json::from_str(&row.amenities).unwrap_or_default();

    Ok(RoomView {
        discount_percentage: pricing::discount_percentage(row.price_per_night, row.offer_price),
        id: row.id,
        name: row.name,
        room_type,
        price_per_night: row.price_per_night,
        offer_price: row.offer_price,
        capacity: row.capacity,
        beds: row.beds,
        bed_type: row.bed_type,
        amenities,
        images,
        is_available: row.is_available != 0,
        description: row.description,
        created_at: row.created_at,
    })
}

const ORDER_DETAIL_SELECT: &str = r#"
    SELECT o.id, o.room_id, o.check_in_date, o.check_out_date, o.adults, o.kids,
           o.total_price, o.status, o.payment_link, o.receipt_url, o.version, o.created_at,
           r.name AS room_name, r.room_type AS room_type,
           r.price_per_night AS room_price_per_night, r.offer_price AS room_offer_price,
           (SELECT i.id FROM room_images i
             WHERE i.room_id = r.id
             ORDER BY i.position ASC, i.created_at ASC
             LIMIT 1) AS room_image_id,
           u.id AS user_id, u.name AS user_name, u.email AS user_email
    FROM orders o
    LEFT JOIN rooms r ON o.room_id = r.id
    JOIN users u ON o.user_id = u.id"#;

/// Orders in arrival order, optionally restricted to one owner. Callers
/// reverse to newest-first through the order filter.
pub async fn load_orders(pool: &SqlitePool, owner: Option<&str>) -> Result<Vec<OrderView>, ApiError> {
    let rows = match owner {
        Some(user_id) => {
            let query = format!(
                "{ORDER_DETAIL_SELECT} WHERE o.user_id = ? ORDER BY o.created_at ASC, o.rowid ASC"
            );
            sqlx::query_as::<_, OrderDetailRow>(&query)
                .bind(user_id)
                .fetch_all(pool)
                .await?
        }
        None => {
            let query = format!("{ORDER_DETAIL_SELECT} ORDER BY o.created_at ASC, o.rowid ASC");
            sqlx::query_as::<_, OrderDetailRow>(&query)
                .fetch_all(pool)
                .await?
        }
    };

    rows.into_iter().map(order_to_view).collect()
}

pub async fn load_order(pool: &SqlitePool, order_id: &str) -> Result<Option<OrderView>, ApiError> {
    let query = format!("{ORDER_DETAIL_SELECT} WHERE o.id = ? LIMIT 1");
    let row = sqlx::query_as::<_, OrderDetailRow>(&query)
        .bind(order_id)
        .fetch_optional(pool)
        .await?;

    row.map(order_to_view).transpose()
}

fn order_to_view(row: OrderDetailRow) -> Result<OrderView, ApiError> {
    let status = OrderStatus::parse(&row.status)
        .ok_or_else(|| ApiError::Internal(format!("Order {} has unknown status {}", row.id, row.status)))?;

    let room = match (row.room_id, row.room_name) {
        (Some(room_id), Some(name)) => Some(RoomSummary {
            image: row.room_image_id.as_deref().map(|image| image_url(&room_id, image)),
            id: room_id,
            name,
            room_type: row.room_type.unwrap_or_default(),
            price_per_night: row.room_price_per_night.unwrap_or_default(),
            offer_price: row.room_offer_price,
        }),
        _ => None,
    };

    Ok(OrderView {
        id: row.id,
        room,
        user: UserSummary {
            id: row.user_id,
            name: row.user_name,
            email: row.user_email,
        },
        check_in_date: row.check_in_date,
        check_out_date: row.check_out_date,
        adults: row.adults,
        kids: row.kids,
        total_price: row.total_price,
        status,
        payment_link: row.payment_link,
        receipt_url: row.receipt_url,
        version: row.version,
        created_at: row.created_at,
    })
}
