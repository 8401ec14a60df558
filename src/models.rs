use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflow::OrderStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    Standard,
    Deluxe,
    Suite,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Standard => "Standard",
            RoomType::Deluxe => "Deluxe",
            RoomType::Suite => "Suite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Standard" => Some(RoomType::Standard),
            "Deluxe" => Some(RoomType::Deluxe),
            "Suite" => Some(RoomType::Suite),
            _ => None,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    pub id: String,
    pub name: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub offer_price: Option<f64>,
    pub capacity: i64,
    pub beds: i64,
    pub bed_type: String,
    pub amenities: String,
    pub description: String,
    pub is_available: i64,
    pub created_at: String,
}

/// Order joined with its room and user rows. The room columns are optional
/// because deleting a room leaves its orders behind with a null reference.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderDetailRow {
    pub id: String,
    pub room_id: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: i64,
    pub kids: i64,
    pub total_price: f64,
    pub status: String,
    pub payment_link: Option<String>,
    pub receipt_url: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub room_name: Option<String>,
    pub room_type: Option<String>,
    pub room_price_per_night: Option<f64>,
    pub room_offer_price: Option<f64>,
    pub room_image_id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub message: String,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomImageView {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub price_per_night: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<i64>,
    pub capacity: i64,
    pub beds: i64,
    pub bed_type: String,
    pub amenities: Vec<String>,
    pub images: Vec<RoomImageView>,
    pub is_available: bool,
    pub description: String,
    pub created_at: String,
}

/// Denormalized room summary embedded in order payloads.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub price_per_night: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomSummary>,
    pub user: UserSummary,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub adults: i64,
    pub kids: i64,
    pub total_price: f64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    pub version: i64,
    pub created_at: String,
}
