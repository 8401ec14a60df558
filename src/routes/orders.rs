use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{new_id, require_admin, require_user, SessionUser},
    db::{self, log_activity},
    error::ApiError,
    filters::{self, OrderFilter, SearchScope},
    models::{OrderView, Role, RoomRow},
    payment, pricing,
    state::{AppState, CacheEvent},
    workflow::{self, OrderAction, OrderStatus},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderPayload {
    room_id: String,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    adults: i64,
    kids: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListOrdersQuery {
    search: Option<String>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

impl ListOrdersQuery {
    fn into_filter(self) -> OrderFilter {
        OrderFilter {
            search: self.search,
            check_in: self.check_in,
            check_out: self.check_out,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/order")
            .service(
                web::resource("")
                    .route(web::get().to(list_all_orders))
                    .route(web::post().to(create_order)),
            )
            .service(web::resource("/my").route(web::get().to(list_my_orders)))
            .service(web::resource("/summary").route(web::get().to(admin_summary)))
            .service(web::resource("/{id}/approve").route(web::patch().to(approve_order)))
            .service(web::resource("/{id}/reject").route(web::patch().to(reject_order)))
            .service(web::resource("/{id}/pay").route(web::patch().to(pay_order)))
            .service(web::resource("/{id}/receipt").route(web::get().to(order_receipt)))
            .service(web::resource("/{id}").route(web::get().to(get_order))),
    );
}

async fn create_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    let payload = payload.into_inner();

    let room = sqlx::query_as::<_, RoomRow>(
        r#"SELECT id, name, room_type, price_per_night, offer_price, capacity, beds,
                  bed_type, amenities, description, is_available, created_at
           FROM rooms
           WHERE id = ?
           LIMIT 1"#,
    )
    .bind(&payload.room_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Room"))?;

    if payload.check_out_date <= payload.check_in_date {
        return Err(ApiError::Validation(
            "Check-out must be after check-in".to_string(),
        ));
    }
    if payload.adults < 1 {
        return Err(ApiError::Validation("At least one adult is required".to_string()));
    }
    if payload.kids < 0 {
        return Err(ApiError::Validation("Kid count cannot be negative".to_string()));
    }
    if payload.adults + payload.kids > room.capacity {
        return Err(ApiError::Validation(format!(
            "Room sleeps at most {} guests",
            room.capacity
        )));
    }
    if room.is_available == 0 {
        return Err(ApiError::Validation("Room is currently not available".to_string()));
    }

    let quote = pricing::quote(
        room.price_per_night,
        room.offer_price,
        payload.check_in_date,
        payload.check_out_date,
    );

    let order_id = new_id();
    sqlx::query(
        r#"INSERT INTO orders
           (id, room_id, user_id, check_in_date, check_out_date, adults, kids,
            total_price, status, version, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?)"#,
    )
    .bind(&order_id)
    .bind(&room.id)
    .bind(&user.id)
    .bind(payload.check_in_date)
    .bind(payload.check_out_date)
    .bind(payload.adults)
    .bind(payload.kids)
    .bind(quote.total_price)
    .bind(OrderStatus::Pending.as_str())
    .bind(Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    log_activity(
        &state.db,
        "order_created",
        &format!("{} booked {} for {} nights.", user.name, room.name, quote.nights),
        Some(&user.id),
        Some(&order_id),
    )
    .await;
    state.publish(CacheEvent::orders_changed(&order_id));

    let order = db::load_order(&state.db, &order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    Ok(HttpResponse::Created().json(order))
}

async fn list_my_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    let orders = db::load_orders(&state.db, Some(&user.id)).await?;
    let orders =
        filters::newest_first_matching(orders, &query.into_inner().into_filter(), SearchScope::Customer);
    Ok(HttpResponse::Ok().json(orders))
}

async fn list_all_orders(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, ApiError> {
    require_admin(&req, &state).await?;
    let orders = db::load_orders(&state.db, None).await?;
    let orders =
        filters::newest_first_matching(orders, &query.into_inner().into_filter(), SearchScope::Admin);
    Ok(HttpResponse::Ok().json(orders))
}

async fn get_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    let order = load_owned_order(&state, &path.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn approve_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_admin(&req, &state).await?;
    let order_id = path.into_inner();
    let order = transition(&state, &req, &order_id, OrderAction::Approve).await?;

    log_activity(
        &state.db,
        "order_approved",
        &format!("{} approved order {}.", admin.name, payment::order_reference(&order_id)),
        Some(&admin.id),
        Some(&order_id),
    )
    .await;
    state.publish(CacheEvent::orders_changed(&order_id));

    Ok(HttpResponse::Ok().json(order))
}

async fn reject_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let admin = require_admin(&req, &state).await?;
    let order_id = path.into_inner();
    let order = transition(&state, &req, &order_id, OrderAction::Reject).await?;

    log_activity(
        &state.db,
        "order_rejected",
        &format!("{} rejected order {}.", admin.name, payment::order_reference(&order_id)),
        Some(&admin.id),
        Some(&order_id),
    )
    .await;
    state.publish(CacheEvent::orders_changed(&order_id));

    Ok(HttpResponse::Ok().json(order))
}

/// Records that the external payment completed. Opening the payment link
/// and confirming here are separate steps; an abandoned payment simply
/// leaves the order at Approved.
async fn pay_order(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    let order_id = path.into_inner();
    load_owned_order(&state, &order_id, &user).await?;

    let order = transition(&state, &req, &order_id, OrderAction::Pay).await?;

    log_activity(
        &state.db,
        "order_paid",
        &format!("{} paid order {}.", user.name, payment::order_reference(&order_id)),
        Some(&user.id),
        Some(&order_id),
    )
    .await;
    state.publish(CacheEvent::orders_changed(&order_id));

    Ok(HttpResponse::Ok().json(order))
}

async fn order_receipt(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = require_user(&req, &state).await?;
    let order = load_owned_order(&state, &path.into_inner(), &user).await?;

    if order.status != OrderStatus::Paid {
        return Err(ApiError::Conflict(
            "Receipt is only available for paid orders".to_string(),
        ));
    }

    let nights = pricing::nights_between(order.check_in_date, order.check_out_date);
    Ok(HttpResponse::Ok().json(json!({
        "orderId": order.id,
        "reference": payment::order_reference(&order.id),
        "issuedTo": order.user.name,
        "room": order.room.as_ref().map(|room| room.name.clone()),
        "checkInDate": order.check_in_date,
        "checkOutDate": order.check_out_date,
        "nights": nights,
        "totalPrice": order.total_price,
        "status": order.status,
        "issuedAt": Utc::now().to_rfc3339(),
    })))
}

async fn admin_summary(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    require_admin(&req, &state).await?;

    let mut counts = serde_json::Map::new();
    let mut total = 0i64;
    for status in [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Rejected,
        OrderStatus::Paid,
    ] {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&state.db)
            .await?;
        total += count;
        counts.insert(status.as_str().to_lowercase(), json!(count));
    }

    let recent = db::recent_activities(&state.db, 10).await?;
    let activity: Vec<_> = recent
        .into_iter()
        .map(|row| json!({ "message": row.message, "createdAt": row.created_at }))
        .collect();

    Ok(HttpResponse::Ok().json(json!({
        "counts": counts,
        "total": total,
        "recentActivity": activity,
    })))
}

/// Owners see their own orders; admins see everything. Anyone else learns
/// nothing, not even that the order exists.
async fn load_owned_order(
    state: &AppState,
    order_id: &str,
    user: &SessionUser,
) -> Result<OrderView, ApiError> {
    let order = db::load_order(&state.db, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))?;
    if user.role != Role::Admin && order.user.id != user.id {
        return Err(ApiError::NotFound("Order"));
    }
    Ok(order)
}

/// Applies one state-machine step under the order's version guard. A failed
/// step leaves the row untouched and reports why.
async fn transition(
    state: &AppState,
    req: &HttpRequest,
    order_id: &str,
    action: OrderAction,
) -> Result<OrderView, ApiError> {
    let row = sqlx::query_as::<_, (String, f64, i64)>(
        "SELECT status, total_price, version FROM orders WHERE id = ? LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(ApiError::NotFound("Order"))?;
    let (status, total_price, version) = row;

    let current = OrderStatus::parse(&status)
        .ok_or_else(|| ApiError::Internal(format!("Order {order_id} has unknown status {status}")))?;

    if let Some(expected) = if_match_version(req)? {
        if expected != version {
            return Err(ApiError::Conflict(
                "Order changed since it was loaded; refresh and retry".to_string(),
            ));
        }
    }

    let next = workflow::apply(current, action)?;

    let payment_link = match action {
        OrderAction::Approve => Some(payment::payment_link(&state.payment, order_id, total_price)),
        _ => None,
    };
    let receipt_url = match action {
        OrderAction::Pay => Some(payment::receipt_url(order_id)),
        _ => None,
    };

    let result = sqlx::query(
        r#"UPDATE orders
           SET status = ?,
               payment_link = COALESCE(?, payment_link),
               receipt_url = COALESCE(?, receipt_url),
               version = version + 1
           WHERE id = ? AND version = ?"#,
    )
    .bind(next.as_str())
    .bind(payment_link)
    .bind(receipt_url)
    .bind(order_id)
    .bind(version)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "Order changed since it was loaded; refresh and retry".to_string(),
        ));
    }

    db::load_order(&state.db, order_id)
        .await?
        .ok_or(ApiError::NotFound("Order"))
}

fn if_match_version(req: &HttpRequest) -> Result<Option<i64>, ApiError> {
    let Some(value) = req.headers().get(header::IF_MATCH) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .map(|raw| raw.trim().trim_matches('"'))
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(Some)
        .ok_or_else(|| ApiError::Validation("Invalid If-Match header".to_string()))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    use crate::test_support;

    #[actix_web::test]
    async fn booking_is_priced_server_side() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;

        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;

        // Two nights at the 1500 offer rate, regardless of what any client
        // might have computed.
        assert_eq!(order["totalPrice"], 3000.0);
        assert_eq!(order["status"], "Pending");
        assert_eq!(order["version"], 1);
        assert_eq!(order["room"]["name"], "Deluxe Suite 1");
        assert_eq!(order["user"]["name"], "Asha");
        assert!(order.get("paymentLink").is_none());
    }

    #[actix_web::test]
    async fn booking_validation_guards_dates_and_capacity() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let room_id = room["id"].as_str().unwrap();

        for payload in [
            // Same-day stay is a display-side clamp, not a bookable range.
            json!({ "roomId": room_id, "checkInDate": "2024-01-01", "checkOutDate": "2024-01-01", "adults": 2, "kids": 0 }),
            json!({ "roomId": room_id, "checkInDate": "2024-01-03", "checkOutDate": "2024-01-01", "adults": 2, "kids": 0 }),
            json!({ "roomId": room_id, "checkInDate": "2024-01-01", "checkOutDate": "2024-01-03", "adults": 0, "kids": 2 }),
            json!({ "roomId": room_id, "checkInDate": "2024-01-01", "checkOutDate": "2024-01-03", "adults": 3, "kids": 2 }),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/order")
                .cookie(user.clone())
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }

        let mut unavailable = test_support::room_payload("Closed Wing", "Standard");
        unavailable["isAvailable"] = json!(false);
        let unavailable = test_support::create_room(&app, &admin, unavailable).await;
        let req = test::TestRequest::post()
            .uri("/api/order")
            .cookie(user.clone())
            .set_json(json!({
                "roomId": unavailable["id"].as_str().unwrap(),
                "checkInDate": "2024-01-01",
                "checkOutDate": "2024-01-03",
                "adults": 2,
                "kids": 0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn approval_then_payment_walks_the_state_machine() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let order_id = order["id"].as_str().unwrap();

        // Paying before approval skips a state.
        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/pay"))
            .cookie(user.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/approve"))
            .cookie(admin.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let approved: Value = test::read_body_json(resp).await;
        assert_eq!(approved["status"], "Approved");
        let link = approved["paymentLink"].as_str().unwrap();
        assert!(link.starts_with("upi://pay?"));
        assert!(link.contains("am=3000.00"));

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/pay"))
            .cookie(user.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let paid: Value = test::read_body_json(resp).await;
        assert_eq!(paid["status"], "Paid");
        let receipt_url = paid["receiptUrl"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&receipt_url)
            .cookie(user.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let receipt: Value = test::read_body_json(resp).await;
        assert_eq!(receipt["nights"], 2);
        assert_eq!(receipt["totalPrice"], 3000.0);
    }

    #[actix_web::test]
    async fn rejected_orders_are_terminal() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let order_id = order["id"].as_str().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/reject"))
            .cookie(admin.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let rejected: Value = test::read_body_json(resp).await;
        assert_eq!(rejected["status"], "Rejected");

        // A later approval attempt is an invalid transition, and the order
        // stays where it was.
        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/approve"))
            .cookie(admin.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/api/order/{order_id}"))
            .cookie(user.clone())
            .to_request();
        let after: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(after["status"], "Rejected");
    }

    #[actix_web::test]
    async fn stale_version_is_a_conflict() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let order_id = order["id"].as_str().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/approve"))
            .cookie(admin.clone())
            .insert_header(("If-Match", "7"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/approve"))
            .cookie(admin.clone())
            .insert_header(("If-Match", "1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let approved: Value = test::read_body_json(resp).await;
        assert_eq!(approved["version"], 2);
    }

    #[actix_web::test]
    async fn plain_users_cannot_review_orders() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let order_id = order["id"].as_str().unwrap();

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{order_id}/approve"))
            .cookie(user.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get().uri("/api/order").cookie(user).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn orders_are_private_to_their_owner() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let owner = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let other = test_support::signup(&app, "Ravi", "ravi@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let order = test_support::create_order(
            &app,
            &owner,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let order_id = order["id"].as_str().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/order/{order_id}"))
            .cookie(other)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&format!("/api/order/{order_id}"))
            .cookie(admin)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn lists_are_newest_first_and_searchable() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;

        let deluxe =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;
        let standard = test_support::create_room(
            &app,
            &admin,
            test_support::room_payload("Standard Room", "Standard"),
        )
        .await;

        let first = test_support::create_order(
            &app,
            &user,
            deluxe["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        let second = test_support::create_order(
            &app,
            &user,
            standard["id"].as_str().unwrap(),
            "2024-02-01",
            "2024-02-05",
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/order/my")
            .cookie(user.clone())
            .to_request();
        let mine: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let ids: Vec<_> = mine
            .as_array()
            .unwrap()
            .iter()
            .map(|order| order["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![second["id"].as_str().unwrap(), first["id"].as_str().unwrap()]);

        let req = test::TestRequest::get()
            .uri("/api/order/my?search=deluxe")
            .cookie(user.clone())
            .to_request();
        let found: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["room"]["name"], "Deluxe Suite 1");

        // Admin search reaches the customer name too.
        let req = test::TestRequest::get()
            .uri("/api/order?search=asha")
            .cookie(admin.clone())
            .to_request();
        let found: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(found.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/order?checkIn=2024-02-01")
            .cookie(admin.clone())
            .to_request();
        let found: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["room"]["name"], "Standard Room");
    }

    #[actix_web::test]
    async fn summary_counts_orders_by_status() {
        let state = test_support::state().await;
        let app = test_support::spawn(&state).await;
        let admin = test_support::admin(&app).await;
        let user = test_support::signup(&app, "Asha", "asha@example.com", "secret123").await;
        let room =
            test_support::create_room(&app, &admin, test_support::room_payload("Deluxe Suite 1", "Deluxe"))
                .await;

        let first = test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-01-01",
            "2024-01-03",
        )
        .await;
        test_support::create_order(
            &app,
            &user,
            room["id"].as_str().unwrap(),
            "2024-02-01",
            "2024-02-03",
        )
        .await;

        let req = test::TestRequest::patch()
            .uri(&format!("/api/order/{}/approve", first["id"].as_str().unwrap()))
            .cookie(admin.clone())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/order/summary")
            .cookie(admin)
            .to_request();
        let summary: Value = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(summary["counts"]["pending"], 1);
        assert_eq!(summary["counts"]["approved"], 1);
        assert_eq!(summary["counts"]["rejected"], 0);
        assert_eq!(summary["total"], 2);
        assert!(!summary["recentActivity"].as_array().unwrap().is_empty());
    }
}
