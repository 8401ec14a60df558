use std::str::FromStr;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::broadcast;

use crate::payment::PaymentConfig;
use crate::state::AppState;
use crate::{db, routes};

/// Fresh in-memory database with migrations applied and the default admin
/// seeded. One connection only: every pool connection to `:memory:` would
/// otherwise get its own empty database.
pub async fn state() -> AppState {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    db::run_migrations(&pool).await.unwrap();
    db::seed_admin(&pool).await.unwrap();

    let (events, _) = broadcast::channel(16);
    AppState {
        db: pool,
        events,
        payment: PaymentConfig {
            vpa: "hotel@upi".to_string(),
            payee_name: "Roomstay Hotels".to_string(),
        },
    }
}

pub async fn spawn(
    state: &AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody<Error: std::fmt::Debug>>, Error = Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(routes::auth::configure)
            .configure(routes::rooms::configure)
            .configure(routes::orders::configure)
            .configure(routes::events::configure),
    )
    .await
}

pub async fn signup<S, B>(app: &S, name: &str, email: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "signup failed: {}", resp.status());
    resp.response().cookies().next().unwrap().into_owned()
}

pub async fn login<S, B>(app: &S, email: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(resp.status().is_success(), "login failed: {}", resp.status());
    resp.response().cookies().next().unwrap().into_owned()
}

/// Session for the admin account seeded by `state()`.
pub async fn admin<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    login(app, "admin@roomstay.local", "admin").await
}

pub fn room_payload(name: &str, room_type: &str) -> Value {
    json!({
        "name": name,
        "type": room_type,
        "pricePerNight": 2000.0,
        "offerPrice": 1500.0,
        "capacity": 4,
        "beds": 2,
        "bedType": "Double",
        "amenities": ["WiFi", "AC"],
        "description": "Quiet room overlooking the courtyard.",
        "images": []
    })
}

pub async fn create_room<S, B>(app: &S, admin_cookie: &Cookie<'static>, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/room")
        .cookie(admin_cookie.clone())
        .set_json(payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(
        resp.status().is_success(),
        "room creation failed: {}",
        resp.status()
    );
    test::read_body_json(resp).await
}

pub async fn create_order<S, B>(
    app: &S,
    cookie: &Cookie<'static>,
    room_id: &str,
    check_in: &str,
    check_out: &str,
) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/order")
        .cookie(cookie.clone())
        .set_json(json!({
            "roomId": room_id,
            "checkInDate": check_in,
            "checkOutDate": check_out,
            "adults": 2,
            "kids": 1
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert!(
        resp.status().is_success(),
        "order creation failed: {}",
        resp.status()
    );
    test::read_body_json(resp).await
}
