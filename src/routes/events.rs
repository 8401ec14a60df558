use actix_web::{http::header, web, HttpRequest, HttpResponse, Result};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::{
    auth::require_user,
    error::ApiError,
    state::{AppState, CacheEvent},
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/events").route(web::get().to(stream_events)));
}

/// Server-sent stream of cache-invalidation events. Clients drop the named
/// keys from their query cache and refetch lazily; a dropped or lagging
/// subscriber just misses events and recovers on its next full fetch.
async fn stream_events(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    require_user(&req, &state).await?;

    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok::<web::Bytes, actix_web::Error>(event_to_bytes(&event))),
        Err(_) => None,
    });

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream))
}

fn event_to_bytes(event: &CacheEvent) -> web::Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    web::Bytes::from(format!("event: invalidate\ndata: {}\n\n", payload))
}
