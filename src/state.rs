use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::payment::PaymentConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub events: broadcast::Sender<CacheEvent>,
    pub payment: PaymentConfig,
}

impl AppState {
    /// Fire-and-forget: subscribers that lagged or disconnected are not an
    /// error the mutation should fail on.
    pub fn publish(&self, event: CacheEvent) {
        let _ = self.events.send(event);
    }
}

/// Invalidation notice broadcast after every mutation. Consumers drop the
/// named cache keys and refetch on demand instead of each mutation call
/// site deciding what to refetch.
#[derive(Clone, Debug, Serialize)]
pub struct CacheEvent {
    pub keys: Vec<String>,
}

impl CacheEvent {
    pub fn rooms_changed(room_id: &str) -> Self {
        CacheEvent {
            keys: vec!["rooms".to_string(), format!("room:{room_id}")],
        }
    }

    pub fn orders_changed(order_id: &str) -> Self {
        CacheEvent {
            keys: vec!["orders".to_string(), format!("order:{order_id}")],
        }
    }
}
