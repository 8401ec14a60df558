pub mod auth;
pub mod events;
pub mod orders;
pub mod rooms;
