pub mod client;
pub mod connection;
pub mod handler;
pub mod types;

pub use client::{LiveClient, TungsteniteConnector};
pub use handler::{FrameHandler, NotificationCallback};
