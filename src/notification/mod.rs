pub mod notification_cache;
pub mod notification_dto;
pub mod notification_models;
pub mod notification_repository;
pub mod notification_service;

pub use notification_cache::FeedCache;
pub use notification_models::Notification;
pub use notification_repository::NotificationRepository;
pub use notification_service::{start_refetch_job, NotificationService};
