use crate::editable::Editable;
use crate::error::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use super::notification_cache::FeedCache;
use super::notification_dto::NotificationPreferences;
use super::notification_models::{Notification, FEED_LIMIT};
use super::notification_repository::NotificationRepository;

/// Keeps the cached feed in line with server-confirmed state.
#[derive(Clone)]
pub struct NotificationService {
    repo: NotificationRepository,
    cache: FeedCache,
}

impl NotificationService {
    pub fn new(repo: NotificationRepository, cache: FeedCache) -> Self {
        Self { repo, cache }
    }

    /// Full refetch; overwrites whatever live pushes patched in.
    pub async fn refresh(&self) -> Result<()> {
        let feed = self.repo.fetch_feed(FEED_LIMIT).await?;
        self.cache.replace(feed);
        Ok(())
    }

    pub async fn mark_read(&self, id: i64) -> Result<Notification> {
        let notification = self.repo.mark_as_read(id).await?;
        self.cache.mark_read(notification.id);
        Ok(notification)
    }

    pub async fn mark_all_read(&self) -> Result<()> {
        self.repo.mark_all_as_read().await?;
        self.cache.mark_all_read();
        Ok(())
    }

    pub async fn load_preferences(&self) -> Result<Editable<NotificationPreferences>> {
        let preferences = self.repo.fetch_preferences().await?;
        Ok(Editable::Synced(preferences))
    }

    pub async fn save_preferences(
        &self,
        preferences: Editable<NotificationPreferences>,
    ) -> Result<Editable<NotificationPreferences>> {
        if !preferences.has_unsaved_changes() {
            return Ok(preferences);
        }

        let confirmed = self.repo.update_preferences(preferences.current()).await?;
        Ok(preferences.confirm(confirmed))
    }
}

/// Schedules the periodic background refetch of the feed.
pub async fn start_refetch_job(
    service: NotificationService,
    schedule: &str,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_uuid, _l| {
        let service = service.clone();

        Box::pin(async move {
            if let Err(e) = service.refresh().await {
                error!("Error refreshing notifications: {:?}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Notification refetch scheduled ({})", schedule);
    Ok(scheduler)
}
