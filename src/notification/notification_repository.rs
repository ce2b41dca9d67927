use crate::error::{AppError, Result};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use super::notification_dto::{
    ApiErrorBody, NotificationListResponse, NotificationPreferences,
    UpdateNotificationPreferencesRequest,
};
use super::notification_models::{Notification, NotificationFeed};

/// HTTP access to the notification endpoints of the REST API.
#[derive(Clone)]
pub struct NotificationRepository {
    client: Client,
    base_url: Url,
    credential: watch::Receiver<Option<String>>,
}

impl NotificationRepository {
    pub fn new(base_url: &str, credential: watch::Receiver<Option<String>>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("invalid API_BASE_URL: {}", e)))?;

        Ok(Self {
            client: Client::new(),
            base_url,
            credential,
        })
    }

    pub async fn fetch_feed(&self, limit: usize) -> Result<NotificationFeed> {
        let url = self.endpoint(&["api", "v1", "notifications"])?;
        let request = self
            .client
            .get(url)
            .query(&[("per_page", limit.to_string())]);

        let response: NotificationListResponse = self.send_json(request).await?;
        Ok(response.into())
    }

    pub async fn mark_as_read(&self, id: i64) -> Result<Notification> {
        let url = self.endpoint(&["api", "v1", "notifications", &id.to_string(), "mark_as_read"])?;
        self.send_json(self.client.patch(url)).await
    }

    pub async fn mark_all_as_read(&self) -> Result<()> {
        let url = self.endpoint(&["api", "v1", "notifications", "mark_all_as_read"])?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    pub async fn fetch_preferences(&self) -> Result<NotificationPreferences> {
        let url = self.endpoint(&["api", "v1", "notification_preferences"])?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn update_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<NotificationPreferences> {
        let url = self.endpoint(&["api", "v1", "notification_preferences"])?;
        let body = UpdateNotificationPreferencesRequest::from(preferences);
        self.send_json(self.client.put(url).json(&body)).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Config("API_BASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bearer_token(&self) -> Result<String> {
        self.credential
            .borrow()
            .clone()
            .ok_or_else(|| AppError::Unauthorized("Not signed in".to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.bearer_token()?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);

        tracing::warn!("API request failed with {}: {}", status, message);
        Err(AppError::from_status(status, message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}
