//! HTTP implementation of the remote workout store port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use flexlog_core::RemoteWorkoutStore;
use flexlog_domain::{
    FlexLogError, RemoteConfig, Result, Workout, WorkoutDraft, WorkoutPatch,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::InfraError;
use crate::http::HttpClient;

const WORKOUTS_PATH: &str = "/v1/workouts";

/// Remote workout store speaking the FlexLog workout API.
pub struct HttpRemoteStore {
    client: HttpClient,
    base_url: String,
    api_token: Option<String>,
}

impl HttpRemoteStore {
    /// Build a store from remote endpoint configuration.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(format!("flexlog/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    /// Construct with an explicit client, used by tests.
    pub fn with_client(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_token: None }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn decode_workout(response: Response) -> Result<Workout> {
        response.json::<Workout>().await.map_err(|err| {
            let infra: InfraError = err.into();
            FlexLogError::from(infra)
        })
    }
}

#[async_trait]
impl RemoteWorkoutStore for HttpRemoteStore {
    async fn create(&self, draft: &WorkoutDraft) -> Result<Workout> {
        let response =
            self.client.send(self.request(Method::POST, WORKOUTS_PATH).json(draft)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status));
        }
        Self::decode_workout(response).await
    }

    async fn update(&self, id: &str, patch: &WorkoutPatch) -> Result<Workout> {
        let path = format!("{WORKOUTS_PATH}/{id}");
        let response = self.client.send(self.request(Method::PATCH, &path).json(patch)).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_to_error(status));
        }
        Self::decode_workout(response).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = format!("{WORKOUTS_PATH}/{id}");
        let response = self.client.send(self.request(Method::DELETE, &path)).await?;

        let status = response.status();
        // A delete of an already-deleted workout has converged; treat it as
        // done rather than leaving the action queued forever.
        if status == StatusCode::NOT_FOUND {
            debug!(id = %id, "workout already absent remotely");
            return Ok(());
        }
        if !status.is_success() {
            return Err(status_to_error(status));
        }
        Ok(())
    }

    async fn fetch_by_date(&self, date: NaiveDate) -> Result<Option<Workout>> {
        let path = format!("{WORKOUTS_PATH}?date={date}");
        let response = self.client.send(self.request(Method::GET, &path)).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_to_error(status));
        }
        Self::decode_workout(response).await.map(Some)
    }
}

fn status_to_error(status: StatusCode) -> FlexLogError {
    let message = format!(
        "HTTP {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("unknown status")
    );
    match status.as_u16() {
        404 => FlexLogError::NotFound(message),
        429 => FlexLogError::Network(message),
        400..=499 => FlexLogError::InvalidInput(message),
        _ => FlexLogError::Network(message),
    }
}
