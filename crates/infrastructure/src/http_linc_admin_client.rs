use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use linc_application::{OperatorSessionProvider, RoleCatalogRepository, UserPermissionRepository};
use linc_core::{AppError, AppResult, OperatorSession};
use linc_domain::{
    NewUserProfile, PermissionName, RoleDefinition, UserId, UserPermissionSubmission, UserSummary,
};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

mod wire;

use wire::{
    CreateUserRequest, CreatedUserResponse, CurrentOperatorResponse, ErrorDetailResponse,
    RoleResponse, UpdateUserPermissionsRequest, UserPermissionsResponse, UserResponse,
};

/// Connection settings for the LINC backend REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LincApiClientConfig {
    base_url: String,
    access_token: String,
    timeout: Duration,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl LincApiClientConfig {
    /// Creates validated client settings.
    ///
    /// The base URL must be an absolute `http` or `https` URL; a trailing
    /// `/` is dropped.
    pub fn new(
        base_url: &str,
        access_token: impl Into<String>,
        timeout: Duration,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> AppResult<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|error| {
            AppError::Validation(format!("invalid LINC API base URL '{base_url}': {error}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "LINC API base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AppError::Validation(
                "LINC API access token must not be empty".to_owned(),
            ));
        }

        if timeout.is_zero() {
            return Err(AppError::Validation(
                "LINC API timeout must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_owned(),
            access_token,
            timeout,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms,
        })
    }

    /// Returns the normalized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the maximum number of attempts for reads.
    #[must_use]
    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }
}

/// reqwest-based adapter for the LINC user and role endpoints.
#[derive(Clone)]
pub struct HttpLincAdminClient {
    http_client: reqwest::Client,
    config: LincApiClientConfig,
}

impl HttpLincAdminClient {
    /// Creates a client with its own connection pool.
    pub fn new(config: LincApiClientConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

        Ok(Self::with_http_client(http_client, config))
    }

    /// Creates a client sharing an existing connection pool.
    #[must_use]
    pub fn with_http_client(http_client: reqwest::Client, config: LincApiClientConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn get_json<T>(&self, path: &str) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let endpoint = self.endpoint(path);
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.config.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self
                .http_client
                .get(endpoint.as_str())
                .bearer_auth(self.config.access_token.as_str())
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    debug!(path, attempt, "LINC API read succeeded");
                    return response.json::<T>().await.map_err(|error| {
                        AppError::Internal(format!(
                            "failed to parse LINC API response body from '{path}': {error}"
                        ))
                    });
                }
                Ok(response) if is_transient(response.status()) => {
                    last_error = Some(format!(
                        "transient HTTP status {} from '{path}'",
                        response.status()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(error_for_status(status, body.as_str()));
                }
                Err(error) => {
                    last_error = Some(format!("LINC API transport error for '{path}': {error}"));
                }
            }

            if attempt < self.config.max_attempts {
                let delay = self.config.retry_backoff_ms.saturating_mul(u64::from(attempt));
                warn!(
                    path,
                    attempt,
                    delay_ms = delay,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying LINC API read"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Internal(last_error.unwrap_or_else(|| {
            format!("LINC API read of '{path}' exhausted retries")
        })))
    }

    async fn send_json<B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> AppResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .http_client
            .request(method.clone(), self.endpoint(path))
            .bearer_auth(self.config.access_token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to call LINC API '{method} {path}': {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_owned());
            return Err(error_for_status(status, body.as_str()));
        }

        debug!(%method, path, status = status.as_u16(), "LINC API write succeeded");
        Ok(response)
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Maps a non-success backend status to an application error.
fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let detail = serde_json::from_str::<ErrorDetailResponse>(body)
        .map(|error| error.message())
        .unwrap_or_else(|_| body.trim().to_owned());
    let message = format!("LINC API returned status {}: {detail}", status.as_u16());

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(message),
        StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
        StatusCode::FORBIDDEN => AppError::Forbidden(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT => AppError::Conflict(message),
        _ => AppError::Internal(message),
    }
}

#[async_trait]
impl RoleCatalogRepository for HttpLincAdminClient {
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let roles = self.get_json::<Vec<RoleResponse>>("/api/v1/roles/").await?;

        roles
            .into_iter()
            .map(RoleResponse::try_into_role)
            .collect()
    }
}

#[async_trait]
impl UserPermissionRepository for HttpLincAdminClient {
    async fn fetch_user(&self, user_id: UserId) -> AppResult<UserSummary> {
        self.get_json::<UserResponse>(format!("/api/v1/users/{user_id}").as_str())
            .await?
            .try_into_summary()
    }

    async fn fetch_user_permissions(
        &self,
        user_id: UserId,
    ) -> AppResult<BTreeSet<PermissionName>> {
        self.get_json::<UserPermissionsResponse>(
            format!("/api/v1/users/{user_id}/permissions").as_str(),
        )
        .await?
        .try_into_permissions()
    }

    async fn update_user_permissions(
        &self,
        user_id: UserId,
        submission: &UserPermissionSubmission,
    ) -> AppResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            format!("/api/v1/users/{user_id}/permissions").as_str(),
            &UpdateUserPermissionsRequest::from(submission),
        )
        .await?;

        Ok(())
    }

    async fn create_user(
        &self,
        profile: &NewUserProfile,
        submission: &UserPermissionSubmission,
    ) -> AppResult<UserId> {
        let response = self
            .send_json(
                reqwest::Method::POST,
                "/api/v1/users/",
                &CreateUserRequest::new(profile, submission),
            )
            .await?;

        response
            .json::<CreatedUserResponse>()
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to parse LINC API create-user response body: {error}"
                ))
            })?
            .try_into_user_id()
    }
}

#[async_trait]
impl OperatorSessionProvider for HttpLincAdminClient {
    async fn current_operator(&self) -> AppResult<OperatorSession> {
        self.get_json::<CurrentOperatorResponse>("/api/v1/auth/me")
            .await?
            .try_into_session()
    }
}
