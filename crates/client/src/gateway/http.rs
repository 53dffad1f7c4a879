//! HTTP implementation of the gateway.
//!
//! One shared `reqwest::Client` talks JSON to the four service endpoints.
//! Non-2xx responses carrying an `{error}` body become
//! [`GatewayError::Rejected`] with the message passed through untouched.

use async_trait::async_trait;
use protocol::{
    AuthRequest, DownloadAck, DownloadRequest, ErrorBody, FileListResponse, FileRecord, Identity,
    MessageAck, ProfileData, ProfileQuery, ProfileUpdate, UploadReceipt, UploadRequest,
};
use serde::de::DeserializeOwned;

use super::{Gateway, GatewayError, GatewayResult};
use crate::config::ServiceConfig;

/// Gateway that reaches the service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    service: ServiceConfig,
}

impl HttpGateway {
    /// Build a gateway for the configured endpoints.
    pub fn new(service: ServiceConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(service.request_timeout())
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, service })
    }

    /// Build a gateway around an existing client.
    pub fn with_client(client: reqwest::Client, service: ServiceConfig) -> Self {
        Self { client, service }
    }

    /// The endpoints this gateway talks to.
    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> GatewayResult<T> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("{} request failed: {}", operation, e);
            if e.is_timeout() {
                GatewayError::Transport(format!("{} timed out", operation))
            } else {
                GatewayError::Transport(format!("{} failed: {}", operation, e))
            }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("{} response body unreadable: {}", operation, e);
            GatewayError::Transport(format!("{} response unreadable: {}", operation, e))
        })?;

        if status.is_success() {
            return serde_json::from_slice::<T>(&body).map_err(|e| {
                tracing::warn!("{} response did not decode: {}", operation, e);
                GatewayError::Malformed(format!("{}: {}", operation, e))
            });
        }

        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) => {
                tracing::debug!("{} rejected with HTTP {}: {}", operation, status, error);
                Err(GatewayError::Rejected {
                    status: status.as_u16(),
                    message: error,
                })
            }
            Err(_) => {
                tracing::warn!("{} failed with HTTP {} and no error body", operation, status);
                Err(GatewayError::Transport(format!(
                    "{} failed with HTTP {}",
                    operation, status
                )))
            }
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn authenticate(&self, request: AuthRequest) -> GatewayResult<Identity> {
        tracing::debug!("Auth {:?} for {}", request.action, request.email);
        self.send(
            "auth",
            self.client.post(&self.service.auth_url).json(&request),
        )
        .await
    }

    async fn list_files(&self) -> GatewayResult<Vec<FileRecord>> {
        let response: FileListResponse = self
            .send("list files", self.client.get(&self.service.files_url))
            .await?;
        tracing::debug!("Listed {} files", response.files.len());
        Ok(response.files)
    }

    async fn record_download(&self, file_id: i64) -> GatewayResult<DownloadAck> {
        self.send(
            "record download",
            self.client
                .post(&self.service.files_url)
                .json(&DownloadRequest::new(file_id)),
        )
        .await
    }

    async fn upload_file(&self, request: UploadRequest) -> GatewayResult<UploadReceipt> {
        tracing::debug!("Uploading {:?}", request);
        self.send(
            "upload",
            self.client.post(&self.service.upload_url).json(&request),
        )
        .await
    }

    async fn get_profile(&self, user_id: i64) -> GatewayResult<ProfileData> {
        self.send(
            "get profile",
            self.client
                .get(&self.service.profile_url)
                .query(&ProfileQuery { user_id }),
        )
        .await
    }

    async fn update_profile(&self, update: ProfileUpdate) -> GatewayResult<MessageAck> {
        self.send(
            "update profile",
            self.client.post(&self.service.profile_url).json(&update),
        )
        .await
    }
}
