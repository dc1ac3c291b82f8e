//! HTTP client for the platform's data export API
//!
//! Every call is a form-encoded POST to a single endpoint with the project's
//! API token and a `content` selector. Tokens are configured per project and
//! never leave their [`SecretString`] except to build the request body.

use super::models::{
    classic_event_form_map, content_params, event_form_map_from_mapping, record_params,
    ApiErrorBody, FormEventMappingEntry, InstrumentEntry, ProjectResponse,
};
use crate::adapters::platform::{DataExportProvider, ExportRequest};
use crate::config::{ProviderConfig, SecretString};
use crate::core::plan::EventFormMap;
use crate::domain::ids::ProjectId;
use crate::domain::{
    DataDictionary, FieldDescriptor, ProjectInfo, ProviderError, Result, TabulaError,
};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// [`DataExportProvider`] backed by a REDCap-style HTTP API
pub struct ApiExportProvider {
    endpoint: Url,
    client: Client,
    tokens: HashMap<String, SecretString>,
}

impl ApiExportProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url).map_err(|e| {
            TabulaError::Configuration(format!("Invalid provider.base_url: {e}"))
        })?;

        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!("TLS certificate verification is disabled for the export API");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            TabulaError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            endpoint,
            client,
            tokens: config.tokens.clone(),
        })
    }

    /// Endpoint all requests are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// True when a token is configured for the project
    pub fn has_token(&self, project_id: &ProjectId) -> bool {
        self.tokens.contains_key(project_id.as_str())
    }

    async fn post(&self, project_id: &ProjectId, mut params: Vec<(String, String)>) -> Result<String> {
        let token = self
            .tokens
            .get(project_id.as_str())
            .ok_or_else(|| ProviderError::MissingToken(project_id.to_string()))?;
        params.push(("token".to_string(), token.expose_secret().as_str().to_string()));

        let content = params
            .iter()
            .find(|(k, _)| k == "content")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        tracing::debug!(project_id = %project_id, content = %content, "Calling export API");

        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status, &body).into());
        }

        Ok(body)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        project_id: &ProjectId,
        params: Vec<(String, String)>,
    ) -> Result<T> {
        let body = self.post(project_id, params).await?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()).into())
    }
}

fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());

    if status.is_server_error() {
        ProviderError::ServerError {
            status: status.as_u16(),
            message,
        }
    } else {
        ProviderError::ClientError {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl DataExportProvider for ApiExportProvider {
    async fn project_info(&self, project_id: &ProjectId) -> Result<ProjectInfo> {
        let response: ProjectResponse = self
            .post_json(project_id, content_params("project"))
            .await?;
        Ok(response.into())
    }

    async fn data_dictionary(&self, project_id: &ProjectId) -> Result<DataDictionary> {
        let fields: Vec<FieldDescriptor> = self
            .post_json(project_id, content_params("metadata"))
            .await?;
        Ok(DataDictionary::new(fields))
    }

    async fn event_form_map(&self, project_id: &ProjectId) -> Result<EventFormMap> {
        if self.project_info(project_id).await?.longitudinal {
            let entries: Vec<FormEventMappingEntry> = self
                .post_json(project_id, content_params("formEventMapping"))
                .await?;
            event_form_map_from_mapping(entries)
        } else {
            let instruments: Vec<InstrumentEntry> = self
                .post_json(project_id, content_params("instrument"))
                .await?;
            classic_event_form_map(instruments)
        }
    }

    async fn export_records(
        &self,
        project_id: &ProjectId,
        request: &ExportRequest,
    ) -> Result<String> {
        self.post(project_id, record_params(request)).await
    }
}
