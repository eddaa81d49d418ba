//! reqwest-backed [`RemoteHelpdesk`]

use super::remote::{
    CreateNoteRequest, CreateTicketRequest, RemoteConversation, RemoteHelpdesk, RemoteTicket,
    UpdateTicketRequest,
};
use crate::config::RemoteConfig;
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::de::DeserializeOwned;

/// HTTP client for the external helpdesk
pub struct HttpHelpdesk {
    http: Client,
    base_url: String,
    portal_url: String,
    auth_header: String,
}

impl std::fmt::Debug for HttpHelpdesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHelpdesk")
            .field("base_url", &self.base_url)
            .field("auth_header", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl HttpHelpdesk {
    /// Build a client from configuration
    ///
    /// Fails with [`DeskError::IntegrationDisabled`] when the endpoint or the
    /// credential is missing.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let (Some(base_url), Some(api_key)) =
            (config.base_url.as_deref(), config.api_key.as_deref())
        else {
            return Err(DeskError::IntegrationDisabled);
        };
        if !config.is_enabled() {
            return Err(DeskError::IntegrationDisabled);
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeskError::remote(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let portal_url = config
            .portal_url
            .as_deref()
            .map_or_else(|| base_url.clone(), |url| url.trim_end_matches('/').to_string());

        Ok(Self {
            http,
            base_url,
            portal_url,
            auth_header: Self::auth_header(api_key),
        })
    }

    /// Basic auth with the API key as user and a dummy password
    fn auth_header(api_key: &str) -> String {
        let encoded = BASE64_STANDARD.encode(format!("{api_key}:X"));
        format!("Basic {encoded}")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let response = request
            .header(AUTHORIZATION, &self.auth_header)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DeskError::remote(format!("{what}: request timed out"))
                } else {
                    DeskError::remote(format!("{what}: failed to call helpdesk: {err}"))
                }
            })?;
        Self::parse(response, what).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(DeskError::remote(format!(
                "{what}: helpdesk responded with {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|err| DeskError::remote(format!("{what}: failed to parse response: {err}")))
    }
}

#[async_trait]
impl RemoteHelpdesk for HttpHelpdesk {
    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<RemoteTicket> {
        let builder = self.http.post(self.endpoint("tickets")).json(request);
        self.send(builder, "create ticket").await
    }

    async fn update_ticket(
        &self,
        remote_id: &str,
        request: &UpdateTicketRequest,
    ) -> Result<RemoteTicket> {
        let builder = self
            .http
            .put(self.endpoint(&format!("tickets/{remote_id}")))
            .json(request);
        self.send(builder, "update ticket").await
    }

    async fn get_ticket(&self, remote_id: &str) -> Result<RemoteTicket> {
        let builder = self.http.get(self.endpoint(&format!("tickets/{remote_id}")));
        self.send(builder, "fetch ticket").await
    }

    async fn conversations(&self, remote_id: &str) -> Result<Vec<RemoteConversation>> {
        let builder = self
            .http
            .get(self.endpoint(&format!("tickets/{remote_id}/conversations")));
        self.send(builder, "list conversations").await
    }

    async fn create_note(
        &self,
        remote_id: &str,
        request: &CreateNoteRequest,
    ) -> Result<RemoteConversation> {
        let builder = self
            .http
            .post(self.endpoint(&format!("tickets/{remote_id}/notes")))
            .json(request);
        self.send(builder, "create note").await
    }

    fn ticket_url(&self, remote_id: &str) -> String {
        format!("{}/tickets/{remote_id}", self.portal_url)
    }
}
