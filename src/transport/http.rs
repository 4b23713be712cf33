//! HTTP binding of the riddle service.
//!
//! `POST {base}/{roomId}/chat?userPrompt=<text>` answers with the reply as
//! plain text; `GET {base}/rooms` answers with a JSON array of rooms.

use super::http_client::build_transport_client;
use super::traits::ChatTransport;
use crate::BoxFuture;
use crate::error::TransportError;
use crate::session::types::{RoomId, RoomSummary};
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Longest error body kept in a `TransportError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct RemoteRoom {
    #[serde(alias = "roomId")]
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    created_at: Option<String>,
}

impl RemoteRoom {
    fn into_summary(self, fetched_at: DateTime<Utc>) -> RoomSummary {
        let timestamp = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or(fetched_at, |parsed| parsed.with_timezone(&Utc));
        RoomSummary {
            id: RoomId(self.id),
            title: self
                .name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("房间 {}", self.id)),
            timestamp,
        }
    }
}

pub struct HttpTransport {
    base_url: Url,
    client: Client,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            client: build_transport_client(request_timeout, connect_timeout),
            request_timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|err| TransportError::Connect(format!("bad endpoint {path}: {err}")))
    }

    fn map_request_error(&self, err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            let millis = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
            TransportError::Timeout(millis)
        } else if err.is_decode() || err.is_body() {
            TransportError::Malformed(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }

    async fn check_status(&self, response: Response) -> Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}

impl ChatTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    fn send<'a>(
        &'a self,
        room_id: RoomId,
        text: &'a str,
    ) -> BoxFuture<'a, Result<String, TransportError>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("{room_id}/chat"))?;
            let response = self
                .client
                .post(url)
                .query(&[("userPrompt", text)])
                .send()
                .await
                .map_err(|err| self.map_request_error(&err))?;
            let response = self.check_status(response).await?;
            response
                .text()
                .await
                .map_err(|err| TransportError::Malformed(err.to_string()))
        })
    }

    fn list_rooms(&self) -> BoxFuture<'_, Result<Vec<RoomSummary>, TransportError>> {
        Box::pin(async move {
            let url = self.endpoint("rooms")?;
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|err| self.map_request_error(&err))?;
            let response = self.check_status(response).await?;
            let body = response
                .bytes()
                .await
                .map_err(|err| self.map_request_error(&err))?;
            let rooms: Vec<RemoteRoom> = serde_json::from_slice(&body)
                .map_err(|err| TransportError::Malformed(format!("room list: {err}")))?;

            let fetched_at = Utc::now();
            let mut summaries: Vec<RoomSummary> = rooms
                .into_iter()
                .map(|room| room.into_summary(fetched_at))
                .collect();
            summaries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(summaries)
        })
    }
}
