//! Completion client for the orchestrator's internal endpoint.
//!
//! The endpoint is an opaque request/response service: the full message
//! log plus an agent identifier go in, generated text comes out. Model
//! routing and any memory augmentation happen behind the proxy and are
//! invisible here.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::core::message::Message;

/// Abstraction over the completion endpoint.
///
/// Implementations never fail: any transport, encoding, or endpoint-side
/// problem is folded into the returned text so the loop can surface it
/// in the conversation instead of crashing. Tests use scripted clients
/// that return predetermined responses.
pub trait CompletionClient {
    fn complete(&self, messages: &[Message], agent_id: &str) -> String;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    messages: &'a [Message],
    agent_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    output: String,
}

/// Blocking HTTP client for `<orchestrator>/api/internal/llm`.
pub struct HttpCompletionClient {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpCompletionClient {
    /// Build a client with a bounded request timeout. The completion
    /// call is network-bound; the timeout keeps it from blocking the
    /// loop indefinitely.
    pub fn new(orchestrator_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/api/internal/llm",
                orchestrator_url.trim_end_matches('/')
            ),
        })
    }

    fn try_complete(&self, messages: &[Message], agent_id: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CompletionRequest { messages, agent_id })
            .send()
            .context("send completion request")?
            .error_for_status()
            .context("completion endpoint returned error status")?;
        let body: CompletionResponse = response.json().context("parse completion response")?;
        Ok(body.output)
    }
}

impl CompletionClient for HttpCompletionClient {
    #[instrument(skip_all, fields(message_count = messages.len()))]
    fn complete(&self, messages: &[Message], agent_id: &str) -> String {
        match self.try_complete(messages, agent_id) {
            Ok(output) => {
                debug!(output_bytes = output.len(), "completion received");
                output
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "completion request failed");
                format!("Error communicating with orchestrator: {err:#}")
            }
        }
    }
}
