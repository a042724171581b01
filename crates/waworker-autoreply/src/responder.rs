// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external reply generator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use waworker_config::model::ResponderConfig;
use waworker_core::traits::{ReplyContext, Responder};
use waworker_core::WorkerError;

/// Responder backed by an HTTP endpoint.
///
/// Request: `POST {endpoint}` with the full reply context as JSON.
/// Response: `{"reply": "text"}` or `{"reply": null}` to decline.
pub struct HttpResponder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    system_rules: &'a str,
    product_details: &'a str,
    sales_strategy: &'a str,
    history: Vec<WireTurn<'a>>,
    inbound_text: &'a str,
}

#[derive(Serialize)]
struct WireTurn<'a> {
    role: &'static str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ReplyResponse {
    #[serde(default)]
    reply: Option<String>,
}

impl HttpResponder {
    /// Build from config. `None` when no endpoint is configured, which
    /// disables auto-reply dispatch entirely.
    pub fn from_config(config: &ResponderConfig) -> Result<Option<Self>, WorkerError> {
        let Some(endpoint) = &config.endpoint else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WorkerError::Responder {
                message: "build http client".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(Some(Self {
            client,
            endpoint: endpoint.clone(),
            api_key: config.api_key.clone(),
        }))
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn reply(&self, ctx: &ReplyContext) -> Result<Option<String>, WorkerError> {
        let body = ReplyRequest {
            system_rules: &ctx.system_rules,
            product_details: &ctx.product_details,
            sales_strategy: &ctx.sales_strategy,
            history: ctx
                .history
                .iter()
                .map(|turn| WireTurn {
                    role: if turn.from_me { "assistant" } else { "customer" },
                    text: &turn.text,
                })
                .collect(),
            inbound_text: &ctx.inbound_text,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                WorkerError::Timeout {
                    duration: Duration::from_secs(0),
                }
            } else {
                WorkerError::Responder {
                    message: "responder request failed".into(),
                    source: Some(Box::new(e)),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(WorkerError::Responder {
                message: format!("responder returned {}", response.status()),
                source: None,
            });
        }

        let parsed: ReplyResponse =
            response.json().await.map_err(|e| WorkerError::Responder {
                message: "malformed responder payload".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(parsed.reply.filter(|r| !r.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waworker_core::traits::HistoryEntry;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> ResponderConfig {
        ResponderConfig {
            endpoint: Some(endpoint),
            api_key: Some("sk-test".into()),
            timeout_secs: 5,
            history_limit: 20,
        }
    }

    fn context() -> ReplyContext {
        ReplyContext {
            system_rules: "rules".into(),
            product_details: "pottery".into(),
            sales_strategy: "friendly".into(),
            history: vec![
                HistoryEntry {
                    from_me: false,
                    text: "oi".into(),
                },
                HistoryEntry {
                    from_me: true,
                    text: "olá!".into(),
                },
            ],
            inbound_text: "vocês entregam?".into(),
        }
    }

    #[tokio::test]
    async fn posts_context_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/reply"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "productDetails": "pottery",
                "inboundText": "vocês entregam?",
                "history": [
                    {"role": "customer", "text": "oi"},
                    {"role": "assistant", "text": "olá!"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "reply": "Entregamos sim!"
                })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let responder = HttpResponder::from_config(&config(format!("{}/reply", server.uri())))
            .unwrap()
            .unwrap();
        let reply = responder.reply(&context()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Entregamos sim!"));
    }

    #[tokio::test]
    async fn null_reply_means_decline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": null})),
            )
            .mount(&server)
            .await;

        let responder = HttpResponder::from_config(&config(server.uri()))
            .unwrap()
            .unwrap();
        assert!(responder.reply(&context()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn blank_reply_is_treated_as_decline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": "  "})),
            )
            .mount(&server)
            .await;

        let responder = HttpResponder::from_config(&config(server.uri()))
            .unwrap()
            .unwrap();
        assert!(responder.reply(&context()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_a_responder_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let responder = HttpResponder::from_config(&config(server.uri()))
            .unwrap()
            .unwrap();
        let err = responder.reply(&context()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Responder { .. }));
    }

    #[test]
    fn missing_endpoint_disables_responder() {
        let config = ResponderConfig::default();
        assert!(HttpResponder::from_config(&config).unwrap().is_none());
    }
}
