// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire codec for the pairing endpoint.
//!
//! Server -> Worker (JSON text frames):
//! ```json
//! {"event": "qr", "payload": "2@abc..."}
//! {"event": "open", "phone": "+5511999990000"}
//! {"event": "creds", "data": {...opaque...}}
//! {"event": "message", "data": {...loosely shaped...}}
//! {"event": "receipt", "id": "3EB0...", "status": "delivered"}
//! {"event": "close", "reason": "loggedOut"}
//! ```
//!
//! Worker -> Server:
//! ```json
//! {"action": "init", "channelId": "ch1", "creds": {...} | null}
//! {"action": "send", "id": "uuid", "to": "5511@s.whatsapp.net", "text": "..."}
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use waworker_core::types::{CloseReason, SessionCreds, TransportEvent};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
enum WireEvent {
    #[serde(rename_all = "camelCase")]
    Qr { payload: String },
    #[serde(rename_all = "camelCase")]
    Open {
        #[serde(default)]
        phone: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Creds { data: serde_json::Value },
    #[serde(rename_all = "camelCase")]
    Message { data: serde_json::Value },
    #[serde(rename_all = "camelCase")]
    Receipt { id: String, status: String },
    #[serde(rename_all = "camelCase")]
    Close {
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Commands the worker writes to the endpoint.
#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum WireCommand<'a> {
    #[serde(rename_all = "camelCase")]
    Init {
        channel_id: &'a str,
        creds: Option<&'a serde_json::Value>,
    },
    #[serde(rename_all = "camelCase")]
    Send {
        id: &'a str,
        to: &'a str,
        text: &'a str,
    },
}

/// Decode one text frame into a transport event.
///
/// Unparseable frames and unknown receipt statuses are logged and
/// skipped (`None`), never surfaced as errors.
pub fn decode(text: &str) -> Option<TransportEvent> {
    let wire: WireEvent = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparseable transport frame, skipping");
            return None;
        }
    };
    match wire {
        WireEvent::Qr { payload } => Some(TransportEvent::Qr(payload)),
        WireEvent::Open { phone } => Some(TransportEvent::Open { phone_e164: phone }),
        WireEvent::Creds { data } => Some(TransportEvent::Creds(SessionCreds(data))),
        WireEvent::Message { data } => Some(TransportEvent::Message(data)),
        WireEvent::Receipt { id, status } => match status.parse() {
            Ok(status) => Some(TransportEvent::Receipt {
                message_id: id,
                status,
            }),
            Err(_) => {
                warn!(status, "unknown receipt status, skipping");
                None
            }
        },
        WireEvent::Close { reason } => {
            let reason = reason
                .as_deref()
                .map(CloseReason::from_wire)
                .unwrap_or(CloseReason::Unknown);
            Some(TransportEvent::Closed(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waworker_core::types::MessageStatus;

    #[test]
    fn decodes_qr_event() {
        let event = decode(r#"{"event":"qr","payload":"2@abc"}"#).unwrap();
        assert!(matches!(event, TransportEvent::Qr(p) if p == "2@abc"));
    }

    #[test]
    fn decodes_open_with_and_without_phone() {
        let event = decode(r#"{"event":"open","phone":"+5511999990000"}"#).unwrap();
        assert!(matches!(
            event,
            TransportEvent::Open { phone_e164: Some(p) } if p == "+5511999990000"
        ));
        let event = decode(r#"{"event":"open"}"#).unwrap();
        assert!(matches!(event, TransportEvent::Open { phone_e164: None }));
    }

    #[test]
    fn decodes_creds_as_opaque_blob() {
        let event = decode(r#"{"event":"creds","data":{"noiseKey":"x","me":{"id":"y"}}}"#)
            .unwrap();
        match event {
            TransportEvent::Creds(creds) => {
                assert_eq!(creds.0["noiseKey"], "x");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn decodes_receipt_status() {
        let event = decode(r#"{"event":"receipt","id":"m1","status":"delivered"}"#).unwrap();
        assert!(matches!(
            event,
            TransportEvent::Receipt { message_id, status }
                if message_id == "m1" && status == MessageStatus::Delivered
        ));
    }

    #[test]
    fn unknown_receipt_status_is_skipped() {
        assert!(decode(r#"{"event":"receipt","id":"m1","status":"teleported"}"#).is_none());
    }

    #[test]
    fn decodes_close_reasons() {
        let event = decode(r#"{"event":"close","reason":"loggedOut"}"#).unwrap();
        assert!(matches!(
            event,
            TransportEvent::Closed(CloseReason::LoggedOut)
        ));
        let event = decode(r#"{"event":"close"}"#).unwrap();
        assert!(matches!(event, TransportEvent::Closed(CloseReason::Unknown)));
    }

    #[test]
    fn garbage_frame_is_skipped() {
        assert!(decode("not json").is_none());
        assert!(decode(r#"{"event":"hologram"}"#).is_none());
    }

    #[test]
    fn init_command_serializes_camel_case() {
        let creds = serde_json::json!({"k": 1});
        let frame = serde_json::to_string(&WireCommand::Init {
            channel_id: "ch1",
            creds: Some(&creds),
        })
        .unwrap();
        assert!(frame.contains(r#""action":"init""#));
        assert!(frame.contains(r#""channelId":"ch1""#));

        let frame = serde_json::to_string(&WireCommand::Init {
            channel_id: "ch1",
            creds: None,
        })
        .unwrap();
        assert!(frame.contains(r#""creds":null"#));
    }

    #[test]
    fn send_command_carries_id_to_text() {
        let frame = serde_json::to_string(&WireCommand::Send {
            id: "u-1",
            to: "5511@s.whatsapp.net",
            text: "oi",
        })
        .unwrap();
        assert!(frame.contains(r#""action":"send""#));
        assert!(frame.contains(r#""to":"5511@s.whatsapp.net""#));
    }
}
