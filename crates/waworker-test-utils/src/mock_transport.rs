// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable in-memory transport for supervisor tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use waworker_core::traits::{Transport, TransportFactory};
use waworker_core::types::{SessionCreds, TransportEvent};
use waworker_core::WorkerError;

/// What the factory does on one connect attempt.
pub enum ConnectOutcome {
    /// Deliver these events, then stay live for later injection.
    Events(Vec<TransportEvent>),
    /// Fail the handshake.
    Fail(WorkerError),
    /// Pend until the supervisor cancels the attempt.
    HangUntilCancel,
}

/// A message "sent" through a mock transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub text: String,
    pub id: String,
}

/// Factory whose connect attempts follow a scripted queue of outcomes.
///
/// Attempts beyond the script get a live, silent transport that events
/// can be injected into.
pub struct MockTransportFactory {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    connects: AtomicU32,
    connected: Notify,
    /// `creds` argument of the most recent connect.
    last_creds: Mutex<Option<Option<SessionCreds>>>,
    live: Mutex<Vec<mpsc::UnboundedSender<TransportEvent>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    send_counter: Arc<AtomicU32>,
}

impl MockTransportFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(VecDeque::new()),
            connects: AtomicU32::new(0),
            connected: Notify::new(),
            last_creds: Mutex::new(None),
            live: Mutex::new(Vec::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            send_counter: Arc::new(AtomicU32::new(0)),
        })
    }

    pub fn push_outcome(&self, outcome: ConnectOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    /// Block until at least `n` connect attempts have been made.
    pub async fn wait_connects(&self, n: u32) {
        loop {
            if self.connect_count() >= n {
                return;
            }
            self.connected.notified().await;
        }
    }

    /// The creds offered on the most recent connect attempt, if any
    /// attempt happened.
    pub fn last_offered_creds(&self) -> Option<Option<SessionCreds>> {
        self.last_creds.lock().unwrap().clone()
    }

    /// Push an event into the most recent live transport.
    pub fn inject(&self, event: TransportEvent) {
        let live = self.live.lock().unwrap();
        let tx = live.last().expect("no live mock transport to inject into");
        tx.send(event).expect("mock transport dropped");
    }

    /// Close the most recent live transport's event stream.
    pub fn end_stream(&self) {
        self.live.lock().unwrap().pop();
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn connect(
        &self,
        _channel_id: &str,
        creds: Option<SessionCreds>,
        cancel: CancellationToken,
    ) -> Result<Box<dyn Transport>, WorkerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        *self.last_creds.lock().unwrap() = Some(creds);
        self.connected.notify_waiters();

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Events(Vec::new()));
        match outcome {
            ConnectOutcome::Fail(e) => Err(e),
            ConnectOutcome::HangUntilCancel => {
                cancel.cancelled().await;
                Err(WorkerError::Transport {
                    message: "connect cancelled".into(),
                    source: None,
                })
            }
            ConnectOutcome::Events(events) => {
                let (tx, rx) = mpsc::unbounded_channel();
                for event in events {
                    let _ = tx.send(event);
                }
                self.live.lock().unwrap().push(tx);
                Ok(Box::new(MockTransport {
                    rx,
                    sent: self.sent.clone(),
                    counter: self.send_counter.clone(),
                }))
            }
        }
    }
}

/// One live mock session; events arrive from the factory's `inject`.
pub struct MockTransport {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    counter: Arc<AtomicU32>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }

    async fn send_text(&mut self, to: &str, text: &str) -> Result<String, WorkerError> {
        let id = format!("mock-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            text: text.to_string(),
            id: id.clone(),
        });
        Ok(id)
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}
