// SPDX-FileCopyrightText: 2026 Waworker Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel session actor.
//!
//! Each channel is owned by exactly one actor task. The actor holds the
//! transport, the in-flight connect future, and the reconnect timer as
//! its own state, so there is never more than one connect attempt per
//! channel — single-flight by construction, not by locking. All control
//! operations arrive over the command channel and are answered with a
//! oneshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use waworker_autoreply::{AutoReplyDispatcher, ReplySender};
use waworker_core::traits::{Transport, TransportFactory};
use waworker_core::types::{
    now_millis, ChannelPatch, ChannelStatus, CloseReason, LastError, RetryDecision,
    TransportEvent,
};
use waworker_core::WorkerError;
use waworker_ingress::MessageIngress;
use waworker_store::ChannelPublisher;
use waworker_transport::{qr, SessionStore};

use crate::backoff::Backoff;

/// Control operations accepted by a channel actor.
pub enum ChannelCommand {
    RequestQr(oneshot::Sender<Result<(), WorkerError>>),
    Disconnect(oneshot::Sender<Result<(), WorkerError>>),
    ResetSession(oneshot::Sender<Result<(), WorkerError>>),
    Repair(oneshot::Sender<Result<(), WorkerError>>),
    Send {
        to: String,
        text: String,
        reply: oneshot::Sender<Result<String, WorkerError>>,
    },
    Status(oneshot::Sender<ChannelStatus>),
}

/// Cloneable handle to a channel actor.
#[derive(Clone)]
pub struct ChannelHandle {
    channel_id: String,
    tx: mpsc::Sender<ChannelCommand>,
}

fn actor_gone() -> WorkerError {
    WorkerError::Internal("channel actor stopped".into())
}

impl ChannelHandle {
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub async fn request_qr(&self) -> Result<(), WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::RequestQr(tx))
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn disconnect(&self) -> Result<(), WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::Disconnect(tx))
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn reset_session(&self) -> Result<(), WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::ResetSession(tx))
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn repair(&self) -> Result<(), WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::Repair(tx))
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn send_message(&self, to: &str, text: &str) -> Result<String, WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::Send {
                to: to.to_string(),
                text: text.to_string(),
                reply: tx,
            })
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())?
    }

    pub async fn status(&self) -> Result<ChannelStatus, WorkerError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(ChannelCommand::Status(tx))
            .await
            .map_err(|_| actor_gone())?;
        rx.await.map_err(|_| actor_gone())
    }
}

#[async_trait]
impl ReplySender for ChannelHandle {
    async fn send_text(&self, jid: &str, text: &str) -> Result<String, WorkerError> {
        self.send_message(jid, text).await
    }
}

/// Everything a channel actor needs besides its own identity.
#[derive(Clone)]
pub struct ChannelDeps {
    pub factory: Arc<dyn TransportFactory>,
    pub sessions: SessionStore,
    pub publisher: ChannelPublisher,
    pub ingress: MessageIngress,
    pub dispatcher: Option<Arc<AutoReplyDispatcher>>,
    pub backoff: Arc<Backoff>,
}

type ConnectFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn Transport>, WorkerError>> + Send>>;

pub(crate) fn spawn_channel(
    channel_id: String,
    deps: ChannelDeps,
    cancel: CancellationToken,
) -> (ChannelHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(32);
    let handle = ChannelHandle {
        channel_id: channel_id.clone(),
        tx,
    };
    let actor = ChannelActor {
        channel_id,
        deps,
        rx,
        handle: handle.clone(),
        cancel,
        status: ChannelStatus::Disconnected,
        transport: None,
        connect_fut: None,
        connect_cancel: None,
        retry_sleep: None,
        attempt: 0,
        needs_new_pairing: false,
    };
    let join = tokio::spawn(actor.run());
    (handle, join)
}

struct ChannelActor {
    channel_id: String,
    deps: ChannelDeps,
    rx: mpsc::Receiver<ChannelCommand>,
    /// Own handle, cloned into spawned auto-reply tasks.
    handle: ChannelHandle,
    cancel: CancellationToken,
    status: ChannelStatus,
    transport: Option<Box<dyn Transport>>,
    connect_fut: Option<ConnectFuture>,
    connect_cancel: Option<CancellationToken>,
    retry_sleep: Option<Pin<Box<Sleep>>>,
    /// Consecutive failed attempts since the last successful open.
    attempt: u32,
    /// Set after a logged-out style close; the next requestQr wipes
    /// creds so the endpoint issues a fresh pairing.
    needs_new_pairing: bool,
}

async fn next_transport_event(
    transport: &mut Option<Box<dyn Transport>>,
) -> Option<TransportEvent> {
    match transport {
        Some(t) => t.next_event().await,
        None => std::future::pending().await,
    }
}

async fn poll_connect(
    fut: &mut Option<ConnectFuture>,
) -> Result<Box<dyn Transport>, WorkerError> {
    match fut {
        Some(f) => f.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_retry(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(s) => s.as_mut().await,
        None => std::future::pending().await,
    }
}

impl ChannelActor {
    async fn run(mut self) {
        debug!(channel_id = %self.channel_id, "channel actor started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.teardown().await;
                    break;
                }
                cmd = self.rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            self.teardown().await;
                            break;
                        }
                    }
                }
                event = next_transport_event(&mut self.transport),
                    if self.transport.is_some() =>
                {
                    self.handle_event(event).await;
                }
                result = poll_connect(&mut self.connect_fut),
                    if self.connect_fut.is_some() =>
                {
                    self.connect_fut = None;
                    self.connect_cancel = None;
                    self.handle_connect_result(result).await;
                }
                _ = wait_retry(&mut self.retry_sleep), if self.retry_sleep.is_some() => {
                    self.retry_sleep = None;
                    self.begin_connect().await;
                }
            }
        }
        debug!(channel_id = %self.channel_id, "channel actor stopped");
    }

    async fn handle_command(&mut self, cmd: ChannelCommand) {
        match cmd {
            ChannelCommand::RequestQr(reply) => {
                let _ = reply.send(self.request_qr().await);
            }
            ChannelCommand::Disconnect(reply) => {
                let _ = reply.send(self.disconnect().await);
            }
            ChannelCommand::ResetSession(reply) => {
                let _ = reply.send(self.reset_session().await);
            }
            ChannelCommand::Repair(reply) => {
                let _ = reply.send(self.repair().await);
            }
            ChannelCommand::Send { to, text, reply } => {
                let _ = reply.send(self.send_message(&to, &text).await);
            }
            ChannelCommand::Status(reply) => {
                let _ = reply.send(self.status);
            }
        }
    }

    /// Start (or join) a pairing attempt.
    ///
    /// Idempotent while a connect or pairing is already under way; an
    /// established session must be disconnected first.
    async fn request_qr(&mut self) -> Result<(), WorkerError> {
        match self.status {
            ChannelStatus::Connected => Err(WorkerError::AlreadyConnected),
            ChannelStatus::Connecting | ChannelStatus::Qr => Ok(()),
            ChannelStatus::Disconnected | ChannelStatus::Error => {
                if self.needs_new_pairing {
                    if let Err(e) = self.deps.sessions.wipe(&self.channel_id).await {
                        warn!(channel_id = %self.channel_id, error = %e,
                            "stale cred wipe failed, connecting anyway");
                    }
                    self.needs_new_pairing = false;
                }
                self.retry_sleep = None;
                self.attempt = 0;
                self.begin_connect().await;
                Ok(())
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), WorkerError> {
        self.abort_connect();
        self.retry_sleep = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        self.attempt = 0;
        self.status = ChannelStatus::Disconnected;
        self.deps
            .publisher
            .publish(
                &self.channel_id,
                &ChannelPatch::status(ChannelStatus::Disconnected)
                    .clear_qr()
                    .clear_phone()
                    .clear_error(),
            )
            .await;
        info!(channel_id = %self.channel_id, "channel disconnected");
        Ok(())
    }

    async fn reset_session(&mut self) -> Result<(), WorkerError> {
        self.disconnect().await?;
        self.deps.sessions.wipe(&self.channel_id).await?;
        self.needs_new_pairing = false;
        info!(channel_id = %self.channel_id, "session material wiped");
        Ok(())
    }

    /// Kick a stuck channel. A healthy or pairing channel is left
    /// alone; a deliberately disconnected one is not "repairable".
    async fn repair(&mut self) -> Result<(), WorkerError> {
        match self.status {
            ChannelStatus::Connected | ChannelStatus::Connecting | ChannelStatus::Qr => {
                Ok(())
            }
            ChannelStatus::Error => {
                self.retry_sleep = None;
                self.abort_connect();
                if let Some(mut transport) = self.transport.take() {
                    transport.close().await;
                }
                self.attempt = 0;
                self.begin_connect().await;
                Ok(())
            }
            ChannelStatus::Disconnected => Err(WorkerError::Precondition(
                "channel is not running; request a QR pairing instead".into(),
            )),
        }
    }

    async fn send_message(&mut self, to: &str, text: &str) -> Result<String, WorkerError> {
        if self.status != ChannelStatus::Connected {
            return Err(WorkerError::NotConnected);
        }
        let transport = self.transport.as_mut().ok_or(WorkerError::NotConnected)?;
        transport.send_text(to, text).await
    }

    fn abort_connect(&mut self) {
        if let Some(cancel) = self.connect_cancel.take() {
            cancel.cancel();
        }
        self.connect_fut = None;
    }

    async fn begin_connect(&mut self) {
        self.status = ChannelStatus::Connecting;
        // A fresh attempt supersedes whatever error the last one left.
        self.deps
            .publisher
            .publish(
                &self.channel_id,
                &ChannelPatch::status(ChannelStatus::Connecting)
                    .clear_qr()
                    .clear_error(),
            )
            .await;

        let cancel = self.cancel.child_token();
        self.connect_cancel = Some(cancel.clone());
        let factory = self.deps.factory.clone();
        let sessions = self.deps.sessions.clone();
        let channel_id = self.channel_id.clone();
        self.connect_fut = Some(Box::pin(async move {
            let creds = sessions.load(&channel_id).await?;
            factory.connect(&channel_id, creds, cancel).await
        }));
        debug!(channel_id = %self.channel_id, "connect attempt started");
    }

    async fn handle_connect_result(
        &mut self,
        result: Result<Box<dyn Transport>, WorkerError>,
    ) {
        match result {
            Ok(transport) => {
                // Still CONNECTING: the session moves to QR or CONNECTED
                // on its first event.
                self.transport = Some(transport);
            }
            Err(e) => {
                warn!(channel_id = %self.channel_id, error = %e, "connect attempt failed");
                self.fail_and_schedule_retry(e.code(), &e.to_string()).await;
            }
        }
    }

    async fn handle_event(&mut self, event: Option<TransportEvent>) {
        let Some(event) = event else {
            // Stream exhausted without a close event.
            self.handle_close(CloseReason::ConnectionLost).await;
            return;
        };
        match event {
            TransportEvent::Qr(payload) => {
                self.status = ChannelStatus::Qr;
                let patch = match qr::svg_data_url(&payload) {
                    Ok(url) => ChannelPatch::status(ChannelStatus::Qr)
                        .with_qr(payload, url)
                        .clear_error(),
                    Err(e) => {
                        warn!(channel_id = %self.channel_id, error = %e,
                            "qr render failed, publishing raw payload only");
                        let mut patch =
                            ChannelPatch::status(ChannelStatus::Qr).clear_error();
                        patch.qr = waworker_core::types::Field::Set(payload);
                        patch
                    }
                };
                self.deps.publisher.publish(&self.channel_id, &patch).await;
                info!(channel_id = %self.channel_id, "qr issued");
            }
            TransportEvent::Open { phone_e164 } => {
                self.status = ChannelStatus::Connected;
                self.attempt = 0;
                self.needs_new_pairing = false;
                info!(channel_id = %self.channel_id, phone = ?phone_e164, "session open");
                self.deps
                    .publisher
                    .publish(
                        &self.channel_id,
                        &ChannelPatch::status(ChannelStatus::Connected)
                            .clear_qr()
                            .with_phone(phone_e164)
                            .clear_error()
                            .with_last_seen(now_millis()),
                    )
                    .await;
            }
            TransportEvent::Creds(creds) => {
                if let Err(e) = self.deps.sessions.save(&self.channel_id, &creds).await {
                    warn!(channel_id = %self.channel_id, error = %e,
                        "cred persistence failed; next restart will need a fresh pairing");
                }
            }
            TransportEvent::Message(payload) => {
                if self.status == ChannelStatus::Connected {
                    self.deps
                        .publisher
                        .publish(
                            &self.channel_id,
                            &ChannelPatch::default().with_last_seen(now_millis()),
                        )
                        .await;
                }
                match self.deps.ingress.handle_inbound(&self.channel_id, &payload).await {
                    Ok(Some(inbound)) => {
                        if let Some(dispatcher) = &self.deps.dispatcher {
                            let dispatcher = dispatcher.clone();
                            let handle = self.handle.clone();
                            let channel_id = self.channel_id.clone();
                            tokio::spawn(async move {
                                dispatcher.dispatch(&channel_id, &inbound, &handle).await;
                            });
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(channel_id = %self.channel_id, error = %e,
                            "inbound message handling failed");
                    }
                }
            }
            TransportEvent::Receipt { message_id, status } => {
                if let Err(e) = self
                    .deps
                    .ingress
                    .handle_receipt(&self.channel_id, &message_id, status)
                    .await
                {
                    warn!(channel_id = %self.channel_id, message_id, error = %e,
                        "receipt handling failed");
                }
            }
            TransportEvent::Closed(reason) => {
                self.handle_close(reason).await;
            }
        }
    }

    async fn handle_close(&mut self, reason: CloseReason) {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        match reason.retry_decision() {
            RetryDecision::RequireNewPairing => {
                info!(channel_id = %self.channel_id, %reason,
                    "session dead, new pairing required");
                self.needs_new_pairing = true;
                if let Err(e) = self.deps.sessions.wipe(&self.channel_id).await {
                    warn!(channel_id = %self.channel_id, error = %e, "cred wipe failed");
                }
                self.retry_sleep = None;
                self.attempt = 0;
                self.status = ChannelStatus::Disconnected;
                self.deps
                    .publisher
                    .publish(
                        &self.channel_id,
                        &ChannelPatch::status(ChannelStatus::Disconnected)
                            .clear_qr()
                            .clear_phone()
                            .with_error(LastError {
                                code: reason.to_string(),
                                message: format!("session closed: {reason}"),
                            }),
                    )
                    .await;
            }
            RetryDecision::Retry => {
                warn!(channel_id = %self.channel_id, %reason, "session closed, will retry");
                self.fail_and_schedule_retry(
                    &reason.to_string(),
                    &format!("session closed: {reason}"),
                )
                .await;
            }
        }
    }

    async fn fail_and_schedule_retry(&mut self, code: &str, message: &str) {
        self.status = ChannelStatus::Error;
        self.deps
            .publisher
            .publish(
                &self.channel_id,
                &ChannelPatch::status(ChannelStatus::Error)
                    .clear_qr()
                    .clear_phone()
                    .with_error(LastError {
                        code: code.to_string(),
                        message: message.to_string(),
                    }),
            )
            .await;
        let delay = self.deps.backoff.delay(self.attempt);
        self.attempt += 1;
        debug!(channel_id = %self.channel_id, attempt = self.attempt, ?delay,
            "reconnect scheduled");
        self.retry_sleep = Some(Box::pin(tokio::time::sleep(delay)));
    }

    async fn teardown(&mut self) {
        self.abort_connect();
        self.retry_sleep = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close().await;
        }
        if self.status != ChannelStatus::Disconnected {
            self.status = ChannelStatus::Disconnected;
            self.deps
                .publisher
                .publish(
                    &self.channel_id,
                    &ChannelPatch::status(ChannelStatus::Disconnected)
                        .clear_qr()
                        .clear_phone(),
                )
                .await;
        }
    }
}
