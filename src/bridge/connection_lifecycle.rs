//! Native connection setup and teardown.
//!
//! All transitions go through one async gate held across the native call, so
//! concurrent `init_connection` calls perform a single native initialization
//! and a concurrent `end_connection` waits for it to settle.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    bridge::{event_buffer::EventBuffer, purchase_request_router::PurchaseRequestRouter},
    domain::{
        entities::{connection_config::InitConnectionConfig, error_code::ErrorCode},
        repositories::billing_repository::BillingRepository,
    },
    errors::{InitConnectionFailed, NotPrepared, PurchaseError, ServiceDisconnected},
};

#[derive(Default)]
struct LifecycleState {
    listeners_attached: bool,
    forwarder: Option<JoinHandle<()>>,
}

pub struct ConnectionLifecycle<R: BillingRepository + ?Sized> {
    repository: Arc<R>,
    events: Arc<EventBuffer>,
    router: Arc<PurchaseRequestRouter>,
    init_timeout: Option<Duration>,
    gate: tokio::sync::Mutex<LifecycleState>,
}

impl<R: BillingRepository + ?Sized> ConnectionLifecycle<R> {
    pub fn new(
        repository: Arc<R>,
        events: Arc<EventBuffer>,
        router: Arc<PurchaseRequestRouter>,
        init_timeout: Option<Duration>,
    ) -> Self {
        Self {
            repository,
            events,
            router,
            init_timeout,
            gate: tokio::sync::Mutex::new(LifecycleState::default()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.events.is_ready()
    }

    /// Guard for every operation that needs a live connection.
    pub fn ensure_connection(&self) -> Result<(), PurchaseError> {
        if self.events.is_ready() {
            Ok(())
        } else {
            Err(NotPrepared::new("").with_platform(self.repository.platform()))
        }
    }

    pub async fn init_connection(
        &self,
        config: &InitConnectionConfig,
    ) -> Result<bool, PurchaseError> {
        let mut state = self.gate.lock().await;
        if self.events.is_ready() {
            tracing::debug!("connection already initialized");
            return Ok(true);
        }

        if !state.listeners_attached {
            self.attach_listeners(&mut state);
        }

        let platform = self.repository.platform();
        let outcome = match self.init_timeout {
            Some(limit) => tokio::time::timeout(limit, self.repository.init_connection(config))
                .await
                .unwrap_or_else(|_| {
                    Err(InitConnectionFailed::new(&format!(
                        "Timed out after {}ms.",
                        limit.as_millis()
                    ))
                    .with_platform(platform))
                }),
            None => self.repository.init_connection(config).await,
        };

        match outcome {
            Ok(true) => {
                self.router.open();
                let flushed = self.events.mark_ready_and_flush();
                tracing::info!(%platform, flushed, "billing connection ready");
                Ok(true)
            }
            Ok(false) => {
                self.events.reset();
                tracing::warn!(%platform, "billing service unavailable");
                Err(InitConnectionFailed::new("The billing service is unavailable.")
                    .with_platform(platform))
            }
            Err(cause) if cause.code() == ErrorCode::InitConnection => {
                self.events.reset();
                tracing::warn!(%platform, error = %cause, "billing connection failed");
                Err(cause)
            }
            Err(cause) => {
                self.events.reset();
                tracing::warn!(%platform, error = %cause, "billing connection failed");
                Err(InitConnectionFailed::new(cause.message())
                    .with_platform(platform)
                    .caused_by(&cause))
            }
        }
    }

    /// Tears the connection down. Native teardown failures are logged and
    /// swallowed; the bridge always ends up disconnected.
    pub async fn end_connection(&self) -> bool {
        let mut state = self.gate.lock().await;
        self.router
            .close(ServiceDisconnected::new("").with_platform(self.repository.platform()));
        self.events.reset();

        if let Err(e) = self.repository.end_connection().await {
            tracing::warn!(error = %e, "native endConnection failed, ignoring");
        }

        if let Some(forwarder) = state.forwarder.take() {
            forwarder.abort();
        }
        if state.listeners_attached {
            self.repository.detach_listeners();
            state.listeners_attached = false;
        }
        tracing::info!("billing connection ended");
        true
    }

    fn attach_listeners(&self, state: &mut LifecycleState) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.repository.attach_listeners(tx);
        let router = Arc::clone(&self.router);
        state.forwarder = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                router.handle_native_event(event);
            }
        }));
        state.listeners_attached = true;
        tracing::debug!("native listeners attached");
    }
}

impl<R: BillingRepository + ?Sized> Drop for ConnectionLifecycle<R> {
    fn drop(&mut self) {
        if let Some(forwarder) = self.gate.get_mut().forwarder.take() {
            forwarder.abort();
        }
    }
}
