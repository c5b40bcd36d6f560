//! # IBC Relay Service
//!
//! Event-bus front of the lifecycle dispatcher.
//!
//! ## Architecture Compliance
//!
//! - Subscribes to `IbcCallbackRequest` from Subsystem 15
//! - Publishes results via Event Bus
//! - NO direct subsystem-to-subsystem calls
//!
//! ## Execution Model
//!
//! Each request is its own transaction: a fresh `TxContext` with the
//! request's gas limit, run inside `TxContext::atomic` so a failed callback
//! publishes no events. Requests are serialized; two callbacks never
//! interleave.
//!
//! ## Security
//!
//! - Validates `sender_id` from envelope per IPC-MATRIX.md
//! - All identity from `AuthenticatedMessage.sender_id` only

use crate::adapters::{InMemoryContractRegistry, MockVm, RecordingMessenger};
use crate::context::TxContext;
use crate::dispatcher::LifecycleDispatcher;
use crate::domain::entities::RelayConfig;
use crate::domain::value_objects::{Binary, ContractAddress};
use crate::errors::{IpcError, RelayError};
use crate::events::{
    subsystem_ids, IbcCallback, IbcCallbackRequestPayload, IbcCallbackResponsePayload,
};
use crate::ports::inbound::{IbcLifecycle, IbcRelayApi};
use crate::ports::outbound::{ContractResolver, MessageDispatcher, WasmVm};

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// IBC Relay Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Dispatcher configuration.
    pub relay: RelayConfig,
    /// Transaction gas limit for requests that carry none.
    pub default_gas_limit: u64,
    /// Maximum pending requests.
    pub max_pending_requests: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            default_gas_limit: 50_000_000,
            max_pending_requests: 1000,
        }
    }
}

/// Statistics for the IBC Relay Service.
#[derive(Debug, Default, Clone)]
pub struct ServiceStats {
    /// Total callbacks run.
    pub callbacks_handled: u64,
    /// Successful callbacks.
    pub successful_callbacks: u64,
    /// Failed callbacks (resolution, execution, gas or dispatch).
    pub failed_callbacks: u64,
    /// Total gas charged, failed callbacks included.
    pub total_gas_used: u64,
    /// Acknowledgements returned for received packets.
    pub acknowledgements_written: u64,
    /// Average callback time in microseconds.
    pub avg_execution_time_us: u64,
    /// Rejected requests (unauthorized sender or backpressure).
    pub rejected_requests: u64,
}

/// Decrements the pending counter when a request leaves the service.
struct PendingGuard<'a>(&'a AtomicUsize);

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The main IBC Relay Service.
///
/// This service:
/// 1. Receives callback requests from the Event Bus
/// 2. Runs them through the lifecycle dispatcher, one at a time
/// 3. Returns the outcome for publication
/// 4. Maintains callback statistics
pub struct IbcRelayService<R, V, M> {
    /// Service configuration.
    config: ServiceConfig,
    /// Lifecycle dispatcher.
    dispatcher: LifecycleDispatcher<R, V, M>,
    /// Serializes callback execution.
    execution: Mutex<()>,
    /// Requests inside the service.
    pending: AtomicUsize,
    /// Service statistics.
    stats: Arc<RwLock<ServiceStats>>,
}

impl<R, V, M> IbcRelayService<R, V, M>
where
    R: ContractResolver,
    V: WasmVm,
    M: MessageDispatcher,
{
    /// Create a new IBC Relay Service with a default dispatcher built from
    /// `config.relay`.
    pub fn new(resolver: R, vm: V, messenger: M, config: ServiceConfig) -> Self {
        let dispatcher = LifecycleDispatcher::new(resolver, vm, messenger, config.relay.clone());
        Self::from_dispatcher(dispatcher, config)
    }

    /// Create a service around a configured dispatcher. The dispatcher keeps
    /// its own relay configuration.
    pub fn from_dispatcher(dispatcher: LifecycleDispatcher<R, V, M>, config: ServiceConfig) -> Self {
        Self {
            config,
            dispatcher,
            execution: Mutex::new(()),
            pending: AtomicUsize::new(0),
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// The wrapped dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &LifecycleDispatcher<R, V, M> {
        &self.dispatcher
    }

    /// Handle an IBC callback request from the Event Bus.
    ///
    /// # Security
    ///
    /// Validates that the `sender_id` is 15 (Cross-Chain) per IPC-MATRIX.md.
    ///
    /// # Errors
    ///
    /// Only envelope level failures. Relay failures are reported inside the
    /// response with `success == false`.
    #[instrument(skip(self, payload), fields(correlation_id = %correlation_id))]
    pub async fn handle_ibc_callback(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        payload: IbcCallbackRequestPayload,
    ) -> Result<IbcCallbackResponsePayload, IpcError> {
        // Security: Validate sender
        if !subsystem_ids::is_authorized_callback_sender(sender_id) {
            warn!(sender_id = sender_id, "Unauthorized sender for IbcCallbackRequest");
            self.stats.write().await.rejected_requests += 1;
            return Err(IpcError::UnauthorizedSender {
                sender_id,
                allowed: vec![subsystem_ids::CROSS_CHAIN],
            });
        }

        let pending = self.pending.fetch_add(1, Ordering::SeqCst);
        let _guard = PendingGuard(&self.pending);
        if pending >= self.config.max_pending_requests {
            warn!(pending, max = self.config.max_pending_requests, "Relay busy");
            self.stats.write().await.rejected_requests += 1;
            return Err(IpcError::Backpressure {
                pending,
                max: self.config.max_pending_requests,
            });
        }

        info!(
            contract = %payload.contract,
            entry_point = %payload.callback.entry_point(),
            height = payload.block.height,
            "Processing IBC callback"
        );

        let start = Instant::now();
        let response = {
            let _execution = self.execution.lock().await;
            self.execute(payload)
        };
        let elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        // Update statistics
        {
            let mut stats = self.stats.write().await;
            stats.callbacks_handled += 1;
            stats.total_gas_used = stats.total_gas_used.saturating_add(response.gas_used);
            if response.success {
                stats.successful_callbacks += 1;
            } else {
                stats.failed_callbacks += 1;
            }
            if response.acknowledgement.is_some() {
                stats.acknowledgements_written += 1;
            }
            let total = stats.callbacks_handled;
            stats.avg_execution_time_us =
                (stats.avg_execution_time_us * (total - 1) + elapsed_us) / total;
        }

        Ok(response)
    }

    /// Runs one callback as an atomic transaction: on failure its events
    /// are dropped and its storage writes undone.
    fn execute(&self, payload: IbcCallbackRequestPayload) -> IbcCallbackResponsePayload {
        let IbcCallbackRequestPayload {
            contract,
            callback,
            block,
            gas_limit,
        } = payload;
        let gas_limit = gas_limit.unwrap_or(self.config.default_gas_limit);
        let mut ctx = TxContext::with_gas_limit(block, gas_limit);

        let result = ctx.atomic(|ctx| self.relay(ctx, &contract, callback));
        let gas_used = ctx.gas_meter.consumed();

        match result {
            Ok(acknowledgement) => {
                let events = ctx.events.take();
                debug!(gas_used, events = events.len(), "IBC callback completed");
                IbcCallbackResponsePayload {
                    success: true,
                    gas_used,
                    acknowledgement,
                    events,
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, gas_used, "IBC callback failed");
                IbcCallbackResponsePayload {
                    success: false,
                    gas_used,
                    acknowledgement: None,
                    events: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Routes `callback` to the matching lifecycle handler.
    ///
    /// # Errors
    ///
    /// Whatever the handler returns.
    pub fn relay(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        callback: IbcCallback,
    ) -> Result<Option<Binary>, RelayError> {
        let d = &self.dispatcher;
        match callback {
            IbcCallback::ChannelOpen { channel } => {
                d.on_channel_open(ctx, contract, channel).map(|()| None)
            }
            IbcCallback::ChannelConnect { channel } => {
                d.on_channel_connect(ctx, contract, channel).map(|()| None)
            }
            IbcCallback::ChannelClose { channel } => {
                d.on_channel_close(ctx, contract, channel).map(|()| None)
            }
            IbcCallback::PacketReceive { packet } => {
                d.on_packet_receive(ctx, contract, packet).map(Some)
            }
            IbcCallback::PacketAck { acknowledgement } => {
                d.on_packet_ack(ctx, contract, acknowledgement).map(|()| None)
            }
            IbcCallback::PacketTimeout { packet } => {
                d.on_packet_timeout(ctx, contract, packet).map(|()| None)
            }
        }
    }
}

/// Service type wired with the in-memory adapters.
pub type InMemoryRelayService =
    IbcRelayService<Arc<InMemoryContractRegistry>, Arc<MockVm>, Arc<RecordingMessenger>>;

/// Create a default service with in-memory adapters (for testing).
///
/// The registry doubles as the query plugin set.
#[must_use]
pub fn create_test_service() -> InMemoryRelayService {
    let config = ServiceConfig::default();
    let registry = Arc::new(InMemoryContractRegistry::new());
    let dispatcher = LifecycleDispatcher::new(
        Arc::clone(&registry),
        Arc::new(MockVm::new()),
        Arc::new(RecordingMessenger::new()),
        config.relay.clone(),
    )
    .with_query_plugins(registry);
    IbcRelayService::from_dispatcher(dispatcher, config)
}

// =============================================================================
// IbcRelayApi Implementation
// =============================================================================

#[async_trait]
impl<R, V, M> IbcRelayApi for IbcRelayService<R, V, M>
where
    R: ContractResolver,
    V: WasmVm,
    M: MessageDispatcher,
{
    async fn handle_ibc_callback(
        &self,
        sender_id: u8,
        correlation_id: Uuid,
        payload: IbcCallbackRequestPayload,
    ) -> Result<IbcCallbackResponsePayload, IpcError> {
        IbcRelayService::handle_ibc_callback(self, sender_id, correlation_id, payload).await
    }
}

// =============================================================================
// TESTS
// =============================================================================
