//! # Lifecycle Dispatcher
//!
//! Routes the six IBC lifecycle callbacks into contract entry points.
//!
//! Every callback runs the same routine, parameterized by [`EntryPoint`]:
//!
//! 1. Resolve the contract (no gas charged on failure)
//! 2. Build the execution environment
//! 3. Budget gas, call the VM, charge the reported gas
//! 4. Classify the outcome
//! 5. Emit events, then dispatch messages scoped to `(contract, port)`
//!
//! The dispatcher never rolls anything back. A failure after events were
//! emitted or storage was written leaves both in the context; the caller
//! aborts its transaction and [`TxContext::atomic`] undoes them.

use crate::adapters::env_builder::BlockEnvBuilder;
use crate::adapters::event_translator::WasmEventTranslator;
use crate::adapters::host_api::HexAddressApi;
use crate::context::{JournaledStore, TxContext};
use crate::domain::entities::{ContractInstance, EntryPoint, RelayConfig};
use crate::domain::ibc::{IbcAcknowledgement, IbcChannel, IbcPacket, IbcPayload};
use crate::domain::invariants::{
    check_gas_budget_invariant, check_port_ownership_invariant, check_side_effect_invariant,
    InvariantViolation,
};
use crate::domain::services::contract_gas_budget;
use crate::domain::value_objects::{Binary, ContractAddress, PortId};
use crate::errors::{RelayError, ResolveError};
use crate::ports::inbound::IbcLifecycle;
use crate::ports::outbound::{
    ContractResolver, EnvironmentBuilder, EventTranslator, HostApi, MessageDispatcher,
    QueryPlugins, VmCall, WasmVm,
};
use crate::query::{NoQueryPlugins, QueryHandler};
use tracing::{debug, error, instrument, warn};

/// Descriptor used when charging contract gas to the ledger.
pub const GAS_DESCRIPTOR: &str = "wasm contract";

/// Dispatches IBC lifecycle callbacks into contracts.
pub struct LifecycleDispatcher<R, V, M> {
    resolver: R,
    vm: V,
    messenger: M,
    env_builder: Box<dyn EnvironmentBuilder>,
    translator: Box<dyn EventTranslator>,
    query_plugins: Box<dyn QueryPlugins>,
    host_api: Box<dyn HostApi>,
    config: RelayConfig,
}

impl<R, V, M> LifecycleDispatcher<R, V, M>
where
    R: ContractResolver,
    V: WasmVm,
    M: MessageDispatcher,
{
    /// Creates a dispatcher with the default environment builder, event
    /// translator, host API and no query plugins.
    #[must_use]
    pub fn new(resolver: R, vm: V, messenger: M, config: RelayConfig) -> Self {
        let translator = WasmEventTranslator::new(config.event_type.clone());
        Self {
            resolver,
            vm,
            messenger,
            env_builder: Box::new(BlockEnvBuilder),
            translator: Box::new(translator),
            query_plugins: Box::new(NoQueryPlugins),
            host_api: Box::new(HexAddressApi),
            config,
        }
    }

    /// Replaces the environment builder.
    #[must_use]
    pub fn with_env_builder(mut self, env_builder: impl EnvironmentBuilder + 'static) -> Self {
        self.env_builder = Box::new(env_builder);
        self
    }

    /// Replaces the event translator.
    #[must_use]
    pub fn with_translator(mut self, translator: impl EventTranslator + 'static) -> Self {
        self.translator = Box::new(translator);
        self
    }

    /// Sets the chain state answering contract queries.
    #[must_use]
    pub fn with_query_plugins(mut self, plugins: impl QueryPlugins + 'static) -> Self {
        self.query_plugins = Box::new(plugins);
        self
    }

    /// Replaces the host API exposed to contracts.
    #[must_use]
    pub fn with_host_api(mut self, host_api: impl HostApi + 'static) -> Self {
        self.host_api = Box::new(host_api);
        self
    }

    /// Relay configuration.
    #[must_use]
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Contract resolver.
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Contract VM.
    #[must_use]
    pub fn vm(&self) -> &V {
        &self.vm
    }

    /// Message dispatcher.
    #[must_use]
    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    /// Runs `entry_point` of `contract` with `payload`.
    ///
    /// Returns the acknowledgement for entry points that produce one.
    fn run(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        entry_point: EntryPoint,
        payload: &IbcPayload,
    ) -> Result<Option<Binary>, RelayError> {
        let resolve_failed = |source: ResolveError| RelayError::Resolve {
            contract: *contract,
            entry_point,
            source,
        };

        let ContractInstance {
            info,
            code_hash,
            mut store,
        } = self.resolver.resolve(contract).map_err(|source| {
            debug!(%contract, %entry_point, error = %source, "Contract resolution failed");
            resolve_failed(source)
        })?;

        let port = info
            .ibc_port_id
            .unwrap_or_else(|| PortId::for_contract(contract));
        if !check_port_ownership_invariant(&port, contract) {
            warn!(%contract, %port, "Contract bound to a port it does not own");
            return Err(resolve_failed(ResolveError::ForeignPort { port }));
        }

        let env = self.env_builder.build(&ctx.block, contract);
        let gas_limit =
            contract_gas_budget(ctx.gas_meter.remaining(), self.config.max_contract_gas);

        let outcome = {
            let querier = QueryHandler::new(&ctx.block, self.query_plugins.as_ref());
            let mut journaled = JournaledStore::new(&mut store, &mut ctx.journal);
            self.vm.call(VmCall {
                entry_point,
                code_hash: &code_hash,
                env: &env,
                payload,
                store: &mut journaled,
                api: self.host_api.as_ref(),
                querier: &querier,
                gas_meter: &*ctx.gas_meter,
                gas_limit,
            })
        };

        let gas_used = outcome.gas_used;
        debug!(
            %contract,
            %entry_point,
            gas_used,
            gas_limit,
            success = outcome.result.is_ok(),
            "Contract call finished"
        );

        ctx.gas_meter
            .consume(gas_used, GAS_DESCRIPTOR)
            .map_err(|source| {
                warn!(%contract, %entry_point, error = %source, "Gas ledger exhausted");
                RelayError::OutOfGas {
                    contract: *contract,
                    entry_point,
                    source,
                }
            })?;

        if !check_gas_budget_invariant(gas_used, gas_limit) {
            let violation = InvariantViolation::GasBudgetExceeded {
                used: gas_used,
                budget: gas_limit,
            };
            error!(%contract, %entry_point, %violation, "VM reported gas past its budget");
            return Err(RelayError::ExecuteFailed {
                contract: *contract,
                entry_point,
                message: violation.to_string(),
            });
        }

        let response = outcome.result.map_err(|e| RelayError::ExecuteFailed {
            contract: *contract,
            entry_point,
            message: e.to_string(),
        })?;

        let events_before = ctx.events.len();

        // TODO: confirm with the IBC protocol owners whether the open handshake
        // may commit events and messages. Until then they are dropped.
        if !entry_point.integrates_side_effects() {
            if !response.attributes.is_empty() || !response.messages.is_empty() {
                debug!(
                    %contract,
                    attributes = response.attributes.len(),
                    messages = response.messages.len(),
                    "Dropping side effects of channel open"
                );
            }
            debug_assert!(check_side_effect_invariant(
                entry_point,
                true,
                ctx.events.len() - events_before,
                0
            ));
            return Ok(None);
        }

        let events = self.translator.translate(&response.attributes, contract);
        ctx.events.emit_events(events);

        let count = response.messages.len();
        if count > 0 {
            self.messenger
                .dispatch(ctx, contract, &port, response.messages)
                .map_err(|source| {
                    warn!(%contract, %entry_point, error = %source, "Message dispatch failed");
                    RelayError::DispatchFailed {
                        contract: *contract,
                        entry_point,
                        source,
                    }
                })?;
            debug!(%contract, %port, messages = count, "Dispatched contract messages");
        }
        debug_assert!(check_side_effect_invariant(
            entry_point,
            true,
            ctx.events.len() - events_before,
            count
        ));

        Ok(entry_point
            .returns_acknowledgement()
            .then(|| response.acknowledgement.unwrap_or_default()))
    }
}

impl<R, V, M> IbcLifecycle for LifecycleDispatcher<R, V, M>
where
    R: ContractResolver,
    V: WasmVm,
    M: MessageDispatcher,
{
    #[instrument(skip(self, ctx, channel), fields(contract = %contract))]
    fn on_channel_open(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::ChannelOpen,
            &IbcPayload::Channel(channel),
        )
        .map(drop)
    }

    #[instrument(skip(self, ctx, channel), fields(contract = %contract))]
    fn on_channel_connect(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::ChannelConnect,
            &IbcPayload::Channel(channel),
        )
        .map(drop)
    }

    #[instrument(skip(self, ctx, channel), fields(contract = %contract))]
    fn on_channel_close(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        channel: IbcChannel,
    ) -> Result<(), RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::ChannelClose,
            &IbcPayload::Channel(channel),
        )
        .map(drop)
    }

    #[instrument(skip(self, ctx, packet), fields(contract = %contract, sequence = packet.sequence))]
    fn on_packet_receive(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        packet: IbcPacket,
    ) -> Result<Binary, RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::PacketReceive,
            &IbcPayload::Packet(packet),
        )
        .map(Option::unwrap_or_default)
    }

    #[instrument(
        skip(self, ctx, acknowledgement),
        fields(contract = %contract, sequence = acknowledgement.original_packet.sequence)
    )]
    fn on_packet_ack(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        acknowledgement: IbcAcknowledgement,
    ) -> Result<(), RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::PacketAck,
            &IbcPayload::Acknowledgement(acknowledgement),
        )
        .map(drop)
    }

    #[instrument(skip(self, ctx, packet), fields(contract = %contract, sequence = packet.sequence))]
    fn on_packet_timeout(
        &self,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        packet: IbcPacket,
    ) -> Result<(), RelayError> {
        self.run(
            ctx,
            contract,
            EntryPoint::PacketTimeout,
            &IbcPayload::Packet(packet),
        )
        .map(drop)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::messenger::RecordingMessenger;
    use crate::adapters::mock_vm::MockVm;
    use crate::adapters::registry::InMemoryContractRegistry;
    use crate::domain::entities::{
        BlockInfo, ContractInfo, ContractMsg, ContractResponse, Env, QueryRequest,
    };
    use crate::domain::ibc::fixtures;
    use crate::domain::services::{code_hash, CONTRACT_ADDRESS_ATTRIBUTE};
    use crate::errors::{DispatchError, GasError, VmError};
    use crate::ports::outbound::{GasMeter, Storage};
    use std::sync::Arc;

    const CODE: &[u8] = b"\0asm-ibc-reflect";

    type TestDispatcher =
        LifecycleDispatcher<Arc<InMemoryContractRegistry>, Arc<MockVm>, Arc<RecordingMessenger>>;

    struct Harness {
        registry: Arc<InMemoryContractRegistry>,
        vm: Arc<MockVm>,
        messenger: Arc<RecordingMessenger>,
        dispatcher: TestDispatcher,
        contract: ContractAddress,
    }

    fn harness_with(vm: MockVm, config: RelayConfig) -> Harness {
        let registry = Arc::new(InMemoryContractRegistry::new());
        let code_id = registry.store_code(CODE);
        let contract = registry
            .instantiate(code_id, "creator", "reflect", true)
            .unwrap();
        let vm = Arc::new(vm);
        let messenger = Arc::new(RecordingMessenger::new());

        let dispatcher = LifecycleDispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&vm),
            Arc::clone(&messenger),
            config,
        )
        .with_query_plugins(Arc::clone(&registry));

        Harness {
            registry,
            vm,
            messenger,
            dispatcher,
            contract,
        }
    }

    fn harness() -> Harness {
        harness_with(MockVm::new(), RelayConfig::default())
    }

    fn ctx() -> TxContext {
        TxContext::with_gas_limit(BlockInfo::default(), 1_000_000)
    }

    fn send_packet_msg() -> ContractMsg {
        ContractMsg::IbcSendPacket {
            channel_id: "channel-0".into(),
            data: Binary::from_slice(b"pong"),
            timeout: fixtures::packet(1, b"").timeout,
        }
    }

    fn call(
        h: &Harness,
        ctx: &mut TxContext,
        contract: &ContractAddress,
        entry_point: EntryPoint,
    ) -> Result<Option<Binary>, RelayError> {
        let d = &h.dispatcher;
        match entry_point {
            EntryPoint::ChannelOpen => d
                .on_channel_open(ctx, contract, fixtures::channel())
                .map(|()| None),
            EntryPoint::ChannelConnect => d
                .on_channel_connect(ctx, contract, fixtures::channel())
                .map(|()| None),
            EntryPoint::ChannelClose => d
                .on_channel_close(ctx, contract, fixtures::channel())
                .map(|()| None),
            EntryPoint::PacketReceive => d
                .on_packet_receive(ctx, contract, fixtures::packet(7, b"abc"))
                .map(Some),
            EntryPoint::PacketAck => d
                .on_packet_ack(ctx, contract, fixtures::acknowledgement(b"\x01"))
                .map(|()| None),
            EntryPoint::PacketTimeout => d
                .on_packet_timeout(ctx, contract, fixtures::packet(7, b"abc"))
                .map(|()| None),
        }
    }

    fn wasm_events(ctx: &TxContext) -> Vec<&crate::domain::entities::Event> {
        ctx.events
            .events()
            .iter()
            .filter(|e| e.ty == "wasm")
            .collect()
    }

    // =========================================================================
    // SCENARIOS
    // =========================================================================

    #[test]
    fn test_receive_success_emits_dispatches_and_acks() {
        let h = harness();
        h.vm.respond(
            EntryPoint::PacketReceive,
            ContractResponse::new()
                .add_attribute("action", "receive")
                .add_message(send_packet_msg())
                .set_acknowledgement(vec![0x01]),
            12_345,
        );
        let mut ctx = ctx();

        let ack = h
            .dispatcher
            .on_packet_receive(&mut ctx, &h.contract, fixtures::packet(7, b"abc"))
            .unwrap();

        assert_eq!(ack, Binary::from_slice(&[0x01]));
        assert_eq!(ctx.gas_meter.consumed(), 12_345);

        let events = wasm_events(&ctx);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].attribute(CONTRACT_ADDRESS_ATTRIBUTE),
            Some(h.contract.to_string().as_str())
        );
        assert_eq!(events[0].attribute("action"), Some("receive"));

        let records = h.messenger.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].contract, h.contract);
        assert_eq!(records[0].port, PortId::for_contract(&h.contract));
        assert_eq!(records[0].messages, vec![send_packet_msg()]);
    }

    #[test]
    fn test_receive_trap_charges_gas_without_side_effects() {
        let h = harness();
        h.vm.fail(EntryPoint::PacketReceive, VmError::OutOfGas, 40_000);
        let mut ctx = ctx();

        let err = h
            .dispatcher
            .on_packet_receive(&mut ctx, &h.contract, fixtures::packet(7, b"abc"))
            .unwrap_err();

        assert!(matches!(
            &err,
            RelayError::ExecuteFailed { message, entry_point: EntryPoint::PacketReceive, .. }
                if message == "out of gas"
        ));
        assert_eq!(ctx.gas_meter.consumed(), 40_000);
        assert!(ctx.events.is_empty());
        assert_eq!(h.messenger.dispatch_count(), 0);
    }

    #[test]
    fn test_unknown_contract_fails_before_metering() {
        let h = harness();
        let unknown = ContractAddress::new([0xee; 20]);
        let mut ctx = ctx();

        for entry_point in EntryPoint::ALL {
            let err = call(&h, &mut ctx, &unknown, entry_point).unwrap_err();
            assert!(err.is_resolution_failure());
            assert_eq!(err.contract(), &unknown);
            assert_eq!(err.entry_point(), entry_point);
        }

        assert_eq!(ctx.gas_meter.consumed(), 0);
        assert_eq!(h.vm.call_count(), 0);
        assert!(ctx.events.is_empty());
    }

    // =========================================================================
    // GAS
    // =========================================================================

    #[test]
    fn test_gas_charged_for_every_entry_point_and_outcome() {
        let h = harness();
        let mut ctx = ctx();
        let mut expected = 0;

        for (i, entry_point) in EntryPoint::ALL.into_iter().enumerate() {
            let gas = 1_000 * (i as u64 + 1);
            h.vm.respond(entry_point, ContractResponse::new(), gas);
            call(&h, &mut ctx, &h.contract, entry_point).unwrap();
            expected += gas;
            assert_eq!(ctx.gas_meter.consumed(), expected);

            h.vm.fail(entry_point, VmError::Contract("rejected".into()), gas + 1);
            let err = call(&h, &mut ctx, &h.contract, entry_point).unwrap_err();
            assert!(matches!(err, RelayError::ExecuteFailed { .. }));
            expected += gas + 1;
            assert_eq!(ctx.gas_meter.consumed(), expected);
        }
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_budget_is_min_of_remaining_and_cap() {
        let config = RelayConfig {
            max_contract_gas: 50_000,
            ..RelayConfig::default()
        };
        let h = harness_with(MockVm::new(), config);

        let mut bounded = TxContext::with_gas_limit(BlockInfo::default(), 20_000);
        bounded.gas_meter.consume(5_000, "ante").unwrap();
        call(&h, &mut bounded, &h.contract, EntryPoint::ChannelConnect).unwrap();

        let mut roomy = TxContext::with_gas_limit(BlockInfo::default(), 1_000_000);
        call(&h, &mut roomy, &h.contract, EntryPoint::ChannelConnect).unwrap();

        let mut infinite = TxContext::infinite(BlockInfo::default());
        call(&h, &mut infinite, &h.contract, EntryPoint::ChannelConnect).unwrap();

        let limits: Vec<_> = h.vm.calls().iter().map(|c| c.gas_limit).collect();
        assert_eq!(limits, vec![15_000, 50_000, 50_000]);
    }

    #[test]
    fn test_exhausted_ledger_gives_zero_budget() {
        let h = harness();
        let mut ctx = TxContext::with_gas_limit(BlockInfo::default(), 1_000);
        ctx.gas_meter.consume(1_000, "ante").unwrap();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketTimeout).unwrap_err();

        assert_eq!(h.vm.calls()[0].gas_limit, 0);
        // metered VM reports the whole zero budget
        assert!(matches!(err, RelayError::ExecuteFailed { .. }));
        assert_eq!(ctx.gas_meter.consumed(), 1_000);
    }

    #[test]
    fn test_ledger_overrun_is_out_of_gas() {
        let h = harness_with(MockVm::unmetered(), RelayConfig::default());
        h.vm.respond(EntryPoint::ChannelClose, ContractResponse::new(), 15_000);
        let mut ctx = TxContext::with_gas_limit(BlockInfo::default(), 10_000);

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::ChannelClose).unwrap_err();

        assert!(matches!(
            err,
            RelayError::OutOfGas {
                source: GasError::OutOfGas { consumed: 15_000, limit: 10_000, .. },
                ..
            }
        ));
        assert_eq!(ctx.gas_meter.consumed(), 15_000);
    }

    #[test]
    fn test_gas_past_budget_is_execution_failure() {
        let config = RelayConfig {
            max_contract_gas: 1_000,
            ..RelayConfig::default()
        };
        let h = harness_with(MockVm::unmetered(), config);
        h.vm.respond(
            EntryPoint::PacketAck,
            ContractResponse::new().add_attribute("action", "ack"),
            5_000,
        );
        let mut ctx = TxContext::infinite(BlockInfo::default());

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketAck).unwrap_err();

        assert!(matches!(
            &err,
            RelayError::ExecuteFailed { message, .. } if message == "gas used 5000 exceeds budget 1000"
        ));
        assert_eq!(ctx.gas_meter.consumed(), 5_000);
        assert!(ctx.events.is_empty());
    }

    // =========================================================================
    // SIDE EFFECTS
    // =========================================================================

    #[test]
    fn test_channel_open_drops_events_and_messages() {
        let h = harness();
        h.vm.respond(
            EntryPoint::ChannelOpen,
            ContractResponse::new()
                .add_attribute("action", "open")
                .add_message(send_packet_msg()),
            2_000,
        );
        let mut ctx = ctx();

        h.dispatcher
            .on_channel_open(&mut ctx, &h.contract, fixtures::channel())
            .unwrap();

        assert!(ctx.events.is_empty());
        assert_eq!(h.messenger.dispatch_count(), 0);
        assert_eq!(ctx.gas_meter.consumed(), 2_000);
    }

    #[test]
    fn test_side_effect_entry_points_emit_and_dispatch() {
        let h = harness();
        let mut ctx = ctx();
        let integrating: Vec<_> = EntryPoint::ALL
            .into_iter()
            .filter(|e| e.integrates_side_effects())
            .collect();

        for entry_point in &integrating {
            h.vm.respond(
                *entry_point,
                ContractResponse::new()
                    .add_attribute("action", entry_point.export_name())
                    .add_message(send_packet_msg()),
                1_000,
            );
            call(&h, &mut ctx, &h.contract, *entry_point).unwrap();
        }

        let events = wasm_events(&ctx);
        let actions: Vec<_> = events
            .iter()
            .filter_map(|e| e.attribute("action"))
            .collect();
        let expected: Vec<_> = integrating.iter().map(|e| e.export_name()).collect();
        assert_eq!(actions, expected);
        assert_eq!(h.messenger.dispatch_count(), integrating.len());
    }

    #[test]
    fn test_events_precede_dispatch() {
        let h = harness();
        h.vm.respond(
            EntryPoint::ChannelConnect,
            ContractResponse::new()
                .add_attribute("action", "connect")
                .add_message(send_packet_msg()),
            1_000,
        );
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::ChannelConnect).unwrap();

        let types: Vec<_> = ctx.events.events().iter().map(|e| e.ty.as_str()).collect();
        assert_eq!(types, ["wasm", "message"]);
    }

    #[test]
    fn test_dispatch_failure_leaves_emitted_events() {
        let h = harness();
        h.vm.respond(
            EntryPoint::PacketTimeout,
            ContractResponse::new()
                .add_attribute("action", "refund")
                .add_message(send_packet_msg()),
            3_000,
        );
        h.messenger.fail_at(0, "insufficient funds");
        let mut ctx = ctx();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketTimeout).unwrap_err();

        assert!(matches!(
            err,
            RelayError::DispatchFailed {
                source: DispatchError::MessageFailed { index: 0, .. },
                ..
            }
        ));
        assert_eq!(wasm_events(&ctx).len(), 1);
        assert_eq!(ctx.gas_meter.consumed(), 3_000);
    }

    #[test]
    fn test_empty_message_list_skips_dispatcher() {
        let h = harness();
        h.vm.respond(
            EntryPoint::ChannelClose,
            ContractResponse::new().add_attribute("action", "close"),
            1_000,
        );
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::ChannelClose).unwrap();

        assert_eq!(wasm_events(&ctx).len(), 1);
        assert_eq!(h.messenger.dispatch_count(), 0);
    }

    #[test]
    fn test_no_attributes_no_event() {
        let h = harness();
        let mut ctx = ctx();
        call(&h, &mut ctx, &h.contract, EntryPoint::PacketAck).unwrap();
        assert!(ctx.events.is_empty());
    }

    #[test]
    fn test_custom_event_type() {
        let config = RelayConfig {
            event_type: "wasm-ibc".into(),
            ..RelayConfig::default()
        };
        let h = harness_with(MockVm::new(), config);
        h.vm.respond(
            EntryPoint::PacketAck,
            ContractResponse::new().add_attribute("action", "ack"),
            1_000,
        );
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::PacketAck).unwrap();

        assert_eq!(ctx.events.events()[0].ty, "wasm-ibc");
    }

    // =========================================================================
    // PORT SCOPING
    // =========================================================================

    #[test]
    fn test_foreign_port_rejected_before_vm() {
        let h = harness();
        let other = ContractAddress::new([0x42; 20]);
        h.registry
            .set_port(&h.contract, PortId::for_contract(&other));
        let mut ctx = ctx();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::ChannelConnect).unwrap_err();

        assert!(matches!(
            err,
            RelayError::Resolve {
                source: ResolveError::ForeignPort { .. },
                ..
            }
        ));
        assert_eq!(h.vm.call_count(), 0);
        assert_eq!(ctx.gas_meter.consumed(), 0);
    }

    #[test]
    fn test_custom_port_used_for_dispatch() {
        let h = harness();
        let port = PortId::new("ics20-bridge");
        h.registry.set_port(&h.contract, port.clone());
        h.vm.respond(
            EntryPoint::PacketReceive,
            ContractResponse::new().add_message(send_packet_msg()),
            1_000,
        );
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive).unwrap();

        assert_eq!(h.messenger.records()[0].port, port);
    }

    #[test]
    fn test_unbound_contract_dispatches_on_derived_port() {
        let h = harness();
        let code_id = h.registry.store_code(b"plain");
        let plain = h.registry.instantiate(code_id, "creator", "plain", false).unwrap();
        h.vm.respond(
            EntryPoint::ChannelConnect,
            ContractResponse::new().add_message(send_packet_msg()),
            1_000,
        );
        let mut ctx = ctx();

        call(&h, &mut ctx, &plain, EntryPoint::ChannelConnect).unwrap();

        assert_eq!(h.messenger.records()[0].port, PortId::for_contract(&plain));
    }

    // =========================================================================
    // ACKNOWLEDGEMENT
    // =========================================================================

    #[test]
    fn test_receive_returns_ack_verbatim() {
        let h = harness();
        let raw = b"{\"result\":\"not-even-hex\"}\x00\xff".to_vec();
        h.vm.respond(
            EntryPoint::PacketReceive,
            ContractResponse::new().set_acknowledgement(raw.clone()),
            1_000,
        );
        let mut ctx = ctx();

        let ack = call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive)
            .unwrap()
            .unwrap();

        assert_eq!(ack.as_slice(), raw.as_slice());
    }

    #[test]
    fn test_receive_without_ack_returns_empty() {
        let h = harness();
        let mut ctx = ctx();

        let ack = call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive)
            .unwrap()
            .unwrap();

        assert!(ack.is_empty());
    }

    // =========================================================================
    // VM INPUTS
    // =========================================================================

    #[test]
    fn test_vm_receives_env_payload_and_code() {
        let h = harness();
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive).unwrap();

        let record = &h.vm.calls()[0];
        assert_eq!(record.entry_point, EntryPoint::PacketReceive);
        assert_eq!(record.code_hash, code_hash(CODE));
        assert_eq!(record.env, Env::new(&ctx.block, h.contract));
        assert_eq!(
            record.payload,
            IbcPayload::Packet(fixtures::packet(7, b"abc"))
        );
        assert_eq!(
            record.human_address.as_deref(),
            Some(h.contract.to_string().as_str())
        );
    }

    #[test]
    fn test_vm_writes_land_in_contract_store() {
        let h = harness();
        h.vm.write_on_call(b"last_seq", b"7");
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive).unwrap();

        assert_eq!(
            h.registry.resolve(&h.contract).unwrap().store.get(b"last_seq"),
            Some(b"7".to_vec())
        );
    }

    #[test]
    fn test_vm_writes_are_journaled_for_the_transaction() {
        let h = harness();
        h.vm.write_on_call(b"last_seq", b"7");
        h.vm.respond(
            EntryPoint::PacketReceive,
            ContractResponse::new().add_message(send_packet_msg()),
            2_000,
        );
        h.messenger.fail_at(0, "channel closed");
        let mut ctx = ctx();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketReceive).unwrap_err();

        // the dispatcher leaves the write in place; the journal can undo it
        assert!(matches!(err, RelayError::DispatchFailed { .. }));
        assert_eq!(ctx.journal.len(), 1);
        assert_eq!(h.registry.raw_get(&h.contract, b"last_seq"), Some(b"7".to_vec()));

        ctx.journal.revert_to(0);
        assert_eq!(h.registry.raw_get(&h.contract, b"last_seq"), None);
    }

    #[test]
    fn test_contract_queries_reach_plugins() {
        let h = harness();
        h.vm.query_on_call(QueryRequest::ContractInfo {
            contract: h.contract,
        });
        let mut ctx = ctx();

        call(&h, &mut ctx, &h.contract, EntryPoint::ChannelConnect).unwrap();

        let raw = h.vm.calls()[0].query_result.clone().unwrap().unwrap();
        let info: ContractInfo = serde_json::from_slice(raw.as_slice()).unwrap();
        assert_eq!(info.label, "reflect");
    }

    #[test]
    fn test_missing_export_is_execution_failure() {
        let h = harness();
        h.vm.unexport(EntryPoint::PacketTimeout);
        h.vm.write_on_call(b"timed_out", b"1");
        let mut ctx = ctx();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketTimeout).unwrap_err();

        assert!(matches!(
            &err,
            RelayError::ExecuteFailed { message, entry_point: EntryPoint::PacketTimeout, .. }
                if message == "missing export: ibc_packet_timeout"
        ));
        assert_eq!(ctx.gas_meter.consumed(), 0);
        assert!(ctx.events.is_empty());
        assert_eq!(h.messenger.dispatch_count(), 0);
        assert_eq!(h.registry.raw_get(&h.contract, b"timed_out"), None);
    }

    #[test]
    fn test_missing_code_is_resolution_failure() {
        let h = harness();
        let code_id = h.registry.contract_info(&h.contract).unwrap().code_id;
        h.registry.remove_code(code_id);
        let mut ctx = ctx();

        let err = call(&h, &mut ctx, &h.contract, EntryPoint::PacketAck).unwrap_err();

        assert!(matches!(
            err,
            RelayError::Resolve {
                source: ResolveError::CodeNotFound { .. },
                ..
            }
        ));
        assert_eq!(ctx.gas_meter.consumed(), 0);
    }
}
