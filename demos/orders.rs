//! # Example: orders
//!
//! Two consumers on one host, fed by in-process sources.
//!
//! Demonstrates how to:
//! - Register a value handler and a full-envelope handler.
//! - Provide handler instances per message with [`TransientUnitOfWorkFactory`].
//! - Commit manually (`enable.auto.commit = false`) through a [`CommitFn`].
//! - Restart a failing consumer with [`RestartWithBackoff`], then give up and stop the host.
//!
//! ## Flow
//! ```text
//! producer ──► MemorySender("orders") ──► billing/orders  (OrderHandler, manual commit)
//!          └─► MemorySender("audit")  ──► audit/audit     (AuditHandler, full envelope)
//!
//! order 13 is poisoned:
//!   OrderHandler fails ──► RestartWithBackoff: restart, restart ──► Default
//!                      ──► request_shutdown() ──► every consumer stops
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example orders
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use consumevisor::{
    BackoffPolicy, BoxError, CommitFn, ConsumerConfigBuilder, JitterPolicy, MemorySourceFactory,
    MessageHandler, MessageHandlerContext, MessageResult, Metadata, RestartWithBackoff, Subscribe,
    Supervisor, SupervisorConfig, TransientUnitOfWorkFactory,
};

const POISON: u64 = 13;

struct OrderHandler;

#[async_trait]
impl MessageHandler<u64> for OrderHandler {
    async fn handle(&self, order: &u64, ctx: &MessageHandlerContext) -> Result<(), BoxError> {
        if *order == POISON {
            return Err(format!("order {order} cannot be priced").into());
        }
        println!("[orders] order {order} at offset {}", ctx.metadata().offset);
        Ok(())
    }
}

struct AuditHandler;

#[async_trait]
impl MessageHandler<MessageResult<String, String>> for AuditHandler {
    async fn handle(
        &self,
        msg: &MessageResult<String, String>,
        _ctx: &MessageHandlerContext,
    ) -> Result<(), BoxError> {
        println!("[audit] {} = {}", msg.key(), msg.value());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 1. Sources
    let (orders_tx, orders_source) = MemorySourceFactory::<String, u64>::channel("orders", 64);
    let (audit_tx, audit_source) = MemorySourceFactory::<String, String>::channel("audit", 64);

    // 2. Orders: manual commit, restart twice with backoff, then give up
    let backoff = BackoffPolicy {
        first: Duration::from_millis(100),
        max: Duration::from_secs(1),
        factor: 2.0,
        jitter: JitterPolicy::Equal,
    };
    let orders = ConsumerConfigBuilder::<String, u64>::new()
        .with_group_id("billing")
        .with_enable_auto_commit(false)
        .register_message_handler::<OrderHandler>("orders")?
        .with_source_factory(Arc::new(orders_source))
        .with_unit_of_work_factory(Arc::new(
            TransientUnitOfWorkFactory::<String, u64>::new().with_value_handler(|| OrderHandler),
        ))
        .with_failure_evaluator(Arc::new(RestartWithBackoff::new(backoff).with_max_restarts(2)))
        .build()?;

    // 3. Audit: full envelopes, auto-commit
    let audit = ConsumerConfigBuilder::<String, String>::new()
        .with_group_id("audit")
        .register_message_result_handler::<AuditHandler>("audit")?
        .with_source_factory(Arc::new(audit_source))
        .with_unit_of_work_factory(Arc::new(
            TransientUnitOfWorkFactory::<String, String>::new().with_envelope_handler(|| AuditHandler),
        ))
        .build()?;

    // 4. Host
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(consumevisor::LogWriter)];
    let sup = Supervisor::builder(SupervisorConfig {
        grace: Duration::from_secs(5),
        ..SupervisorConfig::default()
    })
    .with_subscribers(subs)
    .with_consumer(orders)?
    .with_consumer(audit)?
    .build();
    println!("consumers: {:?}", sup.consumers());

    // 5. Producer
    tokio::spawn(async move {
        let committed = Arc::new(AtomicI64::new(-1));
        for (offset, order) in [10u64, 11, 12, POISON, 14, POISON, 15, POISON].into_iter().enumerate() {
            let offset = offset as i64;
            let c = Arc::clone(&committed);
            let msg = MessageResult::new(format!("o-{order}"), order, Metadata::new("orders", 0, offset))
                .with_commit(CommitFn::new(move || {
                    let c = Arc::clone(&c);
                    async move {
                        c.store(offset, Ordering::SeqCst);
                        println!("[orders] committed offset {offset}");
                        Ok::<_, BoxError>(())
                    }
                }));
            if orders_tx.send(msg).await.is_err() {
                break;
            }
            let _ = audit_tx
                .publish(format!("o-{order}"), "received".to_string())
                .await;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    // 6. Runs until the orders consumer gives up (or Ctrl-C)
    sup.run().await?;
    println!("host stopped");
    Ok(())
}
