//! Order lifecycle end to end on in-memory backends
//!
//! Create → wrong code → right code → complete → cancel rejected, plus the
//! concurrent-confirm race. Events are checked after the worker drains.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use shared::order::{LifecycleEvent, LifecycleEventType, LineItem, OrderStatus};
use tiffin_cloud::events::{EventLog, EventWorker, MemoryEventStorage};
use tiffin_cloud::orders::{
    MemoryOrderStore, NewOrderRequest, OrderCodeGenerator, OrderError, OrderLifecycle,
};
use tiffin_cloud::otp::{OtpCode, OtpError, OtpHasher, OtpManager, OtpPolicy};
use tiffin_cloud::ttl::MemoryTtlStore;
use tokio::task::JoinHandle;

const TIMEOUT: Duration = Duration::from_millis(300);

struct Harness {
    lifecycle: OrderLifecycle,
    storage: Arc<MemoryEventStorage>,
    worker: JoinHandle<()>,
}

fn harness() -> Harness {
    let otp = OtpManager::new(
        Arc::new(MemoryTtlStore::new()),
        OtpHasher::new("integration-secret"),
        OtpPolicy::default(),
        TIMEOUT,
    );
    let storage = Arc::new(MemoryEventStorage::new());
    let (events, rx) = EventLog::new(storage.clone(), 256);
    let worker = tokio::spawn(EventWorker::new(storage.clone()).run(rx));
    let lifecycle = OrderLifecycle::new(
        Arc::new(MemoryOrderStore::new()),
        Arc::new(otp),
        OrderCodeGenerator::new("JF").unwrap(),
        events,
        TIMEOUT,
    );
    Harness {
        lifecycle,
        storage,
        worker,
    }
}

/// Drop every sender, wait for the worker, return everything it stored
async fn drain(
    lifecycle: OrderLifecycle,
    storage: &MemoryEventStorage,
    worker: JoinHandle<()>,
) -> Vec<LifecycleEvent> {
    drop(lifecycle);
    worker.await.unwrap();
    storage.events()
}

fn thali_order() -> NewOrderRequest {
    NewOrderRequest {
        buyer_id: 42,
        provider_id: 7,
        items: vec![LineItem::new("thali", 1, Decimal::from(150))],
        total_estimate: Decimal::from(150),
    }
}

fn wrong(code: &OtpCode) -> String {
    let first = code.as_str().as_bytes()[0];
    let flipped = if first == b'9' { '0' } else { (first + 1) as char };
    format!("{flipped}{}", &code.as_str()[1..])
}

#[tokio::test]
async fn thali_order_end_to_end() {
    let Harness {
        lifecycle,
        storage,
        worker,
    } = harness();

    let created = lifecycle.create(thali_order()).await.unwrap();
    assert!(created.order_code.starts_with("JF-"));
    let code = created.otp.expect("order code issued");
    let id = created.order_id;

    // Wrong code: rejected, state unchanged
    assert!(matches!(
        lifecycle.confirm_with_otp(id, &wrong(&code)).await,
        Err(OrderError::Otp(OtpError::InvalidCode))
    ));
    assert_eq!(lifecycle.get(id).await.unwrap().status, OrderStatus::Created);

    // Right code
    let confirmed = lifecycle.confirm_with_otp(id, code.as_str()).await.unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    let completed = lifecycle.complete(id).await.unwrap();
    assert_eq!(completed.status, OrderStatus::Completed);
    assert!(completed.completed_at.is_some());

    // Terminal
    match lifecycle.cancel(id).await {
        Err(OrderError::InvalidStateTransition { current, .. }) => {
            assert_eq!(current, OrderStatus::Completed)
        }
        other => panic!("expected InvalidStateTransition, got {other:?}"),
    }
    let after = lifecycle.get(id).await.unwrap();
    assert_eq!(after.status, OrderStatus::Completed);
    assert_eq!(after.cancelled_at, None);

    let by_code = lifecycle.find_by_code(&created.order_code).await.unwrap();
    assert_eq!(by_code.id, id);

    let events = drain(lifecycle, &storage, worker).await;
    let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            LifecycleEventType::OrderCreated,
            LifecycleEventType::OrderConfirmRejected,
            LifecycleEventType::OrderConfirmed,
            LifecycleEventType::OrderCompleted,
        ]
    );
    assert!(events.iter().all(|e| e.entity_id == id.to_string()));
}

#[tokio::test]
async fn confirm_after_terminal_is_rejected_without_mutation() {
    let Harness {
        lifecycle,
        storage,
        worker,
    } = harness();

    // Cancelled
    let cancelled = lifecycle.create(thali_order()).await.unwrap();
    let cancelled_code = cancelled.otp.unwrap();
    lifecycle.cancel(cancelled.order_id).await.unwrap();
    let before = lifecycle.get(cancelled.order_id).await.unwrap();
    assert!(matches!(
        lifecycle
            .confirm_with_otp(cancelled.order_id, cancelled_code.as_str())
            .await,
        Err(OrderError::InvalidStateTransition {
            current: OrderStatus::Cancelled,
            ..
        })
    ));
    assert_eq!(lifecycle.get(cancelled.order_id).await.unwrap(), before);

    // Completed
    let done = lifecycle.create(thali_order()).await.unwrap();
    let done_code = done.otp.unwrap();
    lifecycle
        .confirm_with_otp(done.order_id, done_code.as_str())
        .await
        .unwrap();
    lifecycle.complete(done.order_id).await.unwrap();
    let before = lifecycle.get(done.order_id).await.unwrap();
    assert!(matches!(
        lifecycle
            .confirm_with_otp(done.order_id, done_code.as_str())
            .await,
        Err(OrderError::InvalidStateTransition {
            current: OrderStatus::Completed,
            ..
        })
    ));
    assert_eq!(lifecycle.get(done.order_id).await.unwrap(), before);

    let events = drain(lifecycle, &storage, worker).await;
    let confirmed = events
        .iter()
        .filter(|e| e.event_type == LifecycleEventType::OrderConfirmed)
        .count();
    assert_eq!(confirmed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_confirms_yield_one_transition() {
    let Harness {
        lifecycle,
        storage,
        worker,
    } = harness();
    let lifecycle = Arc::new(lifecycle);

    let created = lifecycle.create(thali_order()).await.unwrap();
    let code = created.otp.unwrap().as_str().to_string();
    let id = created.order_id;

    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let lifecycle = lifecycle.clone();
        let barrier = barrier.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            lifecycle.confirm_with_otp(id, &code).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status, OrderStatus::Confirmed);
                successes += 1;
            }
            Err(OrderError::Otp(OtpError::CodeExpiredOrNotFound))
            | Err(OrderError::InvalidStateTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);

    let lifecycle = Arc::into_inner(lifecycle).expect("all tasks finished");
    let events = drain(lifecycle, &storage, worker).await;
    let confirmed = events
        .iter()
        .filter(|e| e.event_type == LifecycleEventType::OrderConfirmed)
        .count();
    assert_eq!(confirmed, 1);
}

#[tokio::test]
async fn reissue_after_cancel_is_rejected() {
    let Harness { lifecycle, .. } = harness();
    let created = lifecycle.create(thali_order()).await.unwrap();
    lifecycle.cancel(created.order_id).await.unwrap();

    assert!(matches!(
        lifecycle.reissue_otp(created.order_id).await,
        Err(OrderError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn reissue_is_rate_limited() {
    let Harness { lifecycle, .. } = harness();
    let created = lifecycle.create(thali_order()).await.unwrap();

    for _ in 0..5 {
        lifecycle.reissue_otp(created.order_id).await.unwrap();
    }
    assert!(matches!(
        lifecycle.reissue_otp(created.order_id).await,
        Err(OrderError::Otp(OtpError::RateLimited { .. }))
    ));
}
