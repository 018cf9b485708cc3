#![allow(dead_code)]
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use chrono::{DateTime, TimeZone, Utc};
use spice_payment_engine::{
    db_types::{Cents, NewOrder, Order, OrderNsu, PaymentConfirmation, PaymentMethod},
    events::{EventHandlers, EventHooks, EventProducers, OrderPaidEvent},
    OrderStore,
    OrderStoreError,
    SqliteDatabase,
};
use tokio::task::JoinSet;

/// Counts order-paid events delivered through a real event handler.
#[derive(Default, Clone)]
pub struct PaidCounter {
    count: Arc<AtomicUsize>,
    orders: Arc<std::sync::Mutex<Vec<String>>>,
}

impl PaidCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> Vec<String> {
        self.orders.lock().expect("poisoned").clone()
    }

    /// Registers the counter as an order-paid hook and starts the handler.
    pub fn start(&self) -> (EventProducers, JoinSet<()>) {
        let counter = self.clone();
        let mut hooks = EventHooks::default();
        hooks.on_order_paid("counter", move |ev: OrderPaidEvent| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.count.fetch_add(1, Ordering::SeqCst);
                counter.orders.lock().expect("poisoned").push(ev.order.order_nsu.to_string());
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        (producers, handlers.start_handlers())
    }
}

/// Waits for every queued event to be handled. All producers must have been dropped.
pub async fn drain(mut handlers: JoinSet<()>) {
    while handlers.join_next().await.is_some() {}
}

pub fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub async fn seed_order(db: &SqliteDatabase, nsu: &str, total: i64, created_at: DateTime<Utc>, customer: &str) {
    let order = NewOrder::new(nsu, Cents::from(total))
        .with_customer(customer, Some("cliente@example.com"), Some("+5511999990000"))
        .with_payment_method(PaymentMethod::Pix)
        .created_at(created_at);
    let (_, inserted) = db.insert_order(order).await.expect("Error inserting order");
    assert!(inserted, "Order {nsu} already existed");
}

/// A SQLite store whose confirmations fail for the listed orders.
#[derive(Clone)]
pub struct FlakyStore {
    pub db: SqliteDatabase,
    failing: Arc<Vec<String>>,
}

impl FlakyStore {
    pub fn new(db: SqliteDatabase, failing: &[&str]) -> Self {
        Self { db, failing: Arc::new(failing.iter().map(|s| s.to_string()).collect()) }
    }
}

impl OrderStore for FlakyStore {
    fn url(&self) -> &str {
        self.db.url()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError> {
        self.db.insert_order(order).await
    }

    async fn fetch_order_by_nsu(&self, order_nsu: &OrderNsu) -> Result<Option<Order>, OrderStoreError> {
        self.db.fetch_order_by_nsu(order_nsu).await
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, OrderStoreError> {
        self.db.fetch_pending_orders().await
    }

    async fn confirm_if_pending(
        &self,
        order_nsu: &OrderNsu,
        confirmation: &PaymentConfirmation,
    ) -> Result<Option<Order>, OrderStoreError> {
        if self.failing.iter().any(|nsu| nsu == order_nsu.as_str()) {
            return Err(OrderStoreError::DatabaseError("database is locked".into()));
        }
        self.db.confirm_if_pending(order_nsu, confirmation).await
    }
}
