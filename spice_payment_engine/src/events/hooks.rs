use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::task::JoinSet;

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent};

/// The publishing side of the registered hooks. Cheap to clone; hand one to every component that emits events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

/// One handler, with its own queue, per registered hook.
pub struct EventHandlers {
    pub on_order_paid: Vec<EventHandler<OrderPaidEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks
            .on_order_paid
            .into_iter()
            .map(|(name, f)| EventHandler::new(name, buffer_size, f))
            .collect();
        Self { on_order_paid }
    }

    pub fn producers(&self) -> EventProducers {
        let order_paid_producer = self.on_order_paid.iter().map(|h| h.subscribe()).collect();
        EventProducers { order_paid_producer }
    }

    /// Spawns every handler loop. The returned set completes once all producers have been dropped and the queued
    /// events have been handled.
    pub fn start_handlers(self) -> JoinSet<()> {
        let mut handlers = JoinSet::new();
        for handler in self.on_order_paid {
            debug!("📬️ Spawning order-paid handler [{}]", handler.name());
            handlers.spawn(handler.start_handler());
        }
        handlers
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Vec<(String, Handler<OrderPaidEvent>)>,
}

impl EventHooks {
    /// Registers another order-paid hook. Hooks are independent of each other: each one gets its own queue.
    pub fn on_order_paid<S, F>(&mut self, name: S, f: F) -> &mut Self
    where
        S: Into<String>,
        F: (Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static,
    {
        self.on_order_paid.push((name.into(), Arc::new(f)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_order_paid.is_empty()
    }
}
