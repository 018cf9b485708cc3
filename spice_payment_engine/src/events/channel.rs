//! Simple stateless pub-sub event handler
//!
//! This module provides a small hook system that allows components of the system to subscribe to payment engine events
//! and react to them. The handlers are stateless: they have no access to the internal state of the engine, only to the
//! event itself. Handlers are async, and every event is handled in its own task, so a slow handler never holds up the
//! code that published the event.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    name: String,
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new<S: Into<String>>(name: S, buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { name: name.into(), listener: receiver, sender, handler }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs the handler until every producer has been dropped, then waits for the in-flight jobs to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler [{}]", self.name);
        // Drop the internal sender so that the loop ends once the last subscriber is dropped
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ [{}] Handling event", self.name);
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(ev).await });
            // Reap whatever has already finished so the set doesn't grow without bound
            while let Some(res) = jobs.try_join_next() {
                log_job_result(&self.name, res);
            }
        }
        debug!("📬️ [{}] All producers dropped. Waiting for {} jobs to complete", self.name, jobs.len());
        while let Some(res) = jobs.join_next().await {
            log_job_result(&self.name, res);
        }
        debug!("📬️ Event handler [{}] has shut down", self.name);
    }
}

fn log_job_result(name: &str, res: Result<(), tokio::task::JoinError>) {
    match res {
        Ok(()) => trace!("📬️ [{name}] Event handled"),
        Err(e) => error!("📬️ [{name}] Event handler task failed: {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event. Failure to queue is logged, and never propagated to the publisher.
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
