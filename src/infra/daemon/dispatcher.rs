// src/infra/daemon/dispatcher.rs — Per-user worker queues
//
// Each user gets one worker task fed by an mpsc queue, so one user's
// messages are answered in arrival order while different users proceed
// concurrently. Queueing never waits: a user whose queue is full loses the
// extra message instead of holding up everyone else. A worker exits after
// sitting idle and is respawned on the next message.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::dialogue::DialogueController;
use crate::integrations::{IncomingMessage, MessagingAdapter};
use crate::util::truncate_str;

const QUEUE_DEPTH: usize = 32;

struct Worker {
    tx: mpsc::Sender<IncomingMessage>,
    handle: JoinHandle<()>,
}

pub struct Dispatcher {
    controller: Arc<DialogueController>,
    adapter: Arc<dyn MessagingAdapter>,
    workers: HashMap<String, Worker>,
    worker_idle: Duration,
}

impl Dispatcher {
    pub fn new(
        controller: Arc<DialogueController>,
        adapter: Arc<dyn MessagingAdapter>,
        worker_idle: Duration,
    ) -> Self {
        Self {
            controller,
            adapter,
            workers: HashMap::new(),
            worker_idle,
        }
    }

    /// Queue a message on its sender's worker, spawning one if needed.
    /// Returns false when the message was dropped because the queue is full.
    pub fn dispatch(&mut self, msg: IncomingMessage) -> bool {
        let user_id = msg.sender_id.clone();

        let msg = match self.workers.get(&user_id) {
            Some(worker) => match worker.tx.try_send(msg) {
                Ok(()) => return true,
                Err(TrySendError::Full(msg)) => {
                    tracing::warn!(
                        user = %user_id,
                        queued = QUEUE_DEPTH,
                        "Queue full, dropping \"{}\"",
                        truncate_str(&msg.content, 40)
                    );
                    return false;
                }
                // worker went idle and exited; hand the message to a new one
                Err(TrySendError::Closed(msg)) => msg,
            },
            None => msg,
        };

        let worker = self.spawn_worker(&user_id);
        let queued = worker.tx.try_send(msg).is_ok();
        if !queued {
            tracing::error!(user = %user_id, "Worker refused its first message");
        }
        self.workers.insert(user_id, worker);
        queued
    }

    /// Forget workers that have exited. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.workers.len();
        self.workers.retain(|_, w| !w.handle.is_finished());
        before - self.workers.len()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close every queue and wait for in-flight replies to go out.
    pub async fn shutdown(self) {
        let handles: Vec<JoinHandle<()>> = self
            .workers
            .into_values()
            .map(|Worker { tx, handle }| {
                drop(tx);
                handle
            })
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!("Worker ended abnormally: {}", e);
            }
        }
    }

    fn spawn_worker(&self, user_id: &str) -> Worker {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let handle = tokio::spawn(run_worker(
            self.controller.clone(),
            self.adapter.clone(),
            rx,
            self.worker_idle,
        ));
        tracing::debug!(user = user_id, "Spawned worker");
        Worker { tx, handle }
    }
}

async fn run_worker(
    controller: Arc<DialogueController>,
    adapter: Arc<dyn MessagingAdapter>,
    mut rx: mpsc::Receiver<IncomingMessage>,
    idle: Duration,
) {
    loop {
        match tokio::time::timeout(idle, rx.recv()).await {
            Ok(Some(msg)) => answer(&controller, adapter.as_ref(), msg).await,
            Ok(None) => return,
            Err(_) => break,
        }
    }
    close_and_drain(&controller, adapter.as_ref(), &mut rx).await;
}

/// Stop accepting messages, then answer whatever was queued before the close.
/// After this, senders see `Closed` and the dispatcher respawns the worker.
async fn close_and_drain(
    controller: &DialogueController,
    adapter: &dyn MessagingAdapter,
    rx: &mut mpsc::Receiver<IncomingMessage>,
) {
    rx.close();
    while let Ok(msg) = rx.try_recv() {
        answer(controller, adapter, msg).await;
    }
}

async fn answer(controller: &DialogueController, adapter: &dyn MessagingAdapter, msg: IncomingMessage) {
    if let Err(e) = adapter.typing(&msg.target).await {
        tracing::debug!("Typing indicator failed: {}", e);
    }

    let reply = controller.handle_message(&msg.sender_id, &msg.content).await;
    tracing::info!(
        user = %msg.sender_id,
        stage = %reply.stage,
        "Replied to \"{}\"",
        truncate_str(&msg.content, 40)
    );

    if let Err(e) = adapter
        .send(&msg.target, &reply.text, &reply.quick_replies)
        .await
    {
        tracing::warn!(adapter = adapter.id(), target = %msg.target, "Send failed: {}", e);
    }
}
