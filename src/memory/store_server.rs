// src/memory/store_server.rs — Async message passing for Store

use crate::memory::store::{AnalyticsSummary, Store, SymptomCountRow};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub enum StoreCommand {
    RecordUser {
        user_id: String,
        resp: oneshot::Sender<anyhow::Result<()>>,
    },
    RecordSymptoms {
        symptoms: Vec<String>,
        resp: oneshot::Sender<anyhow::Result<()>>,
    },
    QueryTopSymptoms {
        limit: u32,
        resp: oneshot::Sender<anyhow::Result<Vec<SymptomCountRow>>>,
    },
    QuerySummary {
        top_n: u32,
        resp: oneshot::Sender<anyhow::Result<AnalyticsSummary>>,
    },
}

/// A handle to the Store that uses message passing.
#[derive(Clone)]
pub struct StoreHandle {
    tx: mpsc::Sender<StoreCommand>,
}

impl StoreHandle {
    pub fn new(tx: mpsc::Sender<StoreCommand>) -> Self {
        Self { tx }
    }

    pub async fn record_user(&self, user_id: &str) -> anyhow::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::RecordUser {
                user_id: user_id.to_string(),
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn record_symptoms(&self, symptoms: Vec<String>) -> anyhow::Result<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::RecordSymptoms {
                symptoms,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn top_symptoms(&self, limit: u32) -> anyhow::Result<Vec<SymptomCountRow>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::QueryTopSymptoms {
                limit,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }

    pub async fn summary(&self, top_n: u32) -> anyhow::Result<AnalyticsSummary> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::QuerySummary {
                top_n,
                resp: resp_tx,
            })
            .await?;
        resp_rx.await?
    }
}

/// Helper to spawn the store server and return a handle.
pub fn spawn_store_server(store: Store) -> (StoreHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(100);
    let handle = StoreHandle::new(tx);
    let join_handle = tokio::spawn(run_store_server(store, rx));
    (handle, join_handle)
}

/// The background task that owns the Store.
pub async fn run_store_server(store: Store, mut rx: mpsc::Receiver<StoreCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::RecordUser { user_id, resp } => {
                let res = store.record_user(&user_id);
                let _ = resp.send(res);
            }
            StoreCommand::RecordSymptoms { symptoms, resp } => {
                let res = symptoms
                    .iter()
                    .try_for_each(|symptom| store.record_symptom(symptom));
                let _ = resp.send(res);
            }
            StoreCommand::QueryTopSymptoms { limit, resp } => {
                let res = store.top_symptoms(limit);
                let _ = resp.send(res);
            }
            StoreCommand::QuerySummary { top_n, resp } => {
                let res = store.summary(top_n);
                let _ = resp.send(res);
            }
        }
    }
    tracing::debug!("Store server stopped");
}
