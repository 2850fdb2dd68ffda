// src/dialogue/stats.rs — Process-wide usage counters
//
// Informational only. Counters use relaxed ordering and the dialogue logic
// never reads them.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

#[derive(Default)]
pub struct GlobalStats {
    messages: AtomicU64,
    analyses: AtomicU64,
    users: Mutex<HashSet<String>>,
    symptoms: Mutex<HashMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub distinct_users: u64,
    pub messages: u64,
    pub analyses: u64,
    /// Filled in by the caller from the session store.
    pub active_sessions: usize,
    /// Most frequent symptoms, highest count first.
    pub top_symptoms: Vec<(String, u64)>,
}

impl GlobalStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_message(&self, user_id: &str) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if !users.contains(user_id) {
            users.insert(user_id.to_string());
        }
    }

    /// Count one analysis and each of its symptoms.
    pub fn record_analysis(&self, symptoms: &[String]) {
        self.analyses.fetch_add(1, Ordering::Relaxed);
        let mut counts = self.symptoms.lock().unwrap_or_else(|e| e.into_inner());
        for symptom in symptoms {
            *counts.entry(symptom.clone()).or_insert(0) += 1;
        }
    }

    pub fn snapshot(&self, top_n: usize) -> StatsSnapshot {
        let distinct_users = self.users.lock().unwrap_or_else(|e| e.into_inner()).len() as u64;

        let mut top: Vec<(String, u64)> = self
            .symptoms
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        // ties broken by name so snapshots are stable
        top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top.truncate(top_n);

        StatsSnapshot {
            distinct_users,
            messages: self.messages.load(Ordering::Relaxed),
            analyses: self.analyses.load(Ordering::Relaxed),
            active_sessions: 0,
            top_symptoms: top,
        }
    }
}
