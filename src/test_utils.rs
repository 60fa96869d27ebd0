//! Shared test utilities and arbitrary generators for property-based testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use proptest::prelude::*;

use crate::collector::{CatalogSource, FetchError};
use crate::monitor::QueueState;
use crate::notify::{Notifier, NotifyError};
use crate::persistence::{StateStore, StoreError};
use crate::types::{CatalogResponse, Queue, QueueId};

// ─── Builders ────────────────────────────────────────────────────────────────

pub fn queue(id: i64, active: bool, enabled: bool, ticket: &str, tickets_left: u32) -> Queue {
    Queue {
        id: QueueId(id),
        name: "Odbiór karty".to_string(),
        active,
        enabled,
        ticket_value: ticket.to_string(),
        tickets_left,
    }
}

pub fn catalog_with(group: &str, queues: Vec<Queue>) -> CatalogResponse {
    CatalogResponse {
        result: HashMap::from([(
            group.to_string(),
            queues
                .iter()
                .map(|q| serde_json::to_value(q).unwrap())
                .collect(),
        )]),
    }
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// A [`CatalogSource`] that replays a script of results.
///
/// Results are consumed in order. A trailing `Ok` repeats forever; an
/// exhausted script answers with a 503.
#[derive(Clone)]
pub struct ScriptedSource {
    script: Arc<Mutex<VecDeque<Result<CatalogResponse, FetchError>>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<CatalogResponse, FetchError>>) -> Self {
        ScriptedSource {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared counter of `fetch_catalog` calls.
    pub fn calls(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    fn next(&self) -> Result<CatalogResponse, FetchError> {
        let mut script = self.script.lock().unwrap();
        if script.len() == 1
            && let Some(Ok(catalog)) = script.front()
        {
            return Ok(catalog.clone());
        }
        script.pop_front().unwrap_or(Err(FetchError::Status(503)))
    }
}

impl CatalogSource for ScriptedSource {
    async fn fetch_catalog(&self) -> Result<CatalogResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.next()
    }
}

/// A [`Notifier`] that records what it was asked to send.
///
/// Clones share their recordings.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    attempts: Arc<AtomicU32>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries fail until `set_failing(false)`.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.set_failing(true);
        notifier
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successfully delivered `(destination, text)` pairs.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Delivery attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst) as usize
    }
}

impl Notifier for RecordingNotifier {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

/// A [`StateStore`] whose operations always fail.
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

impl StateStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(std::io::Error::other("store unavailable").into())
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(std::io::Error::other("store unavailable").into())
    }
}

// ─── Generators ──────────────────────────────────────────────────────────────

pub fn arb_ticket() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-Z][0-9]{1,3}".prop_map(String::from)]
}

pub fn arb_queue() -> impl Strategy<Value = Queue> {
    (any::<bool>(), any::<bool>(), arb_ticket(), 0u32..50).prop_map(
        |(active, enabled, ticket, tickets_left)| queue(24, active, enabled, &ticket, tickets_left),
    )
}

pub fn arb_queue_state() -> impl Strategy<Value = QueueState> {
    prop_oneof![
        Just(QueueState::Uninitialized),
        Just(QueueState::Inactive),
        Just(QueueState::ActiveDisabled),
        (0u32..50).prop_map(|tickets_left| QueueState::ActiveEnabled { tickets_left }),
    ]
}
