//! Analytics beacons
//!
//! Best-effort event capture. Tracking must never block or fail a
//! user-facing action, so sends are detached and every failure is
//! swallowed at debug level.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A tracked event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    pub fn new(name: &str) -> Self {
        Self {
            id: event_id(),
            name: name.to_string(),
            properties: HashMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}

fn event_id() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| format!("{:x}", rng.gen_range(0..16u8)))
        .collect()
}

/// Beacon sender bound to a collection endpoint
#[derive(Clone)]
pub struct Beacon {
    client: reqwest::Client,
    endpoint: String,
}

impl Beacon {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Fire and forget. Returns immediately; the send happens on a
    /// detached task and failures only show up in debug logs.
    pub fn track(&self, event: Event) {
        if self.endpoint.is_empty() {
            debug!("📊 No analytics endpoint, dropping event '{}'", event.name);
            return;
        }

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            let result = client
                .post(&endpoint)
                .timeout(std::time::Duration::from_secs(3))
                .json(&event)
                .send()
                .await;
            match result {
                Ok(response) if !response.status().is_success() => {
                    debug!(
                        "📊 Beacon '{}' rejected: {}",
                        event.name,
                        response.status()
                    );
                }
                Ok(_) => {}
                Err(e) => debug!("📊 Beacon '{}' failed: {}", event.name, e),
            }
        });
    }
}
