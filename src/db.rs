//! Managed database client
//!
//! Thin REST client for the external BaaS (PostgREST dialect): `apikey` +
//! bearer headers with the publishable key, `column=eq.value` filters.
//! All durable-state consistency lives on the remote side; this module is
//! deliberately just plumbing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{SiteError, SiteResult};

/// A discount code row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discount {
    pub code: String,
    /// Percentage off, 0..=100
    pub percent_off: f64,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Usable right now?
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// A contact/booking lead captured by the site forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// A web-push subscription as handed over by the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

/// REST client for the managed database
#[derive(Clone)]
pub struct Database {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl Database {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn select(&self, table: &str, filter: &str) -> SiteResult<Vec<Value>> {
        let url = format!("{}?{}", self.table_url(table), filter);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SiteError::Database(format!(
                "select from {} failed: {}",
                table,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }

    async fn insert(&self, table: &str, row: &Value) -> SiteResult<()> {
        let response = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .timeout(std::time::Duration::from_secs(5))
            .json(row)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SiteError::Database(format!(
                "insert into {} failed: {}",
                table,
                response.status()
            )));
        }
        Ok(())
    }

    /// Look a discount code up; None when the code is unknown
    pub async fn find_discount(&self, code: &str) -> SiteResult<Option<Discount>> {
        let filter = format!("code=eq.{}&limit=1", urlencoding::encode(code));
        let rows = self.select("discount_codes", &filter).await?;
        debug!("🔎 Discount lookup '{}': {} row(s)", code, rows.len());
        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Store a new lead from the contact/booking forms
    pub async fn insert_lead(&self, lead: &Lead) -> SiteResult<()> {
        self.insert("leads", &serde_json::to_value(lead)?).await
    }

    /// Store a push subscription; the table keys on endpoint so re-posting
    /// the same subscription is harmless
    pub async fn save_push_subscription(&self, sub: &PushSubscription) -> SiteResult<()> {
        self.insert("push_subscriptions", &serde_json::to_value(sub)?)
            .await
    }

    /// Best-effort analytics row; callers are expected to ignore failures
    pub async fn insert_event(&self, event: &Value) -> SiteResult<()> {
        self.insert("analytics_events", event).await
    }
}
