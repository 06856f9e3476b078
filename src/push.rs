//! Push notification plumbing
//!
//! Wire payload is JSON `{ title?, body?, tag?, url? }`. Parsing is
//! defensive: a missing or malformed payload is a no-op, missing fields
//! fall back to site defaults. Click handling prefers focusing an already
//! open page over opening a new one.

use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_TITLE: &str = "ApArt Hotel";
const DEFAULT_BODY: &str = "News from RealTrust";
const DEFAULT_ICON: &str = "/icons/icon-192.png";
const DEFAULT_TAG: &str = "realtrust";

/// Incoming push payload; every field is optional on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tag: Option<String>,
    pub url: Option<String>,
}

/// Action buttons offered on every notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    View,
    Dismiss,
}

impl NotificationAction {
    /// Parse the action id reported by the platform. Anything that is not
    /// an explicit dismiss counts as a view (clicking the notification body
    /// reports no action at all).
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            Some("dismiss") => NotificationAction::Dismiss,
            _ => NotificationAction::View,
        }
    }
}

/// Platform notification derived from a payload
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub tag: String,
    /// Target the view action navigates to, relative to the site origin
    pub url: String,
}

/// Parse raw push data into a notification, or None when there is nothing
/// usable (absent payload, or bytes that are not valid JSON)
pub fn parse_push(data: Option<&[u8]>) -> Option<Notification> {
    let data = data?;
    let payload: PushPayload = match serde_json::from_slice(data) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Ignoring malformed push payload: {}", e);
            return None;
        }
    };
    Some(notification_from(payload))
}

fn notification_from(payload: PushPayload) -> Notification {
    Notification {
        title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        body: payload.body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
        icon: DEFAULT_ICON.to_string(),
        tag: payload.tag.unwrap_or_else(|| DEFAULT_TAG.to_string()),
        url: payload.url.unwrap_or_else(|| "/".to_string()),
    }
}

/// What the click handler decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Dismiss action: close the notification, nothing else
    Dismiss,
    /// Focus (and navigate) the already open page at this index
    Focus(usize),
    /// No page at our origin is open; open a new one at this URL
    Open(String),
}

/// Resolve a notification click against the set of currently open pages
///
/// `open_pages` are absolute URLs of open browser contexts. The first one
/// at `origin` wins; otherwise a new page is opened at the notification's
/// target.
pub fn resolve_click(
    action: NotificationAction,
    notification: &Notification,
    origin: &str,
    open_pages: &[String],
) -> ClickOutcome {
    if action == NotificationAction::Dismiss {
        return ClickOutcome::Dismiss;
    }

    let origin = origin.trim_end_matches('/');
    if let Some(index) = open_pages.iter().position(|page| page.starts_with(origin)) {
        return ClickOutcome::Focus(index);
    }

    ClickOutcome::Open(format!("{}{}", origin, notification.url))
}
