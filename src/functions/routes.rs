//! Function handlers
//!
//! One handler per endpoint; each validates its required fields, then makes
//! exactly one outbound call. No retries: a third-party failure is logged
//! and becomes a generic 500.

use axum::{extract::State, http::StatusCode, Json};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::analytics::Event;
use crate::config::ClientBootstrap;
use crate::db::{Lead, PushSubscription};
use crate::error::SiteError;
use crate::push::PushPayload;

lazy_static! {
    static ref CODE_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{3,32}$").expect("valid regex");
}

fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::bad_request(&format!("Missing field: {name}"))),
    }
}

// --- captcha -------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CaptchaRequest {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptchaVerdict {
    success: bool,
}

/// POST /functions/verify-captcha
pub async fn verify_captcha(
    State(state): State<AppState>,
    Json(body): Json<CaptchaRequest>,
) -> Result<Json<Value>, ApiError> {
    let token = require(body.token, "token")?;

    let response = state
        .http
        .post(&state.config.captcha_verify_url)
        .form(&[
            ("secret", state.config.captcha_secret.as_str()),
            ("response", token.as_str()),
        ])
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await
        .map_err(SiteError::Http)?;

    if !response.status().is_success() {
        return Err(SiteError::Captcha(format!("verifier returned {}", response.status())).into());
    }

    let verdict: CaptchaVerdict = response.json().await.map_err(SiteError::Http)?;
    debug!("🤖 Captcha verdict: {}", verdict.success);
    Ok(Json(json!({ "success": verdict.success })))
}

// --- web push ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendPushRequest {
    pub endpoint: Option<String>,
    #[serde(default)]
    pub payload: PushPayload,
}

/// POST /functions/send-push
///
/// Thin delivery proxy: posts the notification JSON to the subscriber's
/// push endpoint with VAPID-derived headers. The configured public key has
/// to be valid URL-safe base64 or the whole feature is misconfigured.
pub async fn send_push(
    State(state): State<AppState>,
    Json(body): Json<SendPushRequest>,
) -> Result<Json<Value>, ApiError> {
    let endpoint = require(body.endpoint, "endpoint")?;

    let key = &state.config.vapid_public_key;
    if key.is_empty() || URL_SAFE_NO_PAD.decode(key).is_err() {
        return Err(SiteError::Push("VAPID public key missing or malformed".to_string()).into());
    }

    let response = state
        .http
        .post(&endpoint)
        .header("TTL", "86400")
        .header("Urgency", "normal")
        .header("Authorization", format!("vapid k={key}"))
        .timeout(std::time::Duration::from_secs(10))
        .json(&body.payload)
        .send()
        .await
        .map_err(SiteError::Http)?;

    let delivered = response.status().is_success();
    if !delivered {
        debug!("📪 Push endpoint answered {}", response.status());
    }
    Ok(Json(json!({ "delivered": delivered })))
}

// --- reviews -------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    #[serde(default)]
    reviews: Vec<PlaceReview>,
}

#[derive(Debug, Deserialize, serde::Serialize)]
struct PlaceReview {
    author_name: Option<String>,
    rating: Option<f64>,
    text: Option<String>,
    relative_time_description: Option<String>,
}

/// GET /functions/reviews
pub async fn reviews(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.config.places_api_key.is_empty() || state.config.place_id.is_empty() {
        return Err(SiteError::Places("places lookup not configured".to_string()).into());
    }

    let url = format!(
        "https://maps.googleapis.com/maps/api/place/details/json?place_id={}&fields=rating,user_ratings_total,reviews&key={}",
        urlencoding::encode(&state.config.place_id),
        urlencoding::encode(&state.config.places_api_key),
    );

    let response = state
        .http
        .get(&url)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await
        .map_err(SiteError::Http)?;

    let places: PlacesResponse = response.json().await.map_err(SiteError::Http)?;
    if places.status != "OK" {
        return Err(SiteError::Places(format!("lookup status {}", places.status)).into());
    }

    let result = places.result.unwrap_or(PlaceResult {
        rating: None,
        user_ratings_total: None,
        reviews: Vec::new(),
    });

    Ok(Json(json!({
        "rating": result.rating,
        "total": result.user_ratings_total,
        "reviews": result.reviews,
    })))
}

// --- conversational voice token ------------------------------------------

#[derive(Debug, Deserialize)]
struct VoiceTokenResponse {
    token: String,
}

/// POST /functions/voice-token
pub async fn voice_token(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if state.config.voice_api_key.is_empty() || state.config.voice_agent_id.is_empty() {
        return Err(SiteError::Voice("voice assistant not configured".to_string()).into());
    }

    let url = format!(
        "https://api.elevenlabs.io/v1/convai/conversation/token?agent_id={}",
        urlencoding::encode(&state.config.voice_agent_id),
    );

    let response = state
        .http
        .get(&url)
        .header("xi-api-key", &state.config.voice_api_key)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await
        .map_err(SiteError::Http)?;

    if !response.status().is_success() {
        return Err(SiteError::Voice(format!("token issuer returned {}", response.status())).into());
    }

    let issued: VoiceTokenResponse = response.json().await.map_err(SiteError::Http)?;
    Ok(Json(json!({
        "token": issued.token,
        "agent_id": state.config.voice_agent_id,
    })))
}

// --- transactional email -------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAccepted {
    id: String,
}

/// POST /functions/send-email
pub async fn send_email(
    State(state): State<AppState>,
    Json(body): Json<SendEmailRequest>,
) -> Result<Json<Value>, ApiError> {
    let to = require(body.to, "to")?;
    let subject = require(body.subject, "subject")?;
    let html = require(body.html, "html")?;

    let response = state
        .http
        .post("https://api.resend.com/emails")
        .bearer_auth(&state.config.resend_api_key)
        .timeout(std::time::Duration::from_secs(10))
        .json(&json!({
            "from": state.config.email_from,
            "to": [to.as_str()],
            "subject": subject,
            "html": html,
        }))
        .send()
        .await
        .map_err(SiteError::Http)?;

    if !response.status().is_success() {
        return Err(SiteError::Email(format!("sender returned {}", response.status())).into());
    }

    let accepted: EmailAccepted = response.json().await.map_err(SiteError::Http)?;
    info!("✉️ Email queued: {}", accepted.id);
    state.beacon.track(Event::new("email_sent").with("to", &to));
    Ok(Json(json!({ "id": accepted.id })))
}

// --- discount validation -------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ValidateDiscountRequest {
    pub code: Option<String>,
    pub amount: Option<f64>,
}

/// Discount math, kept pure for testing. Returns (discount, final),
/// both rounded to cents.
pub fn apply_discount(amount: f64, percent_off: f64) -> (f64, f64) {
    let discount = (amount * percent_off / 100.0 * 100.0).round() / 100.0;
    let final_amount = ((amount - discount) * 100.0).round() / 100.0;
    (discount, final_amount)
}

/// POST /functions/validate-discount
///
/// Unknown, malformed or expired codes are a `valid: false` success, not an
/// error: the page needs the structured result either way.
pub async fn validate_discount(
    State(state): State<AppState>,
    Json(body): Json<ValidateDiscountRequest>,
) -> Result<Json<Value>, ApiError> {
    let code = require(body.code, "code")?;
    let amount = body.amount.unwrap_or(0.0);
    if amount <= 0.0 {
        return Err(ApiError::bad_request("Invalid amount"));
    }

    let code = code.trim().to_uppercase();
    if !CODE_RE.is_match(&code) {
        return Ok(Json(json!({ "valid": false, "code": code })));
    }

    let discount = state.db.find_discount(&code).await?;
    let Some(discount) = discount.filter(|d| d.is_valid(chrono::Utc::now())) else {
        return Ok(Json(json!({ "valid": false, "code": code })));
    };

    let (discount_amount, final_amount) = apply_discount(amount, discount.percent_off);
    state
        .beacon
        .track(Event::new("discount_applied").with("code", &code));
    Ok(Json(json!({
        "valid": true,
        "code": code,
        "discountAmount": discount_amount,
        "finalAmount": final_amount,
    })))
}

// --- lead capture --------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// POST /functions/lead
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(body): Json<LeadRequest>,
) -> Result<Json<Value>, ApiError> {
    let name = require(body.name, "name")?;
    let email = require(body.email, "email")?;
    if !email.contains('@') {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let lead = Lead {
        name,
        email,
        phone: body.phone,
        message: body.message,
        source: body.source,
    };
    state.db.insert_lead(&lead).await?;

    state
        .beacon
        .track(Event::new("lead_submitted").with("source", lead.source.as_deref().unwrap_or("")));
    Ok(Json(json!({ "ok": true })))
}

// --- push subscription ---------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: Option<String>,
    pub p256dh: Option<String>,
    pub auth: Option<String>,
}

/// POST /functions/subscribe-push
pub async fn subscribe_push(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    let sub = PushSubscription {
        endpoint: require(body.endpoint, "endpoint")?,
        p256dh: require(body.p256dh, "p256dh")?,
        auth: require(body.auth, "auth")?,
    };
    state.db.save_push_subscription(&sub).await?;
    Ok(Json(json!({ "subscribed": true })))
}

// --- analytics sink ------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub properties: std::collections::HashMap<String, String>,
}

/// POST /functions/track
///
/// Best-effort by contract: the insert may fail, the caller still gets 204.
pub async fn track(State(state): State<AppState>, Json(body): Json<TrackRequest>) -> StatusCode {
    let Some(name) = body.name.filter(|n| !n.trim().is_empty()) else {
        return StatusCode::NO_CONTENT;
    };

    let mut event = Event::new(&name);
    event.properties = body.properties;
    let row = match serde_json::to_value(&event) {
        Ok(row) => row,
        Err(_) => return StatusCode::NO_CONTENT,
    };

    if let Err(e) = state.db.insert_event(&row).await {
        debug!("📊 Event insert failed (ignored): {}", e);
    }
    StatusCode::NO_CONTENT
}

// --- client bootstrap ----------------------------------------------------

/// GET /functions/client-config
///
/// Fallback for when build-time environment injection fails on the
/// frontend. Public fields only.
pub async fn client_config(State(state): State<AppState>) -> Json<ClientBootstrap> {
    Json(state.config.client_bootstrap())
}
