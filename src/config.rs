use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    pub port: u16,
    /// Public origin the site is served from; the offline cache only
    /// intercepts requests to this origin
    pub public_origin: String,

    // Offline cache
    /// Version token embedded in cache names; bumping it invalidates every
    /// previously cached entry on next activation
    pub cache_version: String,
    /// Shell assets pre-cached at install time
    pub shell_assets: Vec<String>,

    // Managed database (public connection config, safe to hand to clients)
    pub supabase_url: String,
    pub supabase_publishable_key: String,

    // Third-party APIs
    pub captcha_verify_url: String,
    pub captcha_secret: String,
    pub resend_api_key: String,
    pub email_from: String,
    pub places_api_key: String,
    pub place_id: String,
    pub voice_api_key: String,
    pub voice_agent_id: String,

    // Web push
    pub vapid_public_key: String,
    pub vapid_private_key: String,
    pub vapid_subject: String,

    // Analytics
    #[serde(default)]
    pub analytics_endpoint: String,

    // Meta
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8787,
            public_origin: "https://realtrust.example".to_string(),
            cache_version: "v1".to_string(),
            shell_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
                "/assets/app.css".to_string(),
                "/assets/app.js".to_string(),
                "/icons/icon-192.png".to_string(),
            ],
            supabase_url: "".to_string(),
            supabase_publishable_key: "".to_string(),
            captcha_verify_url: "https://api.hcaptcha.com/siteverify".to_string(),
            captcha_secret: "".to_string(),
            resend_api_key: "".to_string(),
            email_from: "ApArt Hotel <bookings@realtrust.example>".to_string(),
            places_api_key: "".to_string(),
            place_id: "".to_string(),
            voice_api_key: "".to_string(),
            voice_agent_id: "".to_string(),
            vapid_public_key: "".to_string(),
            vapid_private_key: "".to_string(),
            vapid_subject: "mailto:bookings@realtrust.example".to_string(),
            analytics_endpoint: "".to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

/// Non-privileged connection config returned by the client bootstrap
/// endpoint when build-time injection fails on the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientBootstrap {
    pub supabase_url: String,
    pub supabase_publishable_key: String,
}

impl Config {
    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Secrets come from the environment when present, so deployments never
    /// need them on disk
    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 7] = [
            ("REALTRUST_SUPABASE_URL", &mut self.supabase_url),
            (
                "REALTRUST_SUPABASE_PUBLISHABLE_KEY",
                &mut self.supabase_publishable_key,
            ),
            ("REALTRUST_CAPTCHA_SECRET", &mut self.captcha_secret),
            ("REALTRUST_RESEND_API_KEY", &mut self.resend_api_key),
            ("REALTRUST_PLACES_API_KEY", &mut self.places_api_key),
            ("REALTRUST_VOICE_API_KEY", &mut self.voice_api_key),
            ("REALTRUST_VAPID_PRIVATE_KEY", &mut self.vapid_private_key),
        ];

        for (key, slot) in overrides {
            if let Ok(value) = std::env::var(key) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
    }

    /// The public subset handed to the browser. Never extend this with
    /// anything privileged.
    pub fn client_bootstrap(&self) -> ClientBootstrap {
        ClientBootstrap {
            supabase_url: self.supabase_url.clone(),
            supabase_publishable_key: self.supabase_publishable_key.clone(),
        }
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("realtrust")
        .join("config.json")
}
