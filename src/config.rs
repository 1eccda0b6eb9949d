/// Runtime configuration
///
/// All values have defaults matching the classic instant-camera behavior, so
/// `SnapConfig::default()` is a working setup. Configs round-trip through JSON
/// the same way edit parameters do; the API key is read from the environment
/// and is never written back out.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SnapError};

/// Environment variables consulted by `SnapConfig::with_env`
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
pub const ENV_DEVELOP_MS: &str = "RETRO_SNAP_DEVELOP_MS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SnapConfig {
    // ========== Timing (presentation only) ==========
    /// How long a fresh capture stays in the Developing phase
    pub develop_delay_ms: u64,

    /// Pause between the flash acknowledgment and reading the frame
    pub flash_delay_ms: u64,

    /// Upper bound on waiting for a camera frame
    pub capture_timeout_ms: u64,

    // ========== Output ==========
    /// Quality factor for every lossy encode (1-100)
    pub jpeg_quality: u8,

    /// Width of the composited polaroid; height follows the frame aspect
    pub polaroid_width: u32,

    /// Captions are cut to this many characters
    pub caption_max_chars: usize,

    // ========== Policies ==========
    /// Center-square-crop uploads before they enter a Session
    pub square_uploads: bool,

    /// Oldest gallery records are evicted beyond this count (None = unbounded)
    pub gallery_capacity: Option<usize>,

    // ========== Camera ==========
    pub camera_front_index: u32,
    pub camera_back_index: u32,

    pub ai: AiConfig,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            develop_delay_ms: 5_000,
            flash_delay_ms: 100,
            capture_timeout_ms: 3_000,
            jpeg_quality: 90,
            polaroid_width: 880,
            caption_max_chars: 40,
            square_uploads: true,
            gallery_capacity: None,
            camera_front_index: 0,
            camera_back_index: 1,
            ai: AiConfig::default(),
        }
    }
}

/// Settings for the generative caption/edit service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub endpoint: String,
    pub caption_model: String,
    pub edit_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_ms: u64,
    /// Secret; only ever loaded from the environment or set in code
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            caption_model: "gemini-2.5-flash".to_string(),
            edit_model: "gemini-2.5-flash-image".to_string(),
            temperature: 0.7,
            max_output_tokens: 20,
            timeout_ms: 60_000,
            api_key: None,
        }
    }
}

impl SnapConfig {
    /// Convert to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a JSON config file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)
            .map_err(|e| SnapError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config.with_env())
    }

    /// Apply environment overrides (API key, develop delay)
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let key = lookup(ENV_API_KEY)
            .or_else(|| lookup(ENV_API_KEY_FALLBACK))
            .filter(|k| !k.trim().is_empty());
        if key.is_some() {
            self.ai.api_key = key;
        }

        if let Some(raw) = lookup(ENV_DEVELOP_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.develop_delay_ms = ms,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {}", ENV_DEVELOP_MS),
            }
        }
        self
    }

    /// Reject values no encoder or layout can honor
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(SnapError::Config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.jpeg_quality
            )));
        }
        if self.polaroid_width == 0 {
            return Err(SnapError::Config("polaroid_width must be positive".into()));
        }
        if self.caption_max_chars == 0 {
            return Err(SnapError::Config("caption_max_chars must be positive".into()));
        }
        if self.gallery_capacity == Some(0) {
            return Err(SnapError::Config("gallery_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn develop_delay(&self) -> Duration {
        Duration::from_millis(self.develop_delay_ms)
    }

    pub fn flash_delay(&self) -> Duration {
        Duration::from_millis(self.flash_delay_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = SnapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.develop_delay(), Duration::from_secs(5));
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.caption_max_chars, 40);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SnapConfig::from_json(r#"{"develop_delay_ms": 10, "ai": {"temperature": 0.2}}"#)
            .unwrap();
        assert_eq!(config.develop_delay_ms, 10);
        assert_eq!(config.polaroid_width, 880);
        assert_eq!(config.ai.temperature, 0.2);
        assert_eq!(config.ai.caption_model, "gemini-2.5-flash");
    }

    #[test]
    fn test_api_key_is_never_serialized() {
        let config = SnapConfig {
            ai: AiConfig {
                api_key: Some("secret".into()),
                ..AiConfig::default()
            },
            ..SnapConfig::default()
        };
        let json = config.to_json().unwrap();
        assert!(!json.contains("secret"));

        let restored = SnapConfig::from_json(&json).unwrap();
        assert_eq!(restored.ai.api_key, None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_API_KEY_FALLBACK, "k-123"), (ENV_DEVELOP_MS, "250")]);
        let config = SnapConfig::default().with_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.ai.api_key.as_deref(), Some("k-123"));
        assert_eq!(config.develop_delay_ms, 250);

        let blank = SnapConfig::default().with_env_from(|k| (k == ENV_API_KEY).then(|| " ".into()));
        assert_eq!(blank.ai.api_key, None);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SnapConfig {
            jpeg_quality: 0,
            ..SnapConfig::default()
        };
        assert!(matches!(config.validate(), Err(SnapError::Config(_))));

        let config = SnapConfig {
            gallery_capacity: Some(0),
            ..SnapConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, r#"{"polaroid_width": 440}"#).unwrap();
        let config = SnapConfig::load(&path).unwrap();
        assert_eq!(config.polaroid_width, 440);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(SnapConfig::load(&path), Err(SnapError::Config(_))));
    }
}
