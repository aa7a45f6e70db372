use crate::error::CivisError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Algenib";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOOL_CALLS: usize = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub tts_model: String,
    pub voice: String,
    pub speech_enabled: bool,
    pub request_timeout: Duration,
    pub max_tool_calls: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            speech_enabled: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
        }
    }
}

impl Config {
    /// Reads configuration from the process environment. Call `dotenv().ok()`
    /// first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, CivisError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CivisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let text = |key: &str, default: String| lookup(key).filter(|v| !v.trim().is_empty()).unwrap_or(default);

        let timeout_secs: u64 = parse_var(&lookup, "CIVIS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(CivisError::Config("CIVIS_TIMEOUT_SECS must be at least 1".into()));
        }

        let max_tool_calls: usize = parse_var(&lookup, "CIVIS_MAX_TOOL_CALLS", DEFAULT_MAX_TOOL_CALLS)?;
        if max_tool_calls == 0 {
            return Err(CivisError::Config("CIVIS_MAX_TOOL_CALLS must be at least 1".into()));
        }

        Ok(Config {
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            api_base: text("GEMINI_API_BASE", defaults.api_base),
            model: text("CIVIS_MODEL", defaults.model),
            tts_model: text("CIVIS_TTS_MODEL", defaults.tts_model),
            voice: text("CIVIS_TTS_VOICE", defaults.voice),
            speech_enabled: parse_var(&lookup, "CIVIS_SPEECH", false)?,
            request_timeout: Duration::from_secs(timeout_secs),
            max_tool_calls,
        })
    }

    pub fn require_api_key(&self) -> Result<&str, CivisError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| CivisError::Config("GEMINI_API_KEY must be set".into()))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CivisError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| CivisError::Config(format!("{key}={raw:?}: {e}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tool_calls, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(!config.speech_enabled);
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("CIVIS_MAX_TOOL_CALLS", "5"),
            ("CIVIS_SPEECH", "true"),
            ("CIVIS_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.require_api_key().unwrap(), "k");
        assert_eq!(config.max_tool_calls, 5);
        assert!(config.speech_enabled);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("CIVIS_MAX_TOOL_CALLS", "many")])).unwrap_err();
        assert!(matches!(err, CivisError::Config(_)));
        let err = Config::from_lookup(lookup_from(&[("CIVIS_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, CivisError::Config(_)));
    }

    #[test]
    fn zero_tool_budget_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("CIVIS_MAX_TOOL_CALLS", "0")])).unwrap_err();
        match err {
            CivisError::Config(msg) => assert!(msg.contains("CIVIS_MAX_TOOL_CALLS")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
