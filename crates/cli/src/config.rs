use anyhow::{Context, Result};
use bridge::BridgeConfig;
use log::LevelFilter;
use node::FontName;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Environment variable consulted for the log level when no flag is given.
pub const LOG_ENV: &str = "BRIDGE_LOG";

/// Host configuration, read from a JSON file.
///
/// Bridge settings sit at the top level next to the host's own keys:
///
/// ```json
/// {
///   "name": "Landing Page",
///   "fileKey": "abc123",
///   "user": {"id": "u1", "name": "Ada"},
///   "defaultFont": {"family": "Inter", "style": "Regular"},
///   "fonts": [{"family": "Inter", "style": "Regular"}],
///   "logLevel": "debug"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CliConfig {
    #[serde(flatten)]
    pub bridge: BridgeConfig,
    /// Document name reported in plugin info
    pub name: Option<String>,
    pub file_key: Option<String>,
    /// Fonts the host can load
    pub fonts: Vec<FontName>,
    pub log_level: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            name: None,
            file_key: None,
            fonts: ["Regular", "Medium", "Bold"]
                .into_iter()
                .map(|style| FontName::new("Inter", style))
                .collect(),
            log_level: None,
        }
    }
}

impl CliConfig {
    /// Loads the config at `path`, or the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Picks the log level: the flag, then `BRIDGE_LOG`, then the config
    /// file, then `info`.
    pub fn log_level(&self, flag: Option<&str>, env: Option<&str>) -> Result<LevelFilter> {
        let Some(level) = flag.or(env).or(self.log_level.as_deref()) else {
            return Ok(LevelFilter::Info);
        };
        LevelFilter::from_str(level).with_context(|| format!("Invalid log level: {level}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::parse("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.fonts.len(), 3);
        assert!(config.fonts.contains(&FontName::new("Inter", "Bold")));
    }

    #[test]
    fn test_bridge_settings_are_flattened() {
        let config = CliConfig::parse(
            r#"{
                "name": "Landing Page",
                "fileKey": "abc123",
                "user": {"id": "u1", "name": "Ada"},
                "defaultFont": {"family": "Roboto", "style": "Regular"},
                "fonts": [{"family": "Roboto", "style": "Regular"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("Landing Page"));
        assert_eq!(config.file_key.as_deref(), Some("abc123"));
        assert_eq!(config.bridge.user.unwrap().id, "u1");
        assert_eq!(config.bridge.default_font, FontName::new("Roboto", "Regular"));
        assert_eq!(config.fonts, vec![FontName::new("Roboto", "Regular")]);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        assert!(CliConfig::parse(r#"{"fonts": "Inter"}"#).is_err());
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/bridge.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/bridge.json"));
    }

    #[test]
    fn test_log_level_precedence() {
        let config = CliConfig {
            log_level: Some("warn".into()),
            ..CliConfig::default()
        };
        assert_eq!(config.log_level(Some("trace"), Some("debug")).unwrap(), LevelFilter::Trace);
        assert_eq!(config.log_level(None, Some("debug")).unwrap(), LevelFilter::Debug);
        assert_eq!(config.log_level(None, None).unwrap(), LevelFilter::Warn);
        assert_eq!(
            CliConfig::default().log_level(None, None).unwrap(),
            LevelFilter::Info
        );
        assert!(config.log_level(Some("loud"), None).is_err());
    }
}
