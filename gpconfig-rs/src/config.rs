use std::path::Path;
use std::time::Duration;

use configparser::ini::Ini;
use tracing::debug;

use crate::buttons::ButtonMappingSet;
use crate::error::{ApiError, ApiResult};

/* Address of the controller's web configurator on its USB network interface. */
pub const PRODUCTION_BASE_URL: &str = "http://192.168.7.1";

/* Local development server for the configurator UI. */
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080";

/* Named base-URL presets. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_BASE_URL,
            Environment::Development => DEVELOPMENT_BASE_URL,
        }
    }

    fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(format!("Unknown environment '{}'", other)),
        }
    }
}

/* Everything the client needs at construction time. */
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /* Applied by the HTTP transport; `None` waits indefinitely. */
    pub timeout: Option<Duration>,
    /* Cloned for every pin-mapping read. */
    pub button_template: ButtonMappingSet,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            button_template: ButtonMappingSet::canonical(),
        }
    }

    pub fn for_environment(env: Environment) -> Self {
        Self::new(env.base_url())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_button_template(mut self, template: ButtonMappingSet) -> Self {
        self.button_template = template;
        self
    }

    /* Load a `[client]` section from an INI file.
     *
     * `base_url` wins over `environment`; both are optional. */
    pub fn load(path: &Path) -> ApiResult<Self> {
        let mut ini = Ini::new();
        ini.load(path).map_err(|e| ApiError::Config {
            path: path.display().to_string(),
            message: e,
        })?;

        let config = parse_client_section(&ini).map_err(|message| ApiError::Config {
            path: path.display().to_string(),
            message,
        })?;
        debug!("Loaded client configuration from {:?}: {}", path, config.base_url);
        Ok(config)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

fn parse_client_section(ini: &Ini) -> Result<ClientConfig, String> {
    let env = match ini.get("client", "environment") {
        Some(value) => Environment::parse(&value)?,
        None => Environment::default(),
    };

    let mut config = match ini.get("client", "base_url") {
        Some(url) if !url.trim().is_empty() => ClientConfig::new(url.trim()),
        _ => ClientConfig::for_environment(env),
    };

    if let Some(ms) = ini.get("client", "timeout_ms") {
        let ms: u64 = ms
            .trim()
            .parse()
            .map_err(|e| format!("Invalid timeout_ms '{}': {}", ms, e))?;
        config.timeout = Some(Duration::from_millis(ms));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ini(text: &str) -> Ini {
        let mut ini = Ini::new();
        ini.read(text.to_string()).expect("valid ini");
        ini
    }

    #[test]
    fn default_is_production() {
        assert_eq!(ClientConfig::default().base_url, PRODUCTION_BASE_URL);
    }

    #[test]
    fn environment_preset() {
        let config = parse_client_section(&ini("[client]\nenvironment = development\n")).unwrap();
        assert_eq!(config.base_url, DEVELOPMENT_BASE_URL);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn base_url_overrides_environment() {
        let config = parse_client_section(&ini(
            "[client]\nenvironment = dev\nbase_url = http://10.0.0.5\ntimeout_ms = 2500\n",
        ))
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5");
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn missing_section_falls_back_to_production() {
        let config = parse_client_section(&ini("[other]\nkey = value\n")).unwrap();
        assert_eq!(config.base_url, PRODUCTION_BASE_URL);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(parse_client_section(&ini("[client]\nenvironment = staging\n")).is_err());
        assert!(parse_client_section(&ini("[client]\ntimeout_ms = soon\n")).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ClientConfig::load(Path::new("/nonexistent/gpconfig.ini")).unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));
    }
}
