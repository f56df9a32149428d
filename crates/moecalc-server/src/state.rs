use std::env;

use moecalc_core::Precision;
use tracing::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Substituted when a request names a precision we don't know.
    pub default_precision: Precision,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_precision: Precision::default(),
        }
    }
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid PORT {:?}, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let default_precision = env::var("DEFAULT_PRECISION")
            .map(|label| Precision::parse_or_default(&label))
            .unwrap_or_default();

        Self {
            host,
            port,
            default_precision,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct AppState {
    pub settings: ServerSettings,
}

impl AppState {
    pub fn new(settings: ServerSettings) -> Self {
        Self { settings }
    }

    /// Resolve a requested precision, falling back to the configured default.
    pub fn resolve_precision(&self, label: Option<&str>) -> Precision {
        let Some(label) = label else {
            return self.settings.default_precision;
        };
        label.parse::<Precision>().unwrap_or_else(|e| {
            warn!("{}, using {}", e, self.settings.default_precision);
            self.settings.default_precision
        })
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerSettings::default())
    }
}
