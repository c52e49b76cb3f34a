use mart_core::access::{AccessGate, GatePaths, PolicyEntry, RoutePolicy};
use mart_core::error::AppError;
use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub access: AccessSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_session_inactivity_minutes")]
    pub session_inactivity_minutes: i64,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_session_inactivity_minutes() -> i64 {
    24 * 60
}

fn default_static_dir() -> String {
    "mart-admin/static".to_string()
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the NEXT MART backend API (e.g. http://backend:8080).
    pub url: String,
    #[serde(default = "default_backend_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_backend_timeout_seconds() -> u64 {
    10
}

#[derive(Deserialize, Clone)]
pub struct AuthSettings {
    /// HS256 secret the backend signs session tokens with.
    pub jwt_secret: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct AccessSettings {
    #[serde(default)]
    pub paths: GatePaths,
    #[serde(default = "default_policy")]
    pub policy: Vec<PolicyEntry>,
}

fn default_policy() -> Vec<PolicyEntry> {
    RoutePolicy::default().entries().to_vec()
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            paths: GatePaths::default(),
            policy: default_policy(),
        }
    }
}

impl AccessSettings {
    /// Validate the policy table and redirect paths into a gate.
    pub fn build_gate(&self) -> Result<AccessGate, AppError> {
        let policy = RoutePolicy::new(self.policy.clone())?;
        Ok(AccessGate::new(policy, self.paths.clone())?)
    }
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC collector. Span export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Run from the workspace root or from inside mart-admin
    let configuration_directory = if base_path.ends_with("mart-admin") {
        base_path.join("config")
    } else {
        base_path.join("mart-admin").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
