use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WellspringConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub chatbot: ChatbotConfig,
    #[serde(default)]
    pub roi: RoiDefaults,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated list, or `*` for any origin.
    pub cors_origins: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            cors_origins: "*".to_string(),
        }
    }
}

impl HttpConfig {
    /// Parsed origin list; empty when any origin is allowed.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_seconds: u64,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://integrations.emergentagent.com/llm".to_string(),
            model: "anthropic/claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_seconds: 30,
            api_key_env: "LLM_API_KEY".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of most recent turns kept per session and sent upstream.
    pub history_window: usize,
    pub max_sessions: usize,
    /// 0 disables idle expiry.
    pub idle_ttl_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            max_sessions: 10_000,
            idle_ttl_minutes: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatbotConfig {
    pub welcome_message: String,
    pub quick_questions: Vec<String>,
    pub enabled: bool,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            welcome_message: "Hi! I'm the WSSC Water AI Assistant. How can I help you today?"
                .to_string(),
            quick_questions: vec![
                "Why is my bill so high?".to_string(),
                "I need help paying my bill".to_string(),
                "I think I have a leak".to_string(),
                "I have no water or low pressure".to_string(),
                "Start or stop my service".to_string(),
                "My water tastes or smells strange".to_string(),
            ],
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RoiDefaults {
    pub monthly_call_volume: f64,
    pub avg_cost_per_call: f64,
    pub annual_paper_bill_volume: f64,
    pub cost_per_paper_bill: f64,
}

impl Default for RoiDefaults {
    fn default() -> Self {
        Self {
            monthly_call_volume: 50_000.0,
            avg_cost_per_call: 12.0,
            annual_paper_bill_volume: 900_000.0,
            cost_per_paper_bill: 1.0,
        }
    }
}

impl WellspringConfig {
    /// Load from a TOML file (optional) layered under `WELLSPRING__*` env vars.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("WELLSPRING").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
