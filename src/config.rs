use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WitConfig {
    pub token: String,
    pub api_url: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub wit: WitConfig,
    pub twilio: TwilioConfig,
    /// Detected intents below this confidence are treated as unrecognized.
    pub intent_confidence_threshold: f64,
    /// Upper bound on a single outbound reply, in characters.
    pub reply_budget: usize,
    /// HH:MM at which the daily greeting job runs.
    pub greeting_time: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let wit = WitConfig {
            token: std::env::var("WIT_AI_SERVER_ACCESS_TOKEN")?,
            api_url: std::env::var("WIT_AI_API_URL")
                .unwrap_or_else(|_| "https://api.wit.ai/message".into()),
            api_version: std::env::var("WIT_AI_API_VERSION").unwrap_or_else(|_| "20240501".into()),
        };
        let twilio = TwilioConfig {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID")?,
            auth_token: std::env::var("TWILIO_AUTH_TOKEN")?,
            from_number: std::env::var("TWILIO_WHATSAPP_NUMBER")?,
        };
        Ok(Self {
            database_url,
            wit,
            twilio,
            intent_confidence_threshold: std::env::var("INTENT_CONFIDENCE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(0.7),
            reply_budget: std::env::var("REPLY_BUDGET_CHARS")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1500),
            greeting_time: std::env::var("GREETING_TIME").unwrap_or_else(|_| "08:00".into()),
        })
    }
}
