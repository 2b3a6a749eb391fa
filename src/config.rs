use std::net::IpAddr;

use ipnet::IpNet;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub admin_pin: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub secure_cookies: bool,
    pub max_body_size: usize,
    pub trusted_proxies: Vec<IpNet>,
    pub ticket_validity_hours: i64,
    pub event_name: String,
    pub log_level: String,
    pub marketing: MarketingConfig,
}

#[derive(Debug, Clone, Default)]
pub struct MarketingConfig {
    pub brevo_api_key: Option<String>,
    pub brevo_list_id: i64,
    pub manychat_api_token: Option<String>,
    pub manychat_tag: String,
}

pub const DEFAULT_ADMIN_PIN: &str = "1234";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let admin_pin = env_or("ADMIN_PIN", DEFAULT_ADMIN_PIN);
        if admin_pin.is_empty() {
            return Err("ADMIN_PIN must not be empty".to_string());
        }

        let host: IpAddr = env_or("PORTARIA_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PORTARIA_HOST: {e}"))?;

        let port: u16 = env_or("PORTARIA_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PORTARIA_PORT: {e}"))?;

        let base_url = env_or("PORTARIA_BASE_URL", &format!("http://{host}:{port}"));

        let secure_cookies = matches!(
            env_or("PORTARIA_SECURE_COOKIES", "false").as_str(),
            "1" | "true" | "yes"
        );

        let max_body_size: usize = env_or("PORTARIA_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid PORTARIA_MAX_BODY_SIZE: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("PORTARIA_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid PORTARIA_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ticket_validity_hours: i64 = env_or("PORTARIA_TICKET_VALIDITY_HOURS", "12")
            .parse()
            .map_err(|e| format!("Invalid PORTARIA_TICKET_VALIDITY_HOURS: {e}"))?;
        if ticket_validity_hours <= 0 {
            return Err("PORTARIA_TICKET_VALIDITY_HOURS must be positive".to_string());
        }

        let event_name = env_or("PORTARIA_EVENT_NAME", "Reserva Solar");

        let log_level = env_or("PORTARIA_LOG_LEVEL", "info");

        let marketing = MarketingConfig {
            brevo_api_key: env_optional("BREVO_API_KEY"),
            brevo_list_id: env_or("BREVO_LIST_ID", "2")
                .parse()
                .map_err(|e| format!("Invalid BREVO_LIST_ID: {e}"))?,
            manychat_api_token: env_optional("MANYCHAT_API_TOKEN"),
            manychat_tag: env_or("MANYCHAT_TAG", "Passante Reserva"),
        };

        Ok(Config {
            database_url,
            jwt_secret,
            admin_pin,
            host,
            port,
            base_url,
            secure_cookies,
            max_body_size,
            trusted_proxies,
            ticket_validity_hours,
            event_name,
            log_level,
            marketing,
        })
    }

    pub fn uses_default_pin(&self) -> bool {
        self.admin_pin == DEFAULT_ADMIN_PIN
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
