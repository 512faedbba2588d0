use std::env;

use chess_core::UploadPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub host: String,
    pub port: u16,
    /// Request body limit in bytes.
    pub max_content_length: usize,
    pub allowed_filetypes: Vec<String>,
    pub registration_enabled: bool,
    pub create_first_user_as_admin: bool,
    /// Board diagram edge length in pixels.
    pub board_size: u32,
    /// View sessions idle for longer than this are purged.
    pub session_ttl_hours: i32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET_KEY")
                .unwrap_or_else(|_| "dev-secret-key-change-in-production".to_string()),
            jwt_expire_hours: env::var("JWT_EXPIRE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(168), // 7 days
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            max_content_length: env::var("MAX_CONTENT_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(16_000_000),
            allowed_filetypes: env::var("ALLOWED_FILETYPES")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| vec!["pgn".to_string(), "txt".to_string()]),
            registration_enabled: env_flag("REGISTRATION_ENABLED", false),
            create_first_user_as_admin: env_flag("CREATE_FIRST_USER_AS_ADMIN", true),
            board_size: env::var("BOARD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(350),
            session_ttl_hours: env::var("VIEW_SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|hours: &i32| *hours > 0)
                .unwrap_or(24),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(&self.allowed_filetypes)
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_flag(&v))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
