//! Server configuration from command line flags, with environment fallbacks.

use bridgebid_protocol::generate_room_code;
use clap::Parser;

use crate::error::ConfigError;

/// Code of the lobby when none is configured.
pub const DEFAULT_ROOM_CODE: &str = "ABCD";
const MAX_ROOM_CODE_LEN: usize = 16;

#[derive(Debug, Clone, Parser)]
#[command(name = "bridgebid-server")]
#[command(about = "Bridge bidding lobby server")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "BRIDGEBID_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the websocket and HTTP listener
    #[arg(short, long, env = "PORT", default_value_t = 9001)]
    pub port: u16,

    /// Fixed lobby code players must present to join
    #[arg(long, env = "BRIDGEBID_ROOM_CODE", default_value = DEFAULT_ROOM_CODE)]
    pub room_code: String,

    /// Generate a random 4-character lobby code instead of --room-code
    #[arg(long, default_value_t = false)]
    pub random_code: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 9001,
            room_code: DEFAULT_ROOM_CODE.to_string(),
            random_code: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configured code, or rolls a fresh one with `--random-code`.
    pub fn resolve_room_code(&self) -> Result<String, ConfigError> {
        if self.random_code {
            return Ok(generate_room_code());
        }

        let code = self.room_code.trim();
        if code.is_empty() {
            return Err(ConfigError::InvalidRoomCode {
                code: self.room_code.clone(),
                reason: "must not be empty",
            });
        }
        if code.len() > MAX_ROOM_CODE_LEN {
            return Err(ConfigError::InvalidRoomCode {
                code: self.room_code.clone(),
                reason: "must be at most 16 characters",
            });
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidRoomCode {
                code: self.room_code.clone(),
                reason: "must be ASCII letters and digits",
            });
        }
        Ok(code.to_string())
    }
}
