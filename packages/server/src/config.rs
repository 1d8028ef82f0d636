//! Command line and environment configuration.
//!
//! 値はコマンドライン引数、環境変数（`.env` を含む）、既定値の順に解決されます。

use std::time::Duration;

use clap::Parser;
use studysync_shared::logger::LogFormat;

use crate::usecase::TeardownDelays;

#[derive(Parser, Debug, Clone)]
#[command(name = "studysync-server")]
#[command(about = "Real-time study room server over WebSocket", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "STUDYSYNC_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// HMAC secret used to verify connection tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Browser origin allowed by CORS (no CORS layer when omitted)
    #[arg(long, env = "STUDYSYNC_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "STUDYSYNC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Single-line log output without colors
    #[arg(long)]
    pub log_compact: bool,

    /// Delay before the room record deletion is verified after a session ends (ms)
    #[arg(long, default_value_t = 500)]
    pub verify_delay_ms: u64,

    /// Delay before remaining subscribers are evicted after a session ends (ms)
    #[arg(long, default_value_t = 1000)]
    pub eviction_delay_ms: u64,

    /// Room to create at startup (repeatable)
    #[arg(long = "room", value_name = "NAME")]
    pub rooms: Vec<String>,
}

impl ServerConfig {
    pub fn log_format(&self) -> LogFormat {
        if self.log_compact {
            LogFormat::Compact
        } else {
            LogFormat::Full
        }
    }

    pub fn teardown_delays(&self) -> TeardownDelays {
        TeardownDelays {
            verify: Duration::from_millis(self.verify_delay_ms),
            evict: Duration::from_millis(self.eviction_delay_ms),
        }
    }
}
