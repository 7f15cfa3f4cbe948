use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::time::Duration;

/// Default upstream listing that the content cache is refreshed from.
pub const DEFAULT_UPSTREAM_URL: &str = "https://www.reddit.com/r/memes.json?limit=26";

/// Identifying `User-Agent` sent with every upstream request. Reddit rejects
/// requests that carry a generic client agent.
pub const DEFAULT_UPSTREAM_USER_AGENT: &str = "MemeSSEDebugger/1.0";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that are allowed to receive server responses.
    /// Use `*` to allow any origin.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "*"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "0.0.0.0")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8080)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(short, long, env, default_value_t = LevelFilter::Info, value_parser = parse_level_filter)]
    pub log_level_filter: LevelFilter,

    /// The JSON listing endpoint that memes are fetched from.
    #[arg(long, env, default_value = DEFAULT_UPSTREAM_URL)]
    upstream_url: String,

    /// The User-Agent header sent with upstream requests.
    #[arg(long, env, default_value = DEFAULT_UPSTREAM_USER_AGENT)]
    upstream_user_agent: String,

    /// Timeout in seconds for a single upstream request
    #[arg(long, env, default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// Minimum number of seconds between two upstream refreshes of the meme cache
    #[arg(long, env, default_value_t = 300)]
    pub refresh_interval_secs: u64,

    /// Seconds to wait between two memes sent on the same stream
    #[arg(long, env, default_value_t = 5)]
    pub emit_interval_secs: u64,

    /// Maximum number of connection logs kept for the debug endpoint. The oldest
    /// connection is dropped once this is exceeded.
    #[arg(long, env, default_value_t = 50, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_connections: u32,
}

fn parse_level_filter(level: &str) -> Result<LevelFilter, String> {
    level.parse::<LevelFilter>().map_err(|_| {
        format!("invalid log level '{level}', expected one of OFF, ERROR, WARN, INFO, DEBUG, TRACE")
    })
}

impl Default for Config {
    /// Builds a `Config` from defaults and environment variables only, ignoring
    /// the process arguments.
    fn default() -> Self {
        Config::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("0.0.0.0")
    }

    /// The `interface:port` pair the server binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn set_upstream_url(mut self, upstream_url: String) -> Self {
        self.upstream_url = upstream_url;
        self
    }

    pub fn upstream_url(&self) -> &str {
        &self.upstream_url
    }

    pub fn upstream_user_agent(&self) -> &str {
        &self.upstream_user_agent
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn emit_interval(&self) -> Duration {
        Duration::from_secs(self.emit_interval_secs)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections as usize
    }

    /// Whether any origin may receive responses.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin.trim() == "*")
    }
}
