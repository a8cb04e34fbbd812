/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "perfdash=info,perfdash_cli=info,perfdash_core=info";

/// Output format for log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be one of true/false/1/0, got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("PERFDASH_LOG_FORMAT must be 'text' or 'json', got '{0}'")]
    InvalidLogFormat(String),
}

/// Tool configuration loaded from environment variables.
///
/// All fields have defaults suitable for interactive use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Reject nested sections instead of moving on a best-effort basis.
    pub strict: bool,
    /// Pretty-print JSON output (default: `true`).
    pub pretty: bool,
    pub log_format: LogFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            strict: false,
            pretty: true,
            log_format: LogFormat::Text,
        }
    }
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `PERFDASH_STRICT`     | `false` |
    /// | `PERFDASH_PRETTY`     | `true`  |
    /// | `PERFDASH_LOG_FORMAT` | `text`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let strict = match lookup("PERFDASH_STRICT") {
            Some(value) => parse_bool("PERFDASH_STRICT", &value)?,
            None => defaults.strict,
        };

        let pretty = match lookup("PERFDASH_PRETTY") {
            Some(value) => parse_bool("PERFDASH_PRETTY", &value)?,
            None => defaults.pretty,
        };

        let log_format = match lookup("PERFDASH_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            strict,
            pretty,
            log_format,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
