use anyhow::Context;
use time::UtcOffset;

/// Verification parameters for identity-provider session tokens.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub gemini: GeminiConfig,
    /// Offset that defines the local calendar day for diet log filtering.
    pub local_offset: UtcOffset,
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "nutrilog".into()),
            audience: std::env::var("SESSION_AUDIENCE").unwrap_or_else(|_| "nutrilog-users".into()),
        };
        let gemini = GeminiConfig {
            api_key: std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
        };
        let local_offset = match std::env::var("LOCAL_UTC_OFFSET") {
            Ok(raw) => parse_utc_offset(&raw)
                .with_context(|| format!("invalid LOCAL_UTC_OFFSET {raw:?}"))?,
            Err(_) => UtcOffset::UTC,
        };
        Ok(Self {
            database_url,
            session,
            gemini,
            local_offset,
        })
    }
}

/// Parses `Z`, `+HH:MM` or `-HH:MM`.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<UtcOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        anyhow::bail!("offset must start with + or -");
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i8 = hours.parse().context("offset hours")?;
    let minutes: i8 = minutes.parse().context("offset minutes")?;
    Ok(UtcOffset::from_hms(sign * hours, sign * minutes, 0)?)
}
