use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

/// Базовый URL API, если `CONTENT_API_BASE_URL` не задан.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:4000/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Что делать с документом, который не прошёл нормализацию внутри пачки.
pub enum MalformedPolicy {
    /// Пропустить документ и записать предупреждение в лог.
    #[default]
    Skip,
    /// Прервать всю операцию с ошибкой `MalformedDocument`.
    Abort,
}

impl FromStr for MalformedPolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "abort" => Ok(Self::Abort),
            other => Err(anyhow!("unknown malformed policy '{other}', expecting skip|abort")),
        }
    }
}

#[derive(Debug, Clone)]
/// Настройки клиента контента.
pub struct ClientSettings {
    /// Базовый URL upstream API, например `http://localhost:4000/api`.
    pub api_base_url: String,
    /// Таймаут установки соединения, секунды.
    pub connect_timeout_secs: u64,
    /// Общий таймаут запроса, секунды.
    pub request_timeout_secs: u64,
    /// Размер страницы, которую просматривает поиск по slug.
    pub slug_scan_limit: u32,
    /// Размер выборки, из которой подбирается связанный контент.
    pub related_window: u32,
    /// Политика для битых документов в списках.
    pub malformed_policy: MalformedPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
            slug_scan_limit: 100,
            related_window: 50,
            malformed_policy: MalformedPolicy::Skip,
        }
    }
}

impl ClientSettings {
    /// Настройки по умолчанию с другим базовым URL.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Читает настройки из переменных окружения.
    ///
    /// `.env` сюда не подгружается: это делает вызывающая сторона.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = match lookup("CONTENT_API_BASE_URL") {
            Some(raw) => {
                let value = raw.trim().to_string();
                if value.is_empty() {
                    return Err(anyhow!("CONTENT_API_BASE_URL must not be empty"));
                }
                value
            }
            None => defaults.api_base_url,
        };

        let connect_timeout_secs = parse_positive(
            &lookup,
            "CONTENT_CONNECT_TIMEOUT_SECS",
            defaults.connect_timeout_secs,
        )?;
        let request_timeout_secs = parse_positive(
            &lookup,
            "CONTENT_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?;
        let slug_scan_limit =
            parse_positive(&lookup, "CONTENT_SLUG_SCAN_LIMIT", defaults.slug_scan_limit)?;
        let related_window =
            parse_positive(&lookup, "CONTENT_RELATED_WINDOW", defaults.related_window)?;
        let malformed_policy = match lookup("CONTENT_MALFORMED_POLICY") {
            Some(raw) => raw
                .parse::<MalformedPolicy>()
                .context("Failed to parse CONTENT_MALFORMED_POLICY")?,
            None => defaults.malformed_policy,
        };

        Ok(Self {
            api_base_url,
            connect_timeout_secs,
            request_timeout_secs,
            slug_scan_limit,
            related_window,
            malformed_policy,
        })
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + PartialEq + Default,
{
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == T::default() {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
