use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `content-client`.
pub enum ContentClientError {
    /// Upstream API недоступен: сетевая ошибка или не-2xx ответ.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Документ бэкенда не удалось привести к внутренней модели.
    #[error("malformed {kind} document: {reason}")]
    MalformedDocument {
        /// Вид документа (`post`, `podcast`, `category`, `response`, ...).
        kind: &'static str,
        /// Причина отказа.
        reason: String,
    },

    /// Запрошенный ресурс не найден.
    #[error("not found: {0}")]
    NotFound(String),

    /// Некорректные аргументы запроса.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ошибка построения HTTP-клиента (`reqwest`).
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ValidationErrors> for ContentClientError {
    fn from(err: ValidationErrors) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Результат операций `content-client`.
pub type ContentClientResult<T> = Result<T, ContentClientError>;

impl ContentClientError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("http status {status}"));
        match status {
            reqwest::StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::UpstreamUnavailable(message),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::malformed("response", err.to_string());
        }
        Self::UpstreamUnavailable(err.to_string())
    }

    /// `true`, если ошибка вызвана недоступностью upstream API.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}
