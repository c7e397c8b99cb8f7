use async_trait::async_trait;
use serde_json::Value;

use crate::error::ContentClientResult;
use crate::models::{ContactMessage, ContentKind};
use crate::raw::RawListing;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Параметры запроса списка.
pub struct ListingQuery {
    /// Номер страницы, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Ключ категории, который понимает бэкенд.
    pub category: Option<String>,
}

impl ListingQuery {
    /// Страница без фильтра по категории.
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            category: None,
        }
    }
}

/// Транспорт к upstream API.
///
/// Возвращает документы как есть (`serde_json::Value`), нормализация
/// выполняется выше. Ошибки транспорта и не-2xx ответы приходят как
/// `UpstreamUnavailable`, 404 как `NotFound`.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    /// Страница коллекции.
    async fn list(
        &self,
        kind: ContentKind,
        query: &ListingQuery,
    ) -> ContentClientResult<RawListing>;

    /// Один документ по идентификатору.
    async fn get(&self, kind: ContentKind, id: &str) -> ContentClientResult<Value>;

    /// Избранные документы.
    async fn featured(&self, kind: ContentKind, limit: u32) -> ContentClientResult<Vec<Value>>;

    /// Полнотекстовый поиск.
    async fn search(&self, kind: ContentKind, query: &str) -> ContentClientResult<Vec<Value>>;

    /// Список категорий.
    async fn categories(&self) -> ContentClientResult<Vec<Value>>;

    /// Отправка формы обратной связи.
    async fn submit_contact(&self, message: &ContactMessage) -> ContentClientResult<()>;

    /// Подписка на рассылку.
    async fn subscribe_newsletter(&self, email: &str) -> ContentClientResult<()>;
}
