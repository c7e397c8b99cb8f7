use std::cmp::Reverse;

use serde_json::Value;
use tracing::{debug, warn};
use validator::Validate;

use crate::config::{ClientSettings, MalformedPolicy};
use crate::error::{ContentClientError, ContentClientResult};
use crate::gateway::{ContentGateway, ListingQuery};
use crate::models::{Category, ContactMessage, ContentItem, ContentKind, Page};
use crate::normalizer::{Normalizer, normalize_category};
use crate::raw::{RawCategory, RawPagination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Параметры резолвера, не зависящие от транспорта.
pub struct ResolverOptions {
    /// Размер страницы, которую просматривает поиск по slug.
    pub slug_scan_limit: u32,
    /// Размер выборки для подбора связанного контента.
    pub related_window: u32,
    /// Политика для битых документов в списках.
    pub malformed_policy: MalformedPolicy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

impl From<&ClientSettings> for ResolverOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            slug_scan_limit: settings.slug_scan_limit,
            related_window: settings.related_window,
            malformed_policy: settings.malformed_policy,
        }
    }
}

/// Списки, поиск по slug, связанный и избранный контент поверх шлюза.
///
/// Все операции только читают данные; кэша нет, каждый вызов идёт в шлюз.
pub struct CollectionResolver<G: ContentGateway> {
    gateway: G,
    normalizer: Normalizer,
    options: ResolverOptions,
}

impl<G: ContentGateway> CollectionResolver<G> {
    /// Создаёт резолвер.
    pub fn new(gateway: G, normalizer: Normalizer, options: ResolverOptions) -> Self {
        Self {
            gateway,
            normalizer,
            options,
        }
    }

    /// Шлюз, через который идут запросы.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Страница коллекции с необязательным фильтром по категории.
    ///
    /// Ошибки шлюза пробрасываются вызывающему без повторов.
    pub async fn list(
        &self,
        kind: ContentKind,
        page: u32,
        limit: u32,
        category: Option<&str>,
    ) -> ContentClientResult<Page<ContentItem>> {
        if page == 0 {
            return Err(ContentClientError::InvalidRequest(
                "page must be >= 1".to_string(),
            ));
        }
        if limit == 0 {
            return Err(ContentClientError::InvalidRequest(
                "limit must be > 0".to_string(),
            ));
        }

        let query = ListingQuery {
            page,
            limit,
            category: category
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
        };
        let listing = self.gateway.list(kind, &query).await?;
        let returned = listing.documents.len();
        let mut data = self.normalize_batch(kind, listing.documents)?;

        let pagination = listing.pagination.unwrap_or_default();
        let limit = pagination.limit.filter(|value| *value > 0).unwrap_or(limit);
        data.truncate(limit as usize);

        let total = pagination
            .total_count
            .or(pagination.total)
            .unwrap_or_else(|| (u64::from(page) - 1) * u64::from(limit) + returned as u64);

        Ok(Page {
            data,
            page: pagination.page.filter(|value| *value > 0).unwrap_or(page),
            limit,
            total,
            total_pages: total_pages(&pagination, total, limit),
        })
    }

    /// Публикация по идентификатору.
    pub async fn get_by_id(&self, kind: ContentKind, id: &str) -> ContentClientResult<ContentItem> {
        let value = self.gateway.get(kind, id).await?;
        self.normalizer.normalize_value(kind, value)
    }

    /// Публикация по производному slug'у.
    ///
    /// Бэкенд не индексирует slug'и, поэтому просматривается первая страница
    /// размером `slug_scan_limit`. Публикации за её пределами не находятся,
    /// а при совпадении slug'ов побеждает первая в порядке выдачи бэкенда,
    /// который не гарантирован стабильным.
    pub async fn find_by_slug(
        &self,
        kind: ContentKind,
        slug: &str,
    ) -> ContentClientResult<ContentItem> {
        let slug = slug.trim();
        let listing = self
            .gateway
            .list(kind, &ListingQuery::page(1, self.options.slug_scan_limit))
            .await?;
        let scanned = listing.documents.len();

        self.normalize_batch(kind, listing.documents)?
            .into_iter()
            .find(|item| item.slug == slug)
            .ok_or_else(|| {
                debug!(kind = kind.as_str(), slug, scanned, "slug not found in scan window");
                ContentClientError::NotFound(format!("{} slug: {slug}", kind.as_str()))
            })
    }

    /// Связанные публикации: той же категории, без исходной, не больше `limit`.
    ///
    /// Если у исходной публикации нет категории, возвращаются самые свежие.
    /// Любая ошибка превращается в пустой список: связанный контент
    /// необязателен для страницы.
    pub async fn related(&self, kind: ContentKind, id: &str, limit: u32) -> Vec<ContentItem> {
        match self.try_related(kind, id, limit).await {
            Ok(items) => items,
            Err(err) => {
                warn!(kind = kind.as_str(), id, error = %err, "related lookup failed");
                Vec::new()
            }
        }
    }

    async fn try_related(
        &self,
        kind: ContentKind,
        id: &str,
        limit: u32,
    ) -> ContentClientResult<Vec<ContentItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let source = self.get_by_id(kind, id).await?;
        let listing = self
            .gateway
            .list(kind, &ListingQuery::page(1, self.options.related_window))
            .await?;
        // Битый сосед не должен ломать подборку.
        let candidates =
            self.normalizer
                .normalize_batch(kind, listing.documents, MalformedPolicy::Skip)?;

        let mut related: Vec<ContentItem> = candidates
            .into_iter()
            .filter(|item| item.id != source.id)
            .collect();

        match source.category_id.as_deref() {
            Some(category_id) => {
                related.retain(|item| item.category_id.as_deref() == Some(category_id));
            }
            None => {
                related.sort_by_key(|item| Reverse(item.published_at_utc()));
            }
        }

        related.truncate(limit as usize);
        Ok(related)
    }

    /// Избранные публикации, без фильтрации на клиенте.
    pub async fn featured(
        &self,
        kind: ContentKind,
        limit: u32,
    ) -> ContentClientResult<Vec<ContentItem>> {
        let documents = self.gateway.featured(kind, limit).await?;
        self.normalize_batch(kind, documents)
    }

    /// Поиск по тексту. Пустой запрос даёт пустой список без обращения к API.
    pub async fn search(
        &self,
        kind: ContentKind,
        query: &str,
    ) -> ContentClientResult<Vec<ContentItem>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let documents = self.gateway.search(kind, query).await?;
        self.normalize_batch(kind, documents)
    }

    /// Все категории.
    pub async fn categories(&self) -> ContentClientResult<Vec<Category>> {
        let documents = self.gateway.categories().await?;
        let mut categories = Vec::with_capacity(documents.len());
        for value in documents {
            let result = serde_json::from_value::<RawCategory>(value)
                .map_err(|err| ContentClientError::malformed("category", err.to_string()))
                .and_then(normalize_category);
            match result {
                Ok(category) => categories.push(category),
                Err(err) => match self.options.malformed_policy {
                    MalformedPolicy::Abort => return Err(err),
                    MalformedPolicy::Skip => {
                        warn!(error = %err, "skipping malformed category");
                    }
                },
            }
        }
        Ok(categories)
    }

    /// Категория по производному slug'у; первая совпавшая в порядке выдачи.
    pub async fn find_category(&self, slug: &str) -> ContentClientResult<Category> {
        let slug = slug.trim();
        self.categories()
            .await?
            .into_iter()
            .find(|category| category.slug == slug)
            .ok_or_else(|| ContentClientError::NotFound(format!("category slug: {slug}")))
    }

    /// Отправляет форму обратной связи. Повторов нет.
    pub async fn submit_contact(&self, message: &ContactMessage) -> ContentClientResult<()> {
        let message = message.trimmed();
        message.validate()?;
        self.gateway.submit_contact(&message).await
    }

    /// Подписывает email на рассылку.
    pub async fn subscribe_newsletter(&self, email: &str) -> ContentClientResult<()> {
        let request = NewsletterRequest {
            email: email.trim().to_string(),
        };
        request.validate()?;
        self.gateway.subscribe_newsletter(&request.email).await
    }

    fn normalize_batch(
        &self,
        kind: ContentKind,
        documents: Vec<Value>,
    ) -> ContentClientResult<Vec<ContentItem>> {
        self.normalizer
            .normalize_batch(kind, documents, self.options.malformed_policy)
    }
}

fn total_pages(pagination: &RawPagination, total: u64, limit: u32) -> u32 {
    if let Some(pages) = pagination.total_pages.filter(|value| *value > 0) {
        return pages;
    }
    let pages = total.div_ceil(u64::from(limit));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

#[derive(Debug, Validate)]
struct NewsletterRequest {
    #[validate(email)]
    email: String,
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::raw::RawListing;

    #[derive(Clone, Default)]
    struct FakeGateway {
        listing: Arc<Mutex<Vec<Value>>>,
        pagination: Arc<Mutex<Option<RawPagination>>>,
        single: Arc<Mutex<Option<Value>>>,
        categories: Arc<Mutex<Vec<Value>>>,
        fail_list: Arc<Mutex<bool>>,
        list_calls: Arc<Mutex<Vec<ListingQuery>>>,
        search_calls: Arc<Mutex<Vec<String>>>,
        contact_calls: Arc<Mutex<Vec<ContactMessage>>>,
    }

    impl FakeGateway {
        fn with_listing(documents: Vec<Value>) -> Self {
            let fake = Self::default();
            *fake.listing.lock().expect("listing mutex poisoned") = documents;
            fake
        }

        fn set_single(&self, value: Value) {
            *self.single.lock().expect("single mutex poisoned") = Some(value);
        }
    }

    #[async_trait]
    impl ContentGateway for FakeGateway {
        async fn list(
            &self,
            _kind: ContentKind,
            query: &ListingQuery,
        ) -> ContentClientResult<RawListing> {
            self.list_calls
                .lock()
                .expect("list_calls mutex poisoned")
                .push(query.clone());
            if *self.fail_list.lock().expect("fail_list mutex poisoned") {
                return Err(ContentClientError::UpstreamUnavailable(
                    "connection refused".to_string(),
                ));
            }
            Ok(RawListing {
                documents: self.listing.lock().expect("listing mutex poisoned").clone(),
                pagination: *self.pagination.lock().expect("pagination mutex poisoned"),
            })
        }

        async fn get(&self, kind: ContentKind, id: &str) -> ContentClientResult<Value> {
            self.single
                .lock()
                .expect("single mutex poisoned")
                .clone()
                .ok_or_else(|| ContentClientError::NotFound(format!("{} id: {id}", kind.as_str())))
        }

        async fn featured(
            &self,
            _kind: ContentKind,
            limit: u32,
        ) -> ContentClientResult<Vec<Value>> {
            let documents = self.listing.lock().expect("listing mutex poisoned").clone();
            Ok(documents.into_iter().take(limit as usize).collect())
        }

        async fn search(&self, _kind: ContentKind, query: &str) -> ContentClientResult<Vec<Value>> {
            self.search_calls
                .lock()
                .expect("search_calls mutex poisoned")
                .push(query.to_string());
            Ok(self.listing.lock().expect("listing mutex poisoned").clone())
        }

        async fn categories(&self) -> ContentClientResult<Vec<Value>> {
            Ok(self
                .categories
                .lock()
                .expect("categories mutex poisoned")
                .clone())
        }

        async fn submit_contact(&self, message: &ContactMessage) -> ContentClientResult<()> {
            self.contact_calls
                .lock()
                .expect("contact_calls mutex poisoned")
                .push(message.clone());
            Ok(())
        }

        async fn subscribe_newsletter(&self, _email: &str) -> ContentClientResult<()> {
            Ok(())
        }
    }

    fn resolver(gateway: FakeGateway) -> CollectionResolver<FakeGateway> {
        CollectionResolver::new(
            gateway,
            Normalizer::new("http://localhost:4000/api"),
            ResolverOptions::default(),
        )
    }

    fn post(id: &str, title: &str, category: Option<&str>, created_at: &str) -> Value {
        let mut doc = json!({"_id": id, "title": title, "createdAt": created_at});
        if let Some(category) = category {
            doc["category_id"] = json!({"_id": category, "category_name": category});
        }
        doc
    }

    #[tokio::test]
    async fn list_computes_total_pages_from_total_count() {
        let documents = (0..2)
            .map(|i| post(&format!("p{i}"), &format!("Post {i}"), None, "2024-01-01T00:00:00Z"))
            .collect();
        let gateway = FakeGateway::with_listing(documents);
        *gateway.pagination.lock().expect("pagination mutex poisoned") = Some(RawPagination {
            page: Some(2),
            limit: Some(9),
            total_count: Some(20),
            ..Default::default()
        });

        let page = resolver(gateway.clone())
            .list(ContentKind::Post, 2, 9, Some("tech"))
            .await
            .expect("list must succeed");

        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 9);
        assert_eq!(page.total, 20);
        assert_eq!(page.total_pages, 3);
        assert!(!page.data.is_empty());

        let calls = gateway.list_calls.lock().expect("list_calls mutex poisoned");
        assert_eq!(calls[0].category.as_deref(), Some("tech"));
    }

    #[tokio::test]
    async fn list_never_returns_more_than_limit() {
        let documents = (0..5)
            .map(|i| post(&format!("p{i}"), &format!("Post {i}"), None, "2024-01-01T00:00:00Z"))
            .collect();
        let gateway = FakeGateway::with_listing(documents);

        let page = resolver(gateway)
            .list(ContentKind::Post, 1, 3, None)
            .await
            .expect("list must succeed");

        assert_eq!(page.data.len(), 3);
        assert!(page.page >= 1 && page.page <= page.total_pages);
    }

    #[tokio::test]
    async fn list_rejects_zero_page_and_limit() {
        let resolver = resolver(FakeGateway::default());
        assert!(matches!(
            resolver.list(ContentKind::Post, 0, 10, None).await,
            Err(ContentClientError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolver.list(ContentKind::Post, 1, 0, None).await,
            Err(ContentClientError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn list_propagates_upstream_errors() {
        let gateway = FakeGateway::default();
        *gateway.fail_list.lock().expect("fail_list mutex poisoned") = true;

        let err = resolver(gateway)
            .list(ContentKind::Podcast, 1, 10, None)
            .await
            .expect_err("upstream failure must propagate");
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn find_by_slug_returns_first_match_in_listing_order() {
        let gateway = FakeGateway::with_listing(vec![
            post("p1", "Other", None, ""),
            post("p2", "Hello World!", None, ""),
            post("p3", "hello world", None, ""),
        ]);

        let item = resolver(gateway.clone())
            .find_by_slug(ContentKind::Post, "hello-world")
            .await
            .expect("slug must be found");
        assert_eq!(item.id, "p2");

        let calls = gateway.list_calls.lock().expect("list_calls mutex poisoned");
        assert_eq!(calls[0], ListingQuery::page(1, 100));
    }

    #[tokio::test]
    async fn find_by_slug_misses_outside_scan_window() {
        let gateway = FakeGateway::with_listing(vec![post("p1", "Other", None, "")]);
        let err = resolver(gateway)
            .find_by_slug(ContentKind::Post, "missing")
            .await
            .expect_err("slug must be missing");
        assert!(matches!(err, ContentClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn related_filters_by_category_and_excludes_source() {
        let gateway = FakeGateway::with_listing(vec![
            post("p1", "Source", Some("c1"), "2024-01-01T00:00:00Z"),
            post("p2", "Same 1", Some("c1"), "2024-01-02T00:00:00Z"),
            post("p3", "Other", Some("c2"), "2024-01-03T00:00:00Z"),
            post("p4", "Same 2", Some("c1"), "2024-01-04T00:00:00Z"),
            post("p5", "Same 3", Some("c1"), "2024-01-05T00:00:00Z"),
        ]);
        gateway.set_single(post("p1", "Source", Some("c1"), "2024-01-01T00:00:00Z"));

        let related = resolver(gateway)
            .related(ContentKind::Post, "p1", 2)
            .await;

        let ids: Vec<&str> = related.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p4"]);
    }

    #[tokio::test]
    async fn related_without_category_returns_most_recent() {
        let gateway = FakeGateway::with_listing(vec![
            post("p1", "Source", None, "2024-01-09T00:00:00Z"),
            post("p2", "Old", None, "2024-01-01T00:00:00Z"),
            post("p3", "New", Some("c2"), "2024-01-05T00:00:00Z"),
            post("p4", "Undated", None, "yesterday"),
        ]);
        gateway.set_single(post("p1", "Source", None, "2024-01-09T00:00:00Z"));

        let related = resolver(gateway)
            .related(ContentKind::Post, "p1", 5)
            .await;

        let ids: Vec<&str> = related.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["p3", "p2", "p4"]);
    }

    #[tokio::test]
    async fn related_swallows_gateway_failures() {
        let gateway = FakeGateway::default();
        gateway.set_single(post("p1", "Source", Some("c1"), ""));
        *gateway.fail_list.lock().expect("fail_list mutex poisoned") = true;

        let related = resolver(gateway.clone())
            .related(ContentKind::Post, "p1", 3)
            .await;
        assert!(related.is_empty());

        let missing_source = resolver(FakeGateway::default())
            .related(ContentKind::Post, "nope", 3)
            .await;
        assert!(missing_source.is_empty());
    }

    #[tokio::test]
    async fn featured_keeps_backend_order() {
        let gateway = FakeGateway::with_listing(vec![
            post("p2", "B", None, ""),
            post("p1", "A", None, ""),
            post("p3", "C", None, ""),
        ]);
        let featured = resolver(gateway)
            .featured(ContentKind::Post, 2)
            .await
            .expect("featured must succeed");
        let ids: Vec<&str> = featured.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn blank_search_skips_gateway() {
        let gateway = FakeGateway::with_listing(vec![post("p1", "A", None, "")]);
        let resolver = resolver(gateway.clone());

        assert!(
            resolver
                .search(ContentKind::Post, "   ")
                .await
                .expect("blank search must succeed")
                .is_empty()
        );
        let found = resolver
            .search(ContentKind::Post, " rust ")
            .await
            .expect("search must succeed");
        assert_eq!(found.len(), 1);

        let calls = gateway.search_calls.lock().expect("search_calls mutex poisoned");
        assert_eq!(*calls, vec!["rust".to_string()]);
    }

    #[tokio::test]
    async fn categories_are_normalized_and_found_by_slug() {
        let gateway = FakeGateway::default();
        *gateway.categories.lock().expect("categories mutex poisoned") = vec![
            json!({"_id": "c1", "category_name": "Web Development"}),
            json!({"category_name": "Broken"}),
            json!({"_id": "c2", "category_name": "AI", "description": "Machines"}),
        ];
        let resolver = resolver(gateway);

        let categories = resolver.categories().await.expect("categories must load");
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].description.as_deref(), Some("Machines"));

        let found = resolver
            .find_category("web-development")
            .await
            .expect("category must be found");
        assert_eq!(found.id, "c1");
        assert!(matches!(
            resolver.find_category("nope").await,
            Err(ContentClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn contact_is_validated_before_sending() {
        let gateway = FakeGateway::default();
        let resolver = resolver(gateway.clone());

        let mut message = ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Nice blog".to_string(),
        };
        resolver
            .submit_contact(&message)
            .await
            .expect("valid message must be sent");

        message.email = "not-an-email".to_string();
        assert!(matches!(
            resolver.submit_contact(&message).await,
            Err(ContentClientError::InvalidRequest(_))
        ));

        let calls = gateway.contact_calls.lock().expect("contact_calls mutex poisoned");
        assert_eq!(calls.len(), 1);
    }

    #[tokio::test]
    async fn newsletter_rejects_bad_email() {
        let resolver = resolver(FakeGateway::default());
        assert!(resolver.subscribe_newsletter("a@b.c").await.is_ok());
        assert!(resolver.subscribe_newsletter("@b.c").await.is_err());
    }

    #[tokio::test]
    async fn malformed_emails_never_reach_gateway() {
        let gateway = FakeGateway::default();
        let resolver = resolver(gateway.clone());

        for email in ["not an email@@", "ada@", "ada example.com", "ada@@example.com"] {
            assert!(
                matches!(
                    resolver.subscribe_newsletter(email).await,
                    Err(ContentClientError::InvalidRequest(_))
                ),
                "{email} must be rejected"
            );
        }

        let message = ContactMessage {
            name: "Ada".to_string(),
            email: "not an email@@".to_string(),
            subject: "Hello".to_string(),
            message: "Nice blog".to_string(),
        };
        assert!(matches!(
            resolver.submit_contact(&message).await,
            Err(ContentClientError::InvalidRequest(_))
        ));
        let calls = gateway.contact_calls.lock().expect("contact_calls mutex poisoned");
        assert!(calls.is_empty());
    }

    #[tokio::test]
    async fn contact_fields_are_trimmed_and_required() {
        let gateway = FakeGateway::default();
        let resolver = resolver(gateway.clone());

        let blank_subject = ContactMessage {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "   ".to_string(),
            message: "Nice blog".to_string(),
        };
        assert!(matches!(
            resolver.submit_contact(&blank_subject).await,
            Err(ContentClientError::InvalidRequest(_))
        ));

        let padded = ContactMessage {
            name: " Ada ".to_string(),
            email: " ada@example.com ".to_string(),
            subject: "Hello".to_string(),
            message: "Nice blog\n".to_string(),
        };
        resolver
            .submit_contact(&padded)
            .await
            .expect("padded message must be sent");

        let calls = gateway.contact_calls.lock().expect("contact_calls mutex poisoned");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "Ada");
        assert_eq!(calls[0].email, "ada@example.com");
        assert_eq!(calls[0].message, "Nice blog");
    }
}
