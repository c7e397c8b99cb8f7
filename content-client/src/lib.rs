//! Клиентская библиотека для REST API блога (статьи, подкасты, видео).
//!
//! Слои:
//! - шлюз (`ContentGateway`, HTTP-реализация на `reqwest`);
//! - нормализатор документов бэкенда в единую модель `ContentItem`;
//! - резолвер коллекций: страницы, поиск по slug, связанный и избранный контент;
//! - координатор воспроизведения, который держит играющим не больше одного аудио.
#![warn(missing_docs)]

mod carousel;
mod config;
mod error;
mod gateway;
mod http_gateway;
pub mod media;
mod models;
mod normalizer;
mod playback;
pub mod raw;
mod resolver;
pub mod slug;
pub mod text;

pub use carousel::Carousel;
pub use config::{ClientSettings, DEFAULT_API_BASE_URL, MalformedPolicy};
pub use error::{ContentClientError, ContentClientResult};
pub use gateway::{ContentGateway, ListingQuery};
pub use http_gateway::HttpGateway;
pub use models::{
    Author, Category, ContactMessage, ContentItem, ContentKind, ContentMedia, Page,
};
pub use normalizer::{FALLBACK_AUTHOR_NAME, Normalizer, normalize_category, resolve_author};
pub use playback::{AudioElement, HandleId, PlaybackCoordinator};
pub use resolver::{CollectionResolver, ResolverOptions};

/// Резолвер поверх HTTP-шлюза.
pub type ContentClient = CollectionResolver<HttpGateway>;

/// Собирает клиент по настройкам: HTTP-шлюз, нормализатор и резолвер.
pub fn connect(settings: &ClientSettings) -> ContentClientResult<ContentClient> {
    let gateway = HttpGateway::new(settings)?;
    let normalizer = Normalizer::new(settings.api_base_url.clone());
    Ok(CollectionResolver::new(
        gateway,
        normalizer,
        ResolverOptions::from(settings),
    ))
}
