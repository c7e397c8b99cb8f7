//! Документы бэкенда в том виде, в каком их присылает API.
//!
//! Все поля опциональны: обязательность проверяет нормализатор, чтобы
//! отсутствующий `_id`/`title` давал `MalformedDocument`, а не ошибку serde.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ContentClientError, ContentClientResult};
use crate::models::ContentKind;

#[derive(Debug, Clone, Default, Deserialize)]
/// Автор в виде объекта.
pub struct RawAuthor {
    /// `_id`.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Имя.
    pub firstname: Option<String>,
    /// Фамилия.
    pub lastname: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// URL аватара.
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
/// Поле `author`: объект, голый идентификатор или что-то непонятное.
pub enum RawAuthorRef {
    /// Заполненный объект.
    Populated(RawAuthor),
    /// Только идентификатор.
    Id(String),
    /// Неизвестная форма.
    Other(Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Категория бэкенда.
pub struct RawCategory {
    /// `_id`.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Название категории.
    pub category_name: Option<String>,
    /// Описание (новое имя поля).
    pub category_description: Option<String>,
    /// Описание.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
/// Поле `category_id`: заполненный объект или голый идентификатор.
pub enum RawCategoryRef {
    /// Заполненный объект.
    Populated(RawCategory),
    /// Только идентификатор.
    Id(String),
    /// Неизвестная форма.
    Other(Value),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Поля, общие для всех видов публикаций.
pub struct RawCommon {
    /// `_id`.
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Заголовок.
    pub title: Option<String>,
    /// Описание.
    pub description: Option<String>,
    /// Баннер.
    #[serde(rename = "banner_image")]
    pub banner_image: Option<String>,
    /// Категория.
    #[serde(rename = "category_id")]
    pub category: Option<RawCategoryRef>,
    /// Автор.
    pub author: Option<RawAuthorRef>,
    /// `PUBLISHED` или `DRAFT`.
    pub status: Option<String>,
    /// Мягкое удаление.
    #[serde(rename = "is_deleted")]
    pub is_deleted: Option<bool>,
    /// Признак избранного.
    pub featured: Option<bool>,
    /// `createdAt`.
    pub created_at: Option<String>,
    /// `updatedAt`.
    pub updated_at: Option<String>,
}

impl RawCommon {
    /// Опубликован ли документ (не удалён и не черновик).
    pub fn is_visible(&self) -> bool {
        let deleted = self.is_deleted.unwrap_or(false);
        let draft = self
            .status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("draft"));
        !deleted && !draft
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Статья блога.
pub struct RawPost {
    /// Общие поля.
    #[serde(flatten)]
    pub common: RawCommon,
    /// Тело статьи.
    pub content: Option<String>,
    /// Дополнительные изображения.
    pub additional_images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Эпизод подкаста.
pub struct RawPodcast {
    /// Общие поля.
    #[serde(flatten)]
    pub common: RawCommon,
    /// Путь к аудиофайлу.
    pub audio_file: Option<String>,
    /// Длительность в секундах.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Видео.
pub struct RawVideo {
    /// Общие поля.
    #[serde(flatten)]
    pub common: RawCommon,
    /// Ссылка на YouTube.
    pub youtube_url: Option<String>,
    /// Превью.
    pub video_thumbnail: Option<String>,
    /// Длительность в секундах.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone)]
/// Документ бэкенда с явным видом.
pub enum RawDocument {
    /// Статья.
    Post(RawPost),
    /// Подкаст.
    Podcast(RawPodcast),
    /// Видео.
    Video(RawVideo),
}

impl RawDocument {
    /// Разбирает JSON-значение как документ заданного вида.
    pub fn from_value(kind: ContentKind, value: Value) -> ContentClientResult<Self> {
        let malformed =
            |err: serde_json::Error| ContentClientError::malformed(kind.as_str(), err.to_string());
        match kind {
            ContentKind::Post => serde_json::from_value(value)
                .map(Self::Post)
                .map_err(malformed),
            ContentKind::Podcast => serde_json::from_value(value)
                .map(Self::Podcast)
                .map_err(malformed),
            ContentKind::Video => serde_json::from_value(value)
                .map(Self::Video)
                .map_err(malformed),
        }
    }

    /// Общие поля документа.
    pub fn common(&self) -> &RawCommon {
        match self {
            Self::Post(doc) => &doc.common,
            Self::Podcast(doc) => &doc.common,
            Self::Video(doc) => &doc.common,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Метаданные пагинации бэкенда.
pub struct RawPagination {
    /// Номер страницы.
    pub page: Option<u32>,
    /// Размер страницы.
    pub limit: Option<u32>,
    /// `totalPages`.
    pub total_pages: Option<u32>,
    /// `totalCount`.
    pub total_count: Option<u64>,
    /// Некоторые эндпоинты присылают `total` вместо `totalCount`.
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default)]
/// Сырой ответ списка: документы и, если есть, пагинация.
pub struct RawListing {
    /// Документы в порядке ответа.
    pub documents: Vec<Value>,
    /// Пагинация, если бэкенд её прислал.
    pub pagination: Option<RawPagination>,
}

/// Снимает конверт `{ data: ... }`, если он есть.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Разбирает тело ответа списка.
///
/// Поддерживаются `{data: [...]}`, `{data: {data: [...], pagination}}` и
/// голый массив.
pub fn parse_listing(body: Value) -> ContentClientResult<RawListing> {
    match unwrap_envelope(body) {
        Value::Array(documents) => Ok(RawListing {
            documents,
            pagination: None,
        }),
        Value::Object(mut map) => {
            let documents = match map.remove("data") {
                Some(Value::Array(documents)) => documents,
                _ => {
                    return Err(ContentClientError::malformed(
                        "listing",
                        "expected an array of documents",
                    ));
                }
            };
            let pagination = match map.remove("pagination") {
                Some(Value::Null) | None => None,
                Some(raw) => Some(serde_json::from_value::<RawPagination>(raw).map_err(|err| {
                    ContentClientError::malformed("pagination", err.to_string())
                })?),
            };
            Ok(RawListing {
                documents,
                pagination,
            })
        }
        _ => Err(ContentClientError::malformed(
            "listing",
            "expected an array or a paginated object",
        )),
    }
}
