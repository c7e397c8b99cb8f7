use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Вид контента.
pub enum ContentKind {
    /// Текстовая статья.
    Post,
    /// Эпизод подкаста.
    Podcast,
    /// Видео.
    Video,
}

impl ContentKind {
    /// Путь коллекции в upstream API.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::Post => "/blog",
            Self::Podcast => "/podcasts",
            Self::Video => "/videos",
        }
    }

    /// Короткое имя для логов и ошибок.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Podcast => "podcast",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Автор публикации.
pub struct Author {
    /// Идентификатор автора, если бэкенд его прислал.
    pub id: Option<String>,
    /// Отображаемое имя (`"Admin"`, если автор неизвестен).
    pub name: String,
    /// Email.
    pub email: Option<String>,
    /// URL аватара.
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Категория контента.
///
/// `slug` производный от названия и служит только для отображения: две
/// категории с похожими названиями получают одинаковый slug.
pub struct Category {
    /// Идентификатор категории.
    pub id: String,
    /// Название.
    pub name: String,
    /// Производный slug.
    pub slug: String,
    /// Описание.
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Специфичная для вида часть публикации.
pub enum ContentMedia {
    /// Текст статьи.
    Text {
        /// Тело статьи (HTML/markdown как есть).
        body: String,
        /// Оценка времени чтения в минутах.
        read_time: u32,
        /// Дополнительные изображения.
        additional_images: Vec<String>,
    },
    /// Аудиозапись подкаста.
    Audio {
        /// Абсолютный URL для стриминга.
        url: Option<String>,
        /// Длительность в секундах.
        duration_secs: Option<u32>,
    },
    /// Видеоролик.
    Video {
        /// URL видео (обычно YouTube).
        url: Option<String>,
        /// Превью.
        thumbnail_url: Option<String>,
        /// Длительность в секундах.
        duration_secs: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Нормализованная публикация: статья, подкаст или видео.
pub struct ContentItem {
    /// Идентификатор, назначенный бэкендом.
    pub id: String,
    /// Производный slug (не уникален).
    pub slug: String,
    /// Заголовок.
    pub title: String,
    /// Краткое описание.
    pub excerpt: String,
    /// Автор.
    pub author: Author,
    /// Идентификатор категории, даже если бэкенд не раскрыл её целиком.
    pub category_id: Option<String>,
    /// Категория, если бэкенд прислал её объектом.
    pub category: Option<Category>,
    /// Баннер.
    pub banner_image: Option<String>,
    /// Отмечена ли публикация как избранная.
    pub featured: bool,
    /// Дата публикации (ISO-строка без валидации).
    pub published_at: String,
    /// Дата обновления (ISO-строка без валидации).
    pub updated_at: String,
    /// Вид-специфичные данные.
    pub media: ContentMedia,
}

impl ContentItem {
    /// Вид публикации.
    pub fn kind(&self) -> ContentKind {
        match self.media {
            ContentMedia::Text { .. } => ContentKind::Post,
            ContentMedia::Audio { .. } => ContentKind::Podcast,
            ContentMedia::Video { .. } => ContentKind::Video,
        }
    }

    /// Время чтения, только для текстовых публикаций.
    pub fn read_time(&self) -> Option<u32> {
        match self.media {
            ContentMedia::Text { read_time, .. } => Some(read_time),
            _ => None,
        }
    }

    /// Дата публикации, если строка разбирается как RFC 3339.
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Страница коллекции с метаданными пагинации.
pub struct Page<T> {
    /// Элементы страницы (не больше `limit`).
    pub data: Vec<T>,
    /// Номер страницы, начиная с 1.
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Общее количество элементов.
    pub total: u64,
    /// Общее количество страниц.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Есть ли страница после текущей.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Есть ли страница перед текущей.
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
/// Сообщение из формы обратной связи.
pub struct ContactMessage {
    /// Имя отправителя.
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Email отправителя.
    #[validate(email)]
    pub email: String,
    /// Тема.
    #[validate(length(min = 1, max = 255))]
    pub subject: String,
    /// Текст сообщения.
    #[validate(length(min = 1))]
    pub message: String,
}

impl ContactMessage {
    /// Копия без пробелов по краям полей.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}
