use serde_json::Value;
use tracing::warn;

use crate::config::MalformedPolicy;
use crate::error::{ContentClientError, ContentClientResult};
use crate::media::resolve_stream_url;
use crate::models::{Author, Category, ContentItem, ContentKind, ContentMedia};
use crate::raw::{RawAuthorRef, RawCategory, RawCategoryRef, RawCommon, RawDocument};
use crate::slug::slug_or_id;
use crate::text::{DEFAULT_EXCERPT_LEN, excerpt, read_time_minutes};

/// Имя автора, если бэкенд не прислал структурированного автора.
pub const FALLBACK_AUTHOR_NAME: &str = "Admin";

#[derive(Debug, Clone)]
/// Приводит документы бэкенда к единой модели `ContentItem`.
///
/// Преобразование чистое: нормализатор знает только базовый URL API,
/// нужный для построения ссылок на стриминг.
pub struct Normalizer {
    api_base_url: String,
}

impl Normalizer {
    /// Создаёт нормализатор для API с указанным базовым URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
        }
    }

    /// Нормализует один JSON-документ заданного вида.
    pub fn normalize_value(
        &self,
        kind: ContentKind,
        value: Value,
    ) -> ContentClientResult<ContentItem> {
        self.normalize(RawDocument::from_value(kind, value)?)
    }

    /// Нормализует типизированный документ.
    pub fn normalize(&self, doc: RawDocument) -> ContentClientResult<ContentItem> {
        let (kind, common, media) = match doc {
            RawDocument::Post(post) => {
                let body = post.content.unwrap_or_default();
                let media = ContentMedia::Text {
                    read_time: read_time_minutes(&body),
                    body,
                    additional_images: post.additional_images.unwrap_or_default(),
                };
                (ContentKind::Post, post.common, media)
            }
            RawDocument::Podcast(podcast) => {
                let media = ContentMedia::Audio {
                    url: non_blank(podcast.audio_file)
                        .map(|path| resolve_stream_url(&self.api_base_url, &path)),
                    duration_secs: duration_secs(podcast.duration),
                };
                (ContentKind::Podcast, podcast.common, media)
            }
            RawDocument::Video(video) => {
                let media = ContentMedia::Video {
                    url: non_blank(video.youtube_url),
                    thumbnail_url: non_blank(video.video_thumbnail),
                    duration_secs: duration_secs(video.duration),
                };
                (ContentKind::Video, video.common, media)
            }
        };

        build_item(kind, common, media)
    }

    /// Нормализует пачку документов из списка.
    ///
    /// Удалённые и черновые документы отбрасываются молча. Битые документы
    /// обрабатываются согласно `policy`.
    pub fn normalize_batch(
        &self,
        kind: ContentKind,
        documents: Vec<Value>,
        policy: MalformedPolicy,
    ) -> ContentClientResult<Vec<ContentItem>> {
        let mut items = Vec::with_capacity(documents.len());
        for value in documents {
            let result = RawDocument::from_value(kind, value).and_then(|doc| {
                if doc.common().is_visible() {
                    self.normalize(doc).map(Some)
                } else {
                    Ok(None)
                }
            });

            match result {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(err) => match policy {
                    MalformedPolicy::Abort => return Err(err),
                    MalformedPolicy::Skip => {
                        warn!(kind = kind.as_str(), error = %err, "skipping malformed document");
                    }
                },
            }
        }
        Ok(items)
    }
}

/// Нормализует категорию бэкенда.
pub fn normalize_category(raw: RawCategory) -> ContentClientResult<Category> {
    let id = non_blank(raw.id)
        .ok_or_else(|| ContentClientError::malformed("category", "missing _id"))?;
    let name = non_blank(raw.category_name)
        .ok_or_else(|| ContentClientError::malformed("category", "missing category_name"))?;

    let description = non_blank(raw.category_description)
        .or_else(|| non_blank(raw.description))
        .unwrap_or_else(|| format!("Explore {} articles", name.to_lowercase()));

    Ok(Category {
        slug: slug_or_id(&name, &id),
        id,
        name,
        description: Some(description),
    })
}

/// Имя автора: `firstname lastname` или `"Admin"`.
pub fn resolve_author(author: Option<RawAuthorRef>) -> Author {
    match author {
        Some(RawAuthorRef::Populated(raw)) => match non_blank(raw.firstname) {
            Some(first) => {
                let last = raw.lastname.unwrap_or_default();
                Author {
                    id: raw.id,
                    name: format!("{first} {last}").trim().to_string(),
                    email: raw.email,
                    avatar: raw.avatar,
                }
            }
            None => Author {
                id: raw.id,
                ..fallback_author()
            },
        },
        Some(RawAuthorRef::Id(id)) => Author {
            id: Some(id),
            ..fallback_author()
        },
        Some(RawAuthorRef::Other(_)) | None => fallback_author(),
    }
}

fn fallback_author() -> Author {
    Author {
        id: None,
        name: FALLBACK_AUTHOR_NAME.to_string(),
        email: None,
        avatar: None,
    }
}

fn build_item(
    kind: ContentKind,
    common: RawCommon,
    media: ContentMedia,
) -> ContentClientResult<ContentItem> {
    let id = non_blank(common.id)
        .ok_or_else(|| ContentClientError::malformed(kind.as_str(), "missing _id"))?;
    let title = non_blank(common.title)
        .ok_or_else(|| ContentClientError::malformed(kind.as_str(), "missing title"))?;

    let (category_id, category) = match common.category {
        Some(RawCategoryRef::Populated(raw)) => {
            let raw_id = non_blank(raw.id.clone());
            match normalize_category(raw) {
                Ok(category) => (Some(category.id.clone()), Some(category)),
                Err(_) => (raw_id, None),
            }
        }
        Some(RawCategoryRef::Id(id)) => (non_blank(Some(id)), None),
        Some(RawCategoryRef::Other(_)) | None => (None, None),
    };

    let summary = match (non_blank(common.description), &media) {
        (Some(description), _) => description,
        (None, ContentMedia::Text { body, .. }) => excerpt(body, DEFAULT_EXCERPT_LEN),
        (None, _) => String::new(),
    };

    let published_at = common.created_at.unwrap_or_default();
    let updated_at = common
        .updated_at
        .unwrap_or_else(|| published_at.clone());

    Ok(ContentItem {
        slug: slug_or_id(&title, &id),
        id,
        title,
        excerpt: summary,
        author: resolve_author(common.author),
        category_id,
        category,
        banner_image: non_blank(common.banner_image),
        featured: common.featured.unwrap_or(false),
        published_at,
        updated_at,
        media,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn duration_secs(raw: Option<f64>) -> Option<u32> {
    raw.filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs.round().min(f64::from(u32::MAX)) as u32)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new("http://localhost:4000/api")
    }

    #[test]
    fn post_without_author_gets_admin_and_slug() {
        let item = normalizer()
            .normalize_value(ContentKind::Post, json!({"_id": "x1", "title": "Hi There"}))
            .expect("post must normalize");

        assert_eq!(item.id, "x1");
        assert_eq!(item.slug, "hi-there");
        assert_eq!(item.author.name, "Admin");
        assert_eq!(item.kind(), ContentKind::Post);
    }

    #[test]
    fn author_name_is_assembled_from_parts() {
        let item = normalizer()
            .normalize_value(
                ContentKind::Post,
                json!({
                    "_id": "p1",
                    "title": "T",
                    "author": {"_id": "a1", "firstname": "Ada", "lastname": "Lovelace"}
                }),
            )
            .expect("post must normalize");
        assert_eq!(item.author.name, "Ada Lovelace");
        assert_eq!(item.author.id.as_deref(), Some("a1"));

        let author = resolve_author(Some(RawAuthorRef::Populated(crate::raw::RawAuthor {
            firstname: Some("Ada".to_string()),
            ..Default::default()
        })));
        assert_eq!(author.name, "Ada");
    }

    #[test]
    fn author_without_firstname_falls_back() {
        let author = resolve_author(Some(RawAuthorRef::Populated(crate::raw::RawAuthor {
            id: Some("a1".to_string()),
            lastname: Some("Lovelace".to_string()),
            ..Default::default()
        })));
        assert_eq!(author.name, FALLBACK_AUTHOR_NAME);
        assert_eq!(author.id.as_deref(), Some("a1"));
    }

    #[test]
    fn missing_required_fields_are_malformed() {
        let err = normalizer()
            .normalize_value(ContentKind::Podcast, json!({"title": "No id"}))
            .expect_err("missing id must fail");
        assert!(matches!(
            err,
            ContentClientError::MalformedDocument { kind: "podcast", .. }
        ));

        let err = normalizer()
            .normalize_value(ContentKind::Video, json!({"_id": "v1", "title": "   "}))
            .expect_err("blank title must fail");
        assert!(matches!(err, ContentClientError::MalformedDocument { .. }));
    }

    #[test]
    fn post_gets_read_time_and_excerpt() {
        let body = format!("<p>{}</p>", "word ".repeat(401));
        let item = normalizer()
            .normalize_value(
                ContentKind::Post,
                json!({"_id": "p1", "title": "Long", "content": body}),
            )
            .expect("post must normalize");

        assert_eq!(item.read_time(), Some(3));
        assert!(item.excerpt.ends_with("..."));
        assert!(!item.excerpt.contains('<'));
    }

    #[test]
    fn podcast_audio_is_resolved_to_stream_url() {
        let item = normalizer()
            .normalize_value(
                ContentKind::Podcast,
                json!({
                    "_id": "pc1",
                    "title": "Episode 1",
                    "audio_file": "/uploads/podcasts/ep1.mp3",
                    "duration": 2730.4
                }),
            )
            .expect("podcast must normalize");

        assert_eq!(item.read_time(), None);
        assert_eq!(
            item.media,
            ContentMedia::Audio {
                url: Some("http://localhost:4000/api/stream/podcasts/ep1.mp3".to_string()),
                duration_secs: Some(2730),
            }
        );
    }

    #[test]
    fn populated_category_is_normalized() {
        let item = normalizer()
            .normalize_value(
                ContentKind::Video,
                json!({
                    "_id": "v1",
                    "title": "Clip",
                    "youtube_url": "https://youtu.be/abc",
                    "category_id": {"_id": "c1", "category_name": "Web Development"}
                }),
            )
            .expect("video must normalize");

        let category = item.category.expect("category must be present");
        assert_eq!(category.slug, "web-development");
        assert_eq!(
            category.description.as_deref(),
            Some("Explore web development articles")
        );
        assert_eq!(item.category_id.as_deref(), Some("c1"));
    }

    #[test]
    fn bare_category_id_is_kept() {
        let item = normalizer()
            .normalize_value(
                ContentKind::Post,
                json!({"_id": "p1", "title": "T", "category_id": "c9"}),
            )
            .expect("post must normalize");
        assert_eq!(item.category_id.as_deref(), Some("c9"));
        assert!(item.category.is_none());
    }

    #[test]
    fn category_requires_id_and_name() {
        let err = normalize_category(RawCategory {
            id: Some("c1".to_string()),
            ..Default::default()
        })
        .expect_err("missing name must fail");
        assert!(matches!(
            err,
            ContentClientError::MalformedDocument { kind: "category", .. }
        ));
    }

    #[test]
    fn batch_skips_malformed_and_hidden_documents() {
        let documents = vec![
            json!({"_id": "p1", "title": "Ok"}),
            json!({"_id": "p2"}),
            json!({"_id": "p3", "title": "Draft", "status": "DRAFT"}),
            json!({"_id": "p4", "title": "Gone", "is_deleted": true}),
        ];
        let items = normalizer()
            .normalize_batch(ContentKind::Post, documents, MalformedPolicy::Skip)
            .expect("skip policy must not fail");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "p1");
    }

    #[test]
    fn batch_aborts_on_malformed_when_asked() {
        let documents = vec![json!({"_id": "p1", "title": "Ok"}), json!({"title": "no id"})];
        let result =
            normalizer().normalize_batch(ContentKind::Post, documents, MalformedPolicy::Abort);
        assert!(matches!(
            result,
            Err(ContentClientError::MalformedDocument { .. })
        ));
    }
}
