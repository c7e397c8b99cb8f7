use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ClientSettings;
use crate::error::{ContentClientError, ContentClientResult};
use crate::gateway::{ContentGateway, ListingQuery};
use crate::models::{ContactMessage, ContentKind};
use crate::raw::{RawListing, parse_listing, unwrap_envelope};

const CATEGORIES_PATH: &str = "/blog/category";
const CONTACT_PATH: &str = "/contact";
const NEWSLETTER_PATH: &str = "/newsletter/subscribe";

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ListQueryDto<'a> {
    page: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LimitQueryDto {
    limit: u32,
}

#[derive(Debug, Serialize)]
struct SearchQueryDto<'a> {
    q: &'a str,
}

#[derive(Debug, Serialize)]
struct NewsletterRequestDto<'a> {
    email: &'a str,
}

#[derive(Debug, Clone)]
/// HTTP-шлюз к REST API контента.
pub struct HttpGateway {
    base_url: String,
    client: Client,
}

impl HttpGateway {
    /// Создаёт шлюз по настройкам клиента.
    pub fn new(settings: &ClientSettings) -> ContentClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.api_base_url.clone(),
            client,
        })
    }

    /// Базовый URL API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "upstream request");
        self.client.request(method, url)
    }

    async fn decode_error(response: reqwest::Response) -> ContentClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .message
                .or(body.error)
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        ContentClientError::from_http_status(status, Some(message))
    }

    /// Отправляет запрос и разбирает JSON-ответ.
    async fn send(&self, request: RequestBuilder) -> ContentClientResult<Value> {
        let response = request
            .send()
            .await
            .map_err(ContentClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<Value>()
            .await
            .map_err(ContentClientError::from_reqwest)
    }

    /// Отправляет запрос без интереса к телу ответа.
    async fn send_and_forget(&self, request: RequestBuilder) -> ContentClientResult<()> {
        let response = request
            .send()
            .await
            .map_err(ContentClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(())
    }
}

fn item_path(kind: ContentKind, id: &str) -> ContentClientResult<String> {
    let id = id.trim();
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(ContentClientError::InvalidRequest(format!(
            "invalid {} id: '{id}'",
            kind.as_str()
        )));
    }
    Ok(format!("{}/{id}", kind.collection_path()))
}

#[async_trait]
impl ContentGateway for HttpGateway {
    async fn list(
        &self,
        kind: ContentKind,
        query: &ListingQuery,
    ) -> ContentClientResult<RawListing> {
        let dto = ListQueryDto {
            page: query.page,
            limit: query.limit,
            category: query.category.as_deref(),
        };
        let body = self
            .send(self.request(Method::GET, kind.collection_path()).query(&dto))
            .await?;
        parse_listing(body)
    }

    async fn get(&self, kind: ContentKind, id: &str) -> ContentClientResult<Value> {
        let path = item_path(kind, id)?;
        let body = self.send(self.request(Method::GET, &path)).await?;
        match unwrap_envelope(body) {
            Value::Object(map) => Ok(Value::Object(map)),
            Value::Null => Err(ContentClientError::NotFound(format!(
                "{} id: {id}",
                kind.as_str()
            ))),
            _ => Err(ContentClientError::malformed(
                kind.as_str(),
                "expected a single document object",
            )),
        }
    }

    async fn featured(&self, kind: ContentKind, limit: u32) -> ContentClientResult<Vec<Value>> {
        let path = format!("{}/featured", kind.collection_path());
        let body = self
            .send(
                self.request(Method::GET, &path)
                    .query(&LimitQueryDto { limit }),
            )
            .await?;
        Ok(parse_listing(body)?.documents)
    }

    async fn search(&self, kind: ContentKind, query: &str) -> ContentClientResult<Vec<Value>> {
        let path = format!("{}/search", kind.collection_path());
        let body = self
            .send(
                self.request(Method::GET, &path)
                    .query(&SearchQueryDto { q: query }),
            )
            .await?;
        Ok(parse_listing(body)?.documents)
    }

    async fn categories(&self) -> ContentClientResult<Vec<Value>> {
        let body = self.send(self.request(Method::GET, CATEGORIES_PATH)).await?;
        Ok(parse_listing(body)?.documents)
    }

    async fn submit_contact(&self, message: &ContactMessage) -> ContentClientResult<()> {
        self.send_and_forget(self.request(Method::POST, CONTACT_PATH).json(message))
            .await
    }

    async fn subscribe_newsletter(&self, email: &str) -> ContentClientResult<()> {
        self.send_and_forget(
            self.request(Method::POST, NEWSLETTER_PATH)
                .json(&NewsletterRequestDto { email }),
        )
        .await
    }
}
