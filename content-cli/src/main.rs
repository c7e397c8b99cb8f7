use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use content_client::{
    Category, ClientSettings, ContactMessage, ContentClientError, ContentItem, ContentKind,
    ContentMedia, Page, connect, text,
};
use serde_json::Value;
use tracing::debug;

mod logging;

#[derive(Debug, Parser)]
#[command(name = "content-cli", version, about = "CLI для просмотра контента блога")]
struct Cli {
    /// Адрес API (по умолчанию CONTENT_API_BASE_URL или localhost).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Печатать результат как JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Post,
    Podcast,
    Video,
}

impl From<KindArg> for ContentKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Post => ContentKind::Post,
            KindArg::Podcast => ContentKind::Podcast,
            KindArg::Video => ContentKind::Video,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Страница коллекции.
    List {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 9)]
        limit: u32,
        #[arg(long)]
        category: Option<String>,
    },
    /// Публикация по id.
    Get {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        #[arg(long)]
        id: String,
    },
    /// Публикация по slug.
    Slug {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        slug: String,
    },
    /// Связанные публикации.
    Related {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = 3)]
        limit: u32,
    },
    /// Избранное.
    Featured {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        #[arg(long, default_value_t = 6)]
        limit: u32,
    },
    /// Поиск.
    Search {
        #[arg(long, value_enum, default_value_t = KindArg::Post)]
        kind: KindArg,
        query: String,
    },
    /// Список категорий.
    Categories,
    /// Отправка формы обратной связи.
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        message: String,
    },
    /// Подписка на рассылку.
    Subscribe {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging(&logging::default_level())?;

    let cli = Cli::parse();

    let mut settings = ClientSettings::from_env().context("некорректные настройки окружения")?;
    if let Some(server) = cli.server {
        settings.api_base_url = normalize_server(server);
    }
    let client = connect(&settings).map_err(map_client_error)?;
    debug!(base_url = %client.gateway().base_url(), "using content API");

    match cli.command {
        Command::List {
            kind,
            page,
            limit,
            category,
        } => {
            let page = client
                .list(kind.into(), page, limit, category.as_deref())
                .await
                .map_err(map_client_error)?;
            if cli.json {
                print_json(&page)?;
            } else {
                print_page(&page);
            }
        }
        Command::Get { kind, id } => {
            let item = client
                .get_by_id(kind.into(), &id)
                .await
                .map_err(map_client_error)?;
            output_item(cli.json, &item)?;
        }
        Command::Slug { kind, slug } => {
            let item = client
                .find_by_slug(kind.into(), &slug)
                .await
                .map_err(map_client_error)?;
            output_item(cli.json, &item)?;
        }
        Command::Related { kind, id, limit } => {
            let items = client.related(kind.into(), &id, limit).await;
            output_items(cli.json, "Связанные", &items)?;
        }
        Command::Featured { kind, limit } => {
            let items = client
                .featured(kind.into(), limit)
                .await
                .map_err(map_client_error)?;
            output_items(cli.json, "Избранное", &items)?;
        }
        Command::Search { kind, query } => {
            let items = client
                .search(kind.into(), &query)
                .await
                .map_err(map_client_error)?;
            output_items(cli.json, "Найдено", &items)?;
        }
        Command::Categories => {
            let categories = client.categories().await.map_err(map_client_error)?;
            if cli.json {
                print_json(&categories)?;
            } else {
                print_categories(&categories);
            }
        }
        Command::Contact {
            name,
            email,
            subject,
            message,
        } => {
            let message = ContactMessage {
                name,
                email,
                subject,
                message,
            };
            client
                .submit_contact(&message)
                .await
                .map_err(map_client_error)?;
            println!("Сообщение отправлено");
        }
        Command::Subscribe { email } => {
            client
                .subscribe_newsletter(&email)
                .await
                .map_err(map_client_error)?;
            println!("Подписка оформлена: {email}");
        }
    }

    Ok(())
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_client_error(err: ContentClientError) -> anyhow::Error {
    let message = match err {
        ContentClientError::UpstreamUnavailable(message) => {
            format!("API недоступен: {message}. Попробуйте ещё раз позже")
        }
        ContentClientError::NotFound(what) => format!("не найдено: {what}"),
        ContentClientError::MalformedDocument { kind, reason } => {
            format!("некорректный ответ API ({kind}): {reason}")
        }
        ContentClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        ContentClientError::Http(err) => format!("ошибка HTTP-клиента: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let value: Value = serde_json::to_value(value).context("не удалось сериализовать ответ")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn output_item(json: bool, item: &ContentItem) -> Result<()> {
    if json {
        return print_json(item);
    }
    print_item(item);
    Ok(())
}

fn output_items(json: bool, title: &str, items: &[ContentItem]) -> Result<()> {
    if json {
        return print_json(&items);
    }
    println!("{title}: {}", items.len());
    for item in items {
        print_summary(item);
    }
    Ok(())
}

fn print_item(item: &ContentItem) {
    println!("{}", item.title);
    println!("id: {}", item.id);
    println!("slug: {}", item.slug);
    println!("kind: {}", item.kind().as_str());
    println!("author: {}", item.author.name);
    if let Some(category) = &item.category {
        println!("category: {} ({})", category.name, category.slug);
    }
    println!("published: {}", text::format_date(&item.published_at));
    match &item.media {
        ContentMedia::Text { read_time, .. } => println!("read time: {read_time} min"),
        ContentMedia::Audio { url, duration_secs } => {
            println!("audio: {}", url.as_deref().unwrap_or("-"));
            if let Some(secs) = duration_secs {
                println!("duration: {}", text::format_duration(*secs));
            }
        }
        ContentMedia::Video {
            url, duration_secs, ..
        } => {
            let embed = url.as_deref().and_then(content_client::media::youtube_embed_url);
            println!("video: {}", embed.as_deref().or(url.as_deref()).unwrap_or("-"));
            if let Some(secs) = duration_secs {
                println!("duration: {}", text::format_duration(*secs));
            }
        }
    }
    println!();
    println!("{}", item.excerpt);
}

fn print_summary(item: &ContentItem) {
    println!("- [{}] {} ({})", item.id, item.title, item.slug);
}

fn print_page(page: &Page<ContentItem>) {
    println!(
        "Страница {}/{} (limit={}, total={})",
        page.page, page.total_pages, page.limit, page.total
    );
    for item in &page.data {
        print_summary(item);
    }
    if let Some(navigation) = page_navigation(page) {
        println!("{navigation}");
    }
}

fn page_navigation<T>(page: &Page<T>) -> Option<String> {
    let mut hints = Vec::new();
    if page.has_prev() {
        hints.push(format!("назад: --page {}", page.page - 1));
    }
    if page.has_next() {
        hints.push(format!("дальше: --page {}", page.page + 1));
    }
    (!hints.is_empty()).then(|| hints.join(" | "))
}

fn print_categories(categories: &[Category]) {
    println!("Категорий: {}", categories.len());
    for category in categories {
        println!("- [{}] {} ({})", category.id, category.name, category.slug);
    }
}
