//! URL медиафайлов: стриминг загруженных файлов и встраивание YouTube.

const UPLOADS_PREFIX: &str = "/uploads/";

/// Превращает путь загрузки в абсолютный URL стриминга.
///
/// `/uploads/<type>/<file>` становится `<api_base>/stream/<type>/<file>`.
/// Абсолютные URL возвращаются как есть, прочие относительные пути
/// присоединяются к `api_base`.
pub fn resolve_stream_url(api_base: &str, url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    let base = api_base.trim_end_matches('/');
    let normalized = if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    };

    match normalized.strip_prefix(UPLOADS_PREFIX) {
        Some(rest) => format!("{base}/stream/{rest}"),
        None => format!("{base}{normalized}"),
    }
}

/// URL для встраивания YouTube-ролика, если ссылка распознана.
pub fn youtube_embed_url(url: &str) -> Option<String> {
    let video_id = if let Some((_, rest)) = url.split_once("youtube.com/watch?v=") {
        rest
    } else if let Some((_, rest)) = url.split_once("youtu.be/") {
        rest
    } else {
        return None;
    };

    let video_id = video_id
        .split(|c: char| c == '&' || c == '?' || c.is_whitespace())
        .next()
        .unwrap_or_default();
    if video_id.is_empty() {
        return None;
    }
    Some(format!("https://www.youtube.com/embed/{video_id}"))
}
