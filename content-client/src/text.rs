//! Текстовые утилиты для карточек и страниц публикаций.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

const WORDS_PER_MINUTE: usize = 200;

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid html tag regex"));

/// Длина автоматического описания по умолчанию.
pub const DEFAULT_EXCERPT_LEN: usize = 160;

/// Количество слов, разделённых пробельными символами.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Время чтения в минутах: `ceil(word_count / 200)`.
///
/// Для пустого тела результат `0`, а не `1`: пустая строка не считается словом.
pub fn read_time_minutes(body: &str) -> u32 {
    let minutes = word_count(body).div_ceil(WORDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Удаляет закрытые HTML-теги (`<...>`). Одиночный `<` остаётся в тексте.
pub fn strip_html(content: &str) -> String {
    TAG_REGEX.replace_all(content, "").into_owned()
}

/// Обрезает текст до `max_chars` символов и добавляет `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", text[..byte_idx].trim()),
    }
}

/// Краткое описание из тела публикации.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    truncate(strip_html(content).trim(), max_chars)
}

/// Дата в виде `January 5, 2024`; при ошибке разбора возвращается исходная строка.
///
/// Понимает RFC 3339 и голую дату `YYYY-MM-DD`.
pub fn format_date(raw: &str) -> String {
    const LONG_FORM: &str = "%B %-d, %Y";

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(LONG_FORM).to_string();
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format(LONG_FORM).to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Длительность в виде `m:ss`.
pub fn format_duration(total_secs: u32) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}
