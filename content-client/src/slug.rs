//! Производные slug'и для заголовков и названий категорий.
//!
//! Slug не приходит с бэкенда и не гарантированно уникален: два заголовка,
//! отличающиеся только регистром или пунктуацией, дают одинаковый slug.

/// Строит URL-безопасный slug из заголовка.
///
/// Заголовок приводится к нижнему регистру, все символы кроме `[a-z0-9]`,
/// пробельных и `-` удаляются, пробельные серии и повторные дефисы
/// схлопываются в один `-`, дефисы по краям обрезаются.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else if ch == '-' || ch.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug
}

/// Slug заголовка или, если он пустой, идентификатор сущности.
pub fn slug_or_id(title: &str, id: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() { id.to_string() } else { slug }
}

/// Проверяет, что строка уже имеет вид slug'а.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
