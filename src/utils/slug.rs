//! Slug generation matching Django's `slugify` over `unidecode`.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid slug regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("valid slug regex"));

/// Generate a URL-safe slug from a display name.
///
/// Non-ASCII characters are transliterated first, so "Categoría" becomes
/// "categoria" rather than losing the accented letter.
///
/// Examples:
/// - "My Category" -> "my-category"
/// - "Noticias & Eventos" -> "noticias-eventos"
/// - "Año 2013" -> "ano-2013"
pub fn slugify(value: &str) -> String {
    let ascii = deunicode::deunicode(value);
    let cleaned = DISALLOWED.replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();
    SEPARATORS.replace_all(&lowered, "-").into_owned()
}
