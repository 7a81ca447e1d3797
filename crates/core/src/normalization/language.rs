use std::sync::OnceLock;

use regex::Regex;

/// Full language names and bare primaries that map to a default regional tag.
const DEFAULT_REGIONS: &[(&str, &str, &str)] = &[
    ("english", "en", "en-US"),
    ("spanish", "es", "es-ES"),
    ("french", "fr", "fr-FR"),
    ("german", "de", "de-DE"),
    ("italian", "it", "it-IT"),
    ("portuguese", "pt", "pt-BR"),
    ("chinese", "zh", "zh-CN"),
    ("japanese", "ja", "ja-JP"),
    ("korean", "ko", "ko-KR"),
    ("russian", "ru", "ru-RU"),
];

/// Canonicalize a free-form language value into a BCP-47 tag.
///
/// Accepts full names (`"english"`), underscore locales (`"en_us"`) and any casing.
/// Subtags are recased per BCP-47 conventions: lowercase language, title-case script,
/// uppercase region. Values that are not recognizable pass through with that recasing only;
/// the validator flags them.
pub fn canonicalize_language(value: &str) -> String {
    let normalized = value.trim().replace('_', "-");
    let lower = normalized.to_ascii_lowercase();

    if let Some(&(_, _, tag)) = DEFAULT_REGIONS
        .iter()
        .find(|(name, primary, _)| *name == lower || *primary == lower)
    {
        return tag.to_string();
    }

    normalized
        .split('-')
        .enumerate()
        .map(|(i, subtag)| recase_subtag(i, subtag))
        .collect::<Vec<_>>()
        .join("-")
}

fn recase_subtag(position: usize, subtag: &str) -> String {
    if position == 0 {
        return subtag.to_ascii_lowercase();
    }
    let is_alpha = subtag.chars().all(|c| c.is_ascii_alphabetic());
    match subtag.len() {
        2 if is_alpha => subtag.to_ascii_uppercase(),
        4 if is_alpha => {
            let mut chars = subtag.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        }
        _ => subtag.to_ascii_lowercase(),
    }
}

fn bcp47_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            // language[-script][-region](-variant)*[-x-private]
            Regex::new(
                r"(?i)^[a-z]{2,3}(-[a-z]{4})?(-([a-z]{2}|[0-9]{3}))?(-([a-z0-9]{5,8}|[0-9][a-z0-9]{3}))*(-x(-[a-z0-9]{1,8})+)?$",
            )
            .ok()
        })
        .as_ref()
}

/// Syntax check for a BCP-47 tag. Case-insensitive.
pub fn is_valid_bcp47(tag: &str) -> bool {
    bcp47_pattern().is_some_and(|re| re.is_match(tag))
}
