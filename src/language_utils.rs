use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for target language codes
///
/// Queue items carry the language code the remote site uses, which is an
/// ISO 639-1 or 639-2 code optionally followed by a region or script subtag
/// ("pt-br", "zh-hans", "sr_latn"). Only the primary subtag is checked.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    let part2t = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(part2t)
}

/// Lowercased primary subtag of a code ("pt-BR" -> "pt")
pub fn primary_subtag(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

fn lookup(primary: &str) -> Option<(Language, LanguageCodeType)> {
    match primary.len() {
        2 => Language::from_639_1(primary).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => Language::from_639_3(primary)
            .map(|lang| (lang, LanguageCodeType::Part2T))
            .or_else(|| {
                part2b_to_part2t(primary)
                    .and_then(Language::from_639_3)
                    .map(|lang| (lang, LanguageCodeType::Part2B))
            }),
        _ => None,
    }
}

/// Validate that a code's primary subtag is an ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let primary = primary_subtag(code);

    // Subtags after the primary one must be non-empty alphanumerics
    let subtags_ok = code
        .trim()
        .split(['-', '_'])
        .skip(1)
        .all(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()));

    match lookup(&primary) {
        Some((_, kind)) if subtags_ok => Ok(kind),
        _ => Err(anyhow!("Invalid language code: {}", code)),
    }
}

/// Check if two codes name the same language, ignoring region subtags
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(&primary_subtag(code1)), lookup(&primary_subtag(code2))) {
        (Some((a, _)), Some((b, _))) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (lang, _) = lookup(&primary_subtag(code))
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", code))?;
    Ok(lang.to_name().to_string())
}
