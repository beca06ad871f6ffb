// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Field validators and derivations applied before a document is written.
//!
//! Repositories call these explicitly; nothing runs implicitly on save.

use unicode_normalization::UnicodeNormalization;

use super::{StorageError, StorageResult};

pub const USER_NAME_MAX: usize = 50;
pub const USER_BIO_MAX: usize = 500;
pub const NEWS_TITLE_MAX: usize = 150;
pub const AD_TITLE_MAX: usize = 100;

/// Categories a news article may be filed under.
pub const NEWS_CATEGORIES: &[&str] = &[
    "सबै",
    "राजनीति",
    "खेलकुद",
    "स्वास्थ्य",
    "विचार",
    "राष्ट्रिय",
    "अन्तराष्ट्रिय",
    "प्रदेश विशेष",
    "फोटो",
    "भिडियो",
    "विशेष कथा",
    "जीवनशैली",
    "साहित्य",
];

/// Trim a required text field and enforce its maximum length in characters.
pub fn required_text(field: &str, value: &str, max_chars: usize) -> StorageResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StorageError::Validation(format!("Please provide a {field}")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(StorageError::Validation(format!(
            "{} cannot be more than {max_chars} characters",
            capitalize(field)
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field and enforce its maximum length.
pub fn optional_text(field: &str, value: &str, max_chars: usize) -> StorageResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max_chars {
        return Err(StorageError::Validation(format!(
            "{} cannot be more than {max_chars} characters",
            capitalize(field)
        )));
    }
    Ok(trimmed.to_string())
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// NFKC-normalize, trim and lowercase an email address.
pub fn normalize_email(raw: &str) -> String {
    raw.nfkc().collect::<String>().trim().to_lowercase()
}

/// Normalize and validate an email address.
///
/// Accepts `local@domain.tld` where local part and domain are runs of word
/// characters joined by single `.` or `-`, and the last domain label has at
/// least two characters.
pub fn validate_email(raw: &str) -> StorageResult<String> {
    let email = normalize_email(raw);
    if email.is_empty() {
        return Err(StorageError::Validation("Please provide an email".to_string()));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            joined_words(local)
                && joined_words(domain)
                && domain
                    .rsplit_once('.')
                    .is_some_and(|(_, tld)| tld.chars().count() >= 2 && tld.chars().all(is_word_char))
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(StorageError::Validation("Please provide a valid email".to_string()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Non-empty word runs separated by single `.` or `-`.
fn joined_words(s: &str) -> bool {
    !s.is_empty()
        && s
            .split(['.', '-'])
            .all(|word| !word.is_empty() && word.chars().all(is_word_char))
}

/// Derive a URL slug from a title.
///
/// Lowercases, strips everything except word characters, whitespace and
/// dashes, collapses whitespace/underscore/dash runs into one `-` and trims
/// dashes at either end. Falls back to `news-<unix millis>` when nothing
/// survives.
pub fn slugify(title: &str, now_millis: i64) -> String {
    let lowered = title.trim().to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_dash = false;
    for c in lowered.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = true;
        } else if is_word_char(c) {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    if slug.is_empty() {
        format!("news-{now_millis}")
    } else {
        slug
    }
}

/// Trim and lowercase a category and check it against [`NEWS_CATEGORIES`].
pub fn validate_category(raw: &str) -> StorageResult<String> {
    let category = raw.trim().to_lowercase();
    if category.is_empty() {
        return Err(StorageError::Validation("Please select a category".to_string()));
    }
    if NEWS_CATEGORIES.contains(&category.as_str()) {
        Ok(category)
    } else {
        Err(StorageError::Validation(format!("`{category}` is not a valid category")))
    }
}

/// Trim each tag and drop empty ones.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Require an absolute `http` or `https` URL.
pub fn validate_http_url(raw: &str) -> StorageResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StorageError::Validation(
            "Please provide a target URL for the advertisement".to_string(),
        ));
    }

    match url::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(trimmed.to_string())
        }
        _ => Err(StorageError::Validation("Please provide a valid URL".to_string())),
    }
}
