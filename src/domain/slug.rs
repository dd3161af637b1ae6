//! Group slug derivation and validation.
//!
//! Titles in any script are transliterated first: Chinese through `pinyin`,
//! everything else through `slug`'s own table (Cyrillic included), so
//! "Котики" becomes `kotiki`.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

pub const SLUG_MAX_CHARS: usize = 50;
const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("slug `{slug}` may only contain lowercase letters, digits and hyphens")]
    Malformed { slug: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors from [`generate_unique_slug`] when the uniqueness check itself fails.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Slug for a group title, before any uniqueness suffix.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let mut candidate = slugify(&transliterated);
    if candidate.len() > SLUG_MAX_CHARS {
        candidate.truncate(SLUG_MAX_CHARS);
        while candidate.ends_with('-') {
            candidate.pop();
        }
    }

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Accept an explicitly supplied slug as-is when it is already canonical.
pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= SLUG_MAX_CHARS
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if well_formed {
        Ok(())
    } else {
        Err(SlugError::Malformed {
            slug: slug.to_string(),
        })
    }
}

/// Produce a slug for `input` that the async predicate reports as free,
/// suffixing `-2`, `-3`, ... on collisions.
pub async fn generate_unique_slug<F, Fut, E>(
    input: &str,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = derive_slug(input)?;

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let suffix = format!("-{attempt}");
        let mut stem = base.clone();
        stem.truncate(SLUG_MAX_CHARS - suffix.len());
        while stem.ends_with('-') {
            stem.pop();
        }
        let candidate = format!("{stem}{suffix}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}
