//! Post and comment invariants.

use imagesize::ImageType;
use time::{format_description::FormatItem, macros::format_description};

use crate::domain::error::DomainError;

/// Characters of post text used when a post is shown as a one-line label.
pub const POST_PREVIEW_CHARS: usize = 15;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:long] [year]");

/// Return the first `limit` characters of `text`.
pub fn preview(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

pub fn validate_post_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("post text must not be empty"));
    }
    Ok(())
}

pub fn validate_comment_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::validation("comment text must not be empty"));
    }
    Ok(())
}

/// Parse the `group` form value. An empty value means "no group".
pub fn parse_group_choice(raw: &str) -> Result<Option<i64>, DomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| DomainError::validation(format!("`{trimmed}` is not a valid group choice")))
}

/// Dimensions and canonical extension of an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub extension: &'static str,
    pub width: usize,
    pub height: usize,
}

/// Check that `bytes` hold a supported raster image.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, DomainError> {
    let invalid = || DomainError::validation("upload a valid image");

    let extension = match imagesize::image_type(bytes).map_err(|_| invalid())? {
        ImageType::Gif => "gif",
        ImageType::Png => "png",
        ImageType::Jpeg => "jpg",
        ImageType::Webp => "webp",
        ImageType::Bmp => "bmp",
        _ => return Err(invalid()),
    };
    let size = imagesize::blob_size(bytes).map_err(|_| invalid())?;

    Ok(ImageInfo {
        extension,
        width: size.width,
        height: size.height,
    })
}
