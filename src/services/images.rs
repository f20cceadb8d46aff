//! Image references found in Joomla content rows.
//!
//! Joomla 2.5+ keeps an intro image and a full-text image in the `images`
//! column as a JSON object:
//!
//! ```json
//! {"image_intro":"","float_intro":"","image_intro_alt":"","image_intro_caption":"",
//!  "image_fulltext":"","float_fulltext":"","image_fulltext_alt":"","image_fulltext_caption":""}
//! ```
//!
//! Articles also embed images directly as `<img>` tags in their body.

use scraper::{Html, Selector};
use serde::Deserialize;
use thiserror::Error;

use crate::models::JoomlaContent;

/// Errors raised while reading image references.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid images JSON for content {content_id}: {source}")]
    InvalidJson {
        content_id: i64,
        #[source]
        source: serde_json::Error,
    },
}

/// An image source with its alternative text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub src: String,
    pub alt: Option<String>,
}

impl ImageRef {
    fn new(src: &str, alt: Option<&str>) -> Self {
        Self {
            src: src.to_string(),
            alt: alt.map(str::to_string),
        }
    }
}

/// The `images` column of a content row. Captions and floats are ignored.
#[derive(Debug, Default, Deserialize)]
struct ImagesColumn {
    #[serde(default)]
    image_intro: Option<String>,
    #[serde(default)]
    image_intro_alt: Option<String>,
    #[serde(default)]
    image_fulltext: Option<String>,
    #[serde(default)]
    image_fulltext_alt: Option<String>,
}

/// Parse the `images` JSON column into its intro and full-text images.
///
/// A NULL or blank column yields no images.
pub fn column_images(content_id: i64, images: Option<&str>) -> Result<Vec<ImageRef>, ImageError> {
    let Some(raw) = images.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(Vec::new());
    };

    let column: ImagesColumn = serde_json::from_str(raw)
        .map_err(|source| ImageError::InvalidJson { content_id, source })?;

    let mut found = Vec::new();
    if let Some(src) = column.image_intro.as_deref().filter(|s| !s.is_empty()) {
        found.push(ImageRef::new(src, column.image_intro_alt.as_deref()));
    }
    if let Some(src) = column.image_fulltext.as_deref().filter(|s| !s.is_empty()) {
        found.push(ImageRef::new(src, column.image_fulltext_alt.as_deref()));
    }
    Ok(found)
}

/// Collect `<img>` tags from an HTML fragment in document order.
///
/// Tags without a `src` attribute are skipped.
pub fn inline_images(html: &str) -> Vec<ImageRef> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .filter_map(|img| {
            let element = img.value();
            element
                .attr("src")
                .map(|src| ImageRef::new(src, element.attr("alt")))
        })
        .collect()
}

/// All images referenced by a content row: column images first, then the
/// inline images of the assembled body.
pub fn content_images(content: &JoomlaContent) -> Result<Vec<ImageRef>, ImageError> {
    let mut images = column_images(content.id, content.images.as_deref())?;
    images.extend(inline_images(&content.body()));
    Ok(images)
}
