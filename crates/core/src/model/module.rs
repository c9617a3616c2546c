use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ModuleKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("section title is empty")]
    EmptyTitle,

    #[error("section body is empty")]
    EmptyBody,

    #[error("module outline has no sections")]
    NoSections,

    #[error("invalid media uri: {0}")]
    InvalidMediaUri(#[from] url::ParseError),
}

/// Hosted image (or video) shown within a section, with an optional caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    uri: Url,
    caption: Option<String>,
}

impl MediaRef {
    /// Parses and wraps a hosted-asset URI.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidMediaUri` if the URI does not parse.
    pub fn new(uri: &str, caption: Option<String>) -> Result<Self, ModuleError> {
        Ok(Self {
            uri: Url::parse(uri)?,
            caption,
        })
    }

    #[must_use]
    pub fn uri(&self) -> &Url {
        &self.uri
    }

    #[must_use]
    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }
}

/// One ordered content section of a leaf module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    title: String,
    body: String,
    media: Vec<MediaRef>,
}

impl Section {
    /// Builds a validated section.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError` if title or body is blank.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        media: Vec<MediaRef>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        let body = body.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        if body.trim().is_empty() {
            return Err(ModuleError::EmptyBody);
        }
        Ok(Self { title, body, media })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn media(&self) -> &[MediaRef] {
        &self.media
    }
}

/// The full content outline of one leaf module: an overview blurb plus the
/// ordered sections a session steps through before its quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleOutline {
    key: ModuleKey,
    title: String,
    overview: String,
    sections: Vec<Section>,
}

impl ModuleOutline {
    /// Builds a validated outline.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::NoSections` for an empty section list.
    pub fn new(
        key: ModuleKey,
        title: impl Into<String>,
        overview: impl Into<String>,
        sections: Vec<Section>,
    ) -> Result<Self, ModuleError> {
        if sections.is_empty() {
            return Err(ModuleError::NoSections);
        }
        Ok(Self {
            key,
            title: title.into(),
            overview: overview.into(),
            sections,
        })
    }

    #[must_use]
    pub fn key(&self) -> &ModuleKey {
        &self.key
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn overview(&self) -> &str {
        &self.overview
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_rejects_blank_fields() {
        assert_eq!(
            Section::new("", "body", Vec::new()),
            Err(ModuleError::EmptyTitle)
        );
        assert_eq!(
            Section::new("title", "  ", Vec::new()),
            Err(ModuleError::EmptyBody)
        );
    }

    #[test]
    fn outline_needs_sections() {
        let key = ModuleKey::from_static("residential");
        let err = ModuleOutline::new(key, "Residential", "blurb", Vec::new()).unwrap_err();
        assert_eq!(err, ModuleError::NoSections);
    }

    #[test]
    fn media_uri_is_validated() {
        assert!(MediaRef::new("https://example.com/walkthrough1.jpg", None).is_ok());
        assert!(MediaRef::new("not a uri", None).is_err());
    }

    #[test]
    fn media_ref_serializes_uri_as_string() {
        let media = MediaRef::new(
            "https://example.com/walkthrough1.jpg",
            Some("Pre-spray pass".into()),
        )
        .unwrap();
        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["uri"], "https://example.com/walkthrough1.jpg");
        let back: MediaRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, media);
    }
}
