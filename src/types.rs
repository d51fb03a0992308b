//! Normalised update records returned by providers.

use serde::{Deserialize, Serialize};

/// A single normalised update about a project.
///
/// Providers build these from their own payloads. Once returned from
/// [`crate::Session::find_updates`] a record is owned by the caller and is
/// not touched again by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Headline of the update.
    pub title: String,
    /// Short description or summary text.
    pub description: String,
    /// Link to the full update.
    pub link: String,
    /// Publication date as reported by the provider.
    pub date_published: String,
    /// Thumbnail, when the provider has one.
    pub img: Option<Img>,
    /// Free-text classification, empty when the provider gives none.
    pub category: String,
    /// Names of the providers this update came from.
    pub sources: Vec<String>,

    // Ranking scratch state, never serialised.
    #[serde(skip)]
    points: i32,
    #[serde(skip)]
    kind: Option<String>,
    #[serde(skip)]
    raw: Vec<u8>,
}

/// Thumbnail attached to an [`Update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Img {
    /// Image URL.
    pub link: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Update {
    /// Create an update with the three fields every provider supplies.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            link: link.into(),
            ..Default::default()
        }
    }

    /// Set the publication date.
    pub fn with_date_published(mut self, date: impl Into<String>) -> Self {
        self.date_published = date.into();
        self
    }

    /// Attach a thumbnail.
    pub fn with_img(mut self, img: Img) -> Self {
        self.img = Some(img);
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Append a source provider name if not already present.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.add_source(source);
        self
    }

    /// Tag the record with the provider-specific payload kind and raw
    /// bytes, for use by a ranking stage.
    pub fn with_ranking_input(mut self, kind: impl Into<String>, raw: Vec<u8>) -> Self {
        self.kind = Some(kind.into());
        self.raw = raw;
        self
    }

    /// Append a source provider name, keeping the list free of repeats.
    pub fn add_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    pub(crate) fn points(&self) -> i32 {
        self.points
    }

    pub(crate) fn add_points(&mut self, points: i32) {
        self.points = self.points.saturating_add(points);
    }

    #[allow(dead_code)] // Read by the ranking stage once it lands
    pub(crate) fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[allow(dead_code)] // Read by the ranking stage once it lands
    pub(crate) fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Update {
        Update::new("Release 1.0", "First stable release", "https://example.com/1.0")
            .with_date_published("2024-01-02T03:04:05Z")
            .with_category("Technology")
            .with_source("Bing")
    }

    #[test]
    fn builder_sets_public_fields() {
        let update = sample();
        assert_eq!(update.title, "Release 1.0");
        assert_eq!(update.description, "First stable release");
        assert_eq!(update.link, "https://example.com/1.0");
        assert_eq!(update.date_published, "2024-01-02T03:04:05Z");
        assert_eq!(update.category, "Technology");
        assert_eq!(update.sources, vec!["Bing".to_string()]);
        assert!(update.img.is_none());
    }

    #[test]
    fn sources_do_not_repeat() {
        let mut update = sample();
        update.add_source("Bing");
        update.add_source("Twitter");
        update.add_source("Bing");
        assert_eq!(update.sources, vec!["Bing".to_string(), "Twitter".to_string()]);
    }

    #[test]
    fn serialised_names_match_contract() {
        let update = sample().with_img(Img {
            link: "https://example.com/t.png".into(),
            width: 120,
            height: 80,
        });
        let json = serde_json::to_value(&update).expect("serialize");
        assert_eq!(json["date_published"], "2024-01-02T03:04:05Z");
        assert_eq!(json["img"]["width"], 120);
        assert_eq!(json["sources"][0], "Bing");
        assert!(json.get("points").is_none());
        assert!(json.get("raw").is_none());
    }

    #[test]
    fn missing_img_serialises_as_null() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert!(json["img"].is_null());
    }

    #[test]
    fn ranking_scratch_state_is_private_and_skipped() {
        let mut update = sample().with_ranking_input("bing-news", b"{}".to_vec());
        update.add_points(3);
        update.add_points(2);
        assert_eq!(update.points(), 5);
        assert_eq!(update.kind(), Some("bing-news"));
        assert_eq!(update.raw(), b"{}");

        let json = serde_json::to_string(&update).expect("serialize");
        let decoded: Update = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.points(), 0);
        assert!(decoded.kind().is_none());
        assert_eq!(decoded.title, update.title);
    }
}
