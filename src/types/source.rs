use serde::{Deserialize, Serialize};

/// A cited article attached to a bot response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Source {
    /// Title of the cited article.
    #[serde(default)]
    pub title: String,

    /// Name of the publication or collection the article came from.
    #[serde(default)]
    pub source: String,

    /// Link to the article.
    #[serde(default)]
    pub url: String,

    /// Retrieval similarity score reported by the backend.
    #[serde(default)]
    pub similarity: f64,
}

impl Source {
    /// Create a new source.
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
        similarity: f64,
    ) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
            url: url.into(),
            similarity,
        }
    }

    /// Similarity as a whole percentage, clamped to 0..=100.
    pub fn similarity_percent(&self) -> u8 {
        (self.similarity.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
