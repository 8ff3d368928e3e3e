//! Field extraction from fetched documents
//!
//! The pipeline pulls exactly one field out of each document. The field is
//! chosen by an [`Extractor`]; the default [`SelectorExtractor`] takes the
//! text of the first element matching a CSS selector (`title` unless
//! configured otherwise).

use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no non-empty match for selector `{0}`")]
    MissingField(String),

    #[error("invalid CSS selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// One output line: the source URL and the extracted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub url: Url,
    pub field: String,
}

impl ExtractedRecord {
    pub fn new(url: Url, field: impl Into<String>) -> Self {
        Self {
            url,
            field: field.into(),
        }
    }
}

/// Pulls a single field out of a document
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &str) -> Result<String, ExtractError>;
}

/// Extracts the trimmed text of the first element matching a CSS selector
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    source: String,
    selector: Selector,
}

impl SelectorExtractor {
    /// Compiles `selector`
    ///
    /// # Example
    ///
    /// ```
    /// use targeted_crawler::extract::{Extractor, SelectorExtractor};
    ///
    /// let extractor = SelectorExtractor::new("title").unwrap();
    /// let html = "<html><head><title> Test </title></head></html>";
    /// assert_eq!(extractor.extract(html).unwrap(), "Test");
    /// ```
    pub fn new(selector: &str) -> Result<Self, ExtractError> {
        let compiled = Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: selector.to_string(),
            selector: compiled,
        })
    }

    pub fn selector(&self) -> &str {
        &self.source
    }
}

impl Extractor for SelectorExtractor {
    fn extract(&self, document: &str) -> Result<String, ExtractError> {
        let document = Html::parse_document(document);

        document
            .select(&self.selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ExtractError::MissingField(self.source.clone()))
    }
}
