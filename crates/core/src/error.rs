use thiserror::Error;

/// Per-document failures. The batch driver downgrades every variant to an
/// empty outline.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("text extraction failed: {0}")]
    Extraction(String),
    #[error("document has no pages")]
    NoPages,
    #[error("document contains no text")]
    EmptyDocument,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
