use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Catalog load failure: {message}")]
    CatalogError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Review error: {message}")]
    ReviewError { message: String },
}

impl LabelError {
    pub fn catalog(message: impl Into<String>) -> Self {
        LabelError::CatalogError {
            message: message.into(),
        }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        LabelError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn review(message: impl Into<String>) -> Self {
        LabelError::ReviewError {
            message: message.into(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LabelError::CsvError(e) => format!("The input file could not be parsed: {}", e),
            LabelError::IoError(e) => format!("A file could not be read or written: {}", e),
            LabelError::SerializationError(e) => format!("The report could not be written: {}", e),
            LabelError::ConfigParseError(e) => format!("The configuration is not valid TOML: {}", e),
            LabelError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{}' is invalid: {}", field, reason)
            }
            LabelError::CatalogError { message } => {
                format!("A reference catalog could not be loaded: {}", message)
            }
            LabelError::ProcessingError { message } => {
                format!("Order processing failed: {}", message)
            }
            LabelError::ReviewError { message } => {
                format!("Suggestion review problem: {}", message)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LabelError::CsvError(_) => "Check that the export is a delimited text file with a header row",
            LabelError::IoError(_) => "Check that the paths exist and are readable/writable",
            LabelError::SerializationError(_) => "Check that the output directory is writable",
            LabelError::ConfigParseError(_) => "Check the TOML syntax of the run configuration",
            LabelError::InvalidConfigValueError { .. } => {
                "Fix the named configuration value and rerun"
            }
            LabelError::CatalogError { .. } => {
                "Check the postal and branch catalog files and their column layout"
            }
            LabelError::ProcessingError { .. } => {
                "Check the export against the supported storefront/marketplace schemas"
            }
            LabelError::ReviewError { .. } => {
                "Decide the pending suggestions, or rerun with a --pending policy"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LabelError>;
