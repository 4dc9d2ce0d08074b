use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Identifier has no `<set>-<number>` shape.
    #[error("malformed identifier: '{0}'")]
    MalformedIdentifier(String),
    /// A record lacks a field the caller cannot do without.
    #[error("provider '{provider}', record '{identifier}': missing required field '{field}'")]
    MissingRequiredField {
        provider: String,
        identifier: String,
        field: String,
    },
    /// Input breaks a structural rule (duplicate or mis-keyed identifier),
    /// or an internal consistency check failed.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// Every input record had a malformed identifier.
    #[error("no usable identifiers: all {records} record(s) are malformed")]
    EmptyUniverse { records: usize },
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (unknown provider, duplicate entry, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// Provider export could not be read into a collection.
    #[error("provider '{provider}': {message}")]
    Load { provider: String, message: String },
}

/// Data-quality issue found during a run. Accumulated, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    MalformedIdentifier {
        provider: String,
        identifier: String,
    },
    MissingRequiredField {
        provider: String,
        identifier: String,
        field: String,
    },
    UnrecognizedRarity {
        identifier: String,
        rarity: String,
    },
    SetCodeDisagreement {
        provider: String,
        identifier: String,
        reported: String,
        derived: String,
    },
}

impl std::fmt::Display for DataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedIdentifier { provider, identifier } => {
                write!(f, "{provider}: malformed identifier '{identifier}'")
            }
            Self::MissingRequiredField { provider, identifier, field } => {
                write!(f, "{provider}: record '{identifier}' has no {field}")
            }
            Self::UnrecognizedRarity { identifier, rarity } => {
                write!(f, "'{identifier}': unrecognized rarity '{rarity}'")
            }
            Self::SetCodeDisagreement { provider, identifier, reported, derived } => {
                write!(
                    f,
                    "{provider}: record '{identifier}' reports set '{reported}', \
                     identifier says '{derived}'"
                )
            }
        }
    }
}
