//! Error types for Project Arena.

use thiserror::Error;

/// Errors raised while building static combat data (move tables, chains).
#[derive(Debug, Error)]
pub enum DataError {
    /// RON text could not be parsed
    #[error("Failed to parse data: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A required move has no entry
    #[error("Move table is missing an entry for {0}")]
    MissingMove(String),

    /// A move appears more than once
    #[error("Move {0} is defined more than once")]
    DuplicateMove(String),

    /// A move record has an invalid field
    #[error("Invalid move {id}: {reason}")]
    InvalidMove {
        /// Offending move
        id: String,
        /// Why it was rejected
        reason: String,
    },

    /// A chain edge breaks the graph rules
    #[error("Illegal chain {from} -> {to}: {reason}")]
    IllegalChain {
        /// Source move
        from: String,
        /// Destination move
        to: String,
        /// Why it was rejected
        reason: String,
    },

    /// Data was written by an incompatible schema version
    #[error("Unsupported data version {found} (supports {supported})")]
    UnsupportedVersion {
        /// Version found in the data
        found: String,
        /// Version this build reads
        supported: String,
    },

    /// A fighter definition is inconsistent
    #[error("Invalid fighter {name}: {reason}")]
    InvalidFighter {
        /// Fighter name
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
