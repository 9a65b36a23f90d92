/// Centralized error types for repograph using thiserror
///
/// Only location/open failures, reference-enumeration failures and storage
/// failures abort a parse; per-ref and per-object failures degrade coverage
/// and are reported through the parse report instead.
use thiserror::Error;

/// Main error type for the graph pipeline
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Repository location error: {0}")]
    Locate(#[from] LocateError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors from locating and opening a repository inside an extracted tree
#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Root directory does not exist: {0}")]
    RootNotFound(String),

    #[error("Root path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Failed to open repository at '{path}': {reason}")]
    OpenFailed { path: String, reason: String },
}

/// Errors from git object and reference access
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to enumerate references: {0}")]
    RefEnumeration(String),

    #[error("Failed to walk ref '{name}': {reason}")]
    RefWalk { name: String, reason: String },

    #[error("Failed to resolve object {0}: {1}")]
    ObjectResolution(String, String),
}

/// Errors from the graph store backends.
///
/// Store failures abort the parse: an incomplete graph is surfaced as an
/// error rather than silently served.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode metadata: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored row: {0}")]
    CorruptRow(String),
}

/// Errors from loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Errors from transforming stored rows into the export structure
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unknown graph scope: {0}")]
    UnknownScope(String),
}

impl GraphError {
    /// Create an error from a plain message
    pub fn other(msg: impl Into<String>) -> Self {
        GraphError::Other(msg.into())
    }

    /// True when the whole parse aborted because a store write failed,
    /// leaving a partially populated scope behind.
    pub fn is_incomplete_graph(&self) -> bool {
        matches!(self, GraphError::Store(_))
    }
}

impl From<anyhow::Error> for GraphError {
    fn from(err: anyhow::Error) -> Self {
        GraphError::Other(format!("{:#}", err))
    }
}
