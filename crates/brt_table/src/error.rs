//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// Transparent wrapper for [`serde_json::Error`]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// read of {length} bytes at {offset:#x} exceeds buffer of {size:#x} bytes
    #[error("read of {length} bytes at {offset:#x} exceeds buffer of {size:#x} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        size: usize,
    },

    /// unsupported brt format {0}
    #[error("unsupported brt format {0}")]
    UnsupportedFormat(u32),

    /// unresolved reference
    #[error("unresolved reference")]
    UnresolvedReference(#[from] UnresolvedReference),

    /// tables cannot be merged
    #[error("tables cannot be merged")]
    #[diagnostic(help("both documents must come from the same table and the same game"))]
    IncompatibleMerge(#[from] MergeConflict),

    /// format requires an instance guid
    #[error("format requires an instance guid")]
    MissingInstanceGuid,

    /// record shape does not match the document format
    #[error("{0} record shape does not match the document format")]
    VariantMismatch(&'static str),

    /// invalid guid {0}
    #[error("invalid guid {0:?}")]
    InvalidGuid(String),

    /// invalid hash {0}
    #[error("invalid hash {0:?}")]
    InvalidHash(String),

    /// string table offset {0:#x} does not fit a string reference
    #[error("string table offset {0:#x} does not fit a string reference")]
    StringTableOverflow(usize),

    /// invalid string reference at {0:#x}
    #[error("invalid string reference at {0:#x}")]
    InvalidStringReference(i16),

    /// unable to read duplication sheet
    #[error("unable to read duplication sheet: {0}")]
    DuplicateSheet(String),

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Error type to provide further information when a reference cannot be resolved
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("unresolved reference")]
pub enum UnresolvedReference {
    /// no asset lookup for {path} ({hash})
    #[error("no asset lookup for {path} ({hash})")]
    Hash { path: String, hash: u64 },

    /// to bundle {0}
    #[error("to bundle {0}")]
    Bundle(i32),

    /// to bundle ref {0}
    #[error("to bundle ref {0}")]
    BundleRef(i32),

    /// to asset {0}
    #[error("to asset {0}")]
    Asset(i32),
}

/// Error type to explain why two documents cannot be merged
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
#[error("tables cannot be merged")]
pub enum MergeConflict {
    /// table names differ: {0} vs {1}
    #[error("table names differ: {0} vs {1}")]
    TableName(String, String),

    /// formats differ: {0} vs {1}
    #[error("formats differ: {0} vs {1}")]
    Format(u32, u32),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
