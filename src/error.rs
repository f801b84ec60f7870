//! Error taxonomy for the compiler.
//!
//! Modeled on `prql-compiler`'s hand-rolled `Error`/`Reason` split: one
//! plain struct callers can match against, wrapping a closed reason enum.
//! Unlike the parser this crate has no source spans to annotate, so none of
//! `prql-compiler`'s `ariadne`-backed diagnostic rendering is needed here.

use std::fmt;

/// One of the four reportable failure kinds a compile can produce.
///
/// All are fatal: nothing in this crate recovers from one internally, they
/// are surfaced to the caller with a descriptive message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced table has no name.
    Relation(String),
    /// A `Select` invariant was violated (e.g. the group-by prefix law).
    Internal(String),
    /// A query shape, operator, or literal kind this compiler does not
    /// implement.
    Unsupported(String),
    /// A column was formatted against a relation that has no alias, even
    /// though aliases are required.
    Lookup(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
}

impl Error {
    pub fn relation<S: Into<String>>(msg: S) -> Self {
        Error { kind: ErrorKind::Relation(msg.into()) }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error { kind: ErrorKind::Internal(msg.into()) }
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error { kind: ErrorKind::Unsupported(msg.into()) }
    }

    pub fn lookup<S: Into<String>>(msg: S) -> Self {
        Error { kind: ErrorKind::Lookup(msg.into()) }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Relation(msg) => write!(f, "relation error: {msg}"),
            ErrorKind::Internal(msg) => write!(f, "internal error: {msg}"),
            ErrorKind::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            ErrorKind::Lookup(msg) => write!(f, "lookup error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
