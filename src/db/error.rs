// {{{ Copyright (c) Paul R. Tagliamonte <paultag@debian.org>, 2024
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE. }}}

//! Errors raised by the package database: status/available parsing,
//! atomic rewrite, locking, and the diversion/stat-override stores.

use std::path::PathBuf;

/// Failures specific to the on-disk package database.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying filesystem operation failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// Path the operation was attempted against.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A stanza failed to parse as RFC822.
    #[error("malformed stanza in {path}: {detail}")]
    MalformedStanza {
        /// File the stanza came from.
        path: PathBuf,
        /// Human-readable detail.
        detail: String,
    },

    /// A required field was missing from a stanza.
    #[error("stanza in {path} is missing required field {field}")]
    MissingField {
        /// File the stanza came from.
        path: PathBuf,
        /// Field name that was absent.
        field: &'static str,
    },

    /// The `Status` field's three-word value didn't parse.
    #[error("malformed Status field: {0}")]
    MalformedStatusField(String),

    /// The admin directory's advisory lock is already held elsewhere.
    #[error("cannot lock admin directory: {0}")]
    Locked(String),

    /// A write-mode operation was attempted on a database opened read-only.
    #[error("database was not opened for writing")]
    NotWritable,

    /// A diversion or stat-override line was malformed.
    #[error("malformed entry in {path}: {detail}")]
    MalformedEntry {
        /// File the entry came from.
        path: PathBuf,
        /// Human-readable detail.
        detail: String,
    },

    /// An add would create a second stat-override for the same path, or a
    /// second diversion for the same path pair.
    #[error("{0}")]
    DuplicateEntry(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// vim: foldmethod=marker
