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

//! Errors raised while removing or purging a package.

use std::path::PathBuf;

/// Failures specific to the removal/purge lifecycle.
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

    /// Other installed packages still depend on this one.
    #[error("{package} is depended on by {}, not removing", .dependents.join(", "))]
    DependencyProblems {
        /// Package that was asked to be removed.
        package: String,
        /// Names of packages still depending on it.
        dependents: Vec<String>,
    },

    /// The package is marked `Essential: yes` and `--force-remove-essential`
    /// was not given.
    #[error("{0} is an essential package - it should not be removed")]
    EssentialPackage(String),

    /// The package is marked `Protected: yes` and `--force-remove-essential`
    /// was not given.
    #[error("{0} is a protected package - it should not be removed")]
    ProtectedPackage(String),

    /// The package failed partway through a previous run and must be
    /// reinstalled, not just removed, unless forced.
    #[error("{0} is in a very bad inconsistent state - reinstall it before removing")]
    ReinstallRequired(String),

    /// The maintainer-script runner reported a failure.
    #[error("maintainer script failed: {0}")]
    Script(#[from] crate::script::Error),

    /// The on-disk package database reported a failure.
    #[error("database error: {0}")]
    Db(#[from] crate::db::Error),
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
