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

//! Errors raised while running a maintainer script.

use std::path::PathBuf;

/// Failures specific to maintainer-script execution.
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

    /// `admindir` is not a descendant of `instdir`, so it cannot be
    /// expressed as a chroot-relative path.
    #[error("admindir must be inside instdir for dpkg to work properly")]
    AdmindirNotInInstdir,

    /// The script exited with a non-zero status.
    #[error("{script} returned error exit status {code}")]
    NonZeroExit {
        /// Script name (e.g. `postinst`).
        script: String,
        /// Exit code returned.
        code: i32,
    },

    /// The script was killed by a signal.
    #[error("{script} was killed by signal {signal}, core_dumped={core_dumped}")]
    KilledBySignal {
        /// Script name.
        script: String,
        /// Signal number that killed it.
        signal: i32,
        /// Whether the process dumped core.
        core_dumped: bool,
    },

    /// The subprocess exited with a status this platform could not decode.
    #[error("subprocess for {script} failed with an unknown wait status")]
    UnknownWaitStatus {
        /// Script name.
        script: String,
    },

    /// The prerm/postrm of the old version failed, and the new version
    /// does not ship a fallback script either.
    #[error("there is no script in the new version of the package - giving up")]
    NoFallbackScript,
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
