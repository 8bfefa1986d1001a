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

//! Errors raised while building or extracting a binary archive.

use std::path::PathBuf;

/// Failures specific to the ar-wrapped binary archive format.
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

    /// The file does not begin with the ar global header.
    #[error("file is not a debian binary archive (try dpkg-split?)")]
    NotAnArchive,

    /// An ar member header failed the `` `\n`` trailer check.
    #[error("archive member header is corrupt")]
    CorruptHeader,

    /// The `debian-binary` member is missing or not the first member.
    #[error("archive has no debian-binary member, or not in the first position")]
    MissingFormatMember,

    /// The `debian-binary` member's version line didn't parse, or named an
    /// unsupported major version.
    #[error("unsupported archive format version: {0}")]
    UnsupportedFormatVersion(String),

    /// Two control members were present.
    #[error("archive contains two control members")]
    DuplicateControlMember,

    /// Two data members were present.
    #[error("archive contains two data members")]
    DuplicateDataMember,

    /// A `control.tar[.ext]` member appeared after `data.tar[.ext]`.
    #[error("archive has control.tar after data.tar")]
    ControlAfterData,

    /// The data member's name didn't match a known compressor extension.
    #[error("archive contains an unrecognized data member: {0}")]
    UnknownDataMember(String),

    /// A required member (`control.tar.*` or `data.tar.*`) was absent.
    #[error("archive is missing its {0} member")]
    MissingMember(&'static str),

    /// A subprocess (`tar`, or a compressor) exited non-zero or could not be
    /// spawned.
    #[error("subprocess `{program}` failed: {detail}")]
    Subprocess {
        /// Program that was run.
        program: String,
        /// stderr tail, or spawn error text.
        detail: String,
    },

    /// `DEBIAN/control` was missing from the source tree being built.
    #[error("package control file is missing from the build directory")]
    MissingControlFile,

    /// `DEBIAN/` is missing, not a directory, or has permissions outside
    /// `(mode & 07757) == 0755`.
    #[error("control directory has bad permissions {0:03o} (must be >=0755 and <=0775)")]
    BadControlDirPermissions(u32),

    /// A maintainer script on disk is neither a symlink nor a regular file.
    #[error("maintainer script '{0}' is not a plain file or symlink")]
    MaintainerScriptNotPlain(&'static str),

    /// A maintainer script's permissions fall outside
    /// `(mode & 07557) == 0555`.
    #[error("maintainer script '{script}' has bad permissions {mode:03o} (must be >=0555 and <=0775)")]
    BadScriptPermissions {
        /// Script file name (`preinst`, `postinst`, ...).
        script: &'static str,
        /// Masked mode bits that failed the check.
        mode: u32,
    },

    /// The package name in `DEBIAN/control` doesn't match
    /// `[a-z0-9][a-z0-9+.-]*`.
    #[error("package name '{0}' has characters that aren't lowercase alphanums or '-+.'")]
    InvalidPackageName(String),

    /// `DEBIAN/conffiles` contained an empty or whitespace-only line.
    #[error("empty and whitespace-only lines are not allowed in conffiles")]
    ConffileEmptyLine,

    /// A `DEBIAN/conffiles` line started with whitespace.
    #[error("line with conffile filename '{0}' has leading white spaces")]
    ConffileLeadingWhitespace(String),

    /// A `DEBIAN/conffiles` entry (after stripping any flag) isn't an
    /// absolute path.
    #[error("conffile name '{0}' is not an absolute pathname")]
    ConffileNotAbsolute(String),

    /// A `DEBIAN/conffiles` flag token wasn't `remove-on-upgrade`.
    #[error("unknown flag '{flag}' for conffile '{path}'")]
    ConffileUnknownFlag {
        /// Flag token as written.
        flag: String,
        /// Path it was attached to.
        path: String,
    },

    /// A `DEBIAN/conffiles` flag token had no path after it.
    #[error("conffile name missing after flag '{0}'")]
    ConffileMissingName(String),

    /// A non-`remove-on-upgrade` conffile entry names a path absent from
    /// the source tree.
    #[error("conffile '{0}' does not appear in package")]
    ConffileAbsentFromSource(String),

    /// A `remove-on-upgrade` conffile entry names a path that is present
    /// in the source tree.
    #[error("conffile '{0}' is present but is requested to be removed")]
    ConffilePresentButFlaggedRemove(String),

    /// A path being archived contains a newline and `--no-check` was not
    /// requested.
    #[error("newline not allowed in pathname '{0}'")]
    PathContainsNewline(String),
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
