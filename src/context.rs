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

//! Replaces the process-wide globals (admin directory root, force flags,
//! status-fd, per-package error budget) with one explicit struct threaded
//! through every operation that needs them.

use crate::force::Force;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything that used to be a global in the source this crate's design
/// is grounded on: the admin directory location, the force-flag set, the
/// optional progress stream, and the per-run error budget. Constructed
/// once at process startup and passed by reference into library calls --
/// nothing in the crate reaches for ambient/global state.
pub struct Context {
    /// `DPKG_ROOT` -- the filesystem root packages are installed under.
    /// Defaults to `/`.
    pub instdir: PathBuf,

    /// `DPKG_ADMINDIR` -- holds `status`, `available`, `info/`, `lock`,
    /// `diversions`, `statoverride`. Defaults to `<instdir>/var/lib/dpkg`.
    pub admindir: PathBuf,

    /// Force-flag set in effect for this run.
    pub force: Force,

    /// Optional descriptor front-ends can read `status:` progress lines
    /// from. `None` means no progress reporting.
    pub status_fd: Option<std::fs::File>,

    /// Number of per-package failures tolerated before the run aborts
    /// (`--abort-after`, default 50).
    pub errabort: u32,

    /// Failures accumulated so far this run.
    failed: Vec<String>,

    /// True once `--abort-after` has tripped.
    aborted: bool,
}

impl Context {
    /// Build a [Context] rooted at `instdir`, with the admin directory
    /// computed the conventional way (`<instdir>/var/lib/dpkg`).
    pub fn new(instdir: impl Into<PathBuf>) -> Self {
        let instdir = instdir.into();
        let admindir = instdir.join("var/lib/dpkg");
        Self {
            instdir,
            admindir,
            force: Force::none(),
            status_fd: None,
            errabort: 50,
            failed: Vec::new(),
            aborted: false,
        }
    }

    /// Override the admin directory independently of `instdir`
    /// (`DPKG_ADMINDIR`).
    pub fn with_admindir(mut self, admindir: impl Into<PathBuf>) -> Self {
        self.admindir = admindir.into();
        self
    }

    /// Path to the advisory lock file (`<admindir>/lock`).
    pub fn lock_path(&self) -> PathBuf {
        self.admindir.join("lock")
    }

    /// Path to the status database file.
    pub fn status_path(&self) -> PathBuf {
        self.admindir.join("status")
    }

    /// Path to the available-package database file.
    pub fn available_path(&self) -> PathBuf {
        self.admindir.join("available")
    }

    /// Path to the diversions table.
    pub fn diversions_path(&self) -> PathBuf {
        self.admindir.join("diversions")
    }

    /// Path to the stat-override table.
    pub fn statoverride_path(&self) -> PathBuf {
        self.admindir.join("statoverride")
    }

    /// Path to the per-package info directory.
    pub fn infodir(&self) -> PathBuf {
        self.admindir.join("info")
    }

    /// Resolve a path under `instdir` (e.g. a package-owned file).
    pub fn in_root(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        match path.strip_prefix("/") {
            Ok(rel) => self.instdir.join(rel),
            Err(_) => self.instdir.join(path),
        }
    }

    /// Emit a `status: <line>` progress record to the status-fd, if one is
    /// configured. Never fatal on write failure -- a disconnected progress
    /// consumer should not abort the run.
    pub fn emit_status(&mut self, line: &str) {
        if let Some(fd) = self.status_fd.as_mut() {
            let _ = writeln!(fd, "status: {line}");
        }
    }

    /// Record that `package` failed processing this run. Returns `true` if
    /// this pushed the run past `errabort`, in which case the caller
    /// should stop dequeuing new work.
    pub fn record_failure(&mut self, package: impl Into<String>) -> bool {
        self.failed.push(package.into());
        if self.failed.len() as u32 >= self.errabort {
            self.aborted = true;
        }
        self.aborted
    }

    /// Names of packages that failed processing this run, in the order
    /// they failed.
    pub fn failures(&self) -> &[String] {
        &self.failed
    }

    /// True once `--abort-after` has tripped and processing halted.
    pub fn aborted(&self) -> bool {
        self.aborted
    }
}


// vim: foldmethod=marker
