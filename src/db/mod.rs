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

//! The on-disk package database: `status`/`available` ([status]), the
//! advisory [lock::Lock], the [atomic::rewrite] protocol both files share,
//! and the diversion/stat-override stores.

pub mod atomic;
mod divert;
mod error;
pub mod infodb;
mod lock;
mod statoverride;
pub mod status;

pub use divert::{Diversion, DiversionStore};
pub use error::Error;
pub use lock::Lock;
pub use statoverride::{Owner, StatOverride, StatOverrideStore};

use crate::context::Context;
use crate::depgraph::{Arena, Snapshot};

/// Mirrors `modstatdb_open`'s mode argument: how a [Database] session may
/// touch the on-disk files.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// No writes permitted; no lock taken.
    ReadOnly,
    /// Full read/write access; takes the admin-directory lock.
    Write,
    /// Like [OpenMode::Write], but the caller has already checked for
    /// superuser privileges (kept as a distinct mode so callers can tell
    /// the two apart in logs, matching the source this is grounded on).
    NeedSuperuser,
    /// Only the `available` file is writable; `status` is read-only.
    AvailableReadOnly,
}

impl OpenMode {
    fn takes_lock(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::NeedSuperuser)
    }

    fn status_writable(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::NeedSuperuser)
    }

    fn available_writable(self) -> bool {
        matches!(
            self,
            OpenMode::Write | OpenMode::NeedSuperuser | OpenMode::AvailableReadOnly
        )
    }
}

/// An open package-database session: the in-memory [Arena] plus the mode
/// it was opened under, holding the admin-directory lock for the
/// session's lifetime when the mode requires one.
pub struct Database {
    mode: OpenMode,
    arena: Arena,
    _lock: Option<Lock>,
}

impl Database {
    /// Load `status` (and `available`, if present) from `ctx.admindir`
    /// into a fresh [Arena], taking the advisory lock first when `mode`
    /// requires write access (`modstatdb_open`).
    pub fn open(ctx: &Context, mode: OpenMode) -> Result<Self, Error> {
        let lock = if mode.takes_lock() {
            Some(Lock::acquire(&ctx.lock_path())?)
        } else {
            None
        };

        let mut arena = Arena::new();
        status::load(&ctx.status_path(), &mut arena, Snapshot::Installed)?;
        status::load(&ctx.available_path(), &mut arena, Snapshot::Available)?;

        Ok(Self {
            mode,
            arena,
            _lock: lock,
        })
    }

    /// Borrow the in-memory package graph.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutably borrow the in-memory package graph.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Write the `status` file back to disk via the atomic-rewrite
    /// protocol, and emit a `status:` progress line for `pkg`
    /// (`modstatdb_note`). Fails if the database wasn't opened for
    /// writing.
    pub fn note(&self, ctx: &mut Context, pkg: &str) -> Result<(), Error> {
        if !self.mode.status_writable() {
            return Err(Error::NotWritable);
        }
        let contents = status::dump(&self.arena, Snapshot::Installed);
        atomic::rewrite(&ctx.status_path(), contents.as_bytes())?;
        ctx.emit_status(pkg);
        Ok(())
    }

    /// Write the `available` file back to disk via the atomic-rewrite
    /// protocol.
    pub fn note_available(&self, ctx: &Context) -> Result<(), Error> {
        if !self.mode.available_writable() {
            return Err(Error::NotWritable);
        }
        let contents = status::dump(&self.arena, Snapshot::Available);
        atomic::rewrite(&ctx.available_path(), contents.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_empty_admindir_is_ok() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("var/lib/dpkg")).unwrap();
        let ctx = Context::new(dir.path());
        let db = Database::open(&ctx, OpenMode::ReadOnly).unwrap();
        assert_eq!(db.arena().pkginfo_ids().count(), 0);
    }

    #[test]
    fn test_readonly_note_is_rejected() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("var/lib/dpkg")).unwrap();
        let mut ctx = Context::new(dir.path());
        let db = Database::open(&ctx, OpenMode::ReadOnly).unwrap();
        assert!(matches!(db.note(&mut ctx, "foo"), Err(Error::NotWritable)));
    }

    #[test]
    fn test_write_mode_roundtrips_status() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("var/lib/dpkg")).unwrap();
        let mut ctx = Context::new(dir.path());

        {
            let mut db = Database::open(&ctx, OpenMode::Write).unwrap();
            let set = db.arena_mut().ensure_set("foo");
            let id = db
                .arena_mut()
                .ensure_instance(set, crate::architecture::Architecture::Amd64);
            let info = db.arena_mut().pkginfo_mut(id);
            info.status = crate::depgraph::Status::Installed;
            info.want = crate::depgraph::Want::Install;
            info.installed = Some(crate::depgraph::Pkgbin {
                version: "1.0-1".parse().unwrap(),
                maintainer: "A <a@example.com>".into(),
                description: "desc".into(),
                multi_arch_same: false,
                dependencies: Vec::new(),
                conffiles: Vec::new(),
                extra_fields: Default::default(),
            });
            db.note(&mut ctx, "foo").unwrap();
        }

        let db = Database::open(&ctx, OpenMode::ReadOnly).unwrap();
        let set = db.arena().find_set("foo").unwrap();
        let id = db
            .arena()
            .instance_of(set, &crate::architecture::Architecture::Amd64)
            .unwrap();
        assert_eq!(db.arena().pkginfo(id).status, crate::depgraph::Status::Installed);
    }
}

// vim: foldmethod=marker
