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

//! The stat-override table (`<admindir>/statoverride`): owner, group and
//! mode overrides applied on top of whatever a package's archive member
//! says, for paths where the administrator wants different on-disk
//! permissions (classic example: a setuid helper that must not be
//! world-writable regardless of what the `.deb` ships).

use crate::db::atomic;
use crate::db::error::Error;
use std::path::Path;

/// One user or group reference in a stat-override entry: either resolved
/// by name, or a bare numeric id that had no corresponding system
/// account at the time it was recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Owner {
    /// A `passwd`/`group` name.
    Name(String),
    /// A numeric id with no resolvable name.
    Id(u32),
}

impl Owner {
    fn parse(field: &str) -> Self {
        if let Some(digits) = field.strip_prefix('#') {
            if let Ok(id) = digits.parse() {
                return Owner::Id(id);
            }
        }
        if let Ok(id) = field.parse() {
            return Owner::Id(id);
        }
        Owner::Name(field.to_owned())
    }

    fn format(&self) -> String {
        match self {
            Owner::Name(name) => name.clone(),
            Owner::Id(id) => format!("#{id}"),
        }
    }
}

/// One recorded override: the path's desired owner, group and mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatOverride {
    /// Owning user.
    pub user: Owner,
    /// Owning group.
    pub group: Owner,
    /// Permission bits (no file-type bits; e.g. `0o4755`).
    pub mode: u32,
    /// Absolute path the override applies to.
    pub path: String,
}

/// The in-memory stat-override table, loaded from and saved back to
/// `<admindir>/statoverride`.
#[derive(Clone, Debug, Default)]
pub struct StatOverrideStore {
    entries: Vec<StatOverride>,
}

impl StatOverrideStore {
    /// Load the stat-override table at `path`. A missing file is treated
    /// as an empty table.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(path, e)),
        };

        let mut entries = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.splitn(4, ' ');
            let user = fields.next().ok_or_else(|| malformed(path, line))?;
            let group = fields.next().ok_or_else(|| malformed(path, line))?;
            let mode = fields.next().ok_or_else(|| malformed(path, line))?;
            let file_path = fields.next().ok_or_else(|| malformed(path, line))?;

            let mode = u32::from_str_radix(mode, 8).map_err(|_| malformed(path, line))?;
            entries.push(StatOverride {
                user: Owner::parse(user),
                group: Owner::parse(group),
                mode,
                path: file_path.to_owned(),
            });
        }

        Ok(Self { entries })
    }

    /// Atomically write the table back to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!(
                "{} {} {:o} {}\n",
                entry.user.format(),
                entry.group.format(),
                entry.mode,
                entry.path
            ));
        }
        atomic::rewrite(path, out.as_bytes())
    }

    /// All recorded overrides.
    pub fn entries(&self) -> &[StatOverride] {
        &self.entries
    }

    /// Look up the override for `path`, if any.
    pub fn find(&self, path: &str) -> Option<&StatOverride> {
        self.entries.iter().find(|o| o.path == path)
    }

    /// Add an override, rejecting a second override for the same path,
    /// a path containing a newline, or a non-absolute path.
    pub fn add(&mut self, entry: StatOverride) -> Result<(), Error> {
        if entry.path.contains('\n') {
            return Err(Error::DuplicateEntry(
                "path may not contain newlines".into(),
            ));
        }
        if !entry.path.starts_with('/') {
            return Err(Error::DuplicateEntry("path must be absolute".into()));
        }
        if self.find(&entry.path).is_some() {
            return Err(Error::DuplicateEntry(format!(
                "an override for {} already exists",
                entry.path
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Remove the override for `path`, if any. Returns whether an entry
    /// was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|o| o.path != path);
        self.entries.len() != before
    }
}

fn malformed(path: &Path, line: &str) -> Error {
    Error::MalformedEntry {
        path: path.to_owned(),
        detail: format!("malformed stat-override line: {line:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_named_and_numeric_owners() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("statoverride");

        let mut store = StatOverrideStore::default();
        store
            .add(StatOverride {
                user: Owner::Name("root".into()),
                group: Owner::Name("root".into()),
                mode: 0o4755,
                path: "/usr/bin/suid-helper".into(),
            })
            .unwrap();
        store
            .add(StatOverride {
                user: Owner::Id(1234),
                group: Owner::Id(1234),
                mode: 0o644,
                path: "/etc/orphaned.conf".into(),
            })
            .unwrap();
        store.save(&path).unwrap();

        let loaded = StatOverrideStore::load(&path).unwrap();
        assert_eq!(loaded.entries().len(), 2);
        let suid = loaded.find("/usr/bin/suid-helper").unwrap();
        assert_eq!(suid.mode, 0o4755);
        assert_eq!(suid.user, Owner::Name("root".into()));

        let orphaned = loaded.find("/etc/orphaned.conf").unwrap();
        assert_eq!(orphaned.user, Owner::Id(1234));
    }

    #[test]
    fn test_add_rejects_relative_path_and_duplicate() {
        let mut store = StatOverrideStore::default();
        assert!(store
            .add(StatOverride {
                user: Owner::Name("root".into()),
                group: Owner::Name("root".into()),
                mode: 0o644,
                path: "relative".into(),
            })
            .is_err());

        store
            .add(StatOverride {
                user: Owner::Name("root".into()),
                group: Owner::Name("root".into()),
                mode: 0o644,
                path: "/etc/foo".into(),
            })
            .unwrap();
        assert!(store
            .add(StatOverride {
                user: Owner::Name("root".into()),
                group: Owner::Name("root".into()),
                mode: 0o600,
                path: "/etc/foo".into(),
            })
            .is_err());
    }
}

// vim: foldmethod=marker
