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

//! The diversion table (`<admindir>/diversions`): triples of
//! `from`/`to`/`package-or-local` lines redirecting a path that would
//! otherwise conflict between packages.

use crate::db::atomic;
use crate::db::error::Error;
use std::path::Path;

/// One diverted path: `from` is the path a package would normally
/// install to, `to` is where it's actually placed, `by` is the
/// diverting package (`None` for a local/administrator diversion, the
/// file's bare `:` marker).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diversion {
    /// Path as shipped by the conflicting package(s).
    pub from: String,
    /// Path the file is actually installed at instead.
    pub to: String,
    /// Package that owns this diversion, or `None` for a local one.
    pub by: Option<String>,
}

/// The in-memory diversion table, loaded from and saved back to
/// `<admindir>/diversions`.
#[derive(Clone, Debug, Default)]
pub struct DiversionStore {
    entries: Vec<Diversion>,
}

impl DiversionStore {
    /// Load the diversion table at `path`. A missing file is treated as
    /// an empty table.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::io(path, e)),
        };

        let mut lines = text.lines();
        let mut entries = Vec::new();
        loop {
            let Some(from) = lines.next() else { break };
            let to = lines.next().ok_or_else(|| Error::MalformedEntry {
                path: path.to_owned(),
                detail: "truncated diversion triple".into(),
            })?;
            let by = lines.next().ok_or_else(|| Error::MalformedEntry {
                path: path.to_owned(),
                detail: "truncated diversion triple".into(),
            })?;
            entries.push(Diversion {
                from: from.to_owned(),
                to: to.to_owned(),
                by: if by == ":" { None } else { Some(by.to_owned()) },
            });
        }

        Ok(Self { entries })
    }

    /// Atomically write the table back to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.from);
            out.push('\n');
            out.push_str(&entry.to);
            out.push('\n');
            out.push_str(entry.by.as_deref().unwrap_or(":"));
            out.push('\n');
        }
        atomic::rewrite(path, out.as_bytes())
    }

    /// All recorded diversions.
    pub fn entries(&self) -> &[Diversion] {
        &self.entries
    }

    /// Look up the diversion whose `from` is `path`, if any.
    pub fn find_from(&self, path: &str) -> Option<&Diversion> {
        self.entries.iter().find(|d| d.from == path)
    }

    /// Add a diversion, rejecting a second diversion on either path of
    /// the pair (`from` or `to` already appearing in an existing entry).
    pub fn add(&mut self, diversion: Diversion) -> Result<(), Error> {
        let clash = self.entries.iter().any(|d| {
            d.from == diversion.from
                || d.to == diversion.to
                || d.from == diversion.to
                || d.to == diversion.from
        });
        if clash {
            return Err(Error::DuplicateEntry(format!(
                "a diversion already involves {} or {}",
                diversion.from, diversion.to
            )));
        }
        self.entries.push(diversion);
        Ok(())
    }

    /// Remove the diversion whose `from` is `path`, if any. Returns
    /// whether an entry was removed.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|d| d.from != path);
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_roundtrip_local_and_package_diversions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("diversions");

        let mut store = DiversionStore::default();
        store
            .add(Diversion {
                from: "/usr/bin/foo".into(),
                to: "/usr/bin/foo.orig".into(),
                by: None,
            })
            .unwrap();
        store
            .add(Diversion {
                from: "/usr/bin/bar".into(),
                to: "/usr/bin/bar.real".into(),
                by: Some("bar-alt".into()),
            })
            .unwrap();
        store.save(&path).unwrap();

        let loaded = DiversionStore::load(&path).unwrap();
        assert_eq!(loaded.entries().len(), 2);
        assert_eq!(loaded.find_from("/usr/bin/foo").unwrap().by, None);
        assert_eq!(
            loaded.find_from("/usr/bin/bar").unwrap().by.as_deref(),
            Some("bar-alt")
        );
    }

    #[test]
    fn test_add_rejects_path_reuse() {
        let mut store = DiversionStore::default();
        store
            .add(Diversion {
                from: "/a".into(),
                to: "/b".into(),
                by: None,
            })
            .unwrap();
        assert!(store
            .add(Diversion {
                from: "/a".into(),
                to: "/c".into(),
                by: None,
            })
            .is_err());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let store = DiversionStore::load(Path::new("/nonexistent/diversions")).unwrap();
        assert!(store.entries().is_empty());
    }
}

// vim: foldmethod=marker
