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

//! The write-new/fsync/rename-old/rename-new/fsync-parent protocol shared
//! by every admin-directory file that must never be observed half-written:
//! `status`, `available`, the `diversions` triple, and the `statoverride`
//! triple.

use crate::db::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Atomically replace `path` with `contents`, keeping a `<path>-old`
/// backup of whatever was there before (absent on the first write).
pub fn rewrite(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let new_path = sibling(path, "-new");
    let old_path = sibling(path, "-old");

    {
        let mut file = File::create(&new_path).map_err(|e| Error::io(&new_path, e))?;
        file.write_all(contents)
            .map_err(|e| Error::io(&new_path, e))?;
        file.sync_all().map_err(|e| Error::io(&new_path, e))?;
    }

    if path.exists() {
        std::fs::rename(path, &old_path).map_err(|e| Error::io(&old_path, e))?;
    }
    std::fs::rename(&new_path, path).map_err(|e| Error::io(path, e))?;

    sync_parent(path)?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn sync_parent(path: &Path) -> Result<(), Error> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let dir = File::open(parent).map_err(|e| Error::io(parent, e))?;
    dir.sync_all().map_err(|e| Error::io(parent, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rewrite_creates_and_replaces() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status");

        rewrite(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
        assert!(!sibling(&path, "-old").exists());

        rewrite(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read(sibling(&path, "-old")).unwrap(), b"first");
        assert!(!sibling(&path, "-new").exists());
    }
}

// vim: foldmethod=marker
