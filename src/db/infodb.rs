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

//! The `info/` directory: per-package control files (`list`, `md5sums`,
//! `conffiles`, the maintainer scripts, `triggers`, `symbols`, `shlibs`),
//! named either `<pkgname>.<ext>` (format 0) or, once a package sets
//! `Multi-Arch: same` and the database has been upgraded,
//! `<pkgname>:<arch>.<ext>` (format 1). The format is recorded in a single
//! `info/format` file; a missing file means format 0.

use crate::architecture::Architecture;
use crate::db::atomic;
use crate::db::error::Error;
use crate::depgraph::{Arena, PkgsetId, Status};
use std::path::{Path, PathBuf};

/// The on-disk layout of the `info/` directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// `<pkgname>.<ext>`, one set of files per package name regardless of
    /// how many architectures are installed under it.
    Legacy,
    /// `<pkgname>:<arch>.<ext>` for any package with `Multi-Arch: same`;
    /// plain `<pkgname>.<ext>` for everything else.
    MultiArch,
}

impl Format {
    fn as_u32(self) -> u32 {
        match self {
            Format::Legacy => 0,
            Format::MultiArch => 1,
        }
    }

    fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Format::Legacy),
            1 => Some(Format::MultiArch),
            _ => None,
        }
    }
}

/// Path to the `info/format` file.
fn format_path(ctx: &crate::context::Context) -> PathBuf {
    ctx.infodir().join("format")
}

/// Read the current database format, defaulting to [Format::Legacy] when
/// `info/format` does not exist (`pkg_infodb_parse_format`).
pub fn read_format(ctx: &crate::context::Context) -> Result<Format, Error> {
    let path = format_path(ctx);
    let contents = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Format::Legacy),
        Err(e) => return Err(Error::io(&path, e)),
    };
    let value: u32 = contents.trim().parse().map_err(|_| Error::MalformedEntry {
        path: path.clone(),
        detail: format!("not an integer: {:?}", contents.trim()),
    })?;
    Format::from_u32(value).ok_or_else(|| Error::MalformedEntry {
        path,
        detail: format!("unknown info database format {value}"),
    })
}

/// Write `info/format`, via the same atomic rewrite protocol as `status`
/// and `available`.
pub fn write_format(ctx: &crate::context::Context, format: Format) -> Result<(), Error> {
    std::fs::create_dir_all(ctx.infodir()).map_err(|e| Error::io(ctx.infodir(), e))?;
    atomic::rewrite(&format_path(ctx), format!("{}\n", format.as_u32()).as_bytes())
}

/// Whether `pkg`'s installed snapshot should be addressed by its
/// arch-qualified name under the current database format
/// (`pkg_infodb_get_file`'s `multiarch == multiarch_same` check).
fn uses_arch_qualified_name(multi_arch_same: bool, format: Format) -> bool {
    multi_arch_same && format == Format::MultiArch
}

/// The basename (without extension) info files for this package are
/// stored under: `pkgname` or `pkgname:arch`.
pub fn stem(pkg_name: &str, arch: &Architecture, multi_arch_same: bool, format: Format) -> String {
    if uses_arch_qualified_name(multi_arch_same, format) {
        format!("{pkg_name}:{arch}")
    } else {
        pkg_name.to_owned()
    }
}

/// Full path to one control file, e.g. `info/foo.list` or
/// `info/foo:amd64.postinst`.
pub fn file_path(
    ctx: &crate::context::Context,
    pkg_name: &str,
    arch: &Architecture,
    multi_arch_same: bool,
    format: Format,
    ext: &str,
) -> PathBuf {
    ctx.infodir()
        .join(format!("{}.{ext}", stem(pkg_name, arch, multi_arch_same, format)))
}

/// True if the given control file exists (`pkg_infodb_has_file`).
pub fn has_file(
    ctx: &crate::context::Context,
    pkg_name: &str,
    arch: &Architecture,
    multi_arch_same: bool,
    format: Format,
    ext: &str,
) -> bool {
    file_path(ctx, pkg_name, arch, multi_arch_same, format, ext).exists()
}

/// One file belonging to a package, discovered by [foreach].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoFile {
    /// Full path on disk.
    pub path: PathBuf,
    /// Extension after the final dot (`list`, `postinst`, ...).
    pub filetype: String,
}

/// List every control file belonging to `pkg_name`/`arch` under the
/// current format (`pkg_infodb_foreach`).
pub fn foreach(
    ctx: &crate::context::Context,
    pkg_name: &str,
    arch: &Architecture,
    multi_arch_same: bool,
    format: Format,
) -> Result<Vec<InfoFile>, Error> {
    let wanted_stem = stem(pkg_name, arch, multi_arch_same, format);
    let dir = ctx.infodir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&dir, e)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let Some((this_stem, filetype)) = name.rsplit_once('.') else {
            continue;
        };
        if this_stem != wanted_stem {
            continue;
        }
        files.push(InfoFile {
            path: dir.join(name.as_ref()),
            filetype: filetype.to_owned(),
        });
    }
    Ok(files)
}

/// Upgrade the `info/` directory from format 0 to format 1: hardlink
/// every legacy `<pkgname>.<ext>` file whose package is installed with
/// `Multi-Arch: same` to its arch-qualified name, record the new format,
/// then drop the old names. Mirrors `pkg_infodb_upgrade_to_multiarch`'s
/// link-first, write-format-second, unlink-last ordering so an
/// interruption at any point leaves the database readable under its
/// previous format.
pub fn upgrade_to_multiarch(ctx: &crate::context::Context, arena: &Arena) -> Result<(), Error> {
    if read_format(ctx)? == Format::MultiArch {
        return Ok(());
    }

    let dir = ctx.infodir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(&dir, e)),
    };

    let mut renames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(&dir, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let Some((pkg_name, filetype)) = name.rsplit_once('.') else {
            continue;
        };
        if pkg_name.contains(':') {
            continue;
        }

        let Some(set) = arena.find_set(pkg_name) else {
            continue;
        };
        let Some(arch) = installed_multi_arch_same_arch(arena, set) else {
            continue;
        };

        let old_path = dir.join(&name);
        let new_path = dir.join(format!("{pkg_name}:{arch}.{filetype}"));
        match std::fs::hard_link(&old_path, &new_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(Error::io(&new_path, e)),
        }
        renames.push(old_path);
    }

    write_format(ctx, Format::MultiArch)?;

    for old_path in renames {
        if let Err(e) = std::fs::remove_file(&old_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(Error::io(&old_path, e));
            }
        }
    }

    Ok(())
}

/// The architecture of `set`'s installed, at-least-unpacked,
/// `Multi-Arch: same` instance, if it has exactly one such instance.
fn installed_multi_arch_same_arch(arena: &Arena, set: PkgsetId) -> Option<Architecture> {
    arena.set(set).instances.iter().find_map(|&id| {
        let info = arena.pkginfo(id);
        if info.status == Status::NotInstalled {
            return None;
        }
        let bin = info.installed.as_ref()?;
        if bin.multi_arch_same {
            Some(info.architecture.clone())
        } else {
            None
        }
    })
}

/// Convenience wrapper bundling a package's identity with the database
/// format, so callers don't have to keep re-threading four arguments
/// through every lookup.
pub struct PackageFiles<'a> {
    ctx: &'a crate::context::Context,
    pkg_name: &'a str,
    arch: &'a Architecture,
    multi_arch_same: bool,
    format: Format,
}

impl<'a> PackageFiles<'a> {
    /// Build a lookup bound to one package instance.
    pub fn new(
        ctx: &'a crate::context::Context,
        pkg_name: &'a str,
        arch: &'a Architecture,
        multi_arch_same: bool,
        format: Format,
    ) -> Self {
        Self {
            ctx,
            pkg_name,
            arch,
            multi_arch_same,
            format,
        }
    }

    /// The on-disk basename (no extension) for this package's files.
    pub fn stem(&self) -> String {
        stem(self.pkg_name, self.arch, self.multi_arch_same, self.format)
    }

    /// Path to one control file.
    pub fn path(&self, ext: &str) -> PathBuf {
        file_path(
            self.ctx,
            self.pkg_name,
            self.arch,
            self.multi_arch_same,
            self.format,
            ext,
        )
    }

    /// Whether the named control file exists.
    pub fn has(&self, ext: &str) -> bool {
        self.path(ext).exists()
    }

    /// Every control file currently on disk for this package.
    pub fn files(&self) -> Result<Vec<InfoFile>, Error> {
        foreach(self.ctx, self.pkg_name, self.arch, self.multi_arch_same, self.format)
    }
}

/// True if `path` sits inside `ctx`'s info directory (used by callers
/// deciding whether a path came from [PackageFiles] or elsewhere).
pub fn is_info_path(ctx: &crate::context::Context, path: &Path) -> bool {
    path.starts_with(ctx.infodir())
}


// vim: foldmethod=marker
