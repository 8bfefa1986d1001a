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

//! Building and extracting the `.deb` binary archive format: an
//! [ar]-wrapped pair of tarballs (`control.tar<ext>`, `data.tar<ext>`)
//! behind a one-line `debian-binary` format marker, plus read-only
//! support for the pre-2.0 concatenated-tarball layout.

pub mod ar;
pub mod codec;
mod error;

pub use codec::Codec;
pub use error::Error;

use ar::Member;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the format-marker member, always first.
pub const ADMIN_MEMBER: &str = "debian-binary";
/// Current format version emitted by [build].
pub const CURRENT_FORMAT: &str = "2.0\n";
/// Legacy concatenated-tarball format marker prefix.
const LEGACY_MAGIC_PREFIX: &str = "0.93";

/// Parameters controlling [build]'s tarball compression and validation.
#[derive(Copy, Clone, Debug)]
pub struct BuildParams {
    /// Codec applied to both the control and data tarballs.
    pub codec: Codec,
    /// Skip the newline-in-pathname check (`--no-check`).
    pub no_check: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            codec: Codec::Gzip,
            no_check: false,
        }
    }
}

/// Maintainer scripts [check_file_perms] enforces mode `0555` on.
#[cfg(feature = "serde")]
const MAINTAINER_SCRIPTS: [&str; 5] = ["preinst", "postinst", "prerm", "postrm", "config"];

/// Step 1: `DEBIAN/` must satisfy `(mode & 07757) == 0755`; each present
/// maintainer script must be a plain file or symlink, and if a plain
/// file, satisfy `(mode & 07557) == 0555`.
#[cfg(feature = "serde")]
fn check_file_perms(debian_dir: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;

    let meta = std::fs::metadata(debian_dir).map_err(|e| Error::io(debian_dir, e))?;
    if meta.permissions().mode() & 0o7757 != 0o755 {
        return Err(Error::BadControlDirPermissions(meta.permissions().mode() & 0o7777));
    }

    for script in MAINTAINER_SCRIPTS {
        let path = debian_dir.join(script);
        let meta = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::io(&path, e)),
        };
        if meta.file_type().is_symlink() {
            continue;
        }
        if !meta.is_file() {
            return Err(Error::MaintainerScriptNotPlain(script));
        }
        if meta.permissions().mode() & 0o7557 != 0o555 {
            return Err(Error::BadScriptPermissions {
                script,
                mode: meta.permissions().mode() & 0o7777,
            });
        }
    }
    Ok(())
}

/// Step 2: package names are `[a-z0-9][a-z0-9+.-]*`.
#[cfg(feature = "serde")]
fn package_name_is_valid(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '-'))
}

/// Step 3: parse and validate `DEBIAN/conffiles`, if present. Absent
/// entries whose path isn't found under `source_dir` are fatal unless
/// flagged `remove-on-upgrade`, in which case a path that *does* exist is
/// the error instead. Duplicate entries only warn, via `tracing`.
#[cfg(feature = "serde")]
fn check_conffiles(debian_dir: &Path, source_dir: &Path) -> Result<(), Error> {
    let path = debian_dir.join("conffiles");
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(&path, e)),
    };

    let mut seen = std::collections::HashSet::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            return Err(Error::ConffileEmptyLine);
        }
        if line.starts_with(char::is_whitespace) {
            return Err(Error::ConffileLeadingWhitespace(line.trim_start().to_owned()));
        }

        let (conffile, remove_on_upgrade) = if line.starts_with('/') {
            (line.to_owned(), false)
        } else {
            let mut parts = line.splitn(2, ' ');
            let flag = parts.next().unwrap_or_default();
            let rest = match parts.next() {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
                _ => return Err(Error::ConffileNotAbsolute(line.to_owned())),
            };
            if rest.is_empty() {
                return Err(Error::ConffileMissingName(flag.to_owned()));
            }
            if flag != "remove-on-upgrade" {
                return Err(Error::ConffileUnknownFlag {
                    flag: flag.to_owned(),
                    path: rest.to_owned(),
                });
            }
            (rest.to_owned(), true)
        };

        let on_disk = source_dir.join(conffile.trim_start_matches('/'));
        let exists = on_disk.symlink_metadata().is_ok();
        if remove_on_upgrade {
            if exists {
                return Err(Error::ConffilePresentButFlaggedRemove(conffile));
            }
        } else if !exists {
            return Err(Error::ConffileAbsentFromSource(conffile));
        }

        if !seen.insert(conffile.clone()) {
            tracing::warn!(%conffile, "conffile name is duplicated");
        }
    }

    Ok(())
}

/// The handful of `DEBIAN/control` fields [build] itself needs to
/// validate before archiving; the full binary-control stanza lives in
/// the package database once installed (see [crate::db]).
#[cfg(feature = "serde")]
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ControlStanza {
    package: String,
    architecture: Option<String>,
}

/// Build a `.deb` at `dest` from the source tree rooted at `source_dir`
/// (which must contain a `DEBIAN/` control directory alongside the
/// payload to be installed).
#[cfg(feature = "serde")]
pub fn build(source_dir: &Path, dest: &Path, params: BuildParams) -> Result<(), Error> {
    let debian_dir = source_dir.join("DEBIAN");
    if !debian_dir.is_dir() {
        return Err(Error::MissingControlFile);
    }

    check_file_perms(&debian_dir)?;

    let control_path = debian_dir.join("control");
    let control_text =
        std::fs::read_to_string(&control_path).map_err(|e| Error::io(&control_path, e))?;
    let control: ControlStanza =
        crate::control::de::from_str(&control_text).map_err(|_| Error::MissingControlFile)?;
    if control.package.is_empty() || control.architecture.is_none() {
        return Err(Error::MissingControlFile);
    }
    if !package_name_is_valid(&control.package) {
        return Err(Error::InvalidPackageName(control.package.clone()));
    }

    check_conffiles(&debian_dir, source_dir)?;

    let entries = collect_entries(source_dir, &debian_dir)?;
    if !params.no_check {
        for entry in &entries {
            if let Some(s) = entry.to_str() {
                if s.contains('\n') {
                    return Err(Error::PathContainsNewline(s.to_owned()));
                }
            }
        }
    }

    let timestamp = source_date_epoch();

    let control_tar = tar_directory(&debian_dir, timestamp)?;
    let data_tar = tar_directory_excluding(source_dir, &entries, timestamp)?;

    let control_member = Member {
        name: format!("control.tar{}", params.codec.extension()),
        data: params.codec.compress(&control_tar)?,
    };
    let data_member = Member {
        name: format!("data.tar{}", params.codec.extension()),
        data: params.codec.compress(&data_tar)?,
    };
    let format_member = Member {
        name: ADMIN_MEMBER.to_owned(),
        data: CURRENT_FORMAT.as_bytes().to_vec(),
    };

    let archive = ar::write_archive(&[format_member, control_member, data_member]);
    std::fs::write(dest, archive).map_err(|e| Error::io(dest, e))
}

fn source_date_epoch() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
}

fn tar_directory(dir: &Path, mtime: u64) -> Result<Vec<u8>, Error> {
    run_tar_create(dir, &["-cf", "-", "--format=gnu", &mtime_arg(mtime), "--clamp-mtime", "."])
}

fn tar_directory_excluding(root: &Path, entries: &[PathBuf], mtime: u64) -> Result<Vec<u8>, Error> {
    let mut names = Vec::new();
    for entry in entries {
        names.extend_from_slice(entry.as_os_str().as_encoded_bytes());
        names.push(0);
    }

    let mut child = Command::new("tar")
        .current_dir(root)
        .args([
            "-cf",
            "-",
            "--format=gnu",
            &mtime_arg(mtime),
            "--clamp-mtime",
            "--null",
            "--no-unquote",
            "--no-recursion",
            "-T",
            "-",
        ])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Subprocess {
            program: "tar".into(),
            detail: e.to_string(),
        })?;

    let mut stdin = child.stdin.take().expect("piped stdin");
    std::thread::spawn(move || {
        let _ = stdin.write_all(&names);
    });

    wait_collect_stdout(child, "tar")
}

fn run_tar_create(dir: &Path, args: &[&str]) -> Result<Vec<u8>, Error> {
    let child = Command::new("tar")
        .current_dir(dir)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Subprocess {
            program: "tar".into(),
            detail: e.to_string(),
        })?;
    wait_collect_stdout(child, "tar")
}

fn wait_collect_stdout(mut child: std::process::Child, program: &str) -> Result<Vec<u8>, Error> {
    use std::io::Read;
    let mut output = Vec::new();
    child
        .stdout
        .take()
        .expect("piped stdout")
        .read_to_end(&mut output)
        .map_err(|e| Error::Subprocess {
            program: program.to_owned(),
            detail: e.to_string(),
        })?;
    let status = child.wait().map_err(|e| Error::Subprocess {
        program: program.to_owned(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        let mut stderr = String::new();
        if let Some(mut e) = child.stderr.take() {
            let _ = e.read_to_string(&mut stderr);
        }
        return Err(Error::Subprocess {
            program: program.to_owned(),
            detail: stderr,
        });
    }
    Ok(output)
}

fn mtime_arg(mtime: u64) -> String {
    format!("--mtime=@{mtime}")
}

/// Symlinks are re-ordered to sort after every non-symlink entry, so a
/// symlink's referent is always unpacked first.
fn collect_entries(root: &Path, exclude: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    let mut symlinks = Vec::new();
    walk(root, exclude, root, &mut files, &mut symlinks)?;
    files.extend(symlinks);
    Ok(files)
}

fn walk(
    root: &Path,
    exclude: &Path,
    dir: &Path,
    files: &mut Vec<PathBuf>,
    symlinks: &mut Vec<PathBuf>,
) -> Result<(), Error> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if path == exclude {
            continue;
        }
        let rel = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let meta = std::fs::symlink_metadata(&path).map_err(|e| Error::io(&path, e))?;
        if meta.is_symlink() {
            symlinks.push(rel);
        } else if meta.is_dir() {
            files.push(rel);
            walk(root, exclude, &path, files, symlinks)?;
        } else {
            files.push(rel);
        }
    }
    Ok(())
}

/// Extract a `.deb`'s payload tarball into `dest`, creating it if
/// missing. When `admin` is set, the control tarball is extracted
/// instead of the data tarball.
pub fn extract(archive: &Path, dest: &Path, admin: bool) -> Result<(), Error> {
    let bytes = std::fs::read(archive).map_err(|e| Error::io(archive, e))?;

    let member = select_member(&bytes, admin)?;
    let codec = codec_for_member(&member.name)?;
    let plaintext = codec.decompress(&member.data)?;

    if !dest.exists() {
        std::fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    }

    let mut child = Command::new("tar")
        .current_dir(dest)
        .env("TAR_OPTIONS", "")
        .args(["-xf", "-", "--warning=no-timestamp"])
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Subprocess {
            program: "tar".into(),
            detail: e.to_string(),
        })?;
    child
        .stdin
        .take()
        .expect("piped stdin")
        .write_all(&plaintext)
        .map_err(|e| Error::Subprocess {
            program: "tar".into(),
            detail: e.to_string(),
        })?;
    let status = child.wait().map_err(|e| Error::Subprocess {
        program: "tar".into(),
        detail: e.to_string(),
    })?;
    if !status.success() {
        return Err(Error::Subprocess {
            program: "tar".into(),
            detail: "extraction failed".into(),
        });
    }
    Ok(())
}

enum RawMember {
    Ar(ar::Member),
    /// Legacy-format payload: already-concatenated gzip bytes for the
    /// member requested (control or data), isolated by byte range.
    Legacy(Vec<u8>, &'static str),
}

impl RawMember {
    fn into_member(self) -> ar::Member {
        match self {
            RawMember::Ar(m) => m,
            RawMember::Legacy(data, name) => ar::Member {
                name: name.to_owned(),
                data,
            },
        }
    }
}

fn select_member(bytes: &[u8], admin: bool) -> Result<ar::Member, Error> {
    if bytes.starts_with(ar::GLOBAL_MAGIC) {
        return select_member_2_0(bytes, admin).map(RawMember::into_member);
    }
    if bytes.len() >= 8 && std::str::from_utf8(&bytes[..8]).is_ok_and(|s| s.starts_with(LEGACY_MAGIC_PREFIX)) {
        return select_member_legacy(bytes, admin).map(RawMember::into_member);
    }
    Err(Error::NotAnArchive)
}

fn select_member_2_0(bytes: &[u8], admin: bool) -> Result<RawMember, Error> {
    let members = ar::read_archive(bytes)?;
    let mut iter = members.into_iter();

    let first = iter.next().ok_or(Error::MissingFormatMember)?;
    if first.name != ADMIN_MEMBER {
        return Err(Error::MissingFormatMember);
    }
    let version = String::from_utf8_lossy(&first.data);
    if !version.trim().starts_with('2') {
        return Err(Error::UnsupportedFormatVersion(version.trim().to_owned()));
    }

    let mut control: Option<ar::Member> = None;
    let mut data: Option<ar::Member> = None;

    for member in iter {
        if member.name.starts_with('_') {
            continue;
        }
        if let Some(ext) = member.name.strip_prefix("control.tar") {
            if Codec::from_extension(ext).is_none() {
                return Err(Error::UnknownDataMember(member.name));
            }
            if control.is_some() {
                return Err(Error::DuplicateControlMember);
            }
            if data.is_some() {
                return Err(Error::ControlAfterData);
            }
            control = Some(member);
        } else if let Some(ext) = member.name.strip_prefix("data.tar") {
            if Codec::from_extension(ext).is_none() {
                return Err(Error::UnknownDataMember(member.name));
            }
            if data.is_some() {
                return Err(Error::DuplicateDataMember);
            }
            data = Some(member);
        } else {
            return Err(Error::UnknownDataMember(member.name));
        }
    }

    let chosen = if admin { control } else { data };
    chosen
        .map(RawMember::Ar)
        .ok_or(Error::MissingMember(if admin { "control.tar" } else { "data.tar" }))
}

fn select_member_legacy(bytes: &[u8], admin: bool) -> Result<RawMember, Error> {
    let first_nl = bytes.iter().position(|b| *b == b'\n').ok_or(Error::CorruptHeader)?;
    let rest = &bytes[first_nl + 1..];
    let second_nl = rest.iter().position(|b| *b == b'\n').ok_or(Error::CorruptHeader)?;
    let ctrl_len: usize = std::str::from_utf8(&rest[..second_nl])
        .map_err(|_| Error::CorruptHeader)?
        .trim()
        .parse()
        .map_err(|_| Error::CorruptHeader)?;

    let payload = &rest[second_nl + 1..];
    if payload.len() < ctrl_len {
        return Err(Error::CorruptHeader);
    }
    let (control_bytes, data_bytes) = payload.split_at(ctrl_len);

    if admin {
        Ok(RawMember::Legacy(control_bytes.to_vec(), "control.tar.gz"))
    } else {
        Ok(RawMember::Legacy(data_bytes.to_vec(), "data.tar.gz"))
    }
}

fn codec_for_member(name: &str) -> Result<Codec, Error> {
    let ext = name
        .strip_prefix("control.tar")
        .or_else(|| name.strip_prefix("data.tar"))
        .ok_or_else(|| Error::UnknownDataMember(name.to_owned()))?;
    Codec::from_extension(ext).ok_or_else(|| Error::UnknownDataMember(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "serde")]
    fn test_package_name_validation() {
        assert!(package_name_is_valid("foo"));
        assert!(package_name_is_valid("foo-bar+baz.1"));
        assert!(!package_name_is_valid(""));
        assert!(!package_name_is_valid("-foo"));
        assert!(!package_name_is_valid("Foo"));
        assert!(!package_name_is_valid("foo_bar"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_check_conffiles_accepts_empty_and_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        let debian_dir = dir.path().join("DEBIAN");
        std::fs::create_dir_all(&debian_dir).unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/foo.conf"), b"x").unwrap();
        std::fs::write(
            debian_dir.join("conffiles"),
            "/etc/foo.conf\nremove-on-upgrade /etc/gone.conf\n",
        )
        .unwrap();
        check_conffiles(&debian_dir, dir.path()).unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_check_conffiles_rejects_missing_normal_entry() {
        let dir = tempfile::tempdir().unwrap();
        let debian_dir = dir.path().join("DEBIAN");
        std::fs::create_dir_all(&debian_dir).unwrap();
        std::fs::write(debian_dir.join("conffiles"), "/etc/missing.conf\n").unwrap();
        assert!(matches!(
            check_conffiles(&debian_dir, dir.path()),
            Err(Error::ConffileAbsentFromSource(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_check_conffiles_rejects_leading_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let debian_dir = dir.path().join("DEBIAN");
        std::fs::create_dir_all(&debian_dir).unwrap();
        std::fs::write(debian_dir.join("conffiles"), " /etc/foo.conf\n").unwrap();
        assert!(matches!(
            check_conffiles(&debian_dir, dir.path()),
            Err(Error::ConffileLeadingWhitespace(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_check_conffiles_rejects_present_remove_on_upgrade() {
        let dir = tempfile::tempdir().unwrap();
        let debian_dir = dir.path().join("DEBIAN");
        std::fs::create_dir_all(&debian_dir).unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::write(dir.path().join("etc/foo.conf"), b"x").unwrap();
        std::fs::write(
            debian_dir.join("conffiles"),
            "remove-on-upgrade /etc/foo.conf\n",
        )
        .unwrap();
        assert!(matches!(
            check_conffiles(&debian_dir, dir.path()),
            Err(Error::ConffilePresentButFlaggedRemove(_))
        ));
    }

    #[test]
    fn test_select_member_2_0_picks_data_by_default() {
        let members = [
            ar::Member {
                name: ADMIN_MEMBER.to_owned(),
                data: CURRENT_FORMAT.as_bytes().to_vec(),
            },
            ar::Member {
                name: "control.tar".to_owned(),
                data: b"control-body".to_vec(),
            },
            ar::Member {
                name: "data.tar".to_owned(),
                data: b"data-body".to_vec(),
            },
        ];
        let bytes = ar::write_archive(&members);

        let data_member = select_member(&bytes, false).unwrap();
        assert_eq!(data_member.data, b"data-body");

        let control_member = select_member(&bytes, true).unwrap();
        assert_eq!(control_member.data, b"control-body");
    }

    #[test]
    fn test_duplicate_control_is_rejected() {
        let members = [
            ar::Member {
                name: ADMIN_MEMBER.to_owned(),
                data: CURRENT_FORMAT.as_bytes().to_vec(),
            },
            ar::Member {
                name: "control.tar".to_owned(),
                data: b"one".to_vec(),
            },
            ar::Member {
                name: "control.tar.gz".to_owned(),
                data: b"two".to_vec(),
            },
            ar::Member {
                name: "data.tar".to_owned(),
                data: b"data".to_vec(),
            },
        ];
        let bytes = ar::write_archive(&members);
        assert!(matches!(
            select_member(&bytes, false),
            Err(Error::DuplicateControlMember)
        ));
    }

    #[test]
    fn test_duplicate_data_is_rejected() {
        let members = [
            ar::Member {
                name: ADMIN_MEMBER.to_owned(),
                data: CURRENT_FORMAT.as_bytes().to_vec(),
            },
            ar::Member {
                name: "control.tar".to_owned(),
                data: b"control".to_vec(),
            },
            ar::Member {
                name: "data.tar".to_owned(),
                data: b"one".to_vec(),
            },
            ar::Member {
                name: "data.tar.gz".to_owned(),
                data: b"two".to_vec(),
            },
        ];
        let bytes = ar::write_archive(&members);
        assert!(matches!(
            select_member(&bytes, false),
            Err(Error::DuplicateDataMember)
        ));
    }

    #[test]
    fn test_control_after_data_is_rejected() {
        let members = [
            ar::Member {
                name: ADMIN_MEMBER.to_owned(),
                data: CURRENT_FORMAT.as_bytes().to_vec(),
            },
            ar::Member {
                name: "data.tar".to_owned(),
                data: b"data".to_vec(),
            },
            ar::Member {
                name: "control.tar".to_owned(),
                data: b"control".to_vec(),
            },
        ];
        let bytes = ar::write_archive(&members);
        assert!(matches!(
            select_member(&bytes, false),
            Err(Error::ControlAfterData)
        ));
    }

    #[test]
    fn test_legacy_format_splits_on_ctrl_length() {
        let control = b"CTRLDATA";
        let data = b"PAYLOAD!!";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"0.939000");
        bytes.push(b'\n');
        bytes.extend_from_slice(control.len().to_string().as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(control);
        bytes.extend_from_slice(data);

        let ctrl_member = select_member(&bytes, true).unwrap();
        assert_eq!(ctrl_member.data, control);
        let data_member = select_member(&bytes, false).unwrap();
        assert_eq!(data_member.data, data);
    }
}

// vim: foldmethod=marker
