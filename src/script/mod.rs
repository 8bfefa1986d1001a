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

//! The maintainer-script runner: `preinst`/`postinst`/`prerm`/`postrm`/
//! `config`, invoked from a package's info directory with the env/chroot/
//! signal discipline the source this is grounded on uses around
//! `fork`+`exec` of each script.

mod error;
pub use error::Error;

use crate::context::Context;
use crate::depgraph::PkginfoId;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(unix)]
use nix::sys::signal::{self, SigHandler, Signal};

/// Which maintainer script to run, named the way it appears on disk as
/// `<pkg>.<scriptname>` in the info directory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Script {
    PreInst,
    PostInst,
    PreRm,
    PostRm,
    Config,
}

impl Script {
    /// The on-disk filename suffix (also argv\[0\]).
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::PreInst => "preinst",
            Script::PostInst => "postinst",
            Script::PreRm => "prerm",
            Script::PostRm => "postrm",
            Script::Config => "config",
        }
    }
}

/// Everything [run] needs to know about the package the script belongs
/// to, independent of the [crate::depgraph::Arena] the caller keeps it
/// in.
pub struct ScriptPackage<'a> {
    /// Bare package name (`DPKG_MAINTSCRIPT_PACKAGE`).
    pub name: &'a str,
    /// Architecture name (`DPKG_MAINTSCRIPT_ARCH`).
    pub arch: &'a str,
    /// Number of arch-instances sharing this name
    /// (`DPKG_MAINTSCRIPT_PACKAGE_REFCOUNT`).
    pub refcount: usize,
    /// This crate's own version, reported as `DPKG_RUNNING_VERSION`.
    pub running_version: &'a str,
}

/// Outcome of a maintainer-script invocation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The script ran and exited zero.
    Ran,
    /// No such script exists in the info directory; not an error.
    Absent,
}

/// Path to `<pkg>[:<arch>].<scriptname>` in `ctx`'s info directory. Does
/// not consult the info-directory format version; callers that need the
/// exact on-disk name (format 0 vs format 1) should resolve it via
/// [crate::db::infodb] first and pass the resulting base name in as
/// `pkg_file_stem`.
pub fn script_path(ctx: &Context, pkg_file_stem: &str, script: Script) -> PathBuf {
    ctx.infodir().join(format!("{pkg_file_stem}.{}", script.as_str()))
}

/// Run one maintainer script with the standard argv/env/chroot/signal
/// protocol. `args` are the action-specific trailing argv entries (e.g.
/// `["configure", "1.2-1"]`). Returns [Outcome::Absent] without spawning
/// anything if the script file does not exist.
pub fn run(
    ctx: &Context,
    pkg: &ScriptPackage,
    script: Script,
    script_path: &Path,
    args: &[&str],
) -> Result<Outcome, Error> {
    let metadata = match std::fs::metadata(script_path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Outcome::Absent),
        Err(e) => return Err(Error::io(script_path, e)),
    };

    ensure_executable(script_path, &metadata)?;

    let do_chroot = !ctx.force.contains(crate::force::Thing::ScriptChrootless) && !ctx.instdir.as_os_str().is_empty();

    let mut cmd = if do_chroot {
        if !ctx.admindir.starts_with(&ctx.instdir) {
            return Err(Error::AdmindirNotInInstdir);
        }
        // Exec must target the path as it will resolve *after* the
        // chroot(), not the host-absolute path.
        Command::new(chroot_relative_path(ctx, script_path))
    } else {
        Command::new(script_path)
    };
    cmd.arg0(script.as_str());
    cmd.args(args);
    cmd.env("DPKG_MAINTSCRIPT_PACKAGE", pkg.name);
    cmd.env("DPKG_MAINTSCRIPT_PACKAGE_REFCOUNT", pkg.refcount.to_string());
    cmd.env("DPKG_MAINTSCRIPT_ARCH", pkg.arch);
    cmd.env("DPKG_MAINTSCRIPT_NAME", script.as_str());
    cmd.env("DPKG_MAINTSCRIPT_DEBUG", "0");
    cmd.env("DPKG_RUNNING_VERSION", pkg.running_version);

    if do_chroot {
        let relative_admindir = ctx.admindir.strip_prefix(&ctx.instdir).unwrap_or(&ctx.admindir);
        cmd.env("DPKG_ADMINDIR", PathBuf::from("/").join(relative_admindir));

        let instdir = ctx.instdir.clone();
        // SAFETY: chroot+chdir in the child between fork and exec, before
        // any other thread could observe the changed filesystem root.
        unsafe {
            cmd.pre_exec(move || {
                nix::unistd::chroot(&instdir)?;
                nix::unistd::chdir("/")?;
                Ok(())
            });
        }
    } else {
        cmd.env("DPKG_ADMINDIR", &ctx.admindir);
    }

    run_with_signals_ignored(cmd, script.as_str())?;
    Ok(Outcome::Ran)
}

fn ensure_executable(path: &Path, metadata: &std::fs::Metadata) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    let mode = metadata.permissions().mode();
    if mode & 0o555 != 0o555 {
        let mut perms = metadata.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

fn chroot_relative_path(ctx: &Context, script_path: &Path) -> PathBuf {
    match script_path.strip_prefix(&ctx.instdir) {
        Ok(rel) => PathBuf::from("/").join(rel),
        Err(_) => script_path.to_owned(),
    }
}

/// Ignore `SIGQUIT`/`SIGINT` for the duration of the child's run,
/// restoring the previous disposition once it's reaped, then translate
/// its exit into a `script`-scoped [Error] on failure.
fn run_with_signals_ignored(mut cmd: Command, script_name: &str) -> Result<(), Error> {
    // SAFETY: SigIgn is async-signal-safe and we restore the previous
    // handler on every exit path below.
    let (prev_quit, prev_int) = unsafe {
        (
            signal::signal(Signal::SIGQUIT, SigHandler::SigIgn).ok(),
            signal::signal(Signal::SIGINT, SigHandler::SigIgn).ok(),
        )
    };

    let spawn_result = cmd.status();

    unsafe {
        if let Some(h) = prev_quit {
            let _ = signal::signal(Signal::SIGQUIT, h);
        }
        if let Some(h) = prev_int {
            let _ = signal::signal(Signal::SIGINT, h);
        }
    }

    let status = spawn_result.map_err(|e| Error::io(PathBuf::from(script_name), e))?;
    interpret_status(status, script_name)
}

fn interpret_status(status: std::process::ExitStatus, script_name: &str) -> Result<(), Error> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(Error::NonZeroExit {
            script: script_name.to_owned(),
            code,
        });
    }
    if let Some(signal) = status.signal() {
        return Err(Error::KilledBySignal {
            script: script_name.to_owned(),
            signal,
            core_dumped: status.core_dumped(),
        });
    }
    Err(Error::UnknownWaitStatus {
        script: script_name.to_owned(),
    })
}

/// Run `scriptname` from `pkg`'s *new* (about-to-be-installed) version's
/// info directory; if missing, falls back to nothing (caller decides
/// whether that's fatal). Used for `preinst`/`postinst`/`config` and for
/// the new-version half of [run_old_then_new_fallback].
pub fn run_new(
    ctx: &Context,
    pkg: &ScriptPackage,
    script: Script,
    new_info_stem: &str,
    args: &[&str],
) -> Result<Outcome, Error> {
    let path = script_path(ctx, new_info_stem, script);
    run(ctx, pkg, script, &path, args)
}

/// `prerm`/`postrm` upgrade-fallback protocol: try the *old* (currently
/// installed) version's script first with `ifok` appended to argv; on
/// failure (including the old script simply being absent for a normal
/// install), fall back to the *new* version's script with `iffallback`.
/// If the new version has no such script either, returns
/// [Error::NoFallbackScript].
#[allow(clippy::too_many_arguments)]
pub fn run_old_then_new_fallback(
    ctx: &Context,
    pkg: &ScriptPackage,
    script: Script,
    old_info_stem: &str,
    new_info_stem: &str,
    ifok: &str,
    iffallback: &str,
    new_version: &str,
) -> Result<Outcome, Error> {
    let old_path = script_path(ctx, old_info_stem, script);
    let old_outcome = run(ctx, pkg, script, &old_path, &[ifok, new_version]);

    match old_outcome {
        Ok(Outcome::Ran) => return Ok(Outcome::Ran),
        Ok(Outcome::Absent) => {}
        Err(_) => {}
    }

    let new_path = script_path(ctx, new_info_stem, script);
    match run(ctx, pkg, script, &new_path, &[iffallback, new_version]) {
        Ok(Outcome::Ran) => Ok(Outcome::Ran),
        Ok(Outcome::Absent) => Err(Error::NoFallbackScript),
        Err(e) => Err(e),
    }
}

/// Whether `post_postinst_tasks` should leave the package in
/// `TriggersAwaited`/`TriggersPending`/`Installed` rather than whatever
/// `new_status` names outright, mirroring the source's own "postinst is
/// special" status-clamping rule.
pub fn clamp_post_postinst_status(
    trigaw_pending: bool,
    trigpend_pending: bool,
    new_status: crate::depgraph::Status,
) -> crate::depgraph::Status {
    use crate::depgraph::Status;
    if matches!(
        new_status,
        Status::NotInstalled
            | Status::ConfigFiles
            | Status::HalfInstalled
            | Status::Unpacked
            | Status::HalfConfigured
    ) {
        return new_status;
    }
    if trigaw_pending {
        Status::TriggersAwaited
    } else if trigpend_pending {
        Status::TriggersPending
    } else {
        Status::Installed
    }
}

/// Number of arch-instances of `pkg`'s [crate::depgraph::Pkgset] that are
/// at least unpacked, reported as `DPKG_MAINTSCRIPT_PACKAGE_REFCOUNT`.
pub fn refcount(arena: &crate::depgraph::Arena, pkg: PkginfoId) -> usize {
    let set = arena.pkginfo(pkg).set;
    arena
        .set(set)
        .instances
        .iter()
        .filter(|id| arena.pkginfo(**id).status.is_at_least_unpacked())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_script(path: &Path, body: &str) {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_absent_script_is_not_an_error() {
        let dir = tempdir().unwrap();
        let ctx = Context::new("/").with_admindir(dir.path());
        let pkg = ScriptPackage {
            name: "foo",
            arch: "amd64",
            refcount: 1,
            running_version: "1.0",
        };
        let path = dir.path().join("foo.postinst");
        let outcome = run(&ctx, &pkg, Script::PostInst, &path, &["configure", ""]).unwrap();
        assert_eq!(outcome, Outcome::Absent);
    }

    #[test]
    fn test_script_runs_and_succeeds() {
        let dir = tempdir().unwrap();
        let ctx = Context::new("").with_admindir(dir.path());
        let path = dir.path().join("foo.postinst");
        write_script(&path, "exit 0");

        let pkg = ScriptPackage {
            name: "foo",
            arch: "amd64",
            refcount: 1,
            running_version: "1.0",
        };
        let outcome = run(&ctx, &pkg, Script::PostInst, &path, &["configure", ""]).unwrap();
        assert_eq!(outcome, Outcome::Ran);
    }

    #[test]
    fn test_nonzero_exit_is_reported() {
        let dir = tempdir().unwrap();
        let ctx = Context::new("").with_admindir(dir.path());
        let path = dir.path().join("foo.prerm");
        write_script(&path, "exit 3");

        let pkg = ScriptPackage {
            name: "foo",
            arch: "amd64",
            refcount: 1,
            running_version: "1.0",
        };
        let err = run(&ctx, &pkg, Script::PreRm, &path, &["remove"]).unwrap_err();
        assert!(matches!(err, Error::NonZeroExit { code: 3, .. }));
    }

    #[test]
    fn test_non_executable_script_is_chmodded_then_runs() {
        let dir = tempdir().unwrap();
        let ctx = Context::new("").with_admindir(dir.path());
        let path = dir.path().join("foo.postinst");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();

        let pkg = ScriptPackage {
            name: "foo",
            arch: "amd64",
            refcount: 1,
            running_version: "1.0",
        };
        let outcome = run(&ctx, &pkg, Script::PostInst, &path, &["configure", ""]).unwrap();
        assert_eq!(outcome, Outcome::Ran);
    }
}

// vim: foldmethod=marker
