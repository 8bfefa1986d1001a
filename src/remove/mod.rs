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

//! The removal/purge lifecycle: check that nothing still depends on a
//! package, run its maintainer scripts, and walk its owned files in
//! reverse order (so directories follow their contents) before dropping
//! it to `config-files` or, on purge, `not-installed`.

mod error;
pub use error::Error;

use crate::context::Context;
use crate::db::infodb::{self, Format, PackageFiles};
use crate::depgraph::{Arena, Conffile, DepType, DependencyGroup, Istobe, PkginfoId, Status, Want};
use crate::force::Thing;
use crate::script::{self, Outcome, Script, ScriptPackage};
use crate::solver::{arch_satisfies, provides_is_satisfied_excluding, version_satisfies};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const REMOVE_CONFF_EXTS: &[&str] = &["dpkg-new", "dpkg-old", "dpkg-dist", "dpkg-tmp", "dpkg-bak"];

/// Whether a removal should stop at `config-files` or go all the way to
/// `not-installed`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Leave conffiles in place (`want = deinstall`).
    Remove,
    /// Delete conffiles too (`want = purge`).
    Purge,
}

/// Names of installed packages that still need `pkg` -- direct dependers,
/// and dependers on any virtual package `pkg` provides -- evaluated as if
/// `pkg` were already gone. Empty means the package is safe to remove.
pub fn blocking_dependents(ctx: &Context, arena: &Arena, pkg: PkginfoId) -> Vec<String> {
    let mut blockers = Vec::new();
    collect_blockers(ctx, arena, pkg, pkg, &mut blockers);

    if let Some(bin) = &arena.pkginfo(pkg).installed {
        for group in bin.groups_of(DepType::Provides) {
            for &possi_id in &group.possibilities {
                let possi = arena.possibility(possi_id);
                let Some(set) = arena.find_set(&possi.target) else {
                    continue;
                };
                for inst in arena.set(set).instances.iter().copied() {
                    collect_blockers(ctx, arena, pkg, inst, &mut blockers);
                }
            }
        }
    }

    blockers.sort();
    blockers.dedup();
    blockers
}

fn collect_blockers(
    ctx: &Context,
    arena: &Arena,
    pkg_being_removed: PkginfoId,
    watched: PkginfoId,
    out: &mut Vec<String>,
) {
    for &possi_id in &arena.pkginfo(watched).depended_installed {
        let possi = arena.possibility(possi_id);
        if !matches!(possi.dep_type, DepType::Depends | DepType::PreDepends) {
            continue;
        }

        let depender = possi.up;
        if depender == pkg_being_removed {
            continue;
        }
        let depender_info = arena.pkginfo(depender);
        if !matches!(
            depender_info.status,
            Status::Installed | Status::TriggersPending | Status::TriggersAwaited
        ) {
            continue;
        }
        if arena.clientdata(depender).istobe == Istobe::Remove {
            continue;
        }

        let Some(group) = owning_group(arena, depender, possi_id) else {
            continue;
        };
        if !group_satisfied_excluding(ctx, arena, group, pkg_being_removed) {
            let name = arena.set(depender_info.set).name.clone();
            if !out.contains(&name) {
                out.push(name);
            }
        }
    }
}

fn owning_group(arena: &Arena, depender: PkginfoId, possi_id: crate::depgraph::PossiId) -> Option<&DependencyGroup> {
    let bin = arena.pkginfo(depender).installed.as_ref()?;
    bin.dependencies
        .iter()
        .find(|(_, g)| g.possibilities.contains(&possi_id))
        .map(|(_, g)| g)
}

/// Mirrors [crate::solver::check_positive]'s alternative search, but a
/// candidate equal to `exclude` is disregarded -- "would this still be
/// satisfied if `exclude` were already removed".
fn group_satisfied_excluding(
    ctx: &Context,
    arena: &Arena,
    group: &DependencyGroup,
    exclude: PkginfoId,
) -> bool {
    for &possi_id in &group.possibilities {
        let possi = arena.possibility(possi_id);
        if possi.cyclebreak.get() {
            return true;
        }

        let Some(target_set) = arena.find_set(&possi.target) else {
            continue;
        };

        for target in arena.set(target_set).instances.iter().copied() {
            if target == exclude {
                continue;
            }
            let target_info = arena.pkginfo(target);
            let Some(bin) = &target_info.installed else {
                continue;
            };
            if !arch_satisfies(possi.target_arch.as_ref(), bin.multi_arch_same, &target_info.architecture) {
                continue;
            }
            if matches!(target_info.status, Status::Installed | Status::TriggersPending)
                && version_satisfies(possi, &bin.version)
            {
                return true;
            }
        }

        if possi.version.is_none() && provides_is_satisfied_excluding(arena, target_set, Some(exclude)) {
            return true;
        }
    }

    ctx.force.contains(Thing::Depends)
}

/// Refuse to remove an `Essential`/`Protected` package unless
/// `--force-remove-essential` is set.
pub fn check_essential(ctx: &Context, arena: &Arena, pkg: PkginfoId) -> Result<(), Error> {
    let info = arena.pkginfo(pkg);
    if info.status == Status::ConfigFiles {
        return Ok(());
    }
    if ctx.force.contains(Thing::RemoveEssential) {
        return Ok(());
    }
    if info.essential {
        return Err(Error::EssentialPackage(arena.set(info.set).name.clone()));
    }
    if info.protected {
        return Err(Error::ProtectedPackage(arena.set(info.set).name.clone()));
    }
    Ok(())
}

/// Refuse to remove a package left `reinst_required` by a previous failed
/// run unless `--force-remove-reinstreq` is set.
pub fn check_reinstreq(ctx: &Context, arena: &Arena, pkg: PkginfoId) -> Result<(), Error> {
    let info = arena.pkginfo(pkg);
    if info.eflags.reinst_required && !ctx.force.contains(Thing::RemoveReinstreq) {
        return Err(Error::ReinstallRequired(arena.set(info.set).name.clone()));
    }
    Ok(())
}

/// Read `info/<pkg>.list`: every path this package owns, in the order
/// recorded at unpack time.
pub fn owned_files(files: &PackageFiles) -> Result<Vec<String>, Error> {
    let path = files.path("list");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn directory_has_conffiles(conffiles: &[Conffile], dir: &str) -> bool {
    let prefix = format!("{}/", dir.trim_end_matches('/'));
    conffiles.iter().any(|c| c.path == dir || c.path.starts_with(&prefix))
}

/// Whether another installed package also lists `path` as its own --
/// shared ownership, most commonly a shared directory. Scans every other
/// package's `info/<pkg>.list`.
fn owned_elsewhere(
    ctx: &Context,
    arena: &Arena,
    format: Format,
    excluding: PkginfoId,
    path: &str,
) -> Result<bool, Error> {
    for id in arena.pkginfo_ids() {
        if id == excluding {
            continue;
        }
        let info = arena.pkginfo(id);
        if !info.status.is_at_least_unpacked() {
            continue;
        }
        let Some(bin) = &info.installed else {
            continue;
        };
        let set = arena.set(info.set);
        let files = PackageFiles::new(ctx, &set.name, &info.architecture, bin.multi_arch_same, format);
        if owned_files(&files)?.iter().any(|f| f == path) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `chmod 0600` a setuid/setgid/sticky file before unlinking it, so a
/// window between the permission change and the unlink can't be used to
/// exploit the old mode (`secure_unlink`).
fn secure_unlink(path: &Path) -> Result<(), Error> {
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & (0o4000 | 0o2000 | 0o1000) != 0 {
            let mut perms = metadata.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms).map_err(|e| Error::io(path, e))?;
        }
    }
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// True if `name` is a backup sibling of `base` (`<base>.dpkg-*`,
/// `<base>~<digits>~`, `#<base>#`).
fn is_backup_sibling(name: &str, base: &str) -> bool {
    if let Some(rest) = name.strip_prefix(base) {
        if REMOVE_CONFF_EXTS.iter().any(|ext| rest == format!(".{ext}")) {
            return true;
        }
        if let Some(tail) = rest.strip_prefix('~') {
            let digit_end = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
            return &tail[digit_end..] == "~";
        }
        return false;
    }
    name.starts_with('#') && name.strip_prefix('#').and_then(|r| r.strip_suffix('#')) == Some(base)
}

/// Remove `path` plus every backup-extension sibling sitting next to it
/// (`.dpkg-new`, `.dpkg-old`, `.dpkg-dist`, `.dpkg-tmp`, `.dpkg-bak`, and
/// `~`-numbered backups).
fn remove_with_backups(path: &Path) -> Result<(), Error> {
    secure_unlink(path)?;

    let Some(parent) = path.parent() else {
        return Ok(());
    };
    let Some(base) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(());
    };

    let entries = match std::fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(parent, e)),
    };
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(parent, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_backup_sibling(&name, base) {
            secure_unlink(&parent.join(name.as_ref()))?;
        }
    }
    Ok(())
}

/// One package identity bundle, so the removal entry points don't have to
/// repeat package name/arch/format on every call.
pub struct Target<'a> {
    /// Package instance being removed.
    pub pkg: PkginfoId,
    /// Name, for script env vars and messages.
    pub name: &'a str,
    /// Architecture, for script env vars.
    pub arch: &'a crate::architecture::Architecture,
    /// Current info-directory layout.
    pub format: Format,
}

/// Run the full remove step: dependent check, essential/reinstreq guards,
/// `prerm remove`, file walk, `postrm remove`, transition to
/// `config-files` (or straight to purge if there's no postrm and no
/// conffiles, per `removal_bulk`'s fast path).
pub fn remove(ctx: &mut Context, arena: &mut Arena, target: &Target) -> Result<(), Error> {
    check_essential(ctx, arena, target.pkg)?;
    check_reinstreq(ctx, arena, target.pkg)?;

    let blockers = blocking_dependents(ctx, arena, target.pkg);
    if !blockers.is_empty() {
        return Err(Error::DependencyProblems {
            package: target.name.to_owned(),
            dependents: blockers,
        });
    }

    let multi_arch_same = arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.multi_arch_same)
        .unwrap_or(false);
    let files = PackageFiles::new(ctx, target.name, target.arch, multi_arch_same, target.format);
    let refcount = script::refcount(arena, target.pkg);

    let info = arena.pkginfo_mut(target.pkg);
    let old_status = info.status;
    if old_status >= Status::HalfConfigured {
        info.status = Status::HalfInstalled;
    }
    let version = info
        .installed
        .as_ref()
        .map(|b| b.version.to_string())
        .unwrap_or_default();

    let script_pkg = ScriptPackage {
        name: target.name,
        arch: target.arch.as_str(),
        refcount,
        running_version: &version,
    };
    if old_status >= Status::HalfConfigured {
        let path = script::script_path(ctx, &files.stem(), Script::PreRm);
        script::run(ctx, &script_pkg, Script::PreRm, &path, &[Script::PreRm.as_str(), "remove"])?;
    }

    remove_owned_files(ctx, arena, target, &files)?;

    let path = script::script_path(ctx, &files.stem(), Script::PostRm);
    script::run(ctx, &script_pkg, Script::PostRm, &path, &[Script::PostRm.as_str(), "remove"])?;

    for info_file in infodb::foreach(ctx, target.name, target.arch, multi_arch_same, target.format)? {
        if info_file.filetype == "list" || info_file.filetype == "postrm" {
            continue;
        }
        std::fs::remove_file(&info_file.path).or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(Error::io(&info_file.path, e))
            }
        })?;
    }

    let info = arena.pkginfo_mut(target.pkg);
    info.status = Status::ConfigFiles;
    info.essential = false;
    info.protected = false;

    let has_conffiles = !arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.conffiles.is_empty())
        .unwrap_or(true);
    let has_postrm = infodb::has_file(ctx, target.name, target.arch, multi_arch_same, target.format, "postrm");

    if !has_postrm && !has_conffiles {
        arena.pkginfo_mut(target.pkg).want = Want::Purge;
    }

    Ok(())
}

fn remove_owned_files(
    ctx: &mut Context,
    arena: &Arena,
    target: &Target,
    files: &PackageFiles,
) -> Result<(), Error> {
    let owned = owned_files(files)?;
    let conffiles: Vec<Conffile> = arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.conffiles.clone())
        .unwrap_or_default();

    let mut leftover = Vec::new();
    for path in owned.iter().rev() {
        if is_old_conffile(&conffiles, path) {
            leftover.push(path.clone());
            continue;
        }

        let on_disk = ctx.in_root(path);
        let Ok(metadata) = std::fs::symlink_metadata(&on_disk) else {
            continue;
        };
        if metadata.is_dir() {
            if directory_has_conffiles(&conffiles, path)
                || owned_elsewhere(ctx, arena, target.format, target.pkg, path)?
            {
                leftover.push(path.clone());
                continue;
            }
            match std::fs::remove_dir(&on_disk) {
                Ok(()) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(_) => {
                    leftover.push(path.clone());
                    continue;
                }
            }
        }

        secure_unlink(&on_disk)?;
    }

    write_owned_files(files, &leftover)
}

fn is_old_conffile(conffiles: &[Conffile], path: &str) -> bool {
    conffiles.iter().any(|c| c.path == path && c.obsolete)
}

fn write_owned_files(files: &PackageFiles, remaining: &[String]) -> Result<(), Error> {
    let path = files.path("list");
    let contents = remaining
        .iter()
        .rev()
        .map(|p| format!("{p}\n"))
        .collect::<String>();
    std::fs::write(&path, contents).map_err(|e| Error::io(path, e))
}

/// Purge a package left at `config-files`: delete each conffile plus its
/// backup siblings, delete obsolete conffiles, run `postrm purge`, and
/// drop to `not-installed` with a blanked `installed` pkgbin.
pub fn purge(ctx: &mut Context, arena: &mut Arena, target: &Target) -> Result<(), Error> {
    let multi_arch_same = arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.multi_arch_same)
        .unwrap_or(false);
    let files = PackageFiles::new(ctx, target.name, target.arch, multi_arch_same, target.format);

    let conffiles = arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.conffiles.clone())
        .unwrap_or_default();
    for conffile in &conffiles {
        remove_with_backups(&ctx.in_root(&conffile.path))?;
    }

    let refcount = script::refcount(arena, target.pkg);
    let version = arena
        .pkginfo(target.pkg)
        .installed
        .as_ref()
        .map(|b| b.version.to_string())
        .unwrap_or_default();
    let script_pkg = ScriptPackage {
        name: target.name,
        arch: target.arch.as_str(),
        refcount,
        running_version: &version,
    };
    let path = script::script_path(ctx, &files.stem(), Script::PostRm);
    let outcome = script::run(ctx, &script_pkg, Script::PostRm, &path, &[Script::PostRm.as_str(), "purge"])?;
    if matches!(outcome, Outcome::Absent) {
        // Nothing to run; purging still proceeds.
    }

    for ext in ["list", "postrm"] {
        let p = files.path(ext);
        if let Err(e) = std::fs::remove_file(&p) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(Error::io(p, e));
            }
        }
    }

    let info = arena.pkginfo_mut(target.pkg);
    info.status = Status::NotInstalled;
    info.want = Want::Unknown;
    info.installed = None;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use crate::depgraph::{DependencyGroup, Pkgbin, Possibility, Snapshot};
    use std::cell::Cell;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn install(arena: &mut Arena, name: &str, conffiles: Vec<Conffile>) -> PkginfoId {
        let set = arena.ensure_set(name);
        let id = arena.ensure_instance(set, Architecture::Amd64);
        let info = arena.pkginfo_mut(id);
        info.status = Status::Installed;
        info.installed = Some(Pkgbin {
            version: "1.0".parse().unwrap(),
            maintainer: String::new(),
            description: String::new(),
            multi_arch_same: false,
            dependencies: Vec::new(),
            conffiles,
            extra_fields: HashMap::new(),
        });
        id
    }

    #[test]
    fn test_no_dependents_is_removable() {
        let mut arena = Arena::new();
        let pkg = install(&mut arena, "a", Vec::new());
        let ctx = Context::new("/");
        assert!(blocking_dependents(&ctx, &arena, pkg).is_empty());
    }

    #[test]
    fn test_sole_depender_blocks_removal() {
        let mut arena = Arena::new();
        let a = install(&mut arena, "a", Vec::new());
        let b = install(&mut arena, "b", Vec::new());

        let possi = arena.add_possibility(Possibility {
            up: b,
            up_snapshot: Snapshot::Installed,
            dep_type: DepType::Depends,
            target: "a".to_owned(),
            target_arch: None,
            version: None,
            cyclebreak: Cell::new(false),
        });
        arena.pkginfo_mut(b).installed.as_mut().unwrap().dependencies = vec![(
            DepType::Depends,
            DependencyGroup {
                possibilities: vec![possi],
            },
        )];

        let ctx = Context::new("/");
        assert_eq!(blocking_dependents(&ctx, &arena, a), vec!["b".to_owned()]);
    }

    #[test]
    fn test_depender_being_removed_does_not_block() {
        let mut arena = Arena::new();
        let a = install(&mut arena, "a", Vec::new());
        let b = install(&mut arena, "b", Vec::new());

        let possi = arena.add_possibility(Possibility {
            up: b,
            up_snapshot: Snapshot::Installed,
            dep_type: DepType::Depends,
            target: "a".to_owned(),
            target_arch: None,
            version: None,
            cyclebreak: Cell::new(false),
        });
        arena.pkginfo_mut(b).installed.as_mut().unwrap().dependencies = vec![(
            DepType::Depends,
            DependencyGroup {
                possibilities: vec![possi],
            },
        )];
        arena.clientdata_mut(b).istobe = Istobe::Remove;

        let ctx = Context::new("/");
        assert!(blocking_dependents(&ctx, &arena, a).is_empty());
    }

    #[test]
    fn test_essential_package_refuses_removal_unless_forced() {
        let mut arena = Arena::new();
        let pkg = install(&mut arena, "a", Vec::new());
        arena.pkginfo_mut(pkg).essential = true;

        let mut ctx = Context::new("/");
        assert!(check_essential(&ctx, &arena, pkg).is_err());

        ctx.force = crate::force::Force::none();
        ctx.force.set(Thing::RemoveEssential);
        assert!(check_essential(&ctx, &arena, pkg).is_ok());
    }

    #[test]
    fn test_is_backup_sibling_matches_known_patterns() {
        assert!(is_backup_sibling("p.conf.dpkg-old", "p.conf"));
        assert!(is_backup_sibling("p.conf~1~", "p.conf"));
        assert!(is_backup_sibling("#p.conf#", "p.conf"));
        assert!(!is_backup_sibling("p.conf.unrelated", "p.conf"));
    }

    #[test]
    fn test_purge_removes_conffile_and_backups() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("etc")).unwrap();
        std::fs::create_dir_all(dir.path().join("var/lib/dpkg/info")).unwrap();
        std::fs::write(dir.path().join("etc/p.conf"), b"x").unwrap();
        std::fs::write(dir.path().join("etc/p.conf.dpkg-old"), b"x").unwrap();
        std::fs::write(dir.path().join("etc/p.conf~1~"), b"x").unwrap();
        std::fs::write(dir.path().join("etc/p.conf.unrelated"), b"x").unwrap();

        let mut arena = Arena::new();
        let pkg = install(
            &mut arena,
            "p",
            vec![Conffile {
                path: "/etc/p.conf".to_owned(),
                hash: "deadbeef".to_owned(),
                obsolete: false,
                remove_on_upgrade: false,
            }],
        );
        arena.pkginfo_mut(pkg).status = Status::ConfigFiles;

        let mut ctx = Context::new(dir.path());
        let target = Target {
            pkg,
            name: "p",
            arch: &Architecture::Amd64,
            format: Format::Legacy,
        };
        purge(&mut ctx, &mut arena, &target).unwrap();

        assert!(!dir.path().join("etc/p.conf").exists());
        assert!(!dir.path().join("etc/p.conf.dpkg-old").exists());
        assert!(!dir.path().join("etc/p.conf~1~").exists());
        assert!(dir.path().join("etc/p.conf.unrelated").exists());
        assert_eq!(arena.pkginfo(pkg).status, Status::NotInstalled);
        assert_eq!(arena.pkginfo(pkg).want, Want::Unknown);
        assert!(arena.pkginfo(pkg).installed.is_none());
    }
}

// vim: foldmethod=marker
