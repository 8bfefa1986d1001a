//! Invariant 1 — the admin-directory files are never observed
//! half-written: a rewrite lands via a `-new` temporary, the previous
//! contents survive as `-old`, and a session opened afterward sees
//! exactly the last complete write.

use dpkg_core::architecture::Architecture;
use dpkg_core::context::Context;
use dpkg_core::db::{atomic, Database, OpenMode};
use dpkg_core::depgraph::{Pkgbin, Status, Want};

#[test]
fn rewrite_leaves_no_partial_state_visible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status");

    atomic::rewrite(&path, b"first").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"first");
    assert!(!path.with_file_name("status-new").exists());
    assert!(!path.with_file_name("status-old").exists());

    atomic::rewrite(&path, b"second").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"second");
    assert_eq!(std::fs::read(path.with_file_name("status-old")).unwrap(), b"first");
    assert!(!path.with_file_name("status-new").exists());
}

#[test]
fn database_open_after_write_sees_only_the_committed_record() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("var/lib/dpkg")).unwrap();
    let mut ctx = Context::new(dir.path());

    {
        let mut db = Database::open(&ctx, OpenMode::Write).unwrap();
        let set = db.arena_mut().ensure_set("foo");
        let id = db.arena_mut().ensure_instance(set, Architecture::Amd64);
        let info = db.arena_mut().pkginfo_mut(id);
        info.status = Status::Installed;
        info.want = Want::Install;
        info.installed = Some(Pkgbin {
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

    // A second write supersedes the first; the committed record must be
    // exactly the second one, with the first demoted to the `-old`
    // backup rather than left half-applied.
    {
        let mut db = Database::open(&ctx, OpenMode::Write).unwrap();
        let set = db.arena_mut().ensure_set("foo");
        let id = db.arena_mut().ensure_instance(set, Architecture::Amd64);
        db.arena_mut().pkginfo_mut(id).status = Status::Installed;
        db.arena_mut().pkginfo_mut(id).want = Want::Install;
        db.arena_mut().pkginfo_mut(id).installed = Some(Pkgbin {
            version: "2.0-1".parse().unwrap(),
            maintainer: "A <a@example.com>".into(),
            description: "desc".into(),
            multi_arch_same: false,
            dependencies: Vec::new(),
            conffiles: Vec::new(),
            extra_fields: Default::default(),
        });
        db.note(&mut ctx, "foo").unwrap();
    }

    assert!(ctx.status_path().with_file_name("status-old").exists());
    assert!(!ctx.status_path().with_file_name("status-new").exists());

    let db = Database::open(&ctx, OpenMode::ReadOnly).unwrap();
    let set = db.arena().find_set("foo").unwrap();
    let id = db.arena().instance_of(set, &Architecture::Amd64).unwrap();
    assert_eq!(
        db.arena().pkginfo(id).installed.as_ref().unwrap().version,
        "2.0-1".parse().unwrap()
    );
}

// vim: foldmethod=marker
