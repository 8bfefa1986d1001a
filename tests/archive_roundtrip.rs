//! S2 — build a `.deb` from a minimal source tree and extract it back,
//! checking the on-disk archive shape and that the payload's mode and
//! mtime survive the round trip.

#![cfg(feature = "serde")]

use dpkg_core::archive::{ar, build, extract, BuildParams, Codec};
use std::os::unix::fs::PermissionsExt;

fn write_control(debian_dir: &std::path::Path) {
    std::fs::write(
        debian_dir.join("control"),
        "Package: a\nVersion: 1\nArchitecture: all\nMaintainer: m\nDescription: d\n",
    )
    .unwrap();
    std::fs::write(debian_dir.join("conffiles"), "").unwrap();
}

#[test]
fn build_then_extract_round_trips_mode_and_mtime() {
    let src = tempfile::tempdir().unwrap();
    let debian_dir = src.path().join("DEBIAN");
    std::fs::create_dir_all(&debian_dir).unwrap();
    std::fs::set_permissions(&debian_dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    write_control(&debian_dir);

    let bin_dir = src.path().join("usr/bin");
    std::fs::create_dir_all(&bin_dir).unwrap();
    std::fs::write(bin_dir.join("foo"), b"#!/bin/sh\necho hi\n").unwrap();
    std::fs::set_permissions(bin_dir.join("foo"), std::fs::Permissions::from_mode(0o755)).unwrap();

    std::env::set_var("SOURCE_DATE_EPOCH", "0");

    let dest_dir = tempfile::tempdir().unwrap();
    let deb = dest_dir.path().join("a_1_all.deb");
    build(
        src.path(),
        &deb,
        BuildParams {
            codec: Codec::Gzip,
            no_check: false,
        },
    )
    .unwrap();

    let bytes = std::fs::read(&deb).unwrap();
    let members = ar::read_archive(&bytes).unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].name, "debian-binary");
    assert!(members[1].name.starts_with("control.tar"));
    assert!(members[2].name.starts_with("data.tar"));

    let out = tempfile::tempdir().unwrap();
    extract(&deb, out.path(), false).unwrap();

    let extracted = out.path().join("usr/bin/foo");
    let meta = std::fs::metadata(&extracted).unwrap();
    assert_eq!(meta.permissions().mode() & 0o7777, 0o755);
    assert_eq!(
        meta.modified().unwrap().duration_since(std::time::UNIX_EPOCH).unwrap().as_secs(),
        0
    );
}

#[test]
fn build_rejects_non_standard_debian_dir_permissions() {
    let src = tempfile::tempdir().unwrap();
    let debian_dir = src.path().join("DEBIAN");
    std::fs::create_dir_all(&debian_dir).unwrap();
    std::fs::set_permissions(&debian_dir, std::fs::Permissions::from_mode(0o700)).unwrap();
    write_control(&debian_dir);

    let dest = tempfile::tempdir().unwrap().path().join("a_1_all.deb");
    let err = build(src.path(), &dest, BuildParams::default()).unwrap_err();
    assert!(matches!(err, dpkg_core::archive::Error::BadControlDirPermissions(_)));
}

// vim: foldmethod=marker
