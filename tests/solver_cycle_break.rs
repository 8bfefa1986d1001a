//! S3 — two packages depending on each other, neither with a postinst.
//! After the cycle breaker runs, exactly one of the two possibilities is
//! marked `cyclebreak`, and `dep_is_ok` reports both as configurable.

use dpkg_core::architecture::Architecture;
use dpkg_core::context::Context;
use dpkg_core::depgraph::{Arena, DependencyGroup, DepType, Pkgbin, Possibility, Snapshot, Status};
use dpkg_core::solver::{cycle::break_cycles, dep_is_ok, Verdict};
use std::cell::Cell;
use std::collections::HashMap;

fn bin() -> Pkgbin {
    Pkgbin {
        version: "1.0".parse().unwrap(),
        maintainer: String::new(),
        description: String::new(),
        multi_arch_same: false,
        dependencies: Vec::new(),
        conffiles: Vec::new(),
        extra_fields: HashMap::new(),
    }
}

fn add_depends(arena: &mut Arena, from: dpkg_core::depgraph::PkginfoId, to_name: &str) -> DependencyGroup {
    let possi = Possibility {
        up: from,
        up_snapshot: Snapshot::Installed,
        dep_type: DepType::Depends,
        target: to_name.to_owned(),
        target_arch: None,
        version: None,
        cyclebreak: Cell::new(false),
    };
    let possi_id = arena.add_possibility(possi);
    DependencyGroup {
        possibilities: vec![possi_id],
    }
}

#[test]
fn breaking_a_two_cycle_lets_both_sides_configure() {
    let mut arena = Arena::new();

    let a_set = arena.ensure_set("a");
    let a = arena.ensure_instance(a_set, Architecture::Amd64);
    arena.pkginfo_mut(a).status = Status::Installed;
    arena.pkginfo_mut(a).installed = Some(bin());

    let b_set = arena.ensure_set("b");
    let b = arena.ensure_instance(b_set, Architecture::Amd64);
    arena.pkginfo_mut(b).status = Status::Installed;
    arena.pkginfo_mut(b).installed = Some(bin());

    let a_to_b = add_depends(&mut arena, a, "b");
    let b_to_a = add_depends(&mut arena, b, "a");
    arena.pkginfo_mut(a).installed.as_mut().unwrap().dependencies =
        vec![(DepType::Depends, a_to_b.clone())];
    arena.pkginfo_mut(b).installed.as_mut().unwrap().dependencies =
        vec![(DepType::Depends, b_to_a.clone())];

    break_cycles(&mut arena, |_| false);

    let broken_count = arena
        .possi_ids()
        .filter(|id| arena.possibility(*id).cyclebreak.get())
        .count();
    assert_eq!(broken_count, 1, "exactly one deppossi should be cut to break the cycle");

    let ctx = Context::new("/");
    let diag_a = dep_is_ok(&ctx, &arena, a, DepType::Depends, &a_to_b, false);
    let diag_b = dep_is_ok(&ctx, &arena, b, DepType::Depends, &b_to_a, false);

    // Whichever edge was cut reports Ok because `cyclebreak` already
    // satisfies it before version/candidate matching even runs; the
    // edge left intact points at an already-`Installed` target and is
    // satisfied on its own merits. Either way both sides configure.
    assert_eq!(diag_a.verdict, Verdict::Ok);
    assert_eq!(diag_b.verdict, Verdict::Ok);
}

// vim: foldmethod=marker
