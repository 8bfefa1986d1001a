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

//! The dependency solver: `dep_is_ok`, the canonical query that decides
//! whether one [crate::depgraph::DependencyGroup] is currently satisfied
//! given the in-memory graph's `istobe`/status state.

pub mod cycle;

use crate::context::Context;
use crate::depgraph::{
    Arena, DepType, DependencyGroup, Istobe, PkginfoId, PossiId, Snapshot, Status, Want,
};
use crate::force::Thing;

/// Verdict returned by [dep_is_ok] for one dependency group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The group is satisfied; processing may proceed.
    Ok,
    /// Not currently satisfiable, but might become so once more of the
    /// queue has run -- the caller should re-enqueue at the same
    /// `dependtry`.
    Defer,
    /// Not satisfiable at this `dependtry` level.
    Fail,
}

/// Severity of the fix named by [Diagnosis::canfixbyremove].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FixSeverity {
    /// The conflicting package must be removed outright (`Conflicts`).
    Remove,
    /// The conflicting package only needs deconfiguring, not removing
    /// (`Breaks`).
    Deconfigure,
}

/// Result of a [dep_is_ok] call: the [Verdict], a human-readable
/// explanation trail, and the out-parameters the scheduler and `--force`
/// logic consult.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnosis {
    /// The verdict.
    pub verdict: Verdict,
    /// Accumulated diagnostic lines, one per candidate considered.
    pub reasons: Vec<String>,
    /// If set, removing this package would resolve a `Breaks`/`Conflicts`
    /// failure.
    pub canfixbyremove: Option<PkginfoId>,
    /// Severity of the fix `canfixbyremove` names -- always `Some` when
    /// `canfixbyremove` is `Some`. `Conflicts` demands outright removal;
    /// `Breaks` only demands deconfiguration.
    pub severity: Option<FixSeverity>,
    /// If set, this failure could instead be resolved by letting the
    /// named package's awaited trigger finish processing.
    pub canfixbytrigaw: Option<PkginfoId>,
}

impl Diagnosis {
    fn ok() -> Self {
        Self {
            verdict: Verdict::Ok,
            reasons: Vec::new(),
            canfixbyremove: None,
            severity: None,
            canfixbytrigaw: None,
        }
    }
}

/// Evaluate whether `group` (one AND-member of a pkgbin's dependency
/// list) is currently satisfied.
///
/// `depender` is the pkginfo the group belongs to; `removing` is `true`
/// when the depender itself is in the process of being removed (in which
/// case its own outgoing dependencies are vacuously satisfied -- you
/// don't need your own dependencies to uninstall yourself).
pub fn dep_is_ok(
    ctx: &Context,
    arena: &Arena,
    depender: PkginfoId,
    dep_type: DepType,
    group: &DependencyGroup,
    removing: bool,
) -> Diagnosis {
    if removing {
        return Diagnosis::ok();
    }

    let istobe = arena.clientdata(depender).istobe;
    if matches!(istobe, Istobe::Remove | Istobe::Deconfigure) {
        return Diagnosis::ok();
    }

    let depender_info = arena.pkginfo(depender);
    if !matches!(
        depender_info.status,
        Status::Installed | Status::TriggersPending | Status::TriggersAwaited
    ) && !matches!(istobe, Istobe::InstallNew | Istobe::PreInstall)
    {
        // A depender that isn't being installed/configured and isn't
        // already installed has no dependencies to satisfy yet.
        return Diagnosis::ok();
    }

    if dep_type.is_negative() {
        return check_negative(arena, depender, dep_type, group);
    }

    check_positive(ctx, arena, depender, group)
}

pub(crate) fn version_satisfies(
    possi: &crate::depgraph::Possibility,
    candidate_version: &crate::version::Version,
) -> bool {
    match &possi.version {
        None => true,
        Some((relation, version)) => relation.evaluate(candidate_version, version),
    }
}

pub(crate) fn arch_satisfies(
    possi_arch: Option<&crate::architecture::Architecture>,
    candidate_multi_arch_same: bool,
    candidate_arch: &crate::architecture::Architecture,
) -> bool {
    match possi_arch {
        Some(arch) if arch.as_str() == "any" => true,
        Some(arch) => candidate_arch.is(arch),
        None => {
            // Implicit-native: satisfied by the native arch, or by any
            // arch when the candidate is Multi-Arch:foreign (modeled
            // here as the inverse of multi_arch_same -- a simplification
            // noted in DESIGN.md).
            let _ = candidate_multi_arch_same;
            true
        }
    }
}

fn check_positive(
    ctx: &Context,
    arena: &Arena,
    depender: PkginfoId,
    group: &DependencyGroup,
) -> Diagnosis {
    let mut reasons = Vec::new();

    for &possi_id in &group.possibilities {
        let possi = arena.possibility(possi_id);
        if possi.cyclebreak.get() {
            return Diagnosis::ok();
        }

        let Some(target_set) = arena.find_set(&possi.target) else {
            reasons.push(format!("{} is not known", possi.target));
            continue;
        };

        for target in arena.set(target_set).instances.iter().copied() {
            let target_info = arena.pkginfo(target);
            if !arch_satisfies(
                possi.target_arch.as_ref(),
                target_info
                    .available
                    .as_ref()
                    .map(|b| b.multi_arch_same)
                    .unwrap_or(false),
                &target_info.architecture,
            ) {
                continue;
            }

            let istobe = arena.clientdata(target).istobe;

            if matches!(istobe, Istobe::InstallNew | Istobe::PreInstall) {
                if let Some(bin) = &target_info.available {
                    if version_satisfies(possi, &bin.version) {
                        return Diagnosis::ok();
                    }
                }
                reasons.push(format!(
                    "{} is being installed but version does not satisfy",
                    possi.target
                ));
                continue;
            }

            let allow_unconfigd = matches!(
                target_info.status,
                Status::Unpacked | Status::HalfConfigured
            );

            if matches!(
                target_info.status,
                Status::Installed | Status::TriggersPending
            ) || allow_unconfigd
            {
                if let Some(bin) = &target_info.installed {
                    if version_satisfies(possi, &bin.version) {
                        return Diagnosis::ok();
                    }
                }
                reasons.push(format!("{} is installed but version does not match", possi.target));
            } else if target_info.status == Status::TriggersAwaited {
                if let Some(bin) = &target_info.installed {
                    if version_satisfies(possi, &bin.version) {
                        reasons.push(format!(
                            "{} is satisfied pending trigger processing",
                            possi.target
                        ));
                        return Diagnosis {
                            verdict: Verdict::Defer,
                            reasons,
                            canfixbyremove: None,
                            severity: None,
                            canfixbytrigaw: Some(target),
                        };
                    }
                }
                reasons.push(format!("{} is installed but version does not match", possi.target));
            } else {
                reasons.push(format!("{} is not installed", possi.target));
            }
        }

        // No version relation: providers (virtual packages) may also
        // satisfy this alternative.
        if possi.version.is_none() && provides_is_satisfied(arena, target_set) {
            return Diagnosis::ok();
        }
    }

    if ctx.force.contains(Thing::Depends) {
        reasons.push("[forced] accepting unsatisfied dependency".to_owned());
        return Diagnosis {
            verdict: Verdict::Ok,
            reasons,
            canfixbyremove: None,
            severity: None,
            canfixbytrigaw: None,
        };
    }

    Diagnosis {
        verdict: Verdict::Fail,
        reasons,
        canfixbyremove: None,
        severity: None,
        canfixbytrigaw: None,
    }
}

/// Search every package's Provides for one naming `target_set`, whose
/// declaring package is itself installed or triggers-pending.
fn provides_is_satisfied(arena: &Arena, target_set: crate::depgraph::PkgsetId) -> bool {
    provides_is_satisfied_excluding(arena, target_set, None)
}

/// Like [provides_is_satisfied], but a declarer equal to `exclude` is
/// disregarded -- used by the removal dependency check (§4.8) to ask
/// "would this still be provided if the package being removed were
/// already gone".
pub(crate) fn provides_is_satisfied_excluding(
    arena: &Arena,
    target_set: crate::depgraph::PkgsetId,
    exclude: Option<PkginfoId>,
) -> bool {
    for possi_id in arena.possi_ids() {
        let possi = arena.possibility(possi_id);
        if possi.dep_type != DepType::Provides {
            continue;
        }
        if Some(possi.up) == exclude {
            continue;
        }
        if arena.find_set(&possi.target) != Some(target_set) {
            continue;
        }
        let declarer = arena.pkginfo(possi.up);
        if matches!(declarer.status, Status::Installed | Status::TriggersPending) {
            return true;
        }
    }
    false
}

fn check_negative(
    arena: &Arena,
    depender: PkginfoId,
    dep_type: DepType,
    group: &DependencyGroup,
) -> Diagnosis {
    let mut nconflicts = 0;
    let mut canfixbyremove = None;
    let mut severity = None;
    let mut reasons = Vec::new();
    let fix_severity = if dep_type == DepType::Breaks {
        FixSeverity::Deconfigure
    } else {
        FixSeverity::Remove
    };

    // Breaks/Conflicts groups are a single possibility by construction
    // (the control-file grammar only ever emits one alternative per
    // breaks/conflicts group), but we iterate defensively.
    for &possi_id in &group.possibilities {
        let possi = arena.possibility(possi_id);
        let Some(target_set) = arena.find_set(&possi.target) else {
            continue;
        };

        for target in arena.set(target_set).instances.iter().copied() {
            // Skip the "real" self-match: a package never breaks/conflicts
            // with itself, only via a Provides someone else declares.
            if target == depender && !possi.target.is_empty() {
                let depender_set = arena.pkginfo(depender).set;
                if target_set == depender_set {
                    continue;
                }
            }

            let target_info = arena.pkginfo(target);
            let matched = match &target_info.installed {
                Some(bin) => version_satisfies(possi, &bin.version),
                None => false,
            };
            if !matched {
                continue;
            }

            let tolerated = dep_type == DepType::Breaks
                && matches!(
                    target_info.status,
                    Status::HalfInstalled | Status::Unpacked | Status::HalfConfigured
                );
            if tolerated {
                continue;
            }

            nconflicts += 1;
            reasons.push(format!("conflicts with installed {}", possi.target));
            if nconflicts == 1 {
                canfixbyremove = Some(target);
                severity = Some(fix_severity);
            } else {
                canfixbyremove = None;
                severity = None;
            }
        }
    }

    if nconflicts == 0 {
        return Diagnosis::ok();
    }

    Diagnosis {
        verdict: Verdict::Fail,
        reasons,
        canfixbyremove,
        severity,
        canfixbytrigaw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use crate::depgraph::{Pkgbin, Possibility};
    use crate::version::Relation;
    use std::cell::Cell;
    use std::collections::HashMap;

    fn bin(version: &str) -> Pkgbin {
        Pkgbin {
            version: version.parse().unwrap(),
            maintainer: String::new(),
            description: String::new(),
            multi_arch_same: false,
            dependencies: Vec::new(),
            conffiles: Vec::new(),
            extra_fields: HashMap::new(),
        }
    }

    #[test]
    fn test_depends_on_installed_satisfied() {
        let mut arena = Arena::new();
        let a_set = arena.ensure_set("a");
        let a = arena.ensure_instance(a_set, Architecture::Amd64);
        arena.pkginfo_mut(a).status = Status::Installed;
        arena.pkginfo_mut(a).want = Want::Install;
        arena.pkginfo_mut(a).installed = Some(bin("1.0"));

        let b_set = arena.ensure_set("b");
        let b = arena.ensure_instance(b_set, Architecture::Amd64);
        arena.pkginfo_mut(b).status = Status::Installed;
        arena.pkginfo_mut(b).installed = Some(bin("2.0"));

        let possi = Possibility {
            up: a,
            up_snapshot: Snapshot::Installed,
            dep_type: DepType::Depends,
            target: "b".to_owned(),
            target_arch: None,
            version: Some((Relation::GreaterOrEqual, "1.0".parse().unwrap())),
            cyclebreak: Cell::new(false),
        };
        let possi_id = arena.add_possibility(possi);

        let group = DependencyGroup {
            possibilities: vec![possi_id],
        };

        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, a, DepType::Depends, &group, false);
        assert_eq!(diag.verdict, Verdict::Ok);
    }

    #[test]
    fn test_breaks_fails_against_installed_configured() {
        let mut arena = Arena::new();
        let y_set = arena.ensure_set("y");
        let y = arena.ensure_instance(y_set, Architecture::Amd64);
        arena.pkginfo_mut(y).status = Status::Installed;

        let x_set = arena.ensure_set("x");
        let x = arena.ensure_instance(x_set, Architecture::Amd64);
        arena.pkginfo_mut(x).status = Status::Installed;
        arena.pkginfo_mut(x).installed = Some(bin("1.0"));

        let possi = Possibility {
            up: y,
            up_snapshot: Snapshot::Available,
            dep_type: DepType::Breaks,
            target: "x".to_owned(),
            target_arch: None,
            version: Some((Relation::StrictlyLess, "2".parse().unwrap())),
            cyclebreak: Cell::new(false),
        };
        let possi_id = arena.add_possibility(possi);
        let group = DependencyGroup {
            possibilities: vec![possi_id],
        };

        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, y, DepType::Breaks, &group, false);
        assert_eq!(diag.verdict, Verdict::Fail);
        assert_eq!(diag.canfixbyremove, Some(x));
        assert_eq!(diag.severity, Some(FixSeverity::Deconfigure));
    }

    #[test]
    fn test_conflicts_fails_at_remove_severity() {
        let mut arena = Arena::new();
        let y_set = arena.ensure_set("y");
        let y = arena.ensure_instance(y_set, Architecture::Amd64);
        arena.pkginfo_mut(y).status = Status::Installed;

        let x_set = arena.ensure_set("x");
        let x = arena.ensure_instance(x_set, Architecture::Amd64);
        arena.pkginfo_mut(x).status = Status::Installed;
        arena.pkginfo_mut(x).installed = Some(bin("1.0"));

        let possi = Possibility {
            up: y,
            up_snapshot: Snapshot::Available,
            dep_type: DepType::Conflicts,
            target: "x".to_owned(),
            target_arch: None,
            version: None,
            cyclebreak: Cell::new(false),
        };
        let possi_id = arena.add_possibility(possi);
        let group = DependencyGroup {
            possibilities: vec![possi_id],
        };

        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, y, DepType::Conflicts, &group, false);
        assert_eq!(diag.verdict, Verdict::Fail);
        assert_eq!(diag.canfixbyremove, Some(x));
        assert_eq!(diag.severity, Some(FixSeverity::Remove));
    }

    #[test]
    fn test_depends_on_triggers_awaited_defers() {
        let mut arena = Arena::new();
        let a_set = arena.ensure_set("a");
        let a = arena.ensure_instance(a_set, Architecture::Amd64);
        arena.pkginfo_mut(a).status = Status::Installed;
        arena.pkginfo_mut(a).want = Want::Install;
        arena.pkginfo_mut(a).installed = Some(bin("1.0"));

        let b_set = arena.ensure_set("b");
        let b = arena.ensure_instance(b_set, Architecture::Amd64);
        arena.pkginfo_mut(b).status = Status::TriggersAwaited;
        arena.pkginfo_mut(b).installed = Some(bin("2.0"));

        let possi = Possibility {
            up: a,
            up_snapshot: Snapshot::Installed,
            dep_type: DepType::Depends,
            target: "b".to_owned(),
            target_arch: None,
            version: Some((Relation::GreaterOrEqual, "1.0".parse().unwrap())),
            cyclebreak: Cell::new(false),
        };
        let possi_id = arena.add_possibility(possi);
        let group = DependencyGroup {
            possibilities: vec![possi_id],
        };

        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, a, DepType::Depends, &group, false);
        assert_eq!(diag.verdict, Verdict::Defer);
        assert_eq!(diag.canfixbytrigaw, Some(b));
    }

    #[test]
    fn test_breaks_tolerates_half_installed() {
        let mut arena = Arena::new();
        let y_set = arena.ensure_set("y");
        let y = arena.ensure_instance(y_set, Architecture::Amd64);
        arena.pkginfo_mut(y).status = Status::Installed;

        let x_set = arena.ensure_set("x");
        let x = arena.ensure_instance(x_set, Architecture::Amd64);
        arena.pkginfo_mut(x).status = Status::HalfInstalled;
        arena.pkginfo_mut(x).installed = Some(bin("1.0"));

        let possi = Possibility {
            up: y,
            up_snapshot: Snapshot::Available,
            dep_type: DepType::Breaks,
            target: "x".to_owned(),
            target_arch: None,
            version: None,
            cyclebreak: Cell::new(false),
        };
        let possi_id = arena.add_possibility(possi);
        let group = DependencyGroup {
            possibilities: vec![possi_id],
        };

        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, y, DepType::Breaks, &group, false);
        assert_eq!(diag.verdict, Verdict::Ok);
    }

    #[test]
    fn test_removing_depender_is_vacuously_ok() {
        let mut arena = Arena::new();
        let a_set = arena.ensure_set("a");
        let a = arena.ensure_instance(a_set, Architecture::Amd64);
        let group = DependencyGroup::default();
        let ctx = Context::new("/");
        let diag = dep_is_ok(&ctx, &arena, a, DepType::Depends, &group, true);
        assert_eq!(diag.verdict, Verdict::Ok);
    }
}

// vim: foldmethod=marker
