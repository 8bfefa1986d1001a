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

//! Colour-marked DFS over the install-time dependency graph (`Depends`
//! and `Pre-Depends` edges), picking one edge per discovered cycle to
//! mark `cyclebreak`, preferring an edge whose depender has no postinst.

use crate::depgraph::{Arena, Colour, DepType, PkginfoId, PossiId};

/// Walk every node not yet visited this pass and break any dependency
/// cycle found, preferring to cut an edge whose depender has no
/// postinst script. Idempotent: re-running over an already-broken graph
/// picks the same edges again, since `cyclebreak` short-circuits the
/// solver before a cut edge is ever walked as a live dependency.
///
/// `has_postinst` reports whether a given package ships a postinst
/// script (cutting an edge on a package with none is a behavioural
/// no-op, so it's preferred).
pub fn break_cycles(arena: &mut Arena, has_postinst: impl Fn(PkginfoId) -> bool) {
    arena.reset_colour();
    let ids: Vec<PkginfoId> = arena.pkginfo_ids().collect();
    for id in ids {
        if arena.clientdata(id).colour == Colour::White {
            let mut stack = Vec::new();
            visit(arena, id, &mut stack, &has_postinst);
        }
    }
}

/// One edge on the current recursion stack: the possibility traversed,
/// and the depender it belongs to.
struct StackEdge {
    possi: PossiId,
    depender: PkginfoId,
}

fn visit(
    arena: &mut Arena,
    node: PkginfoId,
    stack: &mut Vec<StackEdge>,
    has_postinst: &impl Fn(PkginfoId) -> bool,
) {
    arena.clientdata_mut(node).colour = Colour::Grey;

    let edges = outgoing_edges(arena, node);
    for possi_id in edges {
        let possi = arena.possibility(possi_id);
        if possi.cyclebreak.get() {
            continue;
        }
        let Some(target_set) = arena.find_set(&possi.target) else {
            continue;
        };
        let targets: Vec<PkginfoId> = arena.set(target_set).instances.clone();

        for target in targets {
            if target == node {
                continue;
            }
            match arena.clientdata(target).colour {
                Colour::White => {
                    stack.push(StackEdge {
                        possi: possi_id,
                        depender: node,
                    });
                    visit(arena, target, stack, has_postinst);
                    stack.pop();
                }
                Colour::Grey => {
                    break_cycle(arena, stack, target, possi_id, node, has_postinst);
                }
                Colour::Black => {}
            }
        }
    }

    arena.clientdata_mut(node).colour = Colour::Black;
}

fn outgoing_edges(arena: &Arena, node: PkginfoId) -> Vec<PossiId> {
    let info = arena.pkginfo(node);
    let Some(bin) = &info.installed else {
        return Vec::new();
    };
    bin.groups_of(DepType::Depends)
        .chain(bin.groups_of(DepType::PreDepends))
        .flat_map(|g| g.possibilities.iter().copied())
        .collect()
}

/// A back-edge `closing_possi` from `closing_depender` into `target`
/// (already grey, i.e. on the stack) was found. Walk the recursion stack
/// from its head back toward `target` and cut the first eligible edge.
fn break_cycle(
    arena: &Arena,
    stack: &[StackEdge],
    target: PkginfoId,
    closing_possi: PossiId,
    closing_depender: PkginfoId,
    has_postinst: &impl Fn(PkginfoId) -> bool,
) {
    // The cycle is `target -> ... -> closing_depender -> target`. Collect
    // every edge on the stack from `target`'s position to the end, plus
    // the closing edge itself.
    let start = stack.iter().position(|e| e.depender == target);
    let cycle_edges: Vec<(PossiId, PkginfoId)> = match start {
        Some(idx) => stack[idx..]
            .iter()
            .map(|e| (e.possi, e.depender))
            .chain(std::iter::once((closing_possi, closing_depender)))
            .collect(),
        None => vec![(closing_possi, closing_depender)],
    };

    let postinst_free = cycle_edges
        .iter()
        .find(|(_, depender)| !has_postinst(*depender));

    let (chosen_possi, _) = postinst_free.copied().unwrap_or(cycle_edges[0]);
    arena.possibility(chosen_possi).cyclebreak.set(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use crate::depgraph::{DependencyGroup, Pkgbin, Possibility, Snapshot, Status};
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

    fn add_depends(arena: &mut Arena, from: PkginfoId, to_name: &str) {
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
        let info = arena.pkginfo_mut(from);
        let mut installed = info.installed.take().unwrap_or_else(bin);
        installed.dependencies.push((
            DepType::Depends,
            DependencyGroup {
                possibilities: vec![possi_id],
            },
        ));
        info.installed = Some(installed);
    }

    #[test]
    fn test_two_cycle_breaks_exactly_one_edge() {
        let mut arena = Arena::new();
        let a_set = arena.ensure_set("a");
        let a = arena.ensure_instance(a_set, Architecture::Amd64);
        arena.pkginfo_mut(a).status = Status::Installed;
        arena.pkginfo_mut(a).installed = Some(bin());

        let b_set = arena.ensure_set("b");
        let b = arena.ensure_instance(b_set, Architecture::Amd64);
        arena.pkginfo_mut(b).status = Status::Installed;
        arena.pkginfo_mut(b).installed = Some(bin());

        add_depends(&mut arena, a, "b");
        add_depends(&mut arena, b, "a");

        break_cycles(&mut arena, |_| false);

        let broken: usize = arena
            .possi_ids()
            .filter(|id| arena.possibility(*id).cyclebreak.get())
            .count();
        assert_eq!(broken, 1);
    }

    #[test]
    fn test_cycle_break_is_idempotent() {
        let mut arena = Arena::new();
        let a_set = arena.ensure_set("a");
        let a = arena.ensure_instance(a_set, Architecture::Amd64);
        arena.pkginfo_mut(a).status = Status::Installed;
        arena.pkginfo_mut(a).installed = Some(bin());

        let b_set = arena.ensure_set("b");
        let b = arena.ensure_instance(b_set, Architecture::Amd64);
        arena.pkginfo_mut(b).status = Status::Installed;
        arena.pkginfo_mut(b).installed = Some(bin());

        add_depends(&mut arena, a, "b");
        add_depends(&mut arena, b, "a");

        break_cycles(&mut arena, |_| false);
        let first: Vec<bool> = arena
            .possi_ids()
            .map(|id| arena.possibility(id).cyclebreak.get())
            .collect();

        break_cycles(&mut arena, |_| false);
        let second: Vec<bool> = arena
            .possi_ids()
            .map(|id| arena.possibility(id).cyclebreak.get())
            .collect();

        assert_eq!(first, second);
    }
}

// vim: foldmethod=marker
