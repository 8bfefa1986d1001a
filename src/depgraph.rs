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

//! The in-memory package graph: [Pkgset] (a name) owning one or more
//! arch-qualified [Pkginfo] instances, each carrying an `installed` and
//! `available` [Pkgbin] snapshot. The graph is cyclic -- a [Possibility]
//! points at a target [Pkgset] by name, and the target's [Pkginfo] carries
//! a reverse pointer back at every [Possibility] that names it -- so it is
//! held in a never-shrinking arena and referenced by index rather than by
//! `Rc`/`&`. See the crate's design notes for why: this is the one place
//! ownership would otherwise be a genuine headache, and indices sidestep
//! the question entirely.

use crate::architecture::Architecture;
use crate::version::{Relation, Version};
use std::cell::Cell;
use std::collections::HashMap;

/// Index of a [Pkgset] in the [Arena].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PkgsetId(pub usize);

/// Index of a [Pkginfo] in the [Arena].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PkginfoId(pub usize);

/// Index of a [Possibility] (a "deppossi") in the [Arena].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PossiId(pub usize);

/// Which of a [Pkginfo]'s two [Pkgbin] snapshots a [Possibility] or reverse
/// pointer belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Snapshot {
    /// The currently-unpacked/configured snapshot.
    Installed,
    /// The snapshot describing what's available to be installed (from a
    /// parsed archive or the `available` file).
    Available,
}

/// Package lifecycle status, traversed not-installed -> unpacked ->
/// half-configured -> installed -> half-installed -> config-files ->
/// not-installed (with the triggers states inserted between unpacked and
/// installed).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    /// No trace of the package remains (besides possibly a `want` record).
    NotInstalled,
    /// Removed, but conffiles remain on disk.
    ConfigFiles,
    /// Partially removed; unsafe to consider present.
    HalfInstalled,
    /// Unpacked but not configured.
    Unpacked,
    /// `postinst configure` started but didn't finish.
    HalfConfigured,
    /// Configured, but waiting on another package's trigger processing.
    TriggersAwaited,
    /// Configured, with its own triggers pending.
    TriggersPending,
    /// Fully installed and configured.
    Installed,
}

impl Status {
    /// True for every status where the installed snapshot's files may
    /// legitimately be present on disk (used by the solver's version
    /// matching and by removal's directory-keep rule).
    pub fn is_at_least_unpacked(&self) -> bool {
        !matches!(self, Status::NotInstalled | Status::ConfigFiles)
    }
}

/// What the administrator (or a dependency resolution) wants done with a
/// package, independent of its current [Status].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Want {
    /// No preference recorded.
    Unknown,
    /// Install or keep installed.
    Install,
    /// Keep exactly as-is; a hold blocks automatic up/downgrades.
    Hold,
    /// Remove but keep conffiles.
    Deinstall,
    /// Remove including conffiles.
    Purge,
}

/// Persistent per-pkginfo error flags (`Status:` third field).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EFlags {
    /// Unset/ok.
    pub ok: bool,
    /// The package failed partway through and must be reinstalled from
    /// scratch rather than resumed.
    pub reinst_required: bool,
}

/// Per-run scratch intent for a [Pkginfo] -- not persisted, rebuilt every
/// run from the current queue of requested operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Istobe {
    /// No pending operation; use the persisted [Status]/[Want] as-is.
    Normal,
    /// About to be removed.
    Remove,
    /// About to be unpacked as a new version.
    InstallNew,
    /// About to be deconfigured (to break a cycle or satisfy a conflict).
    Deconfigure,
    /// About to be unpacked for the first time.
    PreInstall,
}

/// DFS colour used by the cycle breaker (§4.5): white = unvisited, grey =
/// on the current recursion stack, black = fully explored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Colour {
    /// Not yet visited this pass.
    White,
    /// On the current DFS recursion stack -- a back-edge into a grey node
    /// witnesses a cycle.
    Grey,
    /// Fully explored; no cycle can be found through this node again this
    /// pass.
    Black,
}

/// Per-run scratch data for one [Pkginfo], held in a side-table keyed by
/// [PkginfoId] rather than inline, so a read-only pass (e.g. `--status`)
/// never has to touch the persisted record.
#[derive(Clone, Debug)]
pub struct ClientData {
    /// This run's intent for the package.
    pub istobe: Istobe,
    /// DFS colour for the cycle breaker.
    pub colour: Colour,
    /// Set when this package's forward progress is blocked purely on
    /// another package's trigger processing; the scheduler processes that
    /// trigger on the next escalation instead of raising `dependtry`.
    pub trigprocdeferred: Option<PkginfoId>,
}

impl Default for ClientData {
    fn default() -> Self {
        Self {
            istobe: Istobe::Normal,
            colour: Colour::White,
            trigprocdeferred: None,
        }
    }
}

/// One dependency relation type, as named on a `Depends`-family control
/// field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DepType {
    /// Must be configured for `self` to be configured.
    Depends,
    /// Must be unpacked (not just configured) before `self` unpacks.
    PreDepends,
    /// Soft dependency; affects ordering preference only, never blocks.
    Recommends,
    /// Advisory only; never consulted by the solver.
    Suggests,
    /// Parsed and stored, never enforced (see the crate's design notes:
    /// `Enhances` enforcement is explicitly out of scope).
    Enhances,
    /// Forbids simultaneous *configured* coexistence; tolerates unpacked.
    Breaks,
    /// Forbids any coexistence, even unpacked.
    Conflicts,
    /// Declares that `self` may stand in for the named virtual package.
    Provides,
    /// `self` replaces files owned by the named package.
    Replaces,
}

impl DepType {
    /// True for the four relation types the solver's `depisok` considers
    /// when looking for a satisfying alternative (as opposed to
    /// [DepType::Breaks]/[DepType::Conflicts], which it inverts, or
    /// [DepType::Enhances]/[DepType::Provides]/[DepType::Replaces], which
    /// it doesn't independently check).
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            DepType::Depends | DepType::PreDepends | DepType::Recommends | DepType::Suggests
        )
    }

    /// True for the two relation types satisfied by *absence* of a match.
    pub fn is_negative(&self) -> bool {
        matches!(self, DepType::Breaks | DepType::Conflicts)
    }
}

/// One alternative of one dependency group -- a "deppossi" in the
/// project's own vocabulary. Names a target [Pkgset] by name, optionally
/// qualified by [Architecture] and a version [Relation].
#[derive(Clone, Debug)]
pub struct Possibility {
    /// Owning pkginfo (the depender).
    pub up: PkginfoId,
    /// Which snapshot (installed/available) of the depender this
    /// possibility belongs to.
    pub up_snapshot: Snapshot,
    /// Relation type this possibility is one alternative of.
    pub dep_type: DepType,
    /// Target package set name.
    pub target: String,
    /// Optional `:arch` qualifier on the target.
    pub target_arch: Option<Architecture>,
    /// Optional version constraint (`rel`, `version`).
    pub version: Option<(Relation, Version)>,
    /// Set by the cycle breaker (§4.5) when this edge is chosen to cut a
    /// dependency cycle; the solver then treats it as satisfied for the
    /// remainder of the run.
    pub cyclebreak: Cell<bool>,
}

/// An ordered AND-of-OR dependency group: one [DepType], several
/// alternative [Possibility] ids, any one of which satisfies the group.
#[derive(Clone, Debug, Default)]
pub struct DependencyGroup {
    /// Possibilities belonging to this group, in declaration order.
    pub possibilities: Vec<PossiId>,
}

/// One version-qualified snapshot of a package: either what's currently
/// unpacked/configured, or what's available to be installed.
#[derive(Clone, Debug)]
pub struct Pkgbin {
    /// Exact version of this snapshot.
    pub version: Version,
    /// Maintainer field, free text.
    pub maintainer: String,
    /// Short description (`Description` first line).
    pub description: String,
    /// True if `Multi-Arch: same`.
    pub multi_arch_same: bool,
    /// Ordered dependency groups, keyed by [DepType] (one group per field
    /// occurrence; a pkgbin can in principle own more than one group of
    /// the same type, though in practice each type occurs once).
    pub dependencies: Vec<(DepType, DependencyGroup)>,
    /// Recorded conffiles (path, hash, obsolete?, remove-on-upgrade?).
    pub conffiles: Vec<Conffile>,
    /// Fields not otherwise modeled, preserved verbatim.
    pub extra_fields: HashMap<String, String>,
}

impl Pkgbin {
    /// Iterate every [DependencyGroup] of dependency type `dep_type`.
    pub fn groups_of(&self, dep_type: DepType) -> impl Iterator<Item = &DependencyGroup> {
        self.dependencies
            .iter()
            .filter(move |(t, _)| *t == dep_type)
            .map(|(_, g)| g)
    }
}

/// A recorded conffile entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Conffile {
    /// Absolute path of the conffile.
    pub path: String,
    /// Content digest, or the sentinel `"newconffile"` meaning "about to
    /// be installed for the first time".
    pub hash: String,
    /// True if this package no longer ships the file under this name, but
    /// it still needs bookkeeping (e.g. to be removed on upgrade).
    pub obsolete: bool,
    /// True if this conffile should be silently replaced on upgrade
    /// rather than prompting the administrator.
    pub remove_on_upgrade: bool,
}

/// One arch-qualified instance of a [Pkgset].
#[derive(Clone, Debug)]
pub struct Pkginfo {
    /// Owning set.
    pub set: PkgsetId,
    /// Architecture of this instance.
    pub architecture: Architecture,
    /// Persisted lifecycle status.
    pub status: Status,
    /// Persisted administrator intent.
    pub want: Want,
    /// Persisted error flags.
    pub eflags: EFlags,
    /// `Priority` field, if known.
    pub priority: Option<String>,
    /// `Section` field, if known.
    pub section: Option<String>,
    /// True if `Essential: yes`.
    pub essential: bool,
    /// True if `Protected: yes`.
    pub protected: bool,
    /// Currently unpacked/configured snapshot, if any.
    pub installed: Option<Pkgbin>,
    /// Snapshot available to be installed, if any.
    pub available: Option<Pkgbin>,
    /// Reverse index: possibilities (from any package) naming this
    /// instance, whose depender is considering its `installed` snapshot.
    pub depended_installed: Vec<PossiId>,
    /// Reverse index for dependers considering their `available`
    /// snapshot.
    pub depended_available: Vec<PossiId>,
    /// Pending (not-yet-processed) trigger names.
    pub trigpend: Vec<String>,
    /// Trigger names this package is awaiting activation of.
    pub trigaw: Vec<String>,
}

/// One package name: the set of [Pkginfo] instances (one per
/// architecture) sharing that name.
#[derive(Clone, Debug, Default)]
pub struct Pkgset {
    /// Package name.
    pub name: String,
    /// Arch-qualified instances, in no particular order.
    pub instances: Vec<PkginfoId>,
}

/// The arena: owns every [Pkgset], [Pkginfo] and [Possibility] for the
/// life of a run. Nothing is ever freed mid-run -- deletion is logical
/// (a status transition), matching the source design this crate is
/// grounded on. [ClientData] is kept in a parallel side-table rather than
/// inline on [Pkginfo], per the crate's design notes.
#[derive(Default)]
pub struct Arena {
    pkgsets: Vec<Pkgset>,
    pkginfos: Vec<Pkginfo>,
    possis: Vec<Possibility>,
    clientdata: Vec<ClientData>,
    by_name: HashMap<String, PkgsetId>,
}

impl Arena {
    /// Construct an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up (without creating) the [PkgsetId] for `name`.
    pub fn find_set(&self, name: &str) -> Option<PkgsetId> {
        self.by_name.get(name).copied()
    }

    /// Look up or create the [Pkgset] named `name`.
    pub fn ensure_set(&mut self, name: &str) -> PkgsetId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = PkgsetId(self.pkgsets.len());
        self.pkgsets.push(Pkgset {
            name: name.to_owned(),
            instances: Vec::new(),
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Borrow a [Pkgset] by id.
    pub fn set(&self, id: PkgsetId) -> &Pkgset {
        &self.pkgsets[id.0]
    }

    /// All known [PkgsetId]s, in creation order.
    pub fn set_ids(&self) -> impl Iterator<Item = PkgsetId> {
        (0..self.pkgsets.len()).map(PkgsetId)
    }

    /// Find the instance of `set` with the given [Architecture], if any.
    pub fn instance_of(&self, set: PkgsetId, arch: &Architecture) -> Option<PkginfoId> {
        self.pkgsets[set.0]
            .instances
            .iter()
            .copied()
            .find(|id| self.pkginfos[id.0].architecture.is(arch) || arch.is(&self.pkginfos[id.0].architecture))
    }

    /// Create a new arch-qualified instance under `set`, defaulting to
    /// not-installed/unknown. Returns its id.
    pub fn ensure_instance(&mut self, set: PkgsetId, arch: Architecture) -> PkginfoId {
        if let Some(id) = self.instance_of(set, &arch) {
            return id;
        }
        let id = PkginfoId(self.pkginfos.len());
        self.pkginfos.push(Pkginfo {
            set,
            architecture: arch,
            status: Status::NotInstalled,
            want: Want::Unknown,
            eflags: EFlags::default(),
            priority: None,
            section: None,
            essential: false,
            protected: false,
            installed: None,
            available: None,
            depended_installed: Vec::new(),
            depended_available: Vec::new(),
            trigpend: Vec::new(),
            trigaw: Vec::new(),
        });
        self.clientdata.push(ClientData::default());
        self.pkgsets[set.0].instances.push(id);
        id
    }

    /// Borrow a [Pkginfo] by id.
    pub fn pkginfo(&self, id: PkginfoId) -> &Pkginfo {
        &self.pkginfos[id.0]
    }

    /// Mutably borrow a [Pkginfo] by id.
    pub fn pkginfo_mut(&mut self, id: PkginfoId) -> &mut Pkginfo {
        &mut self.pkginfos[id.0]
    }

    /// All known [PkginfoId]s, in creation order.
    pub fn pkginfo_ids(&self) -> impl Iterator<Item = PkginfoId> {
        (0..self.pkginfos.len()).map(PkginfoId)
    }

    /// Borrow the [ClientData] scratch state for `id`.
    pub fn clientdata(&self, id: PkginfoId) -> &ClientData {
        &self.clientdata[id.0]
    }

    /// Mutably borrow the [ClientData] scratch state for `id`.
    pub fn clientdata_mut(&mut self, id: PkginfoId) -> &mut ClientData {
        &mut self.clientdata[id.0]
    }

    /// Reset every [Pkginfo]'s [ClientData] to the default -- done once
    /// at the start of a run, since `clientdata` is never persisted.
    pub fn reset_clientdata(&mut self) {
        for cd in &mut self.clientdata {
            *cd = ClientData::default();
        }
    }

    /// Reset every [Pkginfo]'s DFS [Colour] to [Colour::White], leaving the
    /// rest of its [ClientData] untouched. Called once per cycle-breaker
    /// pass rather than [Arena::reset_clientdata], which would also wipe
    /// `istobe`/`trigprocdeferred`.
    pub fn reset_colour(&mut self) {
        for cd in &mut self.clientdata {
            cd.colour = Colour::White;
        }
    }

    /// Add a [Possibility], registering it in the target set's reverse
    /// index if the target set exists (virtual-only Provides whose target
    /// has no real instance yet simply get no reverse pointer until one is
    /// created). Returns the new possibility's id.
    pub fn add_possibility(&mut self, possi: Possibility) -> PossiId {
        let id = PossiId(self.possis.len());
        let target = possi.target.clone();
        let snapshot = possi.up_snapshot;
        self.possis.push(possi);

        if let Some(set) = self.find_set(&target) {
            let instances = self.pkgsets[set.0].instances.clone();
            for inst in instances {
                match snapshot {
                    Snapshot::Installed => self.pkginfos[inst.0].depended_installed.push(id),
                    Snapshot::Available => self.pkginfos[inst.0].depended_available.push(id),
                }
            }
        }
        id
    }

    /// Borrow a [Possibility] by id.
    pub fn possibility(&self, id: PossiId) -> &Possibility {
        &self.possis[id.0]
    }

    /// All known [PossiId]s, in creation order.
    pub fn possi_ids(&self) -> impl Iterator<Item = PossiId> {
        (0..self.possis.len()).map(PossiId)
    }
}


// vim: foldmethod=marker
