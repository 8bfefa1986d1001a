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

//! The process-queue scheduler: a FIFO of pkginfos with a `dependtry`
//! escalation ladder (1..6) and a `sincenothing` counter that forces
//! escalation once the queue has gone all the way around without making
//! progress.

use crate::context::Context;
use crate::depgraph::{Arena, PkginfoId};
use crate::force::Thing;
use crate::solver::{dep_is_ok, Verdict};
use std::collections::VecDeque;

/// One step of the escalation ladder; the underlying integer is the
/// `dependtry` level (`1..=6`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependTry(u8);

impl DependTry {
    /// The initial, least permissive level.
    pub const MIN: DependTry = DependTry(1);
    /// The most permissive level; exceeding this is a hard failure.
    pub const MAX: DependTry = DependTry(6);

    /// The underlying level number, `1..=6`.
    pub fn level(self) -> u8 {
        self.0
    }

    /// True once the cycle breaker should run before considering each
    /// package (level >= 2).
    pub fn breaks_cycles(self) -> bool {
        self.0 >= 2
    }

    /// True once pending triggers are processed as if they were regular
    /// queue entries (level >= 3).
    pub fn processes_triggers(self) -> bool {
        self.0 >= 3
    }

    /// True once trigger cycles are also checked while deferring
    /// (level >= 4).
    pub fn checks_trigger_cycles(self) -> bool {
        self.0 >= 4
    }

    /// True once `--force-depends-version` should be honoured
    /// (level >= 5).
    pub fn ignores_version(self, force: &crate::force::Force) -> bool {
        self.0 >= 5 && force.contains(Thing::DependsVersion)
    }

    /// True once `--force-depends` should accept anything outstanding
    /// (level >= 6).
    pub fn accepts_anything(self, force: &crate::force::Force) -> bool {
        self.0 >= 6 && force.contains(Thing::Depends)
    }

    fn escalate(self) -> Option<DependTry> {
        (self.0 < 6).then_some(DependTry(self.0 + 1))
    }
}

impl Default for DependTry {
    fn default() -> Self {
        Self::MIN
    }
}

/// Why the queue stopped before draining completely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// `dependtry` was escalated past [DependTry::MAX].
    DependTryExhausted,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DependTryExhausted => {
                write!(f, "dependency resolution exceeded the maximum dependtry level")
            }
        }
    }
}

impl std::error::Error for Error {}

/// One completed step: the package that was processed, and at what
/// `dependtry` level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Processed {
    /// The package that advanced.
    pub pkg: PkginfoId,
    /// The `dependtry` level it advanced at.
    pub dependtry: DependTry,
}

/// The action-queue scheduler. Call [Queue::drain] with a per-package
/// callback that performs the actual unpack/configure work; the
/// scheduler only decides *when* each package's dependencies are ready.
pub struct Queue {
    pending: VecDeque<PkginfoId>,
    dependtry: DependTry,
    sincenothing: u32,
}

impl Queue {
    /// Build a queue from an ordered list of packages to process.
    pub fn new(packages: impl IntoIterator<Item = PkginfoId>) -> Self {
        Self {
            pending: packages.into_iter().collect(),
            dependtry: DependTry::default(),
            sincenothing: 0,
        }
    }

    /// Current escalation level.
    pub fn dependtry(&self) -> DependTry {
        self.dependtry
    }

    /// Number of packages still waiting to be processed.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing remains queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drain the queue, calling `advance` once per dequeued package whose
    /// positive dependencies ([crate::depgraph::DepType::is_positive])
    /// are all satisfied. A package that isn't ready yet is re-enqueued
    /// at the tail; once `sincenothing` exceeds `2 * queue_len + 2`
    /// without any package advancing, `dependtry` escalates by one and
    /// `sincenothing` resets, per the escalation ladder on [DependTry].
    /// `has_postinst` reports whether a package ships a postinst script,
    /// consulted by the cycle breaker once `dependtry` reaches level 2.
    pub fn drain(
        &mut self,
        ctx: &mut Context,
        arena: &mut Arena,
        has_postinst: impl Fn(PkginfoId) -> bool,
        mut advance: impl FnMut(&mut Context, &mut Arena, PkginfoId) -> bool,
    ) -> Result<Vec<Processed>, Error> {
        let mut processed = Vec::new();

        while let Some(pkg) = self.pending.pop_front() {
            if self.dependtry.breaks_cycles() {
                crate::solver::cycle::break_cycles(arena, &has_postinst);
            }

            if !self.dependencies_ready(ctx, arena, pkg) {
                self.pending.push_back(pkg);
                self.bump_sincenothing()?;
                continue;
            }

            self.sincenothing = 0;
            if advance(ctx, arena, pkg) {
                processed.push(Processed {
                    pkg,
                    dependtry: self.dependtry,
                });
            }
        }

        Ok(processed)
    }

    fn dependencies_ready(&self, ctx: &Context, arena: &Arena, pkg: PkginfoId) -> bool {
        if self.dependtry.accepts_anything(&ctx.force) {
            return true;
        }

        let Some(bin) = &arena.pkginfo(pkg).installed else {
            return true;
        };

        for (dep_type, group) in &bin.dependencies {
            if !dep_type.is_positive() {
                continue;
            }
            let diag = dep_is_ok(ctx, arena, pkg, *dep_type, group, false);
            if diag.verdict != Verdict::Ok {
                return false;
            }
        }
        true
    }

    fn bump_sincenothing(&mut self) -> Result<(), Error> {
        self.sincenothing += 1;
        let threshold = 2 * self.pending.len() as u32 + 2;
        if self.sincenothing > threshold {
            self.dependtry = self.dependtry.escalate().ok_or(Error::DependTryExhausted)?;
            self.sincenothing = 0;
        }
        Ok(())
    }
}


// vim: foldmethod=marker
