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

//! The `--force-<thing>` / `--refuse-<thing>` table. Every place in the
//! crate that would otherwise be a hard failure -- a version downgrade, a
//! conflict, an overwrite of a diverted path -- consults a [Force] bitset
//! before turning the failure into a [crate::force::Forced] warning.

use std::str::FromStr;

macro_rules! force_things {
    ( $( $variant:ident => $name:expr ),* $(,)? ) => {
        /// One forceable behaviour, named the way it appears on the
        /// `--force-<thing>` / `--refuse-<thing>` command line surface.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum Thing {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
        }

        impl Thing {
            /// Return the `<thing>` token as it appears after `--force-`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            const ALL: &'static [Thing] = &[ $( Thing::$variant, )* ];
        }

        impl FromStr for Thing {
            type Err = ParseThingError;

            fn from_str(v: &str) -> Result<Self, Self::Err> {
                match v {
                    $( $name => Ok(Self::$variant), )*
                    "all" => Err(ParseThingError::IsAllAlias),
                    _ => Err(ParseThingError::Unknown),
                }
            }
        }
    };
}

force_things! {
    Downgrade => "downgrade",
    ConfigureAny => "configure-any",
    Hold => "hold",
    NotRoot => "not-root",
    BadPath => "bad-path",
    BadVerify => "bad-verify",
    BadVersion => "bad-version",
    Overwrite => "overwrite",
    OverwriteDiverted => "overwrite-diverted",
    OverwriteDir => "overwrite-dir",
    UnsafeIo => "unsafe-io",
    ScriptChrootless => "script-chrootless",
    ConfNew => "confnew",
    ConfOld => "confold",
    ConfDef => "confdef",
    ConfMiss => "confmiss",
    ConfAsk => "confask",
    Architecture => "architecture",
    Breaks => "breaks",
    Conflicts => "conflicts",
    Depends => "depends",
    DependsVersion => "depends-version",
    RemoveReinstreq => "remove-reinstreq",
    RemoveEssential => "remove-essential",
    StatoverrideAdd => "statoverride-add",
    StatoverrideRemove => "statoverride-remove",
    SecurityMac => "security-mac",
}

/// `--force-<thing>` named an unrecognized or malformed token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseThingError {
    /// The caller passed the literal `all`, which selects every [Thing] at
    /// once rather than naming one -- handle it with [Force::all] instead
    /// of trying to parse it as a single [Thing].
    IsAllAlias,
    /// Not a recognized force-thing name.
    Unknown,
}
crate::errors::error_enum!(ParseThingError);

/// The set of force-flags in effect for a run, threaded through the
/// [crate::context::Context]. Every caller that would otherwise abort a
/// fatal check consults [Force::contains]; when it returns `true` the
/// check is downgraded to a warning and the action proceeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Force {
    enabled: Vec<Thing>,
}

impl Force {
    /// An empty force set: every check is enforced.
    pub fn none() -> Self {
        Self::default()
    }

    /// A force set with every [Thing] enabled, as selected by
    /// `--force-all`.
    pub fn all() -> Self {
        Self {
            enabled: Thing::ALL.to_vec(),
        }
    }

    /// Enable forcing of `thing`.
    pub fn set(&mut self, thing: Thing) {
        if !self.enabled.contains(&thing) {
            self.enabled.push(thing);
        }
    }

    /// Disable forcing of `thing` (the `--no-force-<thing>`/`--refuse-<thing>`
    /// surface).
    pub fn unset(&mut self, thing: Thing) {
        self.enabled.retain(|t| *t != thing);
    }

    /// Return true if `thing` is currently forced.
    pub fn contains(&self, thing: Thing) -> bool {
        self.enabled.contains(&thing)
    }
}

/// Wraps a fatal error that was downgraded to a warning because the
/// corresponding [Thing] was forced. The action described by `action` was
/// still taken; callers should log it, not silently swallow it.
#[derive(Clone, Debug)]
pub struct Forced {
    /// Which force-thing authorized bypassing the check.
    pub thing: Thing,
    /// Human-readable description of the action that was forced through.
    pub action: String,
}

impl std::fmt::Display for Forced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "forced past check ({}): {}",
            self.thing.as_str(),
            self.action
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_set_unset() {
        let mut force = Force::none();
        assert!(!force.contains(Thing::Downgrade));
        force.set(Thing::Downgrade);
        assert!(force.contains(Thing::Downgrade));
        force.unset(Thing::Downgrade);
        assert!(!force.contains(Thing::Downgrade));
    }

    #[test]
    fn test_force_all() {
        let force = Force::all();
        assert!(force.contains(Thing::Breaks));
        assert!(force.contains(Thing::RemoveEssential));
    }

    #[test]
    fn test_thing_from_str() {
        assert_eq!("breaks".parse::<Thing>().unwrap(), Thing::Breaks);
        assert_eq!("all".parse::<Thing>(), Err(ParseThingError::IsAllAlias));
        assert_eq!("nonsense".parse::<Thing>(), Err(ParseThingError::Unknown));
    }
}

// vim: foldmethod=marker
