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

//! Standalone relational comparison between two [Version] values, the same
//! primitive that backs `--compare-versions` and the solver's version
//! constraint checks.

use super::Version;
use std::cmp::Ordering;
use std::str::FromStr;

/// A version relational operator, as seen on a dependency [Version]
/// constraint or on the `--compare-versions` command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    /// `<<` -- strictly less than.
    StrictlyLess,
    /// `<=` -- less than or equal.
    LessOrEqual,
    /// `=` -- exactly equal.
    Equal,
    /// `>=` -- greater than or equal.
    GreaterOrEqual,
    /// `>>` -- strictly greater than.
    StrictlyGreater,
}

/// A `--compare-versions`-style operator alias failed to parse.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RelationParseError;
crate::errors::error_enum!(RelationParseError);

impl FromStr for Relation {
    type Err = RelationParseError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        Ok(match v {
            "lt" | "<<" | "<" => Self::StrictlyLess,
            "le" | "<=" => Self::LessOrEqual,
            "eq" | "=" | "==" => Self::Equal,
            "ge" | ">=" => Self::GreaterOrEqual,
            "gt" | ">>" | ">" => Self::StrictlyGreater,
            _ => return Err(RelationParseError),
        })
    }
}

impl Relation {
    /// Evaluate `left <op> right`, returning the exit-code-1-or-0 boolean
    /// consulted by `--compare-versions`, and by the solver when matching a
    /// candidate's [Version] against a dependency's constraint.
    pub fn evaluate(&self, left: &Version, right: &Version) -> bool {
        let ord = left.cmp(right);
        match self {
            Self::StrictlyLess => ord == Ordering::Less,
            Self::LessOrEqual => ord != Ordering::Greater,
            Self::Equal => ord == Ordering::Equal,
            Self::GreaterOrEqual => ord != Ordering::Less,
            Self::StrictlyGreater => ord == Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_compare_versions_s1() {
        assert!(v("1:2.3-4") < v("1:2.3-5"));
        assert!(v("1.0~rc1") < v("1.0"));
        assert!(v("2:0") > v("1:99"));
        assert!(Relation::StrictlyLess.evaluate(&v("1.0~"), &v("1.0")));
    }

    #[test]
    fn test_relation_from_str_aliases() {
        assert_eq!("lt".parse::<Relation>().unwrap(), Relation::StrictlyLess);
        assert_eq!("<<".parse::<Relation>().unwrap(), Relation::StrictlyLess);
    }
}

// vim: foldmethod=marker
