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

#![deny(missing_docs)]
#![deny(missing_copy_implementations)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

//! 🎉 You found the `dpkg-core` crate! 🎉
//!
//! This crate is under active development, and "soft launched". *Please do
//! not post widely directing to this crate yet* -- the API shipped today is
//! unstable, and is likely to change -- fairly significantly -- without much
//! regard to very precisely following semver until it stabalizes.
//!
//! You're more than welcome to play with this and use it, but it's not
//! something I would encourage load bearing infrastructure to be written
//! with as of right now.
//!
//! # Introduction
//!
//! `dpkg-core` is the package-management core underneath a `dpkg`-alike
//! tool: building and extracting the binary archive format, maintaining
//! the installed/available package database, and resolving the
//! dependency graph well enough to drive an install/remove run to a
//! fixed point.
//!
//! Common use-cases are broken out into modules in the `dpkg_core` crate
//! namespace: building and extracting binary archives ([archive]),
//! reading and writing the package database ([db]), walking the
//! in-memory dependency graph ([depgraph]) and resolving it ([solver]),
//! parsing [control] files, [dependency] relationships between packages,
//! [version] numbers, and Debian [architecture] strings.
//!
//! # Feature Flags
//!
//! There are a few feature flags. There's no standard way to document
//! the purpose and intent, so until that's a thing, here's a markdown
//! table.
//!
//! | Flag      | Description                                                              |
//! | --------- | ------------------------------------------------------------------------ |
//! | `full`    | Enable all optional features.                                            |
//! | `chrono`  | Enable parsing dates using the [chrono] crate.                           |
//! | `serde`   | Enable support for encoding and decoding using [serde]                   |
//! | `sequoia` | Enable support for validating OpenPGP signatures using [sequoia_openpgp] |
//! | `tokio`   | Enable support for the [tokio] crate.                                    |
//!
//! # Feature `chrono`
//!
//! Enable parsing dates from ASCII into a [chrono::DateTime].
//!
//! # Feature `serde`
//!
//! This exports two new modules for working with control files, [control::de],
//! and [control::ser] to read or write (respectively) control files in the
//! Debian RFC2822-style format, as is our convention.
//!
//! # Feature `sequoia`
//!
//! Enable functions to verify Debian control files using the [sequoia_openpgp]
//! OpenPGP implementation. This will export a few helpers throughout
//! the crate, such as [control::de::from_clearsigned_str].
//!
//! # Feature `tokio`
//!
//! Enable functions to handle places where there's an i/o boundary that is
//! handled by [tokio::io] rather than [std::io].

pub mod archive;
pub mod architecture;
pub mod build_profile;
pub mod context;
pub mod control;
pub mod db;
pub mod depgraph;
pub mod dependency;
pub(crate) mod errors;
pub mod force;
pub mod queue;
pub mod remove;
pub mod script;
pub mod solver;
pub mod version;

// vim: foldmethod=marker
