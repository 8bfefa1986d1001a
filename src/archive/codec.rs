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

//! Pluggable compressor used on the `control.tar.*`/`data.tar.*` ar
//! members. Each [Codec] shells a system binary rather than linking a
//! compression library directly, mirroring the `compress_filter`
//! subprocess choreography the archive layer's build/extract pipeline is
//! grounded on.

use crate::archive::error::Error;
use std::io::{Read, Write};
use std::process::{Command, Stdio};

/// A compressor/decompressor identified by the filename extension it
/// appends to a data/control member (`control.tar.gz` names the
/// [Codec::Gzip] codec, and so on).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Codec {
    /// No compression; member is a bare tarball.
    None,
    /// `gzip`, the default for both members since dpkg 1.17.
    Gzip,
    /// `xz`.
    Xz,
    /// `zstd`.
    Zstd,
}

impl Codec {
    /// Filename extension appended after `.tar` (empty for [Codec::None]).
    pub fn extension(&self) -> &'static str {
        match self {
            Codec::None => "",
            Codec::Gzip => ".gz",
            Codec::Xz => ".xz",
            Codec::Zstd => ".zst",
        }
    }

    /// Recognize a codec from the extension following `.tar` in a member
    /// name (e.g. `".gz"`, `".xz"`, `""`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "" => Some(Codec::None),
            ".gz" => Some(Codec::Gzip),
            ".xz" => Some(Codec::Xz),
            ".zst" => Some(Codec::Zstd),
            _ => None,
        }
    }

    fn program(&self) -> Option<&'static str> {
        match self {
            Codec::None => None,
            Codec::Gzip => Some("gzip"),
            Codec::Xz => Some("xz"),
            Codec::Zstd => Some("zstd"),
        }
    }

    /// Compress `input` and return the compressed bytes.
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        match self.program() {
            None => Ok(input.to_vec()),
            Some(program) => run_filter(program, &["-c"], input),
        }
    }

    /// Decompress `input` and return the plaintext bytes.
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, Error> {
        match self.program() {
            None => Ok(input.to_vec()),
            Some(program) => run_filter(program, &["-dc"], input),
        }
    }
}

fn run_filter(program: &str, args: &[&str], input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Subprocess {
            program: program.to_owned(),
            detail: e.to_string(),
        })?;

    let mut stdin = child.stdin.take().expect("piped stdin");
    let input = input.to_vec();
    let writer = std::thread::spawn(move || {
        let _ = stdin.write_all(&input);
    });

    let mut output = Vec::new();
    child
        .stdout
        .take()
        .expect("piped stdout")
        .read_to_end(&mut output)
        .map_err(|e| Error::Subprocess {
            program: program.to_owned(),
            detail: e.to_string(),
        })?;

    let _ = writer.join();

    let status = child.wait().map_err(|e| Error::Subprocess {
        program: program.to_owned(),
        detail: e.to_string(),
    })?;

    if !status.success() {
        let mut stderr = String::new();
        if let Some(mut e) = child.stderr.take() {
            let _ = e.read_to_string(&mut stderr);
        }
        return Err(Error::Subprocess {
            program: program.to_owned(),
            detail: stderr,
        });
    }

    Ok(output)
}


// vim: foldmethod=marker
