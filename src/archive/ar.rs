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

//! The common `ar` container format a `.deb` wraps its members in: a
//! fixed 8-byte global magic, then a run of members, each a 60-byte
//! fixed-width header followed by the member's (even-padded) bytes.

use crate::archive::error::Error;

/// Global header every ar archive opens with.
pub const GLOBAL_MAGIC: &[u8; 8] = b"!<arch>\n";

/// Per-member header trailer.
const HEADER_END: &[u8; 2] = b"`\n";

/// One member of an ar archive: a name (at most 16 bytes once padded)
/// and its raw content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    /// Member name, e.g. `"debian-binary"` or `"control.tar.gz"`.
    pub name: String,
    /// Raw, uncompressed-by-this-layer member bytes.
    pub data: Vec<u8>,
}

/// Serialize `members` as a complete ar archive.
pub fn write_archive(members: &[Member]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(GLOBAL_MAGIC);
    for member in members {
        write_member(&mut out, member);
    }
    out
}

fn write_member(out: &mut Vec<u8>, member: &Member) {
    out.extend_from_slice(&pad_field(&member.name, 16));
    out.extend_from_slice(&pad_field("0", 12)); // mtime
    out.extend_from_slice(&pad_field("0", 6)); // uid
    out.extend_from_slice(&pad_field("0", 6)); // gid
    out.extend_from_slice(&pad_field("100644", 8)); // mode
    out.extend_from_slice(&pad_field(&member.data.len().to_string(), 10));
    out.extend_from_slice(HEADER_END);
    out.extend_from_slice(&member.data);
    if member.data.len() % 2 == 1 {
        out.push(b'\n');
    }
}

fn pad_field(value: &str, width: usize) -> Vec<u8> {
    let mut field = value.as_bytes().to_vec();
    field.resize(width, b' ');
    field
}

/// Parse a complete ar archive into its members, in order.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<Member>, Error> {
    if bytes.len() < GLOBAL_MAGIC.len() || &bytes[..GLOBAL_MAGIC.len()] != GLOBAL_MAGIC {
        return Err(Error::NotAnArchive);
    }

    let mut members = Vec::new();
    let mut pos = GLOBAL_MAGIC.len();

    while pos < bytes.len() {
        if bytes.len() - pos < 60 {
            return Err(Error::CorruptHeader);
        }
        let header = &bytes[pos..pos + 60];
        if &header[58..60] != HEADER_END {
            return Err(Error::CorruptHeader);
        }

        let name = std::str::from_utf8(&header[0..16])
            .map_err(|_| Error::CorruptHeader)?
            .trim_end()
            .to_owned();
        let size: usize = std::str::from_utf8(&header[48..58])
            .map_err(|_| Error::CorruptHeader)?
            .trim()
            .parse()
            .map_err(|_| Error::CorruptHeader)?;

        pos += 60;
        if bytes.len() - pos < size {
            return Err(Error::CorruptHeader);
        }
        let data = bytes[pos..pos + size].to_vec();
        pos += size + (size % 2);

        members.push(Member { name, data });
    }

    Ok(members)
}


// vim: foldmethod=marker
