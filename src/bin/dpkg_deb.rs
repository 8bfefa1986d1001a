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

//! Thin CLI front-end over [dpkg_core::archive]. No usage text or locale
//! handling beyond what `clap` gives us for free -- see `spec.md` §1.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dpkg-deb", about = "Build and extract .deb archives")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a `.deb` from a `DEBIAN/`-rooted source tree.
    Build {
        source_dir: PathBuf,
        dest: PathBuf,
    },
    /// Extract an archive's data tarball (or control tarball with `-e`).
    Extract {
        archive: PathBuf,
        dest: PathBuf,
        #[arg(short = 'e', long)]
        control: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "serde")]
        Command::Build { source_dir, dest } => {
            dpkg_core::archive::build(&source_dir, &dest, dpkg_core::archive::BuildParams::default())?;
        }
        #[cfg(not(feature = "serde"))]
        Command::Build { .. } => {
            eprintln!("dpkg-deb was built without the `serde` feature, which `build` needs to parse DEBIAN/control");
            std::process::exit(2);
        }
        Command::Extract {
            archive,
            dest,
            control,
        } => {
            dpkg_core::archive::extract(&archive, &dest, control)?;
        }
    }

    Ok(())
}

// vim: foldmethod=marker
