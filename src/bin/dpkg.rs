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

//! Thin CLI front-end over [dpkg_core]'s database and removal lifecycle.
//! Builds a [dpkg_core::context::Context] from the environment and
//! dispatches straight into library calls -- no usage text or locale
//! handling beyond what `clap` gives us for free, see `spec.md` §1.

use clap::{Parser, Subcommand};
use dpkg_core::context::Context;
use dpkg_core::db::{infodb, Database, OpenMode};
use dpkg_core::force::{Force, Thing};
use dpkg_core::remove::{self, Mode, Target};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "dpkg", about = "Install, remove and query Debian packages")]
struct Cli {
    /// Root to treat as `/` (`DPKG_ROOT`).
    #[arg(long, default_value = "/")]
    root: PathBuf,

    /// Admin directory override (`DPKG_ADMINDIR`).
    #[arg(long)]
    admindir: Option<PathBuf>,

    /// Repeatable `--force-<thing>` flags.
    #[arg(long = "force", value_name = "THING")]
    force: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove a package, leaving conffiles behind.
    Remove { package: String },
    /// Remove a package and its conffiles.
    Purge { package: String },
}

fn build_context(cli: &Cli) -> Result<Context, Box<dyn std::error::Error>> {
    let mut ctx = Context::new(&cli.root);
    if let Some(admindir) = &cli.admindir {
        ctx = ctx.with_admindir(admindir);
    }

    let mut force = Force::none();
    for raw in &cli.force {
        let thing = Thing::from_str(raw).map_err(|_| format!("unknown force flag: {raw}"))?;
        force.set(thing);
    }
    ctx.force = force;
    Ok(ctx)
}

fn run_mode(
    ctx: &mut Context,
    package: &str,
    mode: Mode,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open(ctx, OpenMode::Write)?;
    let format = infodb::read_format(ctx)?;

    let (pkg_id, name, arch) = {
        let arena = db.arena();
        let set = arena
            .find_set(package)
            .ok_or_else(|| format!("package '{package}' is not known"))?;
        let pkg_id = arena
            .set(set)
            .instances
            .first()
            .copied()
            .ok_or_else(|| format!("package '{package}' has no recorded instance"))?;
        let pkginfo = arena.pkginfo(pkg_id);
        (pkg_id, arena.set(pkginfo.set).name.clone(), pkginfo.architecture.clone())
    };

    let target = Target {
        pkg: pkg_id,
        name: &name,
        arch: &arch,
        format,
    };

    match mode {
        Mode::Remove => remove::remove(ctx, db.arena_mut(), &target)?,
        Mode::Purge => {
            remove::remove(ctx, db.arena_mut(), &target)?;
            remove::purge(ctx, db.arena_mut(), &target)?;
        }
    }

    db.note(ctx, &name)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let mut ctx = build_context(&cli)?;

    match &cli.command {
        Command::Remove { package } => run_mode(&mut ctx, package, Mode::Remove)?,
        Command::Purge { package } => run_mode(&mut ctx, package, Mode::Purge)?,
    }

    Ok(())
}

// vim: foldmethod=marker
