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

//! Codec between the `status`/`available` RFC822 stanza files and the
//! in-memory [Arena]. Each stanza describes one arch-qualified package;
//! stanzas are separated by exactly one blank line.

use crate::architecture::Architecture;
use crate::control::RawParagraph;
use crate::db::error::Error;
use crate::dependency::{Dependency, VersionOperator};
use crate::depgraph::{
    Arena, Conffile, DepType, DependencyGroup, EFlags, PkginfoId, Pkgbin, Snapshot, Status, Want,
};
use crate::version::{Relation, Version};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

const DEP_FIELDS: &[(&str, DepType)] = &[
    ("Depends", DepType::Depends),
    ("Pre-Depends", DepType::PreDepends),
    ("Recommends", DepType::Recommends),
    ("Suggests", DepType::Suggests),
    ("Enhances", DepType::Enhances),
    ("Breaks", DepType::Breaks),
    ("Conflicts", DepType::Conflicts),
    ("Provides", DepType::Provides),
    ("Replaces", DepType::Replaces),
];

const KNOWN_FIELDS: &[&str] = &[
    "Package",
    "Architecture",
    "Multi-Arch",
    "Version",
    "Status",
    "Priority",
    "Section",
    "Installed-Size",
    "Maintainer",
    "Essential",
    "Protected",
    "Conffiles",
    "Description",
    "Source",
    "Triggers-Pending",
    "Triggers-Awaited",
    "Config-Version",
    "Depends",
    "Pre-Depends",
    "Recommends",
    "Suggests",
    "Breaks",
    "Conflicts",
    "Provides",
    "Replaces",
    "Enhances",
];

/// Load a status (or available) file at `path` into `arena`, creating
/// [crate::depgraph::Pkgset]/[crate::depgraph::Pkginfo] entries as
/// needed. Stanzas are recorded against `snapshot`: [Snapshot::Installed]
/// for `status`, [Snapshot::Available] for `available`.
pub fn load(path: &Path, arena: &mut Arena, snapshot: Snapshot) -> Result<(), Error> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io(path, e)),
    };

    for stanza in split_stanzas(&text) {
        load_stanza(path, stanza, arena, snapshot)?;
    }
    Ok(())
}

/// Serialize every [Pkginfo] instance's `snapshot` bin in `arena` back
/// into the stanza text format, in arena creation order.
pub fn dump(arena: &Arena, snapshot: Snapshot) -> String {
    let mut out = String::new();
    for id in arena.pkginfo_ids() {
        let info = arena.pkginfo(id);
        let bin = match snapshot {
            Snapshot::Installed => &info.installed,
            Snapshot::Available => &info.available,
        };
        let Some(bin) = bin else { continue };

        if !out.is_empty() {
            out.push('\n');
        }
        let name = arena.set(info.set).name.clone();
        write_stanza(
            &mut out,
            arena,
            &name,
            info.architecture,
            info.status,
            info.want,
            info.eflags,
            bin,
        );
    }
    out
}

fn split_stanzas(text: &str) -> Vec<&str> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn load_stanza(
    path: &Path,
    stanza: &str,
    arena: &mut Arena,
    snapshot: Snapshot,
) -> Result<(), Error> {
    let raw = RawParagraph::parse(stanza).map_err(|e| Error::MalformedStanza {
        path: path.to_owned(),
        detail: format!("{e:?}"),
    })?;

    let mut fields: HashMap<String, String> = HashMap::new();
    for field in &raw.fields {
        fields.insert(field.key.clone(), field.value.clone());
    }

    let name = fields
        .get("Package")
        .cloned()
        .ok_or(Error::MissingField {
            path: path.to_owned(),
            field: "Package",
        })?;
    let arch_str = fields.get("Architecture").cloned().ok_or(Error::MissingField {
        path: path.to_owned(),
        field: "Architecture",
    })?;
    let arch = Architecture::from_str(&arch_str)
        .map_err(|_| Error::MalformedStanza {
            path: path.to_owned(),
            detail: format!("bad architecture {arch_str:?}"),
        })?;

    let set = arena.ensure_set(&name);
    let id = arena.ensure_instance(set, arch);

    let version_str = fields.get("Version").cloned().ok_or(Error::MissingField {
        path: path.to_owned(),
        field: "Version",
    })?;
    let version = Version::from_str(&version_str).map_err(|_| Error::MalformedStanza {
        path: path.to_owned(),
        detail: format!("bad version {version_str:?}"),
    })?;

    if let Some(status_str) = fields.get("Status") {
        let (want, status, eflags) = parse_status_field(status_str)?;
        let info = arena.pkginfo_mut(id);
        info.want = want;
        info.status = status;
        info.eflags = eflags;
    }

    {
        let info = arena.pkginfo_mut(id);
        info.priority = fields.get("Priority").cloned();
        info.section = fields.get("Section").cloned();
        info.essential = fields.get("Essential").is_some_and(|v| v.trim() == "yes");
        info.protected = fields.get("Protected").is_some_and(|v| v.trim() == "yes");
        info.trigpend = fields
            .get("Triggers-Pending")
            .map(|v| v.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
        info.trigaw = fields
            .get("Triggers-Awaited")
            .map(|v| v.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();
    }

    let mut extra_fields = HashMap::new();
    for field in &raw.fields {
        if !KNOWN_FIELDS.contains(&field.key.as_str()) {
            extra_fields.insert(field.key.clone(), field.value.clone());
        }
    }

    let mut dependencies = Vec::new();
    for (field_name, dep_type) in DEP_FIELDS {
        if let Some(value) = fields.get(*field_name) {
            let parsed = Dependency::from_str(value).map_err(|_| Error::MalformedStanza {
                path: path.to_owned(),
                detail: format!("bad {field_name} value"),
            })?;
            for relation in parsed.relations {
                dependencies.push((*dep_type, to_dependency_group(arena, id, snapshot, *dep_type, &relation)));
            }
        }
    }

    let conffiles = fields
        .get("Conffiles")
        .map(|v| parse_conffiles(v))
        .unwrap_or_default();

    let bin = Pkgbin {
        version,
        maintainer: fields.get("Maintainer").cloned().unwrap_or_default(),
        description: fields.get("Description").cloned().unwrap_or_default(),
        multi_arch_same: fields.get("Multi-Arch").map(|v| v.trim() == "same").unwrap_or(false),
        dependencies,
        conffiles,
        extra_fields,
    };

    let info = arena.pkginfo_mut(id);
    match snapshot {
        Snapshot::Installed => info.installed = Some(bin),
        Snapshot::Available => info.available = Some(bin),
    }

    Ok(())
}

fn to_dependency_group(
    arena: &mut Arena,
    depender: PkginfoId,
    snapshot: Snapshot,
    dep_type: DepType,
    relation: &crate::dependency::Relation,
) -> DependencyGroup {
    let mut group = DependencyGroup::default();
    for possibility in &relation.possibilities {
        let target_arch = possibility.arch.clone();
        let version = possibility
            .version_constraint
            .as_ref()
            .map(|vc| (to_version_relation(vc.operator), vc.version.clone()));

        let possi = crate::depgraph::Possibility {
            up: depender,
            up_snapshot: snapshot,
            dep_type,
            target: possibility.name.clone(),
            target_arch,
            version,
            cyclebreak: std::cell::Cell::new(false),
        };
        group.possibilities.push(arena.add_possibility(possi));
    }
    group
}

fn to_version_relation(op: VersionOperator) -> Relation {
    match op {
        VersionOperator::Equal => Relation::Equal,
        VersionOperator::GreaterThan => Relation::StrictlyGreater,
        VersionOperator::LessThan => Relation::StrictlyLess,
        VersionOperator::GreaterThanOrEqual => Relation::GreaterOrEqual,
        VersionOperator::LessThanOrEqual => Relation::LessOrEqual,
    }
}

fn parse_status_field(value: &str) -> Result<(Want, Status, EFlags), Error> {
    let mut parts = value.split_whitespace();
    let want = parts.next().ok_or_else(|| Error::MalformedStatusField(value.to_owned()))?;
    let status = parts.next().ok_or_else(|| Error::MalformedStatusField(value.to_owned()))?;
    let eflag = parts.next().ok_or_else(|| Error::MalformedStatusField(value.to_owned()))?;

    let want = match want {
        "unknown" => Want::Unknown,
        "install" => Want::Install,
        "hold" => Want::Hold,
        "deinstall" => Want::Deinstall,
        "purge" => Want::Purge,
        _ => return Err(Error::MalformedStatusField(value.to_owned())),
    };
    let status = match status {
        "not-installed" => Status::NotInstalled,
        "config-files" => Status::ConfigFiles,
        "half-installed" => Status::HalfInstalled,
        "unpacked" => Status::Unpacked,
        "half-configured" => Status::HalfConfigured,
        "triggers-awaited" => Status::TriggersAwaited,
        "triggers-pending" => Status::TriggersPending,
        "installed" => Status::Installed,
        _ => return Err(Error::MalformedStatusField(value.to_owned())),
    };
    let eflags = match eflag {
        "ok" => EFlags {
            ok: true,
            reinst_required: false,
        },
        "reinstreq" => EFlags {
            ok: false,
            reinst_required: true,
        },
        _ => return Err(Error::MalformedStatusField(value.to_owned())),
    };

    Ok((want, status, eflags))
}

fn format_status_field(want: Want, status: Status, eflags: EFlags) -> String {
    let want = match want {
        Want::Unknown => "unknown",
        Want::Install => "install",
        Want::Hold => "hold",
        Want::Deinstall => "deinstall",
        Want::Purge => "purge",
    };
    let status = match status {
        Status::NotInstalled => "not-installed",
        Status::ConfigFiles => "config-files",
        Status::HalfInstalled => "half-installed",
        Status::Unpacked => "unpacked",
        Status::HalfConfigured => "half-configured",
        Status::TriggersAwaited => "triggers-awaited",
        Status::TriggersPending => "triggers-pending",
        Status::Installed => "installed",
    };
    let eflag = if eflags.reinst_required { "reinstreq" } else { "ok" };
    format!("{want} {status} {eflag}")
}

fn parse_conffiles(value: &str) -> Vec<Conffile> {
    value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let obsolete = line.starts_with('#');
            let line = line.trim_start_matches('#').trim();
            let mut parts = line.rsplitn(2, char::is_whitespace);
            let hash = parts.next().unwrap_or_default().to_owned();
            let path = parts.next().unwrap_or(line).trim().to_owned();
            Conffile {
                path,
                hash,
                obsolete,
                remove_on_upgrade: false,
            }
        })
        .collect()
}

fn format_conffiles(conffiles: &[Conffile]) -> String {
    conffiles
        .iter()
        .map(|c| {
            if c.obsolete {
                format!("#{} {}", c.path, c.hash)
            } else {
                format!("{} {}", c.path, c.hash)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn relation_as_dpkg_str(rel: Relation) -> &'static str {
    match rel {
        Relation::StrictlyLess => "<<",
        Relation::LessOrEqual => "<=",
        Relation::Equal => "=",
        Relation::GreaterOrEqual => ">=",
        Relation::StrictlyGreater => ">>",
    }
}

fn format_possibility(arena: &Arena, id: crate::depgraph::PossiId) -> String {
    let possi = arena.possibility(id);
    let mut s = possi.target.clone();
    if let Some(arch) = &possi.target_arch {
        s.push_str(&format!(":{arch}"));
    }
    if let Some((rel, version)) = &possi.version {
        s.push_str(&format!(" ({} {})", relation_as_dpkg_str(*rel), version));
    }
    s
}

fn format_dependency_group(arena: &Arena, group: &DependencyGroup) -> String {
    group
        .possibilities
        .iter()
        .map(|id| format_possibility(arena, *id))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[allow(clippy::too_many_arguments)]
fn write_stanza(
    out: &mut String,
    arena: &Arena,
    name: &str,
    arch: Architecture,
    status: Status,
    want: Want,
    eflags: EFlags,
    bin: &Pkgbin,
) {
    out.push_str(&format!("Package: {name}\n"));
    out.push_str(&format!("Status: {}\n", format_status_field(want, status, eflags)));
    out.push_str(&format!("Architecture: {arch}\n"));
    if bin.multi_arch_same {
        out.push_str("Multi-Arch: same\n");
    }
    out.push_str(&format!("Version: {}\n", bin.version));
    out.push_str(&format!("Maintainer: {}\n", bin.maintainer));
    out.push_str(&format!("Description: {}\n", bin.description));

    for (field_name, dep_type) in DEP_FIELDS {
        let groups: Vec<String> = bin
            .groups_of(*dep_type)
            .map(|g| format_dependency_group(arena, g))
            .collect();
        if !groups.is_empty() {
            out.push_str(&format!("{field_name}: {}\n", groups.join(", ")));
        }
    }

    if !bin.conffiles.is_empty() {
        out.push_str("Conffiles:\n");
        for line in format_conffiles(&bin.conffiles).lines() {
            out.push_str(" ");
            out.push_str(line);
            out.push('\n');
        }
    }

    for (key, value) in &bin.extra_fields {
        out.push_str(&format!("{key}: {value}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::architecture::Architecture;
    use tempfile::tempdir;

    #[test]
    fn test_status_field_roundtrip() {
        let (want, status, eflags) = parse_status_field("install ok installed").unwrap();
        assert_eq!(want, Want::Install);
        assert_eq!(status, Status::Installed);
        assert!(eflags.ok);
        assert_eq!(format_status_field(want, status, eflags), "install ok installed");
    }

    #[test]
    fn test_load_simple_stanza() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status");
        std::fs::write(
            &path,
            "Package: foo\n\
Status: install ok installed\n\
Architecture: amd64\n\
Version: 1.0-1\n\
Maintainer: A <a@example.com>\n\
Description: an example package\n\
Depends: bar (>= 2.0)\n",
        )
        .unwrap();

        let mut arena = Arena::new();
        load(&path, &mut arena, Snapshot::Installed).unwrap();

        let set = arena.find_set("foo").unwrap();
        let id = arena.instance_of(set, &Architecture::Amd64).unwrap();
        let info = arena.pkginfo(id);
        assert_eq!(info.status, Status::Installed);
        let bin = info.installed.as_ref().unwrap();
        assert_eq!(bin.version.to_string(), "1.0-1");
        assert_eq!(bin.groups_of(DepType::Depends).count(), 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let mut arena = Arena::new();
        load(Path::new("/nonexistent/status"), &mut arena, Snapshot::Installed).unwrap();
        assert_eq!(arena.pkginfo_ids().count(), 0);
    }
}

// vim: foldmethod=marker
