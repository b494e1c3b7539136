//! Text reports for tool results.

use pkgscope_analysis::{AnalysisError, BatchAnalysis, MemberListing, TypeListing};
use pkgscope_core::{AnalysisResult, MemberKind, MemberNode, SymbolGraph, TypeId, TypeNode};
use pkgscope_registry::{
    binaries, select_tier, DownloadedPackage, PackageSummary, PackageVersionCandidate, Provenance,
};

/// Versions shown by package details.
pub const VERSION_DISPLAY_LIMIT: usize = 20;

const REFERENCE_ONLY_WARNING: &str =
    "WARNING: reference-only artifact (compile-time stub); member bodies are not available.";

fn keyword_prefix(keywords: &[&str]) -> String {
    keywords.iter().map(|k| format!("{k} ")).collect()
}

fn artifact_heading(r: &AnalysisResult) -> String {
    let id = &r.identity;
    match &id.platform {
        Some(p) => format!("{} {} / {} [{p}]", id.package_id, id.package_version, id.file_name),
        None => format!("{} {} / {}", id.package_id, id.package_version, id.file_name),
    }
}

pub fn package_search(query: &str, results: &[PackageSummary]) -> String {
    if results.is_empty() {
        return format!("No packages found matching '{query}'.\n");
    }
    let mut out = format!("Found {} package(s) matching '{query}':\n", results.len());
    for p in results {
        out.push_str(&format!(
            "  {} {} ({} downloads)\n",
            p.id, p.latest_version, p.total_downloads
        ));
        if let Some(desc) = p.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("    {desc}\n"));
        }
        if !p.authors.is_empty() {
            out.push_str(&format!("    by {}\n", p.authors.join(", ")));
        }
    }
    out
}

/// `versions` must be sorted newest first.
pub fn package_details(versions: &[PackageVersionCandidate]) -> String {
    let Some(latest) = versions.first() else {
        return "No versions published.\n".to_string();
    };
    let mut out = format!("{}\n", latest.identity.id);
    out.push_str(&format!("  Latest version: {}\n", latest.identity.version));
    if !latest.authors.is_empty() {
        out.push_str(&format!("  Authors: {}\n", latest.authors.join(", ")));
    }
    if let Some(desc) = &latest.description {
        out.push_str(&format!("  Description: {desc}\n"));
    }
    if !latest.tags.is_empty() {
        out.push_str(&format!("  Tags: {}\n", latest.tags.join(", ")));
    }
    let total: u64 = versions.iter().filter_map(|v| v.download_count).sum();
    out.push_str(&format!("  Total downloads: {total}\n"));

    let shown = versions.len().min(VERSION_DISPLAY_LIMIT);
    out.push_str(&format!("\nVersions (showing {shown} of {}):\n", versions.len()));
    for v in versions.iter().take(VERSION_DISPLAY_LIMIT) {
        let mut line = format!("  {}", v.identity.version);
        if let Some(date) = &v.published {
            line.push_str(&format!("  published {date}"));
        }
        if let Some(n) = v.download_count {
            line.push_str(&format!("  ({n} downloads)"));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&format!("\nDependencies of {}:\n", latest.identity.version));
    if latest.dependency_groups.is_empty() {
        out.push_str("  (none)\n");
    }
    for group in &latest.dependency_groups {
        out.push_str(&format!("  {}:\n", group.platform.as_deref().unwrap_or("any platform")));
        if group.dependencies.is_empty() {
            out.push_str("    (none)\n");
        }
        for (id, range) in &group.dependencies {
            out.push_str(&format!("    - {id} {range}\n"));
        }
    }
    out
}

pub fn package_artifacts(package: &DownloadedPackage) -> String {
    let mut out = format!("Artifacts of {}:\n", package.identity);
    let in_use = select_tier(&package.groups).map(|(p, _)| p);
    if in_use.is_none() {
        out.push_str("  (no platform groups contain binaries)\n");
        return out;
    }
    for provenance in [Provenance::Normal, Provenance::ReferenceOnly, Provenance::LegacyFramework] {
        let groups = package.groups.of(provenance);
        if groups.is_empty() {
            continue;
        }
        let marker = if in_use == Some(provenance) { " (in use)" } else { "" };
        out.push_str(&format!("\n{}{marker}:\n", provenance.label()));
        for group in groups {
            out.push_str(&format!("  {}:\n", group.platform));
            let mut any = false;
            for file in binaries(group) {
                out.push_str(&format!("    {file}\n"));
                any = true;
            }
            if !any {
                out.push_str("    (no binaries)\n");
            }
        }
    }
    if in_use != Some(Provenance::Normal) {
        out.push_str(&format!("\n{REFERENCE_ONLY_WARNING}\n"));
    }
    out
}

pub fn analysis(r: &AnalysisResult) -> String {
    let mut out = format!("{}\n", artifact_heading(r));
    if let Some(v) = &r.identity.binary_version {
        out.push_str(&format!("Binary version: {v}\n"));
    }
    if r.reference_only {
        out.push_str(REFERENCE_ONLY_WARNING);
        out.push('\n');
    }

    let c = &r.counts;
    out.push_str(&format!("\nTypes: {} ({} public)\n", c.all, c.public));
    out.push_str(&format!(
        "  classes: {}, static classes: {}, interfaces: {}, enums: {}, structs: {}, delegates: {}\n",
        c.classes, c.static_classes, c.interfaces, c.enums, c.structs, c.delegates
    ));

    out.push_str(&format!("\nNamespaces ({}):\n", r.namespaces.len()));
    for (ns, count) in &r.namespace_type_counts {
        let name = if ns.is_empty() { "<global>" } else { ns.as_str() };
        out.push_str(&format!("  {name} ({count} types)\n"));
    }

    if !r.referenced_artifacts.is_empty() {
        out.push_str(&format!("\nReferences ({}):\n", r.referenced_artifacts.len()));
        for name in &r.referenced_artifacts {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}

pub fn batch(b: &BatchAnalysis) -> String {
    let ok = b.artifacts.iter().filter(|a| a.result.is_ok()).count();
    let mut out = format!(
        "Analyzed {ok} of {} artifact(s) in {} [{}]:\n",
        b.artifacts.len(),
        b.identity,
        b.platform
    );
    if b.provenance != Provenance::Normal {
        out.push_str(&format!(
            "WARNING: no runtime binaries; using {} group.\n",
            b.provenance.label()
        ));
    }
    for a in &b.artifacts {
        match &a.result {
            Ok(r) => out.push_str(&format!(
                "  ok    {} ({} types, {} namespaces)\n",
                a.file_name,
                r.counts.all,
                r.namespaces.len()
            )),
            Err(e) => out.push_str(&format!("  fail  {}: {e}\n", a.file_name)),
        }
    }
    out
}

/// `public abstract class Foo.Bar : Base, IThing`
pub fn type_declaration(t: &TypeNode) -> String {
    let mut out = format!(
        "{} {}{} {}",
        t.visibility.keyword(),
        keyword_prefix(&t.modifiers.keywords()),
        t.kind.keyword(),
        t.full_name
    );
    let supertypes: Vec<&str> = t
        .base_type
        .iter()
        .map(String::as_str)
        .chain(t.interfaces.iter().map(String::as_str))
        .collect();
    if !supertypes.is_empty() {
        out.push_str(&format!(" : {}", supertypes.join(", ")));
    }
    out
}

pub fn type_listing(r: &AnalysisResult, pattern: Option<&str>, listing: &TypeListing<'_>) -> String {
    let pattern = pattern.map(str::trim).filter(|p| !p.is_empty()).unwrap_or("*");
    let mut out = format!(
        "Types in {} matching '{pattern}' (showing {} of {}):\n",
        artifact_heading(r),
        listing.types.len(),
        listing.total
    );
    if listing.types.is_empty() {
        out.push_str("  (none)\n");
    }
    for (_, t) in &listing.types {
        out.push_str(&format!("  {}\n", type_declaration(t)));
    }
    if r.reference_only {
        out.push_str(REFERENCE_ONLY_WARNING);
        out.push('\n');
    }
    out
}

fn parameters(m: &MemberNode) -> String {
    m.parameters
        .iter()
        .map(|p| format!("{} {}", p.type_name, p.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One member rendered as a declaration.
pub fn member_signature(owner: &TypeNode, m: &MemberNode) -> String {
    let vis = m.visibility.keyword();
    let mods = keyword_prefix(&m.modifiers.keywords());
    let ty = m.return_type.as_deref().unwrap_or("void");
    match m.kind {
        MemberKind::Constructor => format!("{vis} {mods}{}({})", owner.name, parameters(m)),
        MemberKind::Method => format!("{vis} {mods}{ty} {}({})", m.name, parameters(m)),
        MemberKind::Property | MemberKind::Field => format!("{vis} {mods}{ty} {}", m.name),
        MemberKind::Event => format!("{vis} {mods}event {ty} {}", m.name),
    }
}

pub fn member_listing(graph: &SymbolGraph, ty: TypeId, include_inherited: bool, listing: &MemberListing<'_>) -> String {
    let Some(owner) = graph.type_node(ty) else {
        return String::new();
    };
    let mut out = format!("{}\n", type_declaration(owner));
    if include_inherited {
        out.push_str("(inherited members included)\n");
    }
    if listing.is_empty() {
        out.push_str("\nNo members match.\n");
        return out;
    }

    let sections: [(&str, &[&MemberNode]); 5] = [
        ("Constructors", &listing.constructors),
        ("Methods", &listing.methods),
        ("Properties", &listing.properties),
        ("Fields", &listing.fields),
        ("Events", &listing.events),
    ];
    for (title, members) in sections {
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title} ({}):\n", members.len()));
        for m in members {
            let mut line = format!("  {}", member_signature(owner, m));
            if m.declaring_type != ty {
                if let Some(declaring) = graph.type_node(m.declaring_type) {
                    line.push_str(&format!("  [from {}]", declaring.name));
                }
            }
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// A failure, as shown to the caller.
pub fn error(err: &AnalysisError) -> String {
    let mut out = format!("Error ({}): {err}\n", err.kind());
    if let AnalysisError::CacheMiss { key, cached } = err {
        if cached.is_empty() {
            out.push_str(&format!("No artifacts of '{}' are cached.\n", key.package_id()));
        } else {
            out.push_str(&format!("Cached artifacts of '{}':\n", key.package_id()));
            for id in cached {
                out.push_str(&format!(
                    "  - version {}, {}, platform {}\n",
                    id.package_version,
                    id.file_name,
                    id.platform.as_deref().unwrap_or("(any)")
                ));
            }
        }
        out.push_str("Run analyze-artifact (or analyze-all-artifacts) first.\n");
    }
    out
}
