//! Declarative manifest documents
//!
//! A manifest enumerates component full names grouped by type, under a
//! versioned root element. Two manifests exist per deployment: an additive
//! one and a destructive one; destructive deployments ship both, with the
//! additive one left empty.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::config::Settings;
use crate::models::component::Component;

/// Additive manifest file name
pub const ADDITIVE_MANIFEST: &str = "manifest.xml";

/// Destructive manifest file name
pub const DESTRUCTIVE_MANIFEST: &str = "destructiveChanges.xml";

/// Component full names grouped by type, ordered and deduplicated.
///
/// `BTreeMap`/`BTreeSet` keep types and members sorted, so a spec always
/// serializes to the same bytes.
pub type PackageSpec = BTreeMap<String, BTreeSet<String>>;

/// Group components by type into a package spec, dropping duplicate
/// (type, full name) pairs.
pub fn group_by_type(components: &[Component]) -> PackageSpec {
    let mut spec = PackageSpec::new();
    for component in components {
        spec.entry(component.type_name.clone())
            .or_default()
            .insert(component.name.clone());
    }
    spec
}

/// Renders package descriptor documents
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    api_version: String,
    namespace: String,
}

impl ManifestBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            api_version: settings.api_version.clone(),
            namespace: settings.manifest_namespace.clone(),
        }
    }

    /// Serialize a package spec into a manifest document.
    ///
    /// Pure: returns text only; writing it into a staging tree is the
    /// staging area's responsibility.
    pub fn build(&self, spec: &PackageSpec) -> String {
        let mut doc = String::new();
        doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(doc, "<Package xmlns=\"{}\">", xml_escape(&self.namespace));
        for (type_name, members) in spec {
            doc.push_str("    <types>\n");
            for member in members {
                let _ = writeln!(doc, "        <members>{}</members>", xml_escape(member));
            }
            let _ = writeln!(doc, "        <name>{}</name>", xml_escape(type_name));
            doc.push_str("    </types>\n");
        }
        let _ = writeln!(doc, "    <version>{}</version>", xml_escape(&self.api_version));
        doc.push_str("</Package>\n");
        doc
    }

    /// Empty additive manifest, shipped alongside destructive manifests
    pub fn build_empty(&self) -> String {
        self.build(&PackageSpec::new())
    }
}

fn xml_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
