//! Registry merge: declared descriptors plus unclaimed `load_extensions` entries.

use std::collections::{BTreeSet, HashMap, HashSet};

use nbext_config::SectionSet;
use serde_json::Value;

use crate::descriptor::DEFAULT_SECTION;
use crate::{is_compatible, resolve_enabled, ExtensionDescriptor, MergedExtension, Tag, TagCategory};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Non-fatal findings recorded while merging.
pub enum MergeDiagnostic {
    UnknownSection { require: String, section: String },
    Duplicate { require: String },
    /// A list entry that was skipped because it could not be read.
    InvalidDescriptor {
        require: Option<String>,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Public struct `MergedExtensions` holding the sorted list and its filter tags.
pub struct MergedExtensions {
    pub extensions: Vec<MergedExtension>,
    pub tags: Vec<Tag>,
    pub diagnostics: Vec<MergeDiagnostic>,
}

impl MergedExtensions {
    pub fn find(&self, require: &str) -> Option<&MergedExtension> {
        self.extensions
            .iter()
            .find(|extension| extension.require == require)
    }
}

fn stub_description(section: &str, flag: &Value) -> String {
    let word = if is_truthy_flag(flag) {
        "enabled"
    } else {
        "disabled"
    };
    format!(
        "This nbextension is {word} in the {section} json config, but doesn't provide a yaml \
         file to tell us how to configure it. You can still enable or disable it from here, though."
    )
}

fn is_truthy_flag(flag: &Value) -> bool {
    match flag {
        Value::Bool(flag) => *flag,
        Value::Null => false,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Merges declared descriptors with the config sections.
///
/// The result depends only on the inputs: descriptors are normalized, every
/// unclaimed `load_extensions` key becomes an unconfigurable stub, and the
/// list is stably sorted by case-insensitive name.
pub fn merge_extensions(
    declared: &[ExtensionDescriptor],
    sections: &SectionSet,
    host_version: &str,
) -> MergedExtensions {
    let mut unclaimed: Vec<(String, Vec<(String, Value)>)> = sections
        .iter()
        .map(|section| {
            let entries = section
                .load_extensions()
                .map(|map| {
                    map.iter()
                        .map(|(require, flag)| (require.clone(), flag.clone()))
                        .collect()
                })
                .unwrap_or_default();
            (section.name().to_string(), entries)
        })
        .collect();

    let mut require_counts: HashMap<&str, usize> = HashMap::new();
    for descriptor in declared {
        *require_counts.entry(descriptor.require.as_str()).or_default() += 1;
    }

    let mut diagnostics = Vec::new();
    let mut reported_duplicates = HashSet::new();
    let mut candidates: Vec<ExtensionDescriptor> = Vec::with_capacity(declared.len());
    for descriptor in declared {
        let mut normalized = descriptor.clone();
        let section = descriptor.section_or_default().to_string();
        normalized.name = Some(
            descriptor
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("{section}:{}", descriptor.require)),
        );
        normalized.parameters = Some(descriptor.parameters.clone().unwrap_or_default());
        if require_counts
            .get(descriptor.require.as_str())
            .is_some_and(|count| *count > 1)
        {
            normalized.duplicate = true;
        }
        if normalized.duplicate && reported_duplicates.insert(descriptor.require.clone()) {
            diagnostics.push(MergeDiagnostic::Duplicate {
                require: descriptor.require.clone(),
            });
        }
        if let Some((_, entries)) = unclaimed.iter_mut().find(|(name, _)| *name == section) {
            entries.retain(|(require, _)| *require != descriptor.require);
        }
        normalized.section = Some(section);
        candidates.push(normalized);
    }

    for (section, entries) in unclaimed {
        for (require, flag) in entries {
            let mut stub = ExtensionDescriptor::new(require.clone());
            stub.name = Some(require);
            stub.description = Some(stub_description(&section, &flag));
            stub.section = Some(section.clone());
            stub.parameters = Some(Vec::new());
            stub.unconfigurable = true;
            candidates.push(stub);
        }
    }

    // `sort_by_cached_key` is stable, so equal names keep their input order.
    candidates.sort_by_cached_key(|descriptor| {
        descriptor
            .name
            .as_deref()
            .unwrap_or_default()
            .to_lowercase()
    });

    let mut extensions = Vec::with_capacity(candidates.len());
    let mut tag_set: BTreeSet<(TagCategory, String, String)> = BTreeSet::new();
    for descriptor in candidates {
        let section = descriptor
            .section
            .clone()
            .unwrap_or_else(|| DEFAULT_SECTION.to_string());
        let enabled = match sections.get(&section) {
            Some(config) => resolve_enabled(config.data(), &descriptor.require),
            None => {
                tracing::warn!(
                    require = %descriptor.require,
                    section = %section,
                    "nbextension specifies unknown section; can't determine enable status"
                );
                diagnostics.push(MergeDiagnostic::UnknownSection {
                    require: descriptor.require.clone(),
                    section: section.clone(),
                });
                false
            }
        };

        let section_tag = Tag::new(TagCategory::Section, section.clone());
        tag_set.insert((section_tag.category, section_tag.label().to_lowercase(), section.clone()));
        for tag in &descriptor.tags {
            let declared_tag = Tag::new(TagCategory::Tag, tag.clone());
            tag_set.insert((
                declared_tag.category,
                declared_tag.label().to_lowercase(),
                tag.clone(),
            ));
        }

        let name = descriptor.name.clone().unwrap_or_default();
        let description = descriptor.description.clone().unwrap_or_default();
        let filter_txt = format!("{description} {name}").to_lowercase();
        extensions.push(MergedExtension {
            is_compatible: is_compatible(descriptor.compatibility.as_deref(), host_version),
            require: descriptor.require,
            section,
            name,
            description,
            parameters: descriptor.parameters.unwrap_or_default(),
            compatibility: descriptor.compatibility,
            tags: descriptor.tags,
            icon: descriptor.icon,
            readme: descriptor.readme,
            unconfigurable: descriptor.unconfigurable,
            duplicate: descriptor.duplicate,
            enabled,
            filter_txt,
        });
    }

    let tags = tag_set
        .into_iter()
        .map(|(category, _, value)| Tag::new(category, value))
        .collect();

    MergedExtensions {
        extensions,
        tags,
        diagnostics,
    }
}
