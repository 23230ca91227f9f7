use crate::{MergeDiagnostic, MergedExtension, RegistryError, ResolvedParameter};

fn flag_list(extension: &MergedExtension) -> String {
    let mut flags = Vec::new();
    if !extension.is_compatible {
        flags.push("incompatible");
    }
    if extension.unconfigurable {
        flags.push("unconfigurable");
    }
    if extension.duplicate {
        flags.push("duplicate");
    }
    if flags.is_empty() {
        "none".to_string()
    } else {
        flags.join(",")
    }
}

fn bullet_lines(items: &[String]) -> String {
    if items.is_empty() {
        "- none".to_string()
    } else {
        items
            .iter()
            .map(|item| format!("- {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One line per visible extension, preceded by a summary and followed by merge diagnostics.
pub fn render_extension_list_report(
    visible: &[&MergedExtension],
    total: usize,
    hide_incompat: bool,
    diagnostics: &[MergeDiagnostic],
) -> String {
    let mut lines = vec![format!(
        "nbextension list: count={} visible={} hide_incompat={}",
        total,
        visible.len(),
        hide_incompat
    )];
    for extension in visible {
        lines.push(format!(
            "nbextension: require={} section={} enabled={} compatibility={} flags={} name={}",
            extension.require,
            extension.section,
            extension.enabled,
            extension.compatibility_text(),
            flag_list(extension),
            extension.name
        ));
    }
    for diagnostic in diagnostics {
        lines.push(match diagnostic {
            MergeDiagnostic::UnknownSection { require, section } => {
                format!("warning: require={require} unknown_section={section}")
            }
            MergeDiagnostic::Duplicate { require } => {
                format!("warning: require={require} duplicate listings")
            }
            MergeDiagnostic::InvalidDescriptor { require, error } => format!(
                "warning: require={} invalid descriptor: {error}",
                require.as_deref().unwrap_or("?")
            ),
        });
    }
    lines.join("\n")
}

/// Detailed view of one extension and its resolved parameters.
pub fn render_extension_show_report(
    extension: &MergedExtension,
    parameters: &[Result<ResolvedParameter, RegistryError>],
) -> String {
    let mut tags = extension.tags.clone();
    tags.sort();
    let parameter_lines: Vec<String> = parameters
        .iter()
        .map(|parameter| match parameter {
            Ok(parameter) => format!(
                "{} ({}) = {}{}",
                parameter.name,
                parameter.input.type_name(),
                parameter.rendered_value(),
                if parameter.from_config {
                    ""
                } else {
                    " [default]"
                }
            ),
            Err(error) => format!("error: {error}"),
        })
        .collect();
    format!(
        "nbextension show:\n- require: {}\n- name: {}\n- section: {}\n- enabled: {}\n- compatibility: {}\n- compatible: {}\n- flags: {}\n- readme: {}\n- description: {}\n- tags ({}):\n{}\n- parameters ({}):\n{}",
        extension.require,
        extension.name,
        extension.section,
        extension.enabled,
        extension.compatibility_text(),
        extension.is_compatible,
        flag_list(extension),
        extension.readme.as_deref().unwrap_or("none"),
        extension.description,
        tags.len(),
        bullet_lines(&tags),
        parameter_lines.len(),
        bullet_lines(&parameter_lines)
    )
}
