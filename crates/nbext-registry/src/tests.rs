use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::Duration;

use nbext_config::{ConfigSection, SectionSet};
use serde_json::{json, Value};
use tempfile::tempdir;

use super::{
    absolutize_url, compatibility_token, compute_store_value, discover_descriptors,
    heading_anchor, hide_incompat_setting, initial_value, is_compatible, join_relative_urls,
    load_extensions_delta, merge_extensions, parse_extension_list, process_descriptor_spec, render_discovery_report,
    render_extension_list_report, render_extension_show_report, resolve_enabled, resolve_readme,
    rewrite_markdown_links, version_compare, EnableTransition, ExtensionDescriptor,
    ExtensionFilter, FilterDebouncer, MergeDiagnostic, ParameterInput, ParameterSpec,
    ReadmeTarget, RegistryError, ResolvedParameter, Tag, TagCategory,
};

fn sections_with(entries: &[(&str, Value)]) -> SectionSet {
    let mut sections = SectionSet::with_default_sections();
    for (name, data) in entries {
        sections.insert(ConfigSection::with_data(*name, data.clone()));
    }
    sections
}

fn descriptor(require: &str, name: &str, section: &str, compatibility: &str) -> ExtensionDescriptor {
    let mut descriptor = ExtensionDescriptor::new(require);
    descriptor.name = Some(name.to_string());
    descriptor.section = Some(section.to_string());
    descriptor.compatibility = Some(compatibility.to_string());
    descriptor
}

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write file");
}

#[test]
fn unit_version_compare_ignores_trailing_zero_groups() {
    assert_eq!(version_compare("4.2.0", "4.2").expect("compare"), Ordering::Equal);
    assert_eq!(version_compare("5.0.0", "5").expect("compare"), Ordering::Equal);
    assert_eq!(version_compare("4.2.0rc1", "4.2").expect("compare"), Ordering::Equal);
}

#[test]
fn unit_version_compare_is_numeric_per_component() {
    assert_eq!(version_compare("4.10", "4.9").expect("compare"), Ordering::Greater);
    assert_eq!(version_compare("4.1.9", "4.2").expect("compare"), Ordering::Less);
    assert_eq!(version_compare("4.2.1", "4.2").expect("compare"), Ordering::Greater);
    assert_eq!(version_compare("4.05", "4.5").expect("compare"), Ordering::Equal);
}

#[test]
fn regression_version_compare_rejects_non_numeric_components() {
    let error = version_compare("4.x", "4.2").expect_err("non numeric");
    assert_eq!(
        error,
        RegistryError::InvalidVersionFormat {
            version: "4.x".to_string()
        }
    );
    assert!(version_compare("", "4.2").is_err());
    assert!(version_compare("4..2", "4.2").is_err());
}

#[test]
fn unit_compute_store_value_depends_on_host_version() {
    assert_eq!(compute_store_value(false, "4.1.0").expect("value"), None);
    assert_eq!(compute_store_value(false, "4.2.0").expect("value"), Some(false));
    assert_eq!(compute_store_value(false, "6.5.2").expect("value"), Some(false));
    assert_eq!(compute_store_value(true, "4.1.0").expect("value"), Some(true));
    assert_eq!(compute_store_value(true, "5.3.1").expect("value"), Some(true));
}

#[test]
fn regression_compute_store_value_validates_version_before_enable() {
    assert!(matches!(
        compute_store_value(true, "five"),
        Err(RegistryError::InvalidVersionFormat { .. })
    ));
}

#[test]
fn unit_enable_transition_store_values() {
    assert_eq!(EnableTransition::Enable.store_value("4.0").expect("enable"), Some(true));
    assert_eq!(EnableTransition::Disable.store_value("4.0").expect("disable"), None);
    assert_eq!(EnableTransition::Disable.store_value("4.2").expect("disable"), Some(false));
    assert_eq!(EnableTransition::Forget.store_value("bogus").expect("forget"), None);
    assert_eq!(EnableTransition::Forget.as_str(), "forget");
}

#[test]
fn unit_load_extensions_delta_uses_null_for_removal() {
    assert_eq!(
        load_extensions_delta("foo/bar", Some(true)),
        json!({"load_extensions": {"foo/bar": true}})
    );
    assert_eq!(
        load_extensions_delta("foo/bar", None),
        json!({"load_extensions": {"foo/bar": null}})
    );
}

#[test]
fn unit_resolve_enabled_requires_exact_true() {
    let data = json!({"load_extensions": {"a": true, "b": false, "c": 1, "d": "true"}});
    assert!(resolve_enabled(&data, "a"));
    assert!(!resolve_enabled(&data, "b"));
    assert!(!resolve_enabled(&data, "c"));
    assert!(!resolve_enabled(&data, "d"));
    assert!(!resolve_enabled(&data, "missing"));
    assert!(!resolve_enabled(&json!({}), "a"));
}

#[test]
fn unit_compatibility_matches_host_major_version() {
    assert_eq!(compatibility_token("5.3.1"), "5.x");
    assert!(is_compatible(Some("4.x,5.x"), "5.3.1"));
    assert!(is_compatible(Some("4.x 5.X 6.x"), "6.0.0"));
    assert!(!is_compatible(Some("4.x,5.x"), "6.1.0"));
    assert!(!is_compatible(None, "5.3.1"));
    assert!(!is_compatible(Some("?.x"), "5.3.1"));
}

#[test]
fn functional_merge_creates_stub_for_unclaimed_key() {
    let declared = vec![descriptor("foo/bar", "Foo", "notebook", "4.x,5.x")];
    let sections = sections_with(&[(
        "notebook",
        json!({"load_extensions": {"foo/bar": true, "baz/qux": false}}),
    )]);

    let merged = merge_extensions(&declared, &sections, "5.3.1");

    assert_eq!(merged.extensions.len(), 2);
    let requires: Vec<&str> = merged
        .extensions
        .iter()
        .map(|extension| extension.require.as_str())
        .collect();
    assert_eq!(requires, vec!["baz/qux", "foo/bar"]);

    let foo = merged.find("foo/bar").expect("foo");
    assert!(foo.enabled);
    assert!(foo.is_compatible);
    assert!(!foo.unconfigurable);

    let stub = merged.find("baz/qux").expect("stub");
    assert!(stub.unconfigurable);
    assert!(!stub.enabled);
    assert!(!stub.is_compatible);
    assert_eq!(stub.name, "baz/qux");
    assert_eq!(stub.section, "notebook");
    assert!(stub.parameters.is_empty());
    assert!(stub
        .description
        .starts_with("This nbextension is disabled in the notebook json config"));
}

#[test]
fn functional_merge_flags_duplicates_and_keeps_both_entries() {
    let declared = vec![
        descriptor("x/y", "Second", "notebook", "5.x"),
        descriptor("x/y", "First", "notebook", "5.x"),
    ];
    let sections = sections_with(&[("notebook", json!({"load_extensions": {"x/y": true}}))]);

    let merged = merge_extensions(&declared, &sections, "5.0");

    assert_eq!(merged.extensions.len(), 2);
    assert!(merged.extensions.iter().all(|extension| extension.duplicate));
    assert!(merged.extensions.iter().all(|extension| extension.enabled));
    assert_eq!(
        merged.diagnostics,
        vec![MergeDiagnostic::Duplicate {
            require: "x/y".to_string()
        }]
    );
}

#[test]
fn functional_merge_reports_unknown_section() {
    let declared = vec![descriptor("odd/one", "Odd", "console", "5.x")];
    let merged = merge_extensions(&declared, &SectionSet::with_default_sections(), "5.0");
    let odd = merged.find("odd/one").expect("odd");
    assert!(!odd.enabled);
    assert_eq!(
        merged.diagnostics,
        vec![MergeDiagnostic::UnknownSection {
            require: "odd/one".to_string(),
            section: "console".to_string()
        }]
    );
}

#[test]
fn unit_merge_fills_defaults_and_builds_filter_text() {
    let mut bare = ExtensionDescriptor::new("tools/bare");
    bare.description = Some("Adds A Toolbar".to_string());
    bare.tags = vec!["ui".to_string()];
    let merged = merge_extensions(&[bare], &SectionSet::with_default_sections(), "5.0");
    let extension = merged.find("tools/bare").expect("bare");
    assert_eq!(extension.name, "notebook:tools/bare");
    assert_eq!(extension.section, "notebook");
    assert_eq!(extension.filter_txt, "adds a toolbar notebook:tools/bare");
    assert_eq!(extension.compatibility_text(), "?.x");
    assert_eq!(
        merged.tags,
        vec![
            Tag::new(TagCategory::Section, "notebook"),
            Tag::new(TagCategory::Tag, "ui")
        ]
    );
}

#[test]
fn unit_merge_sorts_case_insensitively_and_stably() {
    let declared = vec![
        descriptor("b/1", "beta", "notebook", "5.x"),
        descriptor("a/1", "Alpha", "tree", "5.x"),
        descriptor("b/2", "Beta", "edit", "5.x"),
    ];
    let merged = merge_extensions(&declared, &SectionSet::with_default_sections(), "5.0");
    let requires: Vec<&str> = merged
        .extensions
        .iter()
        .map(|extension| extension.require.as_str())
        .collect();
    assert_eq!(requires, vec!["a/1", "b/1", "b/2"]);
}

#[test]
fn regression_merge_is_pure_for_identical_inputs() {
    let declared = vec![
        descriptor("foo/bar", "Foo", "notebook", "5.x"),
        descriptor("tree/ext", "Tree Ext", "tree", "4.x"),
    ];
    let sections = sections_with(&[
        ("notebook", json!({"load_extensions": {"foo/bar": true, "stub/a": true}})),
        ("tree", json!({"load_extensions": {"stub/b": false}})),
    ]);
    let first = merge_extensions(&declared, &sections, "5.3.1");
    let second = merge_extensions(&declared, &sections, "5.3.1");
    assert_eq!(first, second);
    assert_eq!(first.extensions.len(), 4);
}

#[test]
fn unit_hide_incompat_defaults_to_true() {
    assert!(hide_incompat_setting(&SectionSet::with_default_sections()));
    let sections = sections_with(&[("common", json!({"nbext_hide_incompat": false}))]);
    assert!(!hide_incompat_setting(&sections));
}

#[test]
fn functional_filter_is_conjunctive_over_tags_and_words() {
    let mut toc = descriptor("toc2/main", "Table of Contents", "notebook", "5.x");
    toc.description = Some("Collapsible headings in a sidebar".to_string());
    toc.tags = vec!["navigation".to_string()];
    let mut tree = descriptor("tree/filter", "Tree Filter", "tree", "5.x");
    tree.tags = vec!["navigation".to_string()];
    let old = descriptor("old/one", "Old Contents", "notebook", "4.x");
    let merged = merge_extensions(&[toc, tree, old], &SectionSet::with_default_sections(), "5.0");

    let filter = ExtensionFilter::new(
        vec![
            ExtensionFilter::parse_tag("section:notebook").expect("section tag"),
            ExtensionFilter::parse_tag("tag:navigation").expect("tag"),
        ],
        "CONTENTS sidebar",
    );
    let visible = filter.apply(&merged.extensions, true);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].require, "toc2/main");

    let text_only = ExtensionFilter::new(Vec::new(), "contents");
    assert_eq!(text_only.apply(&merged.extensions, true).len(), 1);
    assert_eq!(text_only.apply(&merged.extensions, false).len(), 2);
    assert!(ExtensionFilter::default().is_empty());
}

#[test]
fn unit_parse_tag_rejects_unknown_categories() {
    assert_eq!(
        ExtensionFilter::parse_tag("section:tree").expect("tag"),
        Tag::new(TagCategory::Section, "tree")
    );
    assert!(matches!(
        ExtensionFilter::parse_tag("color:red"),
        Err(RegistryError::InvalidFilterTag(_))
    ));
    assert!(ExtensionFilter::parse_tag("tag:").is_err());
    assert!(ExtensionFilter::parse_tag("navigation").is_err());
}

#[tokio::test]
async fn functional_debouncer_emits_only_the_last_value_of_a_burst() {
    let (sender, mut debouncer) = FilterDebouncer::channel(Duration::from_millis(50), 16);
    for text in ["t", "to", "toc"] {
        sender.send(text.to_string()).await.expect("send");
    }
    assert_eq!(debouncer.next().await.as_deref(), Some("toc"));

    sender.send("nav".to_string()).await.expect("send");
    drop(sender);
    assert_eq!(debouncer.next().await.as_deref(), Some("nav"));
    assert_eq!(debouncer.next().await, None);
}

#[test]
fn unit_parameter_inputs_parse_by_kind() {
    let checkbox = ParameterInput::Checkbox;
    assert_eq!(checkbox.parse_value("p", "Yes").expect("checkbox"), json!(true));
    assert_eq!(checkbox.parse_value("p", "off").expect("checkbox"), json!(false));
    assert!(checkbox.parse_value("p", "maybe").is_err());

    let number = ParameterInput::Number {
        min: Some(1.0),
        max: Some(6.0),
        step: None,
    };
    assert_eq!(number.parse_value("depth", "3").expect("int"), json!(3));
    assert_eq!(number.parse_value("depth", "2.5").expect("float"), json!(2.5));
    assert!(matches!(
        number.parse_value("depth", "9"),
        Err(RegistryError::InvalidParameterValue { ref input_type, .. }) if input_type == "number"
    ));
    assert!(number.parse_value("depth", "NaN").is_err());

    assert_eq!(
        ParameterInput::Color.parse_value("c", "#AbC").expect("color"),
        json!("#AAbbCC")
    );
    assert!(ParameterInput::Color.parse_value("c", "red").is_err());

    let list = ParameterInput::from_spec(&ParameterSpec {
        list_element: Some(Box::new(ParameterSpec::named("", "number"))),
        ..ParameterSpec::named("levels", "list")
    });
    assert_eq!(list.parse_value("levels", "1, 2,3").expect("list"), json!([1, 2, 3]));
    assert_eq!(list.parse_value("levels", "[4, 5]").expect("json list"), json!([4, 5]));
    assert!(list.parse_value("levels", "1, two").is_err());

    assert_eq!(
        ParameterInput::from_spec(&ParameterSpec::named("when", "date")),
        ParameterInput::Html("date".to_string())
    );
}

#[test]
fn unit_parameter_render_and_initial_value() {
    let spec = ParameterSpec {
        default: Some(json!(2)),
        ..ParameterSpec::named("toc.depth", "number")
    };
    assert_eq!(initial_value(&json!({"toc": {"depth": 4}}), &spec), Some(json!(4)));
    assert_eq!(initial_value(&json!({}), &spec), Some(json!(2)));
    assert_eq!(
        initial_value(&json!({}), &ParameterSpec::named("x", "text")),
        None
    );

    assert_eq!(ParameterInput::Checkbox.render_value(&json!(1)), "true");
    assert_eq!(ParameterInput::Color.render_value(&json!("#fff")), "#ffffff");
    assert_eq!(ParameterInput::Text.render_value(&json!("hi")), "hi");
}

#[test]
fn regression_parameter_without_name_is_isolated_error() {
    let unnamed = ParameterSpec {
        name: None,
        ..ParameterSpec::named("", "text")
    };
    let error = ResolvedParameter::resolve("foo/bar", 1, &unnamed, None).expect_err("no name");
    assert_eq!(
        error,
        RegistryError::MalformedParameter {
            require: "foo/bar".to_string(),
            index: 1
        }
    );

    let section = ConfigSection::with_data("notebook", json!({"flag": true}));
    let resolved = ResolvedParameter::resolve(
        "foo/bar",
        0,
        &ParameterSpec::named("flag", "checkbox"),
        Some(&section),
    )
    .expect("resolved");
    assert!(resolved.from_config);
    assert_eq!(resolved.rendered_value(), "true");
}

#[test]
fn unit_process_descriptor_spec_applies_defaults_and_relative_urls() {
    let spec = json!({
        "Type": "Jupyter Notebook Extension",
        "Main": "main.js",
        "Link": "readme.md",
        "Icon": "../icon.png",
        "Description": "does things"
    });
    let descriptor = process_descriptor_spec(spec, "toc2").expect("descriptor");
    assert_eq!(descriptor.require, "toc2/main");
    // Name defaults to the require path before it is namespaced.
    assert_eq!(descriptor.name.as_deref(), Some("main"));
    assert_eq!(descriptor.section.as_deref(), Some("notebook"));
    assert_eq!(descriptor.compatibility.as_deref(), Some("?.x"));
    assert_eq!(descriptor.readme.as_deref(), Some("toc2/readme.md"));
    assert_eq!(descriptor.icon.as_deref(), Some("icon.png"));
}

#[test]
fn unit_process_descriptor_spec_keeps_absolute_links() {
    let spec = json!({
        "Type": "IPython Notebook Extension",
        "require": "ext/main",
        "Link": "https://example.org/docs",
        "Section": "tree",
        "Compatibility": "4.x 5.x"
    });
    let descriptor = process_descriptor_spec(spec, "nested/dir").expect("descriptor");
    assert_eq!(descriptor.require, "nested/dir/ext/main");
    assert_eq!(descriptor.readme.as_deref(), Some("https://example.org/docs"));
    assert_eq!(descriptor.section_or_default(), "tree");
}

#[test]
fn regression_process_descriptor_spec_rejects_bad_type_and_missing_main() {
    assert!(matches!(
        process_descriptor_spec(json!({"Type": "Other", "Main": "a.js"}), ""),
        Err(RegistryError::InvalidDescriptor(_))
    ));
    assert!(process_descriptor_spec(json!({"Main": "a.js"}), "").is_err());
    assert!(process_descriptor_spec(json!({"Type": "Jupyter Notebook Extension"}), "").is_err());
    assert!(process_descriptor_spec(json!(["not", "a", "map"]), "").is_err());
}

#[test]
fn functional_discovery_reports_invalid_files_and_duplicates() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path().join("nbextensions");
    write_file(
        &root.join("alpha/alpha.yaml"),
        "Type: Jupyter Notebook Extension\nName: Alpha\nMain: main.js\nCompatibility: 5.x\n",
    );
    write_file(
        &root.join("beta/beta.yml"),
        "Type: Jupyter Notebook Extension\nName: Beta\nMain: main.js\nParameters:\n- name: beta.size\n  input_type: number\n  default: 3\n",
    );
    write_file(&root.join("broken/broken.yaml"), "Type: [unterminated\n");
    write_file(&root.join("notype/notype.yaml"), "Main: main.js\n");
    write_file(
        &root.join("mathjax/ignored.yaml"),
        "Type: Jupyter Notebook Extension\nMain: main.js\n",
    );
    write_file(
        &root.join("zeta/dup.yaml"),
        "Type: Jupyter Notebook Extension\nName: Alpha again\nrequire: ../alpha/main\n",
    );
    write_file(&root.join("alpha/readme.txt"), "not yaml");

    let report = discover_descriptors(&[root.clone(), root.clone()]);

    assert_eq!(report.roots.len(), 1);
    assert_eq!(report.entries.len(), 2);
    assert_eq!(report.invalid_entries.len(), 2);

    let alpha = &report.entries[0].descriptor;
    assert_eq!(alpha.require, "alpha/main");
    assert_eq!(alpha.name.as_deref(), Some("Alpha again"));
    assert!(alpha.duplicate);
    assert!(report.entries[0].yaml_path.ends_with("zeta/dup.yaml"));

    let beta = &report.entries[1].descriptor;
    assert_eq!(beta.require, "beta/main");
    let parameters = beta.parameters.as_ref().expect("parameters");
    assert_eq!(parameters[0].default, Some(json!(3)));

    let rendered = render_discovery_report(&report);
    assert!(rendered.starts_with("nbextension discovery: roots="));
    assert!(rendered.contains("count=2 invalid=2"));
    assert!(rendered.contains("nbextension: require=alpha/main section=notebook name=Alpha again duplicate=true"));
    assert!(!rendered.contains("mathjax"));
}

#[test]
fn unit_discovery_of_missing_root_is_empty() {
    let temp = tempdir().expect("tempdir");
    let report = discover_descriptors(&[temp.path().join("absent")]);
    assert!(report.entries.is_empty());
    assert!(report.invalid_entries.is_empty());
    assert_eq!(report.descriptors().len(), 0);
}

#[test]
fn unit_join_relative_urls_applies_parent_segments() {
    assert_eq!(
        join_relative_urls(&["/nbextensions/toc2/README.md", "../img/shot.png"]),
        "/nbextensions/img/shot.png"
    );
    assert_eq!(
        join_relative_urls(&["/nbextensions/toc2/README.md", "./demo.gif"]),
        "/nbextensions/toc2/demo.gif"
    );
    assert_eq!(
        join_relative_urls(&["/nbextensions/toc2/README.md", "/static/logo.png"]),
        "/static/logo.png"
    );
    assert_eq!(join_relative_urls(&["a/b/c", "d"]), "a/b/d");
}

#[test]
fn unit_absolutize_url_leaves_anchors_and_absolute_urls() {
    let root = "/nbextensions/toc2/README.md";
    assert_eq!(absolutize_url(root, "#usage", false), "#usage");
    assert_eq!(absolutize_url(root, "mailto:dev@example.org", false), "mailto:dev@example.org");
    assert_eq!(absolutize_url(root, "HTTPS://example.org/x", true), "HTTPS://example.org/x");
    assert_eq!(absolutize_url(root, "#not-an-image", true), "/nbextensions/toc2/#not-an-image");
    assert_eq!(absolutize_url("", "shot.png", true), "shot.png");
}

#[test]
fn unit_rewrite_markdown_links_and_heading_anchor() {
    let markdown = "See ![shot](img/shot.png \"Screenshot\") and [docs](../docs.md) or [top](#top).";
    assert_eq!(
        rewrite_markdown_links(markdown, "/nbextensions/toc2/README.md"),
        "See ![shot](/nbextensions/toc2/img/shot.png \"Screenshot\") and [docs](/nbextensions/docs.md) or [top](#top)."
    );
    assert_eq!(heading_anchor("Getting started now"), "Getting-started-now");
}

#[test]
fn unit_resolve_readme_distinguishes_markdown_from_links() {
    assert_eq!(
        resolve_readme("toc2/README.md", "http://localhost:8888/"),
        ReadmeTarget::Markdown {
            url: "http://localhost:8888/nbextensions/toc2/README.md".to_string()
        }
    );
    assert_eq!(
        resolve_readme("my ext/read me.md", "http://localhost:8888").url(),
        "http://localhost:8888/nbextensions/my%20ext/read%20me.md"
    );
    assert_eq!(
        resolve_readme("https://example.org/README.md", "http://localhost:8888"),
        ReadmeTarget::Link("https://example.org/README.md".to_string())
    );
    assert_eq!(
        resolve_readme("toc2/README.html", "http://localhost:8888"),
        ReadmeTarget::Link("toc2/README.html".to_string())
    );
}

#[test]
fn functional_reports_are_deterministic() {
    let mut foo = descriptor("foo/bar", "Foo", "notebook", "5.x");
    foo.parameters = Some(vec![
        ParameterSpec {
            default: Some(json!(true)),
            ..ParameterSpec::named("foo.flag", "checkbox")
        },
        ParameterSpec {
            name: None,
            ..ParameterSpec::named("", "text")
        },
    ]);
    foo.tags = vec!["zeta".to_string(), "alpha".to_string()];
    let sections = sections_with(&[("notebook", json!({"load_extensions": {"foo/bar": true}}))]);
    let merged = merge_extensions(&[foo], &sections, "5.0");
    let visible: Vec<_> = merged.extensions.iter().collect();

    let list = render_extension_list_report(&visible, merged.extensions.len(), true, &merged.diagnostics);
    assert_eq!(
        list,
        "nbextension list: count=1 visible=1 hide_incompat=true\nnbextension: require=foo/bar section=notebook enabled=true compatibility=5.x flags=none name=Foo"
    );

    let extension = merged.find("foo/bar").expect("foo");
    let parameters: Vec<_> = extension
        .parameters
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            ResolvedParameter::resolve(&extension.require, index, spec, sections.get("notebook"))
        })
        .collect();
    let show = render_extension_show_report(extension, &parameters);
    assert!(show.contains("- tags (2):\n- alpha\n- zeta"));
    assert!(show.contains("- foo.flag (checkbox) = true [default]"));
    assert!(show.contains("- error: nbextension 'foo/bar' declares parameter #1 without a name"));
}

#[test]
fn regression_compatibility_tokens_are_delimited() {
    assert!(!is_compatible(Some("11.x"), "1.2.0"));
    assert!(!is_compatible(Some("notebook 15.x"), "5.0.0"));
    assert!(is_compatible(Some("1.x, 11.x"), "1.2.0"));
    assert!(is_compatible(Some("(5.x)"), "5.3.1"));
}

#[test]
fn regression_extension_list_isolates_malformed_entries() {
    let listing = parse_extension_list(json!([
        {"require": "good/main", "Parameters": [{"name": "good.n", "input_type": "number", "step": "any", "min": "0.5", "max": 3}]},
        {"require": "bad/main", "Parameters": "not a list"},
        {"Name": "no require"}
    ]))
    .expect("listing");
    assert_eq!(listing.descriptors.len(), 1);
    let parameter = &listing.descriptors[0].parameters.as_ref().expect("parameters")[0];
    assert_eq!(parameter.step, None);
    assert_eq!(parameter.min, Some(0.5));
    assert_eq!(parameter.max, Some(3.0));
    assert_eq!(listing.invalid.len(), 2);
    assert_eq!(listing.invalid[0].require.as_deref(), Some("bad/main"));
    assert_eq!(listing.invalid[1].require, None);

    let error = parse_extension_list(json!({"require": "x"})).expect_err("object payload");
    assert!(matches!(error, RegistryError::InvalidDescriptor(_)));
}

#[test]
fn regression_heading_anchor_trims_and_replaces_spaces() {
    assert_eq!(heading_anchor("  Usage notes "), "Usage-notes");
    assert_eq!(heading_anchor("Table of  Contents"), "Table-of--Contents");
}
