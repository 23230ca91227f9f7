use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use nbext_cli::{validate_cli, Cli, CliCommand, CliStoreTarget};
use nbext_config::{ConfigStore, FileConfigStore, HttpConfigStore};
use nbext_registry::{
    discover_descriptors, heading_anchor, render_discovery_report, render_extension_list_report,
    render_extension_show_report, resolve_readme, rewrite_markdown_links, ExtensionFilter,
    FilterDebouncer, MergedExtension, ReadmeTarget, RegistryError, ResolvedParameter, Tag,
    FILTER_DEBOUNCE_WINDOW,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    deep_link_query, Configurator, DirectoryExtensionSource, ExtensionSource,
    NotebookServerClient, StaticExtensionSource,
};

/// Inputs the command layer needs beyond the configurator itself.
pub struct CommandContext {
    pub server: Option<NotebookServerClient>,
    pub nbextensions_dirs: Vec<PathBuf>,
    pub json: bool,
}

/// Parses, validates and runs one CLI invocation, printing its output.
pub async fn run_cli(cli: Cli) -> Result<()> {
    validate_cli(&cli)?;
    if cli.command.is_offline() {
        println!("{}", execute_discover_command(&cli)?);
        return Ok(());
    }

    let (mut configurator, context) = build_configurator(&cli).await?;
    configurator.refresh().await?;
    for warning in configurator.load_warnings() {
        eprintln!("warning: {}", warning.message);
    }

    if let CliCommand::Filter { tags } = &cli.command {
        let tags = parse_filter_tags(tags)?;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        run_filter_lines(
            &configurator,
            tags,
            stdin,
            cli.json,
            FILTER_DEBOUNCE_WINDOW,
            |output| println!("{output}"),
        )
        .await?;
        return Ok(());
    }

    let output = execute_configurator_command(&mut configurator, &cli.command, &context).await?;
    println!("{output}");
    Ok(())
}

/// Builds the store, descriptor source and host version selected by `cli`.
pub async fn build_configurator(cli: &Cli) -> Result<(Configurator, CommandContext)> {
    let Some(target) = cli.store_target() else {
        bail!("either --base-url or --config-dir is required");
    };
    let host_version = cli
        .host_version
        .as_deref()
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(str::to_string);

    let (store, server): (Box<dyn ConfigStore>, Option<NotebookServerClient>) = match &target {
        CliStoreTarget::Http { base_url, token } => (
            Box::new(HttpConfigStore::new(base_url, token.as_deref())?),
            Some(NotebookServerClient::new(base_url, token.as_deref())?),
        ),
        CliStoreTarget::Directory(path) => (Box::new(FileConfigStore::new(path.clone())), None),
    };

    let host_version = match (host_version, &server) {
        (Some(version), _) => version,
        (None, Some(server)) => server
            .host_version()
            .await
            .context("failed to determine notebook host version")?,
        (None, None) => bail!("--host-version is required when --config-dir is set"),
    };

    let source: Box<dyn ExtensionSource> = if !cli.nbextensions_dir.is_empty() {
        Box::new(DirectoryExtensionSource::new(cli.nbextensions_dir.clone()))
    } else if let Some(server) = &server {
        Box::new(server.clone())
    } else {
        tracing::warn!("no --nbextensions-dir given; only load_extensions entries will be listed");
        Box::new(StaticExtensionSource::default())
    };

    tracing::debug!(store = %store.describe(), source = %source.describe(), host_version = %host_version, "configurator ready");
    let context = CommandContext {
        server,
        nbextensions_dirs: cli.nbextensions_dir.clone(),
        json: cli.json,
    };
    Ok((Configurator::new(store, source, host_version), context))
}

pub fn execute_discover_command(cli: &Cli) -> Result<String> {
    let report = discover_descriptors(&cli.nbextensions_dir);
    if cli.json {
        let entries: Vec<Value> = report
            .entries
            .iter()
            .map(|entry| {
                json!({
                    "yaml_path": entry.yaml_path.display().to_string(),
                    "descriptor": entry.descriptor,
                })
            })
            .collect();
        let invalid: Vec<Value> = report
            .invalid_entries
            .iter()
            .map(|invalid| {
                json!({
                    "yaml_path": invalid.yaml_path.display().to_string(),
                    "error": invalid.error,
                })
            })
            .collect();
        return to_pretty(&json!({"entries": entries, "invalid": invalid}));
    }
    Ok(render_discovery_report(&report))
}

fn to_pretty(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to render JSON output")
}

fn parse_filter_tags(raw: &[String]) -> Result<Vec<Tag>> {
    raw.iter()
        .map(|tag| ExtensionFilter::parse_tag(tag).map_err(anyhow::Error::from))
        .collect()
}

fn parameter_json(parameter: &Result<ResolvedParameter, RegistryError>) -> Value {
    match parameter {
        Ok(parameter) => json!({
            "name": parameter.name,
            "label": parameter.label,
            "input_type": parameter.input.type_name(),
            "value": parameter.value,
            "from_config": parameter.from_config,
        }),
        Err(error) => json!({"error": error.to_string()}),
    }
}

fn render_list(
    visible: &[&MergedExtension],
    total: usize,
    hide_incompat: bool,
    configurator: &Configurator,
    json_output: bool,
) -> Result<String> {
    if json_output {
        return to_pretty(&json!({
            "count": total,
            "hide_incompat": hide_incompat,
            "extensions": visible,
        }));
    }
    Ok(render_extension_list_report(
        visible,
        total,
        hide_incompat,
        configurator.diagnostics(),
    ))
}

/// Runs every command that operates on a refreshed configurator.
pub async fn execute_configurator_command(
    configurator: &mut Configurator,
    command: &CliCommand,
    context: &CommandContext,
) -> Result<String> {
    let json_output = context.json;
    match command {
        CliCommand::List {
            filter,
            tags,
            show_incompatible,
        } => {
            let filter = ExtensionFilter::new(
                parse_filter_tags(tags)?,
                filter.clone().unwrap_or_default(),
            );
            let hide_incompat = configurator.hide_incompat() && !show_incompatible;
            let visible = filter.apply(configurator.extensions(), hide_incompat);
            render_list(
                &visible,
                configurator.extensions().len(),
                hide_incompat,
                configurator,
                json_output,
            )
        }
        CliCommand::Show { require } => {
            let extension = configurator.find(require)?;
            let parameters = configurator.parameters(require)?;
            if json_output {
                let parameters: Vec<Value> = parameters.iter().map(parameter_json).collect();
                return to_pretty(&json!({
                    "extension": extension,
                    "parameters": parameters,
                    "deep_link": deep_link_query(require),
                }));
            }
            Ok(format!(
                "{}\n- deep_link: {}",
                render_extension_show_report(extension, &parameters),
                deep_link_query(require)
            ))
        }
        CliCommand::Focus { query } => {
            let focused = configurator.focus_from_deep_link(query);
            if json_output {
                return to_pretty(&json!({
                    "require": focused.map(|extension| extension.require.clone()),
                    "deep_link": focused.map(|extension| deep_link_query(&extension.require)),
                }));
            }
            Ok(match focused {
                Some(extension) => format!(
                    "focus: require={} name={} deep_link={}",
                    extension.require,
                    extension.name,
                    deep_link_query(&extension.require)
                ),
                None => "focus: none".to_string(),
            })
        }
        CliCommand::Enable { require } | CliCommand::Disable { require } => {
            let enable = matches!(command, CliCommand::Enable { .. });
            let section = configurator.find(require)?.section.clone();
            configurator.set_enabled(require, enable).await?;
            let stored_value = configurator
                .sections()
                .get(&section)
                .and_then(|section| section.data().get("load_extensions"))
                .and_then(|entries| entries.get(require.as_str()))
                .cloned()
                .unwrap_or(Value::Null);
            enable_state_output(configurator, require, enable, stored_value, json_output)
        }
        CliCommand::Forget { require } => {
            let section = configurator.find(require)?.section.clone();
            configurator.forget(require).await?;
            if json_output {
                return to_pretty(&json!({"require": require, "section": section, "forgotten": true}));
            }
            Ok(format!("nbextension forget: require={require} section={section}"))
        }
        CliCommand::Get { require, parameter } => {
            let resolved = configurator.get_parameter(require, parameter)?;
            if json_output {
                return to_pretty(&parameter_json(&Ok(resolved)));
            }
            Ok(format!(
                "parameter: require={} name={} input_type={} value={} source={}",
                require,
                resolved.name,
                resolved.input.type_name(),
                resolved.rendered_value(),
                if resolved.from_config {
                    "config"
                } else {
                    "default"
                }
            ))
        }
        CliCommand::Set {
            require,
            parameter,
            value,
        } => {
            let stored = configurator.set_parameter(require, parameter, value).await?;
            if json_output {
                return to_pretty(&json!({"require": require, "name": parameter, "value": stored}));
            }
            Ok(format!(
                "parameter set: require={require} name={parameter} value={stored}"
            ))
        }
        CliCommand::Reset { require } => {
            let names = configurator.reset_parameters(require).await?;
            if json_output {
                return to_pretty(&json!({"require": require, "reset": names}));
            }
            Ok(format!(
                "parameters reset: require={} count={} names={}",
                require,
                names.len(),
                if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(",")
                }
            ))
        }
        CliCommand::Tags => {
            if json_output {
                return to_pretty(&json!(configurator.tags()));
            }
            let mut lines = vec![format!("nbextension tags: count={}", configurator.tags().len())];
            lines.extend(
                configurator
                    .tags()
                    .iter()
                    .map(|tag| format!("tag: {}", tag.label())),
            );
            Ok(lines.join("\n"))
        }
        CliCommand::HideIncompat { hide } => {
            configurator.set_hide_incompat(*hide).await?;
            if json_output {
                return to_pretty(&json!({"nbext_hide_incompat": hide}));
            }
            Ok(format!("nbext_hide_incompat: {hide}"))
        }
        CliCommand::Readme { require } => {
            execute_readme_command(configurator, require, context).await
        }
        CliCommand::Discover | CliCommand::Filter { .. } => {
            bail!("command must be run through run_cli")
        }
    }
}

fn enable_state_output(
    configurator: &Configurator,
    require: &str,
    requested: bool,
    stored_value: Value,
    json_output: bool,
) -> Result<String> {
    let enabled = configurator
        .find(require)
        .map(|extension| extension.enabled)
        .unwrap_or(false);
    let action = if requested { "enable" } else { "disable" };
    if json_output {
        return to_pretty(&json!({
            "require": require,
            "action": action,
            "enabled": enabled,
            "stored": stored_value,
            "host_version": configurator.host_version(),
        }));
    }
    Ok(format!(
        "nbextension {action}: require={require} enabled={enabled} stored={stored_value} host_version={}",
        configurator.host_version()
    ))
}

fn markdown_heading_anchors(markdown: &str) -> Vec<String> {
    let mut in_fence = false;
    markdown
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                return None;
            }
            if in_fence || !trimmed.starts_with('#') {
                return None;
            }
            let text = trimmed.trim_start_matches('#');
            (text.starts_with(' ') && !text.trim().is_empty()).then(|| heading_anchor(text))
        })
        .collect()
}

async fn execute_readme_command(
    configurator: &Configurator,
    require: &str,
    context: &CommandContext,
) -> Result<String> {
    let extension = configurator.find(require)?;
    let Some(readme) = extension.readme.as_deref() else {
        return Ok(format!("readme: require={require} none"));
    };
    let base_url = context
        .server
        .as_ref()
        .map(|server| server.base_url().to_string())
        .unwrap_or_default();
    let target = resolve_readme(readme, &base_url);
    let url = target.url().to_string();
    if let ReadmeTarget::Link(_) = target {
        if context.json {
            return to_pretty(&json!({"require": require, "link": url}));
        }
        return Ok(format!("readme: require={require} link={url}"));
    }

    let (location, relative_root, markdown) = match &context.server {
        Some(server) => {
            let markdown = server
                .fetch_text(&url)
                .await
                .with_context(|| format!("no markdown file at {url}"))?;
            let root = url::Url::parse(&url)
                .map(|parsed| parsed.path().to_string())
                .unwrap_or_else(|_| url.clone());
            (url.clone(), root, markdown)
        }
        None => {
            let relative = readme.trim_start_matches('/');
            let path = context
                .nbextensions_dirs
                .iter()
                .map(|dir| dir.join(relative))
                .find(|path| path.is_file())
                .with_context(|| format!("no markdown file for {relative} in --nbextensions-dir"))?;
            let markdown = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            (
                path.display().to_string(),
                format!("/nbextensions/{relative}"),
                markdown,
            )
        }
    };

    let rewritten = rewrite_markdown_links(&markdown, &relative_root);
    let anchors = markdown_heading_anchors(&markdown);
    if context.json {
        return to_pretty(&json!({
            "require": require,
            "markdown_url": location,
            "anchors": anchors,
            "content": rewritten,
        }));
    }
    Ok(format!(
        "readme: require={} markdown={} anchors={}\n\n{}",
        require,
        location,
        if anchors.is_empty() {
            "none".to_string()
        } else {
            anchors.join(",")
        },
        rewritten
    ))
}

/// Feeds filter lines through the debouncer and emits one listing per quiet period.
///
/// Returns how many listings were produced.
pub async fn run_filter_lines<R, F>(
    configurator: &Configurator,
    tags: Vec<Tag>,
    reader: R,
    json_output: bool,
    window: Duration,
    mut emit: F,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    F: FnMut(&str),
{
    let (sender, mut debouncer) = FilterDebouncer::channel(window, 64);
    let pump = tokio::spawn(async move {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if sender.send(line).await.is_err() {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    });

    let hide_incompat = configurator.hide_incompat();
    let mut emitted = 0;
    while let Some(text) = debouncer.next().await {
        let filter = ExtensionFilter::new(tags.clone(), text);
        let visible = configurator.visible(&filter);
        emit(&render_list(
            &visible,
            configurator.extensions().len(),
            hide_incompat,
            configurator,
            json_output,
        )?);
        emitted += 1;
    }
    pump.await
        .context("filter input task failed")?
        .context("failed to read filter input")?;
    Ok(emitted)
}
