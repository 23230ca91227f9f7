use httpmock::prelude::*;
use nbext_cli::{Cli, CliCommand};
use nbext_runtime::{build_configurator, execute_configurator_command};
use serde_json::{json, Value};

/// Server-mode invocation built without going through argv.
fn parse_cli(base_url: &str, command: CliCommand) -> Cli {
    Cli {
        base_url: Some(base_url.to_string()),
        token: Some("secret".to_string()),
        config_dir: None,
        nbextensions_dir: Vec::new(),
        host_version: None,
        json: false,
        command,
    }
}

struct NotebookServer {
    server: MockServer,
}

impl NotebookServer {
    fn start() -> Self {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(json!({"version": "5.7.0"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/config/notebook");
            then.status(200).json_body(json!({
                "load_extensions": {"toc2/main": true, "orphan/ext": true},
                "toc2": {"depth": 4}
            }));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/config/tree");
            then.status(500).body("config backend unavailable");
        });
        for section in ["edit", "common"] {
            server.mock(move |when, then| {
                when.method(GET).path(format!("/api/config/{section}"));
                then.status(200).json_body(json!({}));
            });
        }
        server.mock(|when, then| {
            when.method(GET)
                .path("/nbextensions/nbextensions_configurator/list");
            then.status(200).json_body(json!([{
                "require": "toc2/main",
                "Name": "Table of Contents",
                "Description": "Sidebar with collapsible headings",
                "Compatibility": "4.x 5.x",
                "readme": "toc2/README.md",
                "tags": ["navigation"],
                "Parameters": [
                    {"name": "toc2.depth", "input_type": "number", "default": 2, "min": 1, "max": 6},
                    {"name": "toc2.collapse", "input_type": "checkbox", "default": true}
                ]
            }]));
        });
        Self { server }
    }

    fn base_url(&self) -> String {
        self.server.base_url()
    }
}

async fn run(server: &NotebookServer, command: CliCommand) -> String {
    let cli = parse_cli(&server.base_url(), command);
    let (mut configurator, context) = build_configurator(&cli).await.expect("configurator");
    configurator.refresh().await.expect("refresh");
    execute_configurator_command(&mut configurator, &cli.command, &context)
        .await
        .expect("command")
}

#[tokio::test]
async fn integration_listing_merges_stubs_and_survives_section_failure() {
    let server = NotebookServer::start();
    let cli = parse_cli(&server.base_url(), CliCommand::Tags);
    let (mut configurator, _) = build_configurator(&cli).await.expect("configurator");
    configurator.refresh().await.expect("refresh");
    assert_eq!(configurator.load_warnings().len(), 1);
    assert_eq!(configurator.load_warnings()[0].section, "tree");

    let output = run(
        &server,
        CliCommand::List {
            filter: None,
            tags: Vec::new(),
            show_incompatible: true,
        },
    )
    .await;
    assert_eq!(
        output,
        "nbextension list: count=2 visible=2 hide_incompat=false\n\
         nbextension: require=orphan/ext section=notebook enabled=true compatibility=?.x flags=incompatible,unconfigurable name=orphan/ext\n\
         nbextension: require=toc2/main section=notebook enabled=true compatibility=4.x 5.x flags=none name=Table of Contents"
    );
}

#[tokio::test]
async fn integration_enable_forget_and_parameter_writes_hit_the_config_api() {
    let server = NotebookServer::start();
    let disable = server.server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/config/notebook")
            .header("authorization", "token secret")
            .json_body(json!({"load_extensions": {"toc2/main": false}}));
        then.status(204);
    });
    let forget = server.server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/config/notebook")
            .json_body(json!({"load_extensions": {"orphan/ext": null}}));
        then.status(204);
    });
    let set = server.server.mock(|when, then| {
        when.method(PATCH)
            .path("/api/config/notebook")
            .json_body(json!({"toc2": {"collapse": false}}));
        then.status(204);
    });
    let reset = server.server.mock(|when, then| {
        when.method(PUT)
            .path("/api/config/notebook")
            .header("content-type", "application/json")
            .json_body(json!({
                "load_extensions": {"toc2/main": true, "orphan/ext": true},
                "toc2": {}
            }));
        then.status(204);
    });

    let output = run(
        &server,
        CliCommand::Disable {
            require: "toc2/main".to_string(),
        },
    )
    .await;
    assert_eq!(
        output,
        "nbextension disable: require=toc2/main enabled=false stored=false host_version=5.7.0"
    );

    let output = run(
        &server,
        CliCommand::Forget {
            require: "orphan/ext".to_string(),
        },
    )
    .await;
    assert_eq!(output, "nbextension forget: require=orphan/ext section=notebook");

    let output = run(
        &server,
        CliCommand::Set {
            require: "toc2/main".to_string(),
            parameter: "toc2.collapse".to_string(),
            value: "off".to_string(),
        },
    )
    .await;
    assert_eq!(
        output,
        "parameter set: require=toc2/main name=toc2.collapse value=false"
    );

    let output = run(
        &server,
        CliCommand::Reset {
            require: "toc2/main".to_string(),
        },
    )
    .await;
    assert_eq!(
        output,
        "parameters reset: require=toc2/main count=2 names=toc2.depth,toc2.collapse"
    );

    assert_eq!(disable.calls(), 1);
    assert_eq!(forget.calls(), 1);
    assert_eq!(set.calls(), 1);
    assert_eq!(reset.calls(), 1);
}

#[tokio::test]
async fn integration_readme_is_fetched_and_links_rewritten() {
    let server = NotebookServer::start();
    let readme = server.server.mock(|when, then| {
        when.method(GET).path("/nbextensions/toc2/README.md");
        then.status(200).body(
            "# Table of Contents\n\nSee [usage](#Usage) and ![shot](img/shot.png).\n\n## Usage\n",
        );
    });

    let output = run(
        &server,
        CliCommand::Readme {
            require: "toc2/main".to_string(),
        },
    )
    .await;
    let (header, body) = output.split_once("\n\n").expect("header and body");
    assert_eq!(
        header,
        format!(
            "readme: require=toc2/main markdown={}/nbextensions/toc2/README.md anchors=Table-of-Contents,Usage",
            server.base_url()
        )
    );
    assert!(body.contains("[usage](#Usage)"));
    assert!(body.contains("![shot](/nbextensions/toc2/img/shot.png)"));
    assert_eq!(readme.calls(), 1);
}

#[tokio::test]
async fn integration_show_and_focus_use_deep_links() {
    let server = NotebookServer::start();

    let output = run(
        &server,
        CliCommand::Show {
            require: "toc2/main".to_string(),
        },
    )
    .await;
    assert!(output.contains("- toc2.depth (number) = 4\n"));
    assert!(output.contains("- toc2.collapse (checkbox) = true [default]"));
    assert!(output.ends_with("- deep_link: ?nbextension=toc2/main"));

    let output = run(
        &server,
        CliCommand::Focus {
            query: "?nbextension=orphan/ext".to_string(),
        },
    )
    .await;
    assert_eq!(
        output,
        "focus: require=toc2/main name=Table of Contents deep_link=?nbextension=toc2/main"
    );
}

#[tokio::test]
async fn regression_json_output_is_machine_readable() {
    let server = NotebookServer::start();
    let mut cli = parse_cli(&server.base_url(), CliCommand::Tags);
    cli.json = true;
    let (mut configurator, context) = build_configurator(&cli).await.expect("configurator");
    configurator.refresh().await.expect("refresh");
    let output = execute_configurator_command(&mut configurator, &cli.command, &context)
        .await
        .expect("tags");
    let parsed: Value = serde_json::from_str(&output).expect("json");
    assert_eq!(
        parsed,
        json!([
            {"category": "section", "value": "notebook"},
            {"category": "tag", "value": "navigation"}
        ])
    );
}
