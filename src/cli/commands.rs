//! Command dispatch: build settings and services, render results

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands, RequestArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::infrastructure::traits::QueryParams;
use crate::infrastructure::{InfraError, ServiceContainer};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Nested { model, request }) => cmd_nested(cli, model, request),
        Some(Commands::Adjacency {
            model,
            request,
            selected_id,
        }) => cmd_adjacency(cli, model, request, selected_id.as_deref()),
        Some(Commands::Validate { model }) => cmd_validate(cli, model),
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    debug!(data_dir = %settings.data_dir.display(), "settings loaded");
    Ok(settings)
}

fn container(cli: &Cli) -> CliResult<ServiceContainer> {
    Ok(ServiceContainer::new(load_settings(cli)?))
}

/// Request parameters: the raw query string first, explicit flags win.
fn request_params(
    request: &RequestArgs,
    selected_param: &str,
    selected_id: Option<(&str, &str)>,
) -> QueryParams {
    let mut params = request
        .query
        .as_deref()
        .map(QueryParams::parse)
        .unwrap_or_default();
    if let Some(selected) = &request.selected {
        params.insert(selected_param, selected.as_str());
    }
    if let Some((name, value)) = selected_id {
        params.insert(name, value);
    }
    params
}

fn print_json(value: &impl Serialize, pretty: bool) -> CliResult<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(InfraError::from)?;
    output::info(&rendered);
    Ok(())
}

fn print_trees(model: &str, trees: Vec<Tree<String>>) {
    if trees.is_empty() {
        output::warning(&format!("'{model}' has no nodes"));
        return;
    }
    for tree in trees {
        print!("{tree}");
    }
}

#[instrument(skip(cli, request))]
fn cmd_nested(cli: &Cli, model: &str, request: &RequestArgs) -> CliResult<()> {
    let container = container(cli)?;
    let service = container.nested_set_service(model)?;
    let params = request_params(request, &container.settings.selection.selected_param, None);

    let forest = service.run(&params)?;
    if request.tree {
        print_trees(model, forest.to_tree_strings());
        Ok(())
    } else {
        print_json(&forest, request.pretty)
    }
}

#[instrument(skip(cli, request))]
fn cmd_adjacency(
    cli: &Cli,
    model: &str,
    request: &RequestArgs,
    selected_id: Option<&str>,
) -> CliResult<()> {
    let container = container(cli)?;
    let service = container.adjacency_service(model)?;
    let settings = &container.settings;
    let params = request_params(
        request,
        &settings.selection.selected_param,
        selected_id.map(|id| (settings.adjacency.selected_id_param.as_str(), id)),
    );

    let tree = service.run(&params)?;
    if request.tree {
        print_trees(model, tree.to_tree_strings());
        Ok(())
    } else {
        print_json(&tree, request.pretty)
    }
}

#[instrument(skip(cli))]
fn cmd_validate(cli: &Cli, model: &str) -> CliResult<()> {
    let container = container(cli)?;
    let service = container.nested_set_service(model)?;
    let rows = service.validate()?;
    output::success(&format!("'{model}': {rows} rows, bounds are well-formed"));
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
        }
        ConfigCommands::Path => {
            output::header("Config locations");
            match global_config_path() {
                Some(path) => output::detail(&format!("global: {}", describe(&path))),
                None => output::detail(&"global: (no config directory)"),
            }
            let local = cli
                .config
                .clone()
                .unwrap_or_else(|| LOCAL_CONFIG_FILE.into());
            output::detail(&format!("local:  {}", describe(&local)));
        }
    }
    Ok(())
}

fn describe(path: &Path) -> String {
    let state = if path.exists() { "found" } else { "missing" };
    format!("{} ({state})", path.display())
}
