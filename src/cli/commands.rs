//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::tree_view::forest_trees;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings, StoreBackend};
use crate::domain::NodeId;
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        ));
    };

    // Commands that need no store
    match command {
        Commands::Completion { shell } => return cmd_completion(*shell),
        Commands::Config {
            command: ConfigCommands::Path,
        } => return cmd_config_path(),
        _ => {}
    }

    let settings = load_settings(cli)?;
    if let Commands::Config {
        command: ConfigCommands::Show,
    } = command
    {
        return cmd_config_show(&settings);
    }

    let container = ServiceContainer::new(settings)?;
    if !container.settings.output.color {
        colored::control::set_override(false);
    }
    match command {
        Commands::Create {
            description,
            parent,
        } => cmd_create(&container, description, parent.as_deref()),
        Commands::Delete { id } => cmd_delete(&container, id),
        Commands::Move { id, parent } => cmd_move(&container, id, parent.as_deref()),
        Commands::Get { id } => cmd_get(&container, id),
        Commands::List => cmd_list(&container),
        Commands::Tree => cmd_tree(&container),
        Commands::Check => cmd_check(&container),
        Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
    }
}

/// Settings from config layers, then command-line overrides.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.memory {
        settings.store.backend = StoreBackend::Memory;
    }
    if let Some(path) = &cli.store {
        settings.store.backend = StoreBackend::Json;
        settings.store.path = path.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn parse_id(text: &str) -> CliResult<NodeId> {
    Ok(text.parse::<NodeId>()?)
}

fn parse_optional_id(text: Option<&str>) -> CliResult<Option<NodeId>> {
    text.map(parse_id).transpose()
}

#[instrument(skip(container))]
fn cmd_create(container: &ServiceContainer, description: &str, parent: Option<&str>) -> CliResult<()> {
    let parent = parse_optional_id(parent)?;
    let node = container.forest.create_node(description, parent)?;
    output::action("Created", &output::node_line(&node));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_delete(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let node = container.forest.delete_node(parse_id(id)?)?;
    output::action("Deleted", &output::node_line(&node));
    if !node.children.is_empty() {
        output::detail(&format!(
            "{} children moved to {}",
            node.children.len(),
            node.parent_node
                .map(|p| p.to_string())
                .unwrap_or_default()
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_move(container: &ServiceContainer, id: &str, parent: Option<&str>) -> CliResult<()> {
    let id = parse_id(id)?;
    let parent = parse_optional_id(parent)?;
    let outcome = container.forest.move_node(id, parent)?;
    let show = |p: Option<NodeId>| p.map(|p| p.to_string()).unwrap_or_else(|| "(root)".into());
    output::success(&format!("Moved {}", outcome.moved));
    output::detail(&format!("old parent: {}", show(outcome.old_parent)));
    output::detail(&format!("new parent: {}", show(outcome.new_parent)));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_get(container: &ServiceContainer, id: &str) -> CliResult<()> {
    let id = parse_id(id)?;
    let node = container.forest.get(id)?;
    let children = container.forest.children(id)?;
    output::info(&output::node_line(&node));
    if children.is_empty() {
        output::detail(&"no children");
    }
    for child in &children {
        output::detail(&output::node_line(child));
    }
    Ok(())
}

fn cmd_list(container: &ServiceContainer) -> CliResult<()> {
    let nodes = container.forest.list()?;
    for node in &nodes {
        output::info(&output::node_line(node));
    }
    Ok(())
}

fn cmd_tree(container: &ServiceContainer) -> CliResult<()> {
    let nodes = container.forest.list()?;
    if nodes.is_empty() {
        output::warning("forest is empty");
        return Ok(());
    }
    for tree in forest_trees(&nodes) {
        output::info(&tree);
    }
    Ok(())
}

fn cmd_check(container: &ServiceContainer) -> CliResult<()> {
    let violations = container.forest.check()?;
    if violations.is_empty() {
        output::success("forest is consistent");
        return Ok(());
    }
    output::header("Invariant violations:");
    for violation in &violations {
        output::failure(violation);
    }
    Err(CliError::Violations(violations.len()))
}

fn cmd_config_show(settings: &Settings) -> CliResult<()> {
    output::info(&settings.to_toml()?);
    Ok(())
}

fn cmd_config_path() -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::info(&path.display()),
        None => output::warning("no config directory on this platform"),
    }
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
