//! OneMCP - one MCP server list for every AI tool
//!
//! Usage:
//!   onemcp tools              # Show detected tools
//!   onemcp list               # Show the merged server list
//!   onemcp add <name> ...     # Add a server to one or more tools
//!   onemcp sync               # Rewrite every installed tool from the merged list

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::{Confirm, theme::ColorfulTheme};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onemcp_core::config::paths::{dirname, join_paths};
use onemcp_core::interchange::export_servers_json;
use onemcp_core::mcp::{parse_args, stringify_args};
use onemcp_core::prelude::*;

#[derive(Parser)]
#[command(name = "onemcp")]
#[command(about = "Keep MCP server definitions in sync across AI tools", long_about = None)]
struct Cli {
    /// Preferences file (defaults to <config dir>/onemcp/onemcp.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show known tools, their config paths and whether they are installed
    Tools,

    /// List the merged MCP servers and the tools they are enabled for
    List,

    /// Add an MCP server
    Add(Box<AddArgs>),

    /// Edit an MCP server
    Edit(Box<EditArgs>),

    /// Remove an MCP server from every tool it is enabled for
    #[command(alias = "rm")]
    Remove {
        /// Server name
        name: String,
    },

    /// Rewrite every installed tool from the merged server list
    Sync,

    /// List config snapshots of a tool
    Backups {
        /// Tool id
        tool: String,
    },

    /// Restore a tool's config file from a snapshot
    Restore {
        /// Tool id
        tool: String,
        /// Snapshot path or file name (see `onemcp backups <tool>`)
        snapshot: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Export the merged server list as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Import servers from an exported JSON file
    Import {
        /// Export file to read
        file: PathBuf,
        /// Tool for servers that list no enabled tools (repeatable)
        #[arg(long = "tool", value_name = "TOOL")]
        tools: Vec<String>,
    },

    /// Register a custom tool
    AddTool(AddToolArgs),

    /// Exclude a tool from reconciliation
    Hide {
        /// Tool id
        tool: String,
    },

    /// Include a previously hidden tool again
    Unhide {
        /// Tool id
        tool: String,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

#[derive(Args)]
struct AddArgs {
    /// Server name (letters, numbers, spaces, dots, hyphens, underscores)
    name: String,
    /// Command that launches the server
    #[arg(long)]
    command: String,
    /// Arguments as one string, e.g. "-y @scope/server /tmp"
    #[arg(long, allow_hyphen_values = true)]
    args: Option<String>,
    /// Environment variable (KEY=VALUE)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,
    /// Working directory
    #[arg(long)]
    cwd: Option<String>,
    /// HTTP URL; switches the server to HTTP transport
    #[arg(long)]
    url: Option<String>,
    /// Tool to enable the server for (repeatable; defaults to every installed tool)
    #[arg(long = "tool", value_name = "TOOL")]
    tools: Vec<String>,
}

#[derive(Args)]
struct EditArgs {
    /// Current server name
    name: String,
    /// New server name
    #[arg(long)]
    rename: Option<String>,
    #[arg(long)]
    command: Option<String>,
    /// Replace arguments, given as one string
    #[arg(long, allow_hyphen_values = true)]
    args: Option<String>,
    /// Replace environment variables (KEY=VALUE, repeatable)
    #[arg(long, value_name = "KEY=VALUE")]
    env: Vec<String>,
    /// Remove all environment variables
    #[arg(long, conflicts_with = "env")]
    clear_env: bool,
    #[arg(long)]
    cwd: Option<String>,
    /// Remove the working directory
    #[arg(long, conflicts_with = "cwd")]
    clear_cwd: bool,
    /// Switch to HTTP transport at this URL
    #[arg(long)]
    url: Option<String>,
    /// Switch back to stdio transport
    #[arg(long, conflicts_with = "url")]
    stdio: bool,
    /// Enable for a tool (repeatable)
    #[arg(long, value_name = "TOOL")]
    enable: Vec<String>,
    /// Disable for a tool (repeatable)
    #[arg(long, value_name = "TOOL")]
    disable: Vec<String>,
}

#[derive(Args)]
struct AddToolArgs {
    /// Tool id (must not collide with a built-in tool)
    id: String,
    /// Config file path; `~` expands to the home directory
    path: String,
    /// Display name (defaults to the id)
    #[arg(long)]
    name: Option<String>,
    /// Server map location: mcpServers, servers or mcp.servers (detected when omitted)
    #[arg(long = "schema", value_name = "FORMAT")]
    schema: Option<String>,
    /// Explicit dotted server key
    #[arg(long)]
    server_key: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "onemcp=debug,onemcp_core=debug,info"
    } else {
        "onemcp=info,onemcp_core=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let success = run_cli(cli.command, cli.config, cli.format)?;
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Everything a command needs: preferences, the engine and freshly
/// reconciled state.
struct Session {
    ctx: AppContext,
    preferences: Preferences,
    reconciler: Reconciler,
    state: AppState,
    load: LoadReport,
}

impl Session {
    fn open(config: Option<PathBuf>) -> Result<Self> {
        let ctx = AppContext::from_env(config)?;
        let preferences = ctx.load_preferences()?;
        let reconciler = ctx.reconciler(&preferences);
        let (state, load) = ctx.load_state(&preferences, &reconciler);
        Ok(Self {
            ctx,
            preferences,
            reconciler,
            state,
            load,
        })
    }

    fn server_id(&self, name: &str) -> Result<String> {
        self.state
            .server_by_name(name)
            .map(|s| s.id.clone())
            .ok_or_else(|| anyhow::anyhow!("No server named '{}'. See `onemcp list`", name))
    }

    fn tool(&self, id: &str) -> Result<&ToolDescriptor> {
        self.state
            .require_tool(id)
            .context("See `onemcp tools` for available tools")
    }

    fn installed_tool_ids(&self) -> Vec<String> {
        self.state.installed_tools().map(|t| t.id.clone()).collect()
    }

    fn save_preferences(&self) -> Result<()> {
        self.ctx.preferences_store().save(&self.preferences)
    }

    /// Surface tools that could not be read while loading.
    fn print_load_problems(&self, format: OutputFormat) {
        if matches!(format, OutputFormat::Json) {
            return;
        }
        for failure in &self.load.failures {
            eprintln!(
                "⚠ Could not read {} ({}): {}",
                failure.tool_id, failure.path, failure.message
            );
        }
        for conflict in &self.load.conflicts {
            eprintln!(
                "⚠ '{}' differs between {} and {}; using {}",
                conflict.name, conflict.kept_from, conflict.ignored_from, conflict.kept_from
            );
        }
    }
}

/// Returns false when a tool write failed.
fn run_cli(command: Commands, config: Option<PathBuf>, format: OutputFormat) -> Result<bool> {
    let mut session = Session::open(config)?;
    session.print_load_problems(format);

    match command {
        Commands::Tools => {
            print_tools(&session.state.tools, format)?;
            Ok(true)
        }
        Commands::List => {
            print_servers(&session.state.servers, format)?;
            Ok(true)
        }
        Commands::Add(args) => run_add(&mut session, *args, format),
        Commands::Edit(args) => run_edit(&mut session, *args, format),
        Commands::Remove { name } => {
            let id = session.server_id(&name)?;
            let report = session.reconciler.delete(&mut session.state, &id)?;
            print_report(&format!("Removed '{name}'"), &report, format)
        }
        Commands::Sync => {
            let report = session.reconciler.sync_all(&session.state);
            print_report("Synced", &report, format)
        }
        Commands::Backups { tool } => {
            let tool = session.tool(&tool)?;
            let records = session.reconciler.backups().list_backup_records(tool)?;
            print_backups(tool, &records, format)?;
            Ok(true)
        }
        Commands::Restore {
            tool,
            snapshot,
            yes,
        } => run_restore(&session, &tool, &snapshot, yes, format),
        Commands::Export { output } => {
            let all_tools = session.installed_tool_ids();
            let json = export_servers_json(&session.state.servers, &all_tools)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json).with_context(|| {
                        format!("Failed to write export file: {}", path.display())
                    })?;
                    println!(
                        "✓ Exported {} server(s) to {}",
                        session.state.servers.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }
            Ok(true)
        }
        Commands::Import { file, tools } => run_import(&mut session, file, &tools, format),
        Commands::AddTool(args) => run_add_tool(&mut session, args, format),
        Commands::Hide { tool } => {
            session.tool(&tool)?;
            session.preferences.set_hidden(&tool, true);
            session.save_preferences()?;
            println!("✓ Hid '{tool}'");
            Ok(true)
        }
        Commands::Unhide { tool } => {
            if !session.preferences.is_hidden(&tool) {
                anyhow::bail!("Tool '{}' is not hidden", tool);
            }
            session.preferences.set_hidden(&tool, false);
            session.save_preferences()?;
            println!("✓ Unhid '{tool}'");
            Ok(true)
        }
    }
}

fn run_add(session: &mut Session, args: AddArgs, format: OutputFormat) -> Result<bool> {
    let tools = if args.tools.is_empty() {
        session.installed_tool_ids()
    } else {
        args.tools
    };
    if tools.is_empty() {
        anyhow::bail!("No installed tools found; pass --tool <TOOL> to choose one");
    }

    let mut server = ServerRecord::new(&args.name, args.command).with_enabled_tools(tools);
    if let Some(raw) = args.args.as_deref() {
        server.args = parse_args(raw);
    }
    for (key, value) in parse_env(&args.env)? {
        server = server.with_env(key, value);
    }
    if let Some(cwd) = args.cwd {
        server = server.with_cwd(cwd);
    }
    if let Some(url) = args.url {
        server = server.with_url(url);
    }

    let report = session.reconciler.create(&mut session.state, server)?;
    print_report(&format!("Added '{}'", args.name), &report, format)
}

fn run_edit(session: &mut Session, args: EditArgs, format: OutputFormat) -> Result<bool> {
    let id = session.server_id(&args.name)?;

    let mut update = ServerUpdate {
        name: args.rename,
        command: args.command,
        args: args.args.as_deref().map(parse_args),
        ..ServerUpdate::new()
    };
    if args.clear_env {
        update.env = Some(None);
    } else if !args.env.is_empty() {
        update.env = Some(Some(parse_env(&args.env)?));
    }
    if args.clear_cwd {
        update.cwd = Some(None);
    } else if let Some(cwd) = args.cwd {
        update.cwd = Some(Some(cwd));
    }
    if let Some(url) = args.url {
        update.transport = Some(TransportType::Http);
        update.url = Some(Some(url));
    } else if args.stdio {
        update.transport = Some(TransportType::Stdio);
        update.url = Some(None);
    }

    if !args.enable.is_empty() || !args.disable.is_empty() {
        let current = match session.state.server(&id) {
            Some(server) if server.enabled_tools.is_some() => server.enabled_ids().to_vec(),
            _ => session.installed_tool_ids(),
        };
        update.enabled_tools = Some(apply_toggles(current, &args.enable, &args.disable));
    }

    if update.is_empty() {
        anyhow::bail!("Nothing to change. See `onemcp edit --help`");
    }

    let report = session.reconciler.edit(&mut session.state, &id, &update)?;
    print_report(&format!("Updated '{}'", args.name), &report, format)
}

/// Enable/disable a set of tool ids, keeping the original order.
fn apply_toggles(mut ids: Vec<String>, enable: &[String], disable: &[String]) -> Vec<String> {
    for id in enable {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids.retain(|id| !disable.contains(id));
    ids
}

fn run_restore(
    session: &Session,
    tool_id: &str,
    snapshot: &str,
    yes: bool,
    format: OutputFormat,
) -> Result<bool> {
    let tool = session.tool(tool_id)?;
    let snapshot = if snapshot.contains('/') || snapshot.contains('\\') {
        snapshot.to_string()
    } else {
        join_paths(&[&dirname(&tool.config_path), snapshot])
    };

    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Overwrite {} with {}?", tool.config_path, snapshot))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Restore cancelled");
            return Ok(true);
        }
    }

    let report = session.reconciler.restore_backup(tool, &snapshot)?;
    print_report(&format!("Restored {tool_id}"), &report, format)
}

fn run_import(
    session: &mut Session,
    file: PathBuf,
    tools: &[String],
    format: OutputFormat,
) -> Result<bool> {
    for tool in tools {
        session.tool(tool)?;
    }
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let mut servers = import_servers(&content)?;
    fill_enabled_tools(&mut servers, tools);

    let mut success = true;
    let mut imported = Vec::new();
    let mut rejected = Vec::new();
    for server in servers {
        let name = server.name.clone();
        if matches!(server.enabled_tools.as_deref(), Some([])) {
            success = false;
            rejected.push(serde_json::json!({
                "name": name,
                "error": "not enabled for any tool; pass --tool <TOOL>",
            }));
            continue;
        }
        match session.reconciler.create(&mut session.state, server) {
            Ok(report) if !report.outcomes.iter().any(|o| o.status == WriteStatus::Written) => {
                success = false;
                rejected.push(serde_json::json!({
                    "name": name,
                    "error": "not written to any tool config",
                    "report": report,
                }));
            }
            Ok(report) => {
                success &= report.is_success();
                imported.push(serde_json::json!({ "name": name, "report": report }));
            }
            Err(err) => {
                tracing::warn!("Skipping imported server '{}': {}", name, err);
                rejected.push(serde_json::json!({ "name": name, "error": err.to_string() }));
            }
        }
    }

    match format {
        OutputFormat::Table => {
            println!("✓ Imported {} server(s)", imported.len());
            for entry in &rejected {
                println!("  ⚠ {}: {}", entry["name"], entry["error"]);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "imported": imported, "rejected": rejected });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(success)
}

/// Give servers that name no tools the `--tool` selection.
fn fill_enabled_tools(servers: &mut [ServerRecord], tools: &[String]) {
    if tools.is_empty() {
        return;
    }
    for server in servers
        .iter_mut()
        .filter(|s| matches!(s.enabled_tools.as_deref(), Some([])))
    {
        server.enabled_tools = Some(tools.to_vec());
    }
}

fn run_add_tool(session: &mut Session, args: AddToolArgs, format: OutputFormat) -> Result<bool> {
    let schema = args
        .schema
        .as_deref()
        .map(SchemaFormat::try_from)
        .transpose()?;
    let name = args.name.unwrap_or_else(|| args.id.clone());

    let tool = session.ctx.register_custom_tool(
        &mut session.preferences,
        &args.id,
        &name,
        &args.path,
        schema,
        args.server_key,
    )?;
    session.save_preferences()?;

    match format {
        OutputFormat::Table => println!(
            "✓ Registered '{}' ({}) at {}",
            tool.id,
            tool.schema_format.default_server_key(),
            tool.config_path
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tool)?),
    }
    Ok(true)
}

fn parse_env(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid env value '{}', expected KEY=VALUE", pair))?;
        env.insert(key.trim().to_string(), value.to_string());
    }
    Ok(env)
}

fn print_report(action: &str, report: &OperationReport, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Table => {
            let symbol = if report.is_success() { "✓" } else { "✗" };
            println!("{} {} ({})", symbol, action, report.summary());
            for outcome in &report.outcomes {
                let mark = match outcome.status {
                    WriteStatus::Written => "✓",
                    WriteStatus::Skipped => "•",
                    WriteStatus::Failed => "✗",
                };
                println!("  {} {:<16} {}", mark, outcome.tool_id, outcome.message);
                if let Some(backup) = &outcome.backup {
                    println!("    backup: {}", backup);
                }
            }
            for warning in &report.warnings {
                println!("  ⚠ {}", warning);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }
    Ok(report.is_success())
}

fn print_tools(tools: &[ToolDescriptor], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(tools)?);
        return Ok(());
    }

    if tools.is_empty() {
        println!("No tools available on this platform.");
        return Ok(());
    }

    println!("{:<18} {:<20} {:<10} Config", "Id", "Name", "Installed");
    println!("{}", "-".repeat(80));
    for tool in tools {
        let installed = if tool.is_installed { "✓" } else { "-" };
        let name = if tool.is_built_in {
            truncate(&tool.name, 20)
        } else {
            truncate(&format!("{} (custom)", tool.name), 20)
        };
        println!(
            "{:<18} {:<20} {:<10} {}",
            tool.id, name, installed, tool.config_path
        );
    }
    Ok(())
}

fn print_servers(servers: &[ServerRecord], format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(servers)?);
        return Ok(());
    }

    if servers.is_empty() {
        println!("No MCP servers found.");
        println!("Add one with: onemcp add <name> --command <cmd>");
        return Ok(());
    }

    println!("{:<24} {:<6} {:<36} Tools", "Name", "Type", "Command");
    println!("{}", "-".repeat(90));
    for server in servers {
        let launch = match server.transport {
            TransportType::Http => server.url.clone().unwrap_or_default(),
            TransportType::Stdio if server.args.is_empty() => server.command.clone(),
            TransportType::Stdio => {
                format!("{} {}", server.command, stringify_args(&server.args))
            }
        };
        let tools = match &server.enabled_tools {
            Some(ids) if ids.is_empty() => "-".to_string(),
            Some(ids) => ids.join(", "),
            None => "all".to_string(),
        };
        println!(
            "{:<24} {:<6} {:<36} {}",
            truncate(&server.name, 24),
            server.transport,
            truncate(&launch, 36),
            tools
        );
    }
    Ok(())
}

fn print_backups(
    tool: &ToolDescriptor,
    records: &[BackupRecord],
    format: OutputFormat,
) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No backups for {} ({})", tool.id, tool.config_path);
        return Ok(());
    }

    println!("Backups of {} (newest first):", tool.config_path);
    for record in records {
        let file = record.path.rsplit('/').next().unwrap_or(&record.path);
        println!(
            "  {}  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S%.3f UTC"),
            file
        );
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
