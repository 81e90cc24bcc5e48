mod skill_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    skillbox_config::SkillboxConfig,
    skillbox_skills::{
        Registry, SkillService, agents::AgentPaths, install::Installer, state::InstallLayout,
    },
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "skillbox",
    version,
    about = "Browse, install and adapt skill bundles for coding agents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Skill catalog directory (overrides config and SKILLBOX_SKILLS_ROOT).
    #[arg(long, global = true)]
    skills_root: Option<PathBuf>,

    /// Full-source install directory (overrides config and SKILLBOX_INSTALL_DIR).
    #[arg(long, global = true)]
    install_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List skills in the catalog.
    List {
        /// Only skills in this category (display name or slug).
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Search names, descriptions and tags.
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a skill's catalog record.
    Info {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Print a skill's documentation.
    Docs {
        name: String,
        /// Doc file relative to the bundle (defaults to SKILL.md, then README.md).
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the env vars, binaries and packages a skill needs.
    Requires {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Install a skill, or write its descriptor for an agent.
    Install {
        name: String,
        /// Target agent: claude, cursor, codex or all.
        #[arg(long = "for", value_name = "AGENT")]
        agent: Option<String>,
        /// global or project (default: project).
        #[arg(long)]
        scope: Option<String>,
        /// Replace an existing full-source install.
        #[arg(long)]
        overwrite: bool,
        #[arg(long)]
        json: bool,
    },
    /// Remove an installed skill or agent descriptor.
    Remove {
        name: String,
        #[arg(long = "for", value_name = "AGENT")]
        agent: Option<String>,
        #[arg(long)]
        scope: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// List categories with skill counts.
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Show where a skill is installed.
    Status {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Serve the catalog as a JSON-RPC tool server over stdio.
    Mcp,
    /// Start the HTTP API.
    Serve {
        /// Port to listen on (overrides config value).
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind to (overrides config value).
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries --json output and the stdio protocol; logs stay on stderr.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SkillboxConfig> {
    let mut config = skillbox_config::discover_and_load();
    skillbox_config::apply_env_overrides(&mut config);
    if let Some(ref root) = cli.skills_root {
        config.catalog.root = root.clone();
    }
    if let Some(ref dir) = cli.install_dir {
        config.install.dir = dir.clone();
    }
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    config.resolve_paths(&cwd);
    if config.agents.project_dir.is_none() {
        config.agents.project_dir = Some(cwd);
    }
    Ok(config)
}

async fn build_service(config: &SkillboxConfig) -> anyhow::Result<SkillService> {
    let registry = Registry::load(&config.catalog.root).await?;
    let project = config
        .agents
        .project_dir
        .clone()
        .context("project directory not resolved")?;
    let layout = InstallLayout::new(
        config.install.dir.clone(),
        AgentPaths {
            home: config.agents.resolved_home_dir(),
            project,
        },
    );
    Ok(SkillService::new(
        Arc::new(registry),
        Installer::new(layout),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let config = load_config(&cli)?;
    let service = build_service(&config).await?;
    debug!(
        catalog = %service.registry().root().display(),
        skills = service.registry().len(),
        install_dir = %config.install.dir.display(),
        "catalog loaded"
    );

    match cli.command {
        Commands::List { category, json } => {
            skill_commands::handle_list(&service, category.as_deref(), json)
        },
        Commands::Search { query, json } => skill_commands::handle_search(&service, &query, json),
        Commands::Info { name, json } => skill_commands::handle_info(&service, &name, json).await,
        Commands::Docs { name, file, json } => {
            skill_commands::handle_docs(&service, &name, file.as_deref(), json).await
        },
        Commands::Requires { name, json } => {
            skill_commands::handle_requires(&service, &name, json).await
        },
        Commands::Install {
            name,
            agent,
            scope,
            overwrite,
            json,
        } => {
            skill_commands::handle_install(
                &service,
                &name,
                agent.as_deref(),
                scope.as_deref(),
                overwrite,
                json,
            )
            .await
        },
        Commands::Remove {
            name,
            agent,
            scope,
            json,
        } => {
            skill_commands::handle_remove(&service, &name, agent.as_deref(), scope.as_deref(), json)
                .await
        },
        Commands::Categories { json } => skill_commands::handle_categories(&service, json),
        Commands::Status { name, json } => {
            skill_commands::handle_status(&service, &name, json).await
        },
        Commands::Mcp => {
            let server = skillbox_mcp::McpServer::new(service);
            skillbox_mcp::serve_stdio(&server).await?;
            Ok(())
        },
        Commands::Serve { port, bind } => {
            let bind = bind.unwrap_or(config.server.bind);
            let port = port.unwrap_or(config.server.port);
            skillbox_gateway::serve(&bind, port, service).await?;
            Ok(())
        },
    }
}
