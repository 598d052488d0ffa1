use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use specgraph_core::consistency::render_console;
use specgraph_core::{
    Config, GraphDb, GraphError, GraphQuery, NarrativeLinter, NodeType, Reconciler, SchemaValidator, SyncEngine,
    Workspace,
};

mod output;

#[derive(Parser)]
#[command(name = "specgraph")]
#[command(author, version, about = "Typed knowledge graph over a product specification", long_about = None)]
struct Cli {
    /// Project root holding the spec tree and narrative document
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the graph store from the spec documents
    Sync {
        /// Upsert a single document instead of rebuilding everything
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Validate every spec document against its schema
    Validate {
        #[arg(long)]
        json: bool,
    },
    /// Reconcile the narrative document against the spec tree and write the dashboard
    Check {
        #[arg(long)]
        json: bool,

        /// Print the report without writing the dashboard file
        #[arg(long)]
        no_write: bool,
    },
    /// Lint the narrative document
    Lint,
    /// Show a node and its neighborhood
    Show {
        id: String,

        /// Number of hops to expand
        #[arg(long, default_value = "1")]
        depth: usize,

        #[arg(long)]
        json: bool,
    },
    /// Shortest path between two nodes
    Path { from: String, to: String },
    /// Search node names and descriptions
    Search {
        query: String,

        /// Restrict to node types (repeatable)
        #[arg(long = "type")]
        types: Vec<NodeType>,
    },
    /// Print the product / domain / feature / component tree
    Tree,
    /// Show a feature with its domain, components and dependencies
    Feature { id: String },
    /// Show a component with its features, domain and design
    Component { id: String },
    /// Print store statistics and edges pointing at missing nodes
    Stats,
    /// Print the default configuration
    Config,
}

fn init_tracing(verbose: bool, config: &Config) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.logging.level))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn spinner(message: &str) -> color_eyre::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn open_db(workspace: &Workspace) -> color_eyre::Result<GraphDb> {
    let path = workspace.database_file();
    GraphDb::open(&path).wrap_err_with(|| format!("opening graph database at {}", path.display()))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = Config::load(&cli.root).wrap_err("loading configuration")?;
    init_tracing(cli.verbose, &config);
    let workspace = Workspace::new(&cli.root, config);
    tracing::debug!(root = %workspace.project_root().display(), "workspace resolved");

    match cli.command {
        Commands::Sync { file } => cmd_sync(&workspace, file.as_deref()),
        Commands::Validate { json } => cmd_validate(&workspace, json),
        Commands::Check { json, no_write } => cmd_check(&workspace, json, no_write),
        Commands::Lint => cmd_lint(&workspace),
        Commands::Show { id, depth, json } => {
            let db = open_db(&workspace)?;
            let sub = GraphQuery::new(&db)
                .node_with_relations(&id, depth)?
                .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&sub)?);
            } else {
                output::print_subgraph(&sub);
            }
            Ok(())
        }
        Commands::Path { from, to } => {
            let db = open_db(&workspace)?;
            match GraphQuery::new(&db).find_path(&from, &to)? {
                Some(path) if path.is_empty() => println!("{} is {}", from, to),
                Some(path) => output::print_path(&from, &path),
                None => println!("No path between {} and {}", from, to),
            }
            Ok(())
        }
        Commands::Search { query, types } => {
            let db = open_db(&workspace)?;
            let filter = if types.is_empty() { None } else { Some(types.as_slice()) };
            let nodes = GraphQuery::new(&db).search_nodes(&query, filter)?;
            if nodes.is_empty() {
                println!("No nodes match '{}'", query);
            }
            for node in &nodes {
                output::print_node_line(node);
            }
            Ok(())
        }
        Commands::Tree => {
            let db = open_db(&workspace)?;
            output::print_hierarchy(&GraphQuery::new(&db).hierarchy()?);
            Ok(())
        }
        Commands::Feature { id } => {
            let db = open_db(&workspace)?;
            let ctx = GraphQuery::new(&db)
                .feature_context(&id)?
                .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
            output::print_feature(&ctx);
            Ok(())
        }
        Commands::Component { id } => {
            let db = open_db(&workspace)?;
            let ctx = GraphQuery::new(&db)
                .component_context(&id)?
                .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
            output::print_component(&ctx)?;
            Ok(())
        }
        Commands::Stats => {
            let db = open_db(&workspace)?;
            output::print_stats(&db)?;
            Ok(())
        }
        Commands::Config => {
            print!("{}", Config::default_config_string());
            Ok(())
        }
    }
}

fn cmd_sync(workspace: &Workspace, file: Option<&Path>) -> color_eyre::Result<()> {
    let mut db = open_db(workspace)?;
    let pb = spinner("Syncing spec documents...")?;
    let result = match file {
        Some(path) => SyncEngine::new(workspace, &mut db).sync_file(path),
        None => SyncEngine::new(workspace, &mut db).sync_all(),
    };
    pb.finish_and_clear();
    let result = result?;

    println!(
        "Synced {} nodes ({} added, {} updated, {} unchanged, {} deleted)",
        result.total_nodes(),
        result.added,
        result.updated,
        result.unchanged,
        result.deleted
    );
    println!(
        "Created {} edges, registered {} domain APIs",
        result.edges_created, result.domain_apis
    );
    if result.has_errors() {
        println!("\nSkipped {} documents:", result.errors.len());
        for issue in &result.errors {
            println!("  x {}: {}", issue.path, issue.message);
        }
    }
    Ok(())
}

fn cmd_validate(workspace: &Workspace, json: bool) -> color_eyre::Result<()> {
    let report = SchemaValidator::new(workspace).validate_all();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_validation(&report);
    }
    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_check(workspace: &Workspace, json: bool, no_write: bool) -> color_eyre::Result<()> {
    let reconciler = Reconciler::new(workspace);
    let pb = spinner("Reconciling narrative and spec tree...")?;
    let report = if no_write {
        reconciler.check()
    } else {
        reconciler.run_check()
    };
    pb.finish_and_clear();
    let report = report?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", render_console(&report));
        if !no_write {
            println!("\nDashboard updated: {}", workspace.dashboard_file().display());
        }
    }
    Ok(())
}

fn cmd_lint(workspace: &Workspace) -> color_eyre::Result<()> {
    let report = NarrativeLinter::new(workspace).lint();
    for issue in report.errors.iter().chain(&report.warnings) {
        let marker = match issue.severity {
            specgraph_core::Severity::Error => "x",
            specgraph_core::Severity::Warning => "!",
        };
        println!("  {} {}", marker, issue.message);
    }
    println!(
        "\n{}: {} errors, {} warnings",
        workspace.narrative_name(),
        report.errors.len(),
        report.warnings.len()
    );
    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}
