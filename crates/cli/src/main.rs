use anyhow::Result;
use capgraph::commands::{
    compartment_summary_command, graph_command, perms_command, query_command, summary_command,
    symbols_command, tag_heap_command, GraphOptions,
};
use capgraph_core::services::GraphRequest;
use clap::{Args, Parser, Subcommand};

/// CHERI capability trace analyzer.
///
/// This CLI is a thin wrapper around `capgraph-core` (exposed in code as `capgraph_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "capgraph",
    version,
    about = "Graph which memory regions hold capabilities into which others",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Flags shared by the graph commands.
#[derive(Args, Debug, Clone)]
struct GraphArgs {
    /// Path to the trace database (SQLite).
    #[arg(long)]
    db: String,

    /// Optional graph config file (JSON or YAML).
    #[arg(long)]
    config: Option<String>,

    /// Output directory; overrides the config file.
    #[arg(long)]
    out_dir: Option<String>,

    /// Overlap policy: all, first-loaded, smallest. Overrides the config file.
    #[arg(long)]
    overlap: Option<String>,

    /// Omit permission labels; parallel edges between two nodes are merged.
    #[arg(long, default_value_t = false)]
    unlabeled: bool,

    /// Also render the graph with Graphviz (pdf, png, svg, ps).
    #[arg(long)]
    render: Option<String>,

    /// Graphviz `dot` binary. Defaults to $CAPGRAPH_DOT_BIN, then `dot`.
    #[arg(long)]
    dot_bin: Option<String>,
}

impl From<GraphArgs> for GraphOptions {
    fn from(args: GraphArgs) -> Self {
        GraphOptions {
            db: args.db,
            config: args.config,
            out_dir: args.out_dir,
            overlap: args.overlap,
            unlabeled: args.unlabeled,
            render: args.render,
            dot_bin: args.dot_bin,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Region graph: which binaries and pseudo mappings hold capabilities into which.
    ///
    /// Writes `graph_overview.gv` and `graph_overview.json` to the output directory.
    Graph {
        #[command(flatten)]
        args: GraphArgs,
    },

    /// Compartment graph: capabilities crossing compartment boundaries.
    ///
    /// Writes `comparts_graph.gv` and `comparts_graph.json`.
    Compartments {
        #[command(flatten)]
        args: GraphArgs,
    },

    /// Capabilities flowing between two libraries matched by path substring.
    ///
    /// Writes `<LIB1>_vs_<LIB2>.gv` and its JSON export.
    Between {
        lib1: String,
        lib2: String,
        #[command(flatten)]
        args: GraphArgs,
    },

    /// Run a read-only SQL query against the trace and print rows as JSON.
    Query {
        #[arg(long)]
        db: String,
        sql: String,
    },

    /// Capability counts per memory-map entry.
    Summary {
        #[arg(long)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Capability counts per ordered compartment pair.
    CompartmentSummary {
        #[arg(long)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Count of each distinct permission string.
    Perms {
        #[arg(long)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Capabilities stored in one library, annotated with ELF symbols.
    ///
    /// Matches capability locations and targets against the `elf_sym` table.
    Syms {
        /// Library path substring, e.g. `libc.so`.
        lib: String,

        #[arg(long)]
        db: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Rename memory-map rows holding the given heap blocks to `heap block`.
    ///
    /// This is the only command that writes to the trace database.
    TagHeap {
        #[arg(long)]
        db: String,

        /// Heap block address (hex with 0x, or decimal). Repeatable.
        #[arg(long = "addr", required = true)]
        addrs: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Graph { args } => {
            graph_command(&args.into(), GraphRequest::Regions)?;
        }
        Command::Compartments { args } => {
            graph_command(&args.into(), GraphRequest::Compartments)?;
        }
        Command::Between { lib1, lib2, args } => {
            graph_command(&args.into(), GraphRequest::Pair { first: lib1, second: lib2 })?;
        }
        Command::Query { db, sql } => query_command(&db, &sql)?,
        Command::Summary { db, json } => summary_command(&db, json)?,
        Command::CompartmentSummary { db, json } => compartment_summary_command(&db, json)?,
        Command::Perms { db, json } => perms_command(&db, json)?,
        Command::Syms { lib, db, json } => {
            symbols_command(&db, &lib, json)?;
        }
        Command::TagHeap { db, addrs } => {
            tag_heap_command(&db, &addrs)?;
        }
    }

    Ok(())
}
