use anyhow::Result;
use asm_harvester::commands;
use clap::{Parser, Subcommand};

/// Multi-target assembly harvesting CLI.
///
/// This CLI is a thin wrapper around `harvest-core` (exposed in code as `harvest_core`).
/// All substantive logic lives in the library so it can be tested thoroughly
/// and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "asm-harvester",
    version,
    about = "Multi-target assembly extraction and normalization",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new harvest corpus at the given root.
    ///
    /// This will:
    /// - Create a `.harvest` metadata directory.
    /// - Create `functions` and `records` directories.
    /// - Write a `.harvest/corpus.json` config file.
    Init {
        /// Corpus root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional corpus name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// List the compilation targets in the default matrix.
    Targets {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compile one function across the target matrix and extract its assembly.
    ///
    /// Reads a function spec (YAML or JSON), drives the configured compilers,
    /// and writes `record.json` and `asm.json` under `records/<fname>/`.
    Extract {
        /// Corpus root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Path to the function spec file (YAML or JSON).
        #[arg(long)]
        spec: String,

        /// Comma-separated target keys to restrict the run. Defaults to the full matrix.
        #[arg(long)]
        targets: Option<String>,

        /// Also harvest the real-dependency track when the spec file provides one.
        #[arg(long, default_value_t = false)]
        real: bool,

        /// Re-extract targets that already hold an entry.
        #[arg(long, default_value_t = false)]
        replace: bool,

        /// Number of compile worker threads.
        #[arg(long, default_value_t = 4)]
        jobs: usize,

        /// Per-compile timeout in seconds.
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show the extraction state recorded for one function.
    Show {
        /// Corpus root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Function name to show.
        #[arg(long)]
        fname: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List harvest runs recorded in the corpus database.
    Runs {
        /// Corpus root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Only show runs for this function.
        #[arg(long)]
        fname: Option<String>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init { root, name } => commands::init_corpus_command(&root, name)?,
        Command::Targets { json } => commands::targets_command(json)?,
        Command::Extract { root, spec, targets, real, replace, jobs, timeout_secs, json } => {
            let options = commands::ExtractOptions { targets, real, replace, jobs, timeout_secs };
            commands::extract_command(&root, &spec, &options, json)?
        }
        Command::Show { root, fname, json } => commands::show_command(&root, &fname, json)?,
        Command::Runs { root, fname, json } => {
            commands::runs_command(&root, fname.as_deref(), json)?
        }
    }

    Ok(())
}
