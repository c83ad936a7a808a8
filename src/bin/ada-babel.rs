//! Command-line front end for editor integrations
//!
//! Usage: ada-babel execute|prove|eval|plan|tangle|templates [options] [BLOCK]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ada_babel::{Config, Orchestrator, SystemRunner, TangleHooks};

mod cli;

use cli::block::{BlockArgs, ProofArgs};
use cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "ada-babel")]
#[command(about = "Compile, run and prove Ada/SPARK source blocks", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormat,

    /// More log output on stderr (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the compiler command
    #[arg(long, global = true)]
    compile_cmd: Option<String>,

    /// Override the prover command
    #[arg(long, global = true)]
    prove_cmd: Option<String>,

    /// Override the language version used when a block sets none (0 = no flag)
    #[arg(long, global = true)]
    default_version: Option<u16>,

    /// Override the temp directory for generated artifacts
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the block and run the resulting program
    Execute {
        #[command(flatten)]
        block: BlockArgs,
    },

    /// Prove the block with the prover
    Prove {
        #[command(flatten)]
        block: BlockArgs,

        #[command(flatten)]
        proof: ProofArgs,
    },

    /// Execute or prove, as the block's `:prove` option says
    Eval {
        #[command(flatten)]
        block: BlockArgs,

        #[command(flatten)]
        proof: ProofArgs,

        /// Prove instead of execute, overriding the header
        #[arg(long)]
        prove: bool,
    },

    /// Prepare artifacts and print the commands without running them
    Plan {
        #[command(flatten)]
        block: BlockArgs,

        #[command(flatten)]
        proof: ProofArgs,

        /// Prove instead of execute, overriding the header
        #[arg(long)]
        prove: bool,
    },

    /// Write the expanded block to a file under a "do not edit" banner
    Tangle {
        #[command(flatten)]
        block: BlockArgs,

        /// Document the block comes from, named in the banner
        #[arg(long)]
        origin: String,

        /// File to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List registered templates
    Templates,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(cmd) = &cli.compile_cmd {
        config.compile_cmd = cmd.clone();
    }
    if let Some(cmd) = &cli.prove_cmd {
        config.prove_cmd = cmd.clone();
    }
    if let Some(version) = cli.default_version {
        config.default_version = version;
    }
    if let Some(dir) = &cli.temp_dir {
        config.temp_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_config(&cli)?;
    let format = cli.format;

    match cli.command {
        Commands::Execute { block } => {
            let raw = block.raw_options(None, Some(false))?;
            handle_evaluate(&config, &block, &raw, format)
        }
        Commands::Prove { block, proof } => {
            let raw = block.raw_options(Some(&proof), Some(true))?;
            handle_evaluate(&config, &block, &raw, format)
        }
        Commands::Eval { block, proof, prove } => {
            let raw = block.raw_options(Some(&proof), prove.then_some(true))?;
            handle_evaluate(&config, &block, &raw, format)
        }
        Commands::Plan { block, proof, prove } => {
            let raw = block.raw_options(Some(&proof), prove.then_some(true))?;
            handle_plan(&config, &block, &raw, format)
        }
        Commands::Tangle {
            block,
            origin,
            output,
        } => handle_tangle(&config, &block, &origin, &output),
        Commands::Templates => handle_templates(&config, format),
    }
}

fn handle_evaluate(
    config: &Config,
    block: &BlockArgs,
    raw: &ada_babel::RawOptions,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let body = block.read_body()?;
    let mut orch = Orchestrator::from_config(config, block.remote, SystemRunner)?;
    let result = orch.evaluate(&body, raw)?;

    print!("{}", cli::output::format_evaluation(&result, format));

    // 0 only when every step ran cleanly
    Ok(if result.is_completed() { 0 } else { 1 })
}

fn handle_plan(
    config: &Config,
    block: &BlockArgs,
    raw: &ada_babel::RawOptions,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let body = block.read_body()?;
    let mut orch = Orchestrator::from_config(config, block.remote, SystemRunner)?;
    let plan = orch.plan(&body, raw)?;

    print!("{}", cli::output::format_plan(&plan, format));
    Ok(0)
}

fn handle_tangle(
    config: &Config,
    block: &BlockArgs,
    origin: &str,
    output: &std::path::Path,
) -> anyhow::Result<i32> {
    let body = block.read_body()?;
    let raw = block.raw_options(None, None)?;
    let params = ada_babel::BlockParams::resolve(&raw)?;
    let registry = config.template_registry()?;
    let expanded = ada_babel::expand_body(&body, &params, &registry)?;

    let mut settings = config.tangle_settings();
    let mut hooks = TangleHooks::new();
    {
        let guard = hooks.guard(&mut settings)?;
        ada_babel::tangle_block(guard.settings(), origin, &expanded, output)?;
    }

    eprintln!("Tangled {} into {}", origin, output.display());
    Ok(0)
}

fn handle_templates(config: &Config, format: OutputFormat) -> anyhow::Result<i32> {
    let registry = config.template_registry()?;
    print!("{}", cli::output::format_templates(&registry, format));
    Ok(0)
}
