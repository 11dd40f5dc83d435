//! recycle-lint - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use recycle_lint::util::config::{self, LintConfig, PROJECT_CONFIG_FILE};
use recycle_lint::util::diagnostic::{
    EmitterConfig, ErrorCodeDefinition, JsonEmitter, Severity, TextEmitter, RECYCLE_ISSUE,
};
use recycle_lint::util::logger::{self, LogLevel};
use recycle_lint::{check_paths, driver_for, NAME, VERSION};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Finds pooled resources (TypedArray, MotionEvent, Parcel, ...) that are never recycled
#[derive(Parser, Debug)]
#[command(name = "recycle-lint")]
#[command(author = "YaoXiang Team")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check unit files (.json / .ron) or directories containing them
    Check {
        /// Files or directories to check
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Config file (replaces the project-level recycle-lint.toml search)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Run all analyses on the current thread
        #[arg(long)]
        sequential: bool,

        /// Skip the coarse second pass
        #[arg(long)]
        no_rescan: bool,

        /// Override the reported severity
        #[arg(long, value_name = "SEVERITY")]
        severity: Option<Severity>,
    },

    /// List the active resource kinds
    Kinds {
        /// Config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Explain the check and its diagnostic codes
    Explain,

    /// Write a default recycle-lint.toml into a directory
    Init {
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },

    /// Print version information
    Version,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let level = if args.verbose {
        Some(LogLevel::Debug)
    } else {
        args.log_level
    };

    match args.command {
        Commands::Check {
            paths,
            format,
            config,
            no_color,
            sequential,
            no_rescan,
            severity,
        } => {
            let root = paths.first().map(PathBuf::as_path).unwrap_or(Path::new("."));
            let resolved = config::resolve_config(config.as_deref(), root)
                .context("Failed to load configuration")?;
            logger::init_cli(level.or(resolved.log_level));

            let mut lint = resolved.lint;
            if sequential {
                lint.parallel = false;
            }
            if no_rescan {
                lint.rescan = false;
            }
            if let Some(severity) = severity {
                lint.severity = severity;
            }

            let diagnostics = check_paths(&paths, &lint)?;
            match format {
                OutputFormat::Json => println!("{}", JsonEmitter::render_all(&diagnostics)),
                OutputFormat::Text => {
                    let emitter = TextEmitter::with_config(EmitterConfig {
                        use_colors: !no_color && std::io::stdout().is_terminal(),
                        ..EmitterConfig::default()
                    });
                    print!("{}", emitter.render_all(&diagnostics));
                }
            }

            if !diagnostics.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Kinds { config } => {
            let resolved = config::resolve_config(config.as_deref(), Path::new("."))
                .context("Failed to load configuration")?;
            logger::init_cli(level.or(resolved.log_level));
            print_kinds(&resolved.lint);
        }
        Commands::Explain => {
            logger::init_cli(level);
            print_explanation();
        }
        Commands::Init { dir } => {
            logger::init_cli(level);
            let path = dir.join(PROJECT_CONFIG_FILE);
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            config::write_default_config(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Created {}", path.display());
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_kinds(lint: &LintConfig) {
    let driver = driver_for(lint);
    for kind in driver.table().kinds() {
        let obtain: Vec<_> = kind
            .obtain
            .iter()
            .map(|p| format!("{}.{}", p.owner, p.name))
            .collect();
        println!(
            "{:<16} {}  [{}]",
            kind.name,
            if kind.flow_checked { "flow" } else { "coarse" },
            obtain.join(", ")
        );
    }
}

fn print_explanation() {
    println!("{}: {}", RECYCLE_ISSUE.id, RECYCLE_ISSUE.summary);
    println!(
        "category: {}, priority: {}/10, severity: {}",
        RECYCLE_ISSUE.category, RECYCLE_ISSUE.priority, RECYCLE_ISSUE.default_severity
    );
    println!();
    println!("{}", RECYCLE_ISSUE.explanation);
    println!();
    for def in ErrorCodeDefinition::all() {
        println!("{}  {}", def.code, def.message_template);
    }
}
