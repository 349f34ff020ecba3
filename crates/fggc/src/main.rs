//! The Featherweight Generic Go command line.
//!
//! Provides the `fggc` command with the following subcommands:
//!
//! - `fggc check <file>` - Type-check a program and print main's type
//! - `fggc nomono <file>` - Run the nomono check
//! - `fggc monom <file>` - Print the monomorphized program
//! - `fggc eval <file>` - Evaluate a program
//!
//! Programs are read as JSON documents of `fgg_syntax::Program`.
//!
//! Options:
//! - `--no-color` - Disable colorized diagnostics
//! - `--json-diagnostics` - Output diagnostics as JSON (one object per line)
//! - `--verbose` - Log analysis passes to stderr (`RUST_LOG` overrides)

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fgg_eval::{EvalConfig, EvalError, Outcome};
use fgg_mono::{MonoConfig, MonoError};
use fgg_syntax::Program;
use fgg_typeck::diagnostics::{render_diagnostic, DiagnosticOptions};
use fgg_typeck::TypeError;

#[derive(Parser)]
#[command(name = "fggc", version, about = "Featherweight Generic Go checker, monomorphizer and interpreter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colorized output
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Output diagnostics as JSON (one object per line) instead of human-readable format
    #[arg(long = "json-diagnostics", global = true)]
    json_diagnostics: bool,

    /// Log analysis passes to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Type-check a program and print the type of main
    Check {
        file: PathBuf,

        /// Accept assertions on expressions of non-interface type
        #[arg(long = "unsafe-casts")]
        unsafe_casts: bool,

        /// Reconstruct omitted type arguments before checking
        #[arg(long)]
        infer: bool,
    },
    /// Check that instantiation discovery terminates
    Nomono { file: PathBuf },
    /// Translate a program into its ground, generics-free form
    Monom {
        file: PathBuf,

        /// Skip the nomono check (discovery may not terminate)
        #[arg(long = "skip-nomono")]
        skip_nomono: bool,

        /// Give up on discovery after this many passes
        #[arg(long = "max-passes")]
        max_passes: Option<usize>,

        /// Print the ground program as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate a program
    Eval {
        file: PathBuf,

        /// Stop after this many reduction steps
        #[arg(long)]
        steps: Option<usize>,

        /// Print every intermediate expression with the rule applied
        #[arg(long)]
        trace: bool,

        /// Evaluate the monomorphized program instead
        #[arg(long)]
        monom: bool,
    },
}

/// Why a command failed.
enum Failure {
    /// A type error, rendered against the program it was found in.
    Type(TypeError, Program),
    /// A program that is well-typed but not monomorphisable.
    NotMonomorphisable(String),
    /// Evaluation ended in a stuck state.
    Stuck(String),
    Other(String),
}

impl Failure {
    fn from_mono(e: MonoError, program: &Program) -> Self {
        match e {
            MonoError::Type(e) => Failure::Type(e, program.clone()),
            MonoError::Eval(e) => Failure::from_eval(e, program),
            MonoError::NotMonomorphisable { witness } => Failure::NotMonomorphisable(witness),
            other => Failure::Other(other.to_string()),
        }
    }

    fn from_eval(e: EvalError, program: &Program) -> Self {
        match e {
            EvalError::Type(e) => Failure::Type(e, program.clone()),
            EvalError::Stuck(reason) => Failure::Stuck(reason.to_string()),
            other => Failure::Other(other.to_string()),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let diag_opts = DiagnosticOptions {
        color: !cli.no_color && !cli.json_diagnostics,
        json: cli.json_diagnostics,
    };
    let (file, result) = match cli.command {
        Commands::Check { file, unsafe_casts, infer } => {
            let result = check(&file, unsafe_casts, infer);
            (file, result)
        }
        Commands::Nomono { file } => {
            let result = nomono(&file);
            (file, result)
        }
        Commands::Monom { file, skip_nomono, max_passes, json } => {
            let config = MonoConfig { check_nomono: !skip_nomono, max_passes };
            let result = monom(&file, &config, json);
            (file, result)
        }
        Commands::Eval { file, steps, trace, monom } => {
            let config = EvalConfig { max_steps: steps, trace, check_preservation: false };
            let result = eval(&file, &config, monom);
            (file, result)
        }
    };

    if let Err(failure) = result {
        report(&failure, &file, &diag_opts);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load(path: &Path) -> Result<Program, Failure> {
    tracing::debug!(file = %path.display(), "loading program");
    let text = std::fs::read_to_string(path)
        .map_err(|e| Failure::Other(format!("Failed to read '{}': {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| Failure::Other(format!("'{}' is not a valid program: {}", path.display(), e)))
}

fn check(path: &Path, unsafe_casts: bool, infer: bool) -> Result<(), Failure> {
    let program = load(path)?;
    let result = if infer {
        fgg_typeck::infer_program(&program)
    } else {
        fgg_typeck::check_program(&program, unsafe_casts)
    };
    let (ty, _) = result.map_err(|e| Failure::Type(e, program.clone()))?;
    println!("{}", ty);
    Ok(())
}

fn nomono(path: &Path) -> Result<(), Failure> {
    let program = load(path)?;
    fgg_mono::nomono_program(&program).map_err(|e| Failure::from_mono(e, &program))?;
    println!("monomorphisable");
    Ok(())
}

fn monom(path: &Path, config: &MonoConfig, json: bool) -> Result<(), Failure> {
    let program = load(path)?;
    let ground = fgg_mono::monomorph_program(&program, config).map_err(|e| Failure::from_mono(e, &program))?;
    if json {
        let text = serde_json::to_string_pretty(&ground).map_err(|e| Failure::Other(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{}", ground);
    }
    Ok(())
}

fn eval(path: &Path, config: &EvalConfig, monom: bool) -> Result<(), Failure> {
    let mut program = load(path)?;
    if monom {
        program = fgg_mono::monomorph_program(&program, &MonoConfig::default())
            .map_err(|e| Failure::from_mono(e, &program))?;
    }
    let run = fgg_eval::run(&program, config).map_err(|e| Failure::from_eval(e, &program))?;
    for (i, step) in run.trace.iter().enumerate() {
        println!("{:>4} {:<10} {}", i + 1, step.rule.name(), step.expr);
    }
    match run.outcome {
        Outcome::Value(v) => {
            println!("{}", v);
            Ok(())
        }
        Outcome::StepLimit(e) => {
            eprintln!("note: stopped after {} steps", run.steps);
            println!("{}", e);
            Ok(())
        }
        Outcome::Stuck { reason, .. } => Err(Failure::Stuck(reason.to_string())),
    }
}

fn report(failure: &Failure, path: &Path, diag_opts: &DiagnosticOptions) {
    let file_name = path.display().to_string();
    let (code, message) = match failure {
        Failure::Type(error, program) => {
            eprint!("{}", render_diagnostic(error, &program.to_string(), &file_name, diag_opts));
            if diag_opts.json {
                eprintln!();
            }
            return;
        }
        Failure::NotMonomorphisable(witness) => ("M0001", format!("program is not monomorphisable: {}", witness)),
        Failure::Stuck(reason) => ("R0001", format!("evaluation stuck: {}", reason)),
        Failure::Other(message) => ("C0001", message.clone()),
    };
    if diag_opts.json {
        let msg = serde_json::json!({
            "code": code,
            "severity": "error",
            "message": message,
            "file": file_name,
        });
        eprintln!("{}", msg);
    } else {
        eprintln!("error: {}", message);
    }
}
