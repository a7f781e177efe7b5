//! Keccak Oracle CLI.
//!
//! Exit codes: 0 clean, 1 discrepancy or known-answer failure, 2 protocol,
//! configuration or usage error.

use clap::{Parser, Subcommand};
use keccak_oracle::conformance::{
    CorpusRunner, DiffFuzzer, FuzzOutcome, HaltReason, ReproBundle, SubprocessRunner, VectorOutcome,
};
use keccak_oracle::{repl, FuzzConfig, Variant};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_DISCREPANCY: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(name = "keccak-oracle")]
#[command(about = "Reference Keccak sponge and differential fuzzer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information
    Version,

    /// Hash a message with the reference implementation
    Digest {
        /// Algorithm name, e.g. SHA3-256, keccak256, shake128
        algorithm: Variant,

        /// Message as hex (reads stdin when neither --hex nor --text is given)
        #[arg(long, conflicts_with = "text")]
        hex: Option<String>,

        /// Message as UTF-8 text
        #[arg(long)]
        text: Option<String>,

        /// Output length in bytes (required for SHAKE)
        #[arg(short, long)]
        length: Option<usize>,
    },

    /// Run a known-answer corpus against the reference
    Kat {
        /// Path to the corpus JSON
        corpus: PathBuf,
    },

    /// Fuzz an external implementation against the reference
    Fuzz {
        /// JSON config file; flags override its values
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Number of random cases
        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// RNG seed (random and logged when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Largest generated input in bytes
        #[arg(long, value_name = "BYTES")]
        max_len: Option<usize>,

        /// Readiness marker printed by the implementation
        #[arg(long, value_name = "TEXT")]
        ready_marker: Option<String>,

        /// Timeout for the readiness marker and each response
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Write the repro bundle here on a discrepancy
        #[arg(long, value_name = "PATH")]
        repro_out: Option<PathBuf>,

        /// Implementation command, e.g. -- melorun keccak.melo -i
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Serve the request/response protocol on stdin/stdout
    Repl {
        /// Readiness marker to print before each request
        #[arg(long, default_value = keccak_oracle::conformance::protocol::DEFAULT_READY_MARKER)]
        prompt: String,
    },

    /// Recompute the reference digest for a saved repro bundle
    Replay {
        /// Path to the bundle JSON
        bundle: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) | None => {
            println!("keccak-oracle v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        Some(Commands::Digest {
            algorithm,
            hex,
            text,
            length,
        }) => cmd_digest(algorithm, hex, text, length),
        Some(Commands::Kat { corpus }) => cmd_kat(&corpus),
        Some(Commands::Fuzz {
            config,
            iterations,
            seed,
            max_len,
            ready_marker,
            timeout_ms,
            repro_out,
            command,
        }) => {
            let mut fuzz_config = match config {
                Some(path) => match FuzzConfig::load(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::from(EXIT_ERROR);
                    }
                },
                None => FuzzConfig::default(),
            };
            if let Some(n) = iterations {
                fuzz_config.iterations = n;
            }
            if seed.is_some() {
                fuzz_config.seed = seed;
            }
            if let Some(len) = max_len {
                fuzz_config.max_input_len = len;
            }
            if let Some(marker) = ready_marker {
                fuzz_config.ready_marker = marker;
            }
            if let Some(ms) = timeout_ms {
                fuzz_config.ready_timeout_ms = ms;
                fuzz_config.response_timeout_ms = ms;
            }
            if !command.is_empty() {
                fuzz_config.command = command;
            }
            cmd_fuzz(&fuzz_config, repro_out)
        }
        Some(Commands::Repl { prompt }) => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            match repl::serve(stdin.lock(), stdout.lock(), &prompt) {
                Ok(_) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
        Some(Commands::Replay { bundle }) => cmd_replay(&bundle),
    }
}

fn cmd_digest(
    variant: Variant,
    hex_input: Option<String>,
    text: Option<String>,
    length: Option<usize>,
) -> ExitCode {
    let message = match (hex_input, text) {
        (Some(h), _) => match hex::decode(h.trim()) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Error: invalid hex: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        (None, Some(t)) => t.into_bytes(),
        (None, None) => {
            let mut buf = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut buf) {
                eprintln!("Error: could not read stdin: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
            buf
        }
    };

    match variant.output(&message, length) {
        Ok(digest) => {
            println!("{}", hex::encode(digest));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn cmd_kat(path: &Path) -> ExitCode {
    let runner = match CorpusRunner::load(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    log::info!(
        "running {} vectors from {}",
        runner.vector_count(),
        runner.manifest().name
    );

    let results = runner.run_all();
    for (id, outcome) in results.problems() {
        let label = match outcome {
            VectorOutcome::Mismatch { .. } => "FAIL",
            _ => "ERROR",
        };
        println!("{} {}: {}", label, id, outcome);
    }
    println!("{}", results.summary());

    if results.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DISCREPANCY)
    }
}

fn cmd_fuzz(config: &FuzzConfig, repro_out: Option<PathBuf>) -> ExitCode {
    if let Err(e) = config.validate(true) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    let runner = match SubprocessRunner::start(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut fuzzer = DiffFuzzer::new(runner, config);
    let report = fuzzer.run();

    match &report.outcome {
        FuzzOutcome::Completed => {
            println!("{}", report.summary());
            ExitCode::SUCCESS
        }
        FuzzOutcome::Halted(HaltReason::Discrepancy(repro)) => {
            print!("{}", repro.to_report());
            if let Some(path) = repro_out {
                if let Err(e) = repro.save(&path) {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(EXIT_ERROR);
                }
                println!("Repro bundle written to {}", path.display());
            }
            ExitCode::from(EXIT_DISCREPANCY)
        }
        FuzzOutcome::Halted(HaltReason::Failure {
            iteration,
            request,
            error,
        }) => {
            eprintln!("Error at iteration {}: {}", iteration, error);
            if let Some(request) = request {
                eprintln!("Request: {}", request);
            }
            eprintln!("Seed: {}", report.seed);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn cmd_replay(path: &Path) -> ExitCode {
    let bundle = match ReproBundle::load(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match bundle.replay() {
        Ok(digest) => {
            print!("{}", bundle.to_report());
            println!("Replayed reference: {}", digest);
            if digest.eq_ignore_ascii_case(&bundle.expected) {
                ExitCode::SUCCESS
            } else {
                println!("Replayed digest differs from the bundle's expected digest");
                ExitCode::from(EXIT_DISCREPANCY)
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
