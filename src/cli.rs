use anyhow::Result;
use clap::Parser;
use std::io::Write;

use crate::config::types::{HarnessConfig, HarnessError, EXIT_FAILURE, MAX_PAYLOAD_SIZE};
use crate::core::acquisition::{acquire, ensure_non_empty, InputSource};
use crate::exec::engine::ExecutionEngine;
use crate::observability::bait::BaitLogger;
use crate::observability::decoy::DecoyDispenser;
use crate::verdict::inspector::Inspector;

const BANNER: [&str; 3] = [
    "===============================================",
    " tiny_vmmgr :: ISOL8R Virtual Machine Harness ",
    "===============================================",
];

/// Every argument is positional; `--help` or `-x` name files like any other.
#[derive(Parser, Debug)]
#[command(about, disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Shellcode file, or '-' for stdin (default: stdin)
    #[arg(value_name = "INPUT", allow_hyphen_values = true, trailing_var_arg = true)]
    inputs: Vec<String>,
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {} [shellcode_file|-]\n\
         \x20 - If no argument is provided, shellcode is read from stdin.\n\
         \x20 - Passing '-' explicitly also reads from stdin.\n\
         \x20 - Any other single argument is treated as a file path.",
        program
    )
}

fn program_name() -> String {
    std::env::args()
        .next()
        .and_then(|arg0| {
            std::path::Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "harness".to_string())
}

fn print_banner() {
    for line in BANNER {
        println!("{}", line);
    }
}

/// Stderr text for a terminal failure. Detections have already printed
/// their deterrent, so they get nothing extra.
pub fn diagnostic(err: &HarnessError, program: &str) -> Option<String> {
    match err {
        HarnessError::Oversized { limit } => Some(format!(
            "[tiny_vmmgr] Payload exceeds {} bytes. Please behave.",
            limit
        )),
        HarnessError::EmptyPayload => Some(
            "[tiny_vmmgr] Empty payload provided. Even no-ops deserve a byte.".to_string(),
        ),
        HarnessError::Input(e) => Some(format!("[tiny_vmmgr] {}", e)),
        HarnessError::DetectionBlock { .. } => None,
        HarnessError::Allocation(msg) | HarnessError::Permission(msg) => {
            Some(format!("[tiny_vmmgr] {}", msg))
        }
        HarnessError::Usage(_) => Some(usage(program)),
        HarnessError::Config(_) => Some(format!("[tiny_vmmgr] {}", err)),
    }
}

/// Acquire, inspect, and execute a single payload.
pub fn execute(source: &InputSource, config: &HarnessConfig) -> crate::config::types::Result<()> {
    let payload = acquire(source, MAX_PAYLOAD_SIZE)?;
    let payload = ensure_non_empty(payload)?;
    log::info!("Inspecting {} byte payload from {}", payload.len(), payload.origin());

    let logger = BaitLogger::from_config(config);
    let decoy = config
        .decoy_flag_path
        .as_ref()
        .map(|path| DecoyDispenser::new(path.clone()));
    let inspector = Inspector::new(&logger, decoy.as_ref());
    let payload = inspector.inspect(payload)?;

    // The payload may never hand control back.
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();

    ExecutionEngine::from_config(config).run(payload)
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let program = program_name();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            log::debug!("Argument parsing failed: {}", e);
            eprintln!("{}", usage(&program));
            std::process::exit(EXIT_FAILURE);
        }
    };

    print_banner();

    let outcome = HarnessConfig::from_env()
        .and_then(|config| InputSource::from_args(&cli.inputs).map(|source| (config, source)))
        .and_then(|(config, source)| execute(&source, &config));

    match outcome {
        Ok(()) => Ok(()),
        Err(err) => {
            if let Some(message) = diagnostic(&err, &program) {
                eprintln!("{}", message);
            }
            log::debug!("Terminating: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}
