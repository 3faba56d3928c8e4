//! Reference host for the prediction core.
//!
//! The core is transport-agnostic: it consumes an already-decoded request
//! and returns predictions or one classified error. This binary is the
//! thinnest possible host around that contract — it decodes one JSON
//! request from a file (or stdin), runs the pipeline with an explicit time
//! budget, prints a JSON envelope, and exits with a status code that
//! mirrors the error class so scripts can tell "fix your input" from
//! "too slow" from "wrong/bad".

use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use std::{fs, io};

use augur::data::PredictionRequest;
use augur::pipeline::{PipelineConfig, PredictionError, PredictionPipeline};

/// Exit code for caller-fixable (validation or decode) failures.
const EXIT_INVALID: i32 = 2;
/// Exit code for terminal computation failures.
const EXIT_COMPUTATION: i32 = 1;
/// Exit code when the time budget elapses, mirroring `timeout(1)`.
const EXIT_TIMEOUT: i32 = 124;

#[derive(Parser)]
#[command(
    name = "augur",
    about = "Fits a hint-guided ridge model on a small observation set and predicts the query points."
)]
struct Cli {
    /// Path to a JSON request file; pass "-" to read from standard input.
    request: PathBuf,

    /// Wall-clock budget for the whole request, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 90.0)]
    time_budget: f64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if !cli.time_budget.is_finite() || cli.time_budget < 0.0 {
        fail(
            EXIT_INVALID,
            format!("--time-budget must be a non-negative number of seconds, got {}", cli.time_budget),
        );
    }

    let raw = match read_request(&cli.request) {
        Ok(raw) => raw,
        Err(e) => fail(EXIT_INVALID, format!("could not read request: {e}")),
    };

    let request: PredictionRequest = match serde_json::from_str(&raw) {
        Ok(request) => request,
        Err(e) => fail(EXIT_INVALID, format!("could not decode request: {e}")),
    };

    let pipeline = PredictionPipeline::new(PipelineConfig {
        time_budget: Duration::from_secs_f64(cli.time_budget),
    });

    match pipeline.predict(&request) {
        Ok(predictions) => {
            println!(
                "{}",
                serde_json::json!({ "status": "success", "predictions": predictions })
            );
        }
        Err(err) => {
            let code = match err {
                PredictionError::Validation(_) => EXIT_INVALID,
                PredictionError::Computation { .. } => EXIT_COMPUTATION,
                PredictionError::Timeout { .. } => EXIT_TIMEOUT,
            };
            fail(code, err.to_string());
        }
    }
}

fn read_request(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        Ok(raw)
    } else {
        fs::read_to_string(path)
    }
}

/// Prints the error envelope and exits with the given code.
fn fail(code: i32, message: String) -> ! {
    println!(
        "{}",
        serde_json::json!({ "status": "error", "message": message })
    );
    process::exit(code);
}
