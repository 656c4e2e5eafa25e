use anyhow::Result;
use clap::Parser;
use snippet_validator::config::HarnessConfig;
use snippet_validator::models::{
    ExceptionRecord, ExecutionOutcome, InstallOutcome, ValidationResult,
};
use snippet_validator::runtime::PythonRuntime;
use snippet_validator::{validate, ValidationRun};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Printed when the result itself cannot be serialized.
const FALLBACK_RESULT: &str = r#"{"status_code":"Failed","dependencies":{"status_code":"Success","install_errors":[]},"execution":{"status_code":"UnknownException","exception_name":"SerializationError","exception_message":"Failed to serialize validation result","exception_file_name":null,"exception_line_number":null,"exception_line":null,"exception_stack":[]}}"#;

#[derive(Parser)]
#[command(name = "validate")]
#[command(about = "Run a script or notebook after installing its dependencies and report a JSON verdict", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the script, notebook, or a directory holding one
    snippet: PathBuf,

    /// Delimited list of install commands for the snippet's dependencies
    dependencies: String,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Script execution budget in seconds
    #[arg(long, value_name = "SECS")]
    script_timeout: Option<u64>,

    /// Interpreter used to run artifacts
    #[arg(long, value_name = "PROGRAM")]
    interpreter: Option<String>,

    /// Kernel used to execute notebook cells
    #[arg(long, value_name = "NAME")]
    kernel: Option<String>,

    /// Indent the JSON result
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn load_config(&self) -> Result<HarnessConfig> {
        let mut config = match &self.config {
            Some(path) => HarnessConfig::load(path)?,
            None => HarnessConfig::default(),
        };

        if let Some(secs) = self.script_timeout {
            config.timeouts.script_secs = secs;
        }
        if let Some(interpreter) = &self.interpreter {
            config.runtime.interpreter = interpreter.clone();
        }
        if let Some(kernel) = &self.kernel {
            config.runtime.kernel_name = kernel.clone();
        }

        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> ValidationResult {
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            return ValidationResult::new(
                InstallOutcome::default(),
                ExecutionOutcome::UnknownException(ExceptionRecord::from_fault(&e)),
            );
        }
    };

    let dependencies = config.parse_dependencies(&cli.dependencies);
    let runtime = PythonRuntime::new(config.runtime.clone());
    let snippet = cli.snippet.display().to_string();
    let run = ValidationRun::new(&config, &runtime, &snippet);

    validate(&cli.snippet, &dependencies, &run)
}

fn render(result: &ValidationResult, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    };

    rendered.unwrap_or_else(|e| {
        error!("Failed to serialize validation result: {e}");
        FALLBACK_RESULT.to_string()
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = run(&cli);

    info!("Printing to stdout");
    println!("{}", render(&result, cli.pretty));
}
