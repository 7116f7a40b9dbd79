//! EDMX → OpenAPI CLI
//!
//! Converts a Business Central EDMX file into an enhanced OpenAPI 3.1 document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use edmx_openapi::{
    convert, BaseConverter, ConvertError, EnhanceOptions, OdataOpenApi, PregeneratedDocument,
    DEFAULT_NAMESPACE,
};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "edmx-openapi")]
#[command(about = "Convert EDMX metadata to an enhanced OpenAPI 3.1 document")]
#[command(version)]
#[command(after_help = "\
Examples:
  edmx-openapi api.xml api.json
  edmx-openapi api.xml api.json --title \"My API\" --description \"Custom API description\"
  edmx-openapi api.xml api.json --api-name MyApp --api-version v1.0
  edmx-openapi api.xml api.json --tenant-placeholder \"{{tenant_id}}\"

The base document is produced by `npx odata-openapi3` (npm install -g odata-openapi)
unless --base points at one generated earlier.")]
struct Cli {
    /// Input EDMX file
    input: PathBuf,

    /// Output OpenAPI JSON file
    output: PathBuf,

    /// API title (default: "<api name> API")
    #[arg(long)]
    title: Option<String>,

    /// API description (default: built-in Getting Started guide)
    #[arg(long)]
    description: Option<String>,

    /// API name for URLs and documentation (e.g. "produceLinc")
    #[arg(long)]
    api_name: Option<String>,

    /// API version for URLs (e.g. "v1.0", "v2.0")
    #[arg(long)]
    api_version: Option<String>,

    /// Tenant ID placeholder for the OAuth2 token URL (e.g. "{tenant_id}")
    #[arg(long)]
    tenant_placeholder: Option<String>,

    /// Schema namespace prefix of the metadata
    #[arg(long, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Use a previously generated base OpenAPI file instead of running the converter
    #[arg(long)]
    base: Option<PathBuf>,

    /// Program used to launch odata-openapi3
    #[arg(long, default_value = "npx", conflicts_with = "base")]
    converter: String,

    /// Print a JSON summary of the changes to stdout (for automation)
    #[arg(long)]
    report: bool,

    /// Verbose logging
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "edmx_openapi=debug"
    } else {
        "edmx_openapi=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), u8> {
    if !cli.input.exists() {
        eprintln!("Error: input file '{}' not found", cli.input.display());
        return Err(3);
    }

    let converter: Box<dyn BaseConverter> = match &cli.base {
        Some(base) => Box::new(PregeneratedDocument::new(base)),
        None => {
            let converter = OdataOpenApi::new(&cli.converter);
            converter.ensure_available().map_err(|e| {
                eprintln!(
                    "Error: odata-openapi3 tool not available ({}). Please install with: npm install -g odata-openapi",
                    e
                );
                print_converter_stderr(&e);
                e.exit_code() as u8
            })?;
            Box::new(converter)
        }
    };

    let options = EnhanceOptions::new()
        .title(cli.title)
        .description(cli.description)
        .api_name(cli.api_name)
        .api_version(cli.api_version)
        .tenant_placeholder(cli.tenant_placeholder)
        .namespace(cli.namespace);

    let report = convert(&cli.input, &cli.output, converter.as_ref(), &options).map_err(|e| {
        error!("conversion failed: {}", e);
        eprintln!("Error during conversion: {}", e);
        print_converter_stderr(&e);
        e.exit_code() as u8
    })?;

    debug!(
        "removed {} paths, {} operations, {} schemas",
        report.paths_removed,
        report.operations_removed.len(),
        report.schemas_removed.len()
    );

    if cli.report {
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            eprintln!("Error: cannot serialize report: {}", e);
            2u8
        })?;
        println!("{}", json);
    }
    Ok(())
}

fn print_converter_stderr(e: &ConvertError) {
    if let Some(stderr) = e.converter_stderr() {
        eprintln!("stderr: {}", stderr.trim_end());
    }
}
