//! formfilter command-line transcoder
//!
//! Reads one document from stdin and writes the converted document to stdout.
//! Diagnostics go to stderr; set `RUST_LOG=formfilter=debug` to see them.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use formfilter::{FilterDialect, QueryTemplate, TranscodeError, Transcoder, TranscoderConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Direction {
    #[default]
    ToXml,
    ToJson,
}

/// CLI configuration
#[derive(Debug, Default)]
struct Config {
    /// Conversion direction
    direction: Direction,
    /// Operate on whole search-form documents instead of bare filters
    form: bool,
    transcoder: TranscoderConfig,
}

fn print_help() {
    println!("formfilter - JSON filter template <-> OGC Filter XML");
    println!();
    println!("USAGE:");
    println!("    formfilter [OPTIONS] < INPUT > OUTPUT");
    println!();
    println!("OPTIONS:");
    println!("    --to-xml                  Convert a JSON filter template to XML [default]");
    println!("    --to-json                 Convert an XML filter fragment to JSON");
    println!("    --dialect <ogc|fes2>      XML vocabulary for output [default: ogc]");
    println!("    --max-bytes <N>           Reject inputs larger than N bytes [default: 1048576]");
    println!("    --form                    Convert search-form documents and stored records");
    println!("    -h, --help                Print help information");
}

fn parse_args() -> Config {
    let args: Vec<String> = std::env::args().collect();
    let mut config = Config::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--to-xml" => {
                config.direction = Direction::ToXml;
                i += 1;
            }
            "--to-json" => {
                config.direction = Direction::ToJson;
                i += 1;
            }
            "--form" => {
                config.form = true;
                i += 1;
            }
            "--dialect" => {
                if i + 1 < args.len() {
                    let dialect = FilterDialect::from_name(&args[i + 1]).unwrap_or_else(|| {
                        eprintln!("error: unknown dialect: {}", args[i + 1]);
                        std::process::exit(1);
                    });
                    config.transcoder = config.transcoder.with_dialect(dialect);
                    i += 2;
                } else {
                    eprintln!("error: --dialect requires a value");
                    std::process::exit(1);
                }
            }
            "--max-bytes" => {
                if i + 1 < args.len() {
                    let max: usize = args[i + 1].parse().unwrap_or_else(|_| {
                        eprintln!("error: invalid byte limit: {}", args[i + 1]);
                        std::process::exit(1);
                    });
                    config.transcoder = config.transcoder.with_max_document_bytes(max);
                    i += 2;
                } else {
                    eprintln!("error: --max-bytes requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg => {
                eprintln!("error: unknown argument: {}", arg);
                std::process::exit(1);
            }
        }
    }

    config
}

fn run(config: &Config, input: &str) -> Result<String, TranscodeError> {
    let transcoder = Transcoder::new(config.transcoder);
    match (config.direction, config.form) {
        (Direction::ToXml, false) => transcoder.json_to_xml(input),
        (Direction::ToJson, false) => transcoder.xml_to_json(input),
        (Direction::ToXml, true) => {
            let record = transcoder.form_to_template(input)?;
            Ok(serde_json::to_string_pretty(&record)?)
        }
        (Direction::ToJson, true) => {
            let record: QueryTemplate = serde_json::from_str(input)?;
            transcoder.template_to_form(&record)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = parse_args();
    debug!(?config, "starting");

    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("error: failed to read stdin: {e}");
        return ExitCode::FAILURE;
    }

    match run(&config, input.trim()) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{output}") {
                eprintln!("error: failed to write stdout: {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(code = e.kind(), "conversion failed");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
