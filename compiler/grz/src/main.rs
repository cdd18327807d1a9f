//! Grz CLI
//!
//! Evaluates a grizzly Jsonnet file and prints the resulting document.

use grz_jsonnet::{AssemblyError, Assembler, JsonnetParser, ParserOptions, Source};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing output.
///
/// Safe to call multiple times. Enable with e.g. `RUST_LOG=grz_jsonnet=debug`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// Options for `grz eval`.
#[derive(Debug, Default, PartialEq)]
struct EvalArgs {
    file: PathBuf,
    jsonnet_paths: Vec<PathBuf>,
    options: ParserOptions,
}

fn parse_eval_args(args: &[String]) -> Result<EvalArgs, String> {
    let mut parsed = EvalArgs::default();
    let mut file = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "-J" | "--jpath" => parsed.jsonnet_paths.push(PathBuf::from(value(arg)?)),
            "--kind" => parsed.options.default_resource_kind = value(arg)?,
            "--folder" => parsed.options.default_folder_uid = value(arg)?,
            flag if flag.starts_with('-') => return Err(format!("unknown option: {flag}")),
            path if file.is_none() => file = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument: {extra}")),
        }
    }
    parsed.file = file.ok_or("missing file path")?;
    Ok(parsed)
}

/// Hands the evaluated document back unchanged.
struct Passthrough;

impl Assembler for Passthrough {
    type Resources = JsonValue;

    fn assemble(
        &self,
        data: JsonValue,
        default_resource_kind: &str,
        default_folder_uid: &str,
        source: Source,
    ) -> Result<JsonValue, AssemblyError> {
        tracing::debug!(
            kind = default_resource_kind,
            folder = default_folder_uid,
            path = %source.path.display(),
            "assembling document"
        );
        Ok(data)
    }
}

fn run_eval(args: &EvalArgs) -> Result<(), String> {
    let parser = JsonnetParser::new(Passthrough, args.jsonnet_paths.clone());
    if !parser.accept(&args.file) {
        return Err(format!(
            "{}: not a .jsonnet or .libsonnet file",
            args.file.display()
        ));
    }
    let document = parser
        .parse(&args.file, &args.options)
        .map_err(|err| err.to_string())?;
    let text = serde_json::to_string_pretty(&document).map_err(|err| err.to_string())?;
    println!("{text}");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: grz eval <file.jsonnet> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -J, --jpath <dir>   Add a library search directory (repeatable)");
    eprintln!("  --kind <kind>       Default resource kind");
    eprintln!("  --folder <uid>      Default folder uid");
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("eval") => {
            let result = parse_eval_args(&args[2..]).and_then(|eval| run_eval(&eval));
            match result {
                Ok(()) => ExitCode::SUCCESS,
                Err(message) => {
                    eprintln!("error: {message}");
                    ExitCode::FAILURE
                }
            }
        }
        Some("help" | "--help" | "-h") => {
            print_usage();
            ExitCode::SUCCESS
        }
        Some(other) => {
            eprintln!("unknown command: {other}");
            print_usage();
            ExitCode::FAILURE
        }
        None => {
            print_usage();
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_eval_args() {
        let parsed = parse_eval_args(&args(&[
            "-J", "lib", "main.jsonnet", "--jpath", "vendor", "--kind", "Dashboard", "--folder",
            "general",
        ]))
        .unwrap();
        assert_eq!(
            parsed,
            EvalArgs {
                file: PathBuf::from("main.jsonnet"),
                jsonnet_paths: vec![PathBuf::from("lib"), PathBuf::from("vendor")],
                options: ParserOptions {
                    default_resource_kind: "Dashboard".to_string(),
                    default_folder_uid: "general".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_eval_args_errors() {
        assert_eq!(parse_eval_args(&args(&[])).unwrap_err(), "missing file path");
        assert_eq!(
            parse_eval_args(&args(&["main.jsonnet", "-J"])).unwrap_err(),
            "-J requires a value"
        );
        assert_eq!(
            parse_eval_args(&args(&["--verbose", "main.jsonnet"])).unwrap_err(),
            "unknown option: --verbose"
        );
        assert_eq!(
            parse_eval_args(&args(&["a.jsonnet", "b.jsonnet"])).unwrap_err(),
            "unexpected argument: b.jsonnet"
        );
    }
}
