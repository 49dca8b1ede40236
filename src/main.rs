mod debug_report;

use scopecraft::manifest::ScopeManifest;
use scopecraft::{CallLog, Options, Params, ScopeRegistry, StaticContext, apply_verbose_with};
use serde_json::Value;
use std::io::{self, IsTerminal, Read};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let registry: ScopeRegistry<StaticContext, CallLog> = match load_registry(&config.scopes_path) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let options = Options { fallback_defaults: config.fallback };
    match apply_verbose_with(&registry, &config.context, CallLog::new(), &options) {
        Ok((applied, details)) => debug_report::print_run(&config.context, &applied, &details, config.color),
        Err(err) => {
            tracing::error!(code = err.code(), "scope application failed");
            debug_report::print_error(&config.context, &err, config.color);
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    scopes_path: String,
    context: StaticContext,
    fallback: Option<Params>,
    color: bool,
}

fn parse_args() -> Result<CliConfig, String> {
    let mut scopes_path: Option<String> = None;
    let mut action: Option<String> = None;
    let mut params: Option<Params> = None;
    let mut fallback: Option<Params> = None;
    let mut context = StaticContext::default();
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag.to_string(), Some(value.to_string())),
            _ => (arg.clone(), None),
        };
        let mut value = |name: &str| {
            inline.clone().or_else(|| args.next()).ok_or_else(|| format!("error: {name} expects a value"))
        };

        match flag.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("scopecraft {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--scopes" | "-s" => scopes_path = Some(value("--scopes")?),
            "--action" | "-a" => action = Some(value("--action")?),
            "--params" | "-p" => params = Some(parse_object("--params", &value("--params")?)?),
            "--fallback" => fallback = Some(parse_object("--fallback", &value("--fallback")?)?),
            "--flag" => {
                let (name, raw) = split_pair("--flag", &value("--flag")?)?;
                let enabled = raw.parse::<bool>().map_err(|_| format!("error: --flag {name} expects true or false"))?;
                context.predicates.insert(name, enabled);
            }
            "--computed" => {
                let (name, raw) = split_pair("--computed", &value("--computed")?)?;
                let computed = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
                context.defaults.insert(name, computed);
            }
            _ => return Err(format!("error: unknown option '{arg}'\n\n{}", help_text())),
        }
    }

    let scopes_path = scopes_path.ok_or_else(|| format!("error: --scopes is required\n\n{}", help_text()))?;
    context.action = action.ok_or_else(|| format!("error: --action is required\n\n{}", help_text()))?;
    context.params = match params {
        Some(params) => params,
        None if !io::stdin().is_terminal() => read_stdin_params()?,
        None => Params::new(),
    };

    Ok(CliConfig { scopes_path, context, fallback, color })
}

fn load_registry(path: &str) -> Result<ScopeRegistry<StaticContext, CallLog>, String> {
    let text = std::fs::read_to_string(path).map_err(|err| format!("error: failed to read {path}: {err}"))?;
    ScopeManifest::from_json(&text)
        .and_then(ScopeManifest::into_registry)
        .map_err(|err| format!("error: {path}: {err}"))
}

fn read_stdin_params() -> Result<Params, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    if buffer.trim().is_empty() {
        return Ok(Params::new());
    }
    parse_object("stdin", &buffer)
}

fn parse_object(source: &str, text: &str) -> Result<Params, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(format!("error: {source} must be a JSON object")),
        Err(err) => Err(format!("error: {source} is not valid JSON: {err}")),
    }
}

fn split_pair(option: &str, pair: &str) -> Result<(String, String), String> {
    pair.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("error: {option} expects NAME=VALUE, got '{pair}'"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "scopecraft {version}

Dry-run a scope manifest against one request and report what would apply.

Usage:
  scopecraft --scopes <file> --action <name> [OPTIONS]

Options:
  -s, --scopes <file>        JSON scope manifest.
  -a, --action <name>        Action being served, e.g. index.
  -p, --params <json>        Request parameters as a JSON object. If omitted,
                             read from stdin when it is not a terminal.
  --fallback <json>          Fallback defaults, used only when nothing else
                             resolved.
  --flag <name=bool>         Value of a named predicate. Repeatable.
  --computed <name=json>     Value of a named default computation. Repeatable.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter for engine traces (default: warn).

Exit codes:
  0  Success.
  1  Scope application failed.
  2  Invalid arguments or manifest.
",
        version = env!("CARGO_PKG_VERSION"),
    )
}
