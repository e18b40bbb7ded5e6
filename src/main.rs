mod debug_report;

use chrono::{NaiveDate, NaiveDateTime};
use humandate::{Context, DateTimeParser, Grammar, Options, Overflow, parse_verbose_with};
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_REFERENCE: &str = "2013-02-12T04:30:00";
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn main() -> ExitCode {
    init_tracing();

    let config = match parse_args() {
        Ok(Command::Run(config)) => config,
        Ok(Command::Exit) => return ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(config: &CliConfig) -> humandate::Result<()> {
    let ctx = Context { reference_time: config.reference_time };
    let opts = Options { overflow: if config.strict { Overflow::Reject } else { Overflow::Clamp } };

    let res = match &config.grammar {
        Some(path) => DateTimeParser::new(Grammar::from_path(path)?)?.parse_verbose_with(&config.input, &ctx, &opts)?,
        None => parse_verbose_with(&config.input, &ctx, &opts)?,
    };

    if config.explain {
        debug_report::print_run(&config.input, &res, config.color);
    } else {
        println!("{}", res.value.format(OUTPUT_FORMAT));
    }
    Ok(())
}

enum Command {
    Run(CliConfig),
    Exit,
}

struct CliConfig {
    input: String,
    reference_time: NaiveDateTime,
    grammar: Option<PathBuf>,
    strict: bool,
    explain: bool,
    color: bool,
}

fn parse_args() -> Result<Command, String> {
    let mut input: Option<String> = None;
    let mut reference_time = parse_reference(DEFAULT_REFERENCE)?;
    let mut grammar: Option<PathBuf> = None;
    let mut strict = false;
    let mut explain = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(Command::Exit);
            }
            "-V" | "--version" => {
                println!("humandate {}", env!("CARGO_PKG_VERSION"));
                return Ok(Command::Exit);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--strict" => strict = true,
            "--explain" => explain = true,
            "--reference" => {
                let value = args.next().ok_or_else(|| "error: --reference expects a value".to_string())?;
                reference_time = parse_reference(&value)?;
            }
            "--grammar" | "-g" => {
                let value = args.next().ok_or_else(|| "error: --grammar expects a value".to_string())?;
                grammar = Some(PathBuf::from(value));
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                set_input(&mut input, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut input, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--reference=") => {
                reference_time = parse_reference(arg.trim_start_matches("--reference="))?;
            }
            _ if arg.starts_with("--grammar=") => {
                grammar = Some(PathBuf::from(arg.trim_start_matches("--grammar=")));
            }
            _ if arg.starts_with("--input=") => {
                set_input(&mut input, arg.trim_start_matches("--input=").to_string())?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut input, rest)?;
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no input provided\n\n{}", help_text()));
    }

    Ok(Command::Run(CliConfig { input, reference_time, grammar, strict, explain, color }))
}

fn set_input(input: &mut Option<String>, value: String) -> Result<(), String> {
    if input.is_some() {
        return Err("error: input provided multiple times".to_string());
    }
    *input = Some(value);
    Ok(())
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}

/// Accepts `YYYY-MM-DD`, optionally followed by `THH:MM` or `THH:MM:SS`
/// (a space works in place of the `T`).
fn parse_reference(value: &str) -> Result<NaiveDateTime, String> {
    let invalid = || format!("error: invalid --reference '{value}' (expected YYYY-MM-DD[THH:MM[:SS]])");
    let caps = humandate::regex!(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2}))?)?$")
        .captures(value.trim())
        .ok_or_else(invalid)?;

    let field = |i: usize| -> Result<u32, String> {
        caps.get(i).map_or(Ok(0), |m| m.as_str().parse::<u32>().map_err(|_| invalid()))
    };
    let year = i32::try_from(field(1)?).map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)
        .and_then(|date| date.and_hms_opt(field(4).ok()?, field(5).ok()?, field(6).ok()?))
        .ok_or_else(invalid)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "humandate {version}

Resolve human date/time expressions against a reference instant.

Usage:
  humandate [OPTIONS] [--] <input...>
  humandate [OPTIONS] --input <text>

Options:
  -i, --input <text>         Input text to parse. If omitted, reads remaining args
                             or stdin when no args are provided.
  --reference <timestamp>    Reference time in YYYY-MM-DD[THH:MM[:SS]].
                             Default: {default_reference}
  -g, --grammar <file>       Load a JSON grammar instead of the bundled English one.
  --strict                   Reject impossible dates (february 30) instead of
                             clamping them.
  --explain                  Print matched rules, delta fields and timings.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  RUST_LOG                   Log filter, e.g. RUST_LOG=humandate=trace. Default: warn.

Exit codes:
  0  Success.
  1  Grammar or calendar error.
  2  Invalid arguments or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        default_reference = DEFAULT_REFERENCE
    )
}
