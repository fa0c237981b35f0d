//! KI User Event - Scenario Runner
//!
//! This is the main executable for ki-user-event. It handles CLI argument
//! parsing, configuration loading, and replays scenario files.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ki_user_event::{
    config::{CliArgs, SessionSettings},
    scenario::{Scenario, ScenarioReport},
    NAME, VERSION,
};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
}

/// Print the startup banner with version
fn print_banner() {
    println!(
        r#"
{cyan}{bold}  ki-user-event{reset}
{dim}  Browser-faithful input simulation{reset}
{dim}  Version: {version}{reset}
"#,
        cyan = colors::CYAN,
        bold = colors::BOLD,
        reset = colors::RESET,
        dim = colors::DIM,
        version = VERSION
    );
}

/// Print configuration summary
fn print_config_summary(settings: &SessionSettings) {
    println!(
        "{bold}{blue}Configuration:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    println!(
        "  {dim}Delay:{reset}            {}",
        match settings.delay_ms {
            Some(ms) => format!("{}ms (variance {:.2})", ms, settings.delay_variance),
            None => "none".to_string(),
        },
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Pointer events:{reset}   {}",
        settings.pointer_events_check,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Skip hover:{reset}       {}",
        yes_no(settings.skip_hover),
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Skip click:{reset}       {}",
        yes_no(settings.skip_click),
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Clipboard writes:{reset} {}",
        yes_no(settings.write_to_clipboard),
        dim = colors::DIM,
        reset = colors::RESET
    );
    if let Some(ref keys) = settings.key_map {
        println!(
            "  {dim}Key map:{reset}          {} custom keys",
            keys.len(),
            dim = colors::DIM,
            reset = colors::RESET
        );
    }
    println!();
}

fn yes_no(flag: bool) -> String {
    if flag {
        format!("{green}yes{reset}", green = colors::GREEN, reset = colors::RESET)
    } else {
        format!("{yellow}no{reset}", yellow = colors::YELLOW, reset = colors::RESET)
    }
}

/// Build the CLI command parser
fn build_cli() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author("KI-Browser Team")
        .about("Replays simulated user input against an in-process document")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Path to configuration file (TOML or JSON)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Enable verbose logging")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .help("Suppress output except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .subcommand(
            Command::new("run")
                .about("Run a scenario file and print the event log")
                .arg(
                    Arg::new("scenario")
                        .value_name("SCENARIO")
                        .required(true)
                        .help("Scenario file (TOML or JSON)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("delay")
                        .short('d')
                        .long("delay")
                        .value_name("MS")
                        .help("Pause between steps in milliseconds, or \"none\""),
                )
                .arg(
                    Arg::new("delay-variance")
                        .long("delay-variance")
                        .value_name("FACTOR")
                        .help("Random spread of the pause (0.0 - 1.0)")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("pointer-events-check")
                        .long("pointer-events-check")
                        .value_name("LEVEL")
                        .help("How often pointer-events is re-evaluated")
                        .value_parser(["never", "each-target", "each-api-call", "each-trigger"]),
                )
                .arg(
                    Arg::new("skip-hover")
                        .long("skip-hover")
                        .help("Do not move the pointer before clicks")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("skip-click")
                        .long("skip-click")
                        .help("Do not click before typing")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("no-clipboard")
                        .long("no-clipboard")
                        .help("Do not write copied data to the clipboard")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Parse CLI arguments into CliArgs struct
fn parse_cli_args(run: &ArgMatches) -> CliArgs {
    let mut args = CliArgs::default();

    args.config_file = run.get_one::<PathBuf>("config").cloned();
    args.delay = run.get_one::<String>("delay").cloned();
    args.delay_variance = run.get_one::<f64>("delay-variance").copied();
    args.pointer_events_check = run.get_one::<String>("pointer-events-check").cloned();

    if run.get_flag("skip-hover") {
        args.skip_hover = Some(true);
    }
    if run.get_flag("skip-click") {
        args.skip_click = Some(true);
    }
    if run.get_flag("no-clipboard") {
        args.write_to_clipboard = Some(false);
    }

    args
}

/// Initialize the tracing/logging subsystem
fn init_tracing(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Print the event log and final values
fn print_report(report: &ScenarioReport) {
    println!(
        "{bold}{blue}Events:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    for (index, event) in report.events.iter().enumerate() {
        let mut extra = Vec::new();
        if let Some(ref key) = event.key {
            extra.push(format!("key={key:?}"));
        }
        if let Some(ref data) = event.data {
            extra.push(format!("data={data:?}"));
        }
        if let Some(detail) = event.detail {
            extra.push(format!("detail={detail}"));
        }
        if event.default_prevented {
            extra.push("prevented".to_string());
        }
        println!(
            "  {dim}{:>4}{reset}  {cyan}{:<16}{reset} {:<20} {}",
            index + 1,
            event.event,
            event.target,
            extra.join(" "),
            dim = colors::DIM,
            cyan = colors::CYAN,
            reset = colors::RESET
        );
    }
    println!();

    println!(
        "{bold}{blue}Values:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    for control in &report.values {
        let checked = match control.checked {
            Some(true) => " (checked)",
            Some(false) => " (unchecked)",
            None => "",
        };
        println!("  {:<24} {:?}{}", control.element, control.value, checked);
    }
    println!();

    println!(
        "  {dim}Focused:{reset}     {}",
        report.focused.as_deref().unwrap_or("body"),
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Submissions:{reset} {}",
        report.submissions,
        dim = colors::DIM,
        reset = colors::RESET
    );
}

/// Main application entry point
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let matches = build_cli().get_matches();

    let Some(("run", run)) = matches.subcommand() else {
        anyhow::bail!("unknown command");
    };

    // Global flags are propagated to the subcommand
    let verbosity = run.get_count("verbose");
    let quiet = run.get_flag("quiet");

    // Initialize logging
    init_tracing(verbosity, quiet);

    // Convert matches to CliArgs
    let cli_args = parse_cli_args(run);

    // Load configuration with full precedence chain
    let settings = cli_args
        .load_settings()
        .context("Failed to load configuration")?;

    let json = run.get_flag("json");
    if !quiet && !json {
        print_banner();
        print_config_summary(&settings);
    }

    let path = run
        .get_one::<PathBuf>("scenario")
        .context("missing scenario path")?;
    let scenario = Scenario::from_file(path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;

    // Settings from the scenario file apply unless a config file or flag was given
    let explicit = cli_args.config_file.is_some()
        || cli_args.delay.is_some()
        || cli_args.delay_variance.is_some()
        || cli_args.pointer_events_check.is_some()
        || cli_args.skip_hover.is_some()
        || cli_args.skip_click.is_some()
        || cli_args.write_to_clipboard.is_some();
    let settings = if explicit || scenario.settings.is_none() {
        Some(settings)
    } else {
        None
    };

    info!(scenario = %path.display(), steps = scenario.steps.len(), "running");
    let report = scenario
        .run(settings)
        .await
        .with_context(|| format!("Scenario {} failed", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}
