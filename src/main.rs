use bagzulla::cli::commands;
use bagzulla::cli::{Cli, Commands};
use bagzulla::config;
use bagzulla::logging::init_logging;
use bagzulla::output::OutputContext;
use bagzulla::{BagzError, StructuredError};
use clap::Parser;
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);
    let ctx = OutputContext::from_args(&cli);

    let result = match &cli.command {
        Commands::Annotate(args) => commands::annotate::execute(args, &overrides, &ctx),
        Commands::Config(args) => commands::config::execute(args, &overrides, &ctx),
        Commands::Version => commands::version::execute(&ctx),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &BagzError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        url: cli.url.clone(),
    }
}
