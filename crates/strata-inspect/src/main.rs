//! Strata Inspect - Entry point

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use strata_inspect::{render, Args, Command};

fn print_help() {
    println!(
        r"Strata Inspect - resolve layered configuration

USAGE:
    strata-inspect [OPTIONS]

Sources are applied in the order given; later sources override earlier ones.

OPTIONS:
        --json <PATH>         Apply a JSON document
        --toml <PATH>         Apply a TOML document
        --env <PREFIX>        Apply process environment variables under PREFIX
        --dotenv <PATH>       Apply a .env file under the first --env prefix (default: APP)
    -d, --delimiter <D>       Collection delimiter for environment sources (default: ,)
        --strict              Fail on keys the configuration does not define
        --log-json            Emit logs as JSON
    -h, --help                Print help information
    -v, --version             Print version information

ENVIRONMENT VARIABLES:
    RUST_LOG                  Log filter (default: info)
    DATABASE_URL              Database URL, read by every --env source

EXAMPLES:
    # File defaults, then environment overrides
    strata-inspect --toml service.toml --env APP

    # Reject variables under APP_ that nothing reads
    APP_LISTEN_PORT=9000 strata-inspect --env APP --strict
"
    );
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr; stdout carries the rendered configuration.
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(args: &Args) -> ExitCode {
    match render(args) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let command = match Command::parse_from(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Use --help for usage information");
            return ExitCode::from(2);
        }
    };

    match command {
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            println!("strata-inspect {}", strata_inspect::VERSION);
            ExitCode::SUCCESS
        }
        Command::Inspect(args) => {
            init_tracing(args.log_json);
            run(&args)
        }
    }
}
