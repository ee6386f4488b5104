use blacklist_cli::args::Args;
use blacklist_cli::config::Config;
use blacklist_cli::error::{CliError, EXIT_TIMED_OUT};
use blacklist_cli::{output, run};
use clap::error::ErrorKind;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return argument_error(e),
    };

    init_tracing(args.verbose);

    let json = args.json;
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => return fail(&e, json),
    };
    tracing::debug!(?config, "configuration loaded");

    match run::run(&config).await {
        Ok(result) => {
            if json {
                output::json(&result);
            } else {
                output::summary(&result);
            }

            if result.timed_out {
                ExitCode::from(EXIT_TIMED_OUT)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => fail(&e, json),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("blacklist_cli=debug,blacklist_engine=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn argument_error(err: clap::Error) -> ExitCode {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("{}", err.render());
            fail(&CliError::Usage("Insufficient parameters".to_string()), false)
        }
    }
}

fn fail(err: &CliError, json: bool) -> ExitCode {
    tracing::error!(error = %err, code = err.exit_code(), "run failed");
    output::report(err, json);
    ExitCode::from(err.exit_code())
}
