use clap::Parser;
use finboard::args::{Args, Command};
use finboard::commands::{self, Method, Request, Response};
use finboard::dashboard::SummaryOptions;
use finboard::{Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// The work a command needs a connected gateway for.
enum Job {
    Records(Request),
    Summary(SummaryOptions),
}

/// Runs the command. Returns `false` when a record command answered with an error envelope.
pub async fn main_inner(args: Args) -> Result<bool> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // When FINBOARD_IN_TEST_MODE is set and non-empty the seeded in-memory store is used instead of
    // the configured backend.
    let mode = Mode::from_env();

    let job = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.options()).await?.print();
            return Ok(true);
        }
        Command::Tables => {
            let response = commands::tables();
            response.print();
            return Ok(response.is_success());
        }
        Command::Summary(summary_args) => Job::Summary(SummaryOptions {
            recent: summary_args.recent(),
            order: summary_args.order(),
            currency: summary_args.currency(),
        }),
        Command::Fetch(fetch) => Job::Records(Request::new(Method::Get, fetch.table())),
        Command::Create(create) => Job::Records(
            Request::new(Method::Post, create.table()).with_body(create.json().clone()),
        ),
        Command::Update(update) => Job::Records(
            Request::new(Method::Put, update.table())
                .with_id(update.id())
                .with_body(update.json().clone()),
        ),
        Command::Delete(delete) => {
            Job::Records(Request::new(Method::Delete, delete.table()).with_id(delete.id()))
        }
        Command::Request(request_args) => Job::Records(Request {
            method: request_args.method().to_uppercase(),
            table: request_args.table().to_string(),
            id: request_args.id().map(String::from),
            body: request_args.json().cloned(),
        }),
    };

    let mut config = Config::load(home).await?;
    if let Some(sheet_id) = args.common().sheet_id() {
        config.override_spreadsheet_id(sheet_id);
    }
    if let Some(base_id) = args.common().airtable_base_id() {
        config.override_airtable_base_id(base_id);
    }

    let response = match commands::connect(&config, mode).await {
        Err(e) => Response::from(e),
        Ok(mut gateway) => match job {
            Job::Records(request) => commands::handle(gateway.as_mut(), request).await,
            Job::Summary(options) => commands::summary(gateway.as_mut(), options).await,
        },
    };
    response.print();
    if let Some(allow) = response.allow() {
        debug!("Allow: {allow}");
    }
    Ok(response.is_success())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
