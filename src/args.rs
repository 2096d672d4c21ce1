//! These structs provide the CLI interface for the finboard CLI.

use crate::dashboard::{Currency, RecencyOrder, RECENT_COUNT};
use crate::{Backend, Credentials, InitOptions};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// finboard: the backend of a personal finance dashboard.
///
/// Your accounts, transactions, budgets, goals, debts and investments live in a Google Sheet (one
/// tab per table) or an Airtable base. finboard reads them, checks that each table still has the
/// expected header row, and writes new or changed records back after normalizing amounts, dates
/// and categories.
///
/// Record commands print a JSON envelope to stdout: `{"status": "success", "data": ...}` or
/// `{"status": "error", "message": ...}`. Logs go to stderr.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and its configuration files.
    ///
    /// This is the first command you should run. Choose a backend and tell finboard where it is:
    ///
    /// - sheets: pass --sheet-url and an OAuth access token with the spreadsheets scope, either as
    ///   --sheets-token or inside a --credentials file.
    ///
    /// - airtable: pass --base-id and a personal access token, either as --airtable-api-key or
    ///   inside a --credentials file.
    Init(InitArgs),
    /// List the tables finboard knows about, with their header labels.
    Tables,
    /// Print every record of a table.
    Fetch(FetchArgs),
    /// Create a record from a JSON object of fields.
    Create(CreateArgs),
    /// Update some fields of a record.
    Update(UpdateArgs),
    /// Delete a record.
    Delete(DeleteArgs),
    /// Send a request as a web handler would receive it: a method, a table, and optionally an ID
    /// and a JSON body. Unsupported methods are answered with 405.
    Request(RequestArgs),
    /// Print the dashboard: totals, recent transactions, and goal, budget and debt progress.
    Summary(SummaryArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where finboard configuration is held. Defaults to ~/finboard
    #[arg(long, env = "FINBOARD_HOME", default_value_t = default_finboard_home())]
    home: DisplayPath,

    /// Use this spreadsheet ID instead of the one from the configured sheet URL.
    #[arg(long, env = "FINBOARD_SHEET_ID")]
    sheet_id: Option<String>,

    /// Use this Airtable base ID instead of the configured one.
    #[arg(long, env = "FINBOARD_AIRTABLE_BASE_ID")]
    airtable_base_id: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
            sheet_id: None,
            airtable_base_id: None,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    pub fn sheet_id(&self) -> Option<&str> {
        self.sheet_id.as_deref()
    }

    pub fn airtable_base_id(&self) -> Option<&str> {
        self.airtable_base_id.as_deref()
    }
}

/// (Not shown): Args for the `finboard init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Where the tables are kept.
    #[arg(long, value_enum, default_value_t = Backend::Sheets)]
    backend: Backend,

    /// The URL of your Google Sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: Option<String>,

    /// The ID of your Airtable base, e.g. appWjZbCM25bli7RZ
    #[arg(long)]
    base_id: Option<String>,

    /// A JSON file with `sheets_access_token` and/or `airtable_api_key`. It will be moved into the
    /// secrets directory.
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// A Google service account key file (JSON) with access to the sheet. Its contents are copied
    /// into the secrets directory.
    #[arg(long)]
    service_account_key: Option<PathBuf>,

    /// An OAuth access token for the Google Sheets API.
    #[arg(long, env = "FINBOARD_SHEETS_TOKEN", hide_env_values = true)]
    sheets_token: Option<String>,

    /// An Airtable personal access token.
    #[arg(long, env = "FINBOARD_AIRTABLE_API_KEY", hide_env_values = true)]
    airtable_api_key: Option<String>,
}

impl InitArgs {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Collects these arguments into the options `Config::create` takes.
    pub fn options(&self) -> InitOptions {
        InitOptions {
            backend: self.backend,
            sheet_url: self.sheet_url.clone(),
            airtable_base_id: self.base_id.clone(),
            credentials_file: self.credentials.clone(),
            service_account_key_file: self.service_account_key.clone(),
            credentials: Credentials {
                sheets_access_token: self.sheets_token.clone(),
                google_service_account: None,
                airtable_api_key: self.airtable_api_key.clone(),
            },
        }
    }
}

/// (Not shown): Args for the `finboard fetch` command.
#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// The table to read, e.g. Transactions
    table: String,
}

impl FetchArgs {
    pub fn table(&self) -> &str {
        &self.table
    }
}

/// (Not shown): Args for the `finboard create` command.
#[derive(Debug, Parser, Clone)]
pub struct CreateArgs {
    /// The table to add the record to, e.g. Transactions
    table: String,

    /// The fields as JSON, either `{"fields": {...}}` or a flat object, e.g.
    /// '{"Description": "Pan", "Amount": 1200, "Type": "gasto"}'
    #[arg(long)]
    json: JsonArg,
}

impl CreateArgs {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn json(&self) -> &serde_json::Value {
        &self.json
    }
}

/// (Not shown): Args for the `finboard update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The table holding the record, e.g. Transactions
    table: String,

    /// The ID of the record to update.
    #[arg(long, default_value = "")]
    id: String,

    /// The fields to change as JSON, either `{"fields": {...}}` or a flat object.
    #[arg(long)]
    json: JsonArg,
}

impl UpdateArgs {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn json(&self) -> &serde_json::Value {
        &self.json
    }
}

/// (Not shown): Args for the `finboard delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The table holding the record, e.g. Transactions
    table: String,

    /// The ID of the record to delete.
    #[arg(long, default_value = "")]
    id: String,
}

impl DeleteArgs {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `finboard request` command.
#[derive(Debug, Parser, Clone)]
pub struct RequestArgs {
    /// The request method: GET, POST, PUT or DELETE.
    #[arg(long, short = 'X', default_value = "GET")]
    method: String,

    /// The table, e.g. Transactions
    table: String,

    /// The record ID, for PUT and DELETE.
    #[arg(long)]
    id: Option<String>,

    /// The request body as JSON, for POST and PUT.
    #[arg(long)]
    json: Option<JsonArg>,
}

impl RequestArgs {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_deref()
    }
}

/// (Not shown): Args for the `finboard summary` command.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    /// How many recent transactions to show.
    #[arg(long, default_value_t = RECENT_COUNT)]
    recent: usize,

    /// How to decide which transactions are the most recent.
    #[arg(long, value_enum, default_value_t = RecencyOrder::Identifier)]
    order: RecencyOrder,

    /// How to format amounts.
    #[arg(long, value_enum, default_value_t = Currency::Clp)]
    currency: Currency,
}

impl SummaryArgs {
    pub fn recent(&self) -> usize {
        self.recent
    }

    pub fn order(&self) -> RecencyOrder {
        self.order
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }
}

/// A command line argument holding JSON.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JsonArg(serde_json::Value);

impl FromStr for JsonArg {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map(JsonArg)
    }
}

impl Deref for JsonArg {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn default_finboard_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("finboard"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or FINBOARD_HOME instead of relying on the default \
                finboard home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("finboard")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
