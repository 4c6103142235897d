use anyhow::Context;
use anyhow::Result;
use chrono::Local;
use chrono::NaiveDate;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rusty_export::auth::hash_password;
use rusty_export::logging;
use rusty_export::query::DuckDbSource;
use rusty_export::query::InvoiceFilter;
use rusty_export::query::PaymentFilter;
use rusty_export::query::QueryParameters;
use rusty_export::session::PREVIEW_ROWS;
use rusty_export::stats::render_bars;
use rusty_export::Config;
use rusty_export::CredentialStore;
use rusty_export::ExportFormat;
use rusty_export::ResultMessage;
use rusty_export::RustyExportError;
use rusty_export::Session;
use rusty_export::Table;
use std::path::Path;
use std::path::PathBuf;
use tracing::error;
use tracing::info;

const BAR_WIDTH: usize = 40;

#[derive(Parser)]
#[command(
    name = "rusty-export",
    version,
    about = "Load, clean and export tabular data from files or the outstanding invoice listing"
)]
struct Cli {
    /// Username to sign in with
    #[arg(long, global = true, env = "RUSTY_EXPORT_USER")]
    user: Option<String>,

    /// Password to sign in with
    #[arg(long, global = true, env = "RUSTY_EXPORT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Query log file, overrides QUERY_LOG_FILE
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a .csv or .xlsx file, clean it and export it again
    Convert(ConvertArgs),
    /// Run the outstanding invoice listing and export the result
    Query(QueryArgs),
    /// Print an Argon2 hash to use as a USERn_PASSWORD value
    HashPassword {
        plaintext: String,
    },
}

#[derive(Args)]
struct ConvertArgs {
    file: PathBuf,

    /// Remove duplicate rows
    #[arg(long)]
    dedup: bool,

    /// Fill missing numeric values with the column mean
    #[arg(long)]
    fill: bool,

    /// Keep only these columns, in this order
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct QueryArgs {
    /// Database label, e.g. "Pharma Solution"
    #[arg(long)]
    database: String,

    /// First invoice date (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Last invoice date (YYYY-MM-DD)
    #[arg(long)]
    end: NaiveDate,

    /// Invoice type: All, Remaining, Over Credit, No Credit, Removed Remaining,
    /// Remove Over Credit, Remove No Credit
    #[arg(long, default_value = "All")]
    invoice: String,

    /// Payment terms: All, Cash, Cheque
    #[arg(long, default_value = "All")]
    payment: String,

    /// Restrict to one account, empty for all
    #[arg(long, default_value = "")]
    account: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct OutputArgs {
    /// Export format: csv or excel
    #[arg(long = "to", default_value = "csv")]
    format: ExportFormat,

    /// Directory the export is written to
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Print the first rows and charts of the numeric columns
    #[arg(long)]
    preview: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(log_file) = cli.log_file {
        config.query_log_file = log_file;
    }

    match cli.command {
        Command::HashPassword { plaintext } => {
            println!("{}", hash_password(&plaintext)?);
        }
        Command::Convert(args) => {
            let mut session = sign_in(&config, cli.user.as_deref(), cli.password.as_deref())?;
            convert(&mut session, &args).context("Convert failed")?;
        }
        Command::Query(args) => {
            let mut session = sign_in(&config, cli.user.as_deref(), cli.password.as_deref())?;
            query(&mut session, &config, &args).context("Query failed")?;
        }
    }
    Ok(())
}

fn sign_in(config: &Config, user: Option<&str>, password: Option<&str>) -> Result<Session, RustyExportError> {
    logging::init(&config.query_log_file)?;
    let store = CredentialStore::from_config(config)
        .map_err(RustyExportError::from)
        .with_prefix("Cannot start")?;
    let identity = store
        .authenticate(user.unwrap_or_default(), password.unwrap_or_default())
        .map_err(RustyExportError::from);
    if let Err(e) = &identity {
        error!("Login failed for {:?}: {}", user, e);
    }
    let identity = identity?;
    info!("Welcome {}", identity.name);
    Ok(Session::new(identity))
}

fn convert(session: &mut Session, args: &ConvertArgs) -> Result<(), RustyExportError> {
    session.load_file(&args.file)?;
    if let Some(source) = session.source() {
        println!("Loaded {}", source);
    }
    if args.fill {
        let filled = session.fill_missing_numeric()?;
        println!("Filled missing values in: {}", filled.join(", "));
    }
    if args.dedup {
        let removed = session.remove_duplicates()?;
        println!("Removed {} duplicate rows", removed);
    }
    if !args.columns.is_empty() {
        session.keep_columns(&args.columns)?;
    }
    finish(session, &args.output)
}

fn query(session: &mut Session, config: &Config, args: &QueryArgs) -> Result<(), RustyExportError> {
    let target = config.database(&args.database)?;
    let invoice = InvoiceFilter::from_label(&args.invoice)?;
    let payment = PaymentFilter::from_label(&args.payment)?;
    let params = QueryParameters {
        server: config.sql_server.to_owned(),
        database: target.value.to_owned(),
        username: config.sql_user.to_owned(),
        password: config.sql_password.to_owned(),
        start_date: args.start,
        end_date: args.end,
        product_code_first: config.first_product_code.to_owned(),
        product_code_last: config.last_product_code.to_owned(),
        account_filter: args.account.to_owned(),
    };
    let source = DuckDbSource::for_target(&config.sql_server, &target.value);
    let table = session.run_query(&source, &target.label, &params, invoice, payment, &config.literals)?;
    println!("Fetched {} rows from {}", table.row_count(), target.label);
    finish(session, &args.output)
}

fn finish(session: &Session, output: &OutputArgs) -> Result<(), RustyExportError> {
    if output.preview {
        let preview = session.preview(PREVIEW_ROWS)?;
        print_table(&preview.head);
        for series in &preview.series {
            println!();
            print!("{}", render_bars(series, BAR_WIDTH));
        }
    }
    let export = session.export(output.format, Local::now().date_naive())?;
    let path = save(&export.bytes, &output.out, &export.filename)?;
    println!("Saved {} ({}, {} bytes)", path.display(), export.mime_type, export.bytes.len());
    Ok(())
}

fn save(bytes: &[u8], directory: &Path, filename: &str) -> Result<PathBuf, RustyExportError> {
    let path = directory.join(filename);
    std::fs::create_dir_all(directory)
        .and_then(|_| std::fs::write(&path, bytes))
        .map_err(RustyExportError::from)
        .with_prefix(&format!("Cannot write {}", path.display()))?;
    Ok(path)
}

fn print_table(table: &Table) {
    println!("{}", table.column_names().join(" | "));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
        println!("{}", cells.join(" | "));
    }
}
