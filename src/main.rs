use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use paydollar::application::facade::{CheckoutFacade, CheckoutRequest};
use paydollar::application::gateway::GatewayClient;
use paydollar::config::GatewayConfig;
use paydollar::domain::ports::RecordStoreBox;
use paydollar::infrastructure::http::ReqwestTransport;
use paydollar::infrastructure::in_memory::InMemoryRecordStore;
#[cfg(feature = "storage-rocksdb")]
use paydollar::infrastructure::rocksdb::RocksDBRecordStore;
use paydollar::interfaces::nvp::ParamValue;
use paydollar::logging::{LogFormat, init_logging};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Gateway API endpoint, overriding PAYDOLLAR_ENDPOINT.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Payment action (Sale, Authorization or Order), overriding PAYDOLLAR_PAYMENT_ACTION.
    #[arg(long, global = true)]
    action: Option<String>,

    /// Currency code, overriding PAYDOLLAR_CURRENCY.
    #[arg(long, global = true)]
    currency: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a checkout and print the hosted-checkout URL
    Register {
        /// JSON file holding the basket, shipping and customer details
        checkout: PathBuf,
        /// Extra gateway parameter as KEY=VALUE; overrides computed values
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Fetch the details of a registered checkout
    Fetch { token: String },
    /// Confirm the payment for an approved checkout
    Confirm {
        token: String,
        #[arg(long)]
        payer_id: String,
        #[arg(long)]
        amount: Decimal,
    },
    /// Capture a confirmed authorization
    Capture {
        token: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Void a confirmed authorization
    Void {
        token: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Print every stored record for a token
    History { token: String },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn open_store(db_path: Option<PathBuf>) -> Result<RecordStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Ok(Box::new(RocksDBRecordStore::open(path).into_diagnostic()?)),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but the 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryRecordStore::new()))
        }
        None => Ok(Box::new(InMemoryRecordStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging("info", cli.log_format);

    let mut config = GatewayConfig::from_env().into_diagnostic()?;
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(action) = cli.action {
        config.payment_action = action;
    }
    if let Some(currency) = cli.currency {
        config.currency = currency;
    }
    let currency = config.currency.clone();

    let store = open_store(cli.db_path)?;
    let client = GatewayClient::new(config, Box::new(ReqwestTransport::new()), store);
    let facade = CheckoutFacade::with_site_urls(client);

    let record = match cli.command {
        Command::Register { checkout, params } => {
            let file = File::open(checkout).into_diagnostic()?;
            let mut request: CheckoutRequest = serde_json::from_reader(file).into_diagnostic()?;
            request.options.extra = params
                .into_iter()
                .map(|(key, value)| (key, ParamValue::Text(value)))
                .collect();
            let url = facade.checkout_url(&request).await.into_diagnostic()?;
            println!("{url}");
            return Ok(());
        }
        Command::History { token } => {
            let history = facade
                .client()
                .store()
                .history(&token)
                .await
                .into_diagnostic()?;
            println!("{}", serde_json::to_string_pretty(&history).into_diagnostic()?);
            return Ok(());
        }
        Command::Fetch { token } => facade.fetch_transaction_details(&token).await,
        Command::Confirm {
            token,
            payer_id,
            amount,
        } => {
            facade
                .confirm_transaction(&payer_id, &token, amount, &currency)
                .await
        }
        Command::Capture { token, note } => {
            facade
                .capture_authorization(&token, note.as_deref())
                .await
        }
        Command::Void { token, note } => facade.void_authorization(&token, note.as_deref()).await,
    }
    .into_diagnostic()?;

    println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?);
    Ok(())
}
