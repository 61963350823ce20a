/**
 * LeadHub CLI Entry Point
 *
 * Command-line front end over the client library. Each subcommand plays the
 * part of one dashboard page: it runs once, calls the API through the
 * authenticated pipeline and prints the result.
 */
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use leadhub::client::{describe_failure, ApiClient, Config, FileStore, RequestOptions};
use leadhub::shared::config::AppConfig;
use leadhub::shared::error::ClientError;
use leadhub::shared::leads::ReportKind;

#[derive(Parser, Debug)]
#[command(name = "leadhub", about = "LeadHub lead management client")]
struct Args {
    /// Backend API base URL
    #[arg(long, env = "LEADHUB_API_BASE")]
    api_base: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "LEADHUB_CONFIG")]
    config: Option<PathBuf>,

    /// Session storage file
    #[arg(long, env = "LEADHUB_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session
    Login {
        email: String,
        #[arg(long, env = "LEADHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Print this installation's device id
    DeviceId,
    /// List leads
    Leads,
    /// Show dashboard metrics
    Dashboard,
    /// Download a report
    Report {
        #[arg(value_enum)]
        kind: ReportFormat,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Store the session from an OAuth callback URL fragment
    OauthHandoff { fragment: String },
    /// Authenticated GET of an arbitrary API path
    Get { path: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ReportFormat {
    Csv,
    Pdf,
}

impl From<ReportFormat> for ReportKind {
    fn from(value: ReportFormat) -> Self {
        match value {
            ReportFormat::Csv => ReportKind::Csv,
            ReportFormat::Pdf => ReportKind::Pdf,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "leadhub=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", describe_failure(&e));
            ExitCode::FAILURE
        }
    }
}

fn build_client(args: &Args) -> Result<ApiClient, ClientError> {
    let mut app = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(base) = &args.api_base {
        app.api_base = Some(base.clone());
    }
    if let Some(storage) = &args.storage {
        app.storage_path = Some(storage.clone());
    }

    let config = Config::with_app_config(app)?;
    tracing::debug!(api_base = config.api_base(), "configuration loaded");
    let store = Arc::new(FileStore::open(config.storage_path())?);
    ApiClient::new(config, store)
}

async fn run(args: Args) -> Result<(), ClientError> {
    let client = build_client(&args)?;

    match args.command {
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            match client.me().await? {
                Some(me) => println!("Signed in as {} ({:?})", me.email, me.role),
                None => println!("Signed in."),
            }
        }
        Command::Logout => {
            if client.has_session() {
                client.logout()?;
                println!("Logged out.");
            } else {
                println!("No session stored.");
            }
        }
        Command::Whoami => match client.me().await? {
            Some(me) => println!("{} <{}> {:?}", me.full_name, me.email, me.role),
            None => println!("Not signed in."),
        },
        Command::DeviceId => println!("{}", client.device_id()),
        Command::Leads => {
            let leads = client.fetch_leads().await?;
            if leads.is_empty() {
                println!("No leads yet.");
            }
            for lead in leads {
                println!(
                    "{}\t{}\t{}\t{:.2}\t{}",
                    lead.id, lead.full_name, lead.channel, lead.score, lead.status
                );
            }
        }
        Command::Dashboard => {
            let metrics = client.fetch_dashboard().await?;
            let show = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            println!("Total leads:       {}", show(metrics.total_leads));
            println!("Avg response time: {}", show(metrics.avg_response_time));
            println!("Conversion rate:   {}", show(metrics.conversion_rate));
        }
        Command::Report { kind, output } => {
            let bytes = client.download_report(kind.into()).await?;
            std::fs::write(&output, &bytes).map_err(|e| {
                ClientError::Storage(leadhub::shared::error::StorageError::io(&output, e))
            })?;
            println!("Wrote {} bytes to {}", bytes.len(), output.display());
        }
        Command::OauthHandoff { fragment } => {
            let next = client.accept_oauth_handoff(&fragment)?;
            println!("Session stored. Continue at {}", next);
        }
        Command::Get { path } => {
            let response = client.authed_fetch(&path, RequestOptions::get()).await?;
            let status = response.status();
            let body = response.text().await?;
            println!("{}", status);
            println!("{}", body);
        }
    }

    Ok(())
}
