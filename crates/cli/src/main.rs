use clap::{Parser, ValueEnum};
use stockscope_core::config::{ProviderKind, Settings};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "stockscope", about = "Price history analysis for listed equities")]
struct Args {
    /// Market data provider. Overrides MARKET_DATA_PROVIDER.
    #[arg(long, global = true, value_enum)]
    provider: Option<ProviderArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Polygon,
    #[value(name = "alpha_vantage", alias = "alpha")]
    AlphaVantage,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Polygon => ProviderKind::Polygon,
            ProviderArg::AlphaVantage => ProviderKind::AlphaVantage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let settings = Settings::from_env_with_provider(args.provider.map(ProviderKind::from))?;
    let _sentry_guard = init_sentry(&settings);

    // Logs go to stderr so reports on stdout stay pipeable.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let source = stockscope_core::market_data::from_settings(&settings)?;
    let service = stockscope_core::service::StockService::new(source);

    match commands::run(&args.command, &service, settings.lookback_days).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format_args!("{err:#}"), "command failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
