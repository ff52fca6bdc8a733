//! GreenView command-line client and HTTP server.
//!
//! Usage:
//!   greenview serve
//!   greenview ask "What will CO2 emissions be in 45 days using lightgbm?"
//!   greenview forecast --metric CO2_Emissions_kg --days 90 --model xgboost --model lightgbm
//!   greenview score
//!   greenview metrics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use greenview_api::{router, AppState, ServerConfig};
use serde::Serialize;
use sustain_forecast::{Pipeline, Settings, StructuredRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "greenview")]
#[command(about = "Sustainability metric forecasts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve,
    /// Ask a forecast question in plain language
    Ask {
        question: String,
    },
    /// Forecast one metric with one or more models
    Forecast {
        #[arg(long)]
        metric: String,
        /// Days ahead; defaults to the configured structured horizon
        #[arg(long)]
        days: Option<u32>,
        /// Model identifier, repeatable
        #[arg(long = "model")]
        models: Vec<String>,
    },
    /// Show the current sustainability score
    Score,
    /// List the metrics available for forecasting
    Metrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greenview=info,greenview_api=info,sustain_forecast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load configuration")?;
    let state = AppState::new(Pipeline::new(&settings));

    // Loading blocks on the database client, so pipeline calls stay off the runtime threads.
    match cli.command {
        Commands::Serve => serve(state).await,
        Commands::Ask { question } => print_json(&state.run(move |pipeline| pipeline.ask(&question)).await?),
        Commands::Forecast {
            metric,
            days,
            models,
        } => {
            let request = StructuredRequest {
                metric,
                forecast_days: days,
                models: (!models.is_empty()).then_some(models),
            };
            print_json(&state.run(move |pipeline| pipeline.forecast(&request)).await?)
        }
        Commands::Score => print_json(&state.run(|pipeline| pipeline.sustainability_score()).await?),
        Commands::Metrics => print_json(&state.run(|pipeline| pipeline.available_metrics()).await?),
    }
}

async fn serve(state: AppState) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let app = router(state);

    tracing::info!(addr = %config.bind, "Starting GreenView server");
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
