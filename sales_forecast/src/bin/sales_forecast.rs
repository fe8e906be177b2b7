//! Sales forecast CLI - train backends and produce forecasts from the command line.
//!
//! Configuration comes from `ML_MODEL_PATH`, `ML_DATA_PATH`,
//! `ML_CONFIDENCE_LEVEL` and `ML_DEFAULT_MODEL`. Responses are printed as JSON
//! on stdout; failures print the JSON error body on stderr.

use clap::{Parser, Subcommand};
use sales_forecast::schemas::{
    BatchPredictionRequest, ErrorResponse, PredictionRequest, TrainingRequest,
};
use sales_forecast::{ForecastConfig, ForecastError, ForecastService};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Day-by-day product sales forecasting
#[derive(Parser, Debug)]
#[command(name = "sales-forecast")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a backend and write its artifact
    Train {
        /// Backend name or alias (trend-based, gradient-boosted, sequence-based, naive)
        model_type: String,
        /// CSV or Parquet file; defaults to ML_DATA_PATH
        data_path: Option<String>,
    },

    /// Forecast one product
    Predict {
        product_id: String,
        /// Horizon in days (1-365)
        #[arg(allow_hyphen_values = true)]
        days: i64,
        /// Backend to use; defaults to ML_DEFAULT_MODEL
        model_type: Option<String>,
    },

    /// Forecast several products, reporting failures per product
    Batch {
        /// Horizon in days (1-365)
        #[arg(allow_hyphen_values = true)]
        days: i64,
        #[arg(required = true)]
        product_ids: Vec<String>,
        /// Backend to use; defaults to ML_DEFAULT_MODEL
        #[arg(long)]
        model_type: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ForecastError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ForecastError::SerializationError(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn run(command: Commands) -> Result<(), ForecastError> {
    let service = ForecastService::with_files(ForecastConfig::from_env()?)?;

    match command {
        Commands::Train {
            model_type,
            data_path,
        } => print_json(&service.train(&TrainingRequest {
            model_type,
            data_path,
        })?),
        Commands::Predict {
            product_id,
            days,
            model_type,
        } => print_json(&service.predict(&PredictionRequest {
            product_id,
            forecast_days: days,
            model_type,
        })?),
        Commands::Batch {
            days,
            product_ids,
            model_type,
        } => print_json(&service.predict_batch(&BatchPredictionRequest {
            product_ids,
            forecast_days: days,
            model_type,
        })?),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sales_forecast=info")))
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let body = ErrorResponse::from(&e);
            match serde_json::to_string_pretty(&body) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}
