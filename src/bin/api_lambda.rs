//! AWS Lambda entry point for the query API behind API Gateway.

use forecast::{api, config, services::QueryResolver};
use lambda_http::Error as LambdaError;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::load_runtime_config(None)?;
    let resolver = QueryResolver::from_config(&config).await?;

    info!("Forecast query Lambda starting...");
    lambda_http::run(api::app(api::ApiState::new(resolver))).await
}
