mod badge;
mod build_status;
mod cloudbuild;
mod config;
mod error;
mod logging;
mod metrics;
mod web;

use actix_web::{middleware, App, HttpServer};
use actix_web_opentelemetry::{PrometheusMetricsHandler, RequestMetrics, RequestTracing};
use clap::Parser;
use opentelemetry::global;
use opentelemetry_sdk::metrics::MeterProvider;
use prometheus::Registry;

use crate::cloudbuild::CloudBuildClient;
use crate::config::{AppConfig, Cli};
use crate::error::{format_anyhow_chain, format_error_chain};
use crate::web::AppState;

fn fatal(message: &str) -> ! {
    log::error!("{}", message);
    std::process::exit(1);
}

fn init_metrics(registry: &Registry) -> anyhow::Result<()> {
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;
    let provider = MeterProvider::builder().with_reader(exporter).build();
    global::set_meter_provider(provider);
    metrics::init()
}

async fn start_http(
    registry: Registry,
    state: actix_web::web::Data<AppState>,
) -> std::io::Result<()> {
    let bind = (state.config.bind_address.clone(), state.config.port);
    log::info!(
        "serving project {} on {}:{}{}",
        state.config.project,
        bind.0,
        bind.1,
        state.config.path_prefix
    );

    HttpServer::new(move || {
        App::new()
            .wrap(RequestTracing::new())
            .wrap(RequestMetrics::default())
            .wrap(middleware::Logger::default())
            .route(
                "/metrics",
                actix_web::web::get().to(PrometheusMetricsHandler::new(registry.clone())),
            )
            .app_data(state.clone())
            .service(web::scope(&state.config.path_prefix))
    })
    .bind(bind)?
    .run()
    .await
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, &cli.log_level);

    let config = match AppConfig::try_from(cli) {
        Ok(config) => config,
        Err(e) => fatal(&format_error_chain(&e)),
    };

    let registry = Registry::new();
    if let Err(e) = init_metrics(&registry) {
        fatal(&format!("metrics setup failed: {}", format_anyhow_chain(&e)));
    }

    let source = match CloudBuildClient::new(&config) {
        Ok(client) => client,
        Err(e) => fatal(&format!(
            "Cloud Build client setup failed: {}",
            format_error_chain(&e)
        )),
    };

    let state = actix_web::web::Data::new(AppState {
        config,
        source: Box::new(source),
    });

    start_http(registry, state).await
}
