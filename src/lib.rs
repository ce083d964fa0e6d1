pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod state;
pub mod ui;
pub mod view;

use std::sync::Arc;

use anyhow::{Context, Result};

use config::Config;
use data::classify::Classifier;
use data::loader::load_dataset;
use state::AppState;
use view::trend::Period;

/// Load the main file, the classification rules and any period files.
/// Every load error surfaces here, before the server binds.
pub fn load_state(config: &Config) -> Result<AppState> {
    if let Some(label) = config.duplicate_period_label() {
        anyhow::bail!("period label '{label}' is given more than once");
    }
    let classifier = match &config.rules {
        Some(path) => Classifier::from_json_file(path)
            .with_context(|| format!("loading classification rules from {}", path.display()))?,
        None => Classifier::default(),
    };
    log::info!("classifying with {} rules", classifier.rules().len());

    let options = config.load_options();
    let (dataset, report) = load_dataset(&config.input, &options, &classifier)
        .with_context(|| format!("loading {}", config.input.display()))?;

    let mut periods = Vec::with_capacity(config.periods.len());
    for source in &config.periods {
        let (dataset, report) = load_dataset(&source.path, &options, &classifier).with_context(|| {
            format!("loading period '{}' from {}", source.label, source.path.display())
        })?;
        periods.push(Period {
            label: source.label.clone(),
            dataset,
            report,
        });
    }

    Ok(AppState::new(
        dataset,
        report,
        periods,
        usize::from(config.page_size),
    ))
}

/// Serve the dashboard until Ctrl-C.
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let router = app::build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    log::info!("dashboard listening on http://{}", config.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for shutdown signal: {e}");
            }
            log::info!("shutting down");
        })
        .await
        .context("server failed")
}
