// SPDX-License-Identifier: MIT OR Apache-2.0
//! `nodeflow` - headless driver for the dataflow graph core.
//!
//! Builds a small graph (two float sources, one combiner, one print node)
//! through the same interface a canvas UI would use, runs it and logs what
//! the print node observed.
//!
//! Usage: `nodeflow [config.ron]`

mod config;
mod demo;

use config::AppConfig;
use nodeflow_graph::Node;
use std::path::Path;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let (config, load_error) = match std::env::args().nth(1) {
        Some(path) => match AppConfig::load(Path::new(&path)) {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::default(), Some(e)),
        },
        None => (AppConfig::default(), None),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(e) = load_error {
        tracing::error!("{e}");
        std::process::exit(1);
    }

    tracing::info!("Starting nodeflow v{}", env!("CARGO_PKG_VERSION"));

    match demo::run(&config) {
        Ok((demo, report)) => {
            let text = |id| {
                demo.graph
                    .node(id)
                    .map(Node::display_text)
                    .unwrap_or_default()
            };
            tracing::info!(
                "A = {}, B = {}, {} = {}, {}",
                text(demo.source_a),
                text(demo.source_b),
                config.operation.name(),
                text(demo.combiner),
                text(demo.sink)
            );
            tracing::info!(
                evaluated = report.steps.len(),
                observations = report.observations.len(),
                "Done"
            );
        }
        Err(e) => {
            tracing::error!("Run failed: {e}");
            std::process::exit(1);
        }
    }
}
