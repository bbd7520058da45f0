#[macro_use]
extern crate lazy_static;

use std::{fs, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use resources::{
    config::ControllerConfig,
    objects::simple_app::{API_GROUP, API_VERSION},
};
use tokio::{signal, sync::mpsc};

mod client;
mod compile;
mod controller;
mod diff;
mod error;
mod naming;
mod utils;

use crate::{client::Client, controller::SimpleAppController};

lazy_static! {
    pub static ref CONFIG: ControllerConfig = Config::builder()
        .add_source(File::with_name("/etc/simpleapp/controller.yaml").required(false))
        .add_source(Environment::default())
        .build()
        .unwrap_or_default()
        .try_deserialize::<ControllerConfig>()
        .with_context(|| "Failed to parse config".to_string())
        .unwrap_or_default();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let namespace = fs::read_to_string(&CONFIG.namespace_file)
        .with_context(|| format!("Failed to read namespace from {}", CONFIG.namespace_file))?;
    let namespace = namespace.trim().to_string();
    tracing::info!("Starting SimpleApp controller in namespace {}", namespace);

    let client = Client::new(CONFIG.api_server_url.clone(), namespace);
    client
        .check_api_group()
        .await
        .with_context(|| format!("API group {}/{} is not served", API_GROUP, API_VERSION))?;

    // Orderly shutdown between cycles: the loop finishes the cycle in
    // flight and exits instead of starting another.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            shutdown_tx.send(()).await.ok();
        }
    });

    let mut controller =
        SimpleAppController::new(client, Duration::from_secs(CONFIG.poll_interval));
    controller.run(shutdown_rx).await
}
