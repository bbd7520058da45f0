use std::{collections::HashMap, time::Duration};

use anyhow::{Context, Result};
use resources::objects::{
    simple_app::SimpleApp, Metadata, MANAGED_BY_LABEL, MANAGED_BY_VALUE,
};
use tokio::{select, sync::mpsc::Receiver, time::sleep};

use crate::{client::Client, compile, diff, error::Error, utils};

pub struct SimpleAppController {
    client: Client,
    poll_interval: Duration,
}

impl SimpleAppController {
    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Control loop: run one full cycle, sleep, repeat until `shutdown`
    /// fires between cycles. Only a failure to list specifications
    /// escapes; every other error is logged and retried naturally on the
    /// next cycle.
    pub async fn run(&mut self, mut shutdown: Receiver<()>) -> Result<()> {
        tracing::info!(
            "SimpleApp controller started, watching namespace {}",
            self.client.namespace()
        );

        let mut known = HashMap::new();
        loop {
            known = self.cycle(known).await?;
            select! {
                _ = sleep(self.poll_interval) => {},
                _ = shutdown.recv() => {
                    tracing::info!("SimpleApp controller exiting");
                    return Ok(());
                },
            }
        }
    }

    /// One reconciliation cycle: list, reconcile each specification in
    /// listing order, tear down the ones that disappeared since the
    /// previous cycle, then sweep for orphans. Consumes the previous
    /// cycle's specification set and returns the current one.
    async fn cycle(
        &self,
        previous: HashMap<String, SimpleApp>,
    ) -> Result<HashMap<String, SimpleApp>> {
        let apps = self
            .client
            .list_simple_apps()
            .await
            .with_context(|| "Failed to list SimpleApps")?;

        let mut current = HashMap::with_capacity(apps.len());
        for mut app in apps {
            if !previous.contains_key(&app.metadata.name) {
                tracing::info!(
                    "SimpleApp {}.{} appeared",
                    app.metadata.namespace,
                    app.metadata.name
                );
            }
            if let Err(e) = self.reconcile(&mut app).await {
                tracing::error!(
                    "Failed to reconcile SimpleApp {}.{}: {}",
                    app.metadata.namespace,
                    app.metadata.name,
                    e
                );
            }
            current.insert(app.metadata.name.clone(), app);
        }

        for (name, app) in &previous {
            if !current.contains_key(name) {
                tracing::info!("SimpleApp {}.{} disappeared", app.metadata.namespace, name);
                if let Err(e) = self.teardown(app).await {
                    tracing::error!(
                        "Failed to delete resources of SimpleApp {}.{}: {}",
                        app.metadata.namespace,
                        name,
                        e
                    );
                }
            }
        }

        if let Err(e) = self.collect_orphans(&current).await {
            tracing::error!("Garbage collection failed: {}", e);
        }

        Ok(current)
    }

    /// Converge both derived resources of one specification, workload
    /// first. A transient failure on one resource still lets the other
    /// proceed; validation and ownership failures stop the specification.
    async fn reconcile(&self, app: &mut SimpleApp) -> Result<(), Error> {
        self.normalize(app).await;

        if let Err(e) = self.ensure_deployment(app).await {
            if e.halts_spec() {
                return Err(e);
            }
            tracing::error!(
                "Failed to reconcile Deployment {}.{}: {}",
                app.metadata.namespace,
                app.metadata.name,
                e
            );
        }
        if let Err(e) = self.ensure_service(app).await {
            if e.halts_spec() {
                return Err(e);
            }
            tracing::error!(
                "Failed to reconcile Service {}.{}: {}",
                app.metadata.namespace,
                app.metadata.name,
                e
            );
        }
        Ok(())
    }

    /// First-wins duplicate removal. A changed specification is persisted
    /// so subsequent cycles list the cleaned form; if that write fails the
    /// cycle carries on with the in-memory copy and retries next time.
    async fn normalize(&self, app: &mut SimpleApp) {
        let dropped_ports = app.dedup_ports();
        if dropped_ports > 0 {
            tracing::info!(
                "Removing {} duplicate port(s) from SimpleApp {}.{}",
                dropped_ports,
                app.metadata.namespace,
                app.metadata.name
            );
        }
        let dropped_volumes = app.dedup_volumes();
        if dropped_volumes > 0 {
            tracing::info!(
                "Removing {} duplicate volume(s) from SimpleApp {}.{}",
                dropped_volumes,
                app.metadata.namespace,
                app.metadata.name
            );
        }
        if dropped_ports > 0 || dropped_volumes > 0 {
            if let Err(e) = self.client.put_simple_app(app).await {
                tracing::warn!(
                    "Failed to persist normalized SimpleApp {}.{}: {}",
                    app.metadata.namespace,
                    app.metadata.name,
                    e
                );
            }
        }
    }

    async fn ensure_deployment(&self, app: &SimpleApp) -> Result<(), Error> {
        match self.client.get_deployment(&app.metadata.name).await? {
            None => {
                let deployment = compile::build_deployment(app)?;
                self.client.create_deployment(&deployment).await?;
                tracing::info!(
                    "Created Deployment {}.{}",
                    app.metadata.namespace,
                    app.metadata.name
                );
            },
            Some(observed) => {
                utils::ensure_managed(&observed.metadata, "Deployment")?;
                let desired = compile::build_deployment(app)?;
                if !diff::deployment_equal(&desired, &observed) {
                    self.client.update_deployment(&desired).await?;
                    tracing::info!(
                        "Deployment {}.{} updated",
                        app.metadata.namespace,
                        app.metadata.name
                    );
                }
            },
        }
        Ok(())
    }

    async fn ensure_service(&self, app: &SimpleApp) -> Result<(), Error> {
        match self.client.get_service(&app.metadata.name).await? {
            None => {
                let service = compile::build_service(app);
                self.client.create_service(&service).await?;
                tracing::info!(
                    "Created Service {}.{}",
                    app.metadata.namespace,
                    app.metadata.name
                );
            },
            Some(observed) => {
                utils::ensure_managed(&observed.metadata, "Service")?;
                let desired = compile::build_service(app);
                if !diff::service_equal(&desired, &observed) {
                    self.client.update_service(&desired).await?;
                    tracing::info!(
                        "Service {}.{} updated",
                        app.metadata.namespace,
                        app.metadata.name
                    );
                }
            },
        }
        Ok(())
    }

    /// Delete both derived resources of a specification that disappeared.
    async fn teardown(&self, app: &SimpleApp) -> Result<(), Error> {
        match self.client.get_deployment(&app.metadata.name).await? {
            None => tracing::info!(
                "Deployment {}.{} already deleted",
                app.metadata.namespace,
                app.metadata.name
            ),
            Some(observed) => {
                utils::ensure_managed(&observed.metadata, "Deployment")?;
                self.client.delete_deployment(&app.metadata.name).await?;
                tracing::info!(
                    "Deleted Deployment {}.{}",
                    app.metadata.namespace,
                    app.metadata.name
                );
            },
        }

        match self.client.get_service(&app.metadata.name).await? {
            None => tracing::info!(
                "Service {}.{} already deleted",
                app.metadata.namespace,
                app.metadata.name
            ),
            Some(observed) => {
                utils::ensure_managed(&observed.metadata, "Service")?;
                self.client.delete_service(&app.metadata.name).await?;
                tracing::info!(
                    "Deleted Service {}.{}",
                    app.metadata.namespace,
                    app.metadata.name
                );
            },
        }
        Ok(())
    }

    /// Reap derived resources whose owning specification no longer
    /// exists. Runs strictly after every specification of the cycle has
    /// been reconciled; repeated sweeps over a clean set are no-ops.
    async fn collect_orphans(
        &self,
        current: &HashMap<String, SimpleApp>,
    ) -> Result<(), Error> {
        let selector = format!("{}={}", MANAGED_BY_LABEL, MANAGED_BY_VALUE);

        let deployments = self.client.list_deployments(&selector).await?;
        for metadata in orphans(deployments.iter().map(|d| &d.metadata), current) {
            tracing::info!(
                "Reaping orphaned Deployment {}.{}",
                metadata.namespace,
                metadata.name
            );
            if let Err(e) = self.client.delete_deployment(&metadata.name).await {
                tracing::error!(
                    "Failed to delete orphaned Deployment {}.{}: {}",
                    metadata.namespace,
                    metadata.name,
                    e
                );
            }
        }

        let services = self.client.list_services(&selector).await?;
        for metadata in orphans(services.iter().map(|s| &s.metadata), current) {
            tracing::info!(
                "Reaping orphaned Service {}.{}",
                metadata.namespace,
                metadata.name
            );
            if let Err(e) = self.client.delete_service(&metadata.name).await {
                tracing::error!(
                    "Failed to delete orphaned Service {}.{}: {}",
                    metadata.namespace,
                    metadata.name,
                    e
                );
            }
        }
        Ok(())
    }
}

/// Derived resources not claimed by any specification in the current set.
fn orphans<'a>(
    derived: impl Iterator<Item = &'a Metadata>,
    current: &HashMap<String, SimpleApp>,
) -> Vec<&'a Metadata> {
    derived
        .filter(|metadata| !current.contains_key(&metadata.name))
        .collect()
}
