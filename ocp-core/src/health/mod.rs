pub mod components;

use serde::Serialize;
use tracing::*;

pub use self::components::*;
use crate::errors::*;
use crate::k8s::{
    CLUSTER_OPERATOR,
    CLUSTER_VERSION,
    COMPONENT_STATUS,
    DEPLOYMENT,
    IMAGE_REGISTRY_CONFIG,
    NODE,
    POD,
    ROUTE,
    Selector,
};
use crate::prelude::*;

#[derive(Clone, Debug, Serialize)]
pub struct ClusterHealth {
    pub healthy: bool,
    pub reports: Vec<HealthReport>,

    // Advisory only; ephemeral registry storage doesn't make the cluster unhealthy
    pub persistent_storage: bool,
}

impl ClusterHealth {
    pub fn unhealthy_components(&self) -> Vec<&str> {
        self.reports
            .iter()
            .filter(|r| !r.is_healthy())
            .map(|r| r.component())
            .collect()
    }
}

fn report_or_failed(component: &str, res: anyhow::Result<HealthReport>) -> HealthReport {
    match res {
        Ok(report) => report,
        Err(err) => {
            warn!("could not check {component} health: {err:#}");
            HealthReport::failed(component, &err)
        },
    }
}

// The HealthAggregator gathers whatever each check needs from the cluster and hands it to the
// evaluators in `components`.  The web console isn't reachable through the apiserver, so it gets
// probed over plain HTTPS at the host from its route.
pub struct HealthAggregator {
    client: ResourceClient,
    http: reqwest::Client,
    console_token: Option<String>,
}

impl HealthAggregator {
    pub fn new(client: ResourceClient) -> anyhow::Result<HealthAggregator> {
        // Test clusters almost never have a console certificate we could verify
        let http = reqwest::Client::builder().danger_accept_invalid_certs(true).build()?;
        Ok(HealthAggregator { client, http, console_token: None })
    }

    pub fn with_console_token(mut self, token: Option<String>) -> HealthAggregator {
        self.console_token = token;
        self
    }

    pub async fn check_node_health(&self) -> anyhow::Result<HealthReport> {
        let nodes = self.client.list(&NODE, None, &Selector::default()).await?;
        Ok(node_health(&nodes))
    }

    pub async fn check_router_health(&self) -> anyhow::Result<HealthReport> {
        let pods = self
            .client
            .list(&POD, Some(INGRESS_NS), &Selector::labels(ROUTER_POD_LABEL_SELECTOR))
            .await?;
        let deployment = self.client.get_opt(&DEPLOYMENT, Some(INGRESS_NS), ROUTER_DEPLOYMENT).await?;
        Ok(router_health(&pods, deployment.as_ref()))
    }

    pub async fn check_image_registry_health(&self) -> anyhow::Result<HealthReport> {
        let pods = self.client.list(&POD, Some(IMAGE_REGISTRY_NS), &Selector::default()).await?;
        let mut deployments = vec![];
        for name in [IMAGE_REGISTRY_DEPLOYMENT, IMAGE_REGISTRY_OPERATOR_DEPLOYMENT] {
            deployments.push(self.client.get_opt(&DEPLOYMENT, Some(IMAGE_REGISTRY_NS), name).await?);
        }
        Ok(image_registry_health(&pods, &deployments))
    }

    pub async fn check_registry_storage(&self) -> bool {
        match self
            .client
            .get(&IMAGE_REGISTRY_CONFIG, None, IMAGE_REGISTRY_CONFIG_NAME)
            .await
        {
            Ok(config) => {
                let persistent = registry_storage_persistent(&config);
                if !persistent {
                    info!("image registry is not using persistent storage");
                }
                persistent
            },
            Err(err) => {
                warn!("could not read image registry config: {err:#}");
                false
            },
        }
    }

    pub async fn check_api_server_health(&self) -> HealthReport {
        healthz_health(API_SERVER_COMPONENT, &self.client.healthz("/healthz").await)
    }

    pub async fn check_web_console_health(&self) -> anyhow::Result<HealthReport> {
        let route = self.client.get(&ROUTE, Some(CONSOLE_NS), CONSOLE_ROUTE_NAME).await?;
        let Some(host) = route.spec_str("/host") else {
            bail!("route {} has no host", route.to_ref());
        };
        Ok(healthz_health(WEB_CONSOLE_COMPONENT, &self.probe_url(&format!("https://{host}/healthz")).await))
    }

    pub async fn probe_url(&self, url: &str) -> anyhow::Result<String> {
        let mut req = self.http.get(url);
        if let Some(token) = &self.console_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }

    pub async fn check_cluster_version_health(&self) -> anyhow::Result<HealthReport> {
        let cv = self.client.get(&CLUSTER_VERSION, None, CLUSTER_VERSION_NAME).await?;
        Ok(cluster_version_health(&cv))
    }

    pub async fn check_control_plane_health(&self) -> anyhow::Result<HealthReport> {
        let statuses = self.client.list(&COMPONENT_STATUS, None, &Selector::default()).await?;
        Ok(control_plane_health(&statuses))
    }

    pub async fn check_cluster_operators_health(&self) -> anyhow::Result<HealthReport> {
        let operators = self.client.list(&CLUSTER_OPERATOR, None, &Selector::default()).await?;
        Ok(cluster_operators_health(&operators))
    }

    // Every check runs even if an earlier one already found a problem, so that one report shows
    // everything that's wrong with the cluster
    #[instrument(skip(self))]
    pub async fn check_cluster_health(&self) -> ClusterHealth {
        let (nodes, router, registry, api_server, console, version, control_plane, operators, storage) = tokio::join!(
            self.check_node_health(),
            self.check_router_health(),
            self.check_image_registry_health(),
            self.check_api_server_health(),
            self.check_web_console_health(),
            self.check_cluster_version_health(),
            self.check_control_plane_health(),
            self.check_cluster_operators_health(),
            self.check_registry_storage(),
        );

        let reports = vec![
            report_or_failed(NODES_COMPONENT, nodes),
            report_or_failed(ROUTER_COMPONENT, router),
            report_or_failed(IMAGE_REGISTRY_COMPONENT, registry),
            api_server,
            report_or_failed(WEB_CONSOLE_COMPONENT, console),
            report_or_failed(CLUSTER_VERSION_COMPONENT, version),
            report_or_failed(CONTROL_PLANE_COMPONENT, control_plane),
            report_or_failed(CLUSTER_OPERATORS_COMPONENT, operators),
        ];

        let healthy = reports.iter().all(HealthReport::is_healthy);
        let health = ClusterHealth { healthy, reports, persistent_storage: storage };
        if healthy {
            info!("cluster is healthy");
        } else {
            warn!("cluster is unhealthy: {}", health.unhealthy_components().join(", "));
        }
        health
    }
}

#[cfg(test)]
mod tests;
