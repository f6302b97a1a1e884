use std::thread;
use std::time::Duration;

use futures::{
    StreamExt,
    TryStreamExt,
    stream,
};
use kube::api::DynamicObject;
use ocp_core::errors::*;
use ocp_core::k8s::{
    CLUSTER_VERSION,
    DEPLOYMENT_CONFIG,
    NAMESPACE,
    PROJECT,
    PROJECT_REQUEST,
    build_label_patch,
    is_already_exists,
    is_not_found,
};
use ocp_core::macros::*;
use ocp_core::prelude::*;
use ocp_core::readiness::{
    PollError,
    ReadinessPoller,
};
use ocp_core::scale::VerificationError;
use regex::Regex;
use serde_json::json;
use tracing::*;

use crate::config::{
    AppDeploymentSpec,
    PopulationPlan,
    Prerequisites,
    ProjectDeploymentPlan,
};
use crate::template::{
    create_objects,
    process_template,
};

// Everything one population run needs; cloned into every worker
#[derive(Clone)]
pub struct PopulationContext {
    poller: ReadinessPoller,
}

impl PopulationContext {
    pub fn new(client: ResourceClient) -> PopulationContext {
        PopulationContext { poller: ReadinessPoller::new(client) }
    }

    pub fn client(&self) -> &ResourceClient {
        self.poller.client()
    }
}

// The result of a successful population run; this is what cleanup works from
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PopulationSummary {
    pub projects: Vec<String>,
    pub total_apps: usize,
}

pub fn worker_count() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

pub fn select_projects<'a>(plan: &'a PopulationPlan, filter: Option<&Regex>) -> Vec<&'a ProjectDeploymentPlan> {
    plan.projects
        .iter()
        .filter(|p| filter.is_none_or(|re| re.is_match(&p.project_name)))
        .collect()
}

pub fn build_project_request(name: &str) -> DynamicObject {
    DynamicObject {
        types: Some(PROJECT_REQUEST.type_meta()),
        metadata: metav1::ObjectMeta { name: Some(name.into()), ..Default::default() },
        data: json!({}),
    }
}

// The populated marker is how longevity mode finds the deployment configs it's allowed to touch
pub fn build_scale_and_label_patch(app: &AppDeploymentSpec) -> serde_json::Value {
    let mut labels = app.app_labels.clone();
    labels.extend(klabel!(POPULATED_LABEL_KEY => "true"));
    let mut patch = build_label_patch(&labels);
    patch["spec"] = json!({"replicas": app.app_replicas});
    patch
}

// Projects are handed out to a bounded set of workers; each worker does its whole project (in
// order) and reports back how many apps it deployed.  The first failure ends the run.
#[instrument(skip_all)]
pub async fn populate(
    ctx: &PopulationContext,
    plan: &PopulationPlan,
    filter: Option<&Regex>,
) -> anyhow::Result<PopulationSummary> {
    let projects = select_projects(plan, filter);
    let workers = worker_count();
    info!("populating {} project(s) with {workers} workers", projects.len());

    let app_counts: Vec<usize> = stream::iter(projects.iter().map(|p| deploy_project(ctx, p)))
        .buffer_unordered(workers)
        .try_collect()
        .await?;

    let summary = PopulationSummary {
        projects: projects.iter().map(|p| p.project_name.clone()).collect(),
        total_apps: app_counts.iter().sum(),
    };
    info!("deployed {} app(s) across {} project(s)", summary.total_apps, summary.projects.len());
    Ok(summary)
}

#[instrument(skip_all, fields(project = project.project_name))]
pub async fn deploy_project(ctx: &PopulationContext, project: &ProjectDeploymentPlan) -> anyhow::Result<usize> {
    let name = &project.project_name;
    create_project(ctx, name).await?;

    if !project.project_labels.is_empty() {
        ctx.client()
            .patch(&NAMESPACE, None, name, &build_label_patch(&project.project_labels))
            .await?;
    }

    for app in &project.apps {
        deploy_app(ctx, name, app).await?;
    }

    info!("project {name} is fully deployed");
    Ok(project.app_count())
}

pub async fn create_project(ctx: &PopulationContext, name: &str) -> EmptyResult {
    info!("creating project {name}");
    match ctx.client().create(&PROJECT_REQUEST, None, &build_project_request(name)).await {
        Ok(_) => (),
        Err(err) if is_already_exists(&err) => warn!("project {name} already exists, reusing it"),
        Err(err) => return Err(err),
    }

    let timeout = Duration::from_secs(PROJECT_TIMEOUT_SECONDS);
    ctx.poller
        .wait_for_project_active(name, timeout)
        .await
        .into_result(&format!("project {name} to become active"))?;
    Ok(())
}

// Every copy of the app is created first, and then its deployment configs are checked one at a
// time in the order they came out of the templates
pub async fn deploy_app(ctx: &PopulationContext, ns: &str, app: &AppDeploymentSpec) -> EmptyResult {
    let mut deployment_configs = vec![];
    for index in 0..app.app_count {
        let objects = process_template(ctx.client(), ns, app, index).await?;
        deployment_configs.extend(create_objects(ctx.client(), ns, &objects).await?);
    }

    let timeout = Duration::from_secs(DEPLOYMENT_CONFIG_TIMEOUT_SECONDS);
    let patch = build_scale_and_label_patch(app);
    for dc in &deployment_configs {
        match ctx.poller.wait_for_deployment_config(dc, ns, timeout).await {
            PollOutcome::Ready(_) => {
                info!("deployment config {ns}/{dc} is ready, scaling to {} replicas", app.app_replicas);
                ctx.client().patch(&DEPLOYMENT_CONFIG, Some(ns), dc, &patch).await?;
            },
            PollOutcome::Timeout => bail!(VerificationError::DeploymentConfigTimeout(format!("{ns}/{dc}"))),
            PollOutcome::Error(reason) => bail!(PollError::Watch(format!("deployment config {ns}/{dc}: {reason}"))),
        }
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn cleanup(ctx: &PopulationContext, projects: &[String]) -> EmptyResult {
    let timeout = Duration::from_secs(PROJECT_TIMEOUT_SECONDS);
    for name in projects {
        info!("deleting project {name}");
        match ctx.client().delete(&PROJECT, None, name).await {
            Ok(()) => (),
            Err(err) if is_not_found(&err) => {
                info!("project {name} does not exist, skipping");
                continue;
            },
            Err(err) => return Err(err),
        }

        if !ctx.poller.wait_for_project_deleted(name, timeout).await? {
            bail!(PollError::Timeout(format!("project {name} to be deleted")));
        }
    }
    info!("cleaned up {} project(s)", projects.len());
    Ok(())
}

// Only the OCP version can be checked against the cluster; a mismatch is worth a warning but the
// run goes ahead anyways
pub async fn check_prerequisites(ctx: &PopulationContext, prereqs: &Prerequisites) -> anyhow::Result<bool> {
    info!(
        "plan prerequisites: ocp_version={}, cns={}, routers={}, heketi={}",
        prereqs.ocp_version.as_deref().unwrap_or("<any>"),
        prereqs.cns,
        prereqs.routers.map(|r| r.to_string()).unwrap_or("<any>".into()),
        prereqs.heketi,
    );

    let Some(wanted) = &prereqs.ocp_version else {
        return Ok(true);
    };
    let cv = ctx.client().get(&CLUSTER_VERSION, None, CLUSTER_VERSION_NAME).await?;
    let actual = cv.status_str("/desired/version").unwrap_or_default();
    if actual.starts_with(wanted.as_str()) {
        Ok(true)
    } else {
        warn!("plan expects OCP {wanted} but the cluster is running {actual}");
        Ok(false)
    }
}
