mod config;
mod longevity;
mod orchestrator;
mod template;

use std::path::{
    Path,
    PathBuf,
};
use std::time::Duration;

use clap::{
    Parser,
    ValueEnum,
};
use clockabilly::UtcClock;
use kube::config::{
    KubeConfigOptions,
    Kubeconfig,
};
use ocp_core::errors::*;
use ocp_core::health::HealthAggregator;
use ocp_core::logging::{
    self,
    LogStyle,
};
use ocp_core::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use tracing::*;

use crate::config::{
    ConfigError,
    PopulationPlan,
};
use crate::longevity::{
    LongevityOptions,
    longevity,
};
use crate::orchestrator::{
    PopulationContext,
    check_prerequisites,
    cleanup,
    populate,
    select_projects,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum TestMode {
    Populate,
    Longevity,
    Cleanup,
    Health,
    All,
}

impl TestMode {
    fn log_style(&self) -> LogStyle {
        match self {
            TestMode::Cleanup | TestMode::Health => LogStyle::Cli,
            _ => LogStyle::Run,
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(about = "populate an OpenShift cluster with templated apps and keep it busy", version)]
struct Options {
    // The population plan; health mode doesn't need one
    #[arg(short, long, env = CLUSTER_CONF_ENV_VAR)]
    config: Option<PathBuf>,

    #[arg(short, long, visible_alias = "k8", env = KUBECONFIG_ENV_VAR)]
    kubeconfig: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = TestMode::All)]
    tests: TestMode,

    // Only projects whose names match this regex are populated or cleaned up
    #[arg(short, long)]
    filter: Option<String>,

    #[arg(short, long, default_value = "1h", value_parser = humantime::parse_duration)]
    span: Duration,

    // Upper bound for the replica counts longevity mode picks
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(i64).range(1..))]
    replicas: i64,

    #[arg(
        long,
        env = POLLING_INTERVAL_ENV_VAR,
        default_value_t = DEFAULT_POLLING_INTERVAL_SECONDS,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    interval: i64,

    #[arg(long, env = CONSOLE_TOKEN_ENV_VAR, hide_env_values = true)]
    console_token: Option<String>,

    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

impl Options {
    fn filter(&self) -> anyhow::Result<Option<Regex>> {
        self.filter
            .as_deref()
            .map(|f| Regex::new(f).map_err(|err| ConfigError::invalid(&format!("bad project filter {f}: {err}"))))
            .transpose()
    }

    fn plan(&self) -> anyhow::Result<PopulationPlan> {
        let Some(path) = &self.config else {
            bail!(ConfigError::Invalid(format!(
                "a population plan is needed for {:?} (pass --config or set {CLUSTER_CONF_ENV_VAR})",
                self.tests
            )));
        };
        PopulationPlan::load(path)
    }
}

async fn build_client(kubeconfig: Option<&Path>) -> anyhow::Result<kube::Client> {
    let Some(path) = kubeconfig else {
        return Ok(kube::Client::try_default().await?);
    };
    let kc = Kubeconfig::read_from(path)?;
    let config = kube::Config::from_custom_kubeconfig(kc, &KubeConfigOptions::default()).await?;
    Ok(kube::Client::try_from(config)?)
}

async fn health_cmd(client: ResourceClient, console_token: Option<String>) -> EmptyResult {
    let aggregator = HealthAggregator::new(client)?.with_console_token(console_token);
    let health = aggregator.check_cluster_health().await;
    println!("{}", serde_yaml::to_string(&health)?);
    ensure!(health.healthy, "cluster is unhealthy: {}", health.unhealthy_components().join(", "));
    Ok(())
}

#[instrument(skip_all, fields(tests = ?opts.tests))]
async fn run(opts: Options) -> EmptyResult {
    let filter = opts.filter()?;
    let client = ResourceClient::new(build_client(opts.kubeconfig.as_deref()).await?);
    let ctx = PopulationContext::new(client.clone());
    let longevity_opts =
        LongevityOptions { span: opts.span, interval_seconds: opts.interval, max_replicas: opts.replicas };

    match opts.tests {
        TestMode::Populate => {
            let plan = opts.plan()?;
            check_prerequisites(&ctx, &plan.metadata).await?;
            populate(&ctx, &plan, filter.as_ref()).await?;
        },
        TestMode::Longevity => {
            longevity(&ctx, &longevity_opts, UtcClock::boxed(), &mut StdRng::from_entropy()).await?;
        },
        TestMode::Cleanup => {
            let plan = opts.plan()?;
            let projects: Vec<_> = select_projects(&plan, filter.as_ref())
                .iter()
                .map(|p| p.project_name.clone())
                .collect();
            cleanup(&ctx, &projects).await?;
        },
        TestMode::Health => health_cmd(client, opts.console_token.clone()).await?,
        TestMode::All => {
            let plan = opts.plan()?;
            check_prerequisites(&ctx, &plan.metadata).await?;
            let summary = populate(&ctx, &plan, filter.as_ref()).await?;
            longevity(&ctx, &longevity_opts, UtcClock::boxed(), &mut StdRng::from_entropy()).await?;
            cleanup(&ctx, &summary.projects).await?;
        },
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let opts = Options::parse();
    logging::setup(&opts.verbosity, opts.tests.log_style());
    if let Err(err) = run(opts).await {
        logerr!(err, "populate-ocp-cluster failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
