use std::time::Duration;

use clockabilly::prelude::*;
use ocp_core::errors::*;
use ocp_core::k8s::{
    DEPLOYMENT_CONFIG,
    Selector,
    build_replicas_patch,
};
use ocp_core::prelude::*;
use ocp_core::readiness::predicates;
use rand::Rng;
use rand::distributions::{
    Distribution,
    Uniform,
};
use tracing::*;

use crate::orchestrator::PopulationContext;

err_impl! {InvalidStateError,
    #[error("deployment config {0} is neither available nor progressing")]
    DeploymentConfigFailed(String),
}

#[derive(Clone, Debug)]
pub struct LongevityOptions {
    pub span: Duration,
    pub interval_seconds: i64,
    pub max_replicas: i64,
}

// Every interval, look at all the deployment configs we populated; if any of them has fallen over
// the run is over, otherwise some random subset of them gets rescaled.  Returns the number of
// rescales that were issued.
#[instrument(skip_all, fields(span = %humantime::format_duration(opts.span)))]
pub async fn longevity<R: Rng + Send>(
    ctx: &PopulationContext,
    opts: &LongevityOptions,
    clock: Box<dyn Clockable + Send>,
    rng: &mut R,
) -> anyhow::Result<usize> {
    ensure!(opts.max_replicas >= 1, "longevity needs a max replica count of at least 1");
    let replica_dist = Uniform::new_inclusive(1, opts.max_replicas);
    let selector = Selector::labels(&format!("{POPULATED_LABEL_KEY}=true"));
    let end_ts = clock.now_ts() + opts.span.as_secs() as i64;

    let mut rescales = 0;
    while clock.now_ts() < end_ts {
        let dcs = ctx.client().list(&DEPLOYMENT_CONFIG, None, &selector).await?;
        if let Some(failed) = dcs.iter().find(|dc| predicates::deployment_config_failed(dc)) {
            bail!(InvalidStateError::DeploymentConfigFailed(failed.to_ref().to_string()));
        }

        let chosen: Vec<_> = dcs.iter().filter(|_| rng.gen_bool(0.5)).collect();
        for dc in chosen {
            let replicas = replica_dist.sample(rng);
            info!("rescaling {} to {replicas} replicas", dc.to_ref());
            ctx.client()
                .patch(&DEPLOYMENT_CONFIG, dc.namespace(), &dc.name(), &build_replicas_patch(replicas))
                .await?;
            rescales += 1;
        }

        debug!("checked {} deployment config(s); sleeping for {}s", dcs.len(), opts.interval_seconds);
        clock.sleep(opts.interval_seconds).await;
    }

    info!("longevity run finished after {rescales} rescale(s)");
    Ok(rescales)
}
