use kube::api::{
    DynamicObject,
    ObjectMeta,
    PostParams,
};
use ocp_core::errors::*;
use ocp_core::k8s::{
    ClusterError,
    DEPLOYMENT_CONFIG,
    PROCESSED_TEMPLATE,
    TEMPLATE,
    classify_kube_error,
};
use ocp_core::prelude::*;
use serde_json::Value;
use tracing::*;

use crate::config::AppDeploymentSpec;

err_impl! {ExecutionError,
    #[error("could not process template {0}")]
    TemplateProcessing(String),

    #[error("could not create object from template: {0}")]
    UnknownKind(String),
}

const NAME_PARAM: &str = "NAME";

// Each copy of an app gets its own name, so that the objects from app_count copies of the same
// template don't collide in one project
pub fn instance_name(app: &AppDeploymentSpec, index: u32) -> String {
    let base = app.param(NAME_PARAM).unwrap_or_else(|| app.app_template.clone());
    format!("{base}-{index}")
}

// Only parameters the template actually declares get a value; anything else in app_params is
// ignored (with a warning) since the apiserver would reject it anyways
pub fn set_parameters(template: &mut DynamicObject, app: &AppDeploymentSpec, index: u32) -> EmptyResult {
    let template_name = template.name_any();
    let Some(params) = template.data.get_mut("parameters").and_then(Value::as_array_mut) else {
        bail!(ExecutionError::TemplateProcessing(format!("{template_name} declares no parameters")));
    };

    let mut declared = vec![];
    for param in params.iter_mut() {
        let Some(name) = param.get("name").and_then(Value::as_str).map(String::from) else {
            continue;
        };
        let value = if name == NAME_PARAM { Some(instance_name(app, index)) } else { app.param(&name) };
        if let Some(value) = value {
            param["value"] = Value::String(value);
        }
        declared.push(name);
    }

    for name in app.app_params.keys() {
        if !declared.contains(name) {
            warn!("template {template_name} has no parameter {name}, skipping");
        }
    }
    Ok(())
}

pub async fn process_template(
    client: &ResourceClient,
    ns: &str,
    app: &AppDeploymentSpec,
    index: u32,
) -> anyhow::Result<Vec<DynamicObject>> {
    let template_ref = ResourceRef::new(&TEMPLATE, Some(TEMPLATE_NS), &app.app_template);
    let mut template = client
        .api(&TEMPLATE, Some(TEMPLATE_NS))
        .get(&app.app_template)
        .await
        .map_err(|err| classify_kube_error(err, &template_ref))
        .map_err(|err| err.context(ExecutionError::TemplateProcessing(template_ref.to_string())))?;

    set_parameters(&mut template, app, index)?;
    template.metadata = ObjectMeta { name: Some(app.app_template.clone()), ..Default::default() };

    let processed = client
        .api(&PROCESSED_TEMPLATE, Some(ns))
        .create(&PostParams::default(), &template)
        .await
        .map_err(|err| classify_kube_error(err, &template_ref))
        .map_err(|err| err.context(ExecutionError::TemplateProcessing(template_ref.to_string())))?;

    let objects = processed.data.get("objects").cloned().unwrap_or(Value::Array(vec![]));
    let objects: Vec<DynamicObject> = serde_json::from_value(objects)
        .map_err(|err| anyhow::Error::from(err).context(ExecutionError::TemplateProcessing(template_ref.to_string())))?;
    debug!("template {} produced {} objects", app.app_template, objects.len());
    Ok(objects)
}

// Create everything that came out of the template, in order, and hand back the names of the
// deployment configs so the caller can wait on them
pub async fn create_objects(
    client: &ResourceClient,
    ns: &str,
    objects: &[DynamicObject],
) -> anyhow::Result<Vec<String>> {
    let mut deployment_configs = vec![];
    for obj in objects {
        let (kind, created) = match client.create_from_object(ns, obj).await {
            Ok(res) => res,
            Err(err) if matches!(err.downcast_ref::<ClusterError>(), Some(ClusterError::UnknownKind(_))) => {
                return Err(err.context(ExecutionError::UnknownKind(obj.name_any())));
            },
            Err(err) => return Err(err),
        };
        info!("created {kind} {ns}/{}", created.name());
        if kind == *DEPLOYMENT_CONFIG {
            deployment_configs.push(created.name());
        }
    }
    Ok(deployment_configs)
}
