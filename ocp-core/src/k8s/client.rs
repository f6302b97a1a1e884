use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
};

use either::Either;
use kube::api::{
    DeleteParams,
    DynamicObject,
    GroupVersionKind,
    Patch,
    PatchParams,
    PostParams,
};
use kube::discovery::Scope;
use serde_json::Value;
use tracing::*;

use super::*;
use crate::errors::*;
use crate::prelude::*;

// A ResourceClient is the single entry point to the apiserver for the whole harness.  It is cheap
// to clone (the kube::Client is reference-counted and so is the discovery cache), so every worker
// gets its own copy.  `Api` handles are built fresh on every call; the only thing cached is kind
// resolution.  Kinds the harness knows about up front skip discovery entirely; everything else
// (i.e., whatever comes out of an application template) is looked up once and remembered so that
// we don't have to repeatedly make "discovery" calls against the apiserver.
#[derive(Clone)]
pub struct ResourceClient {
    client: kube::Client,
    discovered: Arc<Mutex<HashMap<GroupVersionKind, ResourceKind>>>,
}

impl ResourceClient {
    pub fn new(client: kube::Client) -> ResourceClient {
        ResourceClient { client, discovered: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn kube_client(&self) -> &kube::Client {
        &self.client
    }

    pub fn api(&self, kind: &ResourceKind, ns: Option<&str>) -> kube::Api<DynamicObject> {
        let ar = kind.api_resource();
        match ns {
            Some(ns) if kind.is_namespaced() => kube::Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => kube::Api::all_with(self.client.clone(), &ar),
        }
    }

    pub async fn get(&self, kind: &ResourceKind, ns: Option<&str>, name: &str) -> anyhow::Result<ResourceSnapshot> {
        self.api(kind, ns)
            .get(name)
            .await
            .map(ResourceSnapshot::from)
            .map_err(|err| classify_kube_error(err, &ResourceRef::new(kind, ns, name)))
    }

    pub async fn get_opt(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        name: &str,
    ) -> anyhow::Result<Option<ResourceSnapshot>> {
        match self.get(kind, ns, name).await {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    // Existence checks are "soft": if the apiserver can't answer we log it and report the object
    // as missing, and the caller decides what that means
    pub async fn exists(&self, kind: &ResourceKind, ns: Option<&str>, name: &str) -> bool {
        match self.get_opt(kind, ns, name).await {
            Ok(maybe_obj) => maybe_obj.is_some(),
            Err(err) => {
                warn!("could not look up {}: {err:#}", ResourceRef::new(kind, ns, name));
                false
            },
        }
    }

    pub async fn list(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        sel: &Selector,
    ) -> anyhow::Result<Vec<ResourceSnapshot>> {
        let objs = self
            .api(kind, ns)
            .list(&sel.list_params())
            .await
            .map_err(|err| classify_kube_error(err, &ResourceRef::new(kind, ns, "*")))?;
        Ok(objs.items.into_iter().map(ResourceSnapshot::from).collect())
    }

    pub async fn create(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        obj: &DynamicObject,
    ) -> anyhow::Result<ResourceSnapshot> {
        self.api(kind, ns)
            .create(&PostParams::default(), obj)
            .await
            .map(ResourceSnapshot::from)
            .map_err(|err| classify_kube_error(err, &ResourceRef::new(kind, ns, &obj.name_any())))
    }

    // Create an arbitrary object whose type we only know from its apiVersion/kind
    pub async fn create_from_object(
        &self,
        ns: &str,
        obj: &DynamicObject,
    ) -> anyhow::Result<(ResourceKind, ResourceSnapshot)> {
        let Some(types) = &obj.types else {
            bail!(ClusterError::unknown_kind(&format!("object {} has no type information", obj.name_any())));
        };
        let kind = self.resolve_kind(&types.api_version, &types.kind).await?;
        let snapshot = self.create(&kind, Some(ns), obj).await?;
        Ok((kind, snapshot))
    }

    pub async fn patch(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        name: &str,
        patch: &Value,
    ) -> anyhow::Result<ResourceSnapshot> {
        self.api(kind, ns)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map(ResourceSnapshot::from)
            .map_err(|err| classify_kube_error(err, &ResourceRef::new(kind, ns, name)))
    }

    pub async fn replace(
        &self,
        kind: &ResourceKind,
        ns: Option<&str>,
        obj: &DynamicObject,
    ) -> anyhow::Result<ResourceSnapshot> {
        let name = obj.name_any();
        self.api(kind, ns)
            .replace(&name, &PostParams::default(), obj)
            .await
            .map(ResourceSnapshot::from)
            .map_err(|err| classify_kube_error(err, &ResourceRef::new(kind, ns, &name)))
    }

    pub async fn delete(&self, kind: &ResourceKind, ns: Option<&str>, name: &str) -> EmptyResult {
        let obj_ref = ResourceRef::new(kind, ns, name);

        // delete returns an "either" object; left contains the object being deleted (i.e., it
        // still has finalizers to run), and right contains a status code indicating the delete is
        // finished
        match self.api(kind, ns).delete(name, &DeleteParams::default()).await {
            Ok(Either::Left(_)) => debug!("deletion of {obj_ref} is in progress"),
            Ok(Either::Right(_)) => debug!("{obj_ref} deleted"),
            Err(err) => return Err(classify_kube_error(err, &obj_ref)),
        }
        Ok(())
    }

    // Authenticated GET against one of the apiserver's health endpoints; any non-2xx response
    // comes back as an error
    pub async fn healthz(&self, path: &str) -> anyhow::Result<String> {
        let req = http::Request::get(path).body(vec![])?;
        Ok(self.client.request_text(req).await?)
    }

    pub async fn resolve_kind(&self, api_version: &str, kind: &str) -> anyhow::Result<ResourceKind> {
        if let Some(known) = ResourceKind::well_known(api_version, kind) {
            return Ok(known.clone());
        }

        let gvk = match api_version.split_once('/') {
            Some((group, version)) => GroupVersionKind::gvk(group, version, kind),
            None => GroupVersionKind::gvk("", api_version, kind),
        };
        if let Some(cached) = self.discovered_kind(&gvk) {
            return Ok(cached);
        }

        debug!("running discovery for {api_version}/{kind}");
        let (ar, caps) = kube::discovery::pinned_kind(&self.client, &gvk)
            .await
            .map_err(|err| anyhow::Error::from(err).context(ClusterError::UnknownKind(format!("{api_version}/{kind}"))))?;
        let resolved = ResourceKind::from_api_resource(&ar, caps.scope == Scope::Namespaced);
        if let Ok(mut cache) = self.discovered.lock() {
            cache.insert(gvk, resolved.clone());
        }
        Ok(resolved)
    }

    fn discovered_kind(&self, gvk: &GroupVersionKind) -> Option<ResourceKind> {
        self.discovered.lock().ok().and_then(|cache| cache.get(gvk).cloned())
    }
}
