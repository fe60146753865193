use anyhow::{Context, Result};
use futures::AsyncBufRead;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, LogParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::discovery::Scope;
use kube::{Api, Client, Config, ResourceExt};
use serde_json::Value;

use crate::config::LogsDef;
use crate::fields;

/// A resource kind resolved against the cluster: the concrete API endpoint
/// plus whether the kind is cluster-scoped.
#[derive(Debug, Clone)]
pub struct KindBinding {
    pub resource: ApiResource,
    pub cluster_scoped: bool,
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub async fn new() -> Result<Self> {
        let config = Config::infer()
            .await
            .context("failed to infer Kubernetes configuration")?;
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        Ok(Self { client })
    }

    /// Resolves a group/version/kind against the cluster's discovery API.
    /// Fails for kinds the cluster does not serve.
    pub async fn resolve_kind(&self, group: &str, version: &str, kind: &str) -> Result<KindBinding> {
        let gvk = GroupVersionKind::gvk(group, version, kind);
        let (resource, capabilities) = kube::discovery::oneshot::pinned_kind(&self.client, &gvk)
            .await
            .with_context(|| format!("failed to resolve kind {kind}.{version}.{group}"))?;
        Ok(KindBinding {
            resource,
            cluster_scoped: capabilities.scope == Scope::Cluster,
        })
    }

    /// Dynamic API handle for a bound kind. An empty namespace on a
    /// namespaced kind means all namespaces.
    pub fn api_for(&self, binding: &KindBinding, namespace: &str) -> Api<DynamicObject> {
        if binding.cluster_scoped || namespace.is_empty() {
            Api::all_with(self.client.clone(), &binding.resource)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &binding.resource)
        }
    }

    pub async fn get_object(
        &self,
        binding: &KindBinding,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject> {
        let api = self.api_for(binding, namespace.unwrap_or_default());
        api.get(name)
            .await
            .with_context(|| format!("failed to fetch {} {name}", binding.resource.kind))
    }

    /// Resolves the pod to stream logs from. A Pod target is itself; any
    /// other kind is dereferenced through its `spec.selector` to the first
    /// matching pod in the target namespace.
    pub async fn resolve_log_pod(&self, binding: &KindBinding, def: &LogsDef) -> Result<(String, String)> {
        let namespace = if def.key.namespace.is_empty() {
            self.client.default_namespace().to_string()
        } else {
            def.key.namespace.clone()
        };

        if def.kind == "Pod" {
            return Ok((namespace, def.key.name.clone()));
        }

        let owner = self
            .get_object(binding, Some(&namespace), &def.key.name)
            .await?;
        let body = serde_json::to_value(&owner)
            .with_context(|| format!("failed to render {}", owner.name_any()))?;
        let selector = fields::extract(&body, "spec.selector")
            .and_then(selector_string)
            .with_context(|| {
                format!("{} {} has no pod selector", def.kind, def.key.display())
            })?;

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        let list = pods
            .list(&ListParams::default().labels(&selector))
            .await
            .with_context(|| format!("failed to list pods matching {selector}"))?;
        let pod = list
            .items
            .into_iter()
            .next()
            .with_context(|| format!("no pods match selector {selector}"))?;
        Ok((namespace, pod.name_any()))
    }

    pub async fn stream_pod_logs(
        &self,
        namespace: &str,
        pod_name: &str,
        container: Option<&str>,
    ) -> Result<impl AsyncBufRead + Unpin> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: container.map(str::to_string),
            follow: true,
            ..LogParams::default()
        };
        pods.log_stream(pod_name, &params)
            .await
            .with_context(|| format!("failed to stream logs for {namespace}/{pod_name}"))
    }
}

pub fn to_yaml(object: &DynamicObject) -> Result<String> {
    serde_yaml::to_string(object)
        .with_context(|| format!("failed to render {} as YAML", object.name_any()))
}

/// Renders a selector value as a label-selector query string. Accepts both
/// the LabelSelector shape (matchLabels/matchExpressions) and the bare label
/// map some kinds embed, such as Service `spec.selector`.
pub fn selector_string(selector: &Value) -> Option<String> {
    let map = selector.as_object()?;
    let mut requirements = Vec::new();

    if map.contains_key("matchLabels") || map.contains_key("matchExpressions") {
        if let Some(labels) = map.get("matchLabels").and_then(Value::as_object) {
            for (key, value) in labels {
                requirements.push(format!("{key}={}", value.as_str().unwrap_or_default()));
            }
        }
        if let Some(expressions) = map.get("matchExpressions").and_then(Value::as_array) {
            for expression in expressions {
                if let Some(requirement) = expression_requirement(expression) {
                    requirements.push(requirement);
                }
            }
        }
    } else {
        for (key, value) in map {
            requirements.push(format!("{key}={}", value.as_str().unwrap_or_default()));
        }
    }

    if requirements.is_empty() {
        None
    } else {
        Some(requirements.join(","))
    }
}

fn expression_requirement(expression: &Value) -> Option<String> {
    let key = expression.get("key")?.as_str()?;
    let operator = expression.get("operator")?.as_str()?;
    let values = || {
        expression
            .get("values")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default()
    };
    match operator {
        "In" => Some(format!("{key} in ({})", values())),
        "NotIn" => Some(format!("{key} notin ({})", values())),
        "Exists" => Some(key.to_string()),
        "DoesNotExist" => Some(format!("!{key}")),
        _ => None,
    }
}

/// Label selector in the `key=value,key2=value2` form watchers expect.
pub fn label_selector_string(labels: &std::collections::BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}
