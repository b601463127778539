use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use kube::api::ListParams;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

use crate::error::BoxError;
use crate::model::NamespaceScope;

pub type ListResult<T> = std::result::Result<Vec<T>, BoxError>;

/// The four list calls the dashboard needs from a cluster.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn nodes(&self) -> ListResult<Node>;
    async fn services(&self) -> ListResult<Service>;
    async fn deployments(&self) -> ListResult<Deployment>;
    async fn pods(&self) -> ListResult<Pod>;
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
    cluster: String,
    scope: NamespaceScope,
}

impl KubeGateway {
    pub async fn connect(
        kubeconfig_path: &Path,
        context: Option<String>,
        scope: NamespaceScope,
    ) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(kubeconfig_path)
            .with_context(|| format!("failed to read kubeconfig {}", kubeconfig_path.display()))?;
        let active_context = context
            .clone()
            .or_else(|| kubeconfig.current_context.clone())
            .unwrap_or_else(|| "-".to_string());

        let options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .context("failed to load Kubernetes configuration")?;
        let cluster = config.cluster_url.to_string();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;

        info!(context = %active_context, cluster = %cluster, scope = %scope, "connected");
        Ok(Self {
            client,
            context: active_context,
            cluster,
            scope,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    fn scoped<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match &self.scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        }
    }
}

async fn list_all<K>(api: Api<K>) -> ListResult<K>
where
    K: Clone + DeserializeOwned + Debug,
{
    let list = api.list(&ListParams::default()).await?;
    debug!(items = list.items.len(), "listed");
    Ok(list.items)
}

#[async_trait]
impl ResourceSource for KubeGateway {
    async fn nodes(&self) -> ListResult<Node> {
        list_all(Api::<Node>::all(self.client.clone())).await
    }

    async fn services(&self) -> ListResult<Service> {
        list_all(self.scoped::<Service>()).await
    }

    async fn deployments(&self) -> ListResult<Deployment> {
        list_all(self.scoped::<Deployment>()).await
    }

    async fn pods(&self) -> ListResult<Pod> {
        list_all(self.scoped::<Pod>()).await
    }
}
