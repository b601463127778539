//! Turns cluster objects into display rows.
//!
//! Every function here is pure: the current time, the namespace filter and
//! the node-name prefix all come in through [`RowContext`].

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::jiff::Timestamp;
use std::collections::HashSet;

use crate::model::{Field, NamespaceScope, Palette, ResourceKind, Row, Tint};

const NAME_MAX: usize = 20;
const NAME_TAIL: usize = 5;
const ELLIPSIS: &str = "...";
const INVALID_AGE: &str = "<invalid>";
const HEALTHY_POD_PHASE: &str = "Running";

/// Read-only inputs shared by all row builders within one cycle.
#[derive(Debug, Clone)]
pub struct RowContext<'a> {
    pub scope: &'a NamespaceScope,
    pub system_namespace: &'a str,
    pub palette: &'a Palette,
    pub node_prefix: &'a str,
    pub now: Timestamp,
}

impl RowContext<'_> {
    fn admits(&self, kind: ResourceKind, meta: &ObjectMeta) -> bool {
        let namespace = meta.namespace.as_deref().unwrap_or_default();
        if kind.namespaced() && namespace == self.system_namespace {
            return false;
        }
        self.scope.admits(namespace)
    }

    fn age(&self, meta: &ObjectMeta) -> String {
        created_age(meta.creation_timestamp.as_ref(), self.now)
    }
}

pub fn node_rows(nodes: &[Node], ctx: &RowContext<'_>) -> Vec<Row> {
    let tint = ctx.palette.for_kind(ResourceKind::Node);
    nodes
        .iter()
        .filter(|node| ctx.admits(ResourceKind::Node, &node.metadata))
        .map(|node| {
            let status = node.status.as_ref();
            let phase = status.and_then(|status| status.phase.as_deref());
            let conditions = status
                .and_then(|status| status.conditions.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|condition| (condition.type_.as_str(), condition.status.as_str()));
            let addresses = status
                .and_then(|status| status.addresses.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|address| address.address.as_str());

            build_row(
                ResourceKind::Node,
                &node.metadata,
                tint,
                [
                    Field::new(status_line(phase, conditions), tint),
                    Field::new("", tint),
                    Field::new(dedup_join(addresses), tint),
                    Field::new(ctx.age(&node.metadata), tint),
                ],
            )
        })
        .collect()
}

pub fn service_rows(services: &[Service], ctx: &RowContext<'_>) -> Vec<Row> {
    let tint = ctx.palette.for_kind(ResourceKind::Service);
    services
        .iter()
        .filter(|service| ctx.admits(ResourceKind::Service, &service.metadata))
        .map(|service| {
            let ingress = service
                .status
                .as_ref()
                .and_then(|status| status.load_balancer.as_ref())
                .and_then(|balancer| balancer.ingress.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|entry| {
                    format!(
                        "{} {}",
                        entry.ip.as_deref().unwrap_or_default(),
                        entry.hostname.as_deref().unwrap_or_default()
                    )
                    .trim()
                    .to_string()
                })
                .collect::<Vec<_>>()
                .join(",");

            let spec = service.spec.as_ref();
            let mut endpoints = spec
                .and_then(|spec| spec.external_ips.clone())
                .unwrap_or_default();
            if let Some(cluster_ip) = spec
                .and_then(|spec| spec.cluster_ip.as_deref())
                .filter(|ip| !ip.is_empty())
            {
                endpoints.push(cluster_ip.to_string());
            }
            endpoints.extend(
                spec.and_then(|spec| spec.ports.as_deref())
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|port| port.name.clone()),
            );
            let endpoints = endpoints
                .into_iter()
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            build_row(
                ResourceKind::Service,
                &service.metadata,
                tint,
                [
                    Field::new(ingress, tint),
                    Field::new("", tint),
                    Field::new(endpoints, tint),
                    Field::new(ctx.age(&service.metadata), tint),
                ],
            )
        })
        .collect()
}

pub fn deployment_rows(deployments: &[Deployment], ctx: &RowContext<'_>) -> Vec<Row> {
    let tint = ctx.palette.for_kind(ResourceKind::Deployment);
    deployments
        .iter()
        .filter(|deployment| ctx.admits(ResourceKind::Deployment, &deployment.metadata))
        .map(|deployment| {
            let desired = deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.replicas)
                .unwrap_or(1);
            let status = deployment.status.as_ref();
            let available = status
                .and_then(|status| status.available_replicas)
                .unwrap_or(0);
            let current = status.and_then(|status| status.replicas).unwrap_or(0);
            let replicas = format!("{available}/{current}/{desired}");
            let conditions = status
                .and_then(|status| status.conditions.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|condition| (condition.type_.as_str(), condition.status.as_str()));
            let status_tint = if available < desired {
                ctx.palette.failed
            } else {
                tint
            };

            build_row(
                ResourceKind::Deployment,
                &deployment.metadata,
                tint,
                [
                    Field::new(status_line(Some(replicas.as_str()), conditions), status_tint),
                    Field::new("", tint),
                    Field::new("", tint),
                    Field::new(ctx.age(&deployment.metadata), tint),
                ],
            )
        })
        .collect()
}

pub fn pod_rows(pods: &[Pod], ctx: &RowContext<'_>) -> Vec<Row> {
    let tint = ctx.palette.for_kind(ResourceKind::Pod);
    pods.iter()
        .filter(|pod| ctx.admits(ResourceKind::Pod, &pod.metadata))
        .map(|pod| {
            let status = pod.status.as_ref();
            let phase = status
                .and_then(|status| status.phase.as_deref())
                .unwrap_or_default();
            let conditions = status
                .and_then(|status| status.conditions.as_deref())
                .unwrap_or_default()
                .iter()
                .map(|condition| (condition.type_.as_str(), condition.status.as_str()));
            let status_tint = if phase == HEALTHY_POD_PHASE {
                tint
            } else {
                ctx.palette.failed
            };
            let node_name = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.as_deref())
                .unwrap_or_default();
            let node = node_name.strip_prefix(ctx.node_prefix).unwrap_or(node_name);
            let pod_ip = status
                .and_then(|status| status.pod_ip.as_deref())
                .unwrap_or_default();

            Row::new(vec![
                Field::new(ResourceKind::Pod.tag(), tint),
                Field::new(pod.metadata.namespace.as_deref().unwrap_or_default(), tint),
                Field::new(
                    truncate_name(pod.metadata.name.as_deref().unwrap_or_default()),
                    tint,
                ),
                Field::new(status_line(Some(phase), conditions), status_tint),
                Field::new(node, tint),
                Field::new(pod_ip, tint),
                Field::new(ctx.age(&pod.metadata), tint),
            ])
        })
        .collect()
}

fn build_row(kind: ResourceKind, meta: &ObjectMeta, tint: Tint, rest: [Field; 4]) -> Row {
    let mut fields = Vec::with_capacity(7);
    fields.push(Field::new(kind.tag(), tint));
    fields.push(Field::new(
        meta.namespace.as_deref().unwrap_or_default(),
        tint,
    ));
    fields.push(Field::new(meta.name.as_deref().unwrap_or_default(), tint));
    fields.extend(rest);
    Row::new(fields)
}

/// Primary status followed by every condition currently `True`, in API order.
pub fn status_line<'a>(
    primary: Option<&str>,
    conditions: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    primary
        .filter(|value| !value.is_empty())
        .into_iter()
        .chain(
            conditions
                .into_iter()
                .filter(|(_, status)| *status == "True")
                .map(|(type_, _)| type_),
        )
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup_join<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(*value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortens long generated names to `head...tail`, keeping the last five characters.
pub fn truncate_name(name: &str) -> String {
    let count = name.chars().count();
    if count <= NAME_MAX {
        return name.to_string();
    }

    let head = name
        .chars()
        .take(NAME_MAX - ELLIPSIS.len() - NAME_TAIL)
        .collect::<String>();
    let tail = name.chars().skip(count - NAME_TAIL).collect::<String>();
    format!("{head}{ELLIPSIS}{tail}")
}

fn created_age(created: Option<&Time>, now: Timestamp) -> String {
    let Some(created) = created else {
        return String::new();
    };
    // Creation times are whole seconds but `now` is not; truncate the full
    // difference toward zero so the skew tolerance stays two seconds wide.
    short_human_duration(now.duration_since(created.0).as_secs())
}

/// Compact age as printed by kubectl: `45s`, `3m`, `5h`, `12d`, `2y`.
pub fn short_human_duration(seconds: i64) -> String {
    // Clock skew of less than two seconds reads as "now".
    if seconds < -1 {
        return INVALID_AGE.to_string();
    }
    if seconds < 0 {
        return "0s".to_string();
    }
    if seconds < 60 {
        return format!("{seconds}s");
    }

    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m");
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h");
    }
    if hours < 24 * 364 {
        return format!("{}d", hours / 24);
    }
    format!("{}y", hours / 24 / 365)
}

/// Longest common prefix of a set of names, via its lexicographic extremes.
///
/// A single name comes back whole, so a one-node cluster strips the entire
/// node name from pod rows.
pub fn common_prefix<S: AsRef<str>>(names: &[S]) -> String {
    let Some((first, rest)) = names.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return first.as_ref().to_string();
    }

    let (mut min, mut max) = (first.as_ref(), first.as_ref());
    for name in rest.iter().map(AsRef::as_ref) {
        if name < min {
            min = name;
        } else if name > max {
            max = name;
        }
    }

    let end = min
        .char_indices()
        .zip(max.chars())
        .find(|((_, left), right)| left != right)
        .map(|((index, _), _)| index)
        .unwrap_or(min.len());
    min[..end].to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{DeploymentCondition, DeploymentSpec, DeploymentStatus};
    use k8s_openapi::api::core::v1::{
        LoadBalancerIngress, LoadBalancerStatus, NodeAddress, NodeCondition, NodeStatus,
        PodCondition, PodSpec, PodStatus, ServicePort, ServiceSpec, ServiceStatus,
    };

    pub(crate) const NOW: i64 = 1_700_000_000;

    pub(crate) fn meta(namespace: Option<&str>, name: &str, age_seconds: i64) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: namespace.map(str::to_string),
            creation_timestamp: Some(Time(
                Timestamp::from_second(NOW - age_seconds).expect("valid timestamp"),
            )),
            ..Default::default()
        }
    }

    pub(crate) fn node(name: &str, addresses: &[&str]) -> Node {
        Node {
            metadata: meta(None, name, 3_600),
            status: Some(NodeStatus {
                conditions: Some(vec![
                    NodeCondition {
                        type_: "MemoryPressure".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                    NodeCondition {
                        type_: "Ready".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    },
                ]),
                addresses: Some(
                    addresses
                        .iter()
                        .map(|address| NodeAddress {
                            address: address.to_string(),
                            type_: "InternalIP".to_string(),
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub(crate) fn service(namespace: &str, name: &str) -> Service {
        Service {
            metadata: meta(Some(namespace), name, 120),
            spec: Some(ServiceSpec {
                cluster_ip: Some("10.0.0.10".to_string()),
                external_ips: Some(vec!["203.0.113.7".to_string()]),
                ports: Some(vec![
                    ServicePort {
                        name: Some("http".to_string()),
                        port: 80,
                        ..Default::default()
                    },
                    ServicePort {
                        name: Some("https".to_string()),
                        port: 443,
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            status: Some(ServiceStatus {
                load_balancer: Some(LoadBalancerStatus {
                    ingress: Some(vec![LoadBalancerIngress {
                        ip: Some("198.51.100.1".to_string()),
                        hostname: Some("lb.example.com".to_string()),
                        ..Default::default()
                    }]),
                }),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn deployment(namespace: &str, name: &str, available: i32, desired: i32) -> Deployment {
        Deployment {
            metadata: meta(Some(namespace), name, 86_400 * 3),
            spec: Some(DeploymentSpec {
                replicas: Some(desired),
                ..Default::default()
            }),
            status: Some(DeploymentStatus {
                available_replicas: Some(available),
                replicas: Some(desired),
                conditions: Some(vec![
                    DeploymentCondition {
                        type_: "Progressing".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    },
                    DeploymentCondition {
                        type_: "Available".to_string(),
                        status: "False".to_string(),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn pod(namespace: &str, name: &str, phase: &str, node: &str) -> Pod {
        Pod {
            metadata: meta(Some(namespace), name, 45),
            spec: Some(PodSpec {
                node_name: Some(node.to_string()),
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some(phase.to_string()),
                pod_ip: Some("10.1.0.5".to_string()),
                conditions: Some(vec![
                    PodCondition {
                        type_: "Initialized".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    },
                    PodCondition {
                        type_: "Ready".to_string(),
                        status: "True".to_string(),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
        }
    }

    fn texts(row: &Row) -> Vec<&str> {
        row.fields().iter().map(Field::text).collect()
    }

    fn with_ctx<R>(scope: &NamespaceScope, prefix: &str, run: impl FnOnce(&RowContext<'_>) -> R) -> R {
        let palette = Palette::default();
        let ctx = RowContext {
            scope,
            system_namespace: "kube-system",
            palette: &palette,
            node_prefix: prefix,
            now: Timestamp::from_second(NOW).expect("valid timestamp"),
        };
        run(&ctx)
    }

    #[test]
    fn age_formatting_matches_kubectl_buckets() {
        assert_eq!(short_human_duration(45), "45s");
        assert_eq!(short_human_duration(90), "1m");
        assert_eq!(short_human_duration(7_200), "2h");
        assert_eq!(short_human_duration(10 * 86_400), "10d");
        assert_eq!(short_human_duration(363 * 86_400), "363d");
        assert_eq!(short_human_duration(400 * 86_400), "1y");
        assert_eq!(short_human_duration(-1), "0s");
        assert_eq!(short_human_duration(-5), "<invalid>");
    }

    #[test]
    fn long_names_keep_head_and_five_char_tail() {
        let name = "checkout-api-7d9f8b6c5-x2k4q";
        let short = truncate_name(name);
        assert_eq!(short, "checkout-api...x2k4q");
        assert_eq!(short.chars().count(), 20);

        assert_eq!(truncate_name("abcdefghijklmnopqrs"), "abcdefghijklmnopqrs");
        assert_eq!(truncate_name("abcdefghijklmnopqrst"), "abcdefghijklmnopqrst");
    }

    #[test]
    fn truncation_starts_one_past_the_limit() {
        assert_eq!(truncate_name("abcdefghijklmnopqrstu"), "abcdefghijkl...qrstu");
        let short = truncate_name("abcdefghijklmnopqrstuvwxy");
        assert_eq!(short, "abcdefghijkl...uvwxy");
        assert_eq!(short.chars().count(), 20);
    }

    #[test]
    fn sub_second_skew_in_the_future_reads_as_now() {
        let created = |offset: i64| Time(Timestamp::from_second(NOW + offset).expect("valid timestamp"));
        let now = Timestamp::new(NOW, 600_000_000).expect("valid timestamp");

        assert_eq!(created_age(Some(&created(2)), now), "0s");
        assert_eq!(created_age(Some(&created(1)), now), "0s");
        assert_eq!(created_age(Some(&created(3)), now), "<invalid>");
        assert_eq!(created_age(Some(&created(-45)), now), "45s");
        assert_eq!(created_age(None, now), "");
    }

    #[test]
    fn common_prefix_covers_whole_set() {
        let names = ["node-a2", "node-a10", "node-a1", "node-b7"];
        let prefix = common_prefix(&names);
        assert_eq!(prefix, "node-");
        assert!(names.iter().all(|name| name.starts_with(&prefix)));

        assert_eq!(common_prefix(&["node-a1", "node-a2"]), "node-a");
        assert_eq!(common_prefix(&["alpha", "beta"]), "");
        assert_eq!(common_prefix::<&str>(&[]), "");
        assert_eq!(common_prefix(&["worker-1", "worker-1"]), "worker-1");
    }

    mod prefix_properties {
        use super::common_prefix;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prefix_starts_every_name(names in prop::collection::vec("[a-c]{0,3}-?[0-9]{0,2}", 0..12)) {
                let prefix = common_prefix(&names);
                for name in &names {
                    prop_assert!(name.starts_with(&prefix));
                }
            }

            #[test]
            fn prefix_cannot_grow_by_one_more_char(names in prop::collection::vec("node-[ab][0-9]{1,2}", 2..8)) {
                let prefix = common_prefix(&names);
                let next = names[0][prefix.len()..].chars().next();
                if let Some(next) = next {
                    let longer = format!("{prefix}{next}");
                    prop_assert!(!names.iter().all(|name| name.starts_with(&longer)));
                }
            }
        }
    }

    #[test]
    fn common_prefix_of_single_name_is_the_name() {
        assert_eq!(common_prefix(&["only-node"]), "only-node");
    }

    #[test]
    fn status_line_keeps_true_conditions_in_api_order() {
        let line = status_line(
            Some("Running"),
            [("Ready", "True"), ("Scheduled", "False"), ("Initialized", "True")],
        );
        assert_eq!(line, "Running Ready Initialized");
        assert_eq!(status_line(None, [("Ready", "True")]), "Ready");
    }

    #[test]
    fn node_rows_dedup_addresses_and_ignore_system_namespace_rule() {
        let nodes = vec![node("node-a1", &["10.0.0.1", "node-a1", "10.0.0.1"])];
        let rows = with_ctx(&NamespaceScope::All, "", |ctx| node_rows(&nodes, ctx));
        assert_eq!(rows.len(), 1);
        assert_eq!(
            texts(&rows[0]),
            vec!["[node]", "", "node-a1", "Ready", "", "10.0.0.1 node-a1", "1h"]
        );
        assert!(rows[0].fields().iter().all(|field| field.tint() == Tint::Yellow));
    }

    #[test]
    fn namespace_filter_hides_cluster_scoped_nodes() {
        let nodes = vec![node("node-a1", &[])];
        let scope = NamespaceScope::Named("team-a".to_string());
        let rows = with_ctx(&scope, "", |ctx| node_rows(&nodes, ctx));
        assert!(rows.is_empty());
    }

    #[test]
    fn service_rows_join_addresses_and_ports() {
        let services = vec![service("shop", "frontend"), service("kube-system", "kube-dns")];
        let rows = with_ctx(&NamespaceScope::All, "", |ctx| service_rows(&services, ctx));
        assert_eq!(rows.len(), 1);
        assert_eq!(
            texts(&rows[0]),
            vec![
                "[svc]",
                "shop",
                "frontend",
                "198.51.100.1 lb.example.com",
                "",
                "203.0.113.7 10.0.0.10 http https",
                "2m",
            ]
        );
    }

    #[test]
    fn deployment_rows_flag_missing_replicas() {
        let deployments = vec![
            deployment("shop", "cart", 1, 2),
            deployment("shop", "catalog", 3, 3),
        ];
        let rows = with_ctx(&NamespaceScope::All, "", |ctx| deployment_rows(&deployments, ctx));
        assert_eq!(rows[0].fields()[3].text(), "1/2/2 Progressing");
        assert_eq!(rows[0].fields()[3].tint(), Tint::Red);
        assert_eq!(rows[0].fields()[0].tint(), Tint::Magenta);
        assert_eq!(rows[1].fields()[3].tint(), Tint::Magenta);
        assert_eq!(rows[1].fields()[6].text(), "3d");
    }

    #[test]
    fn pod_rows_shorten_node_and_color_by_phase() {
        let pods = vec![
            pod("shop", "checkout-api-7d9f8b6c5-x2k4q", "Running", "node-a1"),
            pod("shop", "migrate", "Pending", "node-a2"),
            pod("kube-system", "coredns", "Running", "node-a1"),
        ];
        let rows = with_ctx(&NamespaceScope::All, "node-a", |ctx| pod_rows(&pods, ctx));
        assert_eq!(rows.len(), 2);
        assert_eq!(
            texts(&rows[0]),
            vec![
                "[pod]",
                "shop",
                "checkout-api...x2k4q",
                "Running Initialized Ready",
                "1",
                "10.1.0.5",
                "45s",
            ]
        );
        assert_eq!(rows[0].fields()[3].tint(), Tint::Cyan);
        assert_eq!(rows[1].fields()[3].tint(), Tint::Red);
        assert_eq!(rows[1].fields()[4].text(), "2");
    }

    #[test]
    fn every_builder_emits_seven_fields() {
        let scope = NamespaceScope::All;
        let rows = with_ctx(&scope, "", |ctx| {
            let mut rows = node_rows(&[node("n", &[])], ctx);
            rows.extend(service_rows(&[service("a", "s")], ctx));
            rows.extend(deployment_rows(&[deployment("a", "d", 0, 1)], ctx));
            rows.extend(pod_rows(&[pod("a", "p", "Failed", "n")], ctx));
            rows
        });
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.len() == crate::model::HEADER.len()));
    }
}
