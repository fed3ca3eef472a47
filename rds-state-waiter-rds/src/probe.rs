//! Status probers backed by the RDS Describe* APIs.
//!
//! Each prober performs one describe call. "Not found" service errors and
//! empty result lists become [`Observation::Absent`]; throttling and
//! transport failures are transient; anything else is fatal.

use crate::status::CLUSTER_ROLE_STATUS_DELETED;
use async_trait::async_trait;
use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_rds::types::{
    ActivityStreamStatus, DbCluster, DbClusterRole, DbInstance, DbProxyEndpoint,
    DbProxyEndpointStatus, EventSubscription,
};
use aws_sdk_rds::Client as RdsClient;
use rds_state_waiter_engine::{Observation, ProbeError, StatusProber};
use std::fmt;

const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottled",
    "RequestThrottledException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

const DB_INSTANCE_NOT_FOUND: &[&str] = &["DBInstanceNotFound", "DBInstanceNotFoundFault"];
const DB_CLUSTER_NOT_FOUND: &[&str] = &["DBClusterNotFoundFault"];
const EVENT_SUBSCRIPTION_NOT_FOUND: &[&str] = &["SubscriptionNotFound", "SubscriptionNotFoundFault"];
const DB_PROXY_ENDPOINT_NOT_FOUND: &[&str] =
    &["DBProxyEndpointNotFoundFault", "DBProxyNotFoundFault"];

/// How a service error code affects the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorClass {
    NotFound,
    Retry,
    Fatal,
}

pub(crate) fn classify_code(code: Option<&str>, not_found: &[&str]) -> ErrorClass {
    match code {
        Some(code) if not_found.contains(&code) => ErrorClass::NotFound,
        Some(code) if THROTTLING_CODES.contains(&code) => ErrorClass::Retry,
        _ => ErrorClass::Fatal,
    }
}

fn classify_sdk_error<T, E, R>(
    operation: &str,
    err: SdkError<E, R>,
    not_found: &[&str],
) -> Result<Observation<T>, ProbeError>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug,
{
    let class = match &err {
        SdkError::ServiceError(_) => classify_code(
            err.as_service_error().and_then(|e| e.code()),
            not_found,
        ),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            ErrorClass::Retry
        }
        _ => ErrorClass::Fatal,
    };
    let message = format!("{operation} failed: {}", DisplayErrorContext(&err));
    match class {
        ErrorClass::NotFound => Ok(Observation::Absent),
        ErrorClass::Retry => Err(ProbeError::transient(message)),
        ErrorClass::Fatal => Err(ProbeError::fatal(message)),
    }
}

/// A found resource must carry a status; a missing one is treated as a
/// gap in eventual consistency and retried.
fn observe<T>(status: Option<&str>, value: T, what: &str) -> Result<Observation<T>, ProbeError> {
    match status {
        Some(status) => Ok(Observation::present(status, value)),
        None => Err(ProbeError::transient(format!("{what} has no status"))),
    }
}

/// Probes an event subscription by name.
pub struct EventSubscriptionProber {
    client: RdsClient,
    name: String,
}

impl EventSubscriptionProber {
    pub fn new(client: RdsClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

#[async_trait]
impl StatusProber for EventSubscriptionProber {
    type Output = EventSubscription;

    async fn probe(&self) -> Result<Observation<EventSubscription>, ProbeError> {
        let output = match self
            .client
            .describe_event_subscriptions()
            .subscription_name(&self.name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                return classify_sdk_error(
                    "DescribeEventSubscriptions",
                    err,
                    EVENT_SUBSCRIPTION_NOT_FOUND,
                )
            }
        };

        match output.event_subscriptions_list().first() {
            Some(subscription) => observe(
                subscription.status(),
                subscription.clone(),
                "RDS event subscription",
            ),
            None => Ok(Observation::Absent),
        }
    }
}

/// Probes a DB proxy endpoint by name.
pub struct DbProxyEndpointProber {
    client: RdsClient,
    name: String,
}

impl DbProxyEndpointProber {
    pub fn new(client: RdsClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }
}

#[async_trait]
impl StatusProber for DbProxyEndpointProber {
    type Output = DbProxyEndpoint;

    async fn probe(&self) -> Result<Observation<DbProxyEndpoint>, ProbeError> {
        let output = match self
            .client
            .describe_db_proxy_endpoints()
            .db_proxy_endpoint_name(&self.name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                return classify_sdk_error(
                    "DescribeDBProxyEndpoints",
                    err,
                    DB_PROXY_ENDPOINT_NOT_FOUND,
                )
            }
        };

        match output.db_proxy_endpoints().first() {
            Some(endpoint) => observe(
                endpoint.status().map(DbProxyEndpointStatus::as_str),
                endpoint.clone(),
                "RDS DB proxy endpoint",
            ),
            None => Ok(Observation::Absent),
        }
    }
}

/// Probes the association of an IAM role with a DB cluster.
pub struct DbClusterRoleProber {
    client: RdsClient,
    cluster_identifier: String,
    role_arn: String,
}

impl DbClusterRoleProber {
    pub fn new(
        client: RdsClient,
        cluster_identifier: impl Into<String>,
        role_arn: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cluster_identifier: cluster_identifier.into(),
            role_arn: role_arn.into(),
        }
    }
}

#[async_trait]
impl StatusProber for DbClusterRoleProber {
    type Output = DbClusterRole;

    async fn probe(&self) -> Result<Observation<DbClusterRole>, ProbeError> {
        let output = match self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(&self.cluster_identifier)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => return classify_sdk_error("DescribeDBClusters", err, DB_CLUSTER_NOT_FOUND),
        };

        let role = output.db_clusters().first().and_then(|cluster| {
            cluster
                .associated_roles()
                .iter()
                .find(|role| role.role_arn() == Some(self.role_arn.as_str()))
        });
        observe_role(role)
    }
}

/// A role RDS still lists as `DELETED` has been detached.
fn observe_role(role: Option<&DbClusterRole>) -> Result<Observation<DbClusterRole>, ProbeError> {
    match role {
        Some(role) if role.status() == Some(CLUSTER_ROLE_STATUS_DELETED) => {
            Ok(Observation::Absent)
        }
        Some(role) => observe(role.status(), role.clone(), "RDS DB cluster role"),
        None => Ok(Observation::Absent),
    }
}

/// Probes a DB instance by identifier.
pub struct DbInstanceProber {
    client: RdsClient,
    identifier: String,
}

impl DbInstanceProber {
    pub fn new(client: RdsClient, identifier: impl Into<String>) -> Self {
        Self {
            client,
            identifier: identifier.into(),
        }
    }
}

#[async_trait]
impl StatusProber for DbInstanceProber {
    type Output = DbInstance;

    async fn probe(&self) -> Result<Observation<DbInstance>, ProbeError> {
        let output = match self
            .client
            .describe_db_instances()
            .db_instance_identifier(&self.identifier)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                return classify_sdk_error("DescribeDBInstances", err, DB_INSTANCE_NOT_FOUND)
            }
        };

        match output.db_instances().first() {
            Some(instance) => observe(
                instance.db_instance_status(),
                instance.clone(),
                "RDS DB instance",
            ),
            None => Ok(Observation::Absent),
        }
    }
}

/// Probes the database activity stream of a DB cluster.
pub struct ActivityStreamProber {
    client: RdsClient,
    cluster_identifier: String,
}

impl ActivityStreamProber {
    pub fn new(client: RdsClient, cluster_identifier: impl Into<String>) -> Self {
        Self {
            client,
            cluster_identifier: cluster_identifier.into(),
        }
    }
}

#[async_trait]
impl StatusProber for ActivityStreamProber {
    type Output = DbCluster;

    async fn probe(&self) -> Result<Observation<DbCluster>, ProbeError> {
        let output = match self
            .client
            .describe_db_clusters()
            .db_cluster_identifier(&self.cluster_identifier)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => return classify_sdk_error("DescribeDBClusters", err, DB_CLUSTER_NOT_FOUND),
        };

        match output.db_clusters().first() {
            Some(cluster) => observe(
                cluster.activity_stream_status().map(ActivityStreamStatus::as_str),
                cluster.clone(),
                "RDS DB cluster activity stream",
            ),
            None => Ok(Observation::Absent),
        }
    }
}
