//! RDS waiter service layer
//!
//! Holds an already-configured RDS client and exposes one method per
//! supported transition. Each method pairs a [`Transition`] table entry with
//! the matching SDK prober and runs the shared engine.

use crate::error::ActivityStreamError;
use crate::probe::{
    ActivityStreamProber, DbClusterRoleProber, DbInstanceProber, DbProxyEndpointProber,
    EventSubscriptionProber,
};
use crate::transitions::{
    wait_for, wait_for_activity_stream, Transition, ACTIVITY_STREAM_STARTED,
    ACTIVITY_STREAM_STOPPED, CLUSTER_ROLE_ASSOCIATION_CREATED,
    CLUSTER_ROLE_ASSOCIATION_CREATED_TIMEOUT, CLUSTER_ROLE_ASSOCIATION_DELETED,
    CLUSTER_ROLE_ASSOCIATION_DELETED_TIMEOUT, DB_CLUSTER_INSTANCE_DELETED, DB_INSTANCE_DELETED,
    EVENT_SUBSCRIPTION_CREATED, EVENT_SUBSCRIPTION_DELETED, EVENT_SUBSCRIPTION_UPDATED,
    PROXY_ENDPOINT_AVAILABLE, PROXY_ENDPOINT_DELETED,
};
use aws_sdk_rds::types::{
    DbCluster, DbClusterRole, DbInstance, DbProxyEndpoint, EventSubscription,
};
use aws_sdk_rds::Client as RdsClient;
use rds_state_waiter_engine::{PollPolicy, StatusProber, WaitResult};
use std::time::Duration;

/// Waits on RDS resource transitions using a shared SDK client.
#[derive(Debug, Clone)]
pub struct RdsWaiter {
    client: RdsClient,
    policy: Option<PollPolicy>,
}

impl RdsWaiter {
    pub fn new(client: RdsClient) -> Self {
        Self {
            client,
            policy: None,
        }
    }

    /// Create a waiter from an already-loaded SDK configuration.
    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(RdsClient::new(config))
    }

    /// Create a waiter using the default credential provider chain.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::from_conf(&config)
    }

    /// Override the built-in timings of every wait with `policy`.
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn client(&self) -> &RdsClient {
        &self.client
    }

    async fn run<P>(
        &self,
        transition: &Transition,
        prober: P,
        timeout: Duration,
    ) -> WaitResult<P::Output>
    where
        P: StatusProber,
    {
        wait_for(transition, &prober, timeout, self.policy.as_ref()).await
    }

    pub async fn event_subscription_created(
        &self,
        name: &str,
        timeout: Duration,
    ) -> WaitResult<EventSubscription> {
        let prober = EventSubscriptionProber::new(self.client.clone(), name);
        self.run(&EVENT_SUBSCRIPTION_CREATED, prober, timeout).await
    }

    pub async fn event_subscription_deleted(
        &self,
        name: &str,
        timeout: Duration,
    ) -> WaitResult<EventSubscription> {
        let prober = EventSubscriptionProber::new(self.client.clone(), name);
        self.run(&EVENT_SUBSCRIPTION_DELETED, prober, timeout).await
    }

    pub async fn event_subscription_updated(
        &self,
        name: &str,
        timeout: Duration,
    ) -> WaitResult<EventSubscription> {
        let prober = EventSubscriptionProber::new(self.client.clone(), name);
        self.run(&EVENT_SUBSCRIPTION_UPDATED, prober, timeout).await
    }

    pub async fn db_proxy_endpoint_available(
        &self,
        name: &str,
        timeout: Duration,
    ) -> WaitResult<DbProxyEndpoint> {
        let prober = DbProxyEndpointProber::new(self.client.clone(), name);
        self.run(&PROXY_ENDPOINT_AVAILABLE, prober, timeout).await
    }

    pub async fn db_proxy_endpoint_deleted(
        &self,
        name: &str,
        timeout: Duration,
    ) -> WaitResult<DbProxyEndpoint> {
        let prober = DbProxyEndpointProber::new(self.client.clone(), name);
        self.run(&PROXY_ENDPOINT_DELETED, prober, timeout).await
    }

    pub async fn db_cluster_role_association_created(
        &self,
        cluster_identifier: &str,
        role_arn: &str,
    ) -> WaitResult<DbClusterRole> {
        let prober = DbClusterRoleProber::new(self.client.clone(), cluster_identifier, role_arn);
        self.run(
            &CLUSTER_ROLE_ASSOCIATION_CREATED,
            prober,
            CLUSTER_ROLE_ASSOCIATION_CREATED_TIMEOUT,
        )
        .await
    }

    pub async fn db_cluster_role_association_deleted(
        &self,
        cluster_identifier: &str,
        role_arn: &str,
    ) -> WaitResult<DbClusterRole> {
        let prober = DbClusterRoleProber::new(self.client.clone(), cluster_identifier, role_arn);
        self.run(
            &CLUSTER_ROLE_ASSOCIATION_DELETED,
            prober,
            CLUSTER_ROLE_ASSOCIATION_DELETED_TIMEOUT,
        )
        .await
    }

    pub async fn db_instance_deleted(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> WaitResult<DbInstance> {
        let prober = DbInstanceProber::new(self.client.clone(), identifier);
        self.run(&DB_INSTANCE_DELETED, prober, timeout).await
    }

    pub async fn db_cluster_instance_deleted(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> WaitResult<DbInstance> {
        let prober = DbInstanceProber::new(self.client.clone(), identifier);
        self.run(&DB_CLUSTER_INSTANCE_DELETED, prober, timeout).await
    }

    pub async fn activity_stream_started(
        &self,
        cluster_identifier: &str,
        timeout: Duration,
    ) -> Result<(), ActivityStreamError> {
        let prober = ActivityStreamProber::new(self.client.clone(), cluster_identifier);
        wait_for_activity_stream(
            &ACTIVITY_STREAM_STARTED,
            &prober,
            cluster_identifier,
            timeout,
            self.policy.as_ref(),
        )
        .await
    }

    pub async fn activity_stream_stopped(
        &self,
        cluster_identifier: &str,
        timeout: Duration,
    ) -> Result<(), ActivityStreamError> {
        let prober = ActivityStreamProber::new(self.client.clone(), cluster_identifier);
        wait_for_activity_stream(
            &ACTIVITY_STREAM_STOPPED,
            &prober,
            cluster_identifier,
            timeout,
            self.policy.as_ref(),
        )
        .await
    }

    /// Wait for a DB cluster's activity stream without discarding the cluster.
    pub async fn activity_stream(
        &self,
        transition: &Transition,
        cluster_identifier: &str,
        timeout: Duration,
    ) -> WaitResult<DbCluster> {
        let prober = ActivityStreamProber::new(self.client.clone(), cluster_identifier);
        self.run(transition, prober, timeout).await
    }
}
