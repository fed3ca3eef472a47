//! RDS status vocabularies, as reported by the Describe* APIs.

pub const EVENT_SUBSCRIPTION_STATUS_ACTIVE: &str = "active";
pub const EVENT_SUBSCRIPTION_STATUS_CREATING: &str = "creating";
pub const EVENT_SUBSCRIPTION_STATUS_DELETING: &str = "deleting";
pub const EVENT_SUBSCRIPTION_STATUS_MODIFYING: &str = "modifying";

pub const CLUSTER_ROLE_STATUS_ACTIVE: &str = "ACTIVE";
pub const CLUSTER_ROLE_STATUS_DELETED: &str = "DELETED";
pub const CLUSTER_ROLE_STATUS_PENDING: &str = "PENDING";

pub const INSTANCE_STATUS_AVAILABLE: &str = "available";
pub const INSTANCE_STATUS_BACKING_UP: &str = "backing-up";
pub const INSTANCE_STATUS_CONFIGURING_ENHANCED_MONITORING: &str = "configuring-enhanced-monitoring";
pub const INSTANCE_STATUS_CONFIGURING_LOG_EXPORTS: &str = "configuring-log-exports";
pub const INSTANCE_STATUS_CREATING: &str = "creating";
pub const INSTANCE_STATUS_DELETING: &str = "deleting";
pub const INSTANCE_STATUS_INCOMPATIBLE_PARAMETERS: &str = "incompatible-parameters";
pub const INSTANCE_STATUS_INCOMPATIBLE_RESTORE: &str = "incompatible-restore";
pub const INSTANCE_STATUS_MODIFYING: &str = "modifying";
pub const INSTANCE_STATUS_STARTING: &str = "starting";
pub const INSTANCE_STATUS_STOPPED: &str = "stopped";
pub const INSTANCE_STATUS_STOPPING: &str = "stopping";
pub const INSTANCE_STATUS_STORAGE_FULL: &str = "storage-full";
pub const INSTANCE_STATUS_STORAGE_OPTIMIZATION: &str = "storage-optimization";

pub const PROXY_ENDPOINT_STATUS_AVAILABLE: &str = "available";
pub const PROXY_ENDPOINT_STATUS_CREATING: &str = "creating";
pub const PROXY_ENDPOINT_STATUS_DELETING: &str = "deleting";
pub const PROXY_ENDPOINT_STATUS_INCOMPATIBLE_NETWORK: &str = "incompatible-network";
pub const PROXY_ENDPOINT_STATUS_INSUFFICIENT_RESOURCE_LIMITS: &str = "insufficient-resource-limits";
pub const PROXY_ENDPOINT_STATUS_MODIFYING: &str = "modifying";

pub const ACTIVITY_STREAM_STATUS_STARTED: &str = "started";
pub const ACTIVITY_STREAM_STATUS_STARTING: &str = "starting";
pub const ACTIVITY_STREAM_STATUS_STOPPED: &str = "stopped";
pub const ACTIVITY_STREAM_STATUS_STOPPING: &str = "stopping";
