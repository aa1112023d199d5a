//! Typed configuration document for the engine's constructors.
//!
//! The engine's config-string constructors accept a JSON document. The
//! bridge never parses that document — it is opaque cargo across the
//! boundary — but building it by hand is error-prone, so this module offers
//! a typed, serializable form. Optional fields are omitted from the output
//! entirely rather than serialized as null, which is what the engine
//! expects.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::BridgeResult;

/// Configuration document for [`Factory::from_config`](crate::Factory) and
/// [`raw::apply_config`](crate::raw::apply_config).
///
/// ```
/// use veil_bridge::Config;
///
/// let json = Config::new("checkout", "billing")
///     .with_metastore("rdbms")
///     .with_connection_string("postgres://meta")
///     .to_json()
///     .unwrap();
/// assert!(json.contains("\"ServiceName\":\"checkout\""));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    #[serde(rename = "ServiceName")]
    pub service_name: String,
    #[serde(rename = "ProductID")]
    pub product_id: String,
    /// Metastore backend selector, e.g. `memory`, `rdbms`, `dynamodb`.
    #[serde(rename = "Metastore")]
    pub metastore: String,
    /// Key-management backend selector, e.g. `static`, `aws`.
    #[serde(rename = "KMS")]
    pub kms: String,
    #[serde(rename = "ConnectionString", skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(
        rename = "ReplicaReadConsistency",
        skip_serializing_if = "Option::is_none"
    )]
    pub replica_read_consistency: Option<String>,
    #[serde(rename = "DynamoDBEndpoint", skip_serializing_if = "Option::is_none")]
    pub dynamodb_endpoint: Option<String>,
    #[serde(rename = "DynamoDBRegion", skip_serializing_if = "Option::is_none")]
    pub dynamodb_region: Option<String>,
    #[serde(rename = "DynamoDBTableName", skip_serializing_if = "Option::is_none")]
    pub dynamodb_table_name: Option<String>,
    #[serde(rename = "EnableRegionSuffix", skip_serializing_if = "Option::is_none")]
    pub enable_region_suffix: Option<bool>,
    #[serde(rename = "RegionMap", skip_serializing_if = "Option::is_none")]
    pub region_map: Option<BTreeMap<String, String>>,
    #[serde(rename = "PreferredRegion", skip_serializing_if = "Option::is_none")]
    pub preferred_region: Option<String>,
    /// Key lifetime in seconds before rotation.
    #[serde(rename = "ExpireAfter", skip_serializing_if = "Option::is_none")]
    pub expire_after: Option<i64>,
    /// Cached-key revalidation interval in seconds.
    #[serde(rename = "CheckInterval", skip_serializing_if = "Option::is_none")]
    pub check_interval: Option<i64>,
    #[serde(
        rename = "EnableSessionCaching",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_session_caching: Option<bool>,
    #[serde(rename = "SessionCacheMaxSize", skip_serializing_if = "Option::is_none")]
    pub session_cache_max_size: Option<i64>,
    #[serde(
        rename = "SessionCacheDuration",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_cache_duration: Option<i64>,
    #[serde(rename = "Verbose", skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl Config {
    /// A minimal configuration: in-memory metastore, static KMS. Every other
    /// field starts unset.
    pub fn new(service_name: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            product_id: product_id.into(),
            metastore: "memory".to_string(),
            kms: "static".to_string(),
            connection_string: None,
            replica_read_consistency: None,
            dynamodb_endpoint: None,
            dynamodb_region: None,
            dynamodb_table_name: None,
            enable_region_suffix: None,
            region_map: None,
            preferred_region: None,
            expire_after: None,
            check_interval: None,
            enable_session_caching: None,
            session_cache_max_size: None,
            session_cache_duration: None,
            verbose: None,
        }
    }

    pub fn with_metastore(mut self, metastore: impl Into<String>) -> Self {
        self.metastore = metastore.into();
        self
    }

    pub fn with_kms(mut self, kms: impl Into<String>) -> Self {
        self.kms = kms.into();
        self
    }

    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    pub fn with_dynamodb(
        mut self,
        endpoint: impl Into<String>,
        region: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        self.dynamodb_endpoint = Some(endpoint.into());
        self.dynamodb_region = Some(region.into());
        self.dynamodb_table_name = Some(table_name.into());
        self
    }

    pub fn with_region_map(mut self, region_map: BTreeMap<String, String>) -> Self {
        self.region_map = Some(region_map);
        self
    }

    pub fn with_preferred_region(mut self, region: impl Into<String>) -> Self {
        self.preferred_region = Some(region.into());
        self
    }

    pub fn with_key_rotation(mut self, expire_after: i64, check_interval: i64) -> Self {
        self.expire_after = Some(expire_after);
        self.check_interval = Some(check_interval);
        self
    }

    pub fn with_session_cache(mut self, max_size: i64, duration: i64) -> Self {
        self.enable_session_caching = Some(true);
        self.session_cache_max_size = Some(max_size);
        self.session_cache_duration = Some(duration);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Serializes into the JSON document the engine's constructors accept.
    pub fn to_json(&self) -> BridgeResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
