//! Broker and fleet configuration structures.

use std::collections::{BTreeSet, HashMap};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, PolicyKind, Worker};
use crate::util::serde::{DatacenterId, UtilizationProfile};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "PROMETHEUS_BROKER_CONFIG";

const fn default_max_provisioning_rounds() -> u32 {
    3
}

/// Configuration of one tenant's broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Tenant name, used in logs and audit records.
    pub tenant: String,
    /// Active load-balancing policy.
    pub policy: PolicyKind,
    /// Workers to provision, with their hardware.
    pub workers: Vec<Worker>,
    /// Provisioned count at which `AllWorkersProvisioned` fires; defaults to
    /// every configured worker.
    #[serde(default)]
    pub expected_workers: Option<usize>,
    /// Datacenters managed by this broker.
    pub datacenters: Vec<DatacenterId>,
    /// Work items created up front.
    #[serde(default)]
    pub initial_work_count: usize,
    /// Length of the initial work items.
    pub work_length: u64,
    /// Fixed length of regenerated work; no regeneration when absent.
    #[serde(default)]
    pub regeneration_length: Option<u64>,
    /// Utilization descriptors for generated work.
    #[serde(default)]
    pub utilization: UtilizationProfile,
    /// Provisioning rounds attempted before dispatching with a partial fleet.
    #[serde(default = "default_max_provisioning_rounds")]
    pub max_provisioning_rounds: u32,
}

/// Root configuration: one broker per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Map of tenant name to broker configuration.
    pub brokers: HashMap<String, BrokerConfig>,
}

impl BrokerConfig {
    /// Minimal configuration for a tenant, policy and worker set. Every
    /// worker is expected; nothing is generated up front.
    pub fn new(
        tenant: impl Into<String>,
        policy: PolicyKind,
        workers: Vec<Worker>,
        datacenters: Vec<DatacenterId>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            policy,
            workers,
            expected_workers: None,
            datacenters,
            initial_work_count: 0,
            work_length: 1000,
            regeneration_length: None,
            utilization: UtilizationProfile::default(),
            max_provisioning_rounds: default_max_provisioning_rounds(),
        }
    }

    /// Set the initial workload.
    #[must_use]
    pub fn with_initial_work(mut self, count: usize, length: u64) -> Self {
        self.initial_work_count = count;
        self.work_length = length;
        self
    }

    /// Regenerate a finished item with this fixed length.
    #[must_use]
    pub fn with_regeneration(mut self, length: u64) -> Self {
        self.regeneration_length = Some(length);
        self
    }

    /// Override the expected worker count.
    #[must_use]
    pub fn with_expected_workers(mut self, count: usize) -> Self {
        self.expected_workers = Some(count);
        self
    }

    /// Override the provisioning round budget.
    #[must_use]
    pub fn with_max_provisioning_rounds(mut self, rounds: u32) -> Self {
        self.max_provisioning_rounds = rounds;
        self
    }

    /// Provisioned count at which the fleet is complete.
    #[must_use]
    pub fn expected_worker_count(&self) -> usize {
        self.expected_workers.unwrap_or(self.workers.len())
    }

    /// Validate broker configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.tenant.trim().is_empty() {
            return Err("tenant must not be empty".into());
        }
        if self.workers.is_empty() {
            return Err("at least one worker must be defined".into());
        }
        let mut seen = BTreeSet::new();
        for worker in &self.workers {
            if !seen.insert(worker.id) {
                return Err(format!("duplicate worker id {}", worker.id));
            }
            if !worker.hardware.is_positive() {
                return Err(format!("worker {} hardware must be positive", worker.id));
            }
        }
        let expected = self.expected_worker_count();
        if expected == 0 || expected > self.workers.len() {
            return Err(format!(
                "expected_workers must be between 1 and {}",
                self.workers.len()
            ));
        }
        if self.datacenters.is_empty() {
            return Err("at least one datacenter must be defined".into());
        }
        let unique: BTreeSet<_> = self.datacenters.iter().collect();
        if unique.len() != self.datacenters.len() {
            return Err("datacenter ids must be unique".into());
        }
        if self.work_length == 0 {
            return Err("work_length must be greater than 0".into());
        }
        if self.regeneration_length == Some(0) {
            return Err("regeneration_length must be greater than 0".into());
        }
        if self.max_provisioning_rounds == 0 {
            return Err("max_provisioning_rounds must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse broker configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

impl FleetConfig {
    /// Validate all brokers and ensure at least one exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.brokers.is_empty() {
            return Err("at least one broker must be defined".into());
        }
        for (name, broker) in &self.brokers {
            broker
                .validate()
                .map_err(|e| format!("broker `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse fleet configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Load a broker configuration from the file named by
/// `PROMETHEUS_BROKER_CONFIG`, reading `.env` first if present.
pub fn load_from_env() -> AppResult<BrokerConfig> {
    let _ = dotenvy::dotenv();
    let path = std::env::var(CONFIG_PATH_ENV).with_context(|| format!("{CONFIG_PATH_ENV} is not set"))?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    BrokerConfig::from_json_str(&raw).map_err(|e| anyhow::anyhow!("{path}: {e}"))
}
