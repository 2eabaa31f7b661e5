//! Builders to construct dispatch engines from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{BrokerConfig, FleetConfig};
use crate::core::{
    share_policy, AuditListener, AuditSink, BrokerError, DispatchEngine, LoadBalancingPolicy,
    SharedListener, SharedPolicy, SimulationGateway, WorkerTable,
};

type PolicyFactory = Box<dyn FnOnce(WorkerTable) -> (SharedPolicy, SharedListener) + Send>;

/// Step-by-step construction of a [`DispatchEngine`].
///
/// Extra listeners are subscribed after the worker-state and policy
/// listeners, before the initial workload is generated, so they observe every
/// backlog event.
pub struct BrokerBuilder {
    config: BrokerConfig,
    policy: Option<PolicyFactory>,
    listeners: Vec<SharedListener>,
}

impl BrokerBuilder {
    /// Start from a broker configuration.
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            policy: None,
            listeners: Vec::new(),
        }
    }

    /// Replace the configured built-in policy with a custom one built over
    /// the broker's worker table.
    #[must_use]
    pub fn with_policy<P, F>(mut self, factory: F) -> Self
    where
        P: LoadBalancingPolicy + 'static,
        F: FnOnce(WorkerTable) -> P + Send + 'static,
    {
        self.policy = Some(Box::new(move |table| share_policy(factory(table))));
        self
    }

    /// Subscribe an extra listener.
    #[must_use]
    pub fn with_listener(mut self, listener: SharedListener) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Audit every domain event into `sink`.
    #[must_use]
    pub fn with_audit_sink<S>(self, sink: S) -> Self
    where
        S: AuditSink + 'static,
    {
        let listener = AuditListener::new(self.config.tenant.clone(), sink);
        self.with_listener(Arc::new(Mutex::new(listener)))
    }

    /// Build the engine around `gateway`.
    pub fn build<G: SimulationGateway>(self, gateway: G) -> Result<DispatchEngine<G>, BrokerError> {
        let mut bare = self.config.clone();
        bare.initial_work_count = 0;

        let mut engine = match self.policy {
            Some(factory) => DispatchEngine::with_policy(&bare, gateway, factory)?,
            None => DispatchEngine::new(&bare, gateway)?,
        };
        for listener in self.listeners {
            engine.bus().subscribe(listener);
        }
        for _ in 0..self.config.initial_work_count {
            engine.add_work(self.config.work_length, self.config.utilization, None);
        }
        Ok(engine)
    }
}

/// Build one broker per tenant of a fleet configuration.
pub fn build_brokers<G, FG>(
    cfg: &FleetConfig,
    mut gateway_factory: FG,
) -> Result<HashMap<String, DispatchEngine<G>>, BrokerError>
where
    G: SimulationGateway,
    FG: FnMut(&str, &BrokerConfig) -> Result<G, BrokerError>,
{
    cfg.validate().map_err(BrokerError::InvalidConfig)?;

    let mut brokers = HashMap::new();
    for (name, broker_cfg) in &cfg.brokers {
        let gateway = gateway_factory(name, broker_cfg)?;
        let engine = BrokerBuilder::new(broker_cfg.clone()).build(gateway)?;
        tracing::info!("built broker for tenant {}", name);
        brokers.insert(name.clone(), engine);
    }

    Ok(brokers)
}
