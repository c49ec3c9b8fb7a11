//! Named-breaker registry.
//!
//! One [`BreakerRegistry`] per process scope. It is an explicit dependency
//! passed to whatever needs breakers — never a module-level global — so
//! tests can instantiate isolated registries.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use haulsense_core::metric_names::{BREAKER_DATABASE, BREAKER_EXTERNAL_API, BREAKER_ML_MODEL};
use haulsense_core::{Clock, CoreError, MetricsSink, SystemClock, TracingSink};

use crate::breaker::{BreakerConfig, BreakerStats, CircuitBreaker};

/// Creates and retrieves circuit breakers by dependency name.
///
/// Breakers are created lazily on first request and live for the registry's
/// lifetime. The registry lock is only held while looking up or inserting an
/// `Arc`; breakers for different names never share a lock.
pub struct BreakerRegistry {
    clock: Arc<dyn Clock>,
    sink: Arc<dyn MetricsSink>,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TracingSink))
    }
}

impl BreakerRegistry {
    /// Create a registry whose breakers share the given clock and sink.
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            clock,
            sink,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Get the breaker for `name`, creating it with `config` if it does not
    /// exist yet. The config of an existing breaker is left untouched.
    pub fn get_or_create(
        &self,
        name: &str,
        config: BreakerConfig,
    ) -> Result<Arc<CircuitBreaker>, CoreError> {
        if let Some(breaker) = self.get(name) {
            return Ok(breaker);
        }

        let mut breakers = self.breakers.write().expect("registry lock poisoned");
        // Double-check: another caller may have created it while we waited
        // for the write lock.
        if let Some(breaker) = breakers.get(name) {
            return Ok(Arc::clone(breaker));
        }
        let breaker = Arc::new(CircuitBreaker::new(
            name,
            config,
            Arc::clone(&self.clock),
            Arc::clone(&self.sink),
        )?);
        breakers.insert(name.to_string(), Arc::clone(&breaker));
        tracing::debug!(breaker = name, "Created circuit breaker");
        Ok(breaker)
    }

    /// The breaker for `name`, if one has been created.
    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .map(Arc::clone)
    }

    /// The breaker guarding the ML model dependency, with its preset config.
    pub fn ml_model(&self) -> Result<Arc<CircuitBreaker>, CoreError> {
        self.get_or_create(BREAKER_ML_MODEL, BreakerConfig::ml_model())
    }

    /// The breaker guarding the database dependency, with its preset config.
    pub fn database(&self) -> Result<Arc<CircuitBreaker>, CoreError> {
        self.get_or_create(BREAKER_DATABASE, BreakerConfig::database())
    }

    /// The breaker guarding external API calls, with its preset config.
    pub fn external_api(&self) -> Result<Arc<CircuitBreaker>, CoreError> {
        self.get_or_create(BREAKER_EXTERNAL_API, BreakerConfig::external_api())
    }

    /// Snapshot of every registered breaker, keyed by name.
    pub fn all_stats(&self) -> HashMap<String, BreakerStats> {
        self.breakers
            .read()
            .expect("registry lock poisoned")
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.stats()))
            .collect()
    }

    /// Reset one breaker. Returns `false` if no breaker with that name exists.
    pub fn reset(&self, name: &str) -> bool {
        match self.get(name) {
            Some(breaker) => {
                breaker.reset();
                true
            }
            None => false,
        }
    }

    /// Reset every registered breaker.
    pub fn reset_all(&self) {
        let breakers: Vec<_> = self
            .breakers
            .read()
            .expect("registry lock poisoned")
            .values()
            .map(Arc::clone)
            .collect();
        for breaker in breakers {
            breaker.reset();
        }
    }
}
