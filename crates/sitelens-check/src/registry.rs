//! In-memory check registry.
//!
//! The registry holds the set of runnable checks as uniform trait objects
//! so the orchestrator needs no compile-time knowledge of each check.

use crate::{
    contract::Check,
    error::{CheckError, Result},
};
use sitelens_core::{AuditConfig, CheckId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// A fallible constructor for one check.
///
/// Factories replace filesystem discovery: the built-in check set is an
/// explicit list of these, and a factory that errors is skipped with a
/// warning rather than aborting registration of the rest.
pub type CheckFactory = Box<dyn Fn(&AuditConfig) -> Result<Arc<dyn Check>> + Send + Sync>;

/// In-memory cache of registered checks, indexed by check ID.
#[derive(Clone)]
pub struct CheckRegistry {
    checks: Arc<RwLock<HashMap<CheckId, Arc<dyn Check>>>>,
}

impl CheckRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            checks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a registry by running every factory against the given config.
    ///
    /// A factory that fails is logged and excluded — load failure of one
    /// check never aborts discovery of the rest. An empty factory list
    /// yields a valid empty registry.
    #[must_use]
    pub fn load_from(config: &AuditConfig, factories: &[CheckFactory]) -> Self {
        let registry = Self::new();

        for factory in factories {
            match factory(config) {
                Ok(check) => {
                    let check_id = check.descriptor().id().clone();
                    if let Err(e) = registry.register(check) {
                        warn!(check_id = %check_id, error = %e, "skipping check");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to construct check, skipping");
                }
            }
        }

        info!(count = registry.count(), "loaded validation checks");

        registry
    }

    /// Register one check.
    ///
    /// # Errors
    /// Returns error if a check with the same ID is already registered.
    pub fn register(&self, check: Arc<dyn Check>) -> Result<()> {
        let check_id = check.descriptor().id().clone();

        let mut cache = self.checks.write().expect("acquire write lock on checks");

        if cache.contains_key(&check_id) {
            return Err(CheckError::Duplicate {
                check_id: check_id.to_string(),
            });
        }

        cache.insert(check_id.clone(), check);
        debug!(check_id = %check_id, "registered check");

        Ok(())
    }

    /// Get a check by ID.
    ///
    /// # Errors
    /// Returns error if the check is not found.
    pub fn get(&self, check_id: &CheckId) -> Result<Arc<dyn Check>> {
        let cache = self.checks.read().expect("acquire read lock on checks");

        cache
            .get(check_id)
            .cloned()
            .ok_or_else(|| CheckError::NotFound {
                check_id: check_id.to_string(),
            })
    }

    /// Get all registered checks.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<dyn Check>> {
        let cache = self.checks.read().expect("acquire read lock on checks");
        cache.values().cloned().collect()
    }

    /// Get all registered check IDs.
    #[must_use]
    pub fn ids(&self) -> Vec<CheckId> {
        let cache = self.checks.read().expect("acquire read lock on checks");
        cache.keys().cloned().collect()
    }

    /// The number of registered checks.
    #[must_use]
    pub fn count(&self) -> usize {
        let cache = self.checks.read().expect("acquire read lock on checks");
        cache.len()
    }

    /// Whether a check with the given ID is registered.
    #[must_use]
    pub fn contains(&self, check_id: &CheckId) -> bool {
        let cache = self.checks.read().expect("acquire read lock on checks");
        cache.contains_key(check_id)
    }

    /// Remove a check from the registry.
    ///
    /// Returns `true` if the check was present, `false` otherwise.
    pub fn remove(&self, check_id: &CheckId) -> bool {
        let mut cache = self.checks.write().expect("acquire write lock on checks");
        cache.remove(check_id).is_some()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{CheckContext, CheckDescriptor, CheckParam};
    use async_trait::async_trait;
    use sitelens_core::{CheckOutcome, Verdict};

    struct StubCheck {
        descriptor: CheckDescriptor,
    }

    impl StubCheck {
        fn arc(id: &str) -> Arc<dyn Check> {
            Arc::new(Self {
                descriptor: CheckDescriptor::new(
                    CheckId::new(id).expect("valid check ID"),
                    vec![CheckParam::Url],
                ),
            })
        }
    }

    #[async_trait]
    impl Check for StubCheck {
        fn descriptor(&self) -> &CheckDescriptor {
            &self.descriptor
        }

        async fn run(&self, _ctx: &CheckContext) -> CheckOutcome {
            CheckOutcome::new(self.descriptor.id().clone(), Verdict::Approved, "stub")
        }
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CheckRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.get_all().is_empty());
    }

    #[test]
    fn test_register_and_get() {
        let registry = CheckRegistry::new();
        registry
            .register(StubCheck::arc("http_status"))
            .expect("register check");

        let check_id = CheckId::new("http_status").expect("valid check ID");
        assert!(registry.contains(&check_id));

        let check = registry.get(&check_id).expect("get check");
        assert_eq!(check.descriptor().id(), &check_id);
    }

    #[test]
    fn test_register_duplicate_fails() {
        let registry = CheckRegistry::new();
        registry
            .register(StubCheck::arc("http_status"))
            .expect("register check");

        let result = registry.register(StubCheck::arc("http_status"));
        assert!(matches!(result, Err(CheckError::Duplicate { .. })));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = CheckRegistry::new();
        let check_id = CheckId::new("missing_check").expect("valid check ID");
        let result = registry.get(&check_id);
        assert!(matches!(result, Err(CheckError::NotFound { .. })));
    }

    #[test]
    fn test_remove() {
        let registry = CheckRegistry::new();
        registry
            .register(StubCheck::arc("http_status"))
            .expect("register check");

        let check_id = CheckId::new("http_status").expect("valid check ID");
        assert!(registry.remove(&check_id));
        assert!(!registry.remove(&check_id));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_load_from_skips_failing_factory() {
        let factories: Vec<CheckFactory> = vec![
            Box::new(|_| Ok(StubCheck::arc("good_check"))),
            Box::new(|_| {
                Err(CheckError::Construction {
                    reason: "missing dependency".to_string(),
                })
            }),
            Box::new(|_| Ok(StubCheck::arc("other_check"))),
        ];

        let registry = CheckRegistry::load_from(&AuditConfig::default(), &factories);
        assert_eq!(registry.count(), 2);
        assert!(registry.contains(&CheckId::new("good_check").expect("valid check ID")));
        assert!(registry.contains(&CheckId::new("other_check").expect("valid check ID")));
    }

    #[test]
    fn test_load_from_empty_factories() {
        let registry = CheckRegistry::load_from(&AuditConfig::default(), &[]);
        assert_eq!(registry.count(), 0);
    }
}
