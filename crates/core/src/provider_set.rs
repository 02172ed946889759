use std::sync::Arc;

use ctxflow_context::ContextProvider;

/// An insertion-ordered set of context providers.
///
/// Membership is by provider identity, not by value: the same `Arc`
/// can be held only once, while two separately-created providers with
/// equal fragments are distinct members. The merger does not assume
/// any meaning in the order, but iteration is stable (insertion
/// order), which is what breaks priority ties deterministically.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn ContextProvider>>,
}

impl ProviderSet {
    /// Creates an empty set.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider to the set.
    ///
    /// Returns `false` when the provider is already a member.
    pub fn insert(&mut self, provider: Arc<dyn ContextProvider>) -> bool {
        if self.contains(&provider) {
            return false;
        }
        self.providers.push(provider);
        true
    }

    /// Removes a provider from the set.
    ///
    /// Returns `false` when the provider is not a member.
    pub fn remove(&mut self, provider: &Arc<dyn ContextProvider>) -> bool {
        let before = self.providers.len();
        self.providers.retain(|p| !Arc::ptr_eq(p, provider));
        self.providers.len() != before
    }

    /// Returns whether the provider is a member of the set.
    #[inline]
    pub fn contains(&self, provider: &Arc<dyn ContextProvider>) -> bool {
        self.providers.iter().any(|p| Arc::ptr_eq(p, provider))
    }

    /// Iterates the providers in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContextProvider>> {
        self.providers.iter()
    }

    /// Returns the number of providers in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns whether the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use ctxflow_context::ContextFragment;
    use ctxflow_testkit::StaticProvider;

    use super::*;

    #[test]
    fn test_identity_membership() {
        let a: Arc<dyn ContextProvider> =
            Arc::new(StaticProvider::new(ContextFragment::new()));
        let b: Arc<dyn ContextProvider> =
            Arc::new(StaticProvider::new(ContextFragment::new()));

        let mut set = ProviderSet::new();
        assert!(set.insert(Arc::clone(&a)));
        assert!(!set.insert(Arc::clone(&a)));
        assert!(set.insert(Arc::clone(&b)));
        assert_eq!(set.len(), 2);

        assert!(set.remove(&a));
        assert!(!set.remove(&a));
        assert_eq!(set.len(), 1);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let providers: Vec<Arc<dyn ContextProvider>> = (0..4)
            .map(|i| {
                let fragment = ContextFragment::new().with_system(format!("p{i}"));
                Arc::new(StaticProvider::new(fragment)) as _
            })
            .collect();

        let mut set = ProviderSet::new();
        for provider in &providers {
            set.insert(Arc::clone(provider));
        }

        let systems: Vec<String> = set
            .iter()
            .map(|p| p.model_context().system.unwrap())
            .collect();
        assert_eq!(systems, ["p0", "p1", "p2", "p3"]);
    }
}
