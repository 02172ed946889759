//! Scripted fakes for testing the context composition layer.

mod echo;
mod script;

use std::sync::{Arc, Mutex};

use ctxflow_context::{ChangeCallback, ContextFragment, ContextProvider, Subscription};

pub use echo::{EchoParameters, EchoTool};
pub use script::*;

/// A provider that always returns the same fragment.
pub struct StaticProvider {
    fragment: ContextFragment,
}

impl StaticProvider {
    /// Creates a provider for the given fragment.
    #[inline]
    pub fn new(fragment: ContextFragment) -> Self {
        Self { fragment }
    }
}

impl ContextProvider for StaticProvider {
    fn model_context(&self) -> ContextFragment {
        self.fragment.clone()
    }
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct SharedState {
    fragment: ContextFragment,
    subscribers: Vec<(u64, Notifier)>,
    next_subscriber_id: u64,
}

#[derive(Default)]
struct SharedInner {
    state: Mutex<SharedState>,
}

/// A provider whose fragment can be swapped at runtime, with working
/// change notification.
///
/// # Note
///
/// This type is not optimized for production use, you should only use
/// it for testing.
#[derive(Default)]
pub struct SharedProvider {
    inner: Arc<SharedInner>,
}

impl SharedProvider {
    /// Creates a provider with an initial fragment.
    pub fn new(fragment: ContextFragment) -> Self {
        let provider = Self::default();
        provider.inner.state.lock().unwrap().fragment = fragment;
        provider
    }

    /// Replaces the fragment and notifies every subscriber.
    pub fn set_fragment(&self, fragment: ContextFragment) {
        let subscribers: Vec<Notifier> = {
            let mut state = self.inner.state.lock().unwrap();
            state.fragment = fragment;
            state
                .subscribers
                .iter()
                .map(|(_, notifier)| Arc::clone(notifier))
                .collect()
        };
        // Run the callbacks outside the lock, they may read the
        // fragment back.
        for subscriber in subscribers {
            subscriber();
        }
    }
}

impl ContextProvider for SharedProvider {
    fn model_context(&self) -> ContextFragment {
        self.inner.state.lock().unwrap().fragment.clone()
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Option<Subscription> {
        let id = {
            let mut state = self.inner.state.lock().unwrap();
            let id = state.next_subscriber_id;
            state.next_subscriber_id += 1;
            state.subscribers.push((id, Arc::from(on_change)));
            id
        };
        let inner = Arc::clone(&self.inner);
        Some(Subscription::new(move || {
            let mut state = inner.state.lock().unwrap();
            state.subscribers.retain(|(sub_id, _)| *sub_id != id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_shared_provider_notifies() {
        let provider = SharedProvider::new(ContextFragment::new().with_system("a"));
        let notified = Arc::new(AtomicUsize::new(0));

        let subscription = {
            let notified = Arc::clone(&notified);
            provider
                .subscribe(Box::new(move || {
                    notified.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap()
        };

        provider.set_fragment(ContextFragment::new().with_system("b"));
        assert_eq!(notified.load(Ordering::Relaxed), 1);
        assert_eq!(provider.model_context().system.as_deref(), Some("b"));

        subscription.unsubscribe();
        provider.set_fragment(ContextFragment::new().with_system("c"));
        assert_eq!(notified.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let provider = SharedProvider::default();
        let notified = Arc::new(AtomicUsize::new(0));
        {
            let notified = Arc::clone(&notified);
            let _subscription = provider
                .subscribe(Box::new(move || {
                    notified.fetch_add(1, Ordering::Relaxed);
                }))
                .unwrap();
        }
        provider.set_fragment(ContextFragment::new());
        assert_eq!(notified.load(Ordering::Relaxed), 0);
    }
}
