use std::fmt::{self, Debug, Formatter};

use crate::fragment::ContextFragment;

/// Change callback registered through [`ContextProvider::subscribe`].
pub type ChangeCallback = Box<dyn Fn() + Send + Sync>;

/// A source of context fragments.
///
/// The merger reads [`model_context`] fresh on every merge; a provider
/// is free to return a different fragment each time, and the next
/// merge reflects it immediately. Reads are expected to be cheap and
/// side-effect free.
///
/// [`model_context`]: ContextProvider::model_context
pub trait ContextProvider: Send + Sync {
    /// Returns the provider's current context fragment.
    fn model_context(&self) -> ContextFragment;

    /// Registers a change callback, returning a subscription that
    /// unregisters it when dropped.
    ///
    /// Providers with static fragments don't need to implement this;
    /// the default returns `None`. The merger itself never subscribes.
    /// Callers that want live updates subscribe here and re-merge when
    /// notified.
    fn subscribe(&self, on_change: ChangeCallback) -> Option<Subscription> {
        let _ = on_change;
        None
    }
}

/// An active change-notification registration.
///
/// Dropping the subscription unregisters the callback.
pub struct Subscription(Option<Box<dyn FnOnce() + Send>>);

impl Subscription {
    /// Creates a subscription from a disposer closure.
    #[inline]
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(unsubscribe)))
    }

    /// Unregisters the callback now.
    #[inline]
    pub fn unsubscribe(mut self) {
        if let Some(dispose) = self.0.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(dispose) = self.0.take() {
            dispose();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.0.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_disposer_runs_on_drop() {
        let disposed = Arc::new(AtomicUsize::new(0));
        {
            let disposed = Arc::clone(&disposed);
            let _subscription = Subscription::new(move || {
                disposed.fetch_add(1, Ordering::Relaxed);
            });
        }
        assert_eq!(disposed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_disposer_runs_once() {
        let disposed = Arc::new(AtomicUsize::new(0));
        let subscription = {
            let disposed = Arc::clone(&disposed);
            Subscription::new(move || {
                disposed.fetch_add(1, Ordering::Relaxed);
            })
        };
        subscription.unsubscribe();
        assert_eq!(disposed.load(Ordering::Relaxed), 1);
    }
}
