use tokio::sync::watch;

/// Creates a linked abort handle and signal pair.
///
/// The handle stays with whoever owns the tool invocation; the signal
/// is cloned into the [`ToolCallContext`] handed to the tool and its
/// argument readers.
pub fn abort_channel() -> (AbortHandle, AbortSignal) {
    let (tx, rx) = watch::channel(false);
    (AbortHandle { tx }, AbortSignal { rx })
}

/// The triggering half of an abort pair.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Fires the linked signal. Calling this more than once has no
    /// further effect.
    #[inline]
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

/// A cooperative cancellation signal scoped to one tool invocation.
///
/// The signal is the sole early-termination mechanism in this layer;
/// there is no timeout logic. Dropping the [`AbortHandle`] without
/// firing means the signal never fires.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Returns a signal that never fires.
    #[inline]
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        AbortSignal { rx }
    }

    /// Returns whether the signal has fired.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the signal fires.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe and can be used in `tokio::select!`.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // The handle is gone, the signal can never fire now.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Per-invocation execution context handed to tools and argument
/// readers.
#[derive(Clone, Debug)]
pub struct ToolCallContext {
    tool_call_id: String,
    abort_signal: AbortSignal,
}

impl ToolCallContext {
    /// Creates a context for the tool call with the given identifier.
    #[inline]
    pub fn new<S: Into<String>>(tool_call_id: S, abort_signal: AbortSignal) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            abort_signal,
        }
    }

    /// The unique identifier of the tool call this context belongs to.
    #[inline]
    pub fn tool_call_id(&self) -> &str {
        &self.tool_call_id
    }

    /// The cancellation signal for this tool call.
    #[inline]
    pub fn abort_signal(&self) -> &AbortSignal {
        &self.abort_signal
    }
}
