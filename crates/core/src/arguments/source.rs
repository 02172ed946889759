use serde_json::Value;
use tokio::sync::watch;

use ctxflow_context::ToolCallContext;

use crate::arguments::path::Path;
use crate::arguments::reader::ArgumentsReader;

/// Shared state of one incremental argument stream.
#[derive(Clone, Debug, Default)]
pub(crate) struct CallState {
    /// Latest snapshot of the root arguments value.
    pub(crate) root: Option<Value>,
    /// Subtrees that will not change further.
    pub(crate) finalized: Vec<Path>,
    /// Whether the whole argument value has been received.
    pub(crate) done: bool,
}

impl CallState {
    /// Whether the value at `path` can no longer change.
    pub(crate) fn is_final(&self, path: &Path) -> bool {
        self.done || self.finalized.iter().any(|f| path.starts_with(f))
    }
}

/// Creates a writer/reader pair scoped to one tool invocation.
///
/// The writer side is driven by the external incremental argument
/// source; the reader side is handed to the tool implementation.
pub fn channel(context: ToolCallContext) -> (ArgumentsWriter, ArgumentsReader) {
    let (tx, rx) = watch::channel(CallState::default());
    let reader = ArgumentsReader::new(rx, context);
    (ArgumentsWriter { tx }, reader)
}

/// The feeding half of an argument channel.
///
/// Each snapshot must be at least as complete as the previous one; the
/// readers rely on that to deliver values in non-decreasing
/// completeness order. Dropping the writer before [`finish`] counts as
/// an abort of the argument stream.
///
/// [`finish`]: ArgumentsWriter::finish
#[derive(Debug)]
pub struct ArgumentsWriter {
    tx: watch::Sender<CallState>,
}

impl ArgumentsWriter {
    /// Publishes a more complete snapshot of the root arguments value.
    ///
    /// Snapshots published after [`finish`] are ignored.
    ///
    /// [`finish`]: ArgumentsWriter::finish
    pub fn snapshot(&self, value: Value) {
        self.tx.send_modify(|state| {
            if state.done {
                warn!("snapshot after finish is ignored");
                return;
            }
            trace!("new snapshot: {value:?}");
            state.root = Some(value);
        });
    }

    /// Marks the value at `path` as final.
    pub fn finalize(&self, path: Path) {
        self.tx.send_modify(|state| {
            if !state.finalized.contains(&path) {
                trace!("finalized: {path}");
                state.finalized.push(path);
            }
        });
    }

    /// Marks the whole argument value as received.
    pub fn finish(&self) {
        self.tx.send_modify(|state| {
            trace!("arguments finished");
            state.done = true;
        });
    }
}
