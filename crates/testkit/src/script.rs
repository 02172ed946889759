use std::time::Duration;

use ctxflow_core::arguments::{ArgumentsWriter, Path};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;

/// One step of a scripted argument stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ArgumentsStep {
    /// Publish a more complete snapshot of the arguments.
    #[serde(rename = "snapshot")]
    Snapshot(Value),
    /// Mark the subtree at the path as final.
    #[serde(rename = "finalize")]
    Finalize(Path),
    /// Mark the whole arguments value as received.
    #[serde(rename = "finish")]
    Finish,
}

/// A scripted incremental argument source.
///
/// Plays its steps into an [`ArgumentsWriter`], yielding to the
/// scheduler before each step so that concurrent readers observe every
/// intermediate state. If the script doesn't end with
/// [`ArgumentsStep::Finish`], the writer is dropped unfinished, which
/// readers observe as an aborted argument stream.
///
/// # Note
///
/// This type is not optimized for production use, you should only use
/// it for testing.
#[derive(Clone, Debug, Default)]
pub struct ScriptedArguments {
    steps: Vec<ArgumentsStep>,
    delay: Option<Duration>,
}

impl ScriptedArguments {
    /// Creates a script with the given steps.
    #[inline]
    pub fn with_steps(steps: impl Into<Vec<ArgumentsStep>>) -> Self {
        Self {
            steps: steps.into(),
            delay: None,
        }
    }

    /// Sets a delay before each step.
    #[inline]
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = Some(delay);
    }

    /// Plays the script into the writer, consuming both.
    pub async fn play(self, writer: ArgumentsWriter) {
        let delay = self.delay;
        for step in self.steps {
            match delay {
                Some(delay) => sleep(delay).await,
                None => tokio::task::yield_now().await,
            }
            match step {
                ArgumentsStep::Snapshot(value) => writer.snapshot(value),
                ArgumentsStep::Finalize(path) => writer.finalize(path),
                ArgumentsStep::Finish => writer.finish(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ctxflow_core::path;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let steps = vec![
            ArgumentsStep::Snapshot(json!({ "query": "ru" })),
            ArgumentsStep::Snapshot(json!({ "query": "rust" })),
            ArgumentsStep::Finalize(path!["query"]),
            ArgumentsStep::Finish,
        ];

        let serialized = serde_json::to_string(&steps).unwrap();
        let deserialized: Vec<ArgumentsStep> = serde_json::from_str(&serialized).unwrap();

        assert_eq!(steps, deserialized);
    }
}
