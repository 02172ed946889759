use std::future::ready;

use ctxflow_context::{Tool, ToolCallContext, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Parameters of [`EchoTool`].
#[derive(Deserialize, JsonSchema)]
pub struct EchoParameters {
    #[schemars(description = "Text to echo back.")]
    pub text: String,
}

/// A tool that echoes its input back, for wiring tests.
pub struct EchoTool {
    parameter_schema: Value,
}

impl EchoTool {
    /// Creates a new echo tool.
    #[inline]
    pub fn new() -> Self {
        EchoTool {
            parameter_schema: schema_for!(EchoParameters).to_value(),
        }
    }
}

impl Default for EchoTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for EchoTool {
    type Input = EchoParameters;

    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> Option<&str> {
        Some("Echoes the provided text back.")
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
        _ctx: ToolCallContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        ready(Ok(input.text))
    }
}
