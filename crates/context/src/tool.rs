use std::fmt::{self, Debug, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::call::ToolCallContext;
use crate::error::ToolError;

/// The result of a tool call.
pub type ToolResult = Result<String, ToolError>;

/// A boxed future produced by a tool invocation.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not
/// maintain any internal state.
///
/// The tool can be context-aware, meaning it can access additional
/// information about the current execution environment. To do this,
/// make that information an immutable state of the tool, set during
/// initialization, and copy it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name the tool is registered under.
    fn name(&self) -> &str;

    /// Returns the description of the tool, if it has one.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Returns the parameter schema of the tool.
    ///
    /// The schema is treated opaquely by this layer; it is typically a
    /// [JSON schema](https://json-schema.org/) document.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of
    /// `self`, and the future should be cancellation safe.
    fn execute(
        &self,
        input: Self::Input,
        ctx: ToolCallContext,
    ) -> impl Future<Output = ToolResult> + Send + 'static;

    /// Alternate execution path used when the raw arguments failed
    /// schema validation.
    ///
    /// Returning `None` (the default) propagates the failure to the
    /// calling engine instead.
    fn on_schema_validation_error(
        &self,
        raw_arguments: Value,
        ctx: ToolCallContext,
    ) -> Option<ToolFuture> {
        let _ = (raw_arguments, ctx);
        None
    }
}

trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> Option<&str>;

    fn parameter_schema(&self) -> &Value;

    fn executable(&self) -> bool;

    fn execute(&self, arguments: Value, ctx: ToolCallContext) -> Option<ToolFuture>;

    fn validation_fallback(
        &self,
        raw_arguments: Value,
        ctx: ToolCallContext,
    ) -> Option<ToolFuture>;
}

struct TypedTool<T: Tool>(T);

impl<T: Tool> ToolObject for TypedTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> Option<&str> {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    #[inline]
    fn executable(&self) -> bool {
        true
    }

    fn execute(&self, arguments: Value, ctx: ToolCallContext) -> Option<ToolFuture> {
        let input: T::Input = match serde_json::from_value(arguments.clone()) {
            Ok(input) => input,
            Err(err) => {
                // The decoded input doesn't fit the tool's input type.
                // Give the tool's fallback a chance before failing.
                let fut: ToolFuture = match self.0.on_schema_validation_error(arguments, ctx) {
                    Some(fallback) => fallback,
                    None => {
                        let reason = format!("{err}");
                        Box::pin(ready(ToolResult::Err(
                            ToolError::invalid_input().with_reason(reason),
                        )))
                    }
                };
                return Some(fut);
            }
        };
        Some(Box::pin(self.0.execute(input, ctx)))
    }

    #[inline]
    fn validation_fallback(
        &self,
        raw_arguments: Value,
        ctx: ToolCallContext,
    ) -> Option<ToolFuture> {
        self.0.on_schema_validation_error(raw_arguments, ctx)
    }
}

struct DefinitionTool {
    name: String,
    description: Option<String>,
    parameter_schema: Value,
}

impl ToolObject for DefinitionTool {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[inline]
    fn executable(&self) -> bool {
        false
    }

    #[inline]
    fn execute(&self, _arguments: Value, _ctx: ToolCallContext) -> Option<ToolFuture> {
        None
    }

    #[inline]
    fn validation_fallback(
        &self,
        _raw_arguments: Value,
        _ctx: ToolCallContext,
    ) -> Option<ToolFuture> {
        None
    }
}

/// A named, identity-bearing handle to a tool contributed by a context
/// provider.
///
/// Cloning an entry shares the underlying tool object; the merger and
/// the engine never copy or mutate the tool itself. Two entries are
/// the *same tool* only when they point at the same object, which is
/// what lets one tool be contributed by several providers without
/// tripping the merge-time name conflict check.
pub struct ToolEntry(Arc<dyn ToolObject>);

impl ToolEntry {
    /// Wraps a typed tool.
    #[inline]
    pub fn new<T: Tool>(tool: T) -> Self {
        Self(Arc::new(TypedTool(tool)))
    }

    /// Creates an entry that only declares the tool, without an
    /// executor.
    ///
    /// Such tools are executed elsewhere (for example by a frontend);
    /// the engine can still advertise them to the model.
    #[inline]
    pub fn definition<S: Into<String>>(
        name: S,
        description: Option<String>,
        parameter_schema: Value,
    ) -> Self {
        Self(Arc::new(DefinitionTool {
            name: name.into(),
            description,
            parameter_schema,
        }))
    }

    /// Returns the name the tool is registered under.
    #[inline]
    pub fn name(&self) -> &str {
        self.0.name()
    }

    /// Returns the description of the tool, if it has one.
    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.0.description()
    }

    /// Returns the parameter schema of the tool.
    #[inline]
    pub fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    /// Returns whether this entry carries an executor.
    #[inline]
    pub fn executable(&self) -> bool {
        self.0.executable()
    }

    /// Starts executing the tool with raw argument data.
    ///
    /// Returns `None` when the entry has no executor attached.
    #[inline]
    pub fn execute(&self, arguments: Value, ctx: ToolCallContext) -> Option<ToolFuture> {
        self.0.execute(arguments, ctx)
    }

    /// Runs the tool's schema-validation fallback, if it declares one.
    #[inline]
    pub fn validation_fallback(
        &self,
        raw_arguments: Value,
        ctx: ToolCallContext,
    ) -> Option<ToolFuture> {
        self.0.validation_fallback(raw_arguments, ctx)
    }

    /// Whether the streaming-call execution mode is available for this
    /// tool.
    ///
    /// The mode is reserved in the contract but not implemented; this
    /// always returns `false` and callers must not rely on it.
    #[inline]
    pub fn supports_stream_call(&self) -> bool {
        false
    }

    /// Returns whether two entries refer to the same tool object.
    #[inline]
    pub fn same_tool(&self, other: &ToolEntry) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Clone for ToolEntry {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for ToolEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name())
            .field("executable", &self.executable())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::call::AbortSignal;

    #[derive(Deserialize)]
    struct GreetInput {
        name: String,
    }

    struct GreetTool;

    impl Tool for GreetTool {
        type Input = GreetInput;

        fn name(&self) -> &str {
            "greet"
        }

        fn parameter_schema(&self) -> &Value {
            static SCHEMA: Value = Value::Null;
            &SCHEMA
        }

        fn execute(
            &self,
            input: Self::Input,
            _ctx: ToolCallContext,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok(format!("Hello, {}!", input.name)))
        }
    }

    fn test_ctx() -> ToolCallContext {
        ToolCallContext::new("tool:1", AbortSignal::never())
    }

    #[tokio::test]
    async fn test_typed_execute() {
        let entry = ToolEntry::new(GreetTool);
        assert!(entry.executable());

        let fut = entry
            .execute(json!({ "name": "world" }), test_ctx())
            .unwrap();
        assert_eq!(fut.await.unwrap(), "Hello, world!");
    }

    #[tokio::test]
    async fn test_invalid_input_without_fallback() {
        let entry = ToolEntry::new(GreetTool);
        let fut = entry.execute(json!({ "name": 42 }), test_ctx()).unwrap();
        let err = fut.await.unwrap_err();
        assert_eq!(err.kind(), crate::ToolErrorKind::InvalidInput);
    }

    #[test]
    fn test_definition_only_entry() {
        let entry = ToolEntry::definition(
            "render_chart",
            Some("Renders a chart on the client.".to_owned()),
            json!({ "type": "object" }),
        );
        assert!(!entry.executable());
        assert!(entry.execute(json!({}), test_ctx()).is_none());
        assert!(!entry.supports_stream_call());
    }

    #[test]
    fn test_identity() {
        let a = ToolEntry::new(GreetTool);
        let b = ToolEntry::new(GreetTool);
        let a_clone = a.clone();
        assert!(a.same_tool(&a_clone));
        assert!(!a.same_tool(&b));
    }
}
