use std::collections::HashMap;

use crate::config::ModelConfig;
use crate::settings::CallSettings;
use crate::tool::{Tool, ToolEntry};

/// One provider's partial configuration contribution.
///
/// A fragment is an immutable snapshot of what a provider wants the
/// effective model context to contain. Providers return a fresh value
/// on every read and the merger never writes back into it. Cloning a
/// fragment shares the contained tool handles rather than copying the
/// tools.
#[derive(Clone, Debug, Default)]
pub struct ContextFragment {
    /// Merge priority. Fragments with a higher priority fold first;
    /// absent means `0`.
    pub priority: Option<i32>,
    /// System prompt text.
    pub system: Option<String>,
    /// Tools contributed by this fragment, keyed by registration name.
    pub tools: HashMap<String, ToolEntry>,
    /// Sampling settings for the model call.
    pub call_settings: Option<CallSettings>,
    /// Backend connection parameters.
    pub config: Option<ModelConfig>,
}

impl ContextFragment {
    /// Creates an empty fragment.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the merge priority.
    #[inline]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the system prompt text.
    #[inline]
    pub fn with_system<S: Into<String>>(mut self, system: S) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Registers a tool under its own name.
    #[inline]
    pub fn with_tool<T: Tool>(self, tool: T) -> Self {
        self.with_tool_entry(ToolEntry::new(tool))
    }

    /// Registers an existing tool entry under its name.
    #[inline]
    pub fn with_tool_entry(mut self, entry: ToolEntry) -> Self {
        self.tools.insert(entry.name().to_owned(), entry);
        self
    }

    /// Sets the call settings.
    #[inline]
    pub fn with_call_settings(mut self, call_settings: CallSettings) -> Self {
        self.call_settings = Some(call_settings);
        self
    }

    /// Sets the backend configuration.
    #[inline]
    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// The fully merged configuration consumed by the calling engine.
///
/// Same shape as [`ContextFragment`] minus the priority, with every
/// field resolved: `system` is one concatenated string and the tool
/// table holds the union of all contributed tools. The scalar fields
/// never alias provider-owned fragments; tool handles are shared, not
/// copied.
#[derive(Clone, Debug, Default)]
pub struct EffectiveContext {
    /// Concatenated system prompt, highest-priority text first.
    pub system: Option<String>,
    /// The merged tool table.
    pub tools: HashMap<String, ToolEntry>,
    /// Merged call settings.
    pub call_settings: Option<CallSettings>,
    /// Merged backend configuration.
    pub config: Option<ModelConfig>,
}

impl EffectiveContext {
    /// Looks up a tool by name.
    #[inline]
    pub fn tool(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.get(name)
    }
}
