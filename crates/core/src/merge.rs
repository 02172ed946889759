use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::error::Error as StdError;
use std::fmt::{self, Display};

use ctxflow_context::{CallSettings, ContextFragment, EffectiveContext, ModelConfig};

use crate::provider_set::ProviderSet;

/// Options controlling a merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    /// Separator inserted between the system texts of different
    /// fragments.
    pub system_separator: String,
}

impl Default for MergeOptions {
    #[inline]
    fn default() -> Self {
        Self {
            system_separator: "\n\n".to_owned(),
        }
    }
}

/// Error returned when a merge fails.
///
/// Merging is all-or-nothing: a conflict aborts the whole merge and no
/// partial effective context is produced. Silently overwriting a tool
/// could change behavior the caller never intended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeError {
    tool_name: String,
}

impl MergeError {
    /// The name that two distinct tools were registered under.
    #[inline]
    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }
}

impl Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a different tool named `{}` is already defined",
            self.tool_name
        )
    }
}

impl StdError for MergeError {}

/// Merges the current fragments of every provider in the set into one
/// effective context.
///
/// Fragments fold in descending priority order (absent priority counts
/// as `0`); equal priorities keep the set's insertion order. System
/// texts concatenate highest-priority first, separated by a blank
/// line; `config` and `call_settings` overlay per field with the
/// higher-priority value winning; tools are collected by name, and two
/// *distinct* tool objects under one name fail the whole merge.
///
/// The merge is a pure function of the fragments read at call time:
/// every provider is asked for its fragment afresh, nothing is cached
/// across calls, and providers are never mutated.
pub fn merge(providers: &ProviderSet) -> Result<EffectiveContext, MergeError> {
    merge_with(providers, &MergeOptions::default())
}

/// Merges with explicit options.
///
/// See [`merge`] for the fold rules; the options currently only
/// control the system text separator.
pub fn merge_with(
    providers: &ProviderSet,
    options: &MergeOptions,
) -> Result<EffectiveContext, MergeError> {
    let span = debug_span!("context merge", providers = providers.len());
    let _enter = span.enter();

    let mut fragments: Vec<ContextFragment> =
        providers.iter().map(|p| p.model_context()).collect();
    // The sort is stable, so equal priorities keep their relative
    // order from the set iteration above.
    fragments.sort_by_key(|fragment| Reverse(fragment.priority.unwrap_or(0)));

    let mut effective = EffectiveContext::default();
    for fragment in fragments {
        fold_fragment(&mut effective, fragment, options)?;
    }
    Ok(effective)
}

fn fold_fragment(
    acc: &mut EffectiveContext,
    fragment: ContextFragment,
    options: &MergeOptions,
) -> Result<(), MergeError> {
    if let Some(system) = fragment.system {
        match &mut acc.system {
            Some(acc_system) => {
                acc_system.push_str(&options.system_separator);
                acc_system.push_str(&system);
            }
            None => acc.system = Some(system),
        }
    }

    for (name, tool) in fragment.tools {
        match acc.tools.entry(name) {
            Entry::Occupied(existing) => {
                // The same tool object contributed twice is fine; a
                // different tool under a taken name is not.
                if !existing.get().same_tool(&tool) {
                    warn!("tool name conflict: {}", existing.key());
                    return Err(MergeError {
                        tool_name: existing.key().clone(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(tool);
            }
        }
    }

    if let Some(config) = fragment.config {
        match &mut acc.config {
            Some(acc_config) => fill_config(acc_config, config),
            None => acc.config = Some(config),
        }
    }

    if let Some(settings) = fragment.call_settings {
        match &mut acc.call_settings {
            Some(acc_settings) => fill_settings(acc_settings, settings),
            None => acc.call_settings = Some(settings),
        }
    }

    Ok(())
}

// Fragments fold in descending priority order, so a field that is
// already set came from a higher-priority fragment and wins; only the
// gaps are filled from below.

fn fill_config(acc: &mut ModelConfig, config: ModelConfig) {
    if acc.api_key.is_none() {
        acc.api_key = config.api_key;
    }
    if acc.base_url.is_none() {
        acc.base_url = config.base_url;
    }
    if acc.model_name.is_none() {
        acc.model_name = config.model_name;
    }
}

fn fill_settings(acc: &mut CallSettings, settings: CallSettings) {
    if acc.max_tokens.is_none() {
        acc.max_tokens = settings.max_tokens;
    }
    if acc.temperature.is_none() {
        acc.temperature = settings.temperature;
    }
    if acc.top_p.is_none() {
        acc.top_p = settings.top_p;
    }
    if acc.presence_penalty.is_none() {
        acc.presence_penalty = settings.presence_penalty;
    }
    if acc.frequency_penalty.is_none() {
        acc.frequency_penalty = settings.frequency_penalty;
    }
    if acc.seed.is_none() {
        acc.seed = settings.seed;
    }
    if acc.headers.is_none() {
        acc.headers = settings.headers;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ctxflow_context::{ContextProvider, ToolEntry};
    use ctxflow_testkit::{EchoTool, StaticProvider};
    use serde_json::json;

    use super::*;

    fn set_of(fragments: impl IntoIterator<Item = ContextFragment>) -> ProviderSet {
        let mut set = ProviderSet::new();
        for fragment in fragments {
            set.insert(Arc::new(StaticProvider::new(fragment)));
        }
        set
    }

    #[test]
    fn test_empty_set() {
        let effective = merge(&ProviderSet::new()).unwrap();
        assert!(effective.system.is_none());
        assert!(effective.tools.is_empty());
        assert!(effective.call_settings.is_none());
        assert!(effective.config.is_none());
    }

    #[test]
    fn test_system_concatenation_follows_priority() {
        let set = set_of([
            ContextFragment::new().with_priority(1).with_system("Second"),
            ContextFragment::new().with_priority(2).with_system("First"),
        ]);
        let effective = merge(&set).unwrap();
        assert_eq!(effective.system.as_deref(), Some("First\n\nSecond"));
    }

    #[test]
    fn test_priority_ties_keep_insertion_order() {
        let set = set_of([
            ContextFragment::new().with_system("a"),
            ContextFragment::new().with_system("b"),
            ContextFragment::new().with_priority(1).with_system("top"),
            ContextFragment::new().with_system("c"),
        ]);
        let effective = merge(&set).unwrap();
        assert_eq!(effective.system.as_deref(), Some("top\n\na\n\nb\n\nc"));
    }

    #[test]
    fn test_sort_ignores_input_order_of_distinct_priorities() {
        let fragments = [
            ContextFragment::new().with_priority(3).with_system("three"),
            ContextFragment::new().with_priority(1).with_system("one"),
            ContextFragment::new().with_priority(2).with_system("two"),
        ];
        for rotation in 0..fragments.len() {
            let mut rotated = fragments.to_vec();
            rotated.rotate_left(rotation);
            let effective = merge(&set_of(rotated)).unwrap();
            assert_eq!(
                effective.system.as_deref(),
                Some("three\n\ntwo\n\none"),
                "rotation {rotation}"
            );
        }
    }

    #[test]
    fn test_config_overlay_prefers_higher_priority() {
        let set = set_of([
            ContextFragment::new()
                .with_priority(1)
                .with_config(ModelConfig::new().with_api_key("a")),
            ContextFragment::new().with_priority(2).with_config(
                ModelConfig::new().with_api_key("b").with_base_url("x"),
            ),
        ]);
        let config = merge(&set).unwrap().config.unwrap();
        assert_eq!(config.api_key.as_deref(), Some("b"));
        assert_eq!(config.base_url.as_deref(), Some("x"));
        assert!(config.model_name.is_none());
    }

    #[test]
    fn test_call_settings_overlay() {
        let low = CallSettings {
            max_tokens: Some(256),
            temperature: Some(0.2),
            ..Default::default()
        };
        let high = CallSettings {
            temperature: Some(0.9),
            seed: Some(7),
            ..Default::default()
        };
        let set = set_of([
            ContextFragment::new().with_call_settings(low),
            ContextFragment::new()
                .with_priority(5)
                .with_call_settings(high),
        ]);
        let settings = merge(&set).unwrap().call_settings.unwrap();
        assert_eq!(settings.temperature, Some(0.9));
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.max_tokens, Some(256));
    }

    #[test]
    fn test_same_tool_from_two_providers() {
        let shared = ToolEntry::new(EchoTool::new());
        let set = set_of([
            ContextFragment::new().with_tool_entry(shared.clone()),
            ContextFragment::new().with_tool_entry(shared.clone()),
        ]);
        let effective = merge(&set).unwrap();
        assert_eq!(effective.tools.len(), 1);
        assert!(effective.tool("echo").unwrap().same_tool(&shared));
    }

    #[test]
    fn test_distinct_tools_under_one_name_fail() {
        let set = set_of([
            ContextFragment::new().with_tool(EchoTool::new()),
            ContextFragment::new().with_tool(EchoTool::new()),
        ]);
        let err = merge(&set).unwrap_err();
        assert_eq!(err.tool_name(), "echo");
    }

    #[test]
    fn test_definition_only_tool_merges() {
        let entry = ToolEntry::definition("render", None, json!({ "type": "object" }));
        let set = set_of([ContextFragment::new().with_tool_entry(entry)]);
        let effective = merge(&set).unwrap();
        assert!(!effective.tool("render").unwrap().executable());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let set = set_of([
            ContextFragment::new()
                .with_priority(2)
                .with_system("First")
                .with_tool(EchoTool::new()),
            ContextFragment::new()
                .with_system("Second")
                .with_config(ModelConfig::new().with_model_name("m")),
        ]);
        let first = merge(&set).unwrap();
        let second = merge(&set).unwrap();
        assert_eq!(first.system, second.system);
        assert_eq!(first.config, second.config);
        assert_eq!(first.call_settings, second.call_settings);
        assert_eq!(first.tools.len(), second.tools.len());
        for (name, tool) in &first.tools {
            assert!(second.tools[name].same_tool(tool));
        }
    }

    #[test]
    fn test_custom_separator() {
        let set = set_of([
            ContextFragment::new().with_system("a"),
            ContextFragment::new().with_system("b"),
        ]);
        let options = MergeOptions {
            system_separator: "\n---\n".to_owned(),
        };
        let effective = merge_with(&set, &options).unwrap();
        assert_eq!(effective.system.as_deref(), Some("a\n---\nb"));
    }

    #[test]
    fn test_fragments_are_read_fresh_each_merge() {
        let provider = Arc::new(ctxflow_testkit::SharedProvider::new(
            ContextFragment::new().with_system("before"),
        ));
        let mut set = ProviderSet::new();
        set.insert(Arc::clone(&provider) as Arc<dyn ContextProvider>);

        assert_eq!(
            merge(&set).unwrap().system.as_deref(),
            Some("before")
        );
        provider.set_fragment(ContextFragment::new().with_system("after"));
        assert_eq!(merge(&set).unwrap().system.as_deref(), Some("after"));
    }
}
