use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Sampling and request knobs for a model call.
///
/// Every field is optional; absent fields inherit whatever another
/// context fragment contributes during a merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallSettings {
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling probability mass.
    pub top_p: Option<f64>,
    /// Presence penalty.
    pub presence_penalty: Option<f64>,
    /// Frequency penalty.
    pub frequency_penalty: Option<f64>,
    /// Seed for deterministic sampling.
    pub seed: Option<u64>,
    /// Extra request headers. A `None` value unsets the header.
    ///
    /// The whole mapping counts as one field for merge purposes: a
    /// higher-priority fragment that sets any headers replaces the
    /// mapping entirely rather than merging per header.
    pub headers: Option<HashMap<String, Option<String>>>,
}

impl CallSettings {
    /// Creates empty settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let settings = CallSettings {
            max_tokens: Some(1024),
            temperature: Some(0.7),
            seed: Some(42),
            headers: Some(HashMap::from([
                ("x-trace".to_owned(), Some("on".to_owned())),
                ("x-drop".to_owned(), None),
            ])),
            ..Default::default()
        };

        let serialized = serde_json::to_string(&settings).unwrap();
        let deserialized: CallSettings = serde_json::from_str(&serialized).unwrap();

        assert_eq!(settings, deserialized);
    }
}
