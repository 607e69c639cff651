//! Test variables schema and deserialization

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Root structure of a test variables file.
///
/// Only the keys the runner itself interprets are typed; everything else is
/// kept verbatim and handed to the automation client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TestVars {
    /// Operator has read and accepted the destructive-run risks.
    /// Only a literal JSON `true` counts.
    #[serde(default, deserialize_with = "literal_true")]
    pub acknowledged_risks: bool,

    /// Skip the timed warning before the run starts.
    /// Only a literal JSON `true` counts.
    #[serde(default, deserialize_with = "literal_true")]
    pub skip_warning: bool,

    /// Seconds to wait for the settings snapshot query on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_timeout_secs: Option<u64>,

    /// Variables consumed by the test cases themselves
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn literal_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value == Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_literal_true_acknowledges() {
        let vars: TestVars =
            serde_json::from_str(r#"{"acknowledged_risks": "yes", "skip_warning": 1}"#).unwrap();
        assert!(!vars.acknowledged_risks);
        assert!(!vars.skip_warning);

        let vars: TestVars =
            serde_json::from_str(r#"{"acknowledged_risks": true, "skip_warning": true}"#).unwrap();
        assert!(vars.acknowledged_risks);
        assert!(vars.skip_warning);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let vars: TestVars = serde_json::from_str(
            r#"{"acknowledged_risks": true, "wifi": {"ssid": "qa"}, "carrier": "test"}"#,
        )
        .unwrap();
        assert_eq!(vars.extra.len(), 2);
        assert_eq!(vars.extra["wifi"]["ssid"], "qa");
    }
}
