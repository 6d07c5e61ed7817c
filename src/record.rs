//! The analysis record: the model's structured answer.
//!
//! Every field is optional. The model is asked for the full shape but nothing
//! guarantees it, so absent fields decode to `None` / empty and the report
//! supplies display defaults. The record is held in memory for the current
//! session only.

use serde::{Deserialize, Deserializer, Serialize};

/// Structured response of one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Overall bias estimate, 0–100 as asserted by the model (not verified).
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub bias_percentage: Option<i64>,

    #[serde(default)]
    pub summary: Option<String>,

    /// An explicit `null` decodes as no findings.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub findings: Vec<Finding>,

    /// The whole decision reworded neutrally.
    #[serde(default)]
    pub rewritten_document: Option<String>,
}

/// One biased passage identified by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Comma-separated bias labels, e.g. `"moral, cognitive"`.
    #[serde(rename = "type", default)]
    pub bias_type: Option<String>,

    /// Passage the model claims appears verbatim in the source.
    #[serde(default)]
    pub excerpt: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub suggested_rewrite: Option<String>,
}

impl Finding {
    /// Individual labels of `bias_type`, trimmed, empty pieces dropped.
    ///
    /// A missing or blank type yields the single label `unknown`.
    pub fn labels(&self) -> Vec<String> {
        let labels: Vec<String> = self
            .bias_type
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        if labels.is_empty() {
            vec!["unknown".to_string()]
        } else {
            labels
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Finding>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Finding>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `45`, `45.6`, `"45"` and `"45%"`; anything else decodes to `None`.
fn lenient_percentage<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim().trim_end_matches('%').trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    }))
}
