pub mod path;

pub use path::{EntityMetric, MetricPath};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;

use crate::error::{CheckError, Error};
use crate::Result;

/// Aggregated metrics document produced by the portfolio engine
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct NestedMetrics(Value);

impl NestedMetrics {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| Error::NestedParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a document, reading bare `NaN` / `Infinity` / `-Infinity` tokens
    /// (as written by Python's `json.dump`) as missing values.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let normalized = null_non_finite(raw);
        if matches!(normalized, Cow::Owned(_)) {
            tracing::debug!("Nested document contains non-finite tokens, reading them as null");
        }
        Ok(Self(serde_json::from_str(&normalized)?))
    }

    pub fn document(&self) -> &Value {
        &self.0
    }

    fn portfolio(&self) -> Option<&Value> {
        self.0.get("portfolio_metrics")
    }

    fn ticker(&self, entity: &str) -> Option<&Value> {
        self.0.get("ticker_metrics")?.get(entity)
    }

    /// Raw JSON node at a known location
    fn node(&self, path: &MetricPath) -> Option<&Value> {
        match path {
            MetricPath::TotalSignals => self
                .portfolio()?
                .get("signals")?
                .get("summary")?
                .get("total")?
                .get("value"),
            MetricPath::SignalQualityCount => self
                .portfolio()?
                .get("signal_quality")?
                .get("signal_count")?
                .get("value"),
            MetricPath::Expectancy => self
                .portfolio()?
                .get("efficiency")?
                .get("expectancy")?
                .get("value"),
            MetricPath::Concurrency(field) => self
                .portfolio()?
                .get("concurrency")?
                .get(field.as_str())?
                .get("value"),
            MetricPath::Entity(entity, metric) => self
                .ticker(entity)?
                .get("signal_quality_metrics")?
                .get(metric.key()),
            MetricPath::Allocation(entity) => self.ticker(entity)?.get("allocation"),
        }
    }

    /// Numeric value at a known location, `None` when absent or not numeric
    pub fn get(&self, path: &MetricPath) -> Option<f64> {
        self.node(path).and_then(as_number)
    }

    /// Like [`get`](Self::get) but reports the missing path
    pub fn require(&self, path: &MetricPath) -> std::result::Result<f64, CheckError> {
        self.get(path)
            .ok_or_else(|| CheckError::MissingPath(path.to_string()))
    }

    pub fn entity_metric(&self, entity: &str, metric: EntityMetric) -> Option<f64> {
        self.get(&MetricPath::Entity(entity.to_string(), metric))
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.ticker(entity).is_some()
    }

    /// Entity ids under `ticker_metrics`, ascending
    pub fn entities(&self) -> Vec<&str> {
        let mut entities: Vec<&str> = self
            .0
            .get("ticker_metrics")
            .and_then(Value::as_object)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default();
        entities.sort_unstable();
        entities
    }

    /// Ratio-type fields under `portfolio_metrics.concurrency`, ascending
    pub fn concurrency_ratio_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self
            .portfolio()
            .and_then(|p| p.get("concurrency"))
            .and_then(Value::as_object)
            .map(|m| {
                m.keys()
                    .filter(|k| k.contains("ratio"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        fields.sort_unstable();
        fields
    }
}

impl From<Value> for NestedMetrics {
    fn from(document: Value) -> Self {
        Self(document)
    }
}

/// Replace non-finite number tokens outside string literals with `null`
fn null_non_finite(raw: &str) -> Cow<'_, str> {
    const TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

    let mut out: Option<String> = None;
    let mut in_string = false;
    let mut escaped = false;
    let mut copied = 0;
    let mut i = 0;
    let bytes = raw.as_bytes();

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            i += 1;
            continue;
        }
        match TOKENS.iter().find(|t| bytes[i..].starts_with(t.as_bytes())) {
            Some(token) => {
                let buf = out.get_or_insert_with(|| String::with_capacity(raw.len()));
                buf.push_str(&raw[copied..i]);
                buf.push_str("null");
                i += token.len();
                copied = i;
            }
            None => i += 1,
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&raw[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(raw),
    }
}

/// Numbers may be stored bare, as numeric strings, or wrapped in `{"value": ..}`
fn as_number(node: &Value) -> Option<f64> {
    match node {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok().filter(|v: &f64| !v.is_nan()),
        Value::Object(map) => map.get("value").and_then(as_number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> NestedMetrics {
        NestedMetrics::new(json!({
            "portfolio_metrics": {
                "signals": { "summary": { "total": { "value": 1200 } } },
                "signal_quality": { "signal_count": { "value": "150" } },
                "efficiency": { "expectancy": { "value": 3.5 } },
                "concurrency": {
                    "utilization_ratio": { "value": 0.4 },
                    "peak_concurrent": { "value": 7 }
                }
            },
            "ticker_metrics": {
                "MSFT": { "signal_quality_metrics": { "sharpe_ratio": { "value": 1.1 } } },
                "AAPL": {
                    "signal_quality_metrics": { "win_rate": 0.62, "sharpe_ratio": -0.2 },
                    "allocation": 0.3
                }
            }
        }))
    }

    #[test]
    fn test_portfolio_paths() {
        let nested = document();

        assert_eq!(nested.get(&MetricPath::TotalSignals), Some(1200.0));
        assert_eq!(nested.get(&MetricPath::SignalQualityCount), Some(150.0));
        assert_eq!(nested.get(&MetricPath::Expectancy), Some(3.5));
        assert_eq!(
            nested.get(&MetricPath::Concurrency("utilization_ratio".into())),
            Some(0.4)
        );
    }

    #[test]
    fn test_entity_paths() {
        let nested = document();

        assert_eq!(nested.entity_metric("AAPL", EntityMetric::WinRate), Some(0.62));
        assert_eq!(nested.entity_metric("MSFT", EntityMetric::SharpeRatio), Some(1.1));
        assert_eq!(nested.entity_metric("MSFT", EntityMetric::WinRate), None);
        assert_eq!(nested.get(&MetricPath::Allocation("AAPL".into())), Some(0.3));
        assert_eq!(nested.entities(), vec!["AAPL", "MSFT"]);
        assert!(!nested.has_entity("TSLA"));
    }

    #[test]
    fn test_concurrency_ratio_fields() {
        assert_eq!(document().concurrency_ratio_fields(), vec!["utilization_ratio"]);
    }

    #[test]
    fn test_require_names_missing_path() {
        let err = NestedMetrics::default()
            .require(&MetricPath::TotalSignals)
            .unwrap_err();
        assert_eq!(
            err,
            CheckError::MissingPath("portfolio_metrics.signals.summary.total.value".into())
        );
    }

    #[test]
    fn test_non_finite_tokens_read_as_missing() {
        let raw = r#"{
            "portfolio_metrics": { "efficiency": { "expectancy": { "value": NaN } } },
            "ticker_metrics": {
                "AAPL": { "signal_quality_metrics": {
                    "profit_factor": Infinity, "calmar_ratio": -Infinity, "win_rate": 0.6
                } },
                "NaN Corp": { "note": "Infinity and NaN stay inside strings" }
            }
        }"#;

        let nested = NestedMetrics::from_json_str(raw).unwrap();

        assert_eq!(nested.get(&MetricPath::Expectancy), None);
        assert_eq!(nested.entity_metric("AAPL", EntityMetric::ProfitFactor), None);
        assert_eq!(nested.entity_metric("AAPL", EntityMetric::CalmarRatio), None);
        assert_eq!(nested.entity_metric("AAPL", EntityMetric::WinRate), Some(0.6));
        assert_eq!(
            nested.document()["ticker_metrics"]["NaN Corp"]["note"],
            "Infinity and NaN stay inside strings"
        );
    }

    #[test]
    fn test_plain_document_is_not_copied() {
        let raw = r#"{"ticker_metrics": {"AAPL": {"allocation": 1.0}}}"#;
        assert!(matches!(null_non_finite(raw), Cow::Borrowed(_)));
    }
}
