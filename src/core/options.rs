use serde::{Deserialize, Serialize};

use super::{
    Document,
    splitter::{BatchLimits, MAX_BATCH_BYTES, MAX_BATCH_COUNT},
};

/// Options accepted when a bulk request is initialized.
///
/// Every field is optional when deserializing, so `{}` yields the defaults.
///
/// # Examples
///
/// ```
/// use bulk_write_rs::core::options::BulkOptions;
///
/// let options: BulkOptions =
///     serde_json::from_str(r#"{"writeConcern": {"w": 1}, "maxBatchCount": 500}"#).unwrap();
/// assert_eq!(options.max_batch_count, 500);
/// assert_eq!(options.max_batch_bytes, 16 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BulkOptions {
    /// Name used in log lines. A random one is generated when absent.
    pub name: Option<String>,
    /// Write concern sent with every batch unless `execute` is given another one.
    pub write_concern: Option<Document>,
    /// Maximum number of operations per batch.
    pub max_batch_count: usize,
    /// Maximum cumulative serialized size of a batch, in bytes.
    pub max_batch_bytes: usize,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            name: None,
            write_concern: None,
            max_batch_count: MAX_BATCH_COUNT,
            max_batch_bytes: MAX_BATCH_BYTES,
        }
    }
}

impl BulkOptions {
    /// Creates options from environment variables or defaults.
    ///
    /// Environment variables:
    /// - `BULK_MAX_BATCH_COUNT`: maximum operations per batch (default: 1000)
    /// - `BULK_MAX_BATCH_BYTES`: maximum batch size in bytes (default: 16 MiB)
    ///
    /// Invalid values, including 0, are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`BulkOptions::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let positive = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|&value| value > 0)
        };

        let max_batch_count = positive("BULK_MAX_BATCH_COUNT").unwrap_or(defaults.max_batch_count);
        let max_batch_bytes = positive("BULK_MAX_BATCH_BYTES").unwrap_or(defaults.max_batch_bytes);

        Self {
            max_batch_count,
            max_batch_bytes,
            ..defaults
        }
    }

    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            max_count: self.max_batch_count.max(1),
            max_bytes: self.max_batch_bytes.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let options: BulkOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, BulkOptions::default());
    }

    #[test]
    fn limits_are_never_zero() {
        let options = BulkOptions {
            max_batch_count: 0,
            max_batch_bytes: 0,
            ..Default::default()
        };
        assert_eq!(
            options.limits(),
            BatchLimits {
                max_count: 1,
                max_bytes: 1
            }
        );
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| {
            vars.iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn lookup_overrides_batch_limits() {
        let options = BulkOptions::from_lookup(lookup(&[
            ("BULK_MAX_BATCH_COUNT", " 250 "),
            ("BULK_MAX_BATCH_BYTES", "1048576"),
        ]));

        assert_eq!(options.max_batch_count, 250);
        assert_eq!(options.max_batch_bytes, 1024 * 1024);
        assert_eq!(options.name, None);
    }

    #[test]
    fn invalid_or_zero_values_keep_defaults() {
        let options = BulkOptions::from_lookup(lookup(&[
            ("BULK_MAX_BATCH_COUNT", "0"),
            ("BULK_MAX_BATCH_BYTES", "not a number"),
        ]));

        assert_eq!(options, BulkOptions::default());
    }

    #[test]
    fn missing_variables_keep_defaults() {
        assert_eq!(BulkOptions::from_lookup(|_| None), BulkOptions::default());
    }
}
