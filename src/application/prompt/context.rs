//! Copy-on-write context threaded through the steps of a [`Series`](super::Series).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("context field `{key}` could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("context field `{key}` has an unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("context field `{0}` is missing")]
    Missing(String),
}

/// Immutable mapping from field names to JSON values.
///
/// Every write returns a new context; clones share storage until then.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    fields: Arc<BTreeMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `key` set to `value`.
    pub fn with<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<Self, ContextError> {
        let value = serde_json::to_value(value).map_err(|source| ContextError::Encode {
            key: key.to_string(),
            source,
        })?;
        let mut fields = (*self.fields).clone();
        fields.insert(key.to_string(), value);
        Ok(Self {
            fields: Arc::new(fields),
        })
    }

    /// Reads a field. Absent and `null` fields both yield `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ContextError> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| ContextError::Decode {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContextError> {
        self.get(key)?
            .ok_or_else(|| ContextError::Missing(key.to_string()))
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Layers `other` over `self`. Keys only present in `self` are kept.
    pub fn merge(&self, other: &Context) -> Context {
        if Arc::ptr_eq(&self.fields, &other.fields) {
            return self.clone();
        }
        let mut fields = (*self.fields).clone();
        fields.extend(other.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Context {
            fields: Arc::new(fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_leaves_original_untouched() {
        let base = Context::new().with("a", &1).unwrap();
        let next = base.with("b", &2).unwrap();

        assert!(!base.contains("b"));
        assert_eq!(next.get::<i32>("a").unwrap(), Some(1));
        assert_eq!(next.get::<i32>("b").unwrap(), Some(2));
    }

    #[test]
    fn test_merge_prefers_later_fields() {
        let earlier = Context::new()
            .with("kept", "yes")
            .unwrap()
            .with("shared", "old")
            .unwrap();
        let later = Context::new().with("shared", "new").unwrap();

        let merged = earlier.merge(&later);
        assert_eq!(merged.require::<String>("kept").unwrap(), "yes");
        assert_eq!(merged.require::<String>("shared").unwrap(), "new");
        assert_eq!(merged, Context::new().with("kept", "yes").unwrap().with("shared", "new").unwrap());
    }

    #[test]
    fn test_null_reads_as_none() {
        let ctx = Context::new().with("format", &None::<String>).unwrap();
        assert!(ctx.contains("format"));
        assert_eq!(ctx.get::<String>("format").unwrap(), None);
    }

    #[test]
    fn test_require_reports_missing_and_mistyped_fields() {
        let ctx = Context::new().with("count", "three").unwrap();
        assert!(matches!(
            ctx.require::<u32>("other"),
            Err(ContextError::Missing(key)) if key == "other"
        ));
        assert!(matches!(
            ctx.require::<u32>("count"),
            Err(ContextError::Decode { .. })
        ));
    }
}
