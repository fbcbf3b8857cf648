//! Payload migration instructions.
//!
//! A migration is a pure, synchronous transform over a parsed JSON body.
//! Request migrations lift an old version's body into the next newer shape;
//! response migrations lower the latest shape one step down. The generator
//! decides which routes each instruction applies to; routes and versions are
//! never visible to the transform itself.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde_json::Value;

/// A named, pure body transform.
#[derive(Clone)]
pub struct Migration {
    name: String,
    apply: Arc<dyn Fn(&mut Value) + Send + Sync>,
}

impl Migration {
    pub fn new(name: impl Into<String>, apply: impl Fn(&mut Value) + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the transform in place.
    pub fn apply(&self, body: &mut Value) {
        (self.apply)(body);
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration").field("name", &self.name).finish()
    }
}

/// Migrate request bodies of every route whose body schema is the named
/// template type.
#[derive(Debug, Clone)]
pub struct RequestBySchema {
    /// Logical name of the template schema type.
    pub schema: String,
    pub migration: Migration,
}

/// Migrate request bodies of routes matched by path and method.
#[derive(Debug, Clone)]
pub struct RequestByPath {
    pub path: String,
    pub methods: HashSet<Method>,
    pub migration: Migration,
}

/// Migrate response bodies of every route whose response model is the named
/// template type.
#[derive(Debug, Clone)]
pub struct ResponseBySchema {
    /// Logical name of the template schema type.
    pub schema: String,
    pub migration: Migration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_migration_applies_in_place() {
        let migration = Migration::new("flatten_address", |body| {
            if let Some(addresses) = body.get("addresses").and_then(Value::as_array) {
                let first = addresses.first().cloned().unwrap_or(Value::Null);
                body["address"] = first;
                body.as_object_mut().unwrap().remove("addresses");
            }
        });

        let mut body = json!({"addresses": ["home", "work"]});
        migration.apply(&mut body);
        assert_eq!(body, json!({"address": "home"}));
    }

    #[test]
    fn test_migration_debug_shows_name() {
        let migration = Migration::new("noop", |_| {});
        assert!(format!("{migration:?}").contains("noop"));
    }
}
