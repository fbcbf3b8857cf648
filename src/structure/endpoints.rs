//! Structural endpoint instructions.
//!
//! An instruction declares what an endpoint looked like at a version
//! boundary: it didn't exist yet, it still existed, or it had different
//! attributes. Instructions are consumed by the generator; they never touch
//! routes themselves.

use std::collections::HashSet;

use axum::http::{Method, StatusCode};

use crate::schema::{Annotation, Dependency};

/// Identifies the route(s) an instruction applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    /// Route path, axum syntax (`/users/{id}`).
    pub path: String,
    /// Methods the instruction covers. A route matches when its own method
    /// set is a subset of this one.
    pub methods: HashSet<Method>,
    /// Optional handler-name disambiguator for routes sharing a path.
    pub handler_name: Option<String>,
}

impl EndpointTarget {
    /// Target all routes at `path` carrying any of `methods`.
    pub fn new(path: impl Into<String>, methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            path: path.into(),
            methods: methods.into_iter().collect(),
            handler_name: None,
        }
    }

    /// Restrict the target to routes whose handler has the given name.
    pub fn with_handler(mut self, name: impl Into<String>) -> Self {
        self.handler_name = Some(name.into());
        self
    }
}

/// Route attributes an `EndpointHad` instruction can rewrite.
///
/// `None` is the "unset" sentinel: only populated fields are applied, and
/// each applied field must actually differ from the route's current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointAttributes {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub status_code: Option<StatusCode>,
    pub tags: Option<Vec<String>>,
    pub deprecated: Option<bool>,
    pub operation_id: Option<String>,
    pub include_in_schema: Option<bool>,
    pub response_model: Option<Annotation>,
    pub dependencies: Option<Vec<Dependency>>,
}

impl EndpointAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(mut self, value: impl Into<String>) -> Self {
        self.summary = Some(value.into());
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = Some(value.into());
        self
    }

    pub fn status_code(mut self, value: StatusCode) -> Self {
        self.status_code = Some(value);
        self
    }

    pub fn tags(mut self, value: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(value.into_iter().map(Into::into).collect());
        self
    }

    pub fn deprecated(mut self, value: bool) -> Self {
        self.deprecated = Some(value);
        self
    }

    pub fn operation_id(mut self, value: impl Into<String>) -> Self {
        self.operation_id = Some(value.into());
        self
    }

    pub fn include_in_schema(mut self, value: bool) -> Self {
        self.include_in_schema = Some(value);
        self
    }

    pub fn response_model(mut self, value: Annotation) -> Self {
        self.response_model = Some(value);
        self
    }

    pub fn dependencies(mut self, value: Vec<Dependency>) -> Self {
        self.dependencies = Some(value);
        self
    }
}

/// One structural instruction inside a version change.
#[derive(Debug, Clone)]
pub enum EndpointInstruction {
    /// The endpoint did not exist at this version or earlier: mark the
    /// matching routes deleted while walking to older versions.
    DidntExist(EndpointTarget),
    /// The endpoint still existed at this version: restore the matching
    /// previously-deleted routes.
    Existed(EndpointTarget),
    /// The endpoint had different attributes at this version and earlier.
    Had {
        target: EndpointTarget,
        attributes: EndpointAttributes,
    },
}

impl EndpointInstruction {
    /// The target criteria of the instruction, regardless of kind.
    pub fn target(&self) -> &EndpointTarget {
        match self {
            EndpointInstruction::DidntExist(target) => target,
            EndpointInstruction::Existed(target) => target,
            EndpointInstruction::Had { target, .. } => target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder() {
        let target = EndpointTarget::new("/users", [Method::GET, Method::POST]).with_handler("list_users");
        assert_eq!(target.path, "/users");
        assert_eq!(target.methods.len(), 2);
        assert_eq!(target.handler_name.as_deref(), Some("list_users"));
    }

    #[test]
    fn test_attributes_default_to_unset() {
        let attrs = EndpointAttributes::new();
        assert_eq!(attrs, EndpointAttributes::default());
        assert!(attrs.status_code.is_none());
        assert!(attrs.summary.is_none());
    }

    #[test]
    fn test_instruction_target_accessor() {
        let instruction = EndpointInstruction::Had {
            target: EndpointTarget::new("/users", [Method::POST]),
            attributes: EndpointAttributes::new().status_code(StatusCode::CREATED),
        };
        assert_eq!(instruction.target().path, "/users");
    }
}
