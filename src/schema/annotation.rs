//! The annotation tree.
//!
//! # Responsibilities
//! - Describe every type annotation a route can carry: schema references,
//!   container generics, unions, dependency wrappers, callable descriptors
//! - Give the rewriter an explicit structure to recurse over
//!
//! # Design Decisions
//! - Annotations are explicit descriptors built at registration time, not
//!   reconstructed through runtime reflection
//! - Schema references are logical names resolved through the registry;
//!   `version` records which variant a reference currently points at
//! - Callable descriptors keep parameter names, kinds and order so rebuilt
//!   callables stay introspectable

use std::sync::Arc;

use serde_json::Value;

use crate::structure::ApiVersion;

/// Which schema variant a type reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    /// The author-maintained template ("latest") variant.
    Template,
    /// The variant belonging to one historical version.
    Pinned(ApiVersion),
}

/// Kind of a versioned schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A request/response model.
    Model,
    /// An enumeration.
    Enum,
}

/// A reference to a schema type by logical name.
///
/// Two references are the same type iff name, kind and version all match.
/// The rewriter interns references per (name, target version) so repeated
/// occurrences resolve to the same `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
    pub version: SchemaVersion,
}

/// How a callable parameter is filled in by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Path segment capture.
    Path,
    /// Query string parameter.
    Query,
    /// Header value.
    Header,
    /// The parsed request body.
    Body,
    /// Resolved by invoking a dependency.
    Dependency,
    /// Hidden request/response context injected by the generator.
    Context,
}

/// Default value of a callable parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// A plain JSON constant.
    Value(Value),
    /// A dependency wrapper used as a default, resolved per request.
    Dependency(Dependency),
}

/// One parameter of a callable descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub annotation: Annotation,
    pub default: Option<ParamDefault>,
}

impl Param {
    pub fn new(name: impl Into<String>, kind: ParamKind, annotation: Annotation) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation,
            default: None,
        }
    }

    pub fn with_default(mut self, default: ParamDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// The request body parameter, annotated with its schema.
    pub fn body(name: impl Into<String>, annotation: Annotation) -> Self {
        Self::new(name, ParamKind::Body, annotation)
    }

    pub fn path(name: impl Into<String>, annotation: Annotation) -> Self {
        Self::new(name, ParamKind::Path, annotation)
    }

    pub fn query(name: impl Into<String>, annotation: Annotation) -> Self {
        Self::new(name, ParamKind::Query, annotation)
    }
}

/// An introspectable description of a handler or dependency callable:
/// name, sync/async-ness, ordered parameters and return annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableSpec {
    pub name: String,
    pub is_async: bool,
    pub params: Vec<Param>,
    pub returns: Option<Annotation>,
}

impl CallableSpec {
    /// Describe an asynchronous callable.
    pub fn async_fn(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_async: true,
            params: Vec::new(),
            returns: None,
        }
    }

    /// Describe a synchronous (blocking) callable.
    pub fn sync_fn(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_async: false,
            params: Vec::new(),
            returns: None,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, annotation: Annotation) -> Self {
        self.returns = Some(annotation);
        self
    }

    /// Look up a parameter by name.
    pub fn find_param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// A dependency-injection wrapper around a callable.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub callable: Arc<CallableSpec>,
    /// Whether the framework may reuse the resolved value within one request.
    pub use_cache: bool,
}

impl Dependency {
    pub fn new(callable: CallableSpec) -> Self {
        Self {
            callable: Arc::new(callable),
            use_cache: true,
        }
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }
}

/// A type annotation, recursed over by the version rewriter.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// The unconstrained "any" type; never rewritten.
    Any,
    /// A semantically opaque named alias; never rewritten.
    Opaque(String),
    /// A mapping; both keys and values are rewritten.
    Map(Vec<(Annotation, Annotation)>),
    /// An ordered sequence.
    Sequence(Vec<Annotation>),
    /// A fixed-arity tuple.
    Tuple(Vec<Annotation>),
    /// A parameterized generic such as `Vec` or `Option`.
    Generic { name: String, args: Vec<Annotation> },
    /// A union of alternatives.
    Union(Vec<Annotation>),
    /// A dependency wrapper; the wrapped callable is rewritten.
    Dependency(Dependency),
    /// A schema type reference.
    Type(Arc<TypeRef>),
    /// A callable descriptor.
    Callable(Arc<CallableSpec>),
    /// A plain constant; never rewritten.
    Value(Value),
}

impl Annotation {
    /// A reference to a template schema model by logical name.
    pub fn schema(name: impl Into<String>) -> Self {
        Annotation::Type(Arc::new(TypeRef {
            name: name.into(),
            kind: TypeKind::Model,
            version: SchemaVersion::Template,
        }))
    }

    /// A reference to a template enumeration by logical name.
    pub fn enumeration(name: impl Into<String>) -> Self {
        Annotation::Type(Arc::new(TypeRef {
            name: name.into(),
            kind: TypeKind::Enum,
            version: SchemaVersion::Template,
        }))
    }

    /// `Vec<inner>`.
    pub fn list(inner: Annotation) -> Self {
        Annotation::Generic {
            name: "Vec".to_string(),
            args: vec![inner],
        }
    }

    /// `Option<inner>`.
    pub fn option(inner: Annotation) -> Self {
        Annotation::Generic {
            name: "Option".to_string(),
            args: vec![inner],
        }
    }

    /// The logical schema name if this annotation is a bare type reference.
    pub fn schema_name(&self) -> Option<&str> {
        match self {
            Annotation::Type(type_ref) => Some(&type_ref.name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_constructor_points_at_template() {
        let annotation = Annotation::schema("UserResource");
        match &annotation {
            Annotation::Type(type_ref) => {
                assert_eq!(type_ref.name, "UserResource");
                assert_eq!(type_ref.version, SchemaVersion::Template);
                assert_eq!(type_ref.kind, TypeKind::Model);
            }
            other => panic!("expected type annotation, got {other:?}"),
        }
    }

    #[test]
    fn test_schema_name_only_for_bare_refs() {
        assert_eq!(Annotation::schema("User").schema_name(), Some("User"));
        assert_eq!(Annotation::list(Annotation::schema("User")).schema_name(), None);
        assert_eq!(Annotation::Any.schema_name(), None);
    }

    #[test]
    fn test_callable_spec_builder() {
        let spec = CallableSpec::async_fn("create_user")
            .param(Param::body("payload", Annotation::schema("UserCreateRequest")))
            .param(Param::path("id", Annotation::Opaque("Uuid".to_string())))
            .returns(Annotation::schema("UserResource"));

        assert!(spec.is_async);
        assert_eq!(spec.params.len(), 2);
        assert_eq!(spec.params[0].name, "payload");
        assert!(spec.find_param("id").is_some());
        assert!(spec.find_param("missing").is_none());
    }
}
