//! The per-version schema type registry.
//!
//! # Responsibilities
//! - Record where every versioned schema type is declared on disk
//! - Answer "is this logical name versioned at all?" for the rewriter
//! - Validate the on-disk directory contract: a `latest` template directory
//!   with one sibling directory per declared version
//!
//! # Design Decisions
//! - An explicit registry populated at schema-module load time replaces
//!   open-world module reflection; lookups are by logical type name
//! - Types not present in the registry are simply not versioned and pass
//!   through the rewriter unchanged
//! - Source locations are kept so using a version-pinned declaration where
//!   the template was required can be reported as the author error it is

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::GenerationError;
use crate::schema::annotation::TypeKind;
use crate::structure::ApiVersion;

/// A declared schema type: logical name, kind and source location.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// File or directory the declaration lives in.
    pub source: PathBuf,
}

impl TypeDecl {
    pub fn model(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Model,
            source: source.into(),
        }
    }

    pub fn enumeration(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Enum,
            source: source.into(),
        }
    }
}

/// Registry of versioned schema types, rooted at the schema directory tree.
///
/// The template directory holds the author-maintained "latest" variant of
/// every type; version directories are derived views named after the version
/// date (`v2021_01_01`).
#[derive(Debug)]
pub struct SchemaRegistry {
    root: PathBuf,
    template_dir: PathBuf,
    declared: HashMap<String, TypeDecl>,
}

impl SchemaRegistry {
    /// Open a registry over the given template ("latest") directory.
    ///
    /// The directory must exist and must be named `latest`; its parent is the
    /// schema root under which version directories are expected.
    pub fn new(template_dir: impl Into<PathBuf>) -> Result<Self, GenerationError> {
        let template_dir = template_dir.into();
        if !template_dir.is_dir() {
            return Err(GenerationError::TemplateNotADirectory { path: template_dir });
        }
        let name = template_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name != "latest" {
            return Err(GenerationError::TemplateNotNamedLatest { name });
        }
        let root = template_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            root,
            template_dir,
            declared: HashMap::new(),
        })
    }

    /// Record a type declaration. Later declarations of the same logical name
    /// replace earlier ones.
    pub fn declare(&mut self, decl: TypeDecl) -> &mut Self {
        tracing::trace!(name = %decl.name, source = %decl.source.display(), "schema type declared");
        self.declared.insert(decl.name.clone(), decl);
        self
    }

    /// Declare a model in the template directory.
    pub fn declare_template_model(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let source = self.template_dir.clone();
        self.declare(TypeDecl::model(name, source))
    }

    /// Declare an enumeration in the template directory.
    pub fn declare_template_enum(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        let source = self.template_dir.clone();
        self.declare(TypeDecl::enumeration(name, source))
    }

    /// Look up a declaration. `None` means the name is not versioned.
    pub fn lookup(&self, name: &str) -> Option<&TypeDecl> {
        self.declared.get(name)
    }

    /// The schema root directory (parent of `latest` and the version dirs).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The template ("latest") directory.
    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Directory holding one version's schema variants.
    pub fn version_dir(&self, version: ApiVersion) -> PathBuf {
        self.root.join(version.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_schema_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir()
            .join("timegate-registry-tests")
            .join(format!("{tag}-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(root.join("latest")).unwrap();
        root
    }

    #[test]
    fn test_rejects_missing_template_dir() {
        let err = SchemaRegistry::new("/definitely/not/a/dir/latest").unwrap_err();
        assert!(matches!(err, GenerationError::TemplateNotADirectory { .. }));
    }

    #[test]
    fn test_rejects_misnamed_template_dir() {
        let root = scratch_schema_root("misnamed");
        fs::create_dir_all(root.join("current")).unwrap();
        let err = SchemaRegistry::new(root.join("current")).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TemplateNotNamedLatest { name } if name == "current"
        ));
    }

    #[test]
    fn test_version_dir_layout() {
        let root = scratch_schema_root("layout");
        let registry = SchemaRegistry::new(root.join("latest")).unwrap();
        assert_eq!(registry.root(), root);
        assert_eq!(
            registry.version_dir(ApiVersion::new(2021, 1, 1)),
            root.join("v2021_01_01")
        );
    }

    #[test]
    fn test_lookup_declared_types() {
        let root = scratch_schema_root("lookup");
        let mut registry = SchemaRegistry::new(root.join("latest")).unwrap();
        registry.declare_template_model("UserResource");

        let decl = registry.lookup("UserResource").unwrap();
        assert_eq!(decl.kind, TypeKind::Model);
        assert!(decl.source.starts_with(registry.template_dir()));
        assert!(registry.lookup("Unversioned").is_none());
    }
}
