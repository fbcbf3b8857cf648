//! Version changes: named bundles of instructions.

use crate::structure::data::{RequestByPath, RequestBySchema, ResponseBySchema};
use crate::structure::endpoints::EndpointInstruction;

/// A named bundle of structural and payload-migration instructions scoped to
/// one version boundary.
///
/// Immutable once built; owned by exactly one [`Version`].
///
/// [`Version`]: crate::structure::Version
#[derive(Debug, Clone)]
pub struct VersionChange {
    name: String,
    description: String,
    pub(crate) endpoint_instructions: Vec<EndpointInstruction>,
    pub(crate) request_by_schema: Vec<RequestBySchema>,
    pub(crate) request_by_path: Vec<RequestByPath>,
    pub(crate) response_by_schema: Vec<ResponseBySchema>,
}

impl VersionChange {
    pub fn builder(name: impl Into<String>) -> VersionChangeBuilder {
        VersionChangeBuilder {
            change: VersionChange {
                name: name.into(),
                description: String::new(),
                endpoint_instructions: Vec::new(),
                request_by_schema: Vec::new(),
                request_by_path: Vec::new(),
                response_by_schema: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn endpoint_instructions(&self) -> &[EndpointInstruction] {
        &self.endpoint_instructions
    }
}

/// Builder for [`VersionChange`]. Instructions keep their insertion order;
/// migrations within one change apply in the order they were added.
#[derive(Debug)]
pub struct VersionChangeBuilder {
    change: VersionChange,
}

impl VersionChangeBuilder {
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.change.description = text.into();
        self
    }

    pub fn endpoint(mut self, instruction: EndpointInstruction) -> Self {
        self.change.endpoint_instructions.push(instruction);
        self
    }

    pub fn migrate_request_by_schema(mut self, instruction: RequestBySchema) -> Self {
        self.change.request_by_schema.push(instruction);
        self
    }

    pub fn migrate_request_by_path(mut self, instruction: RequestByPath) -> Self {
        self.change.request_by_path.push(instruction);
        self
    }

    pub fn migrate_response_by_schema(mut self, instruction: ResponseBySchema) -> Self {
        self.change.response_by_schema.push(instruction);
        self
    }

    pub fn build(self) -> VersionChange {
        self.change
    }
}
