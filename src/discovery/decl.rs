//! Load-time discovery: builder-style wrappers that mirror the recognised
//! option grammars. Calling `.register(&registry)` is "executing the
//! wrapper" — it builds the descriptor and registers it, unchanged, with
//! no further validation (that is the validator's job).
//!
//! The `entity!` / `operation!` macros are thin sugar over the same
//! builder chain; they exist so a declaration site reads like an
//! annotation rather than a multi-line builder, without hiding the
//! registration call inside program-startup side effects.

use indexmap::IndexMap;

use crate::errors::Result;
use crate::model::{
    Cardinality, EntityDescriptor, FieldDescriptor, OperationDescriptor, RelationHint,
};
use crate::registry::Registry;

pub struct EntityDecl {
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    presentation: IndexMap<String, serde_json::Value>,
    attributes: IndexMap<String, FieldDescriptor>,
    relations: Vec<RelationHint>,
}

impl EntityDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            tags: Vec::new(),
            presentation: IndexMap::new(),
            attributes: IndexMap::new(),
            relations: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn presentation(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.presentation.insert(key.into(), value);
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.attributes.insert(name.into(), field);
        self
    }

    pub fn relation(
        mut self,
        field_name: impl Into<String>,
        target_entity_name: impl Into<String>,
        cardinality: Cardinality,
        via: Option<String>,
    ) -> Self {
        self.relations.push(RelationHint {
            field_name: field_name.into(),
            target_entity_name: target_entity_name.into(),
            cardinality,
            via,
        });
        self
    }

    pub fn build(self) -> EntityDescriptor {
        EntityDescriptor {
            name: self.name,
            attributes: self.attributes,
            presentation: self.presentation,
            tags: self.tags.into_iter().collect(),
            relations: self.relations,
            description: self.description,
        }
    }

    /// Executing the wrapper: registers the built descriptor and returns it
    /// unchanged, the way the original declaration site would be returned
    /// unchanged by an annotation.
    pub fn register(self, registry: &Registry) -> Result<EntityDescriptor> {
        let descriptor = self.build();
        registry.register_entity(descriptor.clone())?;
        Ok(descriptor)
    }
}

pub struct OperationDecl {
    name: String,
    input_schema_name: String,
    output_schema_name: String,
    input_fields: IndexMap<String, FieldDescriptor>,
    output_fields: IndexMap<String, FieldDescriptor>,
    reads: Vec<String>,
    writes: Vec<String>,
    category: String,
    tags: Vec<String>,
    stage: Option<String>,
    track: bool,
    description: Option<String>,
}

impl OperationDecl {
    pub fn new(
        name: impl Into<String>,
        input_schema_name: impl Into<String>,
        output_schema_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            input_schema_name: input_schema_name.into(),
            output_schema_name: output_schema_name.into(),
            input_fields: IndexMap::new(),
            output_fields: IndexMap::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            category: String::new(),
            tags: Vec::new(),
            stage: None,
            track: false,
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn track(mut self, track: bool) -> Self {
        self.track = track;
        self
    }

    pub fn reads(mut self, entity_name: impl Into<String>) -> Self {
        self.reads.push(entity_name.into());
        self
    }

    pub fn writes(mut self, entity_name: impl Into<String>) -> Self {
        self.writes.push(entity_name.into());
        self
    }

    pub fn input_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.input_fields.insert(name.into(), field);
        self
    }

    pub fn output_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.output_fields.insert(name.into(), field);
        self
    }

    pub fn build(self) -> OperationDescriptor {
        OperationDescriptor {
            name: self.name,
            input_schema_name: self.input_schema_name,
            output_schema_name: self.output_schema_name,
            input_fields: self.input_fields,
            output_fields: self.output_fields,
            reads: self.reads,
            writes: self.writes,
            category: self.category,
            tags: self.tags.into_iter().collect(),
            stage: self.stage,
            track: self.track,
            description: self.description,
        }
    }

    pub fn register(self, registry: &Registry) -> Result<OperationDescriptor> {
        let descriptor = self.build();
        registry.register_operation(descriptor.clone())?;
        Ok(descriptor)
    }
}

/// Declares and registers an entity in one call. Expands to the same
/// builder chain a hand-written declaration would use, so the source-scan
/// strategy (`discovery::source_scan`) can recover identical arguments
/// from the unexpanded source text.
#[macro_export]
macro_rules! entity {
    ($registry:expr, $name:expr) => {
        $crate::discovery::decl::EntityDecl::new($name).register($registry)
    };
}

#[macro_export]
macro_rules! operation {
    ($registry:expr, $name:expr, $input:expr, $output:expr) => {
        $crate::discovery::decl::OperationDecl::new($name, $input, $output).register($registry)
    };
}
