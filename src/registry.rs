//! Process-scoped tables of entity and operation descriptors.
//!
//! Writes happen only during discovery (single-threaded); once discovery
//! completes the registry is read from any thread. A `parking_lot::RwLock`
//! per table is cheap enough that there is no reason to special-case the
//! single-writer phase, matching the general lock discipline of the
//! teacher's cache subsystem.

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::errors::{EngineError, Result};
use crate::model::{EntityDescriptor, OperationDescriptor};

#[derive(Default)]
pub struct Registry {
    entities: RwLock<IndexMap<String, EntityDescriptor>>,
    operations: RwLock<IndexMap<String, OperationDescriptor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_entity(&self, descriptor: EntityDescriptor) -> Result<()> {
        let mut entities = self.entities.write();
        if entities.contains_key(&descriptor.name) {
            return Err(EngineError::DuplicateName {
                kind: "entity",
                name: descriptor.name,
            });
        }
        entities.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn register_operation(&self, descriptor: OperationDescriptor) -> Result<()> {
        let mut operations = self.operations.write();
        if operations.contains_key(&descriptor.name) {
            return Err(EngineError::DuplicateName {
                kind: "operation",
                name: descriptor.name,
            });
        }
        operations.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn get_entity(&self, name: &str) -> Option<EntityDescriptor> {
        self.entities.read().get(name).cloned()
    }

    pub fn get_operation(&self, name: &str) -> Option<OperationDescriptor> {
        self.operations.read().get(name).cloned()
    }

    /// Ordered snapshot in insertion order.
    pub fn list_entities(&self) -> Vec<EntityDescriptor> {
        self.entities.read().values().cloned().collect()
    }

    /// Ordered snapshot in insertion order.
    pub fn list_operations(&self) -> Vec<OperationDescriptor> {
        self.operations.read().values().cloned().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.read().len()
    }

    /// Removes everything. Used only by tests and explicit reload.
    pub fn clear(&self) {
        self.entities.write().clear();
        self.operations.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str) -> EntityDescriptor {
        EntityDescriptor {
            name: name.to_string(),
            attributes: IndexMap::new(),
            presentation: IndexMap::new(),
            tags: Default::default(),
            relations: Vec::new(),
            description: None,
        }
    }

    #[test]
    fn register_and_fetch_roundtrip() {
        let registry = Registry::new();
        registry.register_entity(entity("User")).unwrap();
        let fetched = registry.get_entity("User").unwrap();
        assert_eq!(fetched.name, "User");
        assert!(registry.get_entity("Missing").is_none());
    }

    #[test]
    fn duplicate_entity_name_fails() {
        let registry = Registry::new();
        registry.register_entity(entity("User")).unwrap();
        let err = registry.register_entity(entity("User")).unwrap_err();
        match err {
            EngineError::DuplicateName { kind, name } => {
                assert_eq!(kind, "entity");
                assert_eq!(name, "User");
            }
            other => panic!("expected DuplicateName, got {other:?}"),
        }
    }

    #[test]
    fn list_preserves_insertion_order() {
        let registry = Registry::new();
        registry.register_entity(entity("Zeta")).unwrap();
        registry.register_entity(entity("Alpha")).unwrap();
        let names: Vec<_> = registry.list_entities().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn clear_empties_both_tables() {
        let registry = Registry::new();
        registry.register_entity(entity("User")).unwrap();
        registry.clear();
        assert_eq!(registry.entity_count(), 0);
        assert_eq!(registry.operation_count(), 0);
    }
}
