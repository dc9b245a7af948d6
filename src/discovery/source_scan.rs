//! Source-scan discovery: a lightweight surface parser over the builder
//! chains `discovery::decl` defines, used for bootstrap, for projects with
//! broken imports, and for the "codebase scan" CLI command. It never
//! compiles or executes the scanned source — only regex matching over the
//! call-chain text.
//!
//! Where the load-time strategy can infer a field's type from an actual
//! type object, this strategy only has the textual type name as written;
//! that is the one permitted divergence between the two strategies.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::WalkDir;

use crate::model::{
    Cardinality, EntityDescriptor, FieldDescriptor, OperationDescriptor, RelationHint,
};

static ENTITY_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)EntityDecl::new\(\s*"([^"]+)"\s*\)(.*?)\.register\("#).unwrap()
});

static OPERATION_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)OperationDecl::new\(\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"([^"]+)"\s*\)(.*?)\.register\("#,
    )
    .unwrap()
});

static DESCRIPTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.description\(\s*"([^"]*)"\s*\)"#).unwrap());
static TAG_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\.tag\(\s*"([^"]*)"\s*\)"#).unwrap());
static FIELD_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\.field\(\s*"([^"]+)"\s*,\s*FieldDescriptor::new\(\s*"([^"]+)"\s*,\s*(true|false)\s*\)\s*\)"#)
        .unwrap()
});
static INPUT_FIELD_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\.input_field\(\s*"([^"]+)"\s*,\s*FieldDescriptor::new\(\s*"([^"]+)"\s*,\s*(true|false)\s*\)\s*\)"#)
        .unwrap()
});
static OUTPUT_FIELD_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\.output_field\(\s*"([^"]+)"\s*,\s*FieldDescriptor::new\(\s*"([^"]+)"\s*,\s*(true|false)\s*\)\s*\)"#)
        .unwrap()
});
static RELATION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\.relation\(\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*Cardinality::(One|Many)\s*,\s*None\s*\)"#,
    )
    .unwrap()
});
static READS_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\.reads\(\s*"([^"]+)"\s*\)"#).unwrap());
static WRITES_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.writes\(\s*"([^"]+)"\s*\)"#).unwrap());
static CATEGORY_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.category\(\s*"([^"]*)"\s*\)"#).unwrap());
static STAGE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\.stage\(\s*"([^"]*)"\s*\)"#).unwrap());
static TRACK_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.track\(\s*(true|false)\s*\)"#).unwrap());

fn field_from_capture(type_name: &str, required: &str) -> FieldDescriptor {
    let mut field = FieldDescriptor::new(type_name, required == "true");
    field.source = crate::model::DiscoverySource::SourceScan;
    field
}

/// Extracts every `EntityDecl::new(...)...register(` chain in `source`.
pub fn scan_entities(source: &str) -> Vec<EntityDescriptor> {
    ENTITY_BLOCK
        .captures_iter(source)
        .map(|captures| {
            let name = captures[1].to_string();
            let body = &captures[2];

            let description = DESCRIPTION_CALL
                .captures(body)
                .map(|c| c[1].to_string())
                .filter(|d| !d.is_empty());
            let tags = TAG_CALL
                .captures_iter(body)
                .map(|c| c[1].to_string())
                .collect();
            let attributes = FIELD_CALL
                .captures_iter(body)
                .map(|c| (c[1].to_string(), field_from_capture(&c[2], &c[3])))
                .collect();
            let relations = RELATION_CALL
                .captures_iter(body)
                .map(|c| RelationHint {
                    field_name: c[1].to_string(),
                    target_entity_name: c[2].to_string(),
                    cardinality: if &c[3] == "One" {
                        Cardinality::One
                    } else {
                        Cardinality::Many
                    },
                    via: None,
                })
                .collect();

            EntityDescriptor {
                name,
                attributes,
                presentation: Default::default(),
                tags,
                relations,
                description,
            }
        })
        .collect()
}

/// Extracts every `OperationDecl::new(...)...register(` chain in `source`.
pub fn scan_operations(source: &str) -> Vec<OperationDescriptor> {
    OPERATION_BLOCK
        .captures_iter(source)
        .map(|captures| {
            let name = captures[1].to_string();
            let input_schema_name = captures[2].to_string();
            let output_schema_name = captures[3].to_string();
            let body = &captures[4];

            let description = DESCRIPTION_CALL
                .captures(body)
                .map(|c| c[1].to_string())
                .filter(|d| !d.is_empty());
            let tags = TAG_CALL
                .captures_iter(body)
                .map(|c| c[1].to_string())
                .collect();
            let input_fields = INPUT_FIELD_CALL
                .captures_iter(body)
                .map(|c| (c[1].to_string(), field_from_capture(&c[2], &c[3])))
                .collect();
            let output_fields = OUTPUT_FIELD_CALL
                .captures_iter(body)
                .map(|c| (c[1].to_string(), field_from_capture(&c[2], &c[3])))
                .collect();
            let reads = READS_CALL
                .captures_iter(body)
                .map(|c| c[1].to_string())
                .collect();
            let writes = WRITES_CALL
                .captures_iter(body)
                .map(|c| c[1].to_string())
                .collect();
            let category = CATEGORY_CALL
                .captures(body)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let stage = STAGE_CALL.captures(body).map(|c| c[1].to_string());
            let track = TRACK_CALL
                .captures(body)
                .map(|c| &c[1] == "true")
                .unwrap_or(false);

            OperationDescriptor {
                name,
                input_schema_name,
                output_schema_name,
                input_fields,
                output_fields,
                reads,
                writes,
                category,
                tags,
                stage,
                track,
                description,
            }
        })
        .collect()
}

/// Recursively scans every file under `dir` and returns all entities found,
/// in file-then-in-file-position order (the order `walkdir` yields paths,
/// which is deterministic for a given filesystem layout).
pub fn scan_entities_dir(dir: &Path) -> std::io::Result<Vec<EntityDescriptor>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            let content = std::fs::read_to_string(entry.path())?;
            found.extend(scan_entities(&content));
        }
    }
    Ok(found)
}

pub fn scan_operations_dir(dir: &Path) -> std::io::Result<Vec<OperationDescriptor>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            let content = std::fs::read_to_string(entry.path())?;
            found.extend(scan_operations(&content));
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_entity_declaration_chain() {
        let source = r#"
            EntityDecl::new("User")
                .description("A registered user")
                .tag("core")
                .field("email", FieldDescriptor::new("string", true))
                .relation("team_id", "Team", Cardinality::One, None)
                .register(&registry)?;
        "#;
        let entities = scan_entities(source);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "User");
        assert_eq!(entities[0].attributes.len(), 1);
        assert_eq!(entities[0].relations.len(), 1);
        assert_eq!(entities[0].tags.len(), 1);
    }

    #[test]
    fn scans_operation_declaration_chain() {
        let source = r#"
            OperationDecl::new("payment.charge", "ChargeInput", "ChargeOutput")
                .reads("Validation")
                .writes("Charge")
                .track(true)
                .register(&registry)?;
        "#;
        let operations = scan_operations(source);
        assert_eq!(operations.len(), 1);
        assert_eq!(operations[0].name, "payment.charge");
        assert_eq!(operations[0].reads, vec!["Validation".to_string()]);
        assert_eq!(operations[0].writes, vec!["Charge".to_string()]);
        assert!(operations[0].track);
    }

    #[test]
    fn scans_multiple_declarations_in_order() {
        let source = r#"
            EntityDecl::new("Alpha").register(&registry)?;
            EntityDecl::new("Beta").register(&registry)?;
        "#;
        let entities = scan_entities(source);
        let names: Vec<_> = entities.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }
}
