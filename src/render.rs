//! Renderer for converting the resolved model to a target ORM schema.

use crate::model::{Entity, Relation, Schema};
use crate::types::map_type;

/// Render the full resolved schema, one block per entity.
pub fn render_schema(schema: &Schema) -> String {
    let mut output = String::new();
    for (i, entity) in schema.entities.values().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        render_entity(&mut output, entity);
    }
    output
}

fn render_entity(output: &mut String, entity: &Entity) {
    output.push_str(&format!("{}:\n", entity.name));
    output.push_str(&format!("  tableName: {}\n", entity.table));
    output.push_str(&format!("  schema: {}\n", entity.schema));

    output.push_str("  columns:\n");
    output.push_str("    id:\n");
    output.push_str(&format!("      column: {}\n", entity.primary_key.column));
    output.push_str("      primary: true\n");
    for property in &entity.properties {
        output.push_str(&format!("    {}:\n", property.name));
        output.push_str(&format!("      column: {}\n", property.column));
        output.push_str(&format!("      type: {}\n", map_type(&property.typ)));
    }

    if !entity.relations.is_empty() {
        output.push_str("  relations:\n");
        for relation in entity.relations.values() {
            render_relation(output, relation);
        }
    }
}

/// Absent optional fields are omitted, never rendered as null; one-sided
/// relations simply lack the lines a merged pair would carry.
fn render_relation(output: &mut String, relation: &Relation) {
    output.push_str(&format!("    {}:\n", relation.name));
    output.push_str(&format!("      class: {}\n", relation.target_entity));
    output.push_str(&format!("      type: {}\n", relation.kind));
    output.push_str(&format!("      column: {}\n", relation.fk_column));
    if let Some(property) = &relation.fk_property {
        output.push_str(&format!("      property: {}\n", property));
    }
    if let Some(backref) = &relation.backref {
        output.push_str(&format!("      foreignAlias: {}\n", backref));
    }
    if let Some(schema) = &relation.target_schema {
        output.push_str(&format!("      foreignSchema: {}\n", schema));
    }
}
