//! Mapping descriptor parsing: one XML descriptor becomes one [`Entity`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Diagnostic, Entity, PrimaryKey, Property, Relation, RelationKind};
use crate::xml::{self, Element, XmlError};

/// Structural descriptor failures. Any of these drops the whole entity from
/// the run; element-level problems degrade to diagnostics instead.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("Malformed descriptor: {0}")]
    Xml(#[from] XmlError),
    #[error("No class declaration found")]
    MissingClass,
    #[error("Class declaration is missing the `{0}` attribute")]
    MissingClassAttr(&'static str),
    #[error("No primary key declaration found")]
    MissingPrimaryKey,
    #[error("Primary key has neither a column attribute nor a nested column")]
    MissingPrimaryKeyColumn,
}

const COLLECTION_ELEMENTS: [&str; 3] = ["set", "bag", "list"];

/// Parse one mapping descriptor. `origin` is the descriptor file name and
/// prefixes every diagnostic.
pub fn parse_descriptor(
    source: &str,
    origin: &str,
) -> Result<(Entity, Vec<Diagnostic>), EntityError> {
    let document = xml::parse_document(source)?;
    let class = find_class(&document).ok_or(EntityError::MissingClass)?;

    let name = class_attr(class, "name")?;
    let table = class_attr(class, "table")?;
    let schema = class_attr(class, "schema")?;

    let id = class.child("id").ok_or(EntityError::MissingPrimaryKey)?;
    let pk_column = column_of(id).ok_or(EntityError::MissingPrimaryKeyColumn)?;
    let pk_property = id.attr("name").unwrap_or("id").to_string();

    let mut entity = Entity {
        name,
        table,
        schema: schema.clone(),
        primary_key: PrimaryKey {
            property: pk_property,
            column: pk_column.clone(),
        },
        properties: Vec::new(),
        column_to_property: BTreeMap::new(),
        property_to_column: BTreeMap::new(),
        column_to_relation: BTreeMap::new(),
        relations: BTreeMap::new(),
    };

    // The primary-key property is always surfaced as `id` in the maps,
    // whatever the descriptor called it.
    entity
        .column_to_property
        .insert(pk_column.clone(), "id".to_string());
    entity.property_to_column.insert("id".to_string(), pk_column);

    let mut diags = Vec::new();
    let warn = |message: String, diags: &mut Vec<Diagnostic>| {
        tracing::warn!("{origin}: {message}");
        diags.push(Diagnostic::new(origin, message));
    };

    // First pass: plain properties, so relation join columns resolve against
    // the complete column map whatever the element order in the file.
    for element in class.children_named("property") {
        match parse_property(element) {
            Ok(property) => {
                // Keep the column/property maps bijective: a duplicate name
                // or column (including a property named `id`, which the
                // primary key always claims) cannot be mapped.
                if entity.property_to_column.contains_key(&property.name)
                    || entity.column_to_property.contains_key(&property.column)
                {
                    warn(
                        format!(
                            "property `{}` (column `{}`) collides with an already mapped property or column, skipped",
                            property.name, property.column
                        ),
                        &mut diags,
                    );
                    continue;
                }
                entity
                    .column_to_property
                    .insert(property.column.clone(), property.name.clone());
                entity
                    .property_to_column
                    .insert(property.name.clone(), property.column.clone());
                entity.properties.push(property);
            }
            Err(message) => warn(message, &mut diags),
        }
    }

    // Second pass: relation declarations.
    for element in &class.children {
        let parsed = match element.name.as_str() {
            "many-to-one" => {
                Some(parse_many_to_one(element, &entity.column_to_property, &schema))
            }
            name if COLLECTION_ELEMENTS.contains(&name) => parse_collection(element, &schema),
            _ => None,
        };
        match parsed {
            Some(Ok(relation)) => {
                if entity.relations.contains_key(&relation.name) {
                    warn(
                        format!("duplicate relation `{}`, skipped", relation.name),
                        &mut diags,
                    );
                    continue;
                }
                if relation.kind == RelationKind::ManyToOne {
                    entity
                        .column_to_relation
                        .insert(relation.fk_column.clone(), relation.name.clone());
                }
                entity.relations.insert(relation.name.clone(), relation);
            }
            Some(Err(message)) => warn(message, &mut diags),
            None => {}
        }
    }

    Ok((entity, diags))
}

fn parse_property(element: &Element) -> Result<Property, String> {
    let name = element
        .attr("name")
        .ok_or_else(|| "property element without a name, skipped".to_string())?
        .to_string();
    let column = column_of(element)
        .ok_or_else(|| format!("property `{name}` has no resolvable column, skipped"))?;
    let typ = element.attr("type").unwrap_or("string").to_string();
    Ok(Property { name, column, typ })
}

fn parse_many_to_one(
    element: &Element,
    column_to_property: &BTreeMap<String, String>,
    schema: &str,
) -> Result<Relation, String> {
    let name = element
        .attr("name")
        .ok_or_else(|| "many-to-one element without a name, skipped".to_string())?
        .to_string();
    let target_entity = target_of(element)
        .ok_or_else(|| format!("many-to-one `{name}` has no target entity, skipped"))?;
    let fk_column =
        column_of(element).ok_or_else(|| format!("many-to-one `{name}` has no join column, skipped"))?;
    let fk_property = column_to_property.get(&fk_column).cloned().ok_or_else(|| {
        format!("many-to-one `{name}`: join column `{fk_column}` does not match any mapped column, skipped")
    })?;

    Ok(Relation {
        kind: RelationKind::ManyToOne,
        name,
        target_entity,
        fk_column,
        fk_property: Some(fk_property),
        self_schema: Some(schema.to_string()),
        target_schema: None,
        backref: None,
    })
}

/// Collection elements wrapping a `<one-to-many>` or `<many-to-many>` child.
/// Collections of plain values declare neither and are not relations at all.
fn parse_collection(element: &Element, schema: &str) -> Option<Result<Relation, String>> {
    let (kind, target_element) = if let Some(child) = element.child("one-to-many") {
        (RelationKind::OneToMany, child)
    } else if let Some(child) = element.child("many-to-many") {
        (RelationKind::ManyToMany, child)
    } else {
        return None;
    };
    Some(parse_collection_relation(element, kind, target_element, schema))
}

fn parse_collection_relation(
    element: &Element,
    kind: RelationKind,
    target_element: &Element,
    schema: &str,
) -> Result<Relation, String> {
    let name = element
        .attr("name")
        .ok_or_else(|| format!("{} element without a name, skipped", element.name))?
        .to_string();
    let target_entity = target_of(target_element)
        .ok_or_else(|| format!("collection `{name}` has no target entity, skipped"))?;
    let key = element
        .child("key")
        .ok_or_else(|| format!("collection `{name}` has no key declaration, skipped"))?;
    let fk_column = column_of(key)
        .ok_or_else(|| format!("collection `{name}`: key declaration has no column, skipped"))?;

    // Only the many-to-one side knows the property name; left absent here
    // and filled in during resolution when a reciprocal declaration exists.
    Ok(Relation {
        kind,
        name,
        target_entity,
        fk_column,
        fk_property: None,
        self_schema: Some(schema.to_string()),
        target_schema: None,
        backref: None,
    })
}

fn find_class(document: &Element) -> Option<&Element> {
    if document.name == "class" {
        Some(document)
    } else {
        document.child("class")
    }
}

fn class_attr(class: &Element, name: &'static str) -> Result<String, EntityError> {
    class
        .attr(name)
        .map(str::to_string)
        .ok_or(EntityError::MissingClassAttr(name))
}

/// Column from an explicit attribute, else from a nested `<column>` child.
fn column_of(element: &Element) -> Option<String> {
    element
        .attr("column")
        .map(str::to_string)
        .or_else(|| {
            element
                .child("column")
                .and_then(|c| c.attr("name"))
                .map(str::to_string)
        })
}

fn target_of(element: &Element) -> Option<String> {
    element
        .attr("class")
        .or_else(|| element.attr("entity-name"))
        .map(str::to_string)
}
