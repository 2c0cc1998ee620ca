//! Bidirectional relation resolution over the full entity set.
//!
//! Descriptors only declare their own half of a relationship. This pass
//! pairs up reciprocal declarations: two relations on opposite entities
//! referencing the same join column and pointing at each other. It merges
//! them in place: back-reference names, the foreign-key property, and
//! target schemas flow to whichever side is missing them. Every mutation checks for an
//! absent value before writing, so a pair converges to the same merged
//! state no matter which side is visited first.

use crate::model::{Diagnostic, RelationKind, Schema};

/// Resolve all relations in place. Returns diagnostics for references that
/// could not be resolved; those relations stay one-sided, never dropped.
pub fn resolve(schema: &mut Schema) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let pending: Vec<(String, String)> = schema
        .entities
        .values()
        .flat_map(|entity| {
            entity
                .relations
                .keys()
                .map(move |relation| (entity.name.clone(), relation.clone()))
        })
        .collect();

    for (entity_name, relation_name) in pending {
        resolve_relation(schema, &entity_name, &relation_name, &mut diags);
    }
    diags
}

fn resolve_relation(
    schema: &mut Schema,
    entity_name: &str,
    relation_name: &str,
    diags: &mut Vec<Diagnostic>,
) {
    let Some(relation) = schema
        .entities
        .get(entity_name)
        .and_then(|e| e.relations.get(relation_name))
    else {
        return;
    };
    // Already merged from the other side
    if relation.backref.is_some() {
        return;
    }
    let kind = relation.kind;
    let target_name = relation.target_entity.clone();
    let fk_column = relation.fk_column.clone();
    let self_schema = relation.self_schema.clone();

    let Some(target) = schema.entities.get(&target_name) else {
        let message =
            format!("relation `{relation_name}` refers to unknown entity `{target_name}`");
        tracing::warn!("{entity_name}: {message}");
        diags.push(Diagnostic::new(entity_name, message));
        return;
    };
    let target_entity_schema = target.schema.clone();

    // Reciprocal pairing is not attempted for many-to-many; both sides are
    // generated independently. A relation never matches itself, which keeps
    // self-referential entities from pairing a declaration with its own slot.
    let reciprocal = if kind == RelationKind::ManyToMany {
        None
    } else {
        target
            .relations
            .values()
            .find(|v| {
                v.kind != RelationKind::ManyToMany
                    && v.fk_column == fk_column
                    && v.target_entity == entity_name
                    && !(target_name == entity_name && v.name == relation_name)
            })
            .map(|v| (v.name.clone(), v.fk_property.clone(), v.self_schema.clone()))
    };

    // Mutate this side.
    let merged_fk_property = {
        let Some(relation) = schema
            .entities
            .get_mut(entity_name)
            .and_then(|e| e.relations.get_mut(relation_name))
        else {
            return;
        };
        relation.target_schema = Some(target_entity_schema);

        let Some((reciprocal_name, reciprocal_fk_property, reciprocal_self_schema)) = &reciprocal
        else {
            return;
        };
        // The declaring side's explicit schema wins over the target
        // entity's own schema.
        if reciprocal_self_schema.is_some() {
            relation.target_schema = reciprocal_self_schema.clone();
        }
        if relation.backref.is_none() {
            relation.backref = Some(reciprocal_name.clone());
        }
        if relation.fk_property.is_none() {
            relation.fk_property = reciprocal_fk_property.clone();
        }
        relation.fk_property.clone()
    };

    // Mutate the reciprocal side.
    let Some((reciprocal_name, _, _)) = reciprocal else {
        return;
    };
    let Some(reciprocal) = schema
        .entities
        .get_mut(&target_name)
        .and_then(|e| e.relations.get_mut(&reciprocal_name))
    else {
        return;
    };
    if reciprocal.backref.is_none() {
        reciprocal.backref = Some(relation_name.to_string());
    }
    if reciprocal.fk_property.is_none() {
        reciprocal.fk_property = merged_fk_property;
    }
    if kind == RelationKind::OneToMany {
        if self_schema.is_some() {
            reciprocal.target_schema = self_schema;
        }
    } else if reciprocal.target_schema.is_none() {
        reciprocal.target_schema = self_schema;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::parse_descriptor;

    const USER: &str = r#"
        <class name="User" table="users" schema="app">
            <id column="id"/>
            <property name="authorId" column="author_id" type="long"/>
            <many-to-one name="author" class="Post" column="author_id"/>
        </class>
    "#;

    const POST: &str = r#"
        <class name="Post" table="posts" schema="app">
            <id column="id"/>
            <set name="comments">
                <key column="author_id"/>
                <one-to-many class="User"/>
            </set>
        </class>
    "#;

    fn schema_of(descriptors: &[&str]) -> Schema {
        let mut schema = Schema::default();
        for source in descriptors {
            let (entity, diags) = parse_descriptor(source, "test.xml").unwrap();
            assert!(diags.is_empty());
            schema.insert(entity);
        }
        schema
    }

    #[test]
    fn test_reciprocal_pair_merged() {
        let mut schema = schema_of(&[USER, POST]);
        let diags = resolve(&mut schema);
        assert!(diags.is_empty());

        let author = &schema.entities["User"].relations["author"];
        let comments = &schema.entities["Post"].relations["comments"];
        assert_eq!(author.backref.as_deref(), Some("comments"));
        assert_eq!(comments.backref.as_deref(), Some("author"));
        // The collection side inherits the property name from the FK owner
        assert_eq!(author.fk_property.as_deref(), Some("authorId"));
        assert_eq!(comments.fk_property.as_deref(), Some("authorId"));
        assert_eq!(author.target_schema.as_deref(), Some("app"));
        assert_eq!(comments.target_schema.as_deref(), Some("app"));
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let mut forward = schema_of(&[USER, POST]);
        let mut reverse = schema_of(&[USER, POST]);

        let mut diags = Vec::new();
        resolve_relation(&mut forward, "User", "author", &mut diags);
        resolve_relation(&mut forward, "Post", "comments", &mut diags);

        resolve_relation(&mut reverse, "Post", "comments", &mut diags);
        resolve_relation(&mut reverse, "User", "author", &mut diags);

        assert!(diags.is_empty());
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_unknown_target_left_unresolved() {
        let mut schema = schema_of(&[USER]);
        let diags = resolve(&mut schema);

        let author = &schema.entities["User"].relations["author"];
        assert_eq!(author.target_schema, None);
        assert_eq!(author.backref, None);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].origin, "User");
        assert!(diags[0].message.contains("unknown entity `Post`"));
    }

    #[test]
    fn test_one_sided_relation_keeps_target_schema() {
        // Post exists but declares no reciprocal relation
        let post = r#"
            <class name="Post" table="posts" schema="blog">
                <id column="id"/>
            </class>
        "#;
        let mut schema = schema_of(&[USER, post]);
        let diags = resolve(&mut schema);
        assert!(diags.is_empty());

        let author = &schema.entities["User"].relations["author"];
        assert_eq!(author.target_schema.as_deref(), Some("blog"));
        assert_eq!(author.backref, None);
        assert_eq!(author.fk_property.as_deref(), Some("authorId"));
    }

    #[test]
    fn test_join_column_mismatch_is_not_reciprocal() {
        let post = r#"
            <class name="Post" table="posts" schema="app">
                <id column="id"/>
                <set name="comments">
                    <key column="editor_id"/>
                    <one-to-many class="User"/>
                </set>
            </class>
        "#;
        let mut schema = schema_of(&[USER, post]);
        resolve(&mut schema);

        let author = &schema.entities["User"].relations["author"];
        let comments = &schema.entities["Post"].relations["comments"];
        assert_eq!(author.backref, None);
        assert_eq!(comments.backref, None);
        // Both still point at a known entity
        assert_eq!(author.target_schema.as_deref(), Some("app"));
        assert_eq!(comments.target_schema.as_deref(), Some("app"));
    }

    #[test]
    fn test_many_to_many_never_gets_backref() {
        let user = r#"
            <class name="User" table="users" schema="app">
                <id column="id"/>
                <bag name="groups">
                    <key column="membership_id"/>
                    <many-to-many class="Group"/>
                </bag>
            </class>
        "#;
        let group = r#"
            <class name="Group" table="groups" schema="app">
                <id column="id"/>
                <bag name="members">
                    <key column="membership_id"/>
                    <many-to-many class="User"/>
                </bag>
            </class>
        "#;
        let mut schema = schema_of(&[user, group]);
        let diags = resolve(&mut schema);
        assert!(diags.is_empty());

        let groups = &schema.entities["User"].relations["groups"];
        let members = &schema.entities["Group"].relations["members"];
        assert_eq!(groups.backref, None);
        assert_eq!(members.backref, None);
        assert_eq!(groups.target_schema.as_deref(), Some("app"));
        assert_eq!(members.target_schema.as_deref(), Some("app"));
    }

    #[test]
    fn test_many_to_one_never_pairs_with_many_to_many() {
        // Post declares a many-to-many over the same key column User's
        // many-to-one uses; the kinds cannot form one logical relationship
        let post = r#"
            <class name="Post" table="posts" schema="app">
                <id column="id"/>
                <bag name="things">
                    <key column="author_id"/>
                    <many-to-many class="User"/>
                </bag>
            </class>
        "#;
        let mut schema = schema_of(&[USER, post]);
        resolve(&mut schema);

        let author = &schema.entities["User"].relations["author"];
        let things = &schema.entities["Post"].relations["things"];
        assert_eq!(things.backref, None);
        assert_eq!(things.fk_property, None);
        assert_eq!(author.backref, None);
        assert_eq!(author.target_schema.as_deref(), Some("app"));
        assert_eq!(things.target_schema.as_deref(), Some("app"));
    }

    #[test]
    fn test_cross_schema_pair() {
        let order = r#"
            <class name="Order" table="orders" schema="sales">
                <id column="id"/>
                <property name="customerId" column="customer_id" type="long"/>
                <many-to-one name="customer" class="Customer" column="customer_id"/>
            </class>
        "#;
        let customer = r#"
            <class name="Customer" table="customers" schema="crm">
                <id column="id"/>
                <set name="orders">
                    <key column="customer_id"/>
                    <one-to-many class="Order"/>
                </set>
            </class>
        "#;
        let mut schema = schema_of(&[order, customer]);
        resolve(&mut schema);

        let customer_rel = &schema.entities["Order"].relations["customer"];
        let orders_rel = &schema.entities["Customer"].relations["orders"];
        assert_eq!(customer_rel.target_schema.as_deref(), Some("crm"));
        assert_eq!(orders_rel.target_schema.as_deref(), Some("sales"));
        assert_eq!(customer_rel.backref.as_deref(), Some("orders"));
        assert_eq!(orders_rel.backref.as_deref(), Some("customer"));
    }

    #[test]
    fn test_self_referential_entity() {
        let employee = r#"
            <class name="Employee" table="employees" schema="hr">
                <id column="id"/>
                <property name="managerId" column="manager_id" type="long"/>
                <many-to-one name="manager" class="Employee" column="manager_id"/>
                <set name="reports">
                    <key column="manager_id"/>
                    <one-to-many class="Employee"/>
                </set>
            </class>
        "#;
        let mut schema = schema_of(&[employee]);
        let diags = resolve(&mut schema);
        assert!(diags.is_empty());

        let manager = &schema.entities["Employee"].relations["manager"];
        let reports = &schema.entities["Employee"].relations["reports"];
        assert_eq!(manager.backref.as_deref(), Some("reports"));
        assert_eq!(reports.backref.as_deref(), Some("manager"));
        assert_eq!(reports.fk_property.as_deref(), Some("managerId"));
    }
}
