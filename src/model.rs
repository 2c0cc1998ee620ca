use std::collections::BTreeMap;
use std::fmt;

/// Cardinality of a relation as declared on one side of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::ManyToOne => "many-to-one",
            RelationKind::OneToMany => "one-to-many",
            RelationKind::ManyToMany => "many-to-many",
        };
        f.write_str(s)
    }
}

/// A plain mapped property: one column of the entity's table.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub column: String,
    pub typ: String,
}

/// The single primary key of an entity.
///
/// `property` keeps the name declared in the descriptor; the bijective
/// column/property maps always surface the primary key as `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKey {
    pub property: String,
    pub column: String,
}

/// One side of a relationship, as declared by a single descriptor.
///
/// Built one-sided at parse time and refined in place during resolution.
/// Optional fields use `None` as a first-class "absent" state so that
/// "never overwrite an already-resolved value" checks are unambiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub kind: RelationKind,
    pub name: String,
    pub target_entity: String,
    pub fk_column: String,
    /// Property owning `fk_column` on the declaring entity. Resolved at parse
    /// time on the many-to-one side; absent on collection sides until merged.
    pub fk_property: Option<String>,
    /// Schema of the declaring entity, copied from it at parse time.
    pub self_schema: Option<String>,
    /// Schema of the target entity; absent until resolution.
    pub target_schema: Option<String>,
    /// Name of the reciprocal relation on the target entity; absent until
    /// resolution, and left absent for one-sided relations.
    pub backref: Option<String>,
}

/// A fully parsed entity: one descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub table: String,
    pub schema: String,
    pub primary_key: PrimaryKey,
    /// Plain properties in order of appearance in the descriptor.
    pub properties: Vec<Property>,
    pub column_to_property: BTreeMap<String, String>,
    pub property_to_column: BTreeMap<String, String>,
    /// Foreign-key column name -> owning relation name (many-to-one only).
    pub column_to_relation: BTreeMap<String, String>,
    pub relations: BTreeMap<String, Relation>,
}

/// The full entity set, keyed by entity name.
///
/// Relations are addressed as `(entity name, relation name)` pairs during
/// resolution; no record ever holds a live reference into another entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub entities: BTreeMap<String, Entity>,
}

impl Schema {
    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.name.clone(), entity);
    }
}

/// A recoverable problem, prefixed with the descriptor it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub origin: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}
