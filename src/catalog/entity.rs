//! Entity definitions - typed scalar fields and named relations.

use serde::{Deserialize, Serialize};

/// Semantic type of a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Date,
    Blob,
    Enum,
    Json,
}

impl FieldType {
    /// Types with a meaningful total order (range comparisons apply).
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Int | FieldType::Float | FieldType::Date | FieldType::Enum
        )
    }

    /// Types usable in membership tests (IN).
    pub fn is_discrete(self) -> bool {
        !matches!(self, FieldType::Blob | FieldType::Json)
    }

    /// Types usable in substring matching (LIKE).
    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::String)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Blob => "blob",
            FieldType::Enum => "enum",
            FieldType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// A scalar column on an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
}

impl ScalarField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A named relation to another entity.
///
/// `ToOne` means this entity holds the foreign key (`fk_column` is a column
/// here). `ToMany` is the inverse: `fk_column` is the column on the *target*
/// entity that points back at this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relation {
    ToOne {
        name: String,
        target: String,
        #[serde(rename = "fk")]
        fk_column: String,
        #[serde(default)]
        nullable: bool,
    },
    ToMany {
        name: String,
        target: String,
        #[serde(rename = "fk")]
        fk_column: String,
    },
}

impl Relation {
    pub fn to_one(name: &str, target: &str, fk_column: &str) -> Self {
        Relation::ToOne {
            name: name.into(),
            target: target.into(),
            fk_column: fk_column.into(),
            nullable: false,
        }
    }

    pub fn to_many(name: &str, target: &str, fk_column: &str) -> Self {
        Relation::ToMany {
            name: name.into(),
            target: target.into(),
            fk_column: fk_column.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Relation::ToOne { name, .. } | Relation::ToMany { name, .. } => name,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Relation::ToOne { target, .. } | Relation::ToMany { target, .. } => target,
        }
    }

    pub fn fk_column(&self) -> &str {
        match self {
            Relation::ToOne { fk_column, .. } | Relation::ToMany { fk_column, .. } => fk_column,
        }
    }

    /// True for the multi-valued side (joins through it can fan out rows).
    pub fn is_many(&self) -> bool {
        matches!(self, Relation::ToMany { .. })
    }
}

/// A relational entity: table name, key column, scalar fields, relations.
///
/// Field and relation order is preserved - it drives projection order in
/// the compiled plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    /// Physical table name (defaults to the entity name).
    #[serde(default)]
    pub table: String,
    /// Primary key column.
    #[serde(default = "default_key_column", rename = "key")]
    pub key_column: String,
    #[serde(default)]
    pub fields: Vec<ScalarField>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

fn default_key_column() -> String {
    "id".into()
}

impl Entity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            table: name.into(),
            key_column: default_key_column(),
            fields: vec![],
            relations: vec![],
        }
    }

    pub fn table(mut self, table: &str) -> Self {
        self.table = table.into();
        self
    }

    pub fn key(mut self, column: &str) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn field(mut self, field: ScalarField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Look up a scalar field by name.
    pub fn scalar(&self, name: &str) -> Option<&ScalarField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a relation by name.
    pub fn relation_named(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.name() == name)
    }

    /// Resolve a member name to its closed variant: scalar field, to-one
    /// relation, or to-many relation. Scalars shadow nothing - the builder
    /// rejects entities where a field and a relation share a name.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        if let Some(field) = self.scalar(name) {
            return Some(Member::Scalar(field));
        }
        match self.relation_named(name) {
            Some(rel @ Relation::ToOne { .. }) => Some(Member::ToOne(rel)),
            Some(rel @ Relation::ToMany { .. }) => Some(Member::ToMany(rel)),
            None => None,
        }
    }
}

/// Result of a member lookup on an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'a> {
    Scalar(&'a ScalarField),
    ToOne(&'a Relation),
    ToMany(&'a Relation),
}
