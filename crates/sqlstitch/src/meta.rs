//! Relation metadata: the property → column lookup criteria resolve against.
//!
//! A [`TableDef`] is built once per relation and handed to criteria as an
//! `Arc`. It is deliberately dumb, an ordered column list plus a by-property
//! index, so the engine can be tested with hand-built metadata and multiple
//! differently-configured engines can coexist (no global registry).

use std::collections::HashMap;

use crate::binder::TypeHint;
use crate::error::{StitchError, StitchResult};
use crate::ident::Ident;

/// One mapped column: logical property name, SQL column, optional bind hint.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    property: String,
    column: Ident,
    hint: Option<TypeHint>,
}

impl ColumnDef {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn hint(&self) -> Option<TypeHint> {
        self.hint
    }
}

/// Metadata for one relation.
///
/// Column order is registration order; it drives default SELECT expansion.
#[derive(Debug, Clone)]
pub struct TableDef {
    table: Ident,
    columns: Vec<ColumnDef>,
    by_property: HashMap<String, usize>,
}

impl TableDef {
    /// Start a definition for the given table (dotted paths allowed).
    pub fn new(table: &str) -> StitchResult<Self> {
        Ok(Self {
            table: Ident::parse(table)?,
            columns: Vec::new(),
            by_property: HashMap::new(),
        })
    }

    /// Register a property → column mapping.
    pub fn column(self, property: &str, column: &str) -> StitchResult<Self> {
        self.push(property, column, None)
    }

    /// Register a property → column mapping with a declared bind type.
    pub fn column_hinted(
        self,
        property: &str,
        column: &str,
        hint: TypeHint,
    ) -> StitchResult<Self> {
        self.push(property, column, Some(hint))
    }

    fn push(mut self, property: &str, column: &str, hint: Option<TypeHint>) -> StitchResult<Self> {
        if self.by_property.contains_key(property) {
            return Err(StitchError::metadata(format!(
                "property '{property}' registered twice on '{}'",
                self.table
            )));
        }
        let def = ColumnDef {
            property: property.to_string(),
            column: Ident::parse(column)?,
            hint,
        };
        self.by_property
            .insert(property.to_string(), self.columns.len());
        self.columns.push(def);
        Ok(self)
    }

    /// Look a property up. `None` means the property has no column mapping.
    pub fn resolve(&self, property: &str) -> Option<&ColumnDef> {
        self.by_property
            .get(property)
            .map(|&idx| &self.columns[idx])
    }

    /// All columns in registration order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn table(&self) -> &Ident {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDef {
        TableDef::new("users")
            .unwrap()
            .column("status", "status")
            .unwrap()
            .column("userName", "user_name")
            .unwrap()
            .column_hinted("id", "id", TypeHint::UUID)
            .unwrap()
    }

    #[test]
    fn resolves_registered_properties() {
        let meta = users();
        assert_eq!(meta.resolve("userName").unwrap().column().sql(), "user_name");
        assert_eq!(meta.resolve("id").unwrap().hint(), Some(TypeHint::UUID));
        assert!(meta.resolve("missing").is_none());
    }

    #[test]
    fn keeps_registration_order() {
        let meta = users();
        let props: Vec<_> = meta.columns().iter().map(|c| c.property()).collect();
        assert_eq!(props, vec!["status", "userName", "id"]);
    }

    #[test]
    fn rejects_duplicate_property() {
        let err = TableDef::new("users")
            .unwrap()
            .column("status", "status")
            .unwrap()
            .column("status", "other")
            .unwrap_err();
        assert!(matches!(err, StitchError::Metadata(_)));
    }

    #[test]
    fn rejects_invalid_column_name() {
        let err = TableDef::new("users")
            .unwrap()
            .column("bad", "no spaces allowed")
            .unwrap_err();
        assert!(err.is_identifier());
    }
}
