//! Structures used to represent the structure of a connected database, as reported by the API.
//!
//! The query builder uses these to know which columns are available and how tables can be joined.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// A foreign key going from `columns` of the owning table to `referenced_columns` of
/// `referenced_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Finds a foreign key linking the two tables, in either direction.
    ///
    /// The pairs are always returned as (column of `from`, column of `to`).
    pub fn link(&self, from: &str, to: &str) -> Option<Vec<(&str, &str)>> {
        if let Some(foreign_key) = self.table(from).and_then(|t| t.get_foreign_key(to)) {
            return Some(foreign_key.key_pairs());
        }

        let foreign_key = self.table(to).and_then(|t| t.get_foreign_key(from))?;

        Some(
            foreign_key
                .key_pairs()
                .into_iter()
                .map(|(to_column, from_column)| (from_column, to_column))
                .collect(),
        )
    }
}

impl Table {
    pub fn get_foreign_key(&self, to_table: &str) -> Option<&ForeignKey> {
        self.foreign_keys
            .iter()
            .find(|foreign_key| foreign_key.referenced_table == to_table)
    }
}

impl ForeignKey {
    pub fn key_pairs(&self) -> Vec<(&str, &str)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.referenced_columns.iter().map(String::as_str))
            .collect()
    }
}

impl<T: Into<String>> From<T> for Column {
    fn from(name: T) -> Column {
        Column {
            name: name.into(),
            data_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        serde_json::from_str(
            r#"{"tables": [
                {"name": "customers", "columns": [{"name": "id", "type": "int"}], "primaryKey": ["id"]},
                {"name": "orders", "columns": [{"name": "id"}, {"name": "customer_id"}],
                 "foreignKeys": [{"columns": ["customer_id"], "referencedTable": "customers", "referencedColumns": ["id"]}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn links_work_both_ways() {
        let schema = schema();

        assert_eq!(
            schema.link("orders", "customers"),
            Some(vec![("customer_id", "id")])
        );
        assert_eq!(
            schema.link("customers", "orders"),
            Some(vec![("id", "customer_id")])
        );
        assert_eq!(schema.link("customers", "products"), None);
    }
}
