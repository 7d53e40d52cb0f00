//! The structured representation of a SELECT query.
//!
//! Nothing in here is validated: the state can describe nonsense like columns of tables that are
//! not part of the query. The [QueryBuilder](super::QueryBuilder) mutators keep it consistent, the
//! renderer just renders whatever it is given.
use crate::engine::{JoinType, LogicalOperator, Operator, OrderDirection};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryState {
    /// The first table is the one we select FROM. Names are unique.
    pub tables: Vec<TableRef>,
    pub selected_columns: Vec<SelectedColumn>,
    pub joins: Vec<Join>,
    pub where_conditions: Vec<WhereCondition>,
    /// Column references, "table.column" or just "column".
    pub group_by_columns: Vec<String>,
    pub order_by_clauses: Vec<OrderByClause>,
    pub limit: String,
    pub offset: String,
    pub distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedColumn {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Name or alias of the table the column belongs to.
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    #[serde(rename = "type", default)]
    pub join_type: JoinType,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Free text, emitted as is after ON.
    #[serde(default)]
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereCondition {
    pub id: ConditionId,
    pub column: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    /// Ignored for the first condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_operator: Option<LogicalOperator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByClause {
    pub column: String,
    #[serde(default)]
    pub direction: OrderDirection,
}

impl TableRef {
    pub fn new<T: Into<String>>(name: T) -> Self {
        TableRef {
            name: name.into(),
            alias: None,
        }
    }

    /// What columns of this table are qualified with.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl SelectedColumn {
    pub fn new<T, N>(table: T, name: N) -> Self
    where
        T: Into<String>,
        N: Into<String>,
    {
        SelectedColumn {
            name: name.into(),
            data_type: None,
            table: table.into(),
        }
    }

    pub fn same_column(&self, other: &SelectedColumn) -> bool {
        self.table == other.table && self.name == other.name
    }
}

impl Join {
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

impl QueryState {
    pub fn base_table(&self) -> Option<&TableRef> {
        self.tables.first()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|table| table.name == name)
    }

    pub(crate) fn next_condition_id(&self) -> ConditionId {
        let max = self
            .where_conditions
            .iter()
            .map(|condition| condition.id.0)
            .max();

        ConditionId(max.map_or(1, |id| id + 1))
    }
}

/// Does a "table.column" reference point into the table known as `qualifier`?
pub(crate) fn references(column: &str, qualifier: &str) -> bool {
    column
        .strip_prefix(qualifier)
        .is_some_and(|rest| rest.starts_with('.'))
}

impl Display for ConditionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_needs_a_full_qualifier() {
        assert!(references("orders.id", "orders"));
        assert!(!references("orders_archive.id", "orders"));
        assert!(!references("orders", "orders"));
        assert!(!references("id", "orders"));
    }

    #[test]
    fn deserializes_partial_state() {
        let state: QueryState = serde_json::from_str(
            r#"{
                "tables": [{"name": "orders"}],
                "selectedColumns": [{"name": "id", "type": "int", "table": "orders"}],
                "whereConditions": [{"id": 3, "column": "orders.id", "operator": "IS NOT NULL"}],
                "limit": "5"
            }"#,
        )
        .unwrap();

        assert_eq!(state.tables, vec![TableRef::new("orders")]);
        assert_eq!(state.selected_columns[0].data_type.as_deref(), Some("int"));
        assert_eq!(state.where_conditions[0].operator, Operator::IsNotNull);
        assert_eq!(state.where_conditions[0].value, "");
        assert!(state.joins.is_empty());
        assert!(!state.distinct);
        assert_eq!(state.next_condition_id(), ConditionId(4));
    }
}
