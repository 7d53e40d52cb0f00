mod query_builder;
mod query_state;
mod rendering;
/// Describes the databases queries are built against.
pub mod sql;

#[cfg(test)]
mod tests;

pub use query_builder::{AvailableColumn, QueryBuilder};
pub use query_state::{
    ConditionId, Join, OrderByClause, QueryState, SelectedColumn, TableRef, WhereCondition,
};
pub use rendering::ParameterizedQuery;
pub use sql::dialect::Dialect;

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Renders the query state to SQL text.
///
/// Returns an empty string when there is nothing to select from: no partial SQL is ever produced.
/// Values are inlined as literals, see [compile_parameterized] for the bind variable version.
pub fn compile(state: &QueryState, dialect: Dialect) -> String {
    rendering::render_query(state, dialect)
}

/// Same as [compile], but where-condition values are replaced by placeholders and returned
/// separately.
pub fn compile_parameterized(state: &QueryState, dialect: Dialect) -> ParameterizedQuery {
    rendering::render_parameterized(state, dialect)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    /// Rendered as a FULL OUTER JOIN.
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// How a where-condition attaches to the one before it.
///
/// Conditions form a flat chain, there is no grouping with parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=", alias = "<>")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LesserThan,
    #[serde(rename = "<=")]
    LesserOrEqual,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl Operator {
    /// Unary operators don't take a value, whatever the condition holds is ignored.
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }

    pub fn takes_list(self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl Display for JoinType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
            JoinType::Outer => write!(f, "FULL OUTER JOIN"),
        }
    }
}

impl Display for OrderDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl Display for LogicalOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "AND"),
            LogicalOperator::Or => write!(f, "OR"),
        }
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LesserThan => "<",
            Operator::LesserOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        };

        write!(f, "{symbol}")
    }
}
