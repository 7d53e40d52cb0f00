// I don't really care, and it's not important for this project
#![allow(clippy::result_large_err)]

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
mod engine;
mod error;
pub mod export;
pub mod playground;

pub use engine::{compile, compile_parameterized};

/// Everything needed to build a query step by step and render it.
pub mod query {
    pub use crate::engine::sql::structure::*;
    pub use crate::engine::sql::UnknownDialect;
    pub use crate::engine::{
        AvailableColumn, ConditionId, Dialect, Join, JoinType, LogicalOperator, Operator,
        OrderByClause, OrderDirection, ParameterizedQuery, QueryBuilder, QueryState,
        SelectedColumn, TableRef, WhereCondition,
    };
}

pub use error::{Error, ErrorKind, InternalError};
