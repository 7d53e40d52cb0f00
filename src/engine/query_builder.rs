//! All the ways the query state can change.
//!
//! None of these can fail. Asking for something impossible, like removing a join that does not
//! exist, leaves the state as it was.
use crate::engine::query_state::references;
use crate::engine::sql::Schema;
use crate::engine::{
    compile, compile_parameterized, ConditionId, Dialect, Join, JoinType, LogicalOperator,
    Operator, OrderByClause, OrderDirection, ParameterizedQuery, QueryState, SelectedColumn,
    TableRef, WhereCondition,
};
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    state: QueryState,
    schema: Schema,
}

/// A column of one of the tables in the query, qualified the way the query refers to its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableColumn {
    pub qualifier: String,
    pub name: String,
    pub data_type: Option<String>,
}

impl AvailableColumn {
    /// The "table.column" form used in conditions, group by and order by.
    pub fn reference(&self) -> String {
        format!("{}.{}", self.qualifier, self.name)
    }
}

impl QueryBuilder {
    pub fn new(schema: Schema) -> Self {
        QueryBuilder {
            state: QueryState::default(),
            schema,
        }
    }

    pub fn with_state(schema: Schema, state: QueryState) -> Self {
        QueryBuilder { state, schema }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn into_state(self) -> QueryState {
        self.state
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn sql(&self, dialect: Dialect) -> String {
        compile(&self.state, dialect)
    }

    pub fn parameterized_sql(&self, dialect: Dialect) -> ParameterizedQuery {
        compile_parameterized(&self.state, dialect)
    }

    /// Columns of every table in the query, base table first.
    pub fn available_columns(&self) -> Vec<AvailableColumn> {
        self.state
            .tables
            .iter()
            .filter_map(|table_ref| {
                let table = self.schema.table(&table_ref.name)?;
                let qualifier = self.qualifier_of(table_ref);

                Some(table.columns.iter().map(move |column| AvailableColumn {
                    qualifier: qualifier.clone(),
                    name: column.name.clone(),
                    data_type: column.data_type.clone(),
                }))
            })
            .flatten()
            .collect()
    }

    /// Joined tables keep their alias on the join, so look there too.
    fn qualifier_of(&self, table_ref: &TableRef) -> String {
        let join_alias = self
            .state
            .joins
            .iter()
            .find(|join| join.table == table_ref.name)
            .and_then(|join| join.alias.clone());

        join_alias
            .or_else(|| table_ref.alias.clone())
            .unwrap_or_else(|| table_ref.name.clone())
    }

    pub fn reset(&mut self) {
        self.state = QueryState::default();
    }

    pub fn add_table(&mut self, name: &str) {
        if self.state.has_table(name) {
            return;
        }

        self.state.tables.push(TableRef::new(name));
    }

    pub fn add_column(&mut self, column: SelectedColumn) {
        let exists = self
            .state
            .selected_columns
            .iter()
            .any(|selected| selected.same_column(&column));

        if !exists {
            self.state.selected_columns.push(column);
        }
    }

    pub fn remove_column(&mut self, column: &SelectedColumn) {
        self.state
            .selected_columns
            .retain(|selected| !selected.same_column(column));
    }

    pub fn set_distinct(&mut self, distinct: bool) {
        self.state.distinct = distinct;
    }

    pub fn set_limit<T: Into<String>>(&mut self, limit: T) {
        self.state.limit = limit.into();
    }

    pub fn set_offset<T: Into<String>>(&mut self, offset: T) {
        self.state.offset = offset.into();
    }

    /// Adds `column = ''` on the first available column.
    pub fn add_where_condition(&mut self) -> Option<ConditionId> {
        let column = self.available_columns().into_iter().next()?;
        let id = self.state.next_condition_id();

        let logical_operator = if self.state.where_conditions.is_empty() {
            None
        } else {
            Some(LogicalOperator::And)
        };

        self.state.where_conditions.push(WhereCondition {
            id,
            column: column.reference(),
            operator: Operator::Equals,
            value: String::new(),
            logical_operator,
        });

        Some(id)
    }

    pub fn remove_where_condition(&mut self, id: ConditionId) {
        self.state
            .where_conditions
            .retain(|condition| condition.id != id);

        self.normalize_conditions();
    }

    pub fn set_condition_column<T: Into<String>>(&mut self, id: ConditionId, column: T) {
        if let Some(condition) = self.condition_mut(id) {
            condition.column = column.into();
        }
    }

    pub fn set_condition_operator(&mut self, id: ConditionId, operator: Operator) {
        if let Some(condition) = self.condition_mut(id) {
            condition.operator = operator;
        }
    }

    pub fn set_condition_value<T: Into<String>>(&mut self, id: ConditionId, value: T) {
        if let Some(condition) = self.condition_mut(id) {
            condition.value = value.into();
        }
    }

    /// Has no effect on the first condition.
    pub fn set_condition_logical_operator(&mut self, id: ConditionId, operator: LogicalOperator) {
        let is_first = self
            .state
            .where_conditions
            .first()
            .is_some_and(|condition| condition.id == id);

        if is_first {
            return;
        }

        if let Some(condition) = self.condition_mut(id) {
            condition.logical_operator = Some(operator);
        }
    }

    fn condition_mut(&mut self, id: ConditionId) -> Option<&mut WhereCondition> {
        self.state
            .where_conditions
            .iter_mut()
            .find(|condition| condition.id == id)
    }

    /// The first condition never has a logical operator, every other one does.
    fn normalize_conditions(&mut self) {
        for (index, condition) in self.state.where_conditions.iter_mut().enumerate() {
            if index == 0 {
                condition.logical_operator = None;
            } else if condition.logical_operator.is_none() {
                condition.logical_operator = Some(LogicalOperator::And);
            }
        }
    }

    /// Joins the first table from the schema that is not already part of the query.
    ///
    /// If there is a foreign key between the new table and one already in the query, it is used
    /// for the join condition.
    pub fn add_join(&mut self) -> Option<usize> {
        let base = self.state.base_table()?.name.clone();

        let candidate = self
            .schema
            .tables
            .iter()
            .map(|table| table.name.as_str())
            .find(|name| {
                *name != base && !self.state.joins.iter().any(|join| join.table == *name)
            })?
            .to_string();

        let condition = self.join_condition_for(&candidate).unwrap_or_default();

        debug!("Joining {candidate} ON {condition}");

        self.add_table(&candidate);
        self.state.joins.push(Join {
            join_type: JoinType::Inner,
            table: candidate,
            alias: None,
            condition,
        });

        Some(self.state.joins.len() - 1)
    }

    fn join_condition_for(&self, new_table: &str) -> Option<String> {
        self.state.tables.iter().find_map(|existing| {
            let pairs = self.schema.link(new_table, &existing.name)?;
            let qualifier = self.qualifier_of(existing);

            let conditions: Vec<_> = pairs
                .into_iter()
                .map(|(new_column, existing_column)| {
                    format!("{new_table}.{new_column} = {qualifier}.{existing_column}")
                })
                .collect();

            Some(conditions.join(" AND "))
        })
    }

    pub fn set_join_type(&mut self, index: usize, join_type: JoinType) {
        if let Some(join) = self.state.joins.get_mut(index) {
            join.join_type = join_type;
        }
    }

    pub fn set_join_condition<T: Into<String>>(&mut self, index: usize, condition: T) {
        if let Some(join) = self.state.joins.get_mut(index) {
            join.condition = condition.into();
        }
    }

    /// Changes how the joined table is referred to, rewriting every reference to the old name.
    ///
    /// Join conditions are free text, only `old.` prefixes that start a reference are rewritten.
    pub fn set_join_alias(&mut self, index: usize, alias: Option<String>) {
        let Some(join) = self.state.joins.get_mut(index) else {
            return;
        };

        let alias = alias.filter(|alias| !alias.is_empty());
        let old_qualifier = join.qualifier().to_string();
        join.alias = alias;
        let new_qualifier = join.qualifier().to_string();

        if old_qualifier != new_qualifier {
            self.rename_qualifier(&old_qualifier, &new_qualifier);
        }
    }

    fn rename_qualifier(&mut self, old: &str, new: &str) {
        let rename = |reference: &mut String| {
            if references(reference, old) {
                *reference = format!("{new}{}", &reference[old.len()..]);
            }
        };

        for column in &mut self.state.selected_columns {
            if column.table == old {
                column.table = new.to_string();
            }
        }

        for condition in &mut self.state.where_conditions {
            rename(&mut condition.column);
        }

        for column in &mut self.state.group_by_columns {
            rename(column);
        }

        for clause in &mut self.state.order_by_clauses {
            rename(&mut clause.column);
        }

        for join in &mut self.state.joins {
            join.condition = rename_in_condition(&join.condition, old, new);
        }
    }

    /// Removes a join along with its table and everything that references it.
    ///
    /// Leaving any reference behind would make the rendered SQL point at a table that is no longer
    /// part of the query.
    pub fn remove_join(&mut self, index: usize) {
        if index >= self.state.joins.len() {
            return;
        }

        let join = self.state.joins.remove(index);
        let qualifiers: Vec<&str> = [Some(join.table.as_str()), join.alias.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        let is_referenced = |reference: &str| {
            qualifiers
                .iter()
                .any(|qualifier| references(reference, qualifier))
        };

        debug!("Removing join on {}", join.table);

        // The base table can't be the target of a join, but better not lose the FROM.
        let mut position = 0;
        self.state.tables.retain(|table| {
            position += 1;
            position == 1 || table.name != join.table
        });

        self.state
            .selected_columns
            .retain(|column| !qualifiers.contains(&column.table.as_str()));
        self.state
            .where_conditions
            .retain(|condition| !is_referenced(&condition.column));
        self.state
            .group_by_columns
            .retain(|column| !is_referenced(column));
        self.state
            .order_by_clauses
            .retain(|clause| !is_referenced(&clause.column));

        self.normalize_conditions();
    }

    /// Orders by the first available column that is not already ordered by.
    pub fn add_order_by_clause(&mut self) -> Option<usize> {
        let column = self.available_columns().into_iter().find(|column| {
            let reference = column.reference();

            !self
                .state
                .order_by_clauses
                .iter()
                .any(|clause| clause.column == reference)
        })?;

        self.state.order_by_clauses.push(OrderByClause {
            column: column.reference(),
            direction: OrderDirection::Asc,
        });

        Some(self.state.order_by_clauses.len() - 1)
    }

    pub fn set_order_column<T: Into<String>>(&mut self, index: usize, column: T) {
        if let Some(clause) = self.state.order_by_clauses.get_mut(index) {
            clause.column = column.into();
        }
    }

    pub fn set_order_direction(&mut self, index: usize, direction: OrderDirection) {
        if let Some(clause) = self.state.order_by_clauses.get_mut(index) {
            clause.direction = direction;
        }
    }

    pub fn remove_order_by_clause(&mut self, index: usize) {
        if index < self.state.order_by_clauses.len() {
            self.state.order_by_clauses.remove(index);
        }
    }

    /// Groups by the first available column that is not already grouped by.
    pub fn add_group_by_column(&mut self) -> Option<usize> {
        let column = self.available_columns().into_iter().find(|column| {
            !self
                .state
                .group_by_columns
                .contains(&column.reference())
        })?;

        self.state.group_by_columns.push(column.reference());

        Some(self.state.group_by_columns.len() - 1)
    }

    pub fn set_group_by_column<T: Into<String>>(&mut self, index: usize, column: T) {
        let column = column.into();

        if self.state.group_by_columns.contains(&column) {
            return;
        }

        if let Some(existing) = self.state.group_by_columns.get_mut(index) {
            *existing = column;
        }
    }

    pub fn remove_group_by_column(&mut self, index: usize) {
        if index < self.state.group_by_columns.len() {
            self.state.group_by_columns.remove(index);
        }
    }
}

/// Rewrites `old.` to `new.` wherever it starts a reference, so `orders.id` changes but
/// `archived_orders.id` and `"orders.id"` don't.
fn rename_in_condition(condition: &str, old: &str, new: &str) -> String {
    let prefix = format!("{old}.");
    let mut renamed = String::with_capacity(condition.len());
    let mut copied = 0;

    for (index, _) in condition.match_indices(&prefix) {
        let starts_reference = condition[..index]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || matches!(c, '_' | '.' | '"' | '`')));

        if starts_reference {
            renamed.push_str(&condition[copied..index]);
            renamed.push_str(new);
            renamed.push('.');
            copied = index + prefix.len();
        }
    }

    renamed.push_str(&condition[copied..]);

    renamed
}
