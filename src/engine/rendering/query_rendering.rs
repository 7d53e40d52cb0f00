use crate::engine::rendering::{OptionalClause, ValueRenderer};
use crate::engine::{Dialect, Join, OrderByClause, QueryState, SelectedColumn, WhereCondition};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"));

pub fn render_query(state: &QueryState, dialect: Dialect) -> String {
    render_with(state, dialect, &mut Literals(dialect))
}

/// Values are inlined: numbers as they are, everything else as a quoted string literal.
struct Literals(Dialect);

impl ValueRenderer for Literals {
    fn value(&mut self, raw: &str) -> String {
        if is_number(raw) {
            raw.trim().to_string()
        } else {
            self.0.string_literal(raw)
        }
    }

    fn list(&mut self, raw: &str) -> String {
        // Lists are taken as typed, the user is expected to quote the elements themselves.
        raw.to_string()
    }
}

pub(super) fn is_number(raw: &str) -> bool {
    NUMBER.is_match(raw.trim())
}

/// Renders one clause per line, ending the statement with a `;`.
pub(super) fn render_with<V>(state: &QueryState, dialect: Dialect, values: &mut V) -> String
where
    V: ValueRenderer,
{
    let Some(from) = state.base_table() else {
        return String::new();
    };

    if state.selected_columns.is_empty() {
        return String::new();
    }

    let mut lines = Vec::new();

    lines.push(select_line(state, dialect));
    lines.push(format!(
        "FROM {}",
        table_with_alias(dialect, &from.name, from.alias.as_deref())
    ));

    for join in &state.joins {
        lines.push(render_join(join, dialect));
    }

    lines.extend(filter_line(&state.where_conditions, dialect, values));

    let group_by: Vec<_> = state
        .group_by_columns
        .iter()
        .map(|column| dialect.quote_reference(column))
        .collect();
    lines.extend(OptionalClause::group_by(&group_by).render());

    let order_by: Vec<_> = state
        .order_by_clauses
        .iter()
        .map(|clause| render_order(clause, dialect))
        .collect();
    lines.extend(OptionalClause::order_by(&order_by).render());

    lines.extend(limit_line(state));

    format!("{};", lines.join("\n"))
}

fn select_line(state: &QueryState, dialect: Dialect) -> String {
    let columns: Vec<_> = state
        .selected_columns
        .iter()
        .map(|column| render_column(column, dialect))
        .collect();

    let distinct = if state.distinct { "DISTINCT " } else { "" };

    format!("SELECT {distinct}{}", columns.join(", "))
}

fn render_column(column: &SelectedColumn, dialect: Dialect) -> String {
    dialect.qualified(&column.table, &column.name)
}

fn table_with_alias(dialect: Dialect, name: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) if !alias.is_empty() => format!(
            "{} AS {}",
            dialect.quote_identifier(name),
            dialect.quote_identifier(alias)
        ),
        _ => dialect.quote_identifier(name),
    }
}

fn render_join(join: &Join, dialect: Dialect) -> String {
    format!(
        "{join_type} {table} ON {condition}",
        join_type = join.join_type,
        table = table_with_alias(dialect, &join.table, join.alias.as_deref()),
        condition = join.condition,
    )
}

fn filter_line<V>(conditions: &[WhereCondition], dialect: Dialect, values: &mut V) -> Option<String>
where
    V: ValueRenderer,
{
    let (first, rest) = conditions.split_first()?;

    let mut line = format!("WHERE {}", render_condition(first, dialect, values));

    for condition in rest {
        let ligature = condition.logical_operator.unwrap_or_default();

        line.push_str(&format!(
            " {ligature} {}",
            render_condition(condition, dialect, values)
        ));
    }

    Some(line)
}

fn render_condition<V>(condition: &WhereCondition, dialect: Dialect, values: &mut V) -> String
where
    V: ValueRenderer,
{
    let column = dialect.quote_reference(&condition.column);
    let operator = condition.operator;

    if operator.is_unary() {
        format!("{column} {operator}")
    } else if operator.takes_list() {
        format!("{column} {operator} ({})", values.list(&condition.value))
    } else {
        format!("{column} {operator} {}", values.value(&condition.value))
    }
}

fn render_order(clause: &OrderByClause, dialect: Dialect) -> String {
    format!(
        "{} {}",
        dialect.quote_reference(&clause.column),
        clause.direction
    )
}

/// Limits and offsets are free text in the state, only unsigned integers make it into the SQL.
fn limit_line(state: &QueryState) -> Option<String> {
    let limit = parse_count("limit", &state.limit)?;

    match parse_count("offset", &state.offset) {
        Some(offset) => Some(format!("LIMIT {limit} OFFSET {offset}")),
        None => Some(format!("LIMIT {limit}")),
    }
}

fn parse_count(what: &str, raw: &str) -> Option<u64> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    match raw.parse() {
        Ok(count) => Some(count),
        Err(_) => {
            warn!("Ignoring {what} `{raw}`, it is not a whole number");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        ConditionId, JoinType, LogicalOperator, Operator, OrderDirection, TableRef,
    };

    fn orders() -> QueryState {
        QueryState {
            tables: vec![TableRef::new("orders")],
            selected_columns: vec![
                SelectedColumn::new("orders", "id"),
                SelectedColumn::new("orders", "total"),
            ],
            ..Default::default()
        }
    }

    fn condition(id: u64, column: &str, operator: Operator, value: &str) -> WhereCondition {
        WhereCondition {
            id: ConditionId(id),
            column: column.to_string(),
            operator,
            value: value.to_string(),
            logical_operator: None,
        }
    }

    #[test]
    fn nothing_to_render() {
        assert_eq!(render_query(&QueryState::default(), Dialect::Generic), "");

        let mut no_columns = orders();
        no_columns.selected_columns.clear();
        assert_eq!(render_query(&no_columns, Dialect::MySql), "");

        let mut no_tables = orders();
        no_tables.tables.clear();
        assert_eq!(render_query(&no_tables, Dialect::Postgres), "");
    }

    #[test]
    fn orders_over_100() {
        let mut state = orders();
        state
            .where_conditions
            .push(condition(1, "orders.total", Operator::GreaterThan, "100"));
        state.limit = "10".to_string();

        // No line ends in a space, `FROM orders` included. Callers compare modulo whitespace.
        assert_eq!(
            render_query(&state, Dialect::Generic),
            "SELECT orders.id, orders.total\nFROM orders\nWHERE orders.total > 100\nLIMIT 10;"
        );
    }

    #[test]
    fn is_null_ignores_the_value() {
        let mut state = orders();
        state.where_conditions.push(condition(
            1,
            "orders.total",
            Operator::IsNull,
            "'; DROP TABLE orders; --",
        ));

        let sql = render_query(&state, Dialect::Generic);

        assert!(sql.ends_with("WHERE orders.total IS NULL;"), "{sql}");
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn flat_condition_chain() {
        let mut state = orders();
        let mut second = condition(2, "orders.status", Operator::Equals, "paid");
        second.logical_operator = Some(LogicalOperator::Or);
        let mut third = condition(3, "orders.id", Operator::In, "1, 2, 3");
        third.logical_operator = Some(LogicalOperator::And);
        let mut first = condition(1, "orders.total", Operator::LesserOrEqual, "9.5");
        // meaningless on the first condition
        first.logical_operator = Some(LogicalOperator::Or);
        state.where_conditions = vec![first, second, third];

        assert_eq!(
            render_query(&state, Dialect::Generic),
            "SELECT orders.id, orders.total\n\
             FROM orders\n\
             WHERE orders.total <= 9.5 OR orders.status = 'paid' AND orders.id IN (1, 2, 3);"
        );
    }

    #[test]
    fn everything_in_postgres() {
        let state = QueryState {
            tables: vec![
                TableRef {
                    name: "orders".to_string(),
                    alias: Some("o".to_string()),
                },
                TableRef::new("customers"),
            ],
            selected_columns: vec![
                SelectedColumn::new("o", "id"),
                SelectedColumn::new("c", "name"),
            ],
            joins: vec![Join {
                join_type: JoinType::Left,
                table: "customers".to_string(),
                alias: Some("c".to_string()),
                condition: "o.customer_id = c.id".to_string(),
            }],
            where_conditions: vec![condition(1, "c.name", Operator::Like, "O'Ha%")],
            group_by_columns: vec!["o.id".to_string(), "c.name".to_string()],
            order_by_clauses: vec![OrderByClause {
                column: "c.name".to_string(),
                direction: OrderDirection::Desc,
            }],
            limit: "20".to_string(),
            offset: "40".to_string(),
            distinct: true,
        };

        assert_eq!(
            render_query(&state, Dialect::Postgres),
            "SELECT DISTINCT \"o\".\"id\", \"c\".\"name\"\n\
             FROM \"orders\" AS \"o\"\n\
             LEFT JOIN \"customers\" AS \"c\" ON o.customer_id = c.id\n\
             WHERE \"c\".\"name\" LIKE 'O''Ha%'\n\
             GROUP BY \"o\".\"id\", \"c\".\"name\"\n\
             ORDER BY \"c\".\"name\" DESC\n\
             LIMIT 20 OFFSET 40;"
        );
    }

    #[test]
    fn malformed_limits_are_dropped() {
        let mut state = orders();
        state.limit = "10; DELETE FROM orders".to_string();
        state.offset = "5".to_string();

        assert_eq!(
            render_query(&state, Dialect::Generic),
            "SELECT orders.id, orders.total\nFROM orders;"
        );

        state.limit = " 10 ".to_string();
        state.offset = "five".to_string();

        assert!(render_query(&state, Dialect::Generic).ends_with("\nLIMIT 10;"));
    }

    #[test]
    fn numbers() {
        assert!(is_number("100"));
        assert!(is_number("-3.25"));
        assert!(!is_number("1e5"));
        assert!(!is_number("NaN"));
        assert!(!is_number(""));
        assert!(!is_number("10 OR 1=1"));
    }
}
