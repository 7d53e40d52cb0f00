//! Renders queries with bind placeholders instead of inlined values.
//!
//! Join conditions are free text and are still emitted as typed; limits and offsets only ever
//! contain validated integers.
use crate::engine::rendering::query_rendering::{is_number, render_with};
use crate::engine::rendering::ValueRenderer;
use crate::engine::{Dialect, QueryState};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterizedQuery {
    pub sql: String,
    /// Bound in order of appearance.
    pub params: Vec<Value>,
}

pub fn render_parameterized(state: &QueryState, dialect: Dialect) -> ParameterizedQuery {
    let mut binds = Binds {
        dialect,
        params: Vec::new(),
    };

    let sql = render_with(state, dialect, &mut binds);

    ParameterizedQuery {
        sql,
        params: binds.params,
    }
}

struct Binds {
    dialect: Dialect,
    params: Vec<Value>,
}

impl Binds {
    fn bind(&mut self, param: Value) -> String {
        self.params.push(param);

        self.dialect.placeholder(self.params.len())
    }
}

impl ValueRenderer for Binds {
    fn value(&mut self, raw: &str) -> String {
        self.bind(to_param(raw))
    }

    fn list(&mut self, raw: &str) -> String {
        let placeholders: Vec<_> = list_elements(raw)
            .into_iter()
            .map(|element| self.bind(element))
            .collect();

        placeholders.join(", ")
    }
}

fn to_param(raw: &str) -> Value {
    if is_number(raw) {
        if let Ok(number) = serde_json::from_str::<serde_json::Number>(raw.trim()) {
            return Value::Number(number);
        }
    }

    Value::String(raw.to_string())
}

/// Splits a typed list like `'Austin, TX', 'Reno', 3` into its values.
///
/// Quoted elements (`'...'` or `"..."`, with doubled quotes inside) are always strings and may
/// contain commas. Bare elements are trimmed and become numbers when they look like one.
/// Empty bare elements are skipped.
fn list_elements(raw: &str) -> Vec<Value> {
    let mut elements = Vec::new();
    let mut bare = String::new();
    let mut quoted: Option<String> = None;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let text = quoted.get_or_insert_with(String::new);

                while let Some(next) = chars.next() {
                    if next != c {
                        text.push(next);
                    } else if chars.peek() == Some(&c) {
                        chars.next();
                        text.push(c);
                    } else {
                        break;
                    }
                }
            }
            ',' => {
                elements.extend(list_element(&bare, quoted.take()));
                bare.clear();
            }
            c => bare.push(c),
        }
    }

    elements.extend(list_element(&bare, quoted));

    elements
}

fn list_element(bare: &str, quoted: Option<String>) -> Option<Value> {
    match quoted {
        Some(text) => Some(Value::String(text)),
        None if bare.trim().is_empty() => None,
        None => Some(to_param(bare.trim())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{
        ConditionId, LogicalOperator, Operator, SelectedColumn, TableRef, WhereCondition,
    };
    use serde_json::json;

    fn state(conditions: Vec<(Operator, &str)>) -> QueryState {
        QueryState {
            tables: vec![TableRef::new("users")],
            selected_columns: vec![SelectedColumn::new("users", "name")],
            where_conditions: conditions
                .into_iter()
                .enumerate()
                .map(|(index, (operator, value))| WhereCondition {
                    id: ConditionId(index as u64 + 1),
                    column: "users.name".to_string(),
                    operator,
                    value: value.to_string(),
                    logical_operator: (index > 0).then_some(LogicalOperator::And),
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn postgres_placeholders_are_numbered() {
        let query = render_parameterized(
            &state(vec![
                (Operator::Equals, "x' OR '1'='1"),
                (Operator::NotIn, "'a', \"b\", 3"),
                (Operator::IsNotNull, "ignored"),
                (Operator::GreaterThan, "42"),
            ]),
            Dialect::Postgres,
        );

        assert_eq!(
            query.sql,
            "SELECT \"users\".\"name\"\n\
             FROM \"users\"\n\
             WHERE \"users\".\"name\" = $1 AND \"users\".\"name\" NOT IN ($2, $3, $4) \
             AND \"users\".\"name\" IS NOT NULL AND \"users\".\"name\" > $5;"
        );
        assert_eq!(
            query.params,
            vec![json!("x' OR '1'='1"), json!("a"), json!("b"), json!(3), json!(42)]
        );
    }

    #[test]
    fn quoted_list_elements_keep_their_commas() {
        let query = render_parameterized(
            &state(vec![(Operator::In, "'Austin, TX', 'Reno', \"O\"\"Hare\", 'it''s', 7, '8', ")]),
            Dialect::Postgres,
        );

        assert!(query.sql.ends_with("IN ($1, $2, $3, $4, $5, $6);"));
        assert_eq!(
            query.params,
            vec![
                json!("Austin, TX"),
                json!("Reno"),
                json!("O\"Hare"),
                json!("it's"),
                json!(7),
                json!("8")
            ]
        );
    }

    #[test]
    fn mysql_uses_question_marks() {
        let query = render_parameterized(&state(vec![(Operator::Like, "%ann%")]), Dialect::MySql);

        assert_eq!(
            query.sql,
            "SELECT `users`.`name`\nFROM `users`\nWHERE `users`.`name` LIKE ?;"
        );
        assert_eq!(query.params, vec![json!("%ann%")]);
    }

    #[test]
    fn empty_state_has_no_params() {
        let query = render_parameterized(&QueryState::default(), Dialect::Sqlite);

        assert_eq!(query, ParameterizedQuery::default());
    }
}
