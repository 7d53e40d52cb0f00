//! Digs the SQL out of a generation response.
//!
//! The model's answer ends up in `sqlQuery` as text, and that text can be any of:
//! - a JSON object like `{"sql": "...", "explanation": "..."}`, possibly in a ```json block;
//! - markdown with a ```sql block and some prose around it;
//! - plain SQL.
//!
//! We try them in that order.
use crate::api::GeneratedQuery;
use crate::playground::PlaygroundError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n?(.*?)```").expect("valid regex")
});

const SQL_KEYS: [&str; 4] = ["sql", "query", "sqlQuery", "sql_query"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql {
    pub sql: String,
    pub explanation: Option<String>,
}

pub fn unwrap_generated(query: &GeneratedQuery) -> Result<GeneratedSql, PlaygroundError> {
    let text = query.sql_query.trim();

    let mut generated = parse_text(text).unwrap_or_else(|| GeneratedSql {
        sql: text.to_string(),
        explanation: None,
    });

    generated.sql = generated.sql.trim().to_string();

    if generated.explanation.is_none() {
        generated.explanation = non_empty(query.explanation.as_deref());
    }

    if generated.sql.is_empty() {
        return Err(PlaygroundError::UnreadableResponse(text.to_string()));
    }

    Ok(generated)
}

fn parse_text(text: &str) -> Option<GeneratedSql> {
    from_json(text).or_else(|| from_fenced_blocks(text))
}

fn from_json(text: &str) -> Option<GeneratedSql> {
    match serde_json::from_str(text).ok()? {
        Value::Object(object) => from_object(&object),
        // Encoded twice, it happens.
        Value::String(inner) => parse_text(inner.trim()).or_else(|| {
            Some(GeneratedSql {
                sql: inner,
                explanation: None,
            })
        }),
        _ => None,
    }
}

fn from_object(object: &Map<String, Value>) -> Option<GeneratedSql> {
    let sql = SQL_KEYS
        .iter()
        .find_map(|key| object.get(*key)?.as_str())?;

    // The SQL inside the JSON can itself be fenced.
    let sql = from_fenced_blocks(sql)
        .map(|generated| generated.sql)
        .unwrap_or_else(|| sql.to_string());

    Some(GeneratedSql {
        sql,
        explanation: non_empty(object.get("explanation").and_then(Value::as_str)),
    })
}

fn from_fenced_blocks(text: &str) -> Option<GeneratedSql> {
    let blocks: Vec<_> = FENCED_BLOCK.captures_iter(text).collect();

    let json = blocks
        .iter()
        .filter(|block| block[1].eq_ignore_ascii_case("json"))
        .find_map(|block| from_json(block[2].trim()));

    if json.is_some() {
        return json;
    }

    let block = blocks
        .iter()
        .find(|block| block[1].is_empty() || block[1].eq_ignore_ascii_case("sql"))?;

    let whole_block = block.get(0)?.as_str();
    let prose = text.replacen(whole_block, "", 1);

    Some(GeneratedSql {
        sql: block[2].to_string(),
        explanation: non_empty(Some(&prose)),
    })
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap(sql_query: &str) -> GeneratedSql {
        unwrap_generated(&GeneratedQuery {
            sql_query: sql_query.to_string(),
            explanation: None,
        })
        .unwrap()
    }

    #[test]
    fn json_object() {
        let generated =
            unwrap(r#"{"sql": "SELECT * FROM users;", "explanation": "Lists every user."}"#);

        assert_eq!(generated.sql, "SELECT * FROM users;");
        assert_eq!(generated.explanation.as_deref(), Some("Lists every user."));
    }

    #[test]
    fn json_in_a_fence_with_fenced_sql_inside() {
        let generated = unwrap(
            "Here you go:\n```json\n{\"query\": \"```sql\\nSELECT 1;\\n```\", \"explanation\": \"One.\"}\n```",
        );

        assert_eq!(generated.sql, "SELECT 1;");
        assert_eq!(generated.explanation.as_deref(), Some("One."));
    }

    #[test]
    fn markdown_with_prose() {
        let generated = unwrap(
            "This counts orders per customer.\n\n```sql\nSELECT customer_id, COUNT(*)\nFROM orders\nGROUP BY customer_id;\n```",
        );

        assert_eq!(
            generated.sql,
            "SELECT customer_id, COUNT(*)\nFROM orders\nGROUP BY customer_id;"
        );
        assert_eq!(
            generated.explanation.as_deref(),
            Some("This counts orders per customer.")
        );
    }

    #[test]
    fn plain_sql() {
        let generated = unwrap("  SELECT now();\n");

        assert_eq!(generated.sql, "SELECT now();");
        assert_eq!(generated.explanation, None);
    }

    #[test]
    fn double_encoded() {
        let generated = unwrap(r#""{\"sql\": \"SELECT 2;\"}""#);

        assert_eq!(generated.sql, "SELECT 2;");
    }

    #[test]
    fn falls_back_to_the_response_explanation() {
        let generated = unwrap_generated(&GeneratedQuery {
            sql_query: "SELECT 3;".to_string(),
            explanation: Some("Three.".to_string()),
        })
        .unwrap();

        assert_eq!(generated.explanation.as_deref(), Some("Three."));
    }

    #[test]
    fn nothing_usable() {
        let error = unwrap_generated(&GeneratedQuery {
            sql_query: r#"{"sql": ""}"#.to_string(),
            explanation: None,
        })
        .unwrap_err();

        assert!(matches!(error, PlaygroundError::UnreadableResponse(_)));
    }
}
