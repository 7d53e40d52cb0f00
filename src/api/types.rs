//! What goes over the wire. Field names follow the API's camelCase.
use crate::engine::Dialect;
use crate::playground::HistoryItem;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Some endpoints wrap their payload in `{"data": ...}`, some don't.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub(crate) fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(data) => data,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "flexible_id::required")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(deserialize_with = "flexible_id::required")]
    pub id: String,
    pub name: String,
    #[serde(default, alias = "type")]
    pub db_type: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl Connection {
    /// Connections of a type we don't know about get rendered for `fallback`.
    pub fn dialect(&self, fallback: Dialect) -> Dialect {
        self.db_type
            .as_deref()
            .and_then(|db_type| db_type.parse().ok())
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnection {
    pub name: String,
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

/// A persisted playground, as the API returns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundRecord {
    #[serde(deserialize_with = "flexible_id::required")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "flexible_id::optional")]
    pub connection_id: Option<String>,
    #[serde(default)]
    pub current_sql: Option<String>,
    #[serde(default)]
    pub current_prompt: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayground {
    pub name: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundUpdate {
    pub current_sql: String,
    pub current_prompt: String,
    pub history: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    pub connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playground_id: Option<String>,
    /// Asks the server to only produce read-only queries.
    #[serde(
        rename = "enforceDQL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub enforce_dql: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GenerateResponse {
    pub query: GeneratedQuery,
}

/// The raw generation result. `sql_query` is whatever the model answered: JSON, markdown or SQL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuery {
    pub sql_query: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub connection_id: String,
    pub sql_query: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
    #[serde(default)]
    pub total_rows: u64,
    /// In milliseconds.
    #[serde(default)]
    pub execution_time: f64,
}

impl QueryResult {
    /// Missing cells read as null.
    pub fn value<'a>(&self, row: &'a Map<String, Value>, column: &str) -> &'a Value {
        static NULL: Value = Value::Null;

        row.get(column).unwrap_or(&NULL)
    }
}

/// Ids come back as numbers from some endpoints and as strings from others.
mod flexible_id {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    impl From<Id> for String {
        fn from(id: Id) -> Self {
            match id {
                Id::Text(text) => text,
                Id::Number(number) => number.to_string(),
            }
        }
    }

    pub fn required<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Id::deserialize(deserializer)?.into())
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Id>::deserialize(deserializer)?.map(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelopes_are_optional() {
        let wrapped: Envelope<Connection> =
            serde_json::from_value(json!({"data": {"id": 4, "name": "prod", "type": "postgres"}}))
                .unwrap();
        let bare: Envelope<Connection> =
            serde_json::from_value(json!({"id": "4", "name": "prod", "dbType": "postgres"}))
                .unwrap();

        assert_eq!(wrapped.into_inner(), bare.into_inner());
    }

    #[test]
    fn connection_dialects() {
        let mut connection: Connection =
            serde_json::from_value(json!({"id": 1, "name": "x", "dbType": "MariaDB"})).unwrap();
        assert_eq!(connection.dialect(Dialect::Generic), Dialect::MySql);

        connection.db_type = Some("oracle".to_string());
        assert_eq!(connection.dialect(Dialect::Sqlite), Dialect::Sqlite);
    }

    #[test]
    fn generate_request_names() {
        let request = GenerateRequest {
            prompt: "top customers".to_string(),
            connection_id: "7".to_string(),
            playground_id: None,
            enforce_dql: Some(true),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"prompt": "top customers", "connectionId": "7", "enforceDQL": true})
        );
    }

    #[test]
    fn missing_cells_are_null() {
        let result: QueryResult = serde_json::from_value(json!({
            "columns": ["id", "name"],
            "rows": [{"id": 1}],
            "totalRows": 1,
            "executionTime": 3.5
        }))
        .unwrap();

        assert_eq!(result.value(&result.rows[0], "id"), &json!(1));
        assert_eq!(result.value(&result.rows[0], "name"), &Value::Null);
    }
}
