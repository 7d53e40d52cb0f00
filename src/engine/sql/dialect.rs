use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The SQL flavour we render for. Only identifier quoting, string escaping and bind placeholders
/// differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Identifiers are left unquoted.
    #[default]
    Generic,
    #[serde(alias = "mariadb")]
    MySql,
    #[serde(alias = "postgresql")]
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Quotes a single identifier, doubling any quote characters it contains.
    ///
    /// `*` is never quoted, so `table.*` keeps working.
    pub fn quote_identifier(self, identifier: &str) -> String {
        if identifier == "*" {
            return identifier.to_string();
        }

        match self {
            Dialect::Generic => identifier.to_string(),
            Dialect::MySql => format!("`{}`", identifier.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", identifier.replace('"', "\"\""))
            }
        }
    }

    /// Quotes a possibly qualified reference like `table.column`, one part at a time.
    pub fn quote_reference(self, reference: &str) -> String {
        reference
            .split('.')
            .map(|part| self.quote_identifier(part.trim()))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn qualified(self, table: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }

    pub fn string_literal(self, value: &str) -> String {
        let escaped = value.replace('\'', "''");

        // MySQL treats backslashes as escape characters inside string literals.
        let escaped = match self {
            Dialect::MySql => escaped.replace('\\', "\\\\"),
            _ => escaped,
        };

        format!("'{escaped}'")
    }

    /// The bind placeholder for the nth (1 based) parameter.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::Postgres => format!("${position}"),
            Dialect::Generic | Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown SQL dialect `{0}`, expected one of: generic, mysql, postgres, sqlite")]
pub struct UnknownDialect(String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "generic" | "" => Ok(Dialect::Generic),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(UnknownDialect(value.to_string())),
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dialect::Generic => "generic",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        };

        write!(f, "{name}")
    }
}
