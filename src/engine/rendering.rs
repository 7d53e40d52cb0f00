pub use parameters::{render_parameterized, ParameterizedQuery};
pub use query_rendering::render_query;
use std::fmt::{Display, Formatter};

mod parameters;
mod query_rendering;

struct OptionalClause<'a, T> {
    intro: &'a str,
    ligature: &'a str,
    items: &'a [T],
}

impl<'a, T> OptionalClause<'a, T> {
    fn group_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "GROUP BY",
            ligature: ",",
            items,
        }
    }

    fn order_by(items: &'a [T]) -> Self {
        OptionalClause {
            intro: "ORDER BY",
            ligature: ",",
            items,
        }
    }
}

impl<T> OptionalClause<'_, T>
where
    T: Display,
{
    /// The clause as a single line, or nothing at all if there are no items.
    fn render(&self) -> Option<String> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

/// Displays things like "GROUP BY 1, 2, 3" and "ORDER BY 1, 2, 3".
/// These are all optional fields that have a ligature between each element.
impl<T> Display for OptionalClause<'_, T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            intro,
            ligature,
            items,
        } = self;

        if let Some((first, rest)) = items.split_first() {
            write!(f, "{intro} {first}")?;

            for item in rest {
                write!(f, "{ligature} {item}")?;
            }
        }

        Ok(())
    }
}

/// Decides how where-condition values end up in the SQL text.
trait ValueRenderer {
    /// A single value, for comparisons like `=` or `LIKE`.
    fn value(&mut self, raw: &str) -> String;

    /// The inside of the parentheses of an `IN (...)`.
    fn list(&mut self, raw: &str) -> String;
}
