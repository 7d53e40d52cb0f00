use super::cell_text;
use crate::api::QueryResult;

/// `<results>` with one `<row>` per row and one element per column.
pub fn to_xml(result: &QueryResult) -> String {
    let tags: Vec<String> = result
        .columns
        .iter()
        .map(|column| sanitize_tag_name(column))
        .collect();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<results>\n");

    for row in &result.rows {
        xml.push_str("  <row>\n");

        for (column, tag) in result.columns.iter().zip(&tags) {
            let text = escape(&cell_text(result.value(row, column)));
            xml.push_str(&format!("    <{tag}>{text}</{tag}>\n"));
        }

        xml.push_str("  </row>\n");
    }

    xml.push_str("</results>\n");

    xml
}

/// Makes a column name usable as an element name: `[A-Za-z_][A-Za-z0-9_]*`.
/// Anything else becomes `_`.
pub fn sanitize_tag_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .enumerate()
        .map(|(position, c)| match c {
            'A'..='Z' | 'a'..='z' | '_' => c,
            '0'..='9' if position > 0 => c,
            _ => '_',
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Not allowed anywhere in XML 1.0, not even escaped.
            c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => {}
            c => escaped.push(c),
        }
    }

    escaped
}
