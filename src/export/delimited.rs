use super::cell_text;
use crate::api::QueryResult;
use crate::{Error, InternalError};
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// A header row and one line per row. Fields are only quoted when they have to be.
pub fn to_csv(result: &QueryResult) -> Result<String, Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&result.columns)?;

    for row in &result.rows {
        writer.write_record(
            result
                .columns
                .iter()
                .map(|column| cell_text(result.value(row, column))),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| InternalError(format!("Could not flush CSV: {error}")))?;

    String::from_utf8(bytes)
        .map_err(|error| InternalError(format!("CSV is not valid UTF-8: {error}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::result;

    #[test]
    fn quotes_only_when_needed() {
        let csv = to_csv(&result()).unwrap();

        assert_eq!(
            csv,
            "id,name,note\n1,Ana,\n2,\"Smith, \"\"Bo\"\"\",\"line one\nline two\"\n3,<Cy & Di>,\n"
        );
    }

    #[test]
    fn reads_back() {
        let original = result();
        let csv = to_csv(&original).unwrap();

        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(headers, original.columns);

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[1][1], "Smith, \"Bo\"");
        assert_eq!(&records[1][2], "line one\nline two");
        assert_eq!(&records[0][2], "");
    }

    #[test]
    fn no_rows() {
        let mut empty = result();
        empty.rows.clear();

        assert_eq!(to_csv(&empty).unwrap(), "id,name,note\n");
    }
}
