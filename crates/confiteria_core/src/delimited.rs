//! Delimited-text encoding shared by the CSV backing and the export.
//!
//! Quoting follows RFC 4180: a field containing the delimiter, a quote, or a
//! line break is wrapped in quotes and embedded quotes are doubled.

pub(crate) const DELIMITER: char = ',';

/// Quotes one field when it needs it.
pub(crate) fn escape_field(value: &str) -> String {
    if value.contains(DELIMITER)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r')
    {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Joins fields into one record line, without the line terminator.
pub(crate) fn encode_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// Splits delimited text into records of fields.
///
/// Accepts `\n` and `\r\n` line endings. Blank lines outside quotes are
/// skipped. Returns a description of the first syntax problem found.
pub(crate) fn parse_records(text: &str) -> Result<Vec<Vec<String>>, String> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_was_quoted = false;
    let mut line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' if field.is_empty() && !field_was_quoted => {
                in_quotes = true;
                field_was_quoted = true;
            }
            '"' => return Err(format!("unexpected quote on line {line}")),
            DELIMITER => {
                record.push(std::mem::take(&mut field));
                field_was_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if !record.is_empty() || !field.is_empty() || field_was_quoted {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                field_was_quoted = false;
                line += 1;
            }
            _ if field_was_quoted => {
                return Err(format!("unexpected text after closing quote on line {line}"));
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quoted field starting before line {line}"));
    }
    if !record.is_empty() || !field.is_empty() || field_was_quoted {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
