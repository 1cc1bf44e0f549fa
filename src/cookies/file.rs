//! Tab-delimited cookie-jar file parser.
//!
//! Accepts the curl/Netscape layout (7 TAB-separated fields per line) with
//! lenient field handling: the secure flag is only false when it literally
//! says so, and an unreadable expiration degrades to a session cookie.

use std::io::BufRead;

use tracing::{debug, instrument, warn};

use super::{CookieRecord, CookieSet};

const FIELD_COUNT: usize = 7;

/// Per-line problems found while parsing a cookie-jar file.
///
/// None of these fail the file as a whole: the offending line is skipped
/// (or, for a bad expiration, kept with expiration 0) and parsing continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Fewer than 7 TAB-separated fields.
    #[error("line {line_number}: expected 7 TAB-separated fields, found {found}")]
    MissingFields {
        /// 1-based line number.
        line_number: usize,
        /// Number of fields actually present.
        found: usize,
    },

    /// The expiration field is not an integer; the record keeps expiration 0.
    #[error("line {line_number}: expiration '{raw}' is not an integer, using 0")]
    InvalidExpiration {
        /// 1-based line number.
        line_number: usize,
        /// Raw expiration field.
        raw: String,
    },

    /// The line is not valid UTF-8 and is skipped.
    #[error("line {line_number}: not valid UTF-8")]
    InvalidEncoding {
        /// 1-based line number.
        line_number: usize,
    },
}

impl ParseError {
    /// Line number the problem was found on.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MissingFields { line_number, .. }
            | Self::InvalidExpiration { line_number, .. }
            | Self::InvalidEncoding { line_number } => *line_number,
        }
    }
}

/// Outcome of parsing a cookie-jar file: the records plus per-line warnings.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Parsed records, one per accepted line, in file order.
    pub cookies: CookieSet,
    /// Problems encountered, in file order.
    pub warnings: Vec<ParseError>,
}

/// Parses a cookie-jar file from a buffered reader.
///
/// Blank lines and lines whose first non-whitespace character is `#` are
/// skipped. Every other line yields a record when it has at least 7 fields:
/// `domain`, unused flag, `path`, `secure`, `expiration`, `name`, `value`.
///
/// Lines are split on `\n` and decoded one at a time, so a line that is not
/// valid UTF-8 is skipped without losing the rest of the file.
///
/// # Errors
///
/// Returns the underlying I/O error when reading fails. Malformed lines are
/// reported through [`ParseResult::warnings`], never as an error.
#[instrument(level = "debug", skip(reader))]
pub fn parse_cookie_file(reader: impl BufRead) -> Result<ParseResult, std::io::Error> {
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (idx, line_result) in reader.split(b'\n').enumerate() {
        let line_number = idx + 1;
        let Ok(line) = String::from_utf8(line_result?) else {
            let error = ParseError::InvalidEncoding { line_number };
            warn!(line = line_number, reason = %error, "skipping malformed cookie line");
            warnings.push(error);
            continue;
        };
        // CRLF: only strip the line terminator, a trailing TAB means an empty value
        let line = line.trim_end_matches(['\r', '\n']);

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_cookie_line(line, line_number, &mut warnings) {
            Ok(record) => {
                debug!(
                    line = line_number,
                    domain = %record.domain,
                    name = %record.name,
                    "parsed cookie"
                );
                records.push(record);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                warnings.push(e);
            }
        }
    }

    Ok(ParseResult {
        cookies: CookieSet::new(records),
        warnings,
    })
}

fn parse_cookie_line(
    line: &str,
    line_number: usize,
    warnings: &mut Vec<ParseError>,
) -> Result<CookieRecord, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < FIELD_COUNT {
        return Err(ParseError::MissingFields {
            line_number,
            found: fields.len(),
        });
    }

    let max_age_seconds = fields[4].parse::<i64>().unwrap_or_else(|_| {
        let warning = ParseError::InvalidExpiration {
            line_number,
            raw: fields[4].to_string(),
        };
        debug!(line = line_number, reason = %warning, "defaulting expiration");
        warnings.push(warning);
        0
    });

    Ok(CookieRecord::new(
        fields[0],
        fields[2],
        parse_secure_flag(fields[3]),
        max_age_seconds,
        fields[5],
        fields[6],
    ))
}

/// Secure flag rule: false only for a case-insensitive `"false"`.
#[must_use]
pub fn parse_secure_flag(value: &str) -> bool {
    !value.eq_ignore_ascii_case("false")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(input: &str) -> ParseResult {
        parse_cookie_file(Cursor::new(input.as_bytes())).unwrap()
    }

    #[test]
    fn test_parse_cookie_file_valid_lines() {
        let input = "\
# Netscape HTTP Cookie File
api.example.com\tFALSE\t/\tFALSE\t0\tsession\tabc123
.other.com\tTRUE\t/path\tTRUE\t1700000000\ttoken\txyz789
";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 2);
        assert!(result.warnings.is_empty());

        let cookies: Vec<_> = result.cookies.iter().collect();
        assert_eq!(cookies[0].domain, "api.example.com");
        assert_eq!(cookies[0].path, "/");
        assert!(!cookies[0].secure);
        assert_eq!(cookies[0].max_age_seconds, 0);
        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[0].value(), "abc123");

        assert_eq!(cookies[1].domain, ".other.com");
        assert!(cookies[1].secure);
        assert_eq!(cookies[1].max_age_seconds, 1_700_000_000);
    }

    #[test]
    fn test_parse_cookie_file_comments_and_blank_lines() {
        let input = "\
# comment

api.example.com\tFALSE\t/\tfalse\t0\tname\tvalue
   \t
   # indented comment
";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 1);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_parse_cookie_file_empty_input() {
        let result = parse("");
        assert!(result.cookies.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unparsable_expiration_defaults_to_zero_and_keeps_line() {
        let input = "api.example.com\tFALSE\t/\tFALSE\tsoon\tname\tvalue\n";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies.iter().next().unwrap().max_age_seconds, 0);
        assert_eq!(
            result.warnings,
            vec![ParseError::InvalidExpiration {
                line_number: 1,
                raw: "soon".to_string()
            }]
        );
    }

    #[test]
    fn test_short_line_is_skipped_with_line_number() {
        let input = "\
api.example.com\tFALSE\t/\tFALSE\t0\tgood\tvalue
bad line without tabs
api.example.com\tFALSE\t/\tFALSE\t0\tother\tval
";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].line_number(), 2);
        assert!(
            result.warnings[0]
                .to_string()
                .contains("expected 7 TAB-separated fields, found 1")
        );
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let input = "api.example.com\tFALSE\t/\tFALSE\t0\tname\tvalue\textra\n";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies.iter().next().unwrap().value(), "value");
    }

    #[test]
    fn test_crlf_line_endings() {
        let input = "# Header\r\napi.example.com\tFALSE\t/\tFALSE\t0\tname\tvalue\r\n";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies.iter().next().unwrap().value(), "value");
    }

    #[test]
    fn test_trailing_tab_is_an_empty_value() {
        let input = "api.example.com\tFALSE\t/\tFALSE\t0\tname\t\n";
        let result = parse(input);
        assert_eq!(result.cookies.len(), 1);
        assert_eq!(result.cookies.iter().next().unwrap().value(), "");
    }

    #[test]
    fn test_secure_flag_only_false_for_literal_false() {
        assert!(!parse_secure_flag("false"));
        assert!(!parse_secure_flag("FALSE"));
        assert!(!parse_secure_flag("False"));
        assert!(parse_secure_flag("true"));
        assert!(parse_secure_flag("TRUE"));
        assert!(parse_secure_flag(""));
        assert!(parse_secure_flag("no"));
        assert!(parse_secure_flag("0"));
    }

    #[test]
    fn test_invalid_utf8_line_is_skipped_alone() {
        let input: &[u8] = b"api.example.com\tFALSE\t/\tFALSE\t0\tgood\tvalue\n\
api.example.com\tFALSE\t/\tFALSE\t0\tbad\t\xff\xfe\n\
api.example.com\tFALSE\t/\tFALSE\t0\tafter\tvalue\n";
        let result = parse_cookie_file(Cursor::new(input)).unwrap();

        let names: Vec<_> = result.cookies.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["good", "after"]);
        assert_eq!(
            result.warnings,
            vec![ParseError::InvalidEncoding { line_number: 2 }]
        );
    }

    #[test]
    fn test_negative_expiration_is_kept() {
        let input = "api.example.com\tFALSE\t/\tFALSE\t-1\tname\tvalue\n";
        let result = parse(input);
        assert_eq!(result.cookies.iter().next().unwrap().max_age_seconds, -1);
    }
}
