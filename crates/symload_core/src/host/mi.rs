//! gdb machine interface (MI) output records.
//!
//! Only the subset needed to drive console commands is understood: result
//! records with an optional `msg`, stream records, async records and the
//! prompt terminator. Result payloads other than `msg` are kept raw.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Prompt line terminating every MI response.
pub const MI_PROMPT: &str = "(gdb)";

/// Class of a `^` result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

impl ResultClass {
    fn parse(value: &str) -> Result<Self, MiParseError> {
        match value {
            "done" => Ok(Self::Done),
            "running" => Ok(Self::Running),
            "connected" => Ok(Self::Connected),
            "error" => Ok(Self::Error),
            "exit" => Ok(Self::Exit),
            other => Err(MiParseError::UnknownResultClass(other.to_string())),
        }
    }
}

/// Origin of a stream record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// `~` console output.
    Console,
    /// `@` target output.
    Target,
    /// `&` gdb internal log output, including error text.
    Log,
}

/// One parsed MI output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiRecord {
    Result {
        token: Option<u64>,
        class: ResultClass,
        message: Option<String>,
        payload: String,
    },
    Stream {
        kind: StreamKind,
        text: String,
    },
    /// `*`, `+` or `=` notifications, kept raw.
    Async(String),
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiParseError {
    Empty,
    UnknownRecord(String),
    UnknownResultClass(String),
    ExpectedString(String),
    UnterminatedString,
    InvalidEscape(char),
}

impl Display for MiParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty MI line"),
            Self::UnknownRecord(line) => write!(f, "unknown MI record: {line}"),
            Self::UnknownResultClass(class) => write!(f, "unknown MI result class: {class}"),
            Self::ExpectedString(rest) => write!(f, "expected MI c-string at: {rest}"),
            Self::UnterminatedString => write!(f, "unterminated MI c-string"),
            Self::InvalidEscape(c) => write!(f, "invalid MI escape: \\{c}"),
        }
    }
}

impl Error for MiParseError {}

/// Parses one line of MI output (without the trailing newline).
pub fn parse_record(line: &str) -> Result<MiRecord, MiParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim_end() == MI_PROMPT {
        return Ok(MiRecord::Prompt);
    }
    if line.is_empty() {
        return Err(MiParseError::Empty);
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let token = if digits > 0 {
        line[..digits].parse::<u64>().ok()
    } else {
        None
    };
    let rest = &line[digits..];

    let mut chars = rest.chars();
    match chars.next() {
        Some('^') => parse_result(token, chars.as_str()),
        Some(marker @ ('~' | '@' | '&')) => {
            let kind = match marker {
                '~' => StreamKind::Console,
                '@' => StreamKind::Target,
                _ => StreamKind::Log,
            };
            let (text, _) = parse_c_string(chars.as_str())?;
            Ok(MiRecord::Stream { kind, text })
        }
        Some('*' | '+' | '=') => Ok(MiRecord::Async(rest.to_string())),
        _ => Err(MiParseError::UnknownRecord(line.to_string())),
    }
}

fn parse_result(token: Option<u64>, body: &str) -> Result<MiRecord, MiParseError> {
    let (class, payload) = match body.split_once(',') {
        Some((class, payload)) => (class, payload),
        None => (body, ""),
    };
    let class = ResultClass::parse(class)?;
    let message = match payload.strip_prefix("msg=") {
        Some(value) => Some(parse_c_string(value)?.0),
        None => None,
    };
    Ok(MiRecord::Result {
        token,
        class,
        message,
        payload: payload.to_string(),
    })
}

/// Parses a leading MI c-string and returns it with the unparsed remainder.
pub fn parse_c_string(input: &str) -> Result<(String, &str), MiParseError> {
    let Some(body) = input.strip_prefix('"') else {
        return Err(MiParseError::ExpectedString(input.to_string()));
    };

    let bytes = body.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let text = String::from_utf8_lossy(&out).into_owned();
                return Ok((text, &body[i + 1..]));
            }
            b'\\' => {
                let Some(&escaped) = bytes.get(i + 1) else {
                    return Err(MiParseError::UnterminatedString);
                };
                i += 2;
                match escaped {
                    b'n' => out.push(b'\n'),
                    b't' => out.push(b'\t'),
                    b'r' => out.push(b'\r'),
                    b'e' => out.push(0x1b),
                    b'a' => out.push(0x07),
                    b'"' | b'\\' | b'\'' => out.push(escaped),
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        let mut taken = 1;
                        while taken < 3 {
                            match bytes.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    taken += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xff) as u8);
                    }
                    other => return Err(MiParseError::InvalidEscape(char::from(other))),
                }
            }
            byte => {
                out.push(byte);
                i += 1;
            }
        }
    }
    Err(MiParseError::UnterminatedString)
}

/// Encodes `value` as an MI c-string literal.
pub fn encode_c_string(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() + 2);
    encoded.push('"');
    for c in value.chars() {
        match c {
            '"' => encoded.push_str("\\\""),
            '\\' => encoded.push_str("\\\\"),
            '\n' => encoded.push_str("\\n"),
            '\t' => encoded.push_str("\\t"),
            '\r' => encoded.push_str("\\r"),
            other => encoded.push(other),
        }
    }
    encoded.push('"');
    encoded
}

#[cfg(test)]
mod tests {
    use super::{
        encode_c_string, parse_c_string, parse_record, MiParseError, MiRecord, ResultClass,
        StreamKind,
    };

    #[test]
    fn parses_prompt_with_trailing_space() {
        assert_eq!(parse_record("(gdb) ").unwrap(), MiRecord::Prompt);
        assert_eq!(parse_record("(gdb)\r\n").unwrap(), MiRecord::Prompt);
    }

    #[test]
    fn parses_done_and_error_results() {
        assert_eq!(
            parse_record("7^done").unwrap(),
            MiRecord::Result {
                token: Some(7),
                class: ResultClass::Done,
                message: None,
                payload: String::new(),
            }
        );

        let record =
            parse_record(r#"12^error,msg="/x/a.so: No such file or directory.",code="x""#)
                .unwrap();
        match record {
            MiRecord::Result {
                token,
                class,
                message,
                ..
            } => {
                assert_eq!(token, Some(12));
                assert_eq!(class, ResultClass::Error);
                assert_eq!(
                    message.as_deref(),
                    Some("/x/a.so: No such file or directory.")
                );
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn parses_stream_records_with_escapes() {
        assert_eq!(
            parse_record(r#"~"add symbol table from file \"/x/a.so\"\n""#).unwrap(),
            MiRecord::Stream {
                kind: StreamKind::Console,
                text: "add symbol table from file \"/x/a.so\"\n".to_string(),
            }
        );
        assert_eq!(
            parse_record(r#"&"tab\there \101\n""#).unwrap(),
            MiRecord::Stream {
                kind: StreamKind::Log,
                text: "tab\there A\n".to_string(),
            }
        );
    }

    #[test]
    fn keeps_async_records_raw() {
        assert_eq!(
            parse_record(r#"=thread-group-added,id="i1""#).unwrap(),
            MiRecord::Async(r#"=thread-group-added,id="i1""#.to_string())
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_record(""), Err(MiParseError::Empty));
        assert!(matches!(
            parse_record("garbage"),
            Err(MiParseError::UnknownRecord(_))
        ));
        assert!(matches!(
            parse_record("^weird"),
            Err(MiParseError::UnknownResultClass(_))
        ));
        assert_eq!(
            parse_c_string(r#""open"#),
            Err(MiParseError::UnterminatedString)
        );
        assert_eq!(parse_c_string(r#""\q""#), Err(MiParseError::InvalidEscape('q')));
    }

    #[test]
    fn encoded_strings_parse_back() {
        let original = "add-symbol-file 'C:\\sym\\a \"b\".so'\n";
        let encoded = encode_c_string(original);
        let (decoded, rest) = parse_c_string(&encoded).unwrap();
        assert_eq!(decoded, original);
        assert!(rest.is_empty());
    }
}
