use thiserror::Error;

pub const MAX_INPUT_LEN: usize = 5;
pub const INPUT_PLACEHOLDER: &str = "13:08";

const FIRST_FIELD_MAX: u32 = 99;
const SECOND_FIELD_MAX: u32 = 59;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("expected exactly one ':' in {0:?}")]
    Separator(String),
    #[error("{0:?} is not a number")]
    NotNumeric(String),
    #[error("{field} field {value} exceeds {max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

fn coerce_field(raw: &str) -> Result<u32, DurationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DurationError::NotNumeric(raw.to_string()));
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| DurationError::NotNumeric(raw.to_string()))
}

/// Parses editor text into whole seconds (`first * 60 + second`).
pub fn parse_duration(text: &str) -> Result<u32, DurationError> {
    let parts: Vec<&str> = text.split(':').collect();
    let [first, second] = parts.as_slice() else {
        return Err(DurationError::Separator(text.to_string()));
    };

    let first = coerce_field(first)?;
    if first > FIRST_FIELD_MAX {
        return Err(DurationError::OutOfRange {
            field: "first",
            value: first,
            max: FIRST_FIELD_MAX,
        });
    }

    let second = coerce_field(second)?;
    if second > SECOND_FIELD_MAX {
        return Err(DurationError::OutOfRange {
            field: "second",
            value: second,
            max: SECOND_FIELD_MAX,
        });
    }

    Ok(first * 60 + second)
}

pub fn is_valid_duration(text: &str) -> bool {
    parse_duration(text).is_ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DurationInput {
    text: String,
}

impl DurationInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    fn has_separator(&self) -> bool {
        self.text.contains(':')
    }

    pub fn push_char(&mut self, ch: char) -> bool {
        let len = self.text.chars().count();
        if len >= MAX_INPUT_LEN {
            return false;
        }

        if ch == ':' {
            if self.has_separator() {
                return false;
            }
            self.text.push(ch);
            return true;
        }

        if !ch.is_ascii_digit() {
            return false;
        }

        if len == 2 && !self.has_separator() {
            self.text.push(':');
        }
        self.text.push(ch);
        true
    }

    pub fn push_str(&mut self, input: &str) -> bool {
        input
            .chars()
            .fold(false, |changed, ch| self.push_char(ch) || changed)
    }

    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::format_duration;

    #[test]
    fn parse_accepts_every_in_range_pair() {
        for first in 0..=99u32 {
            for second in [0u32, 7, 30, 59] {
                let text = format!("{first}:{second:02}");
                assert_eq!(parse_duration(&text), Ok(first * 60 + second), "{text}");
            }
        }
    }

    #[test]
    fn parse_coerces_blank_fields_to_zero() {
        assert_eq!(parse_duration(":"), Ok(0));
        assert_eq!(parse_duration("3:"), Ok(180));
        assert_eq!(parse_duration(":45"), Ok(45));
    }

    #[test]
    fn parse_rejects_wrong_separator_count() {
        assert!(matches!(
            parse_duration("430"),
            Err(DurationError::Separator(_))
        ));
        assert!(matches!(
            parse_duration("1:2:3"),
            Err(DurationError::Separator(_))
        ));
        assert!(matches!(parse_duration(""), Err(DurationError::Separator(_))));
    }

    #[test]
    fn parse_rejects_out_of_range_fields() {
        assert!(matches!(
            parse_duration("100:00"),
            Err(DurationError::OutOfRange { field: "first", .. })
        ));
        assert!(matches!(
            parse_duration("4:60"),
            Err(DurationError::OutOfRange { field: "second", .. })
        ));
    }

    #[test]
    fn parse_rejects_non_numeric_fields() {
        assert!(matches!(
            parse_duration("ab:10"),
            Err(DurationError::NotNumeric(_))
        ));
        assert!(matches!(
            parse_duration("1:-5"),
            Err(DurationError::NotNumeric(_))
        ));
        assert!(!is_valid_duration("1.5:00"));
    }

    #[test]
    fn format_is_canonical_after_parse() {
        assert_eq!(format_duration(parse_duration("4:30").unwrap()), "4:30");
        assert_eq!(format_duration(parse_duration("04:05").unwrap()), "4:05");
        assert_eq!(format_duration(parse_duration("99:59").unwrap()), "99:59");
        assert_eq!(format_duration(parse_duration("0:0").unwrap()), "0:00");
    }

    #[test]
    fn third_digit_inserts_separator() {
        let mut input = DurationInput::default();
        assert!(input.push_char('1'));
        assert!(input.push_char('2'));
        assert_eq!(input.text(), "12");
        assert!(input.push_char('3'));
        assert_eq!(input.text(), "12:3");
        assert!(input.push_char('4'));
        assert_eq!(input.text(), "12:34");
    }

    #[test]
    fn input_is_capped() {
        let mut input = DurationInput::new("12:34");
        assert!(!input.push_char('5'));
        assert_eq!(input.text(), "12:34");
    }

    #[test]
    fn rejects_letters_and_second_separator() {
        let mut input = DurationInput::new("4");
        assert!(!input.push_char('x'));
        assert!(input.push_char(':'));
        assert!(!input.push_char(':'));
        assert!(input.push_char('3'));
        assert_eq!(input.text(), "4:3");
    }

    #[test]
    fn backspace_drops_only_last_char() {
        let mut input = DurationInput::new("4:30");
        assert!(input.backspace());
        assert_eq!(input.text(), "4:3");
        assert!(input.backspace());
        assert!(input.backspace());
        assert_eq!(input.text(), "4");
        assert!(input.backspace());
        assert!(!input.backspace());
        assert!(input.is_empty());
    }

    #[test]
    fn paste_runs_through_same_rules() {
        let mut input = DurationInput::default();
        assert!(input.push_str("1a234"));
        assert_eq!(input.text(), "12:34");
    }
}
