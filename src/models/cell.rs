//! Raw cell values as supplied by a row source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single raw cell from a spreadsheet or worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Build a cell from text, mapping the empty string to `Empty`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Build a cell the way gspread's `numericise` does: integer and float
    /// looking strings become numbers, everything else stays text.
    pub fn numericise(value: &str) -> Self {
        if value.is_empty() {
            return CellValue::Empty;
        }

        let candidate = value.replace(',', "");
        let looks_numeric = candidate
            .trim_start_matches(['-', '+'])
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.');

        if looks_numeric && candidate.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(n) = candidate.parse::<i64>() {
                return CellValue::Number(n as f64);
            }
            if let Ok(n) = candidate.parse::<f64>() {
                return CellValue::Number(n);
            }
        }

        CellValue::Text(value.to_string())
    }

    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// String form of the cell, or `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Integer value of the cell, if it holds one.
    ///
    /// Numbers must be integral; text must parse as an integer once trimmed.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            // 101.0 prints as "101"
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::text(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_number_displays_without_fraction() {
        assert_eq!(CellValue::Number(101.0).to_string(), "101");
        assert_eq!(CellValue::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_fractional_number_display() {
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".to_string()).is_blank());
        assert!(!CellValue::Text("TBA".to_string()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_as_text() {
        assert_eq!(CellValue::Empty.as_text(), None);
        assert_eq!(CellValue::from("MWF").as_text(), Some("MWF".to_string()));
        assert_eq!(CellValue::from(2210_i64).as_text(), Some("2210".to_string()));
    }

    #[test]
    fn test_as_integer() {
        assert_eq!(CellValue::Number(25.0).as_integer(), Some(25));
        assert_eq!(CellValue::Number(25.5).as_integer(), None);
        assert_eq!(CellValue::from(" 40 ").as_integer(), Some(40));
        assert_eq!(CellValue::from("about 30").as_integer(), None);
        assert_eq!(CellValue::Empty.as_integer(), None);
    }

    #[test]
    fn test_numericise() {
        assert_eq!(CellValue::numericise("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::numericise("1,200"), CellValue::Number(1200.0));
        assert_eq!(CellValue::numericise("2.5"), CellValue::Number(2.5));
        assert_eq!(CellValue::numericise(""), CellValue::Empty);
        assert_eq!(
            CellValue::numericise("9:00 AM-10:15 AM"),
            CellValue::Text("9:00 AM-10:15 AM".to_string())
        );
        assert_eq!(
            CellValue::numericise("CS-101"),
            CellValue::Text("CS-101".to_string())
        );
        assert_eq!(CellValue::numericise("."), CellValue::Text(".".to_string()));
    }

    #[test]
    fn test_empty_string_becomes_empty_cell() {
        assert_eq!(CellValue::from(""), CellValue::Empty);
    }
}
