//! Field type classification from mapping metadata
//!
//! The remote schema's type hint is the primary signal; the database name
//! pattern is the fallback when no hint was captured. There is no error
//! path: anything unrecognized classifies as String, so a misread column
//! degrades to string transmission instead of failing the row.

/// Semantic type of a mapped column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    LongText,
    Boolean,
    DateTime,
    Integer,
    Decimal,
    Choice,
}

impl FieldKind {
    /// Wire type string used in form-field payloads
    pub fn wire_type(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::LongText => "longText",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "dateTime",
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Choice => "choice",
        }
    }
}

/// Infer the semantic type for a mapped column
pub fn classify(type_hint: &str, database_name: &str, explicit_choice: bool) -> FieldKind {
    if explicit_choice {
        return FieldKind::Choice;
    }

    let hint = type_hint.trim().to_lowercase();
    if !hint.is_empty() {
        return if hint == "yes / no choice" {
            FieldKind::Boolean
        } else if hint == "floating-point number" {
            FieldKind::Decimal
        } else if hint == "multiple lines of text" {
            FieldKind::LongText
        } else if hint.contains("choice") {
            FieldKind::Choice
        } else {
            FieldKind::String
        };
    }

    if database_name.contains("Choose") || database_name.contains("Choice") {
        FieldKind::Choice
    } else if database_name.contains("AttBool") {
        FieldKind::Boolean
    } else if database_name.contains("AttDateTime") {
        FieldKind::DateTime
    } else if database_name.contains("AttInt") {
        FieldKind::Integer
    } else if database_name.contains("AttDecimal") || database_name.starts_with("DET_Value") {
        FieldKind::Decimal
    } else if database_name.starts_with("DET_LongText") {
        FieldKind::LongText
    } else {
        FieldKind::String
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_hint_is_primary() {
        assert_eq!(
            classify("Yes / No choice", "WFD_AttBool1", false),
            FieldKind::Boolean
        );
        assert_eq!(
            classify("Floating-point number", "DET_Value1", false),
            FieldKind::Decimal
        );
        assert_eq!(
            classify("Multiple lines of text", "WFD_Text1", false),
            FieldKind::LongText
        );
        assert_eq!(
            classify("Choice with lookup", "WFD_Text1", false),
            FieldKind::Choice
        );
    }

    #[test]
    fn test_database_name_fallback() {
        assert_eq!(classify("", "WFD_AttChoose2", false), FieldKind::Choice);
        assert_eq!(classify("", "WFD_AttBool3", false), FieldKind::Boolean);
        assert_eq!(classify("", "WFD_AttDateTime1", false), FieldKind::DateTime);
        assert_eq!(classify("", "WFD_AttInt7", false), FieldKind::Integer);
        assert_eq!(classify("", "WFD_AttDecimal2", false), FieldKind::Decimal);
        assert_eq!(classify("", "DET_Value4", false), FieldKind::Decimal);
        assert_eq!(classify("", "DET_LongText1", false), FieldKind::LongText);
    }

    #[test]
    fn test_unrecognized_falls_through_to_string() {
        assert_eq!(classify("", "WFD_Text1", false), FieldKind::String);
        assert_eq!(classify("Single line of text", "WFD_AttInt1", false), FieldKind::String);
        assert_eq!(classify("", "", false), FieldKind::String);
    }

    #[test]
    fn test_explicit_choice_flag_wins() {
        assert_eq!(classify("Yes / No choice", "WFD_AttBool1", true), FieldKind::Choice);
        assert_eq!(classify("", "", true), FieldKind::Choice);
    }
}
