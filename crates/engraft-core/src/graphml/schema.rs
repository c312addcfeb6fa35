//! # Key Declarations & Type Coercion
//!
//! `<key>` elements declare the document's property schema: a key id, the
//! attribute name it stands for, and a declared value type. Both maps are
//! call-scoped — created empty at parse start, populated monotonically, and
//! discarded when the parse returns.

use super::IngestError;
use crate::types::{PropertyValue, ValueType};
use std::collections::BTreeMap;

/// The property schema accumulated from `<key>` declarations.
#[derive(Debug, Default)]
pub(super) struct KeyTable {
    /// key id -> attribute name
    names: BTreeMap<String, String>,
    /// attribute name -> declared type
    types: BTreeMap<String, ValueType>,
}

impl KeyTable {
    /// Register a declaration. Re-declaring a key id overwrites the prior
    /// entry (last-write-wins, not an error).
    pub(super) fn declare(&mut self, key_id: &str, attribute: &str, declared: ValueType) {
        self.names.insert(key_id.to_string(), attribute.to_string());
        self.types.insert(attribute.to_string(), declared);
    }

    /// Resolve a `data` element's key reference to its attribute name.
    /// `None` means the key was never declared and the element is inert.
    pub(super) fn attribute_name(&self, key_id: &str) -> Option<&str> {
        self.names.get(key_id).map(String::as_str)
    }

    /// Coerce raw text content into the attribute's declared type.
    ///
    /// No declaration, or a declared string type, passes the text through
    /// unchanged. Anything else parses with the canonical `FromStr` rules
    /// for the target type; unparseable text is a hard failure, never a
    /// silent fallback to string.
    pub(super) fn coerce(&self, attribute: &str, raw: &str) -> Result<PropertyValue, IngestError> {
        let declared = self
            .types
            .get(attribute)
            .copied()
            .unwrap_or(ValueType::String);

        let fail = |declared| IngestError::Coercion {
            attribute: attribute.to_string(),
            declared,
            value: raw.to_string(),
        };

        match declared {
            ValueType::String => Ok(PropertyValue::String(raw.to_string())),
            ValueType::Int => raw
                .parse::<i32>()
                .map(PropertyValue::Int)
                .map_err(|_| fail(declared)),
            ValueType::Long => raw
                .parse::<i64>()
                .map(PropertyValue::Long)
                .map_err(|_| fail(declared)),
            ValueType::Float => raw
                .parse::<f32>()
                .map(PropertyValue::Float)
                .map_err(|_| fail(declared)),
            ValueType::Double => raw
                .parse::<f64>()
                .map(PropertyValue::Double)
                .map_err(|_| fail(declared)),
            ValueType::Boolean => raw
                .parse::<bool>()
                .map(PropertyValue::Boolean)
                .map_err(|_| fail(declared)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(key_id: &str, attribute: &str, declared: ValueType) -> KeyTable {
        let mut table = KeyTable::default();
        table.declare(key_id, attribute, declared);
        table
    }

    #[test]
    fn declared_key_resolves_to_attribute_name() {
        let table = table_with("k0", "weight", ValueType::Double);
        assert_eq!(table.attribute_name("k0"), Some("weight"));
        assert_eq!(table.attribute_name("k1"), None);
    }

    #[test]
    fn redeclaration_is_last_write_wins() {
        let mut table = table_with("k0", "weight", ValueType::Double);
        table.declare("k0", "mass", ValueType::Int);

        assert_eq!(table.attribute_name("k0"), Some("mass"));
        assert_eq!(
            table.coerce("mass", "3").expect("coerce"),
            PropertyValue::Int(3)
        );
    }

    #[test]
    fn undeclared_attribute_passes_through_as_string() {
        let table = KeyTable::default();
        assert_eq!(
            table.coerce("anything", "42").expect("coerce"),
            PropertyValue::String("42".to_string())
        );
    }

    #[test]
    fn coerce_each_declared_type() {
        let mut table = KeyTable::default();
        table.declare("a", "s", ValueType::String);
        table.declare("b", "i", ValueType::Int);
        table.declare("c", "l", ValueType::Long);
        table.declare("d", "f", ValueType::Float);
        table.declare("e", "d", ValueType::Double);
        table.declare("f", "b", ValueType::Boolean);

        assert_eq!(
            table.coerce("s", "plain").expect("coerce"),
            PropertyValue::String("plain".to_string())
        );
        assert_eq!(table.coerce("i", "42").expect("coerce"), PropertyValue::Int(42));
        assert_eq!(
            table.coerce("l", "-9223372036854775808").expect("coerce"),
            PropertyValue::Long(i64::MIN)
        );
        assert_eq!(
            table.coerce("f", "2.5").expect("coerce"),
            PropertyValue::Float(2.5)
        );
        assert_eq!(
            table.coerce("d", "-0.125").expect("coerce"),
            PropertyValue::Double(-0.125)
        );
        assert_eq!(
            table.coerce("b", "true").expect("coerce"),
            PropertyValue::Boolean(true)
        );
        assert_eq!(
            table.coerce("b", "false").expect("coerce"),
            PropertyValue::Boolean(false)
        );
    }

    #[test]
    fn unparseable_int_is_a_hard_failure() {
        let table = table_with("k0", "age", ValueType::Int);
        let result = table.coerce("age", "notanumber");

        assert!(matches!(
            result,
            Err(IngestError::Coercion { declared: ValueType::Int, .. })
        ));
    }

    #[test]
    fn boolean_parsing_is_strict() {
        let table = table_with("k0", "flag", ValueType::Boolean);

        // Only the canonical literals are accepted
        assert!(table.coerce("flag", "TRUE").is_err());
        assert!(table.coerce("flag", "1").is_err());
        assert!(table.coerce("flag", "yes").is_err());
    }

    #[test]
    fn padded_numeric_text_is_rejected() {
        let table = table_with("k0", "age", ValueType::Int);
        assert!(table.coerce("age", " 42").is_err());
        assert!(table.coerce("age", "42 ").is_err());
    }

    #[test]
    fn empty_text_fails_numeric_types_but_not_string() {
        let mut table = KeyTable::default();
        table.declare("a", "i", ValueType::Int);
        table.declare("b", "s", ValueType::String);

        assert!(table.coerce("i", "").is_err());
        assert_eq!(
            table.coerce("s", "").expect("coerce"),
            PropertyValue::String(String::new())
        );
    }
}
