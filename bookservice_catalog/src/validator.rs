//! Validation of request bodies sent to POST /books and PUT /books/{isbn}.
//!
//! Both schemas share the same per-field rules and differ only in which
//! fields are required. Messages follow the json-schema "stack" wording and
//! are reported in evaluation order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

const ROOT_PATH: &str = "instance";
const BOOK_PROPERTY: &str = "book";

static URI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+\-.]*:[^\s]*$").expect("valid uri regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Every book field is required
    Create,
    /// Any subset of book fields, each checked only when present
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(Vec<String>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldFormat {
    NonEmptyText,
    Uri,
    Integer { minimum: i64, maximum: i64 },
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    format: FieldFormat,
}

struct BookSchema {
    fields: &'static [FieldRule],
    required: &'static [&'static str],
}

const BOOK_FIELDS: [FieldRule; 8] = [
    FieldRule {
        name: "isbn",
        format: FieldFormat::NonEmptyText,
    },
    FieldRule {
        name: "amazon_url",
        format: FieldFormat::Uri,
    },
    FieldRule {
        name: "author",
        format: FieldFormat::NonEmptyText,
    },
    FieldRule {
        name: "language",
        format: FieldFormat::NonEmptyText,
    },
    FieldRule {
        name: "pages",
        format: FieldFormat::Integer {
            minimum: 1,
            maximum: i32::MAX as i64,
        },
    },
    FieldRule {
        name: "publisher",
        format: FieldFormat::NonEmptyText,
    },
    FieldRule {
        name: "title",
        format: FieldFormat::NonEmptyText,
    },
    FieldRule {
        name: "year",
        format: FieldFormat::Integer {
            minimum: 0,
            maximum: 2100,
        },
    },
];

const CREATE_SCHEMA: BookSchema = BookSchema {
    fields: &BOOK_FIELDS,
    required: &[
        "isbn",
        "amazon_url",
        "author",
        "language",
        "pages",
        "publisher",
        "title",
        "year",
    ],
};

const UPDATE_SCHEMA: BookSchema = BookSchema {
    fields: &BOOK_FIELDS,
    required: &[],
};

impl SchemaKind {
    fn schema(self) -> &'static BookSchema {
        match self {
            SchemaKind::Create => &CREATE_SCHEMA,
            SchemaKind::Update => &UPDATE_SCHEMA,
        }
    }
}

/// `264.0` counts as an integer, `12.5` does not. Saturates outside the i64 range.
fn whole_number(number: &serde_json::Number) -> Option<i64> {
    number
        .as_f64()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .map(|value| value as i64)
}

/// Rewrites whole floats of integer fields (`"pages": 264.0`) as integers so a
/// validated body deserializes into the typed request
pub fn normalize_integers(payload: &mut Value) {
    let Some(book) = payload
        .get_mut(BOOK_PROPERTY)
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    for rule in BOOK_FIELDS.iter() {
        if !matches!(rule.format, FieldFormat::Integer { .. }) {
            continue;
        }
        if let Some(Value::Number(number)) = book.get(rule.name) {
            if number.is_f64() {
                if let Some(whole) = whole_number(number) {
                    book.insert(rule.name.to_string(), Value::from(whole));
                }
            }
        }
    }
}

/// Checks a whole request body (`{"book": {...}}`) against the given schema
pub fn validate(payload: &Value, kind: SchemaKind) -> ValidationResult {
    let mut errors = Vec::new();

    match payload.as_object() {
        None => errors.push(format!("{ROOT_PATH} is not of a type(s) object")),
        Some(body) => {
            match body.get(BOOK_PROPERTY) {
                Some(book) => kind.schema().check_book(book, &mut errors),
                None => errors.push(format!(
                    "{ROOT_PATH} requires property \"{BOOK_PROPERTY}\""
                )),
            }
            for key in body.keys().filter(|key| key.as_str() != BOOK_PROPERTY) {
                errors.push(additional_property(ROOT_PATH, key));
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Invalid(errors)
    }
}

impl BookSchema {
    fn check_book(&self, book: &Value, errors: &mut Vec<String>) {
        let path = format!("{ROOT_PATH}.{BOOK_PROPERTY}");
        let Some(fields) = book.as_object() else {
            errors.push(format!("{path} is not of a type(s) object"));
            return;
        };

        for rule in self.fields {
            if let Some(value) = fields.get(rule.name) {
                rule.check(&format!("{path}.{}", rule.name), value, errors);
            }
        }

        for required in self.required {
            if !fields.contains_key(*required) {
                errors.push(format!("{path} requires property \"{required}\""));
            }
        }

        for key in self.unknown_keys(fields) {
            errors.push(additional_property(&path, key));
        }
    }

    fn unknown_keys<'a>(&self, fields: &'a Map<String, Value>) -> impl Iterator<Item = &'a String> {
        let known = self.fields;
        fields
            .keys()
            .filter(move |key| !known.iter().any(|rule| rule.name == key.as_str()))
    }
}

impl FieldRule {
    fn check(&self, path: &str, value: &Value, errors: &mut Vec<String>) {
        match self.format {
            FieldFormat::NonEmptyText => match value.as_str() {
                None => errors.push(format!("{path} is not of a type(s) string")),
                Some("") => errors.push(format!("{path} does not meet minimum length of 1")),
                Some(_) => {}
            },
            FieldFormat::Uri => match value.as_str() {
                None => errors.push(format!("{path} is not of a type(s) string")),
                Some(uri) if !URI_RE.is_match(uri) => {
                    errors.push(format!("{path} does not conform to the \"uri\" format"))
                }
                Some(_) => {}
            },
            FieldFormat::Integer { minimum, maximum } => {
                let number = match value {
                    Value::Number(number) if number.is_i64() => number.as_i64(),
                    // only u64 values above i64::MAX end up here
                    Value::Number(number) if number.is_u64() => Some(i64::MAX),
                    Value::Number(number) => whole_number(number),
                    _ => None,
                };
                match number {
                    None => errors.push(format!("{path} is not of a type(s) integer")),
                    Some(number) if number < minimum => errors.push(format!(
                        "{path} must be greater than or equal to {minimum}"
                    )),
                    Some(number) if number > maximum => {
                        errors.push(format!("{path} must be less than or equal to {maximum}"))
                    }
                    Some(_) => {}
                }
            }
        }
    }
}

fn additional_property(path: &str, key: &str) -> String {
    format!("{path} is not allowed to have the additional property \"{key}\"")
}

#[cfg(test)]
mod validator_tests {
    use serde_json::json;

    use super::*;

    fn power_up_body() -> Value {
        json!({
            "book": {
                "isbn": "0691161518",
                "amazon_url": "http://a.co/eobPtX2",
                "author": "Matthew Lane",
                "language": "english",
                "pages": 264,
                "publisher": "Princeton University Press",
                "title": "Power-Up",
                "year": 2017
            }
        })
    }

    fn errors_of(result: ValidationResult) -> Vec<String> {
        match result {
            ValidationResult::Valid => panic!("expected payload to be invalid"),
            ValidationResult::Invalid(errors) => errors,
        }
    }

    #[test]
    fn complete_book_passes_both_schemas() {
        assert_eq!(
            validate(&power_up_body(), SchemaKind::Create),
            ValidationResult::Valid
        );
        assert_eq!(
            validate(&power_up_body(), SchemaKind::Update),
            ValidationResult::Valid
        );
    }

    #[test]
    fn create_rejects_every_missing_field() {
        for field in CREATE_SCHEMA.required {
            let mut body = power_up_body();
            body["book"].as_object_mut().unwrap().remove(*field);

            let errors = errors_of(validate(&body, SchemaKind::Create));
            assert_eq!(
                errors,
                vec![format!("instance.book requires property \"{field}\"")]
            );
        }
    }

    #[test]
    fn body_without_book_is_rejected() {
        let errors = errors_of(validate(&json!({"year": 2000}), SchemaKind::Create));
        assert_eq!(
            errors,
            vec![
                "instance requires property \"book\"".to_string(),
                "instance is not allowed to have the additional property \"year\"".to_string(),
            ]
        );

        let errors = errors_of(validate(&json!([1, 2]), SchemaKind::Update));
        assert_eq!(errors, vec!["instance is not of a type(s) object".to_string()]);

        let errors = errors_of(validate(&json!({"book": "x"}), SchemaKind::Update));
        assert_eq!(
            errors,
            vec!["instance.book is not of a type(s) object".to_string()]
        );
    }

    #[test]
    fn update_accepts_partial_payloads() {
        let title_only = json!({"book": {"title": "UPDATED"}});
        assert!(validate(&title_only, SchemaKind::Update).is_valid());
        assert!(validate(&json!({"book": {}}), SchemaKind::Update).is_valid());

        let errors = errors_of(validate(&title_only, SchemaKind::Create));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn update_checks_format_of_present_fields() {
        let bad_url = json!({"book": {"title": "UPDATED", "amazon_url": "not a url"}});
        let errors = errors_of(validate(&bad_url, SchemaKind::Update));
        assert_eq!(
            errors,
            vec!["instance.book.amazon_url does not conform to the \"uri\" format".to_string()]
        );
    }

    #[test]
    fn errors_are_reported_in_evaluation_order() {
        let body = json!({
            "book": {
                "isbn": "",
                "amazon_url": 5,
                "pages": 0,
                "title": null,
                "year": 3000,
                "extra": true
            }
        });
        let errors = errors_of(validate(&body, SchemaKind::Create));
        assert_eq!(
            errors,
            vec![
                "instance.book.isbn does not meet minimum length of 1",
                "instance.book.amazon_url is not of a type(s) string",
                "instance.book.pages must be greater than or equal to 1",
                "instance.book.title is not of a type(s) string",
                "instance.book.year must be less than or equal to 2100",
                "instance.book requires property \"author\"",
                "instance.book requires property \"language\"",
                "instance.book requires property \"publisher\"",
                "instance.book is not allowed to have the additional property \"extra\"",
            ]
        );
    }

    #[test]
    fn integers_must_be_whole_and_in_range() {
        let fractional = json!({"book": {"pages": 12.5}});
        assert_eq!(
            errors_of(validate(&fractional, SchemaKind::Update)),
            vec!["instance.book.pages is not of a type(s) integer".to_string()]
        );

        let whole = json!({"book": {"pages": 264.0, "year": 2017.0}});
        assert_eq!(validate(&whole, SchemaKind::Update), ValidationResult::Valid);

        let whole_too_large = json!({"book": {"year": 2101.0}});
        assert_eq!(
            errors_of(validate(&whole_too_large, SchemaKind::Update)),
            vec!["instance.book.year must be less than or equal to 2100".to_string()]
        );

        let huge = json!({"book": {"pages": u64::MAX}});
        assert_eq!(
            errors_of(validate(&huge, SchemaKind::Update)),
            vec!["instance.book.pages must be less than or equal to 2147483647".to_string()]
        );

        let negative_year = json!({"book": {"year": -5}});
        assert_eq!(
            errors_of(validate(&negative_year, SchemaKind::Update)),
            vec!["instance.book.year must be greater than or equal to 0".to_string()]
        );
    }

    #[test]
    fn whole_floats_are_rewritten_as_integers() {
        let mut body = json!({"book": {"pages": 264.0, "year": 2017, "title": "Power-Up"}});
        normalize_integers(&mut body);
        assert_eq!(
            body,
            json!({"book": {"pages": 264, "year": 2017, "title": "Power-Up"}})
        );
        assert!(body["book"]["pages"].is_i64());
    }
}
