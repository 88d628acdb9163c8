//! Kubernetes name formats
//!
//! Checks return the list of violated rules as messages; an empty list
//! means the value is valid. Callers turn messages into field errors.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::field::{ErrorList, FieldError, FieldPath};

pub const DNS1123_LABEL_MAX_LENGTH: usize = 63;
pub const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
pub const QUALIFIED_NAME_MAX_LENGTH: usize = 63;
pub const LABEL_VALUE_MAX_LENGTH: usize = 63;
pub const TOTAL_ANNOTATION_SIZE_LIMIT: usize = 256 * 1024;

const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";
const QUALIFIED_NAME_FMT: &str = "([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]";

static DNS1123_LABEL: Lazy<Regex> = Lazy::new(|| anchored(DNS1123_LABEL_FMT));
static DNS1123_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| anchored(&subdomain_fmt()));
static QUALIFIED_NAME: Lazy<Regex> = Lazy::new(|| anchored(QUALIFIED_NAME_FMT));
static LABEL_VALUE: Lazy<Regex> = Lazy::new(|| anchored(&format!("({QUALIFIED_NAME_FMT})?")));

fn subdomain_fmt() -> String {
    format!("{DNS1123_LABEL_FMT}(\\.{DNS1123_LABEL_FMT})*")
}

fn anchored(fmt: &str) -> Regex {
    Regex::new(&format!("^{fmt}$")).expect("name format is a valid regex")
}

fn max_len_error(max: usize) -> String {
    format!("must be no more than {max} characters")
}

/// Validate a lowercase RFC 1123 label such as `my-name`.
pub fn is_dns1123_label(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_LABEL_MAX_LENGTH {
        errs.push(max_len_error(DNS1123_LABEL_MAX_LENGTH));
    }
    if !DNS1123_LABEL.is_match(value) {
        errs.push(format!(
            "a lowercase RFC 1123 label must consist of lower case alphanumeric characters or '-', \
             and must start and end with an alphanumeric character (e.g. 'my-name' or '123-abc', \
             regex used for validation is '{DNS1123_LABEL_FMT}')"
        ));
    }
    errs
}

/// Validate a lowercase RFC 1123 subdomain such as `example.com`.
pub fn is_dns1123_subdomain(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        errs.push(max_len_error(DNS1123_SUBDOMAIN_MAX_LENGTH));
    }
    if !DNS1123_SUBDOMAIN.is_match(value) {
        errs.push(format!(
            "a lowercase RFC 1123 subdomain must consist of lower case alphanumeric characters, \
             '-' or '.', and must start and end with an alphanumeric character (e.g. 'example.com', \
             regex used for validation is '{}')",
            subdomain_fmt()
        ));
    }
    errs
}

/// Validate a qualified name with optional DNS subdomain prefix, such as
/// `example.com/my-name`.
pub fn is_qualified_name(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    let parts: Vec<&str> = value.split('/').collect();
    let name = match parts.as_slice() {
        [name] => *name,
        [prefix, name] => {
            if prefix.is_empty() {
                errs.push("prefix part must be non-empty".to_string());
            } else {
                errs.extend(
                    is_dns1123_subdomain(prefix)
                        .into_iter()
                        .map(|msg| format!("prefix part {msg}")),
                );
            }
            *name
        }
        _ => {
            errs.push(format!(
                "a qualified name must consist of alphanumeric characters, '-', '_' or '.', and \
                 must start and end with an alphanumeric character (e.g. 'MyName' or \
                 'example.com/MyName', regex used for validation is '{QUALIFIED_NAME_FMT}') with an \
                 optional DNS subdomain prefix and '/'"
            ));
            return errs;
        }
    };

    if name.is_empty() {
        errs.push("name part must be non-empty".to_string());
    } else if name.len() > QUALIFIED_NAME_MAX_LENGTH {
        errs.push(format!("name part {}", max_len_error(QUALIFIED_NAME_MAX_LENGTH)));
    }
    if !QUALIFIED_NAME.is_match(name) {
        errs.push(format!(
            "name part must consist of alphanumeric characters, '-', '_' or '.', and must start \
             and end with an alphanumeric character (e.g. 'MyName' or 'my.name', regex used for \
             validation is '{QUALIFIED_NAME_FMT}')"
        ));
    }
    errs
}

/// Validate a label value. Empty values are allowed.
pub fn is_valid_label_value(value: &str) -> Vec<String> {
    let mut errs = Vec::new();
    if value.len() > LABEL_VALUE_MAX_LENGTH {
        errs.push(max_len_error(LABEL_VALUE_MAX_LENGTH));
    }
    if !LABEL_VALUE.is_match(value) {
        errs.push(format!(
            "a valid label must be an empty string or consist of alphanumeric characters, '-', \
             '_' or '.', and must start and end with an alphanumeric character (e.g. 'MyValue' or \
             'my_value' or '12345', regex used for validation is '({QUALIFIED_NAME_FMT})?')"
        ));
    }
    errs
}

/// Validate a label map: keys must be qualified names, values label values.
pub fn validate_labels(labels: &BTreeMap<String, String>, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    for (key, value) in labels {
        for msg in is_qualified_name(key) {
            errs.push(FieldError::invalid(path, key, msg));
        }
        for msg in is_valid_label_value(value) {
            errs.push(FieldError::invalid(&path.key(key), value, msg));
        }
    }
    errs
}

/// Validate an annotation map: keys must be qualified names and the
/// total size is bounded.
pub fn validate_annotations(annotations: &BTreeMap<String, String>, path: &FieldPath) -> ErrorList {
    let mut errs = ErrorList::new();
    let mut total = 0;
    for (key, value) in annotations {
        for msg in is_qualified_name(&key.to_lowercase()) {
            errs.push(FieldError::invalid(path, key, msg));
        }
        total += key.len() + value.len();
    }
    if total > TOTAL_ANNOTATION_SIZE_LIMIT {
        errs.push(FieldError::too_long(path, TOTAL_ANNOTATION_SIZE_LIMIT));
    }
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorType;

    #[test]
    fn test_dns1123_label() {
        for ok in ["a", "foo", "foo-bar", "123-abc", "a1"] {
            assert!(is_dns1123_label(ok).is_empty(), "{ok} should be valid");
        }
        for bad in ["", "foo*", "Foo", "-foo", "foo-", "foo.bar", "foo_bar"] {
            assert!(!is_dns1123_label(bad).is_empty(), "{bad} should be invalid");
        }
        assert_eq!(is_dns1123_label(&"a".repeat(64)).len(), 1);
    }

    #[test]
    fn test_dns1123_subdomain() {
        for ok in ["foo", "foo.bar.baz", "example.com", "a-b.c-d"] {
            assert!(is_dns1123_subdomain(ok).is_empty(), "{ok} should be valid");
        }
        for bad in ["", "foo*", "foo..bar", ".foo", "foo.", "Foo.bar"] {
            assert!(!is_dns1123_subdomain(bad).is_empty(), "{bad} should be invalid");
        }
        let long = vec!["a".repeat(63); 5].join(".");
        assert!(!is_dns1123_subdomain(&long).is_empty());
    }

    #[test]
    fn test_qualified_name() {
        for ok in ["shoot-name", "MyName", "example.com/my-name", "a.b_c"] {
            assert!(is_qualified_name(ok).is_empty(), "{ok} should be valid");
        }
        assert!(!is_qualified_name("").is_empty());
        assert!(!is_qualified_name("/name").is_empty());
        assert!(!is_qualified_name("a/b/c").is_empty());
        assert!(!is_qualified_name("Example.com/name").is_empty());
        assert!(!is_qualified_name("-name").is_empty());
    }

    #[test]
    fn test_label_value() {
        assert!(is_valid_label_value("").is_empty());
        assert!(is_valid_label_value("my-shoot").is_empty());
        assert!(!is_valid_label_value("my shoot").is_empty());
        assert!(!is_valid_label_value(&"v".repeat(64)).is_empty());
    }

    #[test]
    fn test_validate_labels() {
        let labels = BTreeMap::from([
            ("shoot-name".to_string(), "my-shoot".to_string()),
            ("bad key".to_string(), "ok".to_string()),
            ("good".to_string(), "bad value!".to_string()),
        ]);
        let path = FieldPath::new("spec").child("labels");
        let errs = validate_labels(&labels, &path);

        assert!(errs.contains(ErrorType::Invalid, "spec.labels"));
        assert!(errs.contains(ErrorType::Invalid, "spec.labels[good]"));
        assert!(!errs.contains(ErrorType::Invalid, "spec.labels[shoot-name]"));
    }

    #[test]
    fn test_validate_annotations_size() {
        let annotations = BTreeMap::from([("big".to_string(), "x".repeat(TOTAL_ANNOTATION_SIZE_LIMIT))]);
        let errs = validate_annotations(&annotations, &FieldPath::new("metadata").child("annotations"));
        assert!(errs.contains(ErrorType::TooLong, "metadata.annotations"));
    }
}
