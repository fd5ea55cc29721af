//! Output filename templates.
//!
//! A template is plain text with `{key}` placeholders filled from experiment
//! metadata, e.g. `contacts_{experiment_id}_{condition}.tsv`. `{{` and `}}`
//! stand for literal braces. Metadata keys the template never mentions are
//! ignored.

use std::path::PathBuf;

use crate::data::model::Metadata;
use crate::error::{ContactsError, Result};

/// Substitute every placeholder in `template` from `metadata`.
pub fn render(template: &str, metadata: &Metadata) -> Result<String> {
    let malformed = |message: &str| ContactsError::MalformedTemplate {
        template: template.to_string(),
        message: message.to_string(),
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(malformed("'{' inside placeholder")),
                        Some(k) => key.push(k),
                        None => return Err(malformed("unterminated placeholder")),
                    }
                }
                let value = metadata
                    .get(&key)
                    .ok_or(ContactsError::MissingTemplateKey { key })?;
                out.push_str(&value.to_string());
            }
            '}' => return Err(malformed("unmatched '}'")),
            other => out.push(other),
        }
    }

    Ok(out)
}

/// [`render`] into a filesystem path.
pub fn resolve_path(template: &str, metadata: &Metadata) -> Result<PathBuf> {
    render(template, metadata).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::MetadataValue;

    fn meta() -> Metadata {
        let mut m = Metadata::new();
        m.insert("id".to_string(), MetadataValue::from("exp1"));
        m.insert("rep".to_string(), MetadataValue::Integer(3));
        m.insert("unused".to_string(), MetadataValue::Bool(false));
        m
    }

    #[test]
    fn substitutes_placeholders() {
        assert_eq!(render("out_{id}.tsv", &meta()).unwrap(), "out_exp1.tsv");
        assert_eq!(
            render("{id}/rep{rep}_{id}.tsv", &meta()).unwrap(),
            "exp1/rep3_exp1.tsv"
        );
    }

    #[test]
    fn plain_name_passes_through() {
        assert_eq!(render("contacts.tsv", &Metadata::new()).unwrap(), "contacts.tsv");
    }

    #[test]
    fn missing_key_is_named() {
        match render("out_{missing}.tsv", &meta()) {
            Err(ContactsError::MissingTemplateKey { key }) => assert_eq!(key, "missing"),
            other => panic!("expected MissingTemplateKey, got {other:?}"),
        }
    }

    #[test]
    fn non_string_values_render_like_the_experiment_sheet() {
        let mut m = Metadata::new();
        m.insert("fixed".to_string(), MetadataValue::Bool(true));
        m.insert("note".to_string(), MetadataValue::Null);
        m.insert("big".to_string(), MetadataValue::Float(1e20));
        assert_eq!(
            render("out_{fixed}_{note}_{big}.tsv", &m).unwrap(),
            "out_True_None_1e+20.tsv"
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        assert_eq!(render("{{{id}}}.tsv", &meta()).unwrap(), "{exp1}.tsv");
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(matches!(
            render("out_{id.tsv", &meta()),
            Err(ContactsError::MalformedTemplate { .. })
        ));
        assert!(matches!(
            render("out_id}.tsv", &meta()),
            Err(ContactsError::MalformedTemplate { .. })
        ));
    }

    #[test]
    fn resolves_to_path() {
        assert_eq!(
            resolve_path("out_{id}.tsv", &meta()).unwrap(),
            PathBuf::from("out_exp1.tsv")
        );
    }
}
