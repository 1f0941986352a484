//! Plain-text templates and placeholder substitution
//!
//! Template parsing into plain text is an external concern; this module
//! consumes the result. Structural validation happens at discovery time:
//! a file that cannot be read as UTF-8 text, or is empty, fails its
//! campaign. Rendering replaces `{{fieldName}}` tokens with recipient
//! fields; an unresolved placeholder is left as literal text and reported
//! so validation output can flag it.

use std::path::Path;

use herald_common::Recipient;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// A loaded, structurally valid template body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub body: String,
}

/// The result of substituting one recipient into a template.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: String,
    /// Placeholder names that had no matching recipient field and were left
    /// in the output verbatim.
    pub unresolved: Vec<String>,
}

impl Template {
    /// Load and structurally validate a template file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::TemplateInvalid`] when the file cannot be
    /// read as UTF-8 text or contains no content.
    pub fn load(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path).map_err(|e| CatalogError::TemplateInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        if body.trim().is_empty() {
            return Err(CatalogError::TemplateInvalid {
                path: path.to_path_buf(),
                detail: "template is empty".to_string(),
            });
        }

        let name = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().to_string());

        Ok(Self { name, body })
    }

    /// Substitute `{{fieldName}}` placeholders with the recipient's fields.
    #[must_use]
    pub fn render(&self, recipient: &Recipient) -> Rendered {
        substitute(&self.body, recipient)
    }
}

/// Substitute `{{fieldName}}` placeholders in any string — template bodies
/// and subject lines alike.
#[must_use]
pub fn substitute(input: &str, recipient: &Recipient) -> Rendered {
    let mut body = String::with_capacity(input.len());
    let mut unresolved = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find("{{") {
        body.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            // Unterminated braces: keep the remainder verbatim.
            body.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let field = after_open[..close].trim();
        match recipient.field(field) {
            Some(value) => body.push_str(value),
            None => {
                body.push_str(&rest[open..open + 2 + close + 2]);
                if !unresolved.contains(&field.to_string()) {
                    unresolved.push(field.to_string());
                }
            }
        }

        rest = &after_open[close + 2..];
    }
    body.push_str(rest);

    Rendered { body, unresolved }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use herald_common::EmailAddress;

    use super::*;

    fn recipient() -> Recipient {
        let mut r = Recipient::new(EmailAddress::parse("avery@example.org").unwrap());
        r.display_name = Some("Avery".to_string());
        r.extras.insert("role".to_string(), "Director".to_string());
        r
    }

    fn template(body: &str) -> Template {
        Template {
            name: "test".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_render_substitutes_fields() {
        let rendered = template("Dear {{name}} ({{role}}) at {{email}}").render(&recipient());
        assert_eq!(rendered.body, "Dear Avery (Director) at avery@example.org");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn test_unresolved_placeholder_left_literal_and_flagged() {
        let rendered = template("Hello {{name}}, from {{branch}}").render(&recipient());
        assert_eq!(rendered.body, "Hello Avery, from {{branch}}");
        assert_eq!(rendered.unresolved, vec!["branch".to_string()]);
    }

    #[test]
    fn test_repeated_unresolved_reported_once() {
        let rendered = template("{{branch}} and {{branch}}").render(&recipient());
        assert_eq!(rendered.unresolved.len(), 1);
    }

    #[test]
    fn test_unterminated_braces_kept_verbatim() {
        let rendered = template("Hello {{name").render(&recipient());
        assert_eq!(rendered.body, "Hello {{name");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "   \n  ").unwrap();

        assert!(matches!(
            Template::load(&path),
            Err(CatalogError::TemplateInvalid { .. })
        ));
    }

    #[test]
    fn test_load_rejects_non_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        assert!(matches!(
            Template::load(&path),
            Err(CatalogError::TemplateInvalid { .. })
        ));
    }

    #[test]
    fn test_load_reads_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("welcome.txt");
        std::fs::write(&path, "Hello {{name}}").unwrap();

        let loaded = Template::load(&path).unwrap();
        assert_eq!(loaded.name, "welcome");
        assert_eq!(loaded.body, "Hello {{name}}");
    }
}
