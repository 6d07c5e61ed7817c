//! Prompt template for bias analysis.
//!
//! The instruction text and the example JSON schema live in `prompts/` as
//! plain data files and are embedded at compile time. Each revision of the
//! pair gets a new version tag, so a change in the expected response shape is
//! visible in logs and never requires touching rendering code.
//!
//! Callers can replace the template at startup via
//! [`PromptTemplate::from_file`]; the embedded revision is used otherwise.

use crate::error::DetectaError;
use std::path::Path;

/// Version tag of the embedded template.
pub const DEFAULT_PROMPT_VERSION: &str = "bias-v1";

/// Embedded instruction text. Contains the `{text}` and `{schema}` placeholders.
pub const DEFAULT_PROMPT_BODY: &str = include_str!("../prompts/bias_v1.txt");

/// Example response the model is asked to conform to.
///
/// The schema is communicated through the prompt only; nothing enforces it
/// structurally on the request.
pub const DEFAULT_SCHEMA_EXAMPLE: &str = include_str!("../prompts/bias_v1.schema.json");

const TEXT_PLACEHOLDER: &str = "{text}";
const SCHEMA_PLACEHOLDER: &str = "{schema}";

/// A versioned prompt: instruction body plus example schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    version: String,
    body: String,
    schema_example: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            version: DEFAULT_PROMPT_VERSION.to_string(),
            body: DEFAULT_PROMPT_BODY.to_string(),
            schema_example: DEFAULT_SCHEMA_EXAMPLE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Build a custom template. The body must contain `{text}`; `{schema}` is
    /// optional and expands to the embedded schema example.
    pub fn new(version: impl Into<String>, body: impl Into<String>) -> Result<Self, DetectaError> {
        let body = body.into();
        if !body.contains(TEXT_PLACEHOLDER) {
            return Err(DetectaError::InvalidConfig(format!(
                "prompt template must contain the {TEXT_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self {
            version: version.into(),
            body,
            schema_example: DEFAULT_SCHEMA_EXAMPLE.to_string(),
        })
    }

    /// Load a template body from a text file. The file stem becomes the
    /// version tag.
    pub fn from_file(path: &Path) -> Result<Self, DetectaError> {
        let body = std::fs::read_to_string(path).map_err(|e| {
            DetectaError::InvalidConfig(format!("cannot read prompt file {}: {e}", path.display()))
        })?;
        let version = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "custom".to_string());
        Self::new(version, body)
    }

    /// Replace the example schema that `{schema}` expands to.
    pub fn with_schema_example(mut self, schema: impl Into<String>) -> Self {
        self.schema_example = schema.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn schema_example(&self) -> &str {
        &self.schema_example
    }

    /// Build the outbound prompt for `text`.
    ///
    /// The text is embedded verbatim with no truncation. The schema is
    /// substituted first so a document that happens to contain `{schema}` is
    /// left untouched.
    pub fn render(&self, text: &str) -> String {
        self.body
            .replace(SCHEMA_PLACEHOLDER, self.schema_example.trim_end())
            .replace(TEXT_PLACEHOLDER, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_embeds_text_verbatim() {
        let text = "The defendant, a \"single mother\", acted emotionally.\nSecond line.";
        let prompt = PromptTemplate::default().render(text);
        assert!(prompt.contains(text));
        assert!(!prompt.contains(TEXT_PLACEHOLDER));
        assert!(!prompt.contains(SCHEMA_PLACEHOLDER));
    }

    #[test]
    fn default_prompt_names_all_five_axes() {
        let prompt = PromptTemplate::default().render("x");
        for axis in ["gender", "racial", "socioeconomic", "moral", "cognitive"] {
            assert!(prompt.contains(axis), "missing axis {axis}");
        }
        assert!(prompt.contains("0 to 100"));
    }

    #[test]
    fn default_prompt_includes_schema_keys() {
        let prompt = PromptTemplate::default().render("x");
        for key in [
            "\"bias_percentage\"",
            "\"summary\"",
            "\"findings\"",
            "\"type\"",
            "\"excerpt\"",
            "\"explanation\"",
            "\"suggested_rewrite\"",
            "\"rewritten_document\"",
        ] {
            assert!(prompt.contains(key), "missing key {key}");
        }
    }

    #[test]
    fn text_containing_schema_placeholder_is_not_expanded() {
        let prompt = PromptTemplate::default().render("literal {schema} in the decision");
        assert!(prompt.contains("literal {schema} in the decision"));
    }

    #[test]
    fn custom_template_requires_text_placeholder() {
        assert!(PromptTemplate::new("v2", "Analyse this.").is_err());
        let t = PromptTemplate::new("v2", "Analyse: {text}").unwrap();
        assert_eq!(t.version(), "v2");
        assert_eq!(t.render("abc"), "Analyse: abc");
    }

    #[test]
    fn from_file_uses_stem_as_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias_v2.txt");
        std::fs::write(&path, "Check {text} against {schema}").unwrap();
        let t = PromptTemplate::from_file(&path).unwrap();
        assert_eq!(t.version(), "bias_v2");
        assert!(t.render("doc").starts_with("Check doc against {"));
    }
}
