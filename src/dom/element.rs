use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time copy of a DOM element as read from the page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElementSnapshot {
    /// Lowercase HTML tag name (e.g., "div", "a", "input")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, placeholder)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text content of the element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Whether the element is rendered and can be interacted with
    #[serde(default)]
    pub is_visible: bool,
}

impl ElementSnapshot {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self { tag_name: tag_name.into().to_ascii_lowercase(), ..Default::default() }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Class attribute with whitespace normalized, empty when absent
    pub fn class_name(&self) -> String {
        self.attributes.get("class").map(|c| c.split_whitespace().collect::<Vec<_>>().join(" ")).unwrap_or_default()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.attributes.get("class").is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Text content with runs of whitespace collapsed to single spaces
    pub fn normalized_text(&self) -> String {
        self.text_content.as_deref().map(collapse_whitespace).unwrap_or_default()
    }
}

/// Collapse every run of whitespace into one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
