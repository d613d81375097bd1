use crate::dom::element::ElementSnapshot;
use indexmap::IndexMap;
use std::fmt;

/// Marker appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Observation returned when a selector matches nothing
pub const NO_ELEMENTS_FOUND: &str = "No elements found";

/// Compact, ordered projection of one element used in extraction output
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDescriptor {
    fields: IndexMap<&'static str, String>,

    /// Number of adjacent identical elements this entry stands for
    pub repeat: usize,
}

impl ElementDescriptor {
    /// Project a snapshot, truncating its text to `text_budget` characters when given
    pub fn from_snapshot(snapshot: &ElementSnapshot, text_budget: Option<usize>) -> Self {
        let mut fields = IndexMap::new();
        fields.insert("Element", snapshot.tag_name.clone());

        let classes = snapshot.class_name();
        if !classes.is_empty() {
            fields.insert("Classes", classes);
        }

        let text = snapshot.normalized_text();
        if !text.is_empty() {
            let text = match text_budget {
                Some(budget) => truncate_text(&text, budget),
                None => text,
            };
            fields.insert("Text", text);
        }

        if snapshot.is_tag("a") {
            let href = snapshot.get_attribute("href").cloned().unwrap_or_else(|| "none".to_string());
            fields.insert("Href", href);
        }

        if snapshot.is_tag("input") {
            let name = snapshot.get_attribute("name").cloned().unwrap_or_else(|| "none".to_string());
            let placeholder = snapshot
                .get_attribute("placeholder")
                .filter(|p| !p.is_empty())
                .cloned()
                .unwrap_or_else(|| "no placeholder".to_string());
            fields.insert("Name", name);
            fields.insert("Placeholder", placeholder);
        }

        Self { fields, repeat: 1 }
    }

    pub fn tag(&self) -> &str {
        self.field("Element").unwrap_or_default()
    }

    pub fn classes(&self) -> &str {
        self.field("Classes").unwrap_or_default()
    }

    pub fn text(&self) -> Option<&str> {
        self.field("Text")
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether two descriptors share the {tag, classes} signature used by compaction
    pub fn same_shape(&self, other: &ElementDescriptor) -> bool {
        self.tag() == other.tag() && self.classes() == other.classes()
    }
}

impl fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(|(name, value)| format!("{}: {}", name, value)).collect();
        write!(f, "{}", parts.join(" "))?;
        if self.repeat > 1 {
            write!(f, " (x{})", self.repeat)?;
        }
        Ok(())
    }
}

/// Cut `text` to at most `budget` characters, appending [`ELLIPSIS`] when anything was removed
pub fn truncate_text(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let kept: String = text.chars().take(budget).collect();
    format!("{}{}", kept, ELLIPSIS)
}

/// Merge runs of adjacent descriptors with the same shape into one annotated entry.
///
/// Only neighbours are merged; the same shape appearing again later starts a new entry.
pub fn compact(descriptors: Vec<ElementDescriptor>) -> Vec<ElementDescriptor> {
    let mut compacted: Vec<ElementDescriptor> = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        match compacted.last_mut() {
            Some(previous) if previous.same_shape(&descriptor) => previous.repeat += descriptor.repeat,
            _ => compacted.push(descriptor),
        }
    }
    compacted
}

/// Render descriptors as the multi-line extraction observation
pub fn format_extraction(descriptors: &[ElementDescriptor]) -> String {
    if descriptors.is_empty() {
        return NO_ELEMENTS_FOUND.to_string();
    }
    let lines: Vec<String> = descriptors.iter().map(|d| format!("- {}", d)).collect();
    format!("Extracted elements:\n{}", lines.join("\n"))
}

/// Snapshot list → observation text, applying truncation and compaction
pub fn describe_elements(snapshots: &[ElementSnapshot], text_budget: Option<usize>, compact_output: bool) -> String {
    let descriptors: Vec<ElementDescriptor> =
        snapshots.iter().map(|s| ElementDescriptor::from_snapshot(s, text_budget)).collect();
    let descriptors = if compact_output { compact(descriptors) } else { descriptors };
    format_extraction(&descriptors)
}
