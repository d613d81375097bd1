//! Element snapshots and their textual projection
//!
//! - ElementSnapshot: what a driver reads back from one DOM node
//! - ElementDescriptor: the ordered, truncated view used in observations
//! - compaction of adjacent structurally identical entries

pub mod descriptor;
pub mod element;

pub use descriptor::{
    compact, describe_elements, format_extraction, truncate_text, ElementDescriptor, ELLIPSIS, NO_ELEMENTS_FOUND,
};
pub use element::{collapse_whitespace, ElementSnapshot};
