use std::fmt;

/// Default number of elements `extract_elements` reads
pub const DEFAULT_EXTRACT_LIMIT: usize = 50;

/// Verb names the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    ExtractElements,
    InteractWithElement,
    PrintPage,
    PageSummary,
    Navigate,
    EndNavigation,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::ExtractElements,
        ActionKind::InteractWithElement,
        ActionKind::PrintPage,
        ActionKind::PageSummary,
        ActionKind::Navigate,
        ActionKind::EndNavigation,
    ];

    /// Resolve a verb name. `end` is accepted as the short form of `end_navigation`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extract_elements" => Some(ActionKind::ExtractElements),
            "interact_with_element" => Some(ActionKind::InteractWithElement),
            "print_page" => Some(ActionKind::PrintPage),
            "page_summary" => Some(ActionKind::PageSummary),
            "navigate" => Some(ActionKind::Navigate),
            "end_navigation" | "end" => Some(ActionKind::EndNavigation),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::ExtractElements => "extract_elements",
            ActionKind::InteractWithElement => "interact_with_element",
            ActionKind::PrintPage => "print_page",
            ActionKind::PageSummary => "page_summary",
            ActionKind::Navigate => "navigate",
            ActionKind::EndNavigation => "end_navigation",
        }
    }

    /// Parameter names in positional order
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            ActionKind::ExtractElements => &["selector", "truncate", "limit", "compact"],
            ActionKind::InteractWithElement => &["selector", "interaction", "text"],
            ActionKind::PrintPage | ActionKind::PageSummary => &[],
            ActionKind::Navigate => &["url"],
            ActionKind::EndNavigation => &["payload"],
        }
    }

    /// One-line usage, e.g. `navigate(url)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name(), self.params().join(", "))
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of `extract_elements`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractElementsParams {
    pub selector: String,
    /// Cut element text to the configured budget
    pub truncate: bool,
    /// Maximum number of elements to read
    pub limit: usize,
    /// Merge adjacent elements sharing tag and classes
    pub compact: bool,
}

impl ExtractElementsParams {
    pub fn new(selector: impl Into<String>) -> Self {
        Self { selector: selector.into(), truncate: true, limit: DEFAULT_EXTRACT_LIMIT, compact: false }
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }
}

/// Interaction requested by `interact_with_element`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Click,
    Fill,
    Unsupported(String),
}

impl Interaction {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "click" => Interaction::Click,
            "fill" | "type" => Interaction::Fill,
            _ => Interaction::Unsupported(name.trim().to_string()),
        }
    }
}

/// Parameters of `interact_with_element`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractParams {
    pub selector: String,
    pub interaction: Interaction,
    /// Text typed for `fill`
    pub text: String,
}

/// Parameters of `navigate`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigateParams {
    pub url: String,
}

/// One verb invocation against a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ExtractElements(ExtractElementsParams),
    InteractWithElement(InteractParams),
    PrintPage,
    PageSummary,
    Navigate(NavigateParams),
    /// Terminal action; the payload is the final answer when given inline
    EndNavigation { payload: Option<String> },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::ExtractElements(_) => ActionKind::ExtractElements,
            Action::InteractWithElement(_) => ActionKind::InteractWithElement,
            Action::PrintPage => ActionKind::PrintPage,
            Action::PageSummary => ActionKind::PageSummary,
            Action::Navigate(_) => ActionKind::Navigate,
            Action::EndNavigation { .. } => ActionKind::EndNavigation,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::EndNavigation { .. })
    }
}
