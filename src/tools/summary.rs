use crate::browser::ElementScope;
use crate::dom::describe_elements;
use crate::error::Result;
use crate::tools::{Observation, Tool, ToolContext};
use async_trait::async_trait;

/// Tags whose text is worth reading
pub const TEXT_TAGS: &str = "h1, h2, h3, h4, h5, h6, p, span, li, td, label";

/// Tags a visitor can act on
pub const INTERACTIVE_TAGS: &str = "a, button, input, select, textarea";

const META_DESCRIPTION: &str = "meta[name=\"description\"]";

/// Tool for a one-shot overview of the current page
#[derive(Default)]
pub struct PageSummaryTool;

#[async_trait]
impl Tool for PageSummaryTool {
    type Params = ();

    fn name(&self) -> &str {
        "page_summary"
    }

    async fn execute_typed(&self, _params: (), context: &ToolContext<'_>) -> Result<Observation> {
        let session = context.session;
        let budget = Some(context.config.text_budget);
        let limit = context.config.summary_limit;

        let url = session.current_url().await?;
        let title = session.title().await?;
        let description = session
            .read_property(&ElementScope::Page, META_DESCRIPTION, "content")
            .await?
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "no description".to_string());

        let text = describe_elements(&session.query_all(TEXT_TAGS, limit).await?, budget, true);
        let interactive = describe_elements(&session.query_all(INTERACTIVE_TAGS, limit).await?, budget, true);

        Ok(Observation::success(format!(
            "URL: {}\nTitle: {}\nDescription: {}\n\nText elements:\n{}\n\nInteractive elements:\n{}",
            url, title, description, text, interactive
        )))
    }
}
