use crate::error::Result;
use crate::tools::utils::resolve_against;
use crate::tools::{NavigateParams, Observation, Tool, ToolContext};
use async_trait::async_trait;

/// Tool for loading a URL in the current page
#[derive(Default)]
pub struct NavigateTool;

#[async_trait]
impl Tool for NavigateTool {
    type Params = NavigateParams;

    fn name(&self) -> &str {
        "navigate"
    }

    async fn execute_typed(&self, params: NavigateParams, context: &ToolContext<'_>) -> Result<Observation> {
        // Relative links only make sense against the page we are on
        let current = context.session.current_url().await.unwrap_or_default();
        let url = resolve_against(&current, &params.url);

        context.session.navigate(&url).await?;
        context.session.wait_for_load().await?;

        Ok(Observation::success(format!("Navigated to {}", url)))
    }
}
