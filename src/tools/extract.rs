use crate::dom::describe_elements;
use crate::error::Result;
use crate::tools::{ExtractElementsParams, Observation, Tool, ToolContext};
use async_trait::async_trait;

/// Tool for listing the elements matching a selector
#[derive(Default)]
pub struct ExtractElementsTool;

#[async_trait]
impl Tool for ExtractElementsTool {
    type Params = ExtractElementsParams;

    fn name(&self) -> &str {
        "extract_elements"
    }

    async fn execute_typed(&self, params: ExtractElementsParams, context: &ToolContext<'_>) -> Result<Observation> {
        let snapshots = context.session.query_all(&params.selector, params.limit).await?;
        log::debug!("extract_elements('{}') matched {} element(s)", params.selector, snapshots.len());

        let budget = params.truncate.then_some(context.config.text_budget);
        Ok(Observation::success(describe_elements(&snapshots, budget, params.compact)))
    }
}
