use crate::error::{Result, ScrapError};
use crate::tools::{InteractParams, Interaction, Observation, Tool, ToolContext};
use async_trait::async_trait;

/// Tool for clicking or typing into one element
#[derive(Default)]
pub struct InteractTool;

#[async_trait]
impl Tool for InteractTool {
    type Params = InteractParams;

    fn name(&self) -> &str {
        "interact_with_element"
    }

    async fn execute_typed(&self, params: InteractParams, context: &ToolContext<'_>) -> Result<Observation> {
        let selector = params.selector.as_str();

        let clicking = match &params.interaction {
            Interaction::Click => true,
            Interaction::Fill => false,
            Interaction::Unsupported(name) => {
                return Ok(Observation::failure(format!(
                    "Unsupported interaction '{}'. Use 'click' or 'fill'.",
                    name
                )));
            }
        };

        let element = match context.session.find(selector).await? {
            Some(element) => element,
            None => return Ok(Observation::failure(format!("Element with selector '{}' not found.", selector))),
        };

        if !element.is_visible {
            return Ok(Observation::failure(format!(
                "Element with selector '{}' is not visible or cannot be interacted with.",
                selector
            )));
        }

        let outcome = if clicking {
            context.session.click(selector).await.map(|_| format!("Element '{}' clicked.", selector))
        } else {
            context
                .session
                .type_text(selector, &params.text, false)
                .await
                .map(|_| format!("Text '{}' typed in element '{}'.", params.text, selector))
        };

        match outcome {
            Ok(message) => Ok(Observation::success(message)),
            Err(ScrapError::ElementNotFound(_)) => {
                Ok(Observation::failure(format!("Element with selector '{}' not found.", selector)))
            }
            Err(ScrapError::ElementNotVisible(reason)) => Ok(Observation::failure(format!(
                "Element with selector '{}' is not visible or cannot be interacted with: {}",
                selector, reason
            ))),
            Err(e) => Err(e),
        }
    }
}
