use crate::error::Result;
use crate::tools::{Observation, Tool, ToolContext};
use async_trait::async_trait;
use std::{path::{Path, PathBuf},
          time::{SystemTime, UNIX_EPOCH}};

/// Tool for capturing the whole page as a PNG.
///
/// Without a describer the observation is the screenshot path. With one, the
/// observation is the description and the file is removed afterwards.
#[derive(Default)]
pub struct PrintPageTool;

fn screenshot_path(dir: &Path) -> PathBuf {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    dir.join(format!("print_{}.png", millis))
}

#[async_trait]
impl Tool for PrintPageTool {
    type Params = ();

    fn name(&self) -> &str {
        "print_page"
    }

    async fn execute_typed(&self, _params: (), context: &ToolContext<'_>) -> Result<Observation> {
        let path = screenshot_path(&context.config.screenshot_dir);
        context.session.screenshot(&path).await?;
        log::debug!("Screenshot written to {}", path.display());

        let Some(describer) = context.describer else {
            return Ok(Observation::success(path.display().to_string()));
        };

        let description = describer.describe(&path).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove screenshot {}: {}", path.display(), e);
        }

        Ok(Observation::success(description?))
    }
}
