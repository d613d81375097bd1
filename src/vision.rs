//! Screenshot description hook
//!
//! The engine only captures screenshots. Turning one into words is left to an
//! injected [`PageDescriber`].

use crate::error::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// Describes a full-page screenshot in natural language
#[async_trait]
pub trait PageDescriber: Send + Sync {
    async fn describe(&self, screenshot: &Path) -> Result<String>;
}

/// Read an image and encode it as standard base64, the form most vision APIs accept
pub fn encode_image(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(STANDARD.encode(bytes))
}

/// `data:` URL for a PNG screenshot
pub fn png_data_url(path: &Path) -> Result<String> {
    Ok(format!("data:image/png;base64,{}", encode_image(path)?))
}
