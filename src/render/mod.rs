//! Output renderers behind a common trait.

pub mod cell;
pub mod markdown;

use crate::config::{OutputFormat, Settings};
use crate::document::DocumentModel;

/// Trait for rendering a document model into a specific output format.
pub trait Renderer {
    fn render(&self, doc: &DocumentModel) -> String;
}

/// Create a renderer for the configured output format.
pub fn create_renderer(settings: &Settings) -> Box<dyn Renderer> {
    match settings.target_config.format {
        OutputFormat::Markdown => Box::new(markdown::MarkdownRenderer::new(settings)),
    }
}
