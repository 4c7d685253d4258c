use std::path::Path;
use tera::{Context, Tera};

use crate::error::PipelineError;
use crate::models::MappedData;
use crate::utils::write_atomic;

const TEMPLATE_NAME: &str = "branch_config";

/// Renders a branch config template with mapped site data.
///
/// Undefined placeholders are errors, never silently blank.
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Compile template text
    pub fn new(content: &str) -> Result<Self, PipelineError> {
        let mut tera = Tera::default();
        // Output is YAML/CLI config, not HTML
        tera.autoescape_on(vec![]);
        tera.add_raw_template(TEMPLATE_NAME, content)?;
        Ok(Self { tera })
    }

    /// Load and compile a template file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Template(format!("cannot read template {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded template {} ({} bytes)", path.display(), content.len());
        Self::new(&content)
    }

    pub fn render(&self, data: &MappedData) -> Result<String, PipelineError> {
        let context = Context::from_serialize(data)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    /// Render and write the result, creating or overwriting `output`.
    /// Nothing is written if rendering fails.
    pub fn render_to_file(&self, data: &MappedData, output: &Path) -> Result<(), PipelineError> {
        let rendered = self.render(data)?;
        write_atomic(output, rendered.as_bytes())?;
        tracing::info!("Wrote {} ({} bytes)", output.display(), rendered.len());
        Ok(())
    }
}
