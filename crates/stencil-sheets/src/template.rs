//! Loaded templates

use std::path::Path;

use stencil_sheets_core::Value;
use stencil_sheets_xlsx::{RenderOptions, Rendered, TemplateRenderer};

use crate::error::{Error, Result};
use crate::source::TemplateSource;

/// An `.xlsx` template held in memory, ready to be rendered any number of
/// times
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Vec<u8>,
    options: RenderOptions,
}

impl Template {
    /// Load a template from any [`TemplateSource`]
    pub fn load(source: impl Into<TemplateSource>) -> Result<Self> {
        Ok(Self::from_bytes(source.into().fetch()?))
    }

    /// Wrap template bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            options: RenderOptions::default(),
        }
    }

    /// Read a template file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path.as_ref())
    }

    /// Builder: set the options used by [`render`](Self::render)
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Options used by [`render`](Self::render)
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The raw template bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render with this template's options, returning the `.xlsx` bytes
    pub fn render(&self, data: &Value) -> Result<Vec<u8>> {
        Ok(self.render_with(data, &self.options)?.bytes)
    }

    /// Render with explicit options, returning bytes and statistics
    pub fn render_with(&self, data: &Value, options: &RenderOptions) -> Result<Rendered> {
        Ok(TemplateRenderer::render(&self.bytes, data, options)?)
    }

    /// Render from JSON text
    pub fn render_json(&self, json: &str) -> Result<Vec<u8>> {
        let data: serde_json::Value = serde_json::from_str(json)?;
        self.render(&Value::from(data))
    }

    /// Render and write the result to `path`
    pub fn render_to_file<P: AsRef<Path>>(&self, data: &Value, path: P) -> Result<Rendered> {
        let path = path.as_ref();
        let rendered = self.render_with(data, &self.options)?;
        std::fs::write(path, &rendered.bytes).map_err(|source| Error::Output {
            path: path.display().to_string(),
            source,
        })?;
        Ok(rendered)
    }

    /// Every distinct placeholder body, in first-seen order
    pub fn placeholders(&self) -> Result<Vec<String>> {
        Ok(TemplateRenderer::placeholders(&self.bytes)?)
    }
}
