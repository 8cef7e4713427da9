pub mod ast;
pub mod builder;
pub mod config;
pub mod document;
pub mod dot;
pub mod ir;
pub mod multiplicity;
pub mod types;
pub mod validate;

mod error;

pub use error::ErdotError;

use std::path::Path;
use std::sync::OnceLock;

use log::{debug, info};
use wasm_bindgen::prelude::*;

use ast::Model;
use config::AppConfig;
use dot::DotRenderer;
use ir::GraphIR;
use types::TypeRegistry;
use validate::{SemanticError, ValidatedModel, Validator};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

static PIPELINE: OnceLock<Pipeline> = OnceLock::new();

/// Validate a JSON model document and render it as DOT
#[wasm_bindgen(js_name = "erToDot")]
pub fn render_er(source: &str) -> Result<String, String> {
    let pipeline = PIPELINE.get_or_init(Pipeline::default);
    let model = pipeline.load(source).map_err(|e| e.to_string())?;
    pipeline.render(&model).map_err(|e| e.to_string())
}

/// Validation and export over one registry and style.
///
/// Build it once and reuse it for every model.
#[derive(Debug, Default)]
pub struct Pipeline {
    registry: TypeRegistry,
    config: AppConfig,
}

impl Pipeline {
    pub fn new(registry: TypeRegistry, config: AppConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve a JSON model document and validate it.
    pub fn load(&self, source: &str) -> Result<ValidatedModel, ErdotError> {
        let model = document::load_model(source, &self.registry)?;
        debug!("Model OK");
        Ok(self.validate(model)?)
    }

    pub fn validate(&self, model: Model) -> Result<ValidatedModel, SemanticError> {
        Validator::new(&self.registry).validate(model)
    }

    pub fn render(&self, model: &ValidatedModel) -> Result<String, ErdotError> {
        let ir = GraphIR::from_model(model, &self.registry);
        Ok(DotRenderer::new(self.config.style().clone()).render_to_string(&ir)?)
    }

    pub fn export(&self, model: &ValidatedModel, path: &Path) -> Result<(), ErdotError> {
        info!(path:? = path; "Exporting model");
        let ir = GraphIR::from_model(model, &self.registry);
        DotRenderer::new(self.config.style().clone()).export_to_file(&ir, path)?;
        Ok(())
    }
}
