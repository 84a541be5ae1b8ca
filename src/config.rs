//! Predictor configuration with builder pattern.
//!
//! [`PredictorConfig`] adjusts how a model file is interpreted. It uses the
//! `bon` crate for builder generation and `serde` so it can be loaded from
//! JSON alongside the model.
//!
//! # Example
//!
//! ```
//! use xgb_predictor::PredictorConfig;
//!
//! // All defaults: use the file's objective and base score
//! let config = PredictorConfig::builder().build().unwrap();
//! assert!(!config.strict_trailer);
//!
//! // Force raw logits and reject trailing garbage
//! let config = PredictorConfig::builder()
//!     .objective("binary:logitraw")
//!     .strict_trailer(true)
//!     .build()
//!     .unwrap();
//!
//! // From JSON
//! let config: PredictorConfig =
//!     serde_json::from_str(r#"{ "base_margin": 0.0 }"#).unwrap();
//! assert_eq!(config.base_margin, Some(0.0));
//! ```

use bon::Builder;
use serde::Deserialize;

use crate::compat::xgboost::LoadOptions;
use crate::error::FormatError;
use crate::objective::Objective;

/// Configuration applied when constructing a [`Predictor`](crate::Predictor).
#[derive(Debug, Clone, Default, PartialEq, Builder, Deserialize)]
#[builder(derive(Clone, Debug), finish_fn(vis = "", name = __build_internal))]
#[serde(default, deny_unknown_fields)]
pub struct PredictorConfig {
    /// Objective name overriding the one stored in the model.
    #[builder(into)]
    pub objective: Option<String>,

    /// Base margin overriding the one derived from the stored base score.
    pub base_margin: Option<f64>,

    /// Treat bytes after a fully parsed model as an error. Default: false.
    #[builder(default)]
    pub strict_trailer: bool,
}

impl<S: predictor_config_builder::IsComplete> PredictorConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// [`FormatError::UnknownObjective`] if the objective override is not a
    /// known objective name.
    pub fn build(self) -> Result<PredictorConfig, FormatError> {
        let config = self.__build_internal();
        config.load_options()?;
        Ok(config)
    }
}

impl PredictorConfig {
    /// Resolve into loader options.
    pub fn load_options(&self) -> Result<LoadOptions, FormatError> {
        let objective = self
            .objective
            .as_deref()
            .map(str::parse::<Objective>)
            .transpose()?;
        Ok(LoadOptions {
            objective,
            base_margin: self.base_margin,
            strict_trailer: self.strict_trailer,
        })
    }
}
