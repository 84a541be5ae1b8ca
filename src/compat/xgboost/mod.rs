//! XGBoost legacy binary model loader.
//!
//! Decodes the pre-JSON binary layout written by `Booster.save_model` in the
//! reference toolkit, for `gbtree`, `dart` and `gblinear` boosters, with or
//! without the `binf` magic prefix.
//!
//! # Example
//!
//! ```
//! use xgb_predictor::compat::xgboost::{parse_model, LoadOptions};
//! use xgb_predictor::testing::{ModelBuilder, RawTree};
//!
//! let bytes = ModelBuilder::gbtree("binary:logistic")
//!     .tree(RawTree::stump(0.3))
//!     .build();
//! let model = parse_model(&bytes, &LoadOptions::default()).unwrap();
//! assert_eq!(model.booster().num_trees(), 1);
//! ```

mod convert;
mod format;
mod reader;

use std::io::Read;

use tracing::warn;

pub use format::{MAGIC, MAX_SUPPORTED_MAJOR_VERSION};

use crate::error::FormatError;
use crate::model::Model;
use crate::objective::Objective;

use format::ModelRecord;
use reader::ByteReader;

/// Options applied while loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOptions {
    /// Use this objective instead of the one named in the file.
    pub objective: Option<Objective>,
    /// Use this base margin instead of deriving it from the stored base score.
    pub base_margin: Option<f64>,
    /// Reject bytes left over after the model.
    pub strict_trailer: bool,
}

/// Decode a model from an in-memory buffer.
pub fn parse_model(bytes: &[u8], options: &LoadOptions) -> Result<Model, FormatError> {
    let mut reader = ByteReader::new(bytes);
    let record = ModelRecord::read(&mut reader)?;

    if record.trailing > 0 {
        if options.strict_trailer {
            return Err(FormatError::TrailingBytes(record.trailing));
        }
        warn!(
            trailing = record.trailing,
            offset = reader.position(),
            "ignoring trailing bytes after model"
        );
    }

    record.into_model(options)
}

/// Read the whole stream, then decode it.
///
/// End-of-input inside the model is reported as [`FormatError::Truncated`];
/// other reader failures as [`FormatError::Io`].
pub fn read_model<R: Read>(mut reader: R, options: &LoadOptions) -> Result<Model, FormatError> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse_model(&bytes, options)
}
