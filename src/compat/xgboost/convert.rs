//! Conversion from decoded records to native model types.

use tracing::debug;

use super::format::{BoosterRecord, ModelRecord, TreeRecord};
use super::LoadOptions;
use crate::error::FormatError;
use crate::model::{Booster, Model, ModelMeta};
use crate::objective::Objective;
use crate::repr::gbdt::{Forest, ForestValidationError, NodeId, Tree, TreeBuilder, TreeValidationError};
use crate::repr::gblinear::LinearModel;

impl ModelRecord {
    /// Build a [`Model`], validating every cross-reference.
    pub fn into_model(self, options: &LoadOptions) -> Result<Model, FormatError> {
        let objective = match options.objective {
            Some(objective) => objective,
            None => self.objective.parse::<Objective>()?,
        };

        let base_score = self.learner.base_score;
        let base_margin = match options.base_margin {
            Some(margin) => margin,
            // 1.0+ stores the base score in prediction space
            None if self.learner.major_version >= 1 => objective.prob_to_margin(base_score),
            None => f64::from(base_score),
        };

        let booster = match self.booster {
            BoosterRecord::Trees {
                dart,
                param,
                trees,
                tree_info,
                weight_drop,
            } => {
                let forest = convert_forest(
                    &trees,
                    &tree_info,
                    weight_drop,
                    param.num_output_group,
                    param.size_leaf_vector,
                )?;
                if dart {
                    Booster::Dart(forest)
                } else {
                    Booster::Tree(forest)
                }
            }
            BoosterRecord::Linear { param, weights } => {
                let linear = LinearModel::new(weights, param.num_feature, param.num_output_group)
                    .map_err(|e| FormatError::LengthMismatch {
                        what: "linear weights",
                        expected: e.expected,
                        actual: e.actual,
                    })?;
                Booster::Linear(linear)
            }
        };

        debug!(
            booster = booster.kind(),
            objective = %objective,
            num_groups = booster.num_groups(),
            num_trees = booster.num_trees(),
            base_margin,
            "model loaded"
        );

        let meta = ModelMeta {
            num_features: self.learner.num_feature as usize,
            base_score,
            base_margin,
            objective_name: self.objective,
            major_version: self.learner.major_version,
            minor_version: self.learner.minor_version,
            attributes: self.attributes,
            eval_metrics: self.eval_metrics,
            max_delta_step: self.max_delta_step,
        };
        Ok(Model::new(booster, meta, objective))
    }
}

fn convert_forest(
    trees: &[TreeRecord],
    tree_info: &[i32],
    weight_drop: Option<Vec<f32>>,
    num_groups: usize,
    size_leaf_vector: usize,
) -> Result<Forest, FormatError> {
    if size_leaf_vector > num_groups {
        return Err(FormatError::InvalidCount {
            what: "size_leaf_vector",
            value: size_leaf_vector as i64,
        });
    }

    let mut forest = Forest::new(num_groups as u32);
    for (tree_idx, (record, &group)) in trees.iter().zip(tree_info).enumerate() {
        let tree = convert_tree(tree_idx, record, num_groups)?;
        let group_id = u32::try_from(group).map_err(|_| FormatError::InvalidGroup {
            tree: tree_idx,
            group,
            num_groups,
        })?;
        forest
            .push_tree(tree, group_id)
            .map_err(|e| forest_error(e, group))?;
    }

    if let Some(weights) = weight_drop {
        forest.set_tree_weights(weights).map_err(|e| forest_error(e, 0))?;
    }
    Ok(forest)
}

fn forest_error(err: ForestValidationError, raw_group: i32) -> FormatError {
    match err {
        ForestValidationError::GroupOutOfRange { tree, n_groups, .. } => FormatError::InvalidGroup {
            tree,
            group: raw_group,
            num_groups: n_groups as usize,
        },
        ForestValidationError::WeightsLenMismatch { n_trees, n_weights } => {
            FormatError::LengthMismatch {
                what: "weight_drop",
                expected: n_trees,
                actual: n_weights,
            }
        }
    }
}

/// Convert a single tree record to a validated [`Tree`].
fn convert_tree(tree_idx: usize, record: &TreeRecord, num_groups: usize) -> Result<Tree, FormatError> {
    let mut builder = TreeBuilder::with_capacity(record.nodes.len());

    for (node_idx, node) in record.nodes.iter().enumerate() {
        if node.is_leaf() {
            builder.add_leaf(node.value);
            continue;
        }
        let to_child = |side: &str, child: i32| -> Result<NodeId, FormatError> {
            NodeId::try_from(child).map_err(|_| FormatError::InvalidNode {
                tree: tree_idx,
                node: node_idx,
                reason: format!("{side} child {child} is negative"),
            })
        };
        let left = to_child("left", node.left)?;
        let right = to_child("right", node.right)?;
        builder.add_split(node.split_index(), node.value, node.default_left(), left, right);
    }

    let size = record.param.size_leaf_vector;
    if size != 0 && !record.leaf_vector.is_empty() {
        if size > num_groups {
            return Err(FormatError::InvalidCount {
                what: "tree size_leaf_vector",
                value: size as i64,
            });
        }
        builder.leaf_vectors(size, record.leaf_vector.clone());
    }

    builder.build().map_err(|e| match e {
        TreeValidationError::LeafVectorLenMismatch { expected, actual } => {
            FormatError::LengthMismatch {
                what: "leaf vector",
                expected,
                actual,
            }
        }
        other => FormatError::InvalidNode {
            tree: tree_idx,
            node: other.node(),
            reason: other.to_string(),
        },
    })
}
