//! Record-level decoding of the legacy binary layout.
//!
//! ```text
//! ["binf"]                      optional magic
//! LearnerModelParam             136 bytes
//! objective name                u64 length + bytes
//! booster name                  u64 length + bytes
//! booster payload               gbtree | dart | gblinear
//! [attributes]                  if contain_extra_attrs
//! [max_delta_step]              if count:poisson
//! [eval metrics]                if contain_eval_metrics
//! ```
//!
//! Records here mirror the file one-to-one; turning them into a
//! [`Model`](crate::Model) happens in `convert`.
//!
//! Only the optional `binf` magic is recognised in front of the learner
//! header. Streams wrapped by other bindings (for example the xgboost4j-spark
//! prefix `00 05 5f` followed by `cls`/`reg` parameters) do not load.

use tracing::{debug, trace};

use super::reader::ByteReader;
use crate::error::FormatError;

/// Magic prefix written by some toolkit versions.
pub const MAGIC: &[u8; 4] = b"binf";

/// Newest toolkit major version whose binary layout is understood.
pub const MAX_SUPPORTED_MAJOR_VERSION: u32 = 2;

/// Size of one node record.
const NODE_SIZE: usize = 20;

/// Size of one node statistics record (skipped).
const NODE_STAT_SIZE: usize = 16;

/// Largest accepted `num_output_group`; every prediction allocates one
/// accumulator per group.
pub const MAX_OUTPUT_GROUPS: usize = 1 << 16;

fn count(value: i64, what: &'static str) -> Result<usize, FormatError> {
    usize::try_from(value).map_err(|_| FormatError::InvalidCount { what, value })
}

/// Booster group count, which must be in `1..=MAX_OUTPUT_GROUPS` and agree
/// with the learner's `max(num_class, 1)`.
fn output_groups(value: i32, learner: &LearnerParam) -> Result<usize, FormatError> {
    let invalid = || FormatError::InvalidCount {
        what: "num_output_group",
        value: value.into(),
    };
    let groups = usize::try_from(value).map_err(|_| invalid())?;
    if groups == 0 || groups > MAX_OUTPUT_GROUPS {
        return Err(invalid());
    }
    if i64::from(value) != i64::from(learner.num_class.max(1)) {
        return Err(invalid());
    }
    Ok(groups)
}

// =============================================================================
// Learner
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LearnerParam {
    pub base_score: f32,
    pub num_feature: u32,
    pub num_class: i32,
    pub contain_extra_attrs: bool,
    pub contain_eval_metrics: bool,
    pub major_version: u32,
    pub minor_version: u32,
}

impl LearnerParam {
    pub const SIZE: usize = 136;

    fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        const WHAT: &str = "learner header";
        r.require(Self::SIZE, WHAT)?;
        let param = Self {
            base_score: r.read_f32(WHAT)?,
            num_feature: r.read_u32(WHAT)?,
            num_class: r.read_i32(WHAT)?,
            contain_extra_attrs: r.read_i32(WHAT)? != 0,
            contain_eval_metrics: r.read_i32(WHAT)? != 0,
            major_version: r.read_u32(WHAT)?,
            minor_version: r.read_u32(WHAT)?,
        };
        r.skip(27 * 4, WHAT)?;
        Ok(param)
    }
}

// =============================================================================
// GBTree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GBTreeParam {
    pub num_trees: usize,
    pub num_feature: i32,
    pub num_pbuffer: usize,
    pub num_output_group: usize,
    pub size_leaf_vector: usize,
}

impl GBTreeParam {
    pub const SIZE: usize = 160;

    fn read(r: &mut ByteReader<'_>, learner: &LearnerParam) -> Result<Self, FormatError> {
        const WHAT: &str = "gbtree header";
        r.require(Self::SIZE, WHAT)?;
        let num_trees = r.read_i32(WHAT)?;
        let _num_roots = r.read_i32(WHAT)?;
        let num_feature = r.read_i32(WHAT)?;
        let _pad = r.read_i32(WHAT)?;
        let num_pbuffer = r.read_i64(WHAT)?;
        let num_output_group = r.read_i32(WHAT)?;
        let size_leaf_vector = r.read_i32(WHAT)?;
        r.skip(32 * 4, WHAT)?;

        Ok(Self {
            num_trees: count(num_trees.into(), "num_trees")?,
            num_feature,
            num_pbuffer: count(num_pbuffer, "num_pbuffer")?,
            num_output_group: output_groups(num_output_group, learner)?,
            size_leaf_vector: count(size_leaf_vector.into(), "size_leaf_vector")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TreeParam {
    pub num_nodes: usize,
    pub num_deleted: i32,
    pub max_depth: i32,
    pub size_leaf_vector: usize,
}

impl TreeParam {
    pub const SIZE: usize = 148;

    fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        const WHAT: &str = "tree header";
        r.require(Self::SIZE, WHAT)?;
        let _num_roots = r.read_i32(WHAT)?;
        let num_nodes = r.read_i32(WHAT)?;
        let num_deleted = r.read_i32(WHAT)?;
        let max_depth = r.read_i32(WHAT)?;
        let _num_feature = r.read_i32(WHAT)?;
        let size_leaf_vector = r.read_i32(WHAT)?;
        r.skip(31 * 4, WHAT)?;
        Ok(Self {
            num_nodes: count(num_nodes.into(), "num_nodes")?,
            num_deleted,
            max_depth,
            size_leaf_vector: count(size_leaf_vector.into(), "tree size_leaf_vector")?,
        })
    }
}

/// One node as stored. `left == -1` marks a leaf; for leaves `value` is the
/// leaf value, otherwise the split threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NodeRecord {
    pub left: i32,
    pub right: i32,
    pub sindex: u32,
    pub value: f32,
}

impl NodeRecord {
    const DEFAULT_LEFT_BIT: u32 = 1 << 31;

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left == -1
    }

    #[inline]
    pub fn split_index(&self) -> u32 {
        self.sindex & !Self::DEFAULT_LEFT_BIT
    }

    #[inline]
    pub fn default_left(&self) -> bool {
        self.sindex & Self::DEFAULT_LEFT_BIT != 0
    }

    fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        const WHAT: &str = "tree node";
        let _parent = r.read_i32(WHAT)?;
        Ok(Self {
            left: r.read_i32(WHAT)?,
            right: r.read_i32(WHAT)?,
            sindex: r.read_u32(WHAT)?,
            value: r.read_f32(WHAT)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TreeRecord {
    pub param: TreeParam,
    pub nodes: Vec<NodeRecord>,
    /// Node-major, `size_leaf_vector` components per node; may be empty.
    pub leaf_vector: Vec<f32>,
}

impl TreeRecord {
    fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let param = TreeParam::read(r)?;
        let node_bytes = param
            .num_nodes
            .checked_mul(NODE_SIZE + NODE_STAT_SIZE)
            .ok_or(FormatError::Truncated { what: "tree node" })?;
        r.require(node_bytes, "tree node")?;

        let nodes = (0..param.num_nodes)
            .map(|_| NodeRecord::read(r))
            .collect::<Result<Vec<_>, _>>()?;
        r.skip(param.num_nodes * NODE_STAT_SIZE, "node stats")?;

        let leaf_vector = if param.size_leaf_vector != 0 {
            r.read_f32_vec("leaf vector")?
        } else {
            Vec::new()
        };
        Ok(Self {
            param,
            nodes,
            leaf_vector,
        })
    }
}

// =============================================================================
// GBLinear
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GBLinearParam {
    pub num_feature: usize,
    pub num_output_group: usize,
}

impl GBLinearParam {
    pub const SIZE: usize = 136;

    fn read(r: &mut ByteReader<'_>, learner: &LearnerParam) -> Result<Self, FormatError> {
        const WHAT: &str = "gblinear header";
        r.require(Self::SIZE, WHAT)?;
        let num_feature = r.read_u32(WHAT)?;
        let num_output_group = r.read_i32(WHAT)?;
        r.skip(32 * 4, WHAT)?;
        Ok(Self {
            num_feature: num_feature as usize,
            num_output_group: output_groups(num_output_group, learner)?,
        })
    }
}

// =============================================================================
// Whole model
// =============================================================================

/// Which booster payload follows the booster name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoosterName {
    GbTree,
    Dart,
    GbLinear,
}

impl BoosterName {
    fn parse(name: &str) -> Result<Self, FormatError> {
        match name {
            "gbtree" => Ok(Self::GbTree),
            "dart" => Ok(Self::Dart),
            "gblinear" => Ok(Self::GbLinear),
            other => Err(FormatError::UnknownBooster(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BoosterRecord {
    Trees {
        dart: bool,
        param: GBTreeParam,
        trees: Vec<TreeRecord>,
        tree_info: Vec<i32>,
        weight_drop: Option<Vec<f32>>,
    },
    Linear {
        param: GBLinearParam,
        weights: Vec<f32>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelRecord {
    pub learner: LearnerParam,
    pub objective: String,
    pub booster: BoosterRecord,
    pub attributes: Vec<(String, String)>,
    pub max_delta_step: Option<String>,
    pub eval_metrics: Vec<String>,
    /// Bytes left unread after the last recognised section.
    pub trailing: usize,
}

impl ModelRecord {
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self, FormatError> {
        let has_magic = r.eat_prefix(MAGIC);
        let learner = LearnerParam::read(r)?;
        if learner.major_version > MAX_SUPPORTED_MAJOR_VERSION {
            return Err(FormatError::UnsupportedVersion {
                major: learner.major_version,
                minor: learner.minor_version,
            });
        }

        let objective = r.read_string("objective name")?;
        let booster_name = r.read_string("booster name")?;
        let kind = BoosterName::parse(&booster_name)?;
        debug!(
            has_magic,
            major_version = learner.major_version,
            minor_version = learner.minor_version,
            objective = %objective,
            booster = %booster_name,
            num_feature = learner.num_feature,
            base_score = learner.base_score,
            "read learner header"
        );

        let booster = match kind {
            BoosterName::GbTree | BoosterName::Dart => {
                read_tree_booster(r, &learner, kind == BoosterName::Dart)?
            }
            BoosterName::GbLinear => {
                let param = GBLinearParam::read(r, &learner)?;
                let weights = r.read_f32_vec("linear weights")?;
                BoosterRecord::Linear { param, weights }
            }
        };

        // Each trailer section is optional at end of input.
        let mut attributes = Vec::new();
        let mut max_delta_step = None;
        let mut eval_metrics = Vec::new();
        if learner.contain_extra_attrs && !r.is_empty() {
            attributes = r.read_string_pairs("attributes")?;
        }
        if objective == "count:poisson" && !r.is_empty() {
            max_delta_step = Some(r.read_string("max_delta_step")?);
        }
        if learner.contain_eval_metrics && !r.is_empty() {
            eval_metrics = r.read_string_vec("eval metrics")?;
        }

        Ok(Self {
            learner,
            objective,
            booster,
            attributes,
            max_delta_step,
            eval_metrics,
            trailing: r.remaining(),
        })
    }
}

fn read_tree_booster(
    r: &mut ByteReader<'_>,
    learner: &LearnerParam,
    dart: bool,
) -> Result<BoosterRecord, FormatError> {
    let param = GBTreeParam::read(r, learner)?;
    debug!(
        num_trees = param.num_trees,
        num_output_group = param.num_output_group,
        size_leaf_vector = param.size_leaf_vector,
        num_pbuffer = param.num_pbuffer,
        "read gbtree header"
    );

    // Every tree needs at least its header.
    let min_bytes = param
        .num_trees
        .checked_mul(TreeParam::SIZE)
        .ok_or(FormatError::Truncated { what: "trees" })?;
    r.require(min_bytes, "trees")?;

    let mut trees = Vec::with_capacity(param.num_trees);
    for idx in 0..param.num_trees {
        let tree = TreeRecord::read(r)?;
        trace!(
            tree = idx,
            num_nodes = tree.param.num_nodes,
            num_deleted = tree.param.num_deleted,
            max_depth = tree.param.max_depth,
            "read tree"
        );
        trees.push(tree);
    }

    let mut tree_info = Vec::with_capacity(param.num_trees);
    for _ in 0..param.num_trees {
        tree_info.push(r.read_i32("tree_info")?);
    }

    if param.num_pbuffer != 0 && learner.contain_extra_attrs {
        let floats = param
            .num_output_group
            .checked_mul(param.num_pbuffer)
            .and_then(|n| n.checked_mul(param.size_leaf_vector + 1))
            .and_then(|n| n.checked_mul(2 * 4))
            .ok_or(FormatError::InvalidCount {
                what: "num_pbuffer",
                value: param.num_pbuffer as i64,
            })?;
        r.skip(floats, "prediction buffer")?;
    }

    let weight_drop = if dart && param.num_trees > 0 {
        Some(r.read_f32_vec("weight_drop")?)
    } else {
        None
    };

    Ok(BoosterRecord::Trees {
        dart,
        param,
        trees,
        tree_info,
        weight_drop,
    })
}
