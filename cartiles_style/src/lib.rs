//! The style layer of cartiles: the dynamically-typed value model, the
//! expression IR with its parser, the memoising evaluators and the per-layer
//! style bundles built from Mapbox-style documents.

pub mod context;
pub mod eval;
pub mod expr;
pub mod feature;
pub mod state;
pub mod style;
pub mod used_keys;
pub mod variant;

pub use context::EvaluationContext;
pub use eval::{EvaluationResult, FeatureValueEvaluator, ReevaluationPolicy, ValueEvaluator};
pub use expr::{CompareOp, Expr, ExprArena, ExprHandle, LogOp, MathOp, NodeId};
pub use feature::{FeatureContext, FeatureInfo, GeomType};
pub use state::FeatureStateManager;
pub use style::document::{SourceDescription, SourceType, StyleDocument, Transition, parse_style_document};
pub use style::{LayerCommon, LayerDescription, LayerStyle};
pub use used_keys::UsedKeys;
pub use variant::{FormattedEntry, ValueVariant};
