use crate::feature::FeatureContext;
use crate::state::FeatureStateManager;

/// Inputs passed to every expression evaluation.
///
/// All fields are references and must outlive the evaluation. `feature` is
/// absent for global evaluations such as background layers.
#[derive(Clone, Copy)]
pub struct EvaluationContext<'a> {
	pub zoom: f64,
	pub dp_factor: f64,
	pub feature: Option<&'a FeatureContext>,
	pub state: &'a FeatureStateManager,
}

impl<'a> EvaluationContext<'a> {
	pub fn new(
		zoom: f64,
		dp_factor: f64,
		feature: &'a FeatureContext,
		state: &'a FeatureStateManager,
	) -> EvaluationContext<'a> {
		EvaluationContext {
			zoom,
			dp_factor,
			feature: Some(feature),
			state,
		}
	}

	/// A context without a feature, for layer-global evaluations.
	pub fn global(zoom: f64, dp_factor: f64, state: &'a FeatureStateManager) -> EvaluationContext<'a> {
		EvaluationContext {
			zoom,
			dp_factor,
			feature: None,
			state,
		}
	}
}
