use serde::{Deserialize, Serialize};

use crate::graph::{GraphError, GraphResult};

/// Force simulation tuning. Any field missing from JSON keeps its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Gap kept between node rims.
	pub collision_padding: f64,
	/// Pull toward the node's layer band.
	pub layer_strength: f64,
	/// Pull toward the horizontal midpoint.
	pub center_x_strength: f64,
	/// Share of the distance to the alpha target closed per tick.
	pub alpha_decay: f64,
	/// The simulation stops once alpha drops below this.
	pub alpha_min: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Link length for edge kinds without their own.
	pub default_link_distance: f64,
	/// Alpha a reheat restarts from.
	pub reheat_alpha: f64,
	/// Alpha target held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Seed for placement jitter. Same seed, same layout.
	pub seed: u64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			charge_strength: -150.0,
			collision_padding: 4.0,
			layer_strength: 0.12,
			center_x_strength: 0.05,
			alpha_decay: 0.015,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			default_link_distance: 80.0,
			reheat_alpha: 0.8,
			drag_alpha_target: 0.3,
			seed: 0x5eed,
		}
	}
}

impl LayoutConfig {
	/// Parses and validates. Missing fields take their defaults.
	pub fn from_json(json: &str) -> GraphResult<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects values under which alpha never reaches `alpha_min`.
	pub fn validate(&self) -> GraphResult<()> {
		if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
			return invalid(format!("alphaDecay must be in (0, 1), got {}", self.alpha_decay));
		}
		if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
			return invalid(format!("alphaMin must be in (0, 1), got {}", self.alpha_min));
		}
		if !(0.0..=1.0).contains(&self.velocity_decay) {
			return invalid(format!("velocityDecay must be in [0, 1], got {}", self.velocity_decay));
		}
		if !(0.0..=1.0).contains(&self.reheat_alpha) || !(0.0..1.0).contains(&self.drag_alpha_target) {
			return invalid(format!(
				"reheatAlpha must be in [0, 1] and dragAlphaTarget in [0, 1), got {} and {}",
				self.reheat_alpha, self.drag_alpha_target
			));
		}
		Ok(())
	}
}

fn invalid(message: String) -> GraphResult<()> {
	Err(GraphError::InvalidConfig(message))
}

/// Pointer, zoom and search tuning. Missing JSON fields keep defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
	/// Quiet time before a query is applied.
	pub search_debounce_ms: f64,
	/// Smallest scale.
	pub min_zoom: f64,
	/// Largest scale.
	pub max_zoom: f64,
	/// Length of the reset-view animation.
	pub reset_duration_ms: f64,
	/// Opacity of nodes outside the highlight or search.
	pub dim_node_opacity: f64,
	/// Opacity of edges outside the highlight or search.
	pub dim_edge_opacity: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			search_debounce_ms: 300.0,
			min_zoom: 0.1,
			max_zoom: 5.0,
			reset_duration_ms: 500.0,
			dim_node_opacity: 0.08,
			dim_edge_opacity: 0.03,
		}
	}
}

impl InteractionConfig {
	/// Parses and validates. Missing fields take their defaults.
	pub fn from_json(json: &str) -> GraphResult<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Rejects an empty or inverted zoom range and negative durations.
	pub fn validate(&self) -> GraphResult<()> {
		if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom && self.max_zoom.is_finite()) {
			return invalid(format!(
				"zoom range must satisfy 0 < minZoom <= maxZoom, got {}..{}",
				self.min_zoom, self.max_zoom
			));
		}
		if !(self.search_debounce_ms >= 0.0 && self.reset_duration_ms >= 0.0) {
			return invalid(format!(
				"durations must be non-negative, got searchDebounceMs {} and resetDurationMs {}",
				self.search_debounce_ms, self.reset_duration_ms
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::GraphError;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = LayoutConfig::from_json(r#"{"chargeStrength": -300, "seed": 7}"#).unwrap();
		assert_eq!(config.charge_strength, -300.0);
		assert_eq!(config.seed, 7);
		assert_eq!(config.alpha_decay, LayoutConfig::default().alpha_decay);

		let config = InteractionConfig::from_json("{}").unwrap();
		assert_eq!(config, InteractionConfig::default());
	}

	#[test]
	fn malformed_json_is_a_config_error() {
		let err = LayoutConfig::from_json("{\"alphaDecay\": \"fast\"}").unwrap_err();
		assert!(matches!(err, GraphError::Config(_)));
	}

	#[test]
	fn inverted_zoom_range_is_rejected() {
		for json in [r#"{"minZoom": 10}"#, r#"{"minZoom": 0}"#, r#"{"minZoom": -1, "maxZoom": -0.5}"#] {
			let err = InteractionConfig::from_json(json).unwrap_err();
			assert!(matches!(err, GraphError::InvalidConfig(_)), "{json}");
		}
		assert!(InteractionConfig::from_json(r#"{"minZoom": 2, "maxZoom": 2}"#).is_ok());
	}

	#[test]
	fn negative_durations_are_rejected() {
		let err = InteractionConfig::from_json(r#"{"resetDurationMs": -1}"#).unwrap_err();
		assert!(matches!(err, GraphError::InvalidConfig(_)));
	}

	#[test]
	fn non_decaying_alpha_is_rejected() {
		for json in [
			r#"{"alphaDecay": 0}"#,
			r#"{"alphaDecay": 1}"#,
			r#"{"alphaMin": 0}"#,
			r#"{"velocityDecay": 1.5}"#,
			r#"{"velocityDecay": -0.1}"#,
			r#"{"dragAlphaTarget": 1}"#,
		] {
			let err = LayoutConfig::from_json(json).unwrap_err();
			assert!(matches!(err, GraphError::InvalidConfig(_)), "{json}");
		}
		assert!(LayoutConfig::from_json(r#"{"velocityDecay": 0}"#).is_ok());
	}

	#[test]
	fn defaults_are_valid() {
		assert!(LayoutConfig::default().validate().is_ok());
		assert!(InteractionConfig::default().validate().is_ok());
	}
}
