//! Measurement stream payloads.

use serde::{Deserialize, Serialize};

/// Quality flag attached to every individual result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultQuality {
	Valid,
	NotValid,
}

/// One numeric result inside a measurement result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalResult {
	pub parameter: String,
	pub value: f64,
	pub quality: ResultQuality,
}

impl ClinicalResult {
	pub fn valid(parameter: impl Into<String>, value: f64) -> Self {
		Self {
			parameter: parameter.into(),
			value,
			quality: ResultQuality::Valid,
		}
	}

	pub fn not_valid(parameter: impl Into<String>, value: f64) -> Self {
		Self {
			parameter: parameter.into(),
			value,
			quality: ResultQuality::NotValid,
		}
	}

	pub fn is_valid(&self) -> bool {
		self.quality == ResultQuality::Valid
	}
}

/// Results delivered by one `MeasurementArrived` event, in device order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
	pub results: Vec<ClinicalResult>,
}

impl ResultSet {
	pub fn new(results: Vec<ClinicalResult>) -> Self {
		Self { results }
	}

	/// Iterates the results not flagged as not-valid.
	pub fn valid(&self) -> impl Iterator<Item = &ClinicalResult> {
		self.results.iter().filter(|r| r.is_valid())
	}
}

/// Streaming status reported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementsStatus {
	Started,
	Stopped,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn valid_skips_not_valid_entries() {
		let set = ResultSet::new(vec![
			ClinicalResult::valid("pulse", 5.1),
			ClinicalResult::not_valid("pressure", f64::NAN),
			ClinicalResult::valid("spo2", 7.2),
		]);
		let values: Vec<f64> = set.valid().map(|r| r.value).collect();
		assert_eq!(values, vec![5.1, 7.2]);
	}

	#[test]
	fn quality_deserializes_snake_case() {
		let result: ClinicalResult = serde_json::from_str(r#"{"parameter":"pulse","value":61.0,"quality":"not_valid"}"#).unwrap();
		assert_eq!(result.quality, ResultQuality::NotValid);
	}
}
