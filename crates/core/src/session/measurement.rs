use std::fmt;

use dsc_protocol::ResultSet;
use serde::Serialize;

/// One numbered measurement as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasurementRecord {
	pub seq: u64,
	/// Valid result values in device order, joined by `", "`.
	pub values: String,
}

impl MeasurementRecord {
	pub fn new(seq: u64, results: &ResultSet) -> Self {
		Self {
			seq,
			values: join_valid(results),
		}
	}
}

impl fmt::Display for MeasurementRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Measurement #:{} : {}", self.seq, self.values)
	}
}

fn join_valid(results: &ResultSet) -> String {
	results.valid().map(|r| r.value.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
	use dsc_protocol::ClinicalResult;

	use super::*;

	#[test]
	fn not_valid_entries_are_dropped() {
		let set = ResultSet::new(vec![
			ClinicalResult::valid("pulse_rate", 5.1),
			ClinicalResult::not_valid("perfusion_index", f64::NAN),
			ClinicalResult::valid("spo2", 7.2),
		]);
		let record = MeasurementRecord::new(1, &set);
		assert_eq!(record.values, "5.1, 7.2");
		assert_eq!(record.to_string(), "Measurement #:1 : 5.1, 7.2");
	}

	#[test]
	fn empty_when_nothing_is_valid() {
		let set = ResultSet::new(vec![ClinicalResult::not_valid("spo2", 0.0)]);
		assert_eq!(MeasurementRecord::new(7, &set).values, "");
	}
}
