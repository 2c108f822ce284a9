//! Reference number generation and validation.
//!
//! Every order is assigned a public reference number at creation time.
//! The reference is the identifier customers use to track, modify and
//! cancel an order; it is immutable and globally unique.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Prefix carried by every reference number.
const PREFIX: &str = "BT-";

/// Number of identifier characters following the prefix.
const BODY_LEN: usize = 8;

/// Error returned when a string is not a well-formed reference number.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Malformed reference number: {0}")]
pub struct InvalidReference(pub String);

/// Public, immutable identifier for an order and its tracking record.
///
/// Format is `BT-` followed by eight uppercase hex characters drawn from
/// a v4 UUID. Assigned exactly once, at order creation; a reorder mints a
/// fresh reference for the new order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceNumber(String);

impl ReferenceNumber {
	/// Generates a new reference number.
	pub fn generate() -> Self {
		let entropy = Uuid::new_v4().simple().to_string();
		Self(format!("{}{}", PREFIX, entropy[..BODY_LEN].to_uppercase()))
	}

	/// Returns the reference as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Checks whether `value` is a well-formed reference number.
	pub fn is_valid(value: &str) -> bool {
		value
			.strip_prefix(PREFIX)
			.is_some_and(|body| {
				body.len() == BODY_LEN
					&& body.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
			})
	}
}

impl fmt::Display for ReferenceNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for ReferenceNumber {
	type Err = InvalidReference;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if Self::is_valid(s) {
			Ok(Self(s.to_string()))
		} else {
			Err(InvalidReference(s.to_string()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn generated_references_match_format() {
		for _ in 0..100 {
			let reference = ReferenceNumber::generate();
			assert!(
				ReferenceNumber::is_valid(reference.as_str()),
				"bad format: {}",
				reference
			);
		}
	}

	#[test]
	fn generated_references_are_pairwise_unique() {
		let mut seen = HashSet::new();
		for _ in 0..10_000 {
			let reference = ReferenceNumber::generate();
			assert!(seen.insert(reference.as_str().to_string()), "collision: {}", reference);
		}
	}

	#[test]
	fn parse_rejects_malformed_input() {
		assert!("BT-1A2B3C4D".parse::<ReferenceNumber>().is_ok());
		assert!("bt-1a2b3c4d".parse::<ReferenceNumber>().is_err());
		assert!("BT-1A2B3C".parse::<ReferenceNumber>().is_err());
		assert!("XX-1A2B3C4D".parse::<ReferenceNumber>().is_err());
		assert!("BT-1A2B3C4D5".parse::<ReferenceNumber>().is_err());
	}
}
