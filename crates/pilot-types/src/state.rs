//! Execution lifecycle states for the wallet pilot.

use serde::{Deserialize, Serialize};

/// Lifecycle of one execution run.
///
/// Within a single run the progression is linear and forward-only:
/// `Draft → Planned → Approved → Executing`, then `Confirmed → Done` on
/// success or `Failed` at the first failed step. `Aborted` belongs to the
/// vocabulary for outer control surfaces (a user cancelling between plan
/// and approval); the engine itself never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
	Draft,
	Planned,
	Approved,
	Executing,
	Confirmed,
	Done,
	Failed,
	Aborted,
}

impl ExecutionState {
	/// Whether a transition from `self` to `to` is legal.
	///
	/// There is no transition back to an earlier state.
	pub fn can_transition(&self, to: ExecutionState) -> bool {
		use ExecutionState::*;

		matches!(
			(*self, to),
			(Draft, Planned)
				| (Planned, Approved)
				| (Planned, Aborted)
				| (Approved, Executing)
				| (Approved, Aborted)
				| (Executing, Confirmed)
				| (Executing, Failed)
				| (Confirmed, Done)
				| (Confirmed, Failed)
		)
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Done | Self::Failed | Self::Aborted)
	}
}

// Display agrees with the serialized form so logs and API payloads show
// the same token.
impl std::fmt::Display for ExecutionState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			Self::Draft => "DRAFT",
			Self::Planned => "PLANNED",
			Self::Approved => "APPROVED",
			Self::Executing => "EXECUTING",
			Self::Confirmed => "CONFIRMED",
			Self::Done => "DONE",
			Self::Failed => "FAILED",
			Self::Aborted => "ABORTED",
		};
		write!(f, "{}", s)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_happy_path_transitions() {
		use ExecutionState::*;
		let path = [Draft, Planned, Approved, Executing, Confirmed, Done];
		for pair in path.windows(2) {
			assert!(pair[0].can_transition(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
		}
	}

	#[test]
	fn test_no_backward_transitions() {
		use ExecutionState::*;
		assert!(!Executing.can_transition(Planned));
		assert!(!Done.can_transition(Executing));
		assert!(!Failed.can_transition(Executing));
	}

	#[test]
	fn test_engine_never_reaches_aborted_from_executing() {
		use ExecutionState::*;
		assert!(!Executing.can_transition(Aborted));
		assert!(Aborted.is_terminal());
	}

	#[test]
	fn test_serialized_form_is_upper_snake() {
		let json = serde_json::to_string(&ExecutionState::Executing).unwrap();
		assert_eq!(json, "\"EXECUTING\"");
	}
}
