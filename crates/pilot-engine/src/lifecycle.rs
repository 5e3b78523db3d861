//! Run lifecycle tracking.

use crate::EngineError;
use pilot_types::ExecutionState;
use tracing::info;

/// Tracks the state of one execution run and enforces legal transitions.
///
/// Owned by a single `execute` call; concurrent runs never share one.
pub struct RunLifecycle {
	state: ExecutionState,
}

impl RunLifecycle {
	pub fn new() -> Self {
		Self {
			state: ExecutionState::Draft,
		}
	}

	pub fn state(&self) -> ExecutionState {
		self.state
	}

	/// Moves to `next`, refusing transitions the state table does not allow.
	pub fn advance(&mut self, next: ExecutionState) -> Result<(), EngineError> {
		if !self.state.can_transition(next) {
			return Err(EngineError::InvalidTransition {
				from: self.state,
				to: next,
			});
		}
		info!("Execution state changed: {} -> {}", self.state, next);
		self.state = next;
		Ok(())
	}
}

impl Default for RunLifecycle {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pilot_types::ExecutionState::*;

	#[test]
	fn test_happy_path_advances() {
		let mut run = RunLifecycle::new();
		assert_eq!(run.state(), Draft);
		for next in [Planned, Approved, Executing, Confirmed, Done] {
			run.advance(next).unwrap();
		}
		assert_eq!(run.state(), Done);
	}

	#[test]
	fn test_illegal_advance_is_refused_and_state_kept() {
		let mut run = RunLifecycle::new();
		run.advance(Planned).unwrap();

		let err = run.advance(Done).unwrap_err();
		assert!(matches!(err, EngineError::InvalidTransition { .. }));
		assert_eq!(run.state(), Planned);
	}

	#[test]
	fn test_failure_path_from_executing() {
		let mut run = RunLifecycle::new();
		for next in [Planned, Approved, Executing, Failed] {
			run.advance(next).unwrap();
		}
		assert!(run.state().is_terminal());
	}
}
