//! The core trait for business logic.
//!
//! Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
//! They update state in place and describe side effects without running them.

use crate::effect::Effect;
use smallvec::SmallVec;

/// Effects returned from one `reduce` call; most actions produce at most a few.
pub type Effects = SmallVec<[Effect; 4]>;

/// The Reducer trait - core abstraction for business logic
///
/// # Type Parameters
///
/// - `State`: The domain state this reducer operates on
/// - `Action`: The action type this reducer processes
/// - `Environment`: The injected dependencies this reducer needs
///
/// # Example
///
/// ```ignore
/// impl Reducer for SeatMapReducer {
///     type State = SeatMapState;
///     type Action = SeatMapAction;
///     type Environment = SeatMapEnvironment;
///
///     fn reduce(&self, state: &mut SeatMapState, action: SeatMapAction, env: &SeatMapEnvironment) -> Effects {
///         match action {
///             SeatMapAction::ZoomIn => smallvec![Effect::Render],
///             _ => smallvec![],
///         }
///     }
/// }
/// ```
pub trait Reducer {
    /// The state type this reducer operates on
    type State;

    /// The action type this reducer processes
    type Action;

    /// The environment type with injected dependencies
    type Environment;

    /// Reduce an action into state changes and effects
    ///
    /// This is a pure function that:
    /// 1. Validates the action
    /// 2. Updates state in place
    /// 3. Returns effect descriptions to be executed
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects;
}
