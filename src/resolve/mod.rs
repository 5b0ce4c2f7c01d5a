pub mod engine;
pub mod exceptions;
pub mod suggest;

pub use engine::{BranchResolution, Resolver, BRANCH_NOT_FOUND};
pub use exceptions::{ExceptionEntry, ExceptionTable};
pub use suggest::{suggest, SuggestionWeights};
