// core.rs splits chain responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod search;
pub mod validation;

pub use chain::*;
pub use search::*;
pub use validation::*;
