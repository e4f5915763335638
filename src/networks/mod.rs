pub mod actor;
pub mod critic;
pub mod mlp;

pub use actor::PolicyNetwork;
pub use critic::{QEstimate, ValueNetwork};
