pub mod actor_critic;
pub mod variant;

pub use actor_critic::{ActorCriticAgent, artifact_name, artifact_paths};
pub use variant::Variant;
