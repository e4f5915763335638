// detailed implementation
pub mod algorithms;
pub mod config;
pub mod environments;
pub mod error;
pub mod evaluation;
pub mod networks;
pub mod replay_buffer;
pub mod target;
pub mod utils;

// Traits
pub mod agent;
pub mod environment;
pub mod policy;

pub use agent::{Agent, TrainReport};
pub use algorithms::{ActorCriticAgent, Variant};
pub use config::{AgentConfig, DeviceChoice, TrainParams};
pub use error::{Result, RlError};
pub use policy::Policy;
pub use replay_buffer::{Batch, ReplayBuffer, ReplaySource, Transition};
