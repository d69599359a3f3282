//! Agent implementations.

pub mod model;
pub mod scripted;

pub use model::ModelAgent;
pub use scripted::ScriptedAgent;
