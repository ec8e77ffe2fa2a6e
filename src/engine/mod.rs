//! Synthesis engine abstraction and access control
//!
//! The engine itself is an external collaborator. What lives here is
//! the trait boundary, the serialized-access guard (the engine holds
//! large mutable state and is not safe for concurrent invocation), and
//! the managed-subprocess adapter.

pub mod guard;
pub mod subprocess;
pub mod traits;

pub use guard::EngineGuard;
pub use subprocess::SubprocessEngine;
pub use traits::{SynthesisEngine, SynthesisOutput};
