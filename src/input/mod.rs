pub mod calibration;
pub mod dispatch;
pub mod event;
pub mod gesture;
pub mod keys;
pub mod queue;
pub mod registrar;
pub mod router;
pub mod touch;

pub use dispatch::Dispatcher;
pub use keys::{KeyHub, WaitOutcome, WaitPolicy};
pub use queue::QueuedKey;
pub use router::{InputRouter, RouterSettings};
