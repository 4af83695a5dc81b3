pub mod dispatcher;
pub mod threshold;

pub use dispatcher::{AlertDispatcher, DispatchError, DispatchOutcome, ThresholdAlert};
pub use threshold::{evaluate, Breach, ThresholdKind};
