pub mod dedup;
pub mod fanout;
pub mod matcher;
pub mod rotation;
pub mod selection;

pub use dedup::SentSignalCache;
pub use fanout::{ChannelBinding, DispatchFanout};
pub use rotation::ModeRotator;
pub use selection::SelectionEngine;
