pub mod event;
mod source;

pub use event::{code_name, Record, INPUT_EVENT_SIZE_32, INPUT_EVENT_SIZE_64};
pub use source::{find_device_by_name, EventSource, EvdevSource, Poll, ReplaySource};
