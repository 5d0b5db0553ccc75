mod engine_event;
mod engine_worker;
mod media_engine;
mod rtc_engine;

pub use engine_event::*;
pub(crate) use engine_worker::*;
pub use media_engine::*;
pub use rtc_engine::*;
