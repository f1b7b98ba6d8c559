pub mod kind;
pub mod watch_event;

pub use kind::WatchKind;
pub use watch_event::WatchEvent;
