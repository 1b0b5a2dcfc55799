pub mod async_ops;
pub mod key;
pub mod message;

pub use async_ops::dispatch;
pub use key::handle_event;
pub use message::handle_tui_msg;
