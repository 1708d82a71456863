pub extern crate chrono;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;

mod chat;
mod clock;
mod error;
mod event_log;
mod message;
mod session;
mod sync;
mod token;
mod types;
mod whiteboard;

pub use chat::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::*;
pub use event_log::*;
pub use message::*;
pub use session::*;
pub use sync::*;
pub use token::*;
pub use types::*;
pub use whiteboard::*;
