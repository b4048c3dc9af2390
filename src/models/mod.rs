mod connection;
mod market;
mod message;

pub use connection::*;
pub use market::*;
pub use message::*;
