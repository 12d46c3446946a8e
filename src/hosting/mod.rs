mod connection;
mod peer;
mod server;
mod transport;

pub use connection::*;
pub use peer::*;
pub use server::*;
pub use transport::*;
