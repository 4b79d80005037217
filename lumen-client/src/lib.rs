mod capture;
mod error;
mod link;
mod observer;
mod session;
mod signaling;
mod transport;

pub use capture::*;
pub use error::*;
pub use link::*;
pub use observer::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
