mod session_manager;

pub use session_manager::*;
