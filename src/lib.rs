pub mod conn;
pub mod directory;
pub mod handoff;
pub mod protocol;
pub mod server;
pub mod session;
