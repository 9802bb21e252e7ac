pub mod handlers;
pub mod response;
pub mod server;
pub mod shutdown;
