pub mod connector;
pub mod console_logger;
pub mod dreamview_client;
pub mod file_logger;
pub mod json_socket;
pub mod multi_logger;
pub mod noop_logger;
pub mod simulator_client;

pub use connector::*;
pub use console_logger::*;
pub use dreamview_client::*;
pub use file_logger::*;
pub use json_socket::*;
pub use multi_logger::*;
pub use noop_logger::*;
pub use simulator_client::*;
