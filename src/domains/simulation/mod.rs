pub mod events;
pub mod ports;
pub mod selection;
pub mod types;

pub use events::*;
pub use ports::*;
pub use selection::*;
pub use types::*;
