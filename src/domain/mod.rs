pub mod event;
pub mod region;

pub use event::*;
pub use region::*;
