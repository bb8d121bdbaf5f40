pub mod browser;
pub mod catalog;
pub mod coordinator;
pub mod droid;
pub mod harvester;
pub mod interaction;
pub mod selection;
pub mod sink;

#[cfg(test)]
pub mod fake;

pub use browser::*;
pub use catalog::*;
pub use coordinator::*;
pub use droid::*;
pub use harvester::*;
pub use interaction::*;
pub use selection::*;
pub use sink::*;
