pub mod aggregate;
pub mod collector;
pub mod process;
pub mod snapshot;
