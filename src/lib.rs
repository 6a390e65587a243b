pub mod cli;
pub mod dataset;
pub mod device;
pub mod error;
pub mod explorer;
pub mod gesture;
pub mod hierarchy;
pub mod oracle;
pub mod screen;
pub mod state;
pub mod trace;

pub use error::ProbeError;
