pub use self::{amount::*, config::*, stats::*, transaction::*};

pub mod amount;
pub mod config;
pub mod constants;
mod stats;
pub mod transaction;
