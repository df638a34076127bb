pub mod error;
pub mod log;
pub mod sim_loop;
pub mod time;

pub use error::{Error, Result};
pub use sim_loop::{Pacing, SimLoop};
pub use time::{Cancel, Interval, Time};
