pub mod config;
pub mod session;

pub use config::KeyScheduleConfig;
pub use session::{Error, KeyGrid, Role, SessionKeys, Slot};
