pub mod header;
pub mod utils;

pub use header::{banner, prompt};
pub use utils::{format_timestamp, status_color, truncate, user_color};
