pub mod console;
pub mod intent;

pub use console::{Console, Reply, print_notifications, print_search_results};
pub use intent::Intent;
