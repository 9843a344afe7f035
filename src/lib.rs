pub mod config;
pub mod models;
pub mod seed;
pub mod stats;
pub mod store;
pub mod utils;
pub mod cli;
pub mod tui;

pub use config::Config;
pub use models::{Priority, Status, Ticket};
pub use store::{SqliteTicketStore, StoreError, TicketStore};
pub use utils::Profile;
