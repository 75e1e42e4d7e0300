pub mod client;
pub mod config;
pub mod default_colors;
pub mod error;
pub mod librarian;
pub mod lookup;
pub mod session;
pub mod shelf;
pub mod traits;
pub mod types;

pub use client::{ClientSettings, MilibroClient};
pub use error::{Error, Result};
pub use librarian::Librarian;
