//! # vndb-lookup
//!
//! Read-only client for VNDB character data.
//!
//! ## Architecture
//!
//! - [`models`]: Filter expressions, query envelopes and character records
//! - [`sources`]: The [`Transport`](sources::Transport) seam and the VNDB client
//! - [`utils`]: Markup conversion
//! - [`config`]: Configuration management
//!
//! ```rust,no_run
//! use vndb_lookup::{config::Config, VndbClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = VndbClient::from_config(&Config::default())?;
//! let rei = client.character_by_fuzzy("rei").await?;
//! println!("{} voiced by {:?}", rei.name, rei.voice_actors);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::CharacterRecord;
pub use sources::{RoleGroup, SourceError, Transport, VndbClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
