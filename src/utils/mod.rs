//! Utility modules supporting lookups.
//!
//! - [`to_portable_markup`]: convert VNDB description markup to markdown
//!
//! ```rust
//! use vndb_lookup::utils::to_portable_markup;
//!
//! let text = to_portable_markup("[spoiler]twist[/spoiler]");
//! assert_eq!(text, "||twist||");
//! ```

mod markup;

pub use markup::{
    absolutize_character_links, convert_spoilers, convert_url_tags, strip_stray_spoiler_tags,
    to_portable_markup,
};
