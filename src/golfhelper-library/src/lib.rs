//! golfhelper-library - On-disk layout for Golfhelper
//!
//! Finds source videos and decides where converted clips are filed.

mod club;
mod error;
mod layout;
mod source;

pub use club::{Club, ClubCategory, SUPPORTED_CLUBS};
pub use error::{LibraryError, Result};
pub use layout::*;
pub use source::*;
