//! Reading and writing project files.
//!
//! The engine never touches the filesystem; everything it consumes is loaded
//! here and everything it produces is saved here.

pub mod directory;
pub mod requirements;
pub mod test_cases;

pub use directory::{CONFIG_FILE, Paths, clear_directory};
