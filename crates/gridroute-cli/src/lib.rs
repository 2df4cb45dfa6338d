pub mod config;
pub mod loader;
pub mod trace;

pub use config::{Config, LogFormat};
pub use loader::{load_input, Input, LoadError};
pub use trace::{Manifest, ScratchTrace};
