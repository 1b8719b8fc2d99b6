pub mod candidates;
pub mod fetch_key;
pub mod generate;
pub mod utils;

pub use candidates::handle_candidates;
pub use fetch_key::handle_fetch_key;
pub use generate::{handle_generate, render_artifacts, write_artifacts};
pub use utils::connect_directory;
