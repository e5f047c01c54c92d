pub mod repl;
pub mod setup;
pub mod single_shot;

pub use repl::run_repl_mode;
pub use setup::{setup_from_cli, AppContext};
pub use single_shot::run_single_shot;
