// alias-cli/src/commands/mod.rs
pub mod aliases;
pub mod setup;

pub use aliases::{delete_alias, list_aliases, set_alias_state};
pub use setup::run_setup;
