//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, GenerationArgs};
pub use presentation::{
    format_package_json, format_package_text, format_result_json, format_result_text,
};
pub use route::RunContext;
