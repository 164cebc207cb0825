//! CLI-facing operations. Each resolves a [`Config`] and prints its result.

mod audit;
mod caveats;
pub mod config;
mod install;
mod list;
mod show;
mod smoke;
mod uninstall;

pub use audit::audit;
pub use caveats::caveats;
pub use config::Config;
pub use install::{install, run, run_until};
pub use list::list;
pub use show::show;
pub use smoke::test;
pub use uninstall::uninstall;
