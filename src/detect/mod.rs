//! Static issue detection for Python source.

mod imports;
mod practices;
mod runner;
mod types;

pub use imports::detect_unused_imports;
pub use practices::{detect_bare_excepts, detect_mutable_defaults};
pub use runner::{detect_issues, Detector};
pub use types::{Category, Issue, Severity};
