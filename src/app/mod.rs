pub mod report;
pub mod shell;

pub use shell::Shell;
