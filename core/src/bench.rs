pub mod abort;
pub mod artifact;
pub mod coordinator;
pub mod executor;
pub mod language;
pub mod outcome;
pub mod process;
pub mod samples;
pub mod stats;
pub mod table;
pub mod testcase;

pub use abort::*;
pub use coordinator::*;
pub use executor::*;
pub use language::*;
pub use outcome::*;
pub use process::*;
pub use samples::*;
pub use stats::SummaryStat;
pub use table::*;
pub use testcase::*;
