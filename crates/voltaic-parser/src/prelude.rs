pub use crate::error::Error;
pub type Result<T> = core::result::Result<T, Error>;

pub use crate::netlist::{parse_netlist, parse_netlist_file, ParsedNetlist};
pub use crate::directives::{AnalysisDirective, TranDirective};
