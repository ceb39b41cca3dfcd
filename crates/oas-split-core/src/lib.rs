pub mod casing;
pub mod config;
pub mod document;
pub mod emit;
pub mod error;
pub mod helper;
pub mod resolve;
pub mod split;
pub mod toc;

pub use error::SplitError;
pub use helper::RestFileInfo;
pub use split::{FileNameInfo, SplitFile};
pub use toc::{SplitReport, TocSynthesizer};
