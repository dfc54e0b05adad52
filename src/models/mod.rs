pub mod year;
pub mod structure;
pub mod checklist;
pub mod assignment;
pub mod file;
pub mod document;
pub mod assessment;
pub mod user;
pub mod aoi;
pub mod config;

pub use year::*;
pub use structure::*;
pub use checklist::*;
pub use assignment::*;
pub use file::*;
pub use document::*;
pub use assessment::*;
pub use user::*;
pub use aoi::*;
pub use config::*;
