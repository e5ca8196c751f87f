//! impress-publications: Grouped publication lists with drill-down details.
//!
//! A [`RecordStore`] wraps the records returned by a Zotero-style API and can
//! reshape them into buckets keyed by item type. A [`Presenter`] renders the
//! store into a [`Surface`] through a [`Templates`] implementation and turns
//! clicks on that surface into one of three commands:
//! - expand or collapse a group (purely visual),
//! - show the details of a single record,
//! - return from the details to the list exactly as it was rendered.

pub mod config;
pub mod error;
pub mod presenter;
pub mod record;
pub mod store;
pub mod surface;
pub mod template;

pub use config::*;
pub use error::*;
pub use presenter::*;
pub use record::*;
pub use store::*;
pub use surface::*;
pub use template::*;
