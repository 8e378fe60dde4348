//! Shared types used by every stage of the lsql pipeline: source locations,
//! the error hierarchy, runtime values, and the layered context abstraction
//! the evaluator uses for name lookup.

mod context;
mod error;
mod location;
mod schema;
mod value;

pub use context::{Context, EmptyContext, LayeredContext, MapContext};
pub use error::{Error, Result};
pub use location::{Location, Span};
pub use schema::{resolve_column_alias, FILE_COLUMNS, FILE_DEFAULT_COLUMNS, FILE_STAR_COLUMNS};
pub use value::{Interval, Mode, Tag, TaggedString, Timestamp, Value};
