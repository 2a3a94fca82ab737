//! A differential measurement search engine: drives an external
//! source-level debugger to locate the exact source lines — in a target
//! program and in any library it calls — that cause a measurable change in
//! a chosen runtime property.
//!
//! The crate is organized leaves-first, mirroring the six cooperating
//! components of the design: [`probe`], [`source_resolver`], [`session`],
//! [`frame_tracer`], [`search_driver`], and [`finding`]/[`html_renderer`].

pub mod call_path;
pub mod error;
pub mod finding;
pub mod frame_tracer;
pub mod gdbinit;
pub mod html_renderer;
pub mod predicate;
pub mod probe;
pub mod raw_data;
pub mod search_driver;
pub mod session;
pub mod source_resolver;

#[doc(hidden)]
pub mod test_support;

pub use error::Error;

/// A totally-ordered numeric value; the delta predicate consumes two of
/// these and returns a boolean. Wide enough for byte counts, kB-scale
/// memory sums, and fd counts.
pub type Scalar = i64;
