//! Domain types for job invocations and the read-only definitions they
//! reference.
//!
//! The invocation graph ([`JobInvocation`] -> [`Targeting`] and
//! [`TemplateInvocation`] -> [`InputValue`]) is built fresh for every
//! composition and persisted as one unit. [`JobTemplate`], [`TemplateInput`],
//! [`Bookmark`] and [`Principal`] come from collaborators and are only read.

pub mod bookmark;
pub mod ids;
pub mod invocation;
pub mod principal;
pub mod template;

pub use bookmark::*;
pub use ids::*;
pub use invocation::*;
pub use principal::*;
pub use template::*;
