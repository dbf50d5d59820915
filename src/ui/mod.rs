//! Browser-facing layer.
//!
//! - [`server`]: axum routes, session cookies, and the serve loop.
//! - [`page`]: the token gate and main chat view.
//! - [`transcript`]: conversation rendering shared by the page and `/transcript`.
//! - [`markup`]: escaping, Markdown rendering, and the document shell.
//!
//! This layer only reads sessions and turns form posts into
//! [`crate::core::actions::SessionAction`]s; [`crate::core`] owns the state.

pub mod markup;
pub mod page;
pub mod server;
pub mod transcript;
