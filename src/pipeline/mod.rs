//! Stages a single patent passes through.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ source ──▶ extract ──▶ store
//! (ids)     (HTTP)     (HTML)      (disk)
//! ```
//!
//! 1. [`input`]   — read the identifier list from arguments or a file
//! 2. [`source`]  — fetch the landing page and open the PDF download; the
//!    only stage with network I/O
//! 3. [`extract`] — pull metadata fields and the PDF link out of the HTML
//! 4. [`store`]   — validate, read and atomically write cached artifacts
//!
//! [`crate::cache`] decides which stages run for a given identifier.

pub mod extract;
pub mod input;
pub mod source;
pub mod store;
