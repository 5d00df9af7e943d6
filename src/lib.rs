//! deck — a to-do manager with a single JSON file for state.
//!
//! The [`store::TaskStore`] owns the ordered task collection and the active
//! view filter; an injected [`io::slot::Slot`] mirrors the collection to
//! durable storage after every mutation. The `dk` binary in `src/main.rs`
//! is a thin CLI over the store.

pub mod cli;
pub mod io;
pub mod model;
pub mod store;
