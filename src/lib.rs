//! encore: a sheet-music PDF viewer for performing from the terminal.
//!
//! The viewing core (`geometry`, `navigation`, `zoom`, `scroll`, `advance`,
//! `overlay`, `view`) is pure state and arithmetic. `document` wraps mupdf,
//! `extract` drives qpdf, and `viewer` puts it all on a Kitty-graphics
//! terminal.

pub mod advance;
pub mod config;
pub mod dialog;
pub mod document;
pub mod extract;
pub mod geometry;
pub mod navigation;
pub mod overlay;
pub mod scroll;
pub mod view;
pub mod viewer;
pub mod watch;
pub mod zoom;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `--version` text including the commit and build profile when known.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("ENCORE_BUILD_GIT_HASH"),
    " ",
    env!("ENCORE_BUILD_PROFILE"),
    ")"
);
