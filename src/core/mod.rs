//! Runtime core: wiring and lifecycle.
//!
//! The public entry point is [`Workbench`], built with [`WorkbenchBuilder`].
//!
//! Internal modules:
//! - [`workbench`]: owns every component and drives startup/shutdown;
//! - [`builder`]: constructs the components and wires them together;
//! - [`shutdown`]: cross-platform termination-signal handling.

mod builder;
mod shutdown;
mod workbench;

pub use builder::WorkbenchBuilder;
pub use workbench::Workbench;
