//! Plugin capability tables.
//!
//! Archive types, view generators and disassemblers are registered by
//! identifier during startup (usually from a service's `initialize`) and looked
//! up by identifier when a feature needs them. Content-model factories have
//! their own registry, [`ContentModels`](crate::ContentModels).
//!
//! ```text
//! Service::initialize ──► plugins.archives.register("jar", handler)
//!                                     │
//! ServiceRegistry::start ──► seal() ──┘  (ApplicationStarted)
//!                                     │
//! ImportArchive command ──► plugins.archives.get("jar") ──► handler.expand(..)
//! ```

mod handlers;
mod table;

pub use handlers::{ArchiveHandler, Disassembler, StructuralUnit, ViewArtifact, ViewGenerator};
pub use table::CapabilityTable;

/// The three plugin capability tables.
pub struct Plugins {
    /// Archive-type handlers, keyed by archive type (e.g. `"jar"`).
    pub archives: CapabilityTable<dyn ArchiveHandler>,
    /// View generators, keyed by view kind.
    pub views: CapabilityTable<dyn ViewGenerator>,
    /// Disassemblers, keyed by disassembler identifier.
    pub disassemblers: CapabilityTable<dyn Disassembler>,
}

impl Plugins {
    /// Creates empty, unsealed tables.
    pub fn new() -> Self {
        Self {
            archives: CapabilityTable::new("archive type"),
            views: CapabilityTable::new("view generator"),
            disassemblers: CapabilityTable::new("disassembler"),
        }
    }

    /// Seals every table; called when the application starts.
    pub fn seal(&self) {
        self.archives.seal();
        self.views.seal();
        self.disassemblers.seal();
    }
}

impl Default for Plugins {
    fn default() -> Self {
        Self::new()
    }
}
