//! Text styling hook
//!
//! The platform's font service restyles message text per module. The menu
//! subsystem only depends on this narrow interface: fragments are styled
//! one at a time so markup inserted by the view builder is never touched.

use async_trait::async_trait;

/// Module name under which the help menu registers with the font service.
pub const HELP_MODULE: &str = "Help";

/// Per-fragment text transform.
///
/// Implementations must be safe to call many times per render; the view
/// builder applies the transform to every logical fragment separately.
#[async_trait]
pub trait TextStyler: Send + Sync {
    async fn apply(&self, module: &str, fragment: &str) -> String;
}

/// Identity styler, used when no font service is wired up.
pub struct PlainStyler;

#[async_trait]
impl TextStyler for PlainStyler {
    async fn apply(&self, _module: &str, fragment: &str) -> String {
        fragment.to_string()
    }
}
