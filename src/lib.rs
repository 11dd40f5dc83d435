//! recycle-lint
//!
//! Static analyzer for pooled resource handles (TypedArray, MotionEvent,
//! Parcel, Message, VelocityTracker) that are obtained from a pool and never
//! returned to it with `recycle()`.
//!
//! # Example
//!
//! ```
//! use recycle_lint::middle::core::{ClassUnit, MethodBuilder};
//! use recycle_lint::util::config::LintConfig;
//!
//! let method = MethodBuilder::new("write", "()V")
//!     .invoke_static("android/os/Parcel", "obtain", "()Landroid/os/Parcel;")
//!     .store(1)
//!     .ret()
//!     .locals(2)
//!     .build();
//! let unit = ClassUnit::new("com/example/Writer").with_method(method);
//!
//! let diagnostics = recycle_lint::check_unit(&unit, &LintConfig::default());
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].code, "R0001");
//! ```

#![warn(rust_2018_idioms)]

pub mod middle;
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};

use crate::middle::core::{collect_unit_paths, load_unit, ClassUnit};
use crate::middle::passes::recycle::{CheckOptions, UnitDriver};
use crate::util::config::LintConfig;
use crate::util::diagnostic::Diagnostic;
use std::path::PathBuf;
use tracing::{debug, info};

/// Tool version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "recycle-lint";

/// Build a unit driver from resolved settings
pub fn driver_for(config: &LintConfig) -> UnitDriver {
    UnitDriver::new(
        config.resource_table(),
        CheckOptions {
            parallel: config.parallel,
            rescan: config.rescan,
            severity: config.severity,
        },
    )
}

/// Check one in-memory unit
pub fn check_unit(
    unit: &ClassUnit,
    config: &LintConfig,
) -> Vec<Diagnostic> {
    if !config.enabled {
        debug!("lint disabled, skipping {}", unit.name);
        return Vec::new();
    }
    driver_for(config).run(unit).diagnostics
}

/// Load every unit under `paths` and check them
pub fn check_paths(
    paths: &[PathBuf],
    config: &LintConfig,
) -> Result<Vec<Diagnostic>> {
    let files = collect_unit_paths(paths).context("Failed to collect unit files")?;
    info!("Checking {} unit file(s)", files.len());

    let units = files
        .iter()
        .map(|path| load_unit(path).with_context(|| format!("Failed to load {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    if !config.enabled {
        debug!("lint disabled, skipping {} units", units.len());
        return Ok(Vec::new());
    }
    Ok(driver_for(config).check_units(&units))
}
