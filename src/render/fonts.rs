//! TrueType font lookup for figure text.
//!
//! plotters keeps registered fonts process-wide, so the sans-serif face is
//! registered at most once; the first caller's choice sticks.

use plotters::style::{FontStyle, register_font};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Family name the figure asks plotters for.
pub const FAMILY: &str = "sans-serif";

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Make [`FAMILY`] drawable. Tries `explicit` first, then well-known system
/// locations. Returns false when no usable font was found.
pub fn ensure_registered(explicit: Option<&Path>) -> bool {
    *REGISTERED.get_or_init(|| register(explicit))
}

fn register(explicit: Option<&Path>) -> bool {
    if let Some(path) = explicit {
        if try_register(path) {
            return true;
        }
        warn!(path = %path.display(), "font not usable, falling back to system fonts");
    }

    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .any(|path| try_register(&path))
}

fn try_register(path: &Path) -> bool {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), %err, "font not readable");
            return false;
        }
    };

    // plotters needs the face for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font(FAMILY, FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(path = %path.display(), "registered font");
            true
        }
        Err(_) => {
            debug!(path = %path.display(), "not a TrueType font");
            false
        }
    }
}
