//! Windows reserved device names.

const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Returns the reserved device name `basename` refers to, if any.
///
/// Windows ignores everything from the first dot and any trailing spaces,
/// so `nul.txt` and `CON .log` both name a device.
#[must_use]
pub fn reserved_device(basename: &str) -> Option<&'static str> {
    let stem = basename.split('.').next().unwrap_or(basename).trim_end_matches(' ');
    RESERVED
        .iter()
        .copied()
        .find(|reserved| reserved.eq_ignore_ascii_case(stem))
}
