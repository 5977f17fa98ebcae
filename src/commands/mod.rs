//! CLI command implementations
//!
//! Read, write and erase are written against the address-based
//! `FlashDevice` view. Probe, clock and background need the driver itself
//! because they look at the controller state.

mod background;
mod clock;
mod erase;
mod list;
mod probe;
mod read;
mod write;

pub use background::run_background;
pub use clock::run_clock;
pub use erase::{run_chip_erase, run_erase};
pub use list::list_chips;
pub use probe::run_probe;
pub use read::run_read;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};

/// Chunk size used for progress reporting (one sector)
const CHUNK_SIZE: usize = 4096;

/// Progress bar counting bytes
fn byte_progress(total: u64) -> crate::error::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Spinner for operations without progress
fn spinner(msg: &'static str) -> crate::error::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Format a byte count for display
fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(8 * 1024 * 1024), "8 MiB");
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(100), "100 B");
    }
}
