//! Timeframes command implementation.

use barvault_lib::prelude::*;

/// Print the timeframe registry.
pub(crate) fn list_timeframes() {
    println!(
        "{:<6} {:<10} {:>14} {:>16}",
        "KEY", "CODE", "BUCKET (s)", "WINDOW (days)"
    );
    println!("{}", "-".repeat(49));

    for timeframe in Timeframe::all() {
        let spec = timeframe.spec();
        println!(
            "{:<6} {:<10} {:>14} {:>16}",
            timeframe.as_str(),
            spec.resolution_code.as_str(),
            spec.bucket_seconds,
            spec.default_window_seconds() / 86_400
        );
    }
}
