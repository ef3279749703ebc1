//! Baud-rate whitelist.
//!
//! The line-discipline utility accepts exactly these rates; anything else is
//! rejected before a process is spawned. The original table carried legacy
//! numeric codes next to each rate, but only membership was ever consulted,
//! so the table survives as a plain whitelist.

/// Baud rates the session will pass to `stty`.
pub const SUPPORTED_BAUD_RATES: [u32; 12] = [
    110, 150, 300, 600, 1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200,
];

/// Whether `rate` is a legal baud rate for this session.
pub fn is_supported(rate: u32) -> bool {
    SUPPORTED_BAUD_RATES.contains(&rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist_members() {
        for rate in SUPPORTED_BAUD_RATES {
            assert!(is_supported(rate), "{rate} should be supported");
        }
    }

    #[test]
    fn test_rejects_everything_else() {
        for rate in [0, 1, 75, 134, 9601, 14400, 28800, 230400, 921600, u32::MAX] {
            assert!(!is_supported(rate), "{rate} should be rejected");
        }
    }
}
