/*!
 * Core Types
 * Identifier aliases shared across the crate
 */

/// Kernel process identifier as it appears in the proc tables
pub type Pid = u32;

/// Kernel thread identifier (same numbering space as [`Pid`])
pub type Tid = u32;

/// Converts a table identifier into the signed form the kernel expects.
///
/// Returns `None` for ids that cannot name exactly one process: `0` and
/// anything above `i32::MAX` would be interpreted by `kill(2)` as a process
/// group or as "every process".
#[inline]
pub fn to_raw_pid(pid: Pid) -> Option<i32> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Some(raw),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_pid_conversion() {
        assert_eq!(to_raw_pid(1), Some(1));
        assert_eq!(to_raw_pid(4_194_304), Some(4_194_304));
        assert_eq!(to_raw_pid(0), None);
        assert_eq!(to_raw_pid(u32::MAX), None);
        assert_eq!(to_raw_pid(i32::MAX as u32 + 1), None);
    }
}
