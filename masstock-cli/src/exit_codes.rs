/// Exit codes for CI/automation.
pub const SUCCESS: i32 = 0;
pub const VALIDATION_FAILED: i32 = 2;
pub const EXECUTION_FAILED: i32 = 3;
pub const RUNTIME_ERROR: i32 = 4;
pub const POLL_TIMEOUT: i32 = 5;
/// Polling interrupted (Ctrl-C). The execution itself keeps running.
pub const INTERRUPTED: i32 = 130;
