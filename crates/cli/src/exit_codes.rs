//! CLI Exit Code Registry
//!
//! Single source of truth for `cardmesh` exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain     | Description                              |
//! |---------|------------|------------------------------------------|
//! | 0       | Universal  | Success                                  |
//! | 2       | Universal  | CLI usage error (bad args, missing file) |
//! | 60-69   | recon      | Reconciliation run codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use cardmesh_recon::ReconError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file unreadable as TOML or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A provider export could not be read or parsed.
pub const EXIT_RECON_LOAD: u8 = 61;

/// The engine aborted (invariant violation, every identifier malformed).
pub const EXIT_RECON_ENGINE: u8 = 62;

/// An output document could not be written.
pub const EXIT_RECON_WRITE: u8 = 63;

/// `--strict`: run completed but reported mismatches, flags or warnings.
pub const EXIT_RECON_ISSUES: u8 = 64;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::Load { .. } | ReconError::MissingRequiredField { .. } => EXIT_RECON_LOAD,
        ReconError::MalformedIdentifier(_)
        | ReconError::InvariantViolation(_)
        | ReconError::EmptyUniverse { .. } => EXIT_RECON_ENGINE,
    }
}
