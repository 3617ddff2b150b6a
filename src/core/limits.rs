/*!
 * Engine Limits and Constants
 *
 * Centralized location for bounds and defaults used by the engine.
 * - Security-critical constants are marked with [SECURITY]
 * - Performance-critical constants are marked with [PERF]
 */

use std::time::Duration;

// =============================================================================
// CONDITIONS
// =============================================================================

/// Maximum nesting of composite conditions
/// [SECURITY] Bounds recursion during evaluation
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 16;

/// Maximum number of children in a single composite condition
pub const MAX_COMPOSITE_CHILDREN: usize = 64;

// =============================================================================
// NAMES
// =============================================================================

/// Longest accepted policy, condition or effect name (bytes)
pub const MAX_NAME_LEN: usize = 256;

// =============================================================================
// DECISION CACHE
// =============================================================================

/// Default decision cache capacity (entries)
/// [PERF] Sized for a few thousand concurrently active subjects
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default decision cache lifetime
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

// =============================================================================
// AUDIT
// =============================================================================

/// Global audit ring buffer size
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Per-subject audit ring buffer size
pub const MAX_AUDIT_EVENTS_PER_SUBJECT: usize = 1_000;
