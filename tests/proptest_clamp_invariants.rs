//! Property-based invariant tests for the screen clamp.
//!
//! These tests verify invariants that must hold for any stored record:
//!
//! 1. Clamping is idempotent when the window fits on the screen.
//! 2. A window that fits ends up fully inside the screen.
//! 3. Size and maximized state are never changed.
//! 4. With several screens (or none) the record passes through unchanged.
//! 5. No panics on extreme i32 values.

use proptest::prelude::*;
use window_restorer::{GeometryRecord, ScreenBounds, clamp_to_screens};

// ── Helpers ─────────────────────────────────────────────────────────────

fn screen_strategy() -> impl Strategy<Value = ScreenBounds> {
    (1i32..=8000, 1i32..=8000).prop_map(|(w, h)| ScreenBounds::sized(w, h))
}

/// A screen plus a record whose size fits on it, at any position
fn fitting_strategy() -> impl Strategy<Value = (ScreenBounds, GeometryRecord)> {
    screen_strategy().prop_flat_map(|screen| {
        (
            Just(screen),
            any::<i32>(),
            any::<i32>(),
            1..=screen.width,
            1..=screen.height,
            any::<bool>(),
        )
            .prop_map(|(screen, x, y, w, h, max)| (screen, GeometryRecord::new(x, y, w, h, max)))
    })
}

fn record_strategy() -> impl Strategy<Value = GeometryRecord> {
    (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>(), any::<bool>())
        .prop_map(|(x, y, w, h, max)| GeometryRecord::new(x, y, w, h, max))
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Idempotent when the window fits
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_idempotent_when_fitting((screen, record) in fitting_strategy()) {
        let once = clamp_to_screens(record, &[screen]);
        let twice = clamp_to_screens(once, &[screen]);
        prop_assert_eq!(twice, once, "second clamp moved {:?} on {:?}", once, screen);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Fitting windows land inside the screen
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_keeps_fitting_window_on_screen((screen, record) in fitting_strategy()) {
        let clamped = clamp_to_screens(record, &[screen]);
        prop_assert!(clamped.x >= 0 && clamped.x <= screen.width - clamped.width,
            "x out of range: {:?} on {:?}", clamped, screen);
        prop_assert!(clamped.y >= 0 && clamped.y <= screen.height - clamped.height,
            "y out of range: {:?} on {:?}", clamped, screen);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Size and maximized state survive
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_only_moves(record in record_strategy(), screen in screen_strategy()) {
        let clamped = clamp_to_screens(record, &[screen]);
        prop_assert_eq!(clamped.size(), record.size());
        prop_assert_eq!(clamped.maximized, record.maximized);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Pass-through unless exactly one screen
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_identity_with_multiple_screens(
        record in record_strategy(),
        screens in prop::collection::vec(screen_strategy(), 2..5),
    ) {
        prop_assert_eq!(clamp_to_screens(record, &screens), record);
    }

    #[test]
    fn clamp_identity_without_screens(record in record_strategy()) {
        prop_assert_eq!(clamp_to_screens(record, &[]), record);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. No panics on extreme values
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clamp_no_panic_on_extremes(
        record in record_strategy(),
        w in any::<i32>(),
        h in any::<i32>(),
    ) {
        let screen = ScreenBounds::sized(w, h);
        let _ = clamp_to_screens(record, &[screen]);
    }
}
