/// Cooldown gate for notification debouncing.
///
/// A sustained change (someone standing in frame) would otherwise fire on
/// every poll; suppressing detections for a short window after the last
/// confirmed one keeps that to a single notification. The gate only
/// consults the timestamp — the pipeline commits it.
pub fn should_suppress(now_ms: i64, last_detection_at_ms: i64, cooldown_ms: i64) -> bool {
    now_ms - last_detection_at_ms < cooldown_ms
}
