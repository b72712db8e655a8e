use image::RgbaImage;

/// One decoded camera snapshot.
///
/// Keeps both the decoded pixels (for diffing) and the original encoded
/// JPEG bytes (for the classifier upload and the mail attachment), plus
/// the acquisition timestamp in Unix millis. A frame is replaced, never
/// mutated, once it lands in the store.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub jpeg: Vec<u8>,
    pub captured_at_ms: i64,
}

impl Frame {
    pub fn new(image: RgbaImage, jpeg: Vec<u8>, captured_at_ms: i64) -> Self {
        Self {
            image,
            jpeg,
            captured_at_ms,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Holds the two most recent frames and the time of the last confirmed
/// detection. Written only from the single active cycle, so no locking.
///
/// Rotation invariant: the first frame ever seen fills `last`; afterwards
/// a populated `current` is moved into `last` before the new frame is
/// installed into `current`. At most one slot is empty, and only during
/// the first cycle after startup.
#[derive(Debug, Default)]
pub struct FrameStore {
    last: Option<Frame>,
    current: Option<Frame>,
    last_detection_at_ms: i64,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly acquired frame, rotating `current` into `last`
    /// first when both roles are already occupied. Returns `true` once a
    /// comparable pair exists.
    pub fn install(&mut self, frame: Frame) -> bool {
        if self.last.is_none() {
            self.last = Some(frame);
        } else if self.current.is_none() {
            self.current = Some(frame);
        } else {
            self.last = self.current.take();
            self.current = Some(frame);
        }
        self.has_pair()
    }

    pub fn has_pair(&self) -> bool {
        self.last.is_some() && self.current.is_some()
    }

    /// Both frames, oldest first. `None` until a comparable pair exists.
    pub fn pair(&self) -> Option<(&Frame, &Frame)> {
        match (&self.last, &self.current) {
            (Some(last), Some(current)) => Some((last, current)),
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn last_detection_at_ms(&self) -> i64 {
        self.last_detection_at_ms
    }

    /// Commit the detection timestamp. Called exactly once per confirmed
    /// detection, before classification starts.
    pub fn mark_detection(&mut self, now_ms: i64) {
        self.last_detection_at_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn frame(ts: i64) -> Frame {
        Frame::new(RgbaImage::new(4, 4), vec![0xFF, 0xD8], ts)
    }

    #[test]
    fn first_install_fills_last_only() {
        let mut store = FrameStore::new();
        let has_pair = store.install(frame(1));
        assert!(!has_pair);
        assert!(store.last().is_some());
        assert!(store.current().is_none());
    }

    #[test]
    fn second_install_completes_the_pair() {
        let mut store = FrameStore::new();
        store.install(frame(1));
        let has_pair = store.install(frame(2));
        assert!(has_pair);
        assert_eq!(store.last().unwrap().captured_at_ms, 1);
        assert_eq!(store.current().unwrap().captured_at_ms, 2);
    }

    #[test]
    fn third_install_rotates_current_into_last() {
        let mut store = FrameStore::new();
        store.install(frame(1));
        store.install(frame(2));
        store.install(frame(3));
        assert_eq!(store.last().unwrap().captured_at_ms, 2);
        assert_eq!(store.current().unwrap().captured_at_ms, 3);
    }

    #[test]
    fn detection_timestamp_defaults_to_never() {
        let store = FrameStore::new();
        assert_eq!(store.last_detection_at_ms(), 0);
    }

    #[test]
    fn mark_detection_updates_timestamp() {
        let mut store = FrameStore::new();
        store.mark_detection(1708300000000);
        assert_eq!(store.last_detection_at_ms(), 1708300000000);
    }
}
