use log::debug;

/// The one physical control.
pub trait InputSource {
    /// Current logical state. Must not block.
    fn is_pressed(&mut self) -> bool;
}

impl<I: InputSource + ?Sized> InputSource for &mut I {
    fn is_pressed(&mut self) -> bool {
        (**self).is_pressed()
    }
}

/// Reports a change only after `samples` consecutive raw reads agree.
///
/// With `samples <= 1` every raw read passes straight through.
pub struct Debounced<I> {
    raw: I,
    samples: u8,
    stable: bool,
    candidate: bool,
    count: u8,
}

impl<I: InputSource> Debounced<I> {
    pub fn new(raw: I, samples: u8) -> Self {
        Self {
            raw,
            samples,
            stable: false,
            candidate: false,
            count: 0,
        }
    }
}

impl<I: InputSource> InputSource for Debounced<I> {
    fn is_pressed(&mut self) -> bool {
        let now = self.raw.is_pressed();
        if now == self.stable {
            self.count = 0;
            return self.stable;
        }

        if now == self.candidate && self.count > 0 {
            self.count = self.count.saturating_add(1);
        } else {
            self.candidate = now;
            self.count = 1;
        }

        if self.count >= self.samples {
            debug!("button {}", if now { "down" } else { "up" });
            self.stable = now;
            self.count = 0;
        }
        self.stable
    }
}
