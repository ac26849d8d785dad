/// Fires once each time the cursor moves into the last `threshold` rows of a
/// list, the terminal counterpart of "scrolled near the bottom of the page".
///
/// The trigger is owned by whatever screen listens for it. Dropping it or
/// calling [`ScrollTrigger::detach`] ends the subscription.
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    threshold: usize,
    armed: bool,
    attached: bool,
    /// List length seen at the last observation.
    seen_total: usize,
}

impl ScrollTrigger {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            armed: true,
            attached: true,
            seen_total: 0,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Report the cursor `position` within a list of `total` rows. Returns
    /// true on the observation that crosses into the threshold zone.
    pub fn observe(&mut self, position: usize, total: usize) -> bool {
        if !self.attached || total == 0 {
            return false;
        }

        // New rows arrived: the zone moved, so listen again.
        if total > self.seen_total {
            self.armed = true;
        }
        self.seen_total = total;

        let near_end = position + self.threshold >= total;
        if !near_end {
            self.armed = true;
            return false;
        }

        if self.armed {
            self.armed = false;
            return true;
        }
        false
    }

    /// Start listening afresh, e.g. after the list was replaced.
    pub fn reset(&mut self) {
        self.armed = true;
        self.attached = true;
        self.seen_total = 0;
    }
}
