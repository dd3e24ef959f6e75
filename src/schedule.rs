//! Periodic callbacks keyed by handle. Owners register a tick when a session starts and cancel it
//! on exit, so no refresh can outlive the session that asked for it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u32);

#[derive(Debug)]
struct Tick {
    handle: TickHandle,
    period: f32,
    next_due: f32,
}

#[derive(Debug, Default)]
pub struct TickScheduler {
    ticks: Vec<Tick>,
    next_handle: u32,
}

impl TickScheduler {
    /// First fire is one `period` after `now`. Non-positive periods fire every poll.
    pub fn register(&mut self, period: f32, now: f32) -> TickHandle {
        let handle = TickHandle(self.next_handle);
        self.next_handle += 1;
        let period = period.max(0.0);
        self.ticks.push(Tick {
            handle,
            period,
            next_due: now + period,
        });
        handle
    }

    pub fn cancel(&mut self, handle: TickHandle) -> bool {
        let before = self.ticks.len();
        self.ticks.retain(|tick| tick.handle != handle);
        self.ticks.len() != before
    }

    /// Handles due at `now`. Each fires at most once per poll even after a long stall.
    pub fn poll(&mut self, now: f32) -> Vec<TickHandle> {
        let mut fired = Vec::new();
        for tick in &mut self.ticks {
            if now >= tick.next_due {
                fired.push(tick.handle);
                tick.next_due = if tick.period > 0.0 {
                    let missed = ((now - tick.next_due) / tick.period).floor() + 1.0;
                    tick.next_due + missed * tick.period
                } else {
                    now
                };
            }
        }
        fired
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_period_and_stops_after_cancel() {
        let mut scheduler = TickScheduler::default();
        let timer = scheduler.register(0.1, 0.0);

        assert!(scheduler.poll(0.05).is_empty());
        assert_eq!(scheduler.poll(0.1), vec![timer]);
        assert!(scheduler.poll(0.15).is_empty());
        assert_eq!(scheduler.poll(0.75), vec![timer], "a stall fires once");
        assert!(scheduler.poll(0.79).is_empty());

        assert!(scheduler.cancel(timer));
        assert!(!scheduler.cancel(timer));
        assert!(scheduler.poll(10.0).is_empty());
        assert!(scheduler.is_empty());
    }
}
