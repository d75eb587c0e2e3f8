// Named countdown timers advanced once per tick, with optional looping

use log::warn;

// Slack for f32 residue, so a loop of 0.5s stepped by 0.1s fires on the fifth step
const EXPIRY_EPSILON: f32 = 1e-4;

/// Callback run when a timer expires. Receives the scheduler's context and a
/// request sink so it can remove timers (including itself) without touching
/// the scheduler while it is iterating.
pub type TimerCallback<C> = Box<dyn FnMut(&mut C, &mut TimerRequests)>;

/// Removal requests raised from inside timer callbacks.
/// Applied only after every timer of the tick has been evaluated.
#[derive(Debug, Default)]
pub struct TimerRequests {
    removals: Vec<String>,
}

impl TimerRequests {
    pub fn remove_timer(&mut self, name: &str) {
        self.removals.push(name.to_string());
    }
}

struct Timer<C> {
    name: String,
    duration: f32,
    remaining: f32,
    looping: bool,
    trigger_count: u32,
    marked_for_removal: bool,
    callback: TimerCallback<C>,
}

/// Cooperative scheduler for named timers. `C` is the state handed to callbacks.
pub struct TimerScheduler<C> {
    timers: Vec<Timer<C>>, // Insertion order is evaluation order
}

impl<C> Default for TimerScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TimerScheduler<C> {
    pub fn new() -> Self {
        TimerScheduler { timers: Vec::new() }
    }

    /// Registers a timer. Returns false, leaving everything untouched, if a
    /// timer with this name already exists.
    pub fn add_timer(
        &mut self,
        name: &str,
        duration: f32,
        callback: impl FnMut(&mut C, &mut TimerRequests) + 'static,
        looping: bool,
    ) -> bool {
        if self.contains(name) {
            crate::debug_timer!("Rejected duplicate timer '{}'", name);
            return false;
        }
        if looping && duration <= 0.0 {
            warn!(
                "Looping timer '{}' has non-positive duration {:.3}; it will fire every tick",
                name, duration
            );
        }
        crate::debug_timer!(
            "Added timer '{}' ({:.3}s, looping: {})",
            name,
            duration,
            looping
        );
        self.timers.push(Timer {
            name: name.to_string(),
            duration,
            remaining: duration,
            looping,
            trigger_count: 0,
            marked_for_removal: false,
            callback: Box::new(callback),
        });
        true
    }

    /// Removes a timer. Returns false if no timer has this name.
    /// Callbacks cannot reach the scheduler; they use `TimerRequests` instead.
    pub fn remove_timer(&mut self, name: &str) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.name != name);
        let removed = self.timers.len() != before;
        if removed {
            crate::debug_timer!("Removed timer '{}'", name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.timers.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// How many times the named timer has fired, `None` if it is not registered.
    pub fn trigger_count(&self, name: &str) -> Option<u32> {
        self.find(name).map(|t| t.trigger_count)
    }

    /// Time left before the named timer fires, `None` if it is not registered.
    pub fn remaining_time(&self, name: &str) -> Option<f32> {
        self.find(name).map(|t| t.remaining)
    }

    fn find(&self, name: &str) -> Option<&Timer<C>> {
        self.timers.iter().find(|t| t.name == name)
    }

    /// Advances every timer by `dt`, firing callbacks for those that expire.
    /// Expired one-shot timers and timers removed from callbacks are dropped
    /// after the whole set has been evaluated.
    pub fn update(&mut self, dt: f32, ctx: &mut C) {
        let mut requests = TimerRequests::default();

        for timer in self.timers.iter_mut() {
            timer.remaining -= dt;
            if timer.remaining > EXPIRY_EPSILON {
                continue;
            }

            (timer.callback)(ctx, &mut requests);
            timer.trigger_count += 1;
            crate::debug_timer!(
                "Timer '{}' fired (count {})",
                timer.name,
                timer.trigger_count
            );

            if timer.looping {
                // Overshoot counts towards the next cycle, at most one fire per update
                timer.remaining += timer.duration;
                if timer.remaining <= EXPIRY_EPSILON {
                    timer.remaining = timer.duration;
                }
            } else {
                timer.marked_for_removal = true;
            }
        }

        for name in requests.removals {
            for timer in self.timers.iter_mut().filter(|t| t.name == name) {
                timer.marked_for_removal = true;
            }
        }
        self.timers.retain(|t| !t.marked_for_removal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_one_timer_per_name() {
        let mut timers: TimerScheduler<u32> = TimerScheduler::new();
        let mut fired = 0;

        assert!(timers.add_timer("x", 1.0, |count, _| *count += 1, false));
        assert!(!timers.add_timer("x", 1.0, |count, _| *count += 100, false));
        assert_eq!(timers.len(), 1);

        timers.update(1.5, &mut fired);
        assert_eq!(fired, 1);
        // One-shot timer is gone after firing
        assert!(!timers.contains("x"));
        assert_eq!(timers.trigger_count("x"), None);
    }

    #[test]
    fn test_looping_timer_fire_count() {
        let mut timers: TimerScheduler<u32> = TimerScheduler::new();
        let mut fired = 0;
        let dt = 0.1;
        let duration = 0.5;
        timers.add_timer("loop", duration, |count, _| *count += 1, true);

        // 3.05 seconds total, floor(3.05 / 0.5) = 6
        for _ in 0..30 {
            timers.update(dt, &mut fired);
        }
        timers.update(0.05, &mut fired);

        let expected = (3.05_f32 / duration).floor() as u32;
        assert!(fired.abs_diff(expected) <= 1, "fired {} times", fired);
        assert_eq!(timers.trigger_count("loop"), Some(fired));
        assert!(timers.remaining_time("loop").unwrap() > 0.0);
    }

    #[test]
    fn test_looping_timer_keeps_pace_over_long_runs() {
        let mut timers: TimerScheduler<u32> = TimerScheduler::new();
        let mut fired = 0;
        timers.add_timer("loop", 0.5, |count, _| *count += 1, true);

        // 30 seconds in 0.1s steps
        for _ in 0..300 {
            timers.update(0.1, &mut fired);
        }
        assert_eq!(fired, 60);
        assert_eq!(timers.trigger_count("loop"), Some(60));
    }

    #[test]
    fn test_looping_timer_carries_overshoot() {
        let mut timers: TimerScheduler<u32> = TimerScheduler::new();
        let mut fired = 0;
        timers.add_timer("loop", 1.0, |count, _| *count += 1, true);

        timers.update(1.25, &mut fired);
        assert_eq!(fired, 1);
        assert_approx_eq!(timers.remaining_time("loop").unwrap(), 0.75);

        // A step longer than the period still fires once
        timers.update(3.0, &mut fired);
        assert_eq!(fired, 2);
        assert_approx_eq!(timers.remaining_time("loop").unwrap(), 1.0);
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let mut timers: TimerScheduler<()> = TimerScheduler::new();
        timers.add_timer("cooldown", 2.0, |_, _| {}, false);
        timers.update(0.5, &mut ());
        assert_approx_eq!(timers.remaining_time("cooldown").unwrap(), 1.5);
        assert_eq!(timers.trigger_count("cooldown"), Some(0));
        assert_eq!(timers.remaining_time("missing"), None);
    }

    #[test]
    fn test_remove_unknown_timer_is_noop() {
        let mut timers: TimerScheduler<()> = TimerScheduler::new();
        assert!(!timers.remove_timer("ghost"));
        timers.add_timer("real", 1.0, |_, _| {}, true);
        assert!(timers.remove_timer("real"));
        assert!(timers.is_empty());
    }

    #[test]
    fn test_removal_from_callback_is_deferred() {
        let mut timers: TimerScheduler<Vec<&'static str>> = TimerScheduler::new();
        let mut log = Vec::new();

        // "first" removes "second" while both expire in the same tick
        timers.add_timer(
            "first",
            1.0,
            |log, requests| {
                log.push("first");
                requests.remove_timer("second");
            },
            true,
        );
        timers.add_timer("second", 1.0, |log, _| log.push("second"), true);

        timers.update(1.0, &mut log);
        // The sibling was still evaluated this tick
        assert_eq!(log, vec!["first", "second"]);
        assert!(timers.contains("first"));
        assert!(!timers.contains("second"));

        timers.update(1.0, &mut log);
        assert_eq!(log, vec!["first", "second", "first"]);
    }

    #[test]
    fn test_callback_can_remove_itself() {
        let mut timers: TimerScheduler<u32> = TimerScheduler::new();
        let mut fired = 0;
        timers.add_timer(
            "self",
            0.25,
            |count, requests| {
                *count += 1;
                requests.remove_timer("self");
            },
            true,
        );
        for _ in 0..8 {
            timers.update(0.25, &mut fired);
        }
        assert_eq!(fired, 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_name_free_again_after_expiry() {
        let mut timers: TimerScheduler<()> = TimerScheduler::new();
        assert!(timers.add_timer("respawn", 0.5, |_, _| {}, false));
        timers.update(0.5, &mut ());
        assert!(timers.add_timer("respawn", 0.5, |_, _| {}, false));
    }
}
