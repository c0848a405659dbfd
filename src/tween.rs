//! Cooperative tween and timer scheduler.
//!
//! Camera and time-scale effects animate independently of gameplay, so they
//! are driven by this scheduler on unscaled time. Each animated [`Channel`]
//! holds at most one tween: starting a new one replaces whatever was in
//! flight. Timers are plain records polled by their owner instead of
//! callbacks, so no effect state hides inside a closure.
use hashbrown::HashMap;
use log::debug;

/// Animated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Camera zoom factor.
    Zoom,
    /// Camera pan progress from its previous framing to the current focus.
    Pan,
    /// Global gameplay time scale.
    TimeScale,
}

/// Easing curve applied to tween progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ease {
    /// Constant rate.
    #[default]
    Linear,
    /// Fast start, gentle landing.
    QuadOut,
    /// Gentle start and landing.
    QuadInOut,
}

impl Ease {
    /// Maps linear progress `t` in `[0, 1]` onto the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        let x = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => x,
            Self::QuadOut => 1.0 - (1.0 - x) * (1.0 - x),
            Self::QuadInOut => {
                if x < 0.5 {
                    2.0 * x * x
                } else {
                    1.0 - (-2.0 * x + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// A scalar animation from one value to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: f32,
    to: f32,
    duration: f32,
    elapsed: f32,
    ease: Ease,
}

impl Tween {
    /// Creates a tween that has not started advancing.
    #[must_use]
    pub const fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: 0.0,
            ease,
        }
    }

    /// Linear progress in `[0, 1]`; zero-length tweens are always complete.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Current eased value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.ease.apply(self.progress())
    }

    /// Whether the tween has reached its end value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }

    fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    id: TimerId,
    remaining: f32,
}

/// A channel value produced by [`Scheduler::advance`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Channel the value belongs to.
    pub channel: Channel,
    /// Eased value after the advance.
    pub value: f32,
}

/// Owns in-flight tweens and timers.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tweens: HashMap<Channel, Tween>,
    timers: Vec<Timer>,
    next_timer: u64,
}

impl Scheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts animating `channel`, replacing any tween already on it.
    pub fn animate(&mut self, channel: Channel, tween: Tween) {
        if self.tweens.insert(channel, tween).is_some() {
            debug!("replacing in-flight {channel:?} tween");
        }
    }

    /// Stops the tween on `channel`, leaving its last applied value.
    pub fn stop(&mut self, channel: Channel) {
        self.tweens.remove(&channel);
    }

    /// Whether `channel` has no tween in flight.
    #[must_use]
    pub fn is_idle(&self, channel: Channel) -> bool {
        !self.tweens.contains_key(&channel)
    }

    /// Schedules a timer that becomes due after `delay` seconds.
    pub fn after(&mut self, delay: f32) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.push(Timer {
            id,
            remaining: delay,
        });
        id
    }

    /// Cancels a pending timer; unknown handles are ignored.
    pub fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|timer| timer.id != id);
    }

    /// Consumes the timer if it is due, returning whether it was.
    ///
    /// A timer that is still pending, or that was already consumed or
    /// cancelled, yields `false`.
    pub fn take_due(&mut self, id: TimerId) -> bool {
        let due = self
            .timers
            .iter()
            .any(|timer| timer.id == id && timer.remaining <= 0.0);
        if due {
            self.cancel(id);
        }
        due
    }

    /// Advances everything by `dt` seconds of unscaled time.
    ///
    /// Returns the value of every tween that was in flight, ordered by
    /// channel. Tweens that complete are dropped after reporting their final
    /// value.
    pub fn advance(&mut self, dt: f32) -> Vec<Sample> {
        let mut samples: Vec<Sample> = self
            .tweens
            .iter_mut()
            .map(|(channel, tween)| {
                tween.advance(dt);
                Sample {
                    channel: *channel,
                    value: tween.value(),
                }
            })
            .collect();
        samples.sort_by_key(|sample| sample.channel);
        self.tweens.retain(|_, tween| !tween.is_complete());
        for timer in &mut self.timers {
            timer.remaining -= dt.max(0.0);
        }
        samples
    }

    /// Drops every tween and timer.
    pub fn clear(&mut self) {
        self.tweens.clear();
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::linear(Ease::Linear)]
    #[case::quad_out(Ease::QuadOut)]
    #[case::quad_in_out(Ease::QuadInOut)]
    fn easing_hits_both_endpoints(#[case] ease: Ease) {
        assert_relative_eq!(ease.apply(0.0), 0.0);
        assert_relative_eq!(ease.apply(1.0), 1.0);
        assert_relative_eq!(ease.apply(2.0), 1.0);
    }

    #[test]
    fn tween_reports_values_until_complete() {
        let mut scheduler = Scheduler::new();
        scheduler.animate(Channel::Zoom, Tween::new(1.0, 3.0, 1.0, Ease::Linear));

        let first = scheduler.advance(0.5);
        assert_eq!(first.len(), 1);
        assert_relative_eq!(first.first().map_or(0.0, |s| s.value), 2.0);
        assert!(!scheduler.is_idle(Channel::Zoom));

        let last = scheduler.advance(0.75);
        assert_relative_eq!(last.first().map_or(0.0, |s| s.value), 3.0);
        assert!(scheduler.is_idle(Channel::Zoom));
        assert!(scheduler.advance(0.1).is_empty());
    }

    #[test]
    fn newer_tween_on_a_channel_wins() {
        let mut scheduler = Scheduler::new();
        scheduler.animate(Channel::TimeScale, Tween::new(1.0, 0.2, 1.0, Ease::Linear));
        scheduler.animate(Channel::TimeScale, Tween::new(0.5, 1.0, 1.0, Ease::Linear));
        let samples = scheduler.advance(1.0);
        assert_eq!(
            samples,
            vec![Sample {
                channel: Channel::TimeScale,
                value: 1.0
            }]
        );
    }

    #[test]
    fn channels_animate_independently_in_order() {
        let mut scheduler = Scheduler::new();
        scheduler.animate(Channel::TimeScale, Tween::new(0.0, 1.0, 2.0, Ease::Linear));
        scheduler.animate(Channel::Zoom, Tween::new(0.0, 1.0, 1.0, Ease::Linear));
        let channels: Vec<Channel> = scheduler
            .advance(1.0)
            .into_iter()
            .map(|s| s.channel)
            .collect();
        assert_eq!(channels, vec![Channel::Zoom, Channel::TimeScale]);
        assert!(scheduler.is_idle(Channel::Zoom));
        assert!(!scheduler.is_idle(Channel::TimeScale));
    }

    #[test]
    fn zero_length_tween_completes_on_first_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.animate(Channel::Pan, Tween::new(0.0, 1.0, 0.0, Ease::QuadOut));
        let samples = scheduler.advance(0.0);
        assert_relative_eq!(samples.first().map_or(0.0, |s| s.value), 1.0);
        assert!(scheduler.is_idle(Channel::Pan));
    }

    #[test]
    fn timers_become_due_once() {
        let mut scheduler = Scheduler::new();
        let timer = scheduler.after(1.0);
        scheduler.advance(0.6);
        assert!(!scheduler.take_due(timer));
        scheduler.advance(0.6);
        assert!(scheduler.take_due(timer));
        assert!(!scheduler.take_due(timer));
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut scheduler = Scheduler::new();
        let timer = scheduler.after(0.1);
        scheduler.cancel(timer);
        scheduler.advance(1.0);
        assert!(!scheduler.take_due(timer));
    }
}
