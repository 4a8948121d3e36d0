use anyhow::Result;
use serde::{Deserialize, Serialize};

/// What happens to virtual time while the animation is paused.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Pausing jumps back to the start of the loop, and time stays pinned at 0 until playback
    /// resumes.
    #[default]
    ResetToStart,
    /// Pausing freezes time where it is.
    HoldPosition,
}

/// Virtual time for the animation, advanced by real elapsed time and wrapping around every
/// `loop_length` units. Independent of the frame rate.
#[derive(Clone, Debug)]
pub struct Clock {
    // Always in [0, loop_length)
    time: f64,
    playing: bool,
    loop_length: f64,
    /// Virtual time units per real millisecond
    speed: f64,
    pause_policy: PausePolicy,
    // Timestamp of the previous frame, in real milliseconds. None right after (re)starting.
    last_frame: Option<f64>,
}

impl Clock {
    pub fn new(loop_length: f64, speed: f64) -> Result<Self> {
        if !loop_length.is_finite() || loop_length <= 0.0 {
            bail!("loop_length must be positive, not {}", loop_length);
        }
        check_speed(speed)?;
        Ok(Self {
            time: 0.0,
            playing: true,
            loop_length,
            speed,
            pause_policy: PausePolicy::default(),
            last_frame: None,
        })
    }

    pub fn with_pause_policy(mut self, pause_policy: PausePolicy) -> Self {
        self.pause_policy = pause_policy;
        self
    }

    /// Advances by `elapsed_ms` of real time and returns the new virtual time. Zero, negative, or
    /// non-finite elapsed times don't advance anything.
    pub fn tick(&mut self, elapsed_ms: f64) -> f64 {
        if !self.playing {
            if self.pause_policy == PausePolicy::ResetToStart {
                self.time = 0.0;
            }
            return self.time;
        }
        if !elapsed_ms.is_finite() || elapsed_ms < 0.0 {
            warn!("Ignoring bogus elapsed time {}ms", elapsed_ms);
            return self.time;
        }
        let advanced = self.time + elapsed_ms * self.speed;
        if !advanced.is_finite() {
            warn!(
                "Advancing {}ms at speed {} overflows; holding time at {}",
                elapsed_ms, self.speed, self.time
            );
            return self.time;
        }
        self.time = wrap(advanced, self.loop_length);
        self.time
    }

    /// Called once per rendered frame with the frame's timestamp in real milliseconds. The first
    /// frame after creating or restarting the clock has nothing to measure against, so it doesn't
    /// advance time.
    pub fn on_frame(&mut self, now_ms: f64) -> f64 {
        let prev = self.last_frame.replace(now_ms);
        match prev {
            Some(prev) => self.tick(now_ms - prev),
            None => self.time,
        }
    }

    /// Forget the previous frame, like when the animation surface is torn down and rebuilt
    pub fn restart(&mut self) {
        self.last_frame = None;
    }

    pub fn now(&self) -> f64 {
        self.time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        if self.pause_policy == PausePolicy::ResetToStart {
            self.time = 0.0;
        }
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jumps to any time; it's wrapped into the loop
    pub fn seek(&mut self, time: f64) {
        if time.is_finite() {
            self.time = wrap(time, self.loop_length);
        }
    }

    /// Jump forwards (or backwards, if negative) by some virtual time
    pub fn step(&mut self, dt: f64) {
        self.seek(self.time + dt);
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        check_speed(speed)?;
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn loop_length(&self) -> f64 {
        self.loop_length
    }

    pub fn pause_policy(&self) -> PausePolicy {
        self.pause_policy
    }
}

fn check_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed < 0.0 {
        bail!("animation speed must be non-negative, not {}", speed);
    }
    Ok(())
}

fn wrap(time: f64, loop_length: f64) -> f64 {
    let wrapped = time.rem_euclid(loop_length);
    // rem_euclid can round up to exactly loop_length for tiny negative inputs
    if wrapped >= loop_length {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn bad_config() {
        assert!(Clock::new(0.0, 1.0).is_err());
        assert!(Clock::new(-5.0, 1.0).is_err());
        assert!(Clock::new(f64::INFINITY, 1.0).is_err());
        assert!(Clock::new(100.0, -1.0).is_err());
        assert!(Clock::new(100.0, f64::NAN).is_err());
        assert!(Clock::new(100.0, 0.0).is_ok());
    }

    #[test]
    fn advances_and_wraps() {
        let mut clock = Clock::new(1000.0, 60.0).unwrap();
        assert_eq!(clock.tick(10.0), 600.0);
        assert_eq!(clock.tick(5.0), 900.0);
        // 900 + 300 wraps around
        assert_eq!(clock.tick(5.0), 200.0);
    }

    #[test]
    fn exact_wrap() {
        let mut clock = Clock::new(100.0, 1.0).unwrap();
        clock.tick(40.0);
        assert_eq!(clock.tick(60.0), 0.0);
    }

    #[test]
    fn pause_resets_to_start() {
        let mut clock = Clock::new(1000.0, 1.0).unwrap();
        clock.tick(250.0);
        clock.pause();
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.tick(100.0), 0.0);
        clock.play();
        assert_eq!(clock.tick(100.0), 100.0);
    }

    #[test]
    fn pause_can_hold_position() {
        let mut clock = Clock::new(1000.0, 1.0)
            .unwrap()
            .with_pause_policy(PausePolicy::HoldPosition);
        clock.tick(250.0);
        clock.toggle();
        assert!(!clock.is_playing());
        assert_eq!(clock.tick(100.0), 250.0);
        clock.toggle();
        assert_eq!(clock.tick(100.0), 350.0);
    }

    #[test]
    fn bogus_elapsed_times() {
        let mut clock = Clock::new(1000.0, 1.0).unwrap();
        clock.tick(10.0);
        assert_eq!(clock.tick(-5.0), 10.0);
        assert_eq!(clock.tick(f64::NAN), 10.0);
        assert_eq!(clock.tick(f64::INFINITY), 10.0);
    }

    #[test]
    fn overflow_holds_time() {
        let mut clock = Clock::new(100.0, 1e300).unwrap();
        assert_eq!(clock.tick(1e10), 0.0);
        let next = clock.tick(1.0);
        assert!(next >= 0.0 && next < 100.0);

        clock.seek(30.0);
        clock.step(f64::MAX);
        clock.step(f64::MAX);
        assert!(clock.now() >= 0.0 && clock.now() < 100.0);
    }

    #[test]
    fn first_frame_does_not_advance() {
        let mut clock = Clock::new(1_000_000.0, 60.0).unwrap();
        // Huge timestamp on the first frame; nothing to diff against
        assert_eq!(clock.on_frame(123_456.0), 0.0);
        assert_eq!(clock.on_frame(123_466.0), 600.0);

        clock.restart();
        assert_eq!(clock.on_frame(999_999.0), 600.0);
        assert_eq!(clock.on_frame(1_000_000.0), 660.0);
    }

    #[test]
    fn seek_and_step() {
        let mut clock = Clock::new(100.0, 1.0).unwrap();
        clock.seek(250.0);
        assert_eq!(clock.now(), 50.0);
        clock.step(-60.0);
        assert_eq!(clock.now(), 90.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.now(), 90.0);
        clock.reset();
        assert_eq!(clock.now(), 0.0);
        assert!(clock.set_speed(-1.0).is_err());
        assert_eq!(clock.speed(), 1.0);
    }

    proptest! {
        #[test]
        fn playing_time_only_moves_forwards_or_wraps(
            loop_length in 1.0f64..1e7,
            speed in 0.0f64..1000.0,
            steps in prop::collection::vec(0.0f64..1000.0, 1..50),
        ) {
            let mut clock = Clock::new(loop_length, speed).unwrap();
            for elapsed in steps {
                let prev = clock.now();
                let next = clock.tick(elapsed);
                prop_assert!(next >= 0.0 && next < loop_length);
                let advanced = prev + elapsed * speed;
                if advanced < loop_length {
                    prop_assert_eq!(next, advanced);
                } else {
                    prop_assert!(next < prev || next <= advanced - loop_length + 1e-6 * loop_length);
                }
            }
        }

        #[test]
        fn paused_time_is_always_zero(
            steps in prop::collection::vec(-1000.0f64..1000.0, 1..50),
        ) {
            let mut clock = Clock::new(500.0, 3.0).unwrap();
            clock.tick(10.0);
            clock.pause();
            for elapsed in steps {
                prop_assert_eq!(clock.tick(elapsed), 0.0);
            }
        }

        #[test]
        fn zero_elapsed_is_idempotent(start in 0.0f64..1000.0, repeats in 1usize..20) {
            let mut clock = Clock::new(1000.0, 1.0).unwrap();
            clock.seek(start);
            let before = clock.now();
            for _ in 0..repeats {
                prop_assert_eq!(clock.tick(0.0), before);
            }
        }
    }
}
