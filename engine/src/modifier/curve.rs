/// How a [`Curve`] is sampled outside of its keyframe range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrap {
    /// Hold the first/last value.
    #[default]
    Clamp,
    /// Restart from the beginning.
    Loop,
    /// Run backwards to the start, then forwards again.
    PingPong,
}

impl Wrap {
    /// Map `t` into `[start, end]`.
    pub fn apply(self, t: f32, start: f32, end: f32) -> f32 {
        let length = end - start;
        if length <= 0.0 {
            return start;
        }
        match self {
            Wrap::Clamp => t.clamp(start, end),
            Wrap::Loop => {
                let cyclic = (t - start).rem_euclid(length);
                // land on the end instead of the start when a whole number of cycles has passed
                if t != start && cyclic == 0.0 {
                    end
                } else {
                    start + cyclic
                }
            }
            Wrap::PingPong => {
                let cyclic = (t - start).rem_euclid(length * 2.0);
                if cyclic > length {
                    start + length * 2.0 - cyclic
                } else {
                    start + cyclic
                }
            }
        }
    }
}

/// A scalar keyframe curve with linear interpolation.
///
/// Keys are `(time, value)` pairs, times in seconds, kept sorted by time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    keys: Vec<(f32, f32)>,
}

impl Curve {
    /// Build a curve from keys in any order. Keys with a non-finite time are dropped.
    pub fn new(keys: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<_> = keys.into_iter().filter(|(time, _)| time.is_finite()).collect();
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn constant(value: f32) -> Self {
        Self::new([(0.0, value)])
    }

    /// A straight ramp from `from` to `to` over `duration` seconds.
    pub fn linear(from: f32, to: f32, duration: f32) -> Self {
        Self::new([(0.0, from), (duration.max(0.0), to)])
    }

    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    pub fn start(&self) -> f32 {
        self.keys.first().map_or(0.0, |key| key.0)
    }

    pub fn end(&self) -> f32 {
        self.keys.last().map_or(0.0, |key| key.0)
    }

    /// Time between the first and the last key.
    pub fn duration(&self) -> f32 {
        self.end() - self.start()
    }

    /// Value at `t`, holding the end values outside the key range. An empty curve is `0`.
    pub fn sample(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return 0.0;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        // first key strictly after t; both neighbours exist because t is inside the range
        let next = self.keys.partition_point(|key| key.0 <= t);
        let (t0, v0) = self.keys[next - 1];
        let (t1, v1) = self.keys[next];
        let span = t1 - t0;
        if span <= f32::EPSILON {
            return v1;
        }
        v0 + (v1 - v0) * ((t - t0) / span)
    }

    /// Value at `t` after mapping it into the key range with `wrap`.
    pub fn sample_wrapped(&self, t: f32, wrap: Wrap) -> f32 {
        self.sample(wrap.apply(t, self.start(), self.end()))
    }
}
