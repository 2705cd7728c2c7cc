//! Timing functions
//!
//! A [`TimingFunction`] maps time elapsed since an operation's delay window
//! closed to a value between the operation's endpoints. The engine only ever
//! samples it inside `[0, duration)`; the terminal sample is pinned to the end
//! value without consulting the curve.
//!
//! [`Easing`] is the stock set of normalized curves. Any closure with the
//! signature `Fn(Seconds, &T, &T, Seconds) -> T` is also a timing function.

use crate::error::TweenError;
use crate::value::Tweenable;
use crate::Seconds;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Maps elapsed time to an interpolated value
pub trait TimingFunction<T>: Send + Sync {
    /// Evaluate the curve `elapsed` seconds into a `duration`-long window
    fn evaluate(&self, elapsed: Seconds, start: &T, end: &T, duration: Seconds) -> T;
}

impl<T, F> TimingFunction<T> for F
where
    F: Fn(Seconds, &T, &T, Seconds) -> T + Send + Sync,
{
    fn evaluate(&self, elapsed: Seconds, start: &T, end: &T, duration: Seconds) -> T {
        self(elapsed, start, end, duration)
    }
}

/// Standard easing curves
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInBounce,
    EaseOutBounce,
    CubicBezier(f64, f64, f64, f64),
}

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;

impl Easing {
    /// Every named curve, in display order
    pub const NAMED: &'static [Easing] = &[
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInCirc,
        Easing::EaseOutCirc,
        Easing::EaseInOutCirc,
        Easing::EaseInBack,
        Easing::EaseOutBack,
        Easing::EaseInOutBack,
        Easing::EaseInElastic,
        Easing::EaseOutElastic,
        Easing::EaseInBounce,
        Easing::EaseOutBounce,
    ];

    /// Apply the curve to normalized progress `t` (0.0 to 1.0)
    pub fn apply(&self, t: f64) -> f64 {
        match *self {
            Easing::Linear => t,
            Easing::EaseIn | Easing::EaseInCubic => t * t * t,
            Easing::EaseOut | Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut | Easing::EaseInOutCubic => in_out(t, |t| 4.0 * t * t * t, 3),
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => in_out(t, |t| 2.0 * t * t, 2),
            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => in_out(t, |t| 8.0 * t.powi(4), 4),
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => in_out(t, |t| 16.0 * t.powi(5), 5),
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Easing::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Easing::EaseInOutExpo => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::EaseInCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::EaseInOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }
            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
            Easing::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Easing::EaseInElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::EaseOutElastic => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else {
                    2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Easing::EaseOutBounce => bounce_out(t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, x1, y1, x2, y2),
        }
    }

    /// Kebab-case name, or `None` for parameterized curves
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::EaseInQuad => "ease-in-quad",
            Easing::EaseOutQuad => "ease-out-quad",
            Easing::EaseInOutQuad => "ease-in-out-quad",
            Easing::EaseInCubic => "ease-in-cubic",
            Easing::EaseOutCubic => "ease-out-cubic",
            Easing::EaseInOutCubic => "ease-in-out-cubic",
            Easing::EaseInQuart => "ease-in-quart",
            Easing::EaseOutQuart => "ease-out-quart",
            Easing::EaseInOutQuart => "ease-in-out-quart",
            Easing::EaseInQuint => "ease-in-quint",
            Easing::EaseOutQuint => "ease-out-quint",
            Easing::EaseInOutQuint => "ease-in-out-quint",
            Easing::EaseInSine => "ease-in-sine",
            Easing::EaseOutSine => "ease-out-sine",
            Easing::EaseInOutSine => "ease-in-out-sine",
            Easing::EaseInExpo => "ease-in-expo",
            Easing::EaseOutExpo => "ease-out-expo",
            Easing::EaseInOutExpo => "ease-in-out-expo",
            Easing::EaseInCirc => "ease-in-circ",
            Easing::EaseOutCirc => "ease-out-circ",
            Easing::EaseInOutCirc => "ease-in-out-circ",
            Easing::EaseInBack => "ease-in-back",
            Easing::EaseOutBack => "ease-out-back",
            Easing::EaseInOutBack => "ease-in-out-back",
            Easing::EaseInElastic => "ease-in-elastic",
            Easing::EaseOutElastic => "ease-out-elastic",
            Easing::EaseInBounce => "ease-in-bounce",
            Easing::EaseOutBounce => "ease-out-bounce",
            Easing::CubicBezier(..) => return None,
        };
        Some(name)
    }
}

impl<T: Tweenable> TimingFunction<T> for Easing {
    fn evaluate(&self, elapsed: Seconds, start: &T, end: &T, duration: Seconds) -> T {
        start.lerp(end, self.apply(elapsed / duration))
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, Easing::CubicBezier(x1, y1, x2, y2)) => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            (None, other) => write!(f, "{other:?}"),
        }
    }
}

impl FromStr for Easing {
    type Err = TweenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Easing::NAMED
            .iter()
            .copied()
            .find(|easing| easing.name() == Some(wanted.as_str()))
            .or_else(|| parse_cubic_bezier(&wanted))
            .ok_or_else(|| TweenError::UnknownEasing(s.to_string()))
    }
}

/// Mirror an ease-in half into a symmetric in-out curve of the given power
#[inline]
fn in_out(t: f64, ease_in: impl Fn(f64) -> f64, power: i32) -> f64 {
    if t < 0.5 {
        ease_in(t)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

fn bounce_out(t: f64) -> f64 {
    const N1: f64 = 7.5625;
    const D1: f64 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// CSS-style cubic bezier with implicit endpoints (0,0) and (1,1)
///
/// Solves x(p) = t with Newton-Raphson, falling back to bisection when the
/// slope flattens out.
fn cubic_bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = BezierAxis::new(x1, x2);
    let y = BezierAxis::new(y1, y2);

    let mut p = t;
    for _ in 0..8 {
        let err = x.at(p) - t;
        if err.abs() < 1e-7 {
            return y.at(p);
        }
        let slope = x.slope(p);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    p = t;
    for _ in 0..32 {
        let xp = x.at(p);
        if (xp - t).abs() < 1e-7 {
            break;
        }
        if xp < t {
            lo = p;
        } else {
            hi = p;
        }
        p = (lo + hi) * 0.5;
    }

    y.at(p)
}

/// One axis of a bezier whose end points are pinned at 0 and 1
///
/// Expanding the Bernstein form `3(1-p)^2 p c1 + 3(1-p) p^2 c2 + p^3` gives
/// the power-basis polynomial `k3 p^3 + k2 p^2 + k1 p`.
struct BezierAxis {
    k1: f64,
    k2: f64,
    k3: f64,
}

impl BezierAxis {
    fn new(c1: f64, c2: f64) -> Self {
        Self {
            k1: 3.0 * c1,
            k2: 3.0 * (c2 - 2.0 * c1),
            k3: 1.0 + 3.0 * (c1 - c2),
        }
    }

    #[inline]
    fn at(&self, p: f64) -> f64 {
        p * (self.k1 + p * (self.k2 + p * self.k3))
    }

    /// d/dp of [`at`](Self::at)
    #[inline]
    fn slope(&self, p: f64) -> f64 {
        self.k1 + p * (2.0 * self.k2 + p * 3.0 * self.k3)
    }
}

/// Parse `cubic-bezier(x1, y1, x2, y2)`; x coordinates must lie in [0, 1]
fn parse_cubic_bezier(s: &str) -> Option<Easing> {
    let args = s
        .strip_prefix("cubic-bezier(")?
        .strip_suffix(')')?;
    let values = args
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    let [x1, y1, x2, y2] = values[..] else {
        return None;
    };
    let in_unit = |x: f64| (0.0..=1.0).contains(&x);
    (in_unit(x1) && in_unit(x2)).then_some(Easing::CubicBezier(x1, y1, x2, y2))
}
