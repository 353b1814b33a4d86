use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DioramaError;

/// Easing function for tween interpolation.
///
/// `EaseIn`/`EaseOut`/`EaseInOut` are the quadratic curves. Every curve maps
/// 0 to 0 and 1 to 1 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Linear
    }
}

/// Curve family, ordered by polynomial degree.
#[derive(Clone, Copy)]
enum Family {
    Quad,
    Cubic,
    Quart,
    Quint,
}

#[derive(Clone, Copy)]
enum Mode {
    In,
    Out,
    InOut,
}

impl Easing {
    pub const ALL: [Easing; 13] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::QuartIn,
        Easing::QuartOut,
        Easing::QuartInOut,
        Easing::QuintIn,
        Easing::QuintOut,
        Easing::QuintInOut,
    ];

    /// Apply the easing function to a normalized progress value t in [0, 1].
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => {
                let t1 = t - 1.0;
                t1 * t1 * t1 + 1.0
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let t1 = 2.0 * t - 2.0;
                    0.5 * t1 * t1 * t1 + 1.0
                }
            }
            Easing::QuartIn => t.powi(4),
            Easing::QuartOut => 1.0 - (1.0 - t).powi(4),
            Easing::QuartInOut => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (2.0 - 2.0 * t).powi(4) / 2.0
                }
            }
            Easing::QuintIn => t.powi(5),
            Easing::QuintOut => 1.0 - (1.0 - t).powi(5),
            Easing::QuintInOut => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (2.0 - 2.0 * t).powi(5) / 2.0
                }
            }
        }
    }

    /// Canonical snake_case name, as written to config files.
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease_in",
            Easing::EaseOut => "ease_out",
            Easing::EaseInOut => "ease_in_out",
            Easing::CubicIn => "cubic_in",
            Easing::CubicOut => "cubic_out",
            Easing::CubicInOut => "cubic_in_out",
            Easing::QuartIn => "quart_in",
            Easing::QuartOut => "quart_out",
            Easing::QuartInOut => "quart_in_out",
            Easing::QuintIn => "quint_in",
            Easing::QuintOut => "quint_out",
            Easing::QuintInOut => "quint_in_out",
        }
    }

    fn from_parts(family: Family, mode: Mode) -> Easing {
        match (family, mode) {
            (Family::Quad, Mode::In) => Easing::EaseIn,
            (Family::Quad, Mode::Out) => Easing::EaseOut,
            (Family::Quad, Mode::InOut) => Easing::EaseInOut,
            (Family::Cubic, Mode::In) => Easing::CubicIn,
            (Family::Cubic, Mode::Out) => Easing::CubicOut,
            (Family::Cubic, Mode::InOut) => Easing::CubicInOut,
            (Family::Quart, Mode::In) => Easing::QuartIn,
            (Family::Quart, Mode::Out) => Easing::QuartOut,
            (Family::Quart, Mode::InOut) => Easing::QuartInOut,
            (Family::Quint, Mode::In) => Easing::QuintIn,
            (Family::Quint, Mode::Out) => Easing::QuintOut,
            (Family::Quint, Mode::InOut) => Easing::QuintInOut,
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses both canonical names (`cubic_in_out`) and tweening-library style
/// names (`power2.inOut`, `quint.inOut`). A bare family such as `power2`
/// means its `out` variant.
impl FromStr for Easing {
    type Err = DioramaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if let Some(easing) = Easing::ALL.iter().find(|e| e.name() == normalized) {
            return Ok(*easing);
        }
        if matches!(normalized.as_str(), "none" | "power0" | "power0.none" | "linear.none") {
            return Ok(Easing::Linear);
        }

        let (family, mode) = match normalized.split_once('.') {
            Some((family, mode)) => (family, mode),
            None => (normalized.as_str(), "out"),
        };
        let family = match family {
            "power1" | "quad" => Family::Quad,
            "power2" | "cubic" => Family::Cubic,
            "power3" | "quart" => Family::Quart,
            "power4" | "quint" | "strong" => Family::Quint,
            _ => return Err(DioramaError::Config(format!("unknown easing '{}'", s))),
        };
        let mode = match mode {
            "in" => Mode::In,
            "out" => Mode::Out,
            "inout" | "in_out" => Mode::InOut,
            _ => return Err(DioramaError::Config(format!("unknown easing '{}'", s))),
        };
        Ok(Easing::from_parts(family, mode))
    }
}

impl TryFrom<String> for Easing {
    type Error = DioramaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Easing> for String {
    fn from(e: Easing) -> String {
        e.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_linear() {
        let e = Easing::Linear;
        assert!((e.apply(0.0)).abs() < 0.001);
        assert!((e.apply(0.5) - 0.5).abs() < 0.001);
        assert!((e.apply(1.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_easing_ease_in() {
        let e = Easing::EaseIn;
        assert!(e.apply(0.5) < 0.5); // slower at start
    }

    #[test]
    fn test_easing_ease_out() {
        let e = Easing::EaseOut;
        assert!(e.apply(0.5) > 0.5); // faster at start
    }

    #[test]
    fn test_easing_boundaries_are_exact() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{:?} should start at 0", easing);
            assert_eq!(easing.apply(1.0), 1.0, "{:?} should end at 1", easing);
        }
    }

    #[test]
    fn test_in_out_curves_are_symmetric() {
        for easing in [
            Easing::EaseInOut,
            Easing::CubicInOut,
            Easing::QuartInOut,
            Easing::QuintInOut,
        ] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-9, "{:?}", easing);
            let lo = easing.apply(0.2);
            let hi = easing.apply(0.8);
            assert!((lo + hi - 1.0).abs() < 1e-9, "{:?}", easing);
        }
    }

    #[test]
    fn test_easing_is_monotonic() {
        for easing in Easing::ALL {
            let mut prev = 0.0;
            for i in 1..=100 {
                let v = easing.apply(i as f64 / 100.0);
                assert!(v >= prev - 1e-12, "{:?} decreased at step {}", easing, i);
                prev = v;
            }
        }
    }

    #[test]
    fn test_quint_is_more_pronounced_than_cubic() {
        assert!(Easing::QuintInOut.apply(0.2) < Easing::CubicInOut.apply(0.2));
    }

    #[test]
    fn test_easing_clamps_input() {
        assert_eq!(Easing::CubicIn.apply(-3.0), 0.0);
        assert_eq!(Easing::CubicIn.apply(7.0), 1.0);
    }

    #[test]
    fn test_parse_library_style_names() {
        assert_eq!("power2.inOut".parse::<Easing>().unwrap(), Easing::CubicInOut);
        assert_eq!("quint.inOut".parse::<Easing>().unwrap(), Easing::QuintInOut);
        assert_eq!("power1.in".parse::<Easing>().unwrap(), Easing::EaseIn);
        assert_eq!("power3".parse::<Easing>().unwrap(), Easing::QuartOut);
        assert_eq!("none".parse::<Easing>().unwrap(), Easing::Linear);
    }

    #[test]
    fn test_parse_canonical_names() {
        for easing in Easing::ALL {
            assert_eq!(easing.name().parse::<Easing>().unwrap(), easing);
        }
        assert!("bounce.out".parse::<Easing>().is_err());
        assert!("power2.sideways".parse::<Easing>().is_err());
    }

    #[test]
    fn test_easing_serde_uses_names() {
        let json = serde_json::to_string(&Easing::QuintInOut).unwrap();
        assert_eq!(json, "\"quint_in_out\"");
        let parsed: Easing = serde_json::from_str("\"power2.inOut\"").unwrap();
        assert_eq!(parsed, Easing::CubicInOut);
    }
}
