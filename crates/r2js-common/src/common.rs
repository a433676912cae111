//! Common types shared by the filter pipeline, the printer and the facade.
//!
//! These live here (instead of in `r2js-emitter`) so that the AST crate and the
//! source map builder can refer to them without a dependency cycle.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Output language feature tier.
///
/// Tiers are numbered by edition year (`2009` is ES5, `2015` is ES6 and so on).
/// Short edition numbers are accepted on input (`5`, `6`, `11`) and normalized
/// to the year form; anything at or below 5 is treated as ES5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EsLevel(u16);

impl EsLevel {
    pub const ES5: Self = Self(2009);
    pub const ES2015: Self = Self(2015);
    pub const ES2016: Self = Self(2016);
    pub const ES2017: Self = Self(2017);
    pub const ES2018: Self = Self(2018);
    pub const ES2019: Self = Self(2019);
    pub const ES2020: Self = Self(2020);
    pub const ES2021: Self = Self(2021);
    pub const ES2022: Self = Self(2022);

    /// Newest tier the printer knows about.
    pub const LATEST: Self = Self::ES2022;

    /// Normalize an edition number or year into a tier.
    ///
    /// `0..=5` → ES5, `6..=13` → 2015..=2022, years are clamped to the known range.
    pub fn from_number(value: u32) -> Self {
        match value {
            0..=5 => Self::ES5,
            6..=13 => Self(2009 + value as u16),
            2009..=2014 => Self::ES5,
            year if year >= 2015 => Self(year.min(u32::from(Self::LATEST.0)) as u16),
            _ => Self::ES5,
        }
    }

    /// The edition year, e.g. `2015`.
    pub const fn year(self) -> u16 {
        self.0
    }

    /// Whether constructs introduced in `required` may be emitted at this tier.
    pub fn supports(self, required: EsLevel) -> bool {
        self >= required
    }
}

impl Default for EsLevel {
    fn default() -> Self {
        Self::ES5
    }
}

impl fmt::Display for EsLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ES5 {
            f.write_str("ES5")
        } else {
            write!(f, "ES{}", self.0)
        }
    }
}

impl<'de> Deserialize<'de> for EsLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u32::deserialize(deserializer)?;
        Ok(Self::from_number(value))
    }
}

/// How Ruby `==` / `!=` are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// `==` / `!=`
    #[default]
    Loose,
    /// `===` / `!==`
    Strict,
    /// `Object.is(a, b)` / `!Object.is(a, b)`
    Identity,
}

/// How Ruby `||` / `or` (and `||=`) are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOperator {
    /// `||`
    #[default]
    Logical,
    /// `??`
    Nullish,
}

impl LogicalOperator {
    pub const fn token(self) -> &'static str {
        match self {
            LogicalOperator::Logical => "||",
            LogicalOperator::Nullish => "??",
        }
    }
}
