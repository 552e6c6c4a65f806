//! Case-count stratification: sex, age interval, and the composite cell key.

use crate::TypeError;
use std::fmt;
use std::str::FromStr;

/// Sex stratum of a case count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    /// Both strata in display order (male first).
    pub const ALL: [Sex; 2] = [Sex::M, Sex::F];

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
        }
    }

    /// Position within [`Sex::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Long-form label used by chart legends.
    pub fn label(self) -> &'static str {
        match self {
            Sex::M => "Male",
            Sex::F => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Sex::M),
            "F" => Ok(Sex::F),
            other => Err(TypeError::InvalidSex(other.to_string())),
        }
    }
}

crate::string_serde!(Sex, "M or F");

/// Age interval of a case count.
///
/// The variant order is the column order of every report grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeInterval {
    Under1,
    From2To4,
    From5To9,
    From10To14,
    From15To19,
    From20To44,
    From45To64,
    From65,
}

impl AgeInterval {
    /// Every interval, in column order.
    pub const ALL: [AgeInterval; 8] = [
        AgeInterval::Under1,
        AgeInterval::From2To4,
        AgeInterval::From5To9,
        AgeInterval::From10To14,
        AgeInterval::From15To19,
        AgeInterval::From20To44,
        AgeInterval::From45To64,
        AgeInterval::From65,
    ];

    /// Position within [`AgeInterval::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire identifier, as embedded in count keys (`M_0_1`).
    pub fn as_str(self) -> &'static str {
        match self {
            AgeInterval::Under1 => "0_1",
            AgeInterval::From2To4 => "2_4",
            AgeInterval::From5To9 => "5_9",
            AgeInterval::From10To14 => "10_14",
            AgeInterval::From15To19 => "15_19",
            AgeInterval::From20To44 => "20_44",
            AgeInterval::From45To64 => "45_64",
            AgeInterval::From65 => "65_plus",
        }
    }

    /// Column header label: `0-1`, `20-44`, `65+`.
    pub fn label(self) -> &'static str {
        match self {
            AgeInterval::Under1 => "0-1",
            AgeInterval::From2To4 => "2-4",
            AgeInterval::From5To9 => "5-9",
            AgeInterval::From10To14 => "10-14",
            AgeInterval::From15To19 => "15-19",
            AgeInterval::From20To44 => "20-44",
            AgeInterval::From45To64 => "45-64",
            AgeInterval::From65 => "65+",
        }
    }
}

impl fmt::Display for AgeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeInterval {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == s)
            .ok_or_else(|| TypeError::InvalidAgeInterval(s.to_string()))
    }
}

crate::string_serde!(AgeInterval, "an age interval such as 0_1 or 65_plus");

/// Address of a single count within one location: a (sex, age interval) pair.
///
/// Serialises as the backend's `{sex}_{interval}` key, e.g. `M_0_1` or `F_65_plus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountKey {
    pub sex: Sex,
    pub interval: AgeInterval,
}

impl CountKey {
    pub const fn new(sex: Sex, interval: AgeInterval) -> Self {
        Self { sex, interval }
    }

    /// Number of distinct keys.
    pub const COUNT: usize = AgeInterval::ALL.len() * Sex::ALL.len();

    /// Dense position of this key, consistent with [`CountKey::all`].
    pub fn index(self) -> usize {
        self.interval.index() * Sex::ALL.len() + self.sex.index()
    }

    /// Every key: for each interval in column order, male then female.
    pub fn all() -> impl Iterator<Item = CountKey> {
        AgeInterval::ALL
            .into_iter()
            .flat_map(|interval| Sex::ALL.into_iter().map(move |sex| CountKey::new(sex, interval)))
    }
}

impl fmt::Display for CountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.sex, self.interval)
    }
}

impl FromStr for CountKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypeError::InvalidCountKey(s.to_string());
        let (sex, interval) = s.split_once('_').ok_or_else(invalid)?;
        Ok(CountKey {
            sex: sex.parse().map_err(|_| invalid())?,
            interval: interval.parse().map_err(|_| invalid())?,
        })
    }
}

crate::string_serde!(CountKey, "a count key such as M_0_1");
