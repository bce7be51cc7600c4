use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Insider roles the screener can filter on.
///
/// Declaration order is the canonical order used for fetch keys and
/// for iterating a title set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobTitle {
    #[serde(rename = "COB")]
    ChairmanOfTheBoard,
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "Pres")]
    President,
    #[serde(rename = "COO")]
    Coo,
    #[serde(rename = "CFO")]
    Cfo,
    #[serde(rename = "GC")]
    GeneralCounsel,
    #[serde(rename = "VP")]
    VicePresident,
    #[serde(rename = "Director")]
    Director,
    #[serde(rename = "10% Owner")]
    TenPercentOwner,
    #[serde(rename = "Other")]
    Other,
}

impl JobTitle {
    pub const ALL: [JobTitle; 10] = [
        JobTitle::ChairmanOfTheBoard,
        JobTitle::Ceo,
        JobTitle::President,
        JobTitle::Coo,
        JobTitle::Cfo,
        JobTitle::GeneralCounsel,
        JobTitle::VicePresident,
        JobTitle::Director,
        JobTitle::TenPercentOwner,
        JobTitle::Other,
    ];

    /// Short code accepted from callers (e.g. `"CEO"`, `"10% Owner"`).
    pub fn code(&self) -> &'static str {
        match self {
            JobTitle::ChairmanOfTheBoard => "COB",
            JobTitle::Ceo => "CEO",
            JobTitle::President => "Pres",
            JobTitle::Coo => "COO",
            JobTitle::Cfo => "CFO",
            JobTitle::GeneralCounsel => "GC",
            JobTitle::VicePresident => "VP",
            JobTitle::Director => "Director",
            JobTitle::TenPercentOwner => "10% Owner",
            JobTitle::Other => "Other",
        }
    }

    /// Screener request flag enabling this title.
    pub fn request_flag(&self) -> &'static str {
        match self {
            JobTitle::ChairmanOfTheBoard => "iscob",
            JobTitle::Ceo => "isceo",
            JobTitle::President => "ispres",
            JobTitle::Coo => "iscoo",
            JobTitle::Cfo => "iscfo",
            JobTitle::GeneralCounsel => "isgc",
            JobTitle::VicePresident => "isvp",
            JobTitle::Director => "isdirector",
            JobTitle::TenPercentOwner => "istenpercent",
            JobTitle::Other => "isother",
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(JobTitle::code).collect()
    }
}

impl fmt::Display for JobTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for JobTitle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| format!("unknown job title: {s}"))
    }
}

/// SEC Form 4 transaction codes reported by the screener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TradeType {
    P,
    S,
    A,
    D,
    G,
    F,
    M,
    X,
    C,
    W,
}

/// Which way shares moved for the insider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Acquired,
    Disposed,
}

impl TradeType {
    pub const ALL: [TradeType; 10] = [
        TradeType::P,
        TradeType::S,
        TradeType::A,
        TradeType::D,
        TradeType::G,
        TradeType::F,
        TradeType::M,
        TradeType::X,
        TradeType::C,
        TradeType::W,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TradeType::P => "P",
            TradeType::S => "S",
            TradeType::A => "A",
            TradeType::D => "D",
            TradeType::G => "G",
            TradeType::F => "F",
            TradeType::M => "M",
            TradeType::X => "X",
            TradeType::C => "C",
            TradeType::W => "W",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TradeType::P => "Purchase",
            TradeType::S => "Sale",
            TradeType::A => "Grant",
            TradeType::D => "Sale to Issuer",
            TradeType::G => "Gift",
            TradeType::F => "Tax",
            TradeType::M | TradeType::X => "Option Exercise",
            TradeType::C => "Convertible Derivative",
            TradeType::W => "Inherited",
        }
    }

    /// Open-market purchases and sales have a fixed direction; the other
    /// codes can go either way depending on the filing.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            TradeType::P => Some(Direction::Acquired),
            TradeType::S => Some(Direction::Disposed),
            _ => None,
        }
    }

    pub fn codes() -> Vec<&'static str> {
        Self::ALL.iter().map(TradeType::code).collect()
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TradeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == s)
            .ok_or_else(|| format!("unknown trade type: {s}"))
    }
}

/// Categorical filing flags from the screener's `X` column
/// (any combination of `A`, `D`, `E`, `M`, or empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilingType(String);

impl FilingType {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_amended(&self) -> bool {
        self.0.contains('A')
    }

    /// Derivative transaction in the filing, usually an option exercise.
    pub fn is_derivative(&self) -> bool {
        self.0.contains('D')
    }

    pub fn error_detected(&self) -> bool {
        self.0.contains('E')
    }

    /// Multiple transactions: earliest trade date and weighted average price.
    pub fn has_multiple_transactions(&self) -> bool {
        self.0.contains('M')
    }
}
