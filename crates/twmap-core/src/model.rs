//! Map entities shared by the parser, the store and the route planners.
//!
//! Sectors are plain integers. Ports carry a three letter class code over
//! `B` (the port buys) and `S` (the port sells) for fuel ore, organics and
//! equipment, in that order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A node in the game's location graph.
pub type SectorId = u32;

/// Errors raised when decoding class codes and patterns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid port class '{0}': expected three of B/S, e.g. \"SBB\"")]
    InvalidPortClass(String),

    #[error("invalid class pattern '{0}': expected three of B/S/?, e.g. \"?BS\"")]
    InvalidPattern(String),
}

/// The three tradable commodities, in class-code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Commodity {
    Ore,
    Organics,
    Equipment,
}

impl Commodity {
    pub const ALL: [Commodity; 3] = [Commodity::Ore, Commodity::Organics, Commodity::Equipment];

    /// Position of this commodity inside a class code.
    pub fn index(self) -> usize {
        match self {
            Commodity::Ore => 0,
            Commodity::Organics => 1,
            Commodity::Equipment => 2,
        }
    }
}

/// Whether a port buys or sells a commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stance {
    Buys,
    Sells,
}

impl Stance {
    fn letter(self) -> char {
        match self {
            Stance::Buys => 'B',
            Stance::Sells => 'S',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'B' => Some(Stance::Buys),
            'S' => Some(Stance::Sells),
            _ => None,
        }
    }
}

/// The eight canonical port classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortClass {
    Bbs,
    Bsb,
    Sbb,
    Ssb,
    Sbs,
    Bss,
    Sss,
    Bbb,
}

impl PortClass {
    pub const ALL: [PortClass; 8] = [
        PortClass::Bbs,
        PortClass::Bsb,
        PortClass::Sbb,
        PortClass::Ssb,
        PortClass::Sbs,
        PortClass::Bss,
        PortClass::Sss,
        PortClass::Bbb,
    ];

    /// Three letter code, e.g. `"SBB"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PortClass::Bbs => "BBS",
            PortClass::Bsb => "BSB",
            PortClass::Sbb => "SBB",
            PortClass::Ssb => "SSB",
            PortClass::Sbs => "SBS",
            PortClass::Bss => "BSS",
            PortClass::Sss => "SSS",
            PortClass::Bbb => "BBB",
        }
    }

    /// The game's class number (1-8).
    pub fn number(&self) -> u8 {
        match self {
            PortClass::Bbs => 1,
            PortClass::Bsb => 2,
            PortClass::Sbb => 3,
            PortClass::Ssb => 4,
            PortClass::Sbs => 5,
            PortClass::Bss => 6,
            PortClass::Sss => 7,
            PortClass::Bbb => 8,
        }
    }

    pub fn stance(&self, commodity: Commodity) -> Stance {
        let letter = self.as_str().as_bytes()[commodity.index()] as char;
        match letter {
            'B' => Stance::Buys,
            _ => Stance::Sells,
        }
    }

    /// Build a class from the three stances, in commodity order.
    pub fn from_stances(stances: [Stance; 3]) -> Self {
        let code: String = stances.iter().map(|s| s.letter()).collect();
        match code.as_str() {
            "BBS" => PortClass::Bbs,
            "BSB" => PortClass::Bsb,
            "SBB" => PortClass::Sbb,
            "SSB" => PortClass::Ssb,
            "SBS" => PortClass::Sbs,
            "BSS" => PortClass::Bss,
            "SSS" => PortClass::Sss,
            _ => PortClass::Bbb,
        }
    }
}

impl fmt::Display for PortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortClass {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stances: Vec<Stance> = s.chars().filter_map(Stance::from_letter).collect();
        if s.chars().count() != 3 || stances.len() != 3 {
            return Err(ModelError::InvalidPortClass(s.to_string()));
        }
        Ok(Self::from_stances([stances[0], stances[1], stances[2]]))
    }
}

/// A class pattern such as `?BS`, where `?` accepts either stance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassPattern([Option<Stance>; 3]);

impl ClassPattern {
    pub fn matches(&self, class: PortClass) -> bool {
        Commodity::ALL
            .iter()
            .all(|&c| self.0[c.index()].is_none_or(|want| class.stance(c) == want))
    }

    /// Whether this pattern constrains the given commodity.
    pub fn constrains(&self, commodity: Commodity) -> bool {
        self.0[commodity.index()].is_some()
    }

    /// The opposite stance for every constrained commodity.
    pub fn complement(&self) -> Self {
        let flip = |s: Option<Stance>| {
            s.map(|s| match s {
                Stance::Buys => Stance::Sells,
                Stance::Sells => Stance::Buys,
            })
        };
        ClassPattern([flip(self.0[0]), flip(self.0[1]), flip(self.0[2])])
    }

    /// Parse either `"XYZ"` (paired with its complement) or `"XYZ-UVW"`.
    pub fn parse_pair(s: &str) -> Result<(Self, Self), ModelError> {
        match s.split_once('-') {
            Some((a, b)) => Ok((a.parse()?, b.parse()?)),
            None => {
                let a: ClassPattern = s.parse()?;
                Ok((a, a.complement()))
            }
        }
    }

    /// SQL `LIKE` form, `?` becoming `_`.
    pub fn to_like(&self) -> String {
        self.to_string().replace('?', "_")
    }
}

impl fmt::Display for ClassPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in self.0 {
            let c = slot.map(Stance::letter).unwrap_or('?');
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl FromStr for ClassPattern {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 {
            return Err(ModelError::InvalidPattern(s.to_string()));
        }
        let mut slots = [None; 3];
        for (slot, c) in slots.iter_mut().zip(chars) {
            *slot = match c {
                '?' => None,
                other => Some(
                    Stance::from_letter(other)
                        .ok_or_else(|| ModelError::InvalidPattern(s.to_string()))?,
                ),
            };
        }
        Ok(ClassPattern(slots))
    }
}

/// Amount on hand and percentage of capacity for one commodity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stock {
    pub amount: u32,
    pub percent: u32,
}

/// A trading port as last reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub sector: SectorId,
    pub class: PortClass,
    pub ore: Stock,
    pub organics: Stock,
    pub equipment: Stock,
    /// Date the port report was stored, filled in by the store
    pub last_seen: Option<String>,
}

impl Port {
    pub fn stock(&self, commodity: Commodity) -> Stock {
        match commodity {
            Commodity::Ore => self.ore,
            Commodity::Organics => self.organics,
            Commodity::Equipment => self.equipment,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sector: {:4}  Class: {} ({})   Ore: {:4} {:3}%  Org: {:4} {:3}%  Equ: {:4} {:3}%",
            self.sector,
            self.class.number(),
            self.class,
            self.ore.amount,
            self.ore.percent,
            self.organics.amount,
            self.organics.percent,
            self.equipment.amount,
            self.equipment.percent,
        )
    }
}

/// A planet sighting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    pub sector: SectorId,
    /// Globally unique planet number
    pub id: u32,
    pub name: String,
    pub class: char,
    /// 0 when no citadel has been built
    pub citadel: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_class_roundtrip_and_numbers() {
        for class in PortClass::ALL {
            assert_eq!(class.as_str().parse::<PortClass>().unwrap(), class);
        }
        assert_eq!(PortClass::Bbs.number(), 1);
        assert_eq!(PortClass::Bbb.number(), 8);
        assert_eq!("sbb".parse::<PortClass>().unwrap(), PortClass::Sbb);
    }

    #[test]
    fn test_port_class_rejects_garbage() {
        assert!("SB".parse::<PortClass>().is_err());
        assert!("SBX".parse::<PortClass>().is_err());
        assert!("SBBS".parse::<PortClass>().is_err());
    }

    #[test]
    fn test_pattern_matching() {
        let pattern: ClassPattern = "?BS".parse().unwrap();
        assert!(pattern.matches(PortClass::Bbs));
        assert!(pattern.matches(PortClass::Sbs));
        assert!(!pattern.matches(PortClass::Sbb));
        assert!(!pattern.matches(PortClass::Sss));
        assert!(!pattern.constrains(Commodity::Ore));
        assert!(pattern.constrains(Commodity::Equipment));
    }

    #[test]
    fn test_pattern_pair_parsing() {
        let (a, b) = ClassPattern::parse_pair("?bs").unwrap();
        assert_eq!(a.to_string(), "?BS");
        assert_eq!(b.to_string(), "?SB");

        let (a, b) = ClassPattern::parse_pair("SBS-SSB").unwrap();
        assert_eq!(a.to_string(), "SBS");
        assert_eq!(b.to_string(), "SSB");

        assert!(ClassPattern::parse_pair("SB").is_err());
        assert!(ClassPattern::parse_pair("SBX-SSB").is_err());
        assert_eq!(a.to_like(), "SBS");
        assert_eq!("?S?".parse::<ClassPattern>().unwrap().to_like(), "_S_");
    }

    #[test]
    fn test_port_display() {
        let port = Port {
            sector: 42,
            class: PortClass::Sbb,
            ore: Stock { amount: 2000, percent: 100 },
            organics: Stock { amount: 150, percent: 8 },
            equipment: Stock { amount: 900, percent: 45 },
            last_seen: None,
        };
        let line = port.to_string();
        assert!(line.starts_with("Sector:   42  Class: 3 (SBB)"));
        assert!(line.contains("Org:  150   8%"));
    }
}
