//! Line shapes recognised in game output.
//!
//! Every pattern is matched against a line that has already had escapes
//! stripped, carriage returns removed and trailing whitespace trimmed.

use once_cell::sync::Lazy;
use regex::Regex;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("line pattern is valid")
}

// ============================================================================
// Game state
// ============================================================================

/// Which sector the current screen describes.
pub static WORKING_SECTOR: Lazy<Regex> = Lazy::new(|| compile(r"^Sector  : (?P<sector>\d+) in .*\.$"));

pub static STARDOCK: Lazy<Regex> =
    Lazy::new(|| compile(r"^\s*The StarDock is located in sector (?P<sector>[0-9,]+)\.$"));

pub static GAME_SIZE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^\s+Maximum players \d+, sectors (?P<sectors>[0-9,]+), ports [0-9,]+, planets [0-9,]+\.")
});

// ============================================================================
// Trading
// ============================================================================

pub static TRADE_OPENING: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"^How many (?:holds|units) of .+ do you want to (?P<operation>buy|sell)(?P<planet> from (?:the|your) planet)? \[[0-9,]+\]\?",
    )
});

pub static AGREED_UNITS: Lazy<Regex> = Lazy::new(|| compile(r"^Agreed, (?P<units>[0-9,]+) units\.$"));

pub static FINAL_OFFER: Lazy<Regex> = Lazy::new(|| compile(r"^Our final offer is [0-9,]+ credits.$"));

/// Partial line: the port waits for our counter-offer.
pub static OFFER_PROMPT: Lazy<Regex> = Lazy::new(|| compile(r"^Your offer \[(?P<offer>[0-9,]+)\] \?$"));

// ============================================================================
// Fighters and planets
// ============================================================================

pub static FIGHTER_HEADER: Lazy<Regex> = Lazy::new(|| compile(r"^\s*Deployed  Fighter  Scan"));

pub static FIGHTER_ROW: Lazy<Regex> = Lazy::new(|| {
    compile(r"^ (?P<sector>[0-9 ]{4}[0-9])\s+\d+\s+(?:Personal|Corp)\s+(?:Defensive|Offensive|Toll)")
});

pub static PLANET_ROW: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"^\s*(?P<sector>[0-9 ]{4}[0-9])\s+T?\s+#(?P<id>\d+)\s+(?P<name>.*?)\s+Class (?P<class>[A-Z]), .*(?P<citadel>No Citadel|Level [0-9])",
    )
});

// ============================================================================
// Map reports
// ============================================================================

/// Interrogation-mode warp table: four-wide sector, then four-wide warps.
pub static WARP_TABLE: Lazy<Regex> =
    Lazy::new(|| compile(r"^(?P<sector>[ 0-9]{3}[0-9])(?P<warps>(?: [ 0-9]{3}[0-9])+)$"));

pub static WARP_PROSE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^Sector (?P<sector>\d+) has warps to sector\(s\) : (?P<warps>[0-9 \-]+)$")
});

/// Interrogation-mode port table. A `-` marker means the port buys.
pub static PORT_TABLE: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"^(?P<sector>[ 0-9]{3}[0-9])",
        r" (?P<ore_bs>[ -]) (?P<ore_amt>[ 0-9]{3}[0-9]) (?P<ore_pct>[ 0-9]{2}[0-9])%",
        r" (?P<org_bs>[ -]) (?P<org_amt>[ 0-9]{3}[0-9]) (?P<org_pct>[ 0-9]{2}[0-9])%",
        r" (?P<equ_bs>[ -]) (?P<equ_amt>[ 0-9]{3}[0-9]) (?P<equ_pct>[ 0-9]{2}[0-9])%$",
    ))
});

// ============================================================================
// Course plots
// ============================================================================

pub static ROUTE_HEADER_TABLE: Lazy<Regex> = Lazy::new(|| compile(r"^FM > \d+$"));

pub static ROUTE_HEADER_PROSE: Lazy<Regex> =
    Lazy::new(|| compile(r"^The shortest path .* from sector \d+ to sector \d+ is:$"));

pub static ROUTE_CONTINUATION: Lazy<Regex> = Lazy::new(|| compile(r"^(?:  TO)?[0-9 ()>]+$"));

pub static ROUTE_COMPLETE_TABLE: Lazy<Regex> =
    Lazy::new(|| compile(r"^FM > \d+   TO > \d+ (?P<route>[0-9 ()>]+)$"));

pub static ROUTE_COMPLETE_PROSE: Lazy<Regex> = Lazy::new(|| {
    compile(r"^The shortest path .* from sector \d+ to sector \d+ is: (?P<route>[0-9 ()>]+)$")
});

// ============================================================================
// Login
// ============================================================================

pub static LOGIN_NAME: Lazy<Regex> =
    Lazy::new(|| compile(r"^Please enter your name \(ENTER for none\):$"));

pub static LOGIN_GAME: Lazy<Regex> = Lazy::new(|| compile(r"^Selection \(\? for menu\):$"));

pub static LOGIN_PASSWORD: Lazy<Regex> =
    Lazy::new(|| compile(r"^(?:Please )?[Ee]nter (?:the )?(?:game )?password:$"));

// ============================================================================
// Field helpers
// ============================================================================

/// Parse a number that may carry padding or thousands separators.
pub fn number(text: &str) -> Option<u32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Like [`number`], for credit amounts that can exceed `u32`.
pub fn amount(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Every run of digits in `text`, in order.
pub fn sector_list(text: &str) -> Vec<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}
