//! Stream parser: raw session bytes in, map writes and suggested replies out.
//!
//! Complete lines run through an ordered classifier; the first shape that
//! matches wins. Fighter rows and planet rows fall through to later checks,
//! and course plots are stitched together across lines before they are
//! recorded. The unterminated tail is classified separately once the stream
//! goes quiet, because haggle and login prompts never end in a newline.
//!
//! Sector ids outside `1..=max_sector` (once the game size is known) are
//! dropped before anything is submitted.

use super::ansi::clean_line;
use super::negotiation::{TradeOperation, TradeSource};
use super::patterns::*;
use super::segmenter::LineSegmenter;
use super::session::SessionContext;
use crate::automation::RouteSignal;
use crate::model::{Planet, Port, PortClass, SectorId, Stance, Stock};
use crate::store::{WriteOp, WriteSink, MAX_SECTOR_KEY, STARDOCK_KEY};
use regex::Captures;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Default quiet window before the unterminated tail is classified.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What a complete line was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    WorkingSector,
    Stardock,
    GameSize,
    TradeOpening,
    AgreedUnits,
    FinalOffer,
    FighterScan,
    Fighter,
    WarpList,
    PortList,
    Planet,
    /// First line of a multi-line course plot
    RouteStarted,
    /// A course plot was parsed and recorded
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Haggle,
    Login,
}

/// Bytes the parser proposes sending back to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub bytes: Vec<u8>,
}

/// Incremental parser for one live session.
pub struct StreamParser<S: WriteSink> {
    sink: S,
    context: SessionContext,
    segmenter: LineSegmenter,
    debounce: Duration,
    route_signal: Option<Arc<RouteSignal>>,
}

impl<S: WriteSink> StreamParser<S> {
    pub fn new(sink: S, context: SessionContext) -> Self {
        Self {
            sink,
            context,
            segmenter: LineSegmenter::new(),
            debounce: DEFAULT_DEBOUNCE,
            route_signal: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Signal raised every time a course plot has been fully parsed.
    pub fn with_route_signal(mut self, signal: Arc<RouteSignal>) -> Self {
        self.route_signal = Some(signal);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn into_context(self) -> SessionContext {
        self.context
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // =========================================================================
    // Stream input
    // =========================================================================

    /// Feed a chunk received now. Returns the number of complete lines seen.
    pub fn feed(&mut self, chunk: &[u8]) -> usize {
        self.feed_at(chunk, Instant::now())
    }

    pub fn feed_at(&mut self, chunk: &[u8], now: Instant) -> usize {
        let lines = self.segmenter.feed(chunk, now);
        for line in &lines {
            self.parse_complete_line(line);
        }
        lines.len()
    }

    /// Classify the unterminated tail once the stream has been quiet long
    /// enough. Haggle suggestions are withheld unless auto-haggle is on.
    pub fn poll_idle(&mut self, now: Instant) -> Option<Suggestion> {
        let tail = self.segmenter.quiet_remainder(now, self.debounce)?.to_vec();
        let suggestion = self.parse_partial_line(&tail)?;
        if suggestion.kind == SuggestionKind::Haggle && !self.context.auto_haggle {
            debug!("Auto-haggle off, not sending counter-offer");
            return None;
        }
        Some(suggestion)
    }

    /// End of input: treat any unterminated tail as a complete line.
    pub fn finish(&mut self) -> Option<LineKind> {
        let tail = self.segmenter.take_remainder();
        if tail.is_empty() {
            return None;
        }
        self.parse_complete_line(&tail)
    }

    // =========================================================================
    // Partial lines
    // =========================================================================

    /// Classify a line the game has not terminated yet. Never persists anything.
    pub fn parse_partial_line(&mut self, raw: &[u8]) -> Option<Suggestion> {
        let Some(line) = clean_line(raw) else {
            trace!("Dropping undecodable partial line");
            return None;
        };
        trace!(line = %line, "Partial line");

        if let Some(caps) = OFFER_PROMPT.captures(&line) {
            let offer = amount(&caps["offer"])?;
            let counter = self.context.negotiation.counter(offer)?;
            debug!(offer, counter, "Counter-offer");
            return Some(Suggestion {
                kind: SuggestionKind::Haggle,
                bytes: counter.to_string().into_bytes(),
            });
        }

        self.context.login.respond(&line).map(|bytes| Suggestion {
            kind: SuggestionKind::Login,
            bytes,
        })
    }

    // =========================================================================
    // Complete lines
    // =========================================================================

    /// Classify one complete line and submit whatever it tells us.
    pub fn parse_complete_line(&mut self, raw: &[u8]) -> Option<LineKind> {
        let Some(line) = clean_line(raw) else {
            trace!("Dropping undecodable line");
            return None;
        };
        trace!(line = %line, "Complete line");
        self.classify(line)
    }

    fn classify(&mut self, line: String) -> Option<LineKind> {
        if let Some(caps) = WORKING_SECTOR.captures(&line) {
            self.context.settings.working_sector = number(&caps["sector"]);
            return Some(LineKind::WorkingSector);
        }

        if let Some(caps) = STARDOCK.captures(&line) {
            debug!(line = %line, "StarDock location");
            if let Some(sector) = self.sector(&caps["sector"]) {
                self.save_setting(STARDOCK_KEY, sector);
            }
            return Some(LineKind::Stardock);
        }

        if let Some(caps) = GAME_SIZE.captures(&line) {
            debug!(line = %line, "Game size");
            if let Some(sectors) = number(&caps["sectors"]) {
                self.save_setting(MAX_SECTOR_KEY, sectors);
            }
            return Some(LineKind::GameSize);
        }

        if let Some(caps) = TRADE_OPENING.captures(&line) {
            let operation = match &caps["operation"] {
                "sell" => TradeOperation::Sell,
                _ => TradeOperation::Buy,
            };
            let source = if caps.name("planet").is_some() {
                TradeSource::Planet
            } else {
                TradeSource::Holds
            };
            debug!(?operation, ?source, "Trade opened");
            self.context.negotiation.begin(operation, source);
            return Some(LineKind::TradeOpening);
        }

        if let Some(caps) = AGREED_UNITS.captures(&line) {
            if let Some(units) = number(&caps["units"]) {
                debug!(units, "Units agreed");
                self.context.negotiation.record_units(units);
            }
            return Some(LineKind::AgreedUnits);
        }

        if FINAL_OFFER.is_match(&line) {
            debug!("Final offer");
            self.context.negotiation.mark_final();
            return Some(LineKind::FinalOffer);
        }

        if FIGHTER_HEADER.is_match(&line) {
            debug!("Fighter scan started");
            self.sink.submit(WriteOp::ClearFighters);
            return Some(LineKind::FighterScan);
        }

        let mut matched = None;

        if let Some(caps) = FIGHTER_ROW.captures(&line) {
            if let Some(sector) = self.sector(&caps["sector"]) {
                debug!(sector, "Fighter");
                self.sink.submit(WriteOp::AddFighter(sector));
                matched = Some(LineKind::Fighter);
            }
        }

        if let Some(caps) = WARP_TABLE
            .captures(&line)
            .or_else(|| WARP_PROSE.captures(&line))
        {
            if let Some(source) = self.sector(&caps["sector"]) {
                let destinations: Vec<SectorId> = sector_list(&caps["warps"])
                    .into_iter()
                    .filter(|&s| self.in_range(s))
                    .collect();
                debug!(source, ?destinations, "Warp list");
                self.sink.submit(WriteOp::RecordWarps {
                    source,
                    destinations,
                });
            }
            return Some(LineKind::WarpList);
        }

        if let Some(caps) = PORT_TABLE.captures(&line) {
            if let Some(port) = port_from_table(&caps).filter(|p| self.in_range(p.sector)) {
                debug!(%port, "Port report");
                self.sink.submit(WriteOp::UpsertPort(port));
            }
            return Some(LineKind::PortList);
        }

        if let Some(caps) = PLANET_ROW.captures(&line) {
            if let Some(planet) = planet_from_row(&caps).filter(|p| self.in_range(p.sector)) {
                debug!(?planet, "Planet");
                self.sink.submit(WriteOp::UpsertPlanet(planet));
                matched = Some(LineKind::Planet);
            }
        }

        self.accumulate_route(line).or(matched)
    }

    /// Course plots arrive over several lines: a header, continuation lines,
    /// then a blank line. The pending text is completed, extended or dropped
    /// before the line is checked against the single-line forms.
    fn accumulate_route(&mut self, line: String) -> Option<LineKind> {
        let mut text = line;
        if let Some(mut pending) = self.context.pending_route.take() {
            if text.is_empty() {
                text = pending;
            } else if ROUTE_CONTINUATION.is_match(&text) {
                pending.push(' ');
                pending.push_str(&text);
                self.context.pending_route = Some(pending);
            } else {
                trace!(discarded = %pending, "Course plot interrupted");
            }
        }

        let route = ROUTE_COMPLETE_TABLE
            .captures(&text)
            .or_else(|| ROUTE_COMPLETE_PROSE.captures(&text))
            .map(|caps| sector_list(&caps["route"]));
        if let Some(sectors) = route {
            self.record_route(sectors);
            return Some(LineKind::Route);
        }

        if ROUTE_HEADER_TABLE.is_match(&text) || ROUTE_HEADER_PROSE.is_match(&text) {
            self.context.pending_route = Some(text);
            return Some(LineKind::RouteStarted);
        }
        None
    }

    /// A plot with any out-of-range sector is not recorded, but still
    /// completes the plot for anyone waiting on it.
    fn record_route(&mut self, sectors: Vec<SectorId>) {
        if sectors.iter().all(|&s| self.in_range(s)) {
            debug!(?sectors, "Course plot");
            self.sink.submit(WriteOp::RecordRoute { sectors });
        } else {
            debug!(?sectors, "Course plot with invalid sector, not recorded");
        }
        if let Some(signal) = &self.route_signal {
            signal.set();
        }
    }

    /// Valid sector ids run from 1 to the game size, when the game size is known.
    fn in_range(&self, sector: SectorId) -> bool {
        sector >= 1
            && self
                .context
                .settings
                .max_sector()
                .is_none_or(|max| sector <= max)
    }

    fn sector(&self, text: &str) -> Option<SectorId> {
        number(text).filter(|&s| self.in_range(s))
    }

    /// Persist a game constant only when it differs from what we know.
    fn save_setting(&mut self, key: &str, value: u32) {
        if self.context.settings.observe(key, value) {
            self.sink.submit(WriteOp::SaveSetting {
                key: key.to_string(),
                value: value.to_string(),
            });
        }
    }
}

fn stance(marker: &str) -> Stance {
    if marker == "-" {
        Stance::Buys
    } else {
        Stance::Sells
    }
}

fn port_from_table(caps: &Captures<'_>) -> Option<Port> {
    let stock = |amount: &str, pct: &str| -> Option<Stock> {
        Some(Stock {
            amount: number(&caps[amount])?,
            percent: number(&caps[pct])?,
        })
    };
    Some(Port {
        sector: number(&caps["sector"])?,
        class: PortClass::from_stances([
            stance(&caps["ore_bs"]),
            stance(&caps["org_bs"]),
            stance(&caps["equ_bs"]),
        ]),
        ore: stock("ore_amt", "ore_pct")?,
        organics: stock("org_amt", "org_pct")?,
        equipment: stock("equ_amt", "equ_pct")?,
        last_seen: None,
    })
}

fn planet_from_row(caps: &Captures<'_>) -> Option<Planet> {
    // "No Citadel" or "Level N"
    let citadel = match caps["citadel"].chars().last()? {
        c @ '0'..='9' => c.to_digit(10)? as u8,
        _ => 0,
    };
    Some(Planet {
        sector: number(&caps["sector"])?,
        id: number(&caps["id"])?,
        name: caps["name"].trim().to_string(),
        class: caps["class"].chars().next()?,
        citadel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LoginScript;
    use crate::store::RecordingSink;
    use pretty_assertions::assert_eq;

    fn parser(sink: &RecordingSink) -> StreamParser<&RecordingSink> {
        StreamParser::new(sink, SessionContext::default())
    }

    // ========================================================================
    // Complete lines
    // ========================================================================

    #[test]
    fn test_working_sector_is_runtime_only() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        assert_eq!(
            p.parse_complete_line(b"Sector  : 42 in uncharted space."),
            Some(LineKind::WorkingSector)
        );
        assert_eq!(p.context().settings.working_sector, Some(42));
        assert!(sink.ops().is_empty());
    }

    #[test]
    fn test_stardock_persisted_on_change_only() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        let line = b"   The StarDock is located in sector 1,234.";
        p.parse_complete_line(line);
        p.parse_complete_line(line);
        assert_eq!(
            sink.ops(),
            vec![WriteOp::SaveSetting {
                key: STARDOCK_KEY.to_string(),
                value: "1234".to_string()
            }]
        );
    }

    #[test]
    fn test_game_size() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        let kind = p.parse_complete_line(
            b"     Maximum players 200, sectors 5,000, ports 2,500, planets 1,000.",
        );
        assert_eq!(kind, Some(LineKind::GameSize));
        assert_eq!(p.context().settings.max_sector(), Some(5000));
    }

    #[test]
    fn test_warp_table_row() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        assert_eq!(
            p.parse_complete_line(b" 100    5    6"),
            Some(LineKind::WarpList)
        );
        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordWarps {
                source: 100,
                destinations: vec![5, 6]
            }]
        );
    }

    #[test]
    fn test_warp_prose() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"Sector 7 has warps to sector(s) : 2 - 3 - 40");
        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordWarps {
                source: 7,
                destinations: vec![2, 3, 40]
            }]
        );
    }

    #[test]
    fn test_port_table_row() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"  12 - 1500 100%   2000  90% - 3000  45%");
        let ops = sink.ops();
        let WriteOp::UpsertPort(port) = &ops[0] else {
            panic!("expected a port, got {:?}", ops);
        };
        assert_eq!(port.sector, 12);
        assert_eq!(port.class, PortClass::Bsb);
        assert_eq!(port.organics, Stock { amount: 2000, percent: 90 });
        assert_eq!(port.equipment.percent, 45);
    }

    #[test]
    fn test_fighter_scan() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"                 Deployed  Fighter  Scan");
        p.parse_complete_line(b"   123      50     Personal   Defensive");
        p.parse_complete_line(b"  4567       1     Corp       Toll");
        assert_eq!(
            sink.ops(),
            vec![
                WriteOp::ClearFighters,
                WriteOp::AddFighter(123),
                WriteOp::AddFighter(4567)
            ]
        );
    }

    #[test]
    fn test_planet_rows() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(
            b"   317  T  #12  Terra Nova             Class M, Earth Type        Level 3",
        );
        p.parse_complete_line(b"    88     #3   Rock                   Class K, Desert Wasteland  No Citadel");
        let ops = sink.ops();
        assert_eq!(
            ops[0],
            WriteOp::UpsertPlanet(Planet {
                sector: 317,
                id: 12,
                name: "Terra Nova".to_string(),
                class: 'M',
                citadel: 3
            })
        );
        let WriteOp::UpsertPlanet(rock) = &ops[1] else {
            panic!("expected a planet");
        };
        assert_eq!(rock.citadel, 0);
    }

    #[test]
    fn test_unrecognised_and_invalid_lines_are_ignored() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        assert_eq!(p.parse_complete_line(b"Command [TL=00:00:00]:[1] (?=Help)? :"), None);
        assert_eq!(p.parse_complete_line(b"\xff\xfe garbage \xc3"), None);
        assert!(sink.ops().is_empty());
    }

    #[test]
    fn test_out_of_range_sectors_are_dropped() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"     Maximum players 20, sectors 1,000, ports 500, planets 100.");
        sink.take();

        p.parse_complete_line(b"Sector 1 has warps to sector(s) : 0 - 5000 - 7");
        assert_eq!(p.parse_complete_line(b"   0    7"), Some(LineKind::WarpList));
        p.parse_complete_line(b"  1001 - 1500 100%   2000  90% - 3000  45%");
        p.parse_complete_line(b"                 Deployed  Fighter  Scan");
        p.parse_complete_line(b"  1200      50     Personal   Defensive");
        p.parse_complete_line(b"FM > 1   TO > 1001 1 > 1001");

        assert_eq!(
            sink.ops(),
            vec![
                WriteOp::RecordWarps {
                    source: 1,
                    destinations: vec![7]
                },
                WriteOp::ClearFighters
            ]
        );
    }

    #[test]
    fn test_sector_zero_dropped_before_game_size_known() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"Sector 4 has warps to sector(s) : 0 - 9000");
        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordWarps {
                source: 4,
                destinations: vec![9000]
            }]
        );
    }

    // ========================================================================
    // Course plots
    // ========================================================================

    #[test]
    fn test_multi_line_prose_plot() {
        let sink = RecordingSink::new();
        let signal = Arc::new(RouteSignal::new());
        let mut p = parser(&sink).with_route_signal(Arc::clone(&signal));

        let header = b"The shortest path (3 hops, 9 turns) from sector 3 to sector 9 is:";
        assert_eq!(p.parse_complete_line(header), Some(LineKind::RouteStarted));
        p.parse_complete_line(b"3 > (17) > 4 > 9");
        assert!(!signal.is_set());
        assert_eq!(p.parse_complete_line(b""), Some(LineKind::Route));

        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordRoute {
                sectors: vec![3, 17, 4, 9]
            }]
        );
        assert!(signal.is_set());
        assert!(!p.context().route_pending());
    }

    #[test]
    fn test_multi_line_table_plot() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"FM > 1");
        p.parse_complete_line(b"  TO > 9 1 > 5 > 9");
        p.parse_complete_line(b"");
        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordRoute {
                sectors: vec![1, 5, 9]
            }]
        );
    }

    #[test]
    fn test_single_line_plot() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        let kind = p.parse_complete_line(b"FM > 2   TO > 4 2 > 3 > 4");
        assert_eq!(kind, Some(LineKind::Route));
        assert_eq!(
            sink.ops(),
            vec![WriteOp::RecordRoute {
                sectors: vec![2, 3, 4]
            }]
        );
    }

    #[test]
    fn test_interrupted_plot_is_discarded() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"FM > 1");
        p.parse_complete_line(b"Something else entirely");
        p.parse_complete_line(b"");
        assert!(sink.ops().is_empty());
        assert!(!p.context().route_pending());
    }

    // ========================================================================
    // Partial lines
    // ========================================================================

    #[test]
    fn test_haggle_round_trip() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"How many holds of Equipment do you want to sell [30]?");
        let s = p.parse_partial_line(b"Your offer [1,000] ?").unwrap();
        assert_eq!(s.kind, SuggestionKind::Haggle);
        assert_eq!(s.bytes, b"1070".to_vec());
        assert_eq!(p.parse_partial_line(b"Your offer [1,000] ?"), None);
        assert!(sink.ops().is_empty());
    }

    #[test]
    fn test_haggle_offer_beyond_u32() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.parse_complete_line(b"How many holds of Ore do you want to sell [250]?");
        let s = p.parse_partial_line(b"Your offer [5,000,000,000] ?").unwrap();
        assert_eq!(s.bytes, b"5350000000".to_vec());
    }

    #[test]
    fn test_poll_idle_respects_auto_haggle() {
        let sink = RecordingSink::new();
        let start = Instant::now();
        let mut p = parser(&sink).with_debounce(Duration::from_millis(100));
        p.feed_at(b"How many holds of Organics do you want to buy [10]?\r\n", start);
        p.feed_at(b"Your offer [500] ?", start);

        let later = start + Duration::from_millis(150);
        assert_eq!(p.poll_idle(later), None);

        p.context_mut().auto_haggle = true;
        p.context_mut().negotiation.begin(TradeOperation::Buy, TradeSource::Holds);
        p.feed_at(b" ", later);
        assert_eq!(p.poll_idle(later), None);
        let suggestion = p.poll_idle(later + Duration::from_millis(100)).unwrap();
        assert_eq!(suggestion.bytes, b"475".to_vec());
    }

    #[test]
    fn test_login_prompts_answered_once() {
        let sink = RecordingSink::new();
        let context = SessionContext::default().with_login(LoginScript::new(
            Some("pilot".into()),
            None,
            Some("secret".into()),
        ));
        let mut p = StreamParser::new(&sink, context);
        let name = p
            .parse_partial_line(b"\x1b[32mPlease enter your name (ENTER for none):")
            .unwrap();
        assert_eq!(name.kind, SuggestionKind::Login);
        assert_eq!(name.bytes, b"pilot\r\n".to_vec());
        assert_eq!(
            p.parse_partial_line(b"Please enter your name (ENTER for none):"),
            None
        );
        assert_eq!(p.parse_partial_line(b"Selection (? for menu):"), None);
        assert_eq!(
            p.parse_partial_line(b"Enter the game password:").unwrap().bytes,
            b"secret\r\n".to_vec()
        );
    }

    #[test]
    fn test_finish_parses_unterminated_tail() {
        let sink = RecordingSink::new();
        let mut p = parser(&sink);
        p.feed(b"Sector 1 has warps to sector(s) : 2");
        assert!(sink.ops().is_empty());
        assert_eq!(p.finish(), Some(LineKind::WarpList));
        assert_eq!(sink.ops().len(), 1);
    }
}
