//! Timestamped lyrics parser.
//!
//! Accepts `.lrc`-style text where a line may open with a `[mm:ss.ff]`
//! timestamp:
//!
//! [00:12.34] Hello world
//! [00:15.00]
//!
//! A timed line with text is a lyric line; the literal text
//! `[instrumental]` (any case) marks a wordless passage; a timed line with
//! no text is an end marker. Untimed lines are kept as inactive lines.
//! Parsing never fails: anything malformed degrades to an inactive line.

/// Display text for instrumental passages.
pub const INSTRUMENTAL_TEXT: &str = "[Instrumental]";

/// A single parsed lyric cue.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    /// A lyric line that becomes active at `time` seconds.
    Line { time: f64, text: String },
    /// A wordless passage starting at `time` seconds.
    Instrumental { time: f64 },
    /// A line with no timestamp. Rendered, but never active.
    Inactive { text: String },
    /// Nothing is active from `time` seconds onward. Never rendered.
    End { time: f64 },
}

impl Cue {
    /// Timestamp in seconds, if this cue carries one.
    pub fn time(&self) -> Option<f64> {
        match self {
            Cue::Line { time, .. } | Cue::Instrumental { time } | Cue::End { time } => Some(*time),
            Cue::Inactive { .. } => None,
        }
    }

    /// Text to render, if any.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Cue::Line { text, .. } | Cue::Inactive { text } => Some(text),
            Cue::Instrumental { .. } => Some(INSTRUMENTAL_TEXT),
            Cue::End { .. } => None,
        }
    }

    /// Whether the tracker may report this cue as active.
    pub fn selectable(&self) -> bool {
        matches!(self, Cue::Line { .. } | Cue::Instrumental { .. })
    }
}

/// Parse raw lyric text into cues, preserving input order.
///
/// If the first cue carries a time later than zero, a synthetic
/// instrumental at zero is prepended so the intro reads as a wordless
/// passage instead of dead air. Timestamps are assumed non-decreasing in
/// the input; out-of-order lines are passed through untouched.
pub fn parse(content: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_timed_line(line) {
            Some((time, text)) => {
                if text.is_empty() {
                    cues.push(Cue::End { time });
                } else if text.eq_ignore_ascii_case(INSTRUMENTAL_TEXT) {
                    cues.push(Cue::Instrumental { time });
                } else {
                    cues.push(Cue::Line {
                        time,
                        text: text.to_string(),
                    });
                }
            }
            None => cues.push(Cue::Inactive {
                text: line.to_string(),
            }),
        }
    }

    if cues.first().and_then(Cue::time).is_some_and(|t| t > 0.0) {
        cues.insert(0, Cue::Instrumental { time: 0.0 });
    }

    cues
}

/// Split a `[mm:ss.ff]text` line into seconds and trimmed trailing text.
///
/// Minutes are one or more digits; seconds must carry an explicit
/// fractional part. Anything else is not a timed line.
fn parse_timed_line(line: &str) -> Option<(f64, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let (minutes, seconds) = rest[..close].split_once(':')?;

    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (whole, frac) = seconds.split_once('.')?;
    if whole.is_empty()
        || frac.is_empty()
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    Some((minutes * 60.0 + seconds, rest[close + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let cues = parse("[00:12.34]Hello world");
        // Synthetic intro plus the lyric itself.
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], Cue::Instrumental { time: 0.0 });
        assert_eq!(
            cues[1],
            Cue::Line {
                time: 12.34,
                text: "Hello world".into()
            }
        );
    }

    #[test]
    fn test_no_synthetic_intro_when_first_cue_is_at_zero() {
        let cues = parse("[00:00.00]Hello");
        assert_eq!(
            cues,
            vec![Cue::Line {
                time: 0.0,
                text: "Hello".into()
            }]
        );
    }

    #[test]
    fn test_empty_input_parses_to_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("   \n\n \t \n").is_empty());
    }

    #[test]
    fn test_end_marker_and_instrumental() {
        let lrc = "[00:05.00][instrumental]\n[00:10.00]Words\n[00:20.00]\n";
        let cues = parse(lrc);
        assert_eq!(cues.len(), 4);
        assert_eq!(cues[0], Cue::Instrumental { time: 0.0 });
        assert_eq!(cues[1], Cue::Instrumental { time: 5.0 });
        assert_eq!(
            cues[2],
            Cue::Line {
                time: 10.0,
                text: "Words".into()
            }
        );
        assert_eq!(cues[3], Cue::End { time: 20.0 });
    }

    #[test]
    fn test_instrumental_marker_is_case_insensitive() {
        assert_eq!(
            parse("[00:00.00][INSTRUMENTAL]"),
            vec![Cue::Instrumental { time: 0.0 }]
        );
    }

    #[test]
    fn test_timed_text_is_trimmed() {
        assert_eq!(
            parse("[00:00.00]   spaced out   "),
            vec![Cue::Line {
                time: 0.0,
                text: "spaced out".into()
            }]
        );
    }

    #[test]
    fn test_minutes_convert_to_seconds() {
        let cues = parse("[02:30.50]Late line");
        assert_eq!(cues[1].time(), Some(150.5));
    }

    #[test]
    fn test_malformed_timestamps_become_inactive() {
        let lrc = r#"
Some header credit
[00:12]No fractional part
[ab:cd.ef]Not digits
[00:12.34 unclosed
note [00:12.34]text after junk
"#;
        let cues = parse(lrc);
        assert_eq!(cues.len(), 5);
        for cue in &cues {
            assert!(matches!(cue, Cue::Inactive { .. }), "unexpected: {cue:?}");
        }
    }

    #[test]
    fn test_untimed_first_line_suppresses_synthetic_intro() {
        let cues = parse("credits: someone\n[00:10.00]Hello");
        assert_eq!(cues.len(), 2);
        assert_eq!(
            cues[0],
            Cue::Inactive {
                text: "credits: someone".into()
            }
        );
    }

    #[test]
    fn test_input_order_is_preserved() {
        let cues = parse("[00:30.00]B\n[00:10.00]A");
        assert_eq!(cues[0], Cue::Instrumental { time: 0.0 });
        assert_eq!(cues[1].time(), Some(30.0));
        assert_eq!(cues[2].time(), Some(10.0));
    }
}
