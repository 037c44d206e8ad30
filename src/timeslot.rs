//! Decoding of the course-table time-slot formula.
//!
//! The course table script places each meeting with an assignment of the
//! form `index =<day>*unitCount+<period>;`. A course's meetings are all the
//! formulas between its own descriptor and the next course's descriptor.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::Meeting;

fn time_slot_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"=(.+?)\*unitCount\+(.+?);").expect("static regex must compile"))
}

/// Byte window `[start, end)` of a page; `end == None` runs to end of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: Option<usize>,
}

impl Window {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Clamp to `text`, falling back to an empty range off char boundaries.
    fn range(&self, text: &str) -> Range<usize> {
        let end = self.end.unwrap_or(text.len()).min(text.len());
        let start = self.start.min(end);
        if text.is_char_boundary(start) && text.is_char_boundary(end) {
            start..end
        } else {
            0..0
        }
    }

    /// Search `pattern` restricted to this window of `text`.
    pub fn scan<'t>(&self, pattern: &'t Regex, text: &'t str) -> impl Iterator<Item = regex::Captures<'t>> + 't {
        let range = self.range(text);
        pattern.captures_iter(&text[range])
    }
}

/// One window per descriptor offset: each runs up to the next offset, the
/// last one to end of text.
pub fn windows(offsets: &[usize]) -> Vec<Window> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &start)| Window::new(start, offsets.get(i + 1).copied()))
        .collect()
}

/// Meetings encoded inside `window`. Formulas whose operands are not plain
/// base-10 integers are dropped.
pub fn decode_meetings(text: &str, window: Window) -> Vec<Meeting> {
    window
        .scan(time_slot_pattern(), text)
        .filter_map(|caps| {
            let day = caps[1].trim().parse::<usize>();
            let period = caps[2].trim().parse::<usize>();
            match (day, period) {
                (Ok(day), Ok(period)) => Some(Meeting { day, period }),
                _ => {
                    debug!(
                        day = &caps[1],
                        period = &caps[2],
                        "Skipping undecodable time slot"
                    );
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole() -> Window {
        Window::new(0, None)
    }

    #[test]
    fn test_decode_every_cell() {
        for day in 0..7 {
            for period in 0..14 {
                let text = format!("index ={}*unitCount+{};", day, period);
                assert_eq!(decode_meetings(&text, whole()), vec![Meeting { day, period }]);
            }
        }
    }

    #[test]
    fn test_multiple_meetings_in_one_window() {
        let text = "index =0*unitCount+2;table0.activities[index]...index =3*unitCount+4;";
        let meetings = decode_meetings(text, whole());
        assert_eq!(
            meetings,
            vec![Meeting { day: 0, period: 2 }, Meeting { day: 3, period: 4 }]
        );
    }

    #[test]
    fn test_undecodable_slot_is_dropped() {
        let text = "index =x*unitCount+2; index =1*unitCount+5;";
        assert_eq!(decode_meetings(text, whole()), vec![Meeting { day: 1, period: 5 }]);
    }

    #[test]
    fn test_window_bounds_the_scan() {
        let first = "course A index =1*unitCount+1;";
        let text = format!("{}course B index =2*unitCount+2;", first);
        let offsets = [0, first.len()];
        let ws = windows(&offsets);

        assert_eq!(ws, vec![Window::new(0, Some(first.len())), Window::new(first.len(), None)]);
        assert_eq!(decode_meetings(&text, ws[0]), vec![Meeting { day: 1, period: 1 }]);
        assert_eq!(decode_meetings(&text, ws[1]), vec![Meeting { day: 2, period: 2 }]);
    }

    #[test]
    fn test_window_past_end_is_clamped() {
        let text = "index =1*unitCount+1;";
        assert!(decode_meetings(text, Window::new(100, None)).is_empty());
        assert_eq!(decode_meetings(text, Window::new(0, Some(1000))).len(), 1);
    }

    #[test]
    fn test_no_offsets_no_windows() {
        assert!(windows(&[]).is_empty());
    }
}
