//! Operator feedback payloads played around the pause

use crate::gcode::GcodeLine;

/// Source of the operator-signal instructions inserted into the pause block
///
/// Payloads are opaque to the synthesizer: each is a run of complete lines,
/// every line terminated by `\n`, or the empty string for no output.
pub trait FeedbackSource: Send + Sync {
    /// Signal played when the printer pauses
    fn pause_signal(&self, extended: bool) -> String;

    /// Signal played when the printer is about to resume
    fn resume_signal(&self) -> String;
}

/// Tone melodies on the printer buzzer (M300)
#[derive(Debug, Clone, Copy, Default)]
pub struct Melody;

/// No feedback at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

const CHIME: [(u32, u32); 7] = [
    (1318, 240),
    (0, 120),
    (1396, 120),
    (1567, 120),
    (0, 120),
    (2093, 720),
    (0, 180),
];

const SEPARATOR: &str = "; ------------------------";
const FINISH: &str = "M117 Finish!!";

/// Beat of the extended melody (ms)
const BEAT: u32 = 200;
/// Closing note of each song (ms)
const HOLD: u32 = 800;

const YOU_COULD_BE_MINE: [u32; 16] = [
    440, 0, 440, 330, 392, 440, 0, 440, 0, 524, 588, 524, 588, 524, 440, 392,
];

const SWEET_CHILD_TAIL: [u32; 7] = [588, 440, 392, 784, 440, 740, 440];

fn pitch_name(frequency: u32) -> Option<&'static str> {
    match frequency {
        294 => Some("D4"),
        330 => Some("E4"),
        392 => Some("G4"),
        440 => Some("A4"),
        524 => Some("C5"),
        588 => Some("D5"),
        740 => Some("F#5"),
        784 => Some("G5"),
        _ => None,
    }
}

fn tone(out: &mut String, frequency: u32, duration: u32) {
    let line = GcodeLine::m(300)
        .s(f64::from(frequency))
        .p(f64::from(duration));
    out.push_str(&line.to_string());
    out.push('\n');
}

fn annotated_tone(out: &mut String, frequency: u32, duration: u32) {
    let line = GcodeLine::m(300)
        .s(f64::from(frequency))
        .p(f64::from(duration));
    let label = match pitch_name(frequency) {
        Some(name) => format!("{}: {}", name, frequency),
        None => String::new(),
    };
    out.push_str(&format!("{} ; {}\n", line, label));
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn song_title(out: &mut String, file: &str, title: &str) {
    push_line(out, &format!("; {}", file));
    push_line(out, SEPARATOR);
    push_line(out, &format!("M117 {}", title));
    push_line(out, SEPARATOR);
}

fn song_end(out: &mut String, frequency: u32) {
    annotated_tone(out, frequency, HOLD);
    push_line(out, SEPARATOR);
    push_line(out, FINISH);
    push_line(out, SEPARATOR);
}

impl Melody {
    /// Seven-note chime, used for both pause and resume
    pub fn chime() -> String {
        let mut out = String::new();
        for (frequency, duration) in CHIME {
            tone(&mut out, frequency, duration);
        }
        out
    }

    /// Two songs, long enough to be heard across a room
    pub fn extended() -> String {
        let mut out = String::new();
        push_line(
            &mut out,
            "; Play a longer melody so it is easier to hear your printer",
        );
        push_line(&mut out, "; https://www.thingiverse.com/thing:446853");
        push_line(&mut out, "; https://www.youtube.com/watch?v=qjwbaRhCCWA");

        song_title(&mut out, "You_Could_Be_Mine.g", "You Could Be Mine");
        for _ in 0..2 {
            for frequency in YOU_COULD_BE_MINE {
                annotated_tone(&mut out, frequency, BEAT);
            }
            push_line(&mut out, SEPARATOR);
        }
        song_end(&mut out, 440);

        song_title(&mut out, "Sweet_Child_o_Mine.g", "Sweet Child O Mine");
        for lead in [294, 294, 330, 330, 392, 392] {
            annotated_tone(&mut out, lead, BEAT);
            for frequency in SWEET_CHILD_TAIL {
                annotated_tone(&mut out, frequency, BEAT);
            }
            push_line(&mut out, SEPARATOR);
        }
        song_end(&mut out, 294);

        out
    }
}

impl FeedbackSource for Melody {
    fn pause_signal(&self, extended: bool) -> String {
        if extended {
            Self::extended()
        } else {
            Self::chime()
        }
    }

    fn resume_signal(&self) -> String {
        Self::chime()
    }
}

impl FeedbackSource for Silent {
    fn pause_signal(&self, _extended: bool) -> String {
        String::new()
    }

    fn resume_signal(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chime() {
        let chime = Melody::chime();
        let lines: Vec<&str> = chime.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "M300 S1318 P240");
        assert_eq!(lines[1], "M300 S0 P120");
        assert_eq!(lines[5], "M300 S2093 P720");
        assert_eq!(lines[6], "M300 S0 P180");
        assert!(chime.ends_with('\n'));
    }

    #[test]
    fn test_extended_shape() {
        let melody = Melody::extended();
        let lines: Vec<&str> = melody.lines().collect();

        let tones = lines.iter().filter(|l| l.starts_with("M300")).count();
        // 2 x 16 + 1 and 6 x 8 + 1
        assert_eq!(tones, 33 + 49);

        let titles: Vec<&&str> = lines.iter().filter(|l| l.starts_with("M117")).collect();
        assert_eq!(
            titles,
            vec![
                &"M117 You Could Be Mine",
                &FINISH,
                &"M117 Sweet Child O Mine",
                &FINISH
            ]
        );
        assert!(lines.contains(&"M300 S740 P200 ; F#5: 740"));
        assert!(lines.contains(&"M300 S0 P200 ; "));
        assert!(lines.contains(&"M300 S294 P800 ; D4: 294"));
        assert_eq!(lines.last(), Some(&SEPARATOR));
    }

    #[test]
    fn test_feedback_source_selection() {
        let melody = Melody;
        assert_eq!(melody.pause_signal(false), melody.resume_signal());
        assert_ne!(melody.pause_signal(true), melody.resume_signal());
        assert!(Silent.pause_signal(true).is_empty());
        assert!(Silent.resume_signal().is_empty());
    }
}
