//! G-Code instruction model and line builder

use pausekit_core::format_number;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Prefix of a layer marker comment emitted by the slicer (`;LAYER:12`)
pub const LAYER_MARKER: &str = ";LAYER:";

/// Prefix of the firmware flavor comment in the file header
pub const FLAVOR_MARKER: &str = ";FLAVOR:";

/// Letters written first, in this order, by [`GcodeLine`]
const WORD_ORDER: [char; 9] = ['G', 'M', 'T', 'S', 'X', 'Y', 'Z', 'E', 'F'];

/// Command family of a single line
///
/// A closed tag over the command families a slicer emits and the pause
/// block produces. Anything else is [`CommandKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// G0 rapid move
    RapidMove,
    /// G1 linear move
    LinearMove,
    /// G4 dwell
    Dwell,
    /// G10 firmware retract
    FirmwareRetract,
    /// G11 firmware unretract
    FirmwareUnretract,
    /// G90 absolute positioning
    AbsolutePositioning,
    /// G91 relative positioning
    RelativePositioning,
    /// G92 set position
    SetPosition,
    /// M82 absolute extrusion
    AbsoluteExtrusion,
    /// M83 relative extrusion
    RelativeExtrusion,
    /// M104 set hotend temperature
    SetTemperature,
    /// M109 set hotend temperature and wait
    SetTemperatureAndWait,
    /// M117 display message
    DisplayMessage,
    /// M300 play tone
    Tone,
    /// T<n> tool select
    ToolSelect,
    /// Line holding only a comment (markers included)
    Comment,
    /// Blank line
    Empty,
    /// Any other command
    Other,
}

impl CommandKind {
    fn classify(letter: char, code: f64) -> Self {
        // fractional codes (G29.1 etc.) are never one of ours
        if code.fract() != 0.0 {
            return Self::Other;
        }
        match (letter, code as i64) {
            ('G', 0) => Self::RapidMove,
            ('G', 1) => Self::LinearMove,
            ('G', 4) => Self::Dwell,
            ('G', 10) => Self::FirmwareRetract,
            ('G', 11) => Self::FirmwareUnretract,
            ('G', 90) => Self::AbsolutePositioning,
            ('G', 91) => Self::RelativePositioning,
            ('G', 92) => Self::SetPosition,
            ('M', 82) => Self::AbsoluteExtrusion,
            ('M', 83) => Self::RelativeExtrusion,
            ('M', 104) => Self::SetTemperature,
            ('M', 109) => Self::SetTemperatureAndWait,
            ('M', 117) => Self::DisplayMessage,
            ('M', 300) => Self::Tone,
            ('T', _) => Self::ToolSelect,
            _ => Self::Other,
        }
    }
}

/// Result of reading a `;LAYER:` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerMarker {
    /// Marker with a numeric layer index
    Index(i64),
    /// Marker whose suffix is not an integer
    Malformed,
}

/// A single parsed line of G-code
///
/// Parameters are letter/value pairs taken from the part of the line before
/// any `;` comment. A parameter whose number cannot be read is absent, never
/// zero. When a letter appears more than once the first occurrence wins.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction<'a> {
    line: &'a str,
    kind: CommandKind,
    params: Vec<(char, f64)>,
}

impl<'a> Instruction<'a> {
    /// Parse one line. Never fails.
    pub fn parse(line: &'a str) -> Self {
        let code = match line.find(';') {
            Some(pos) => &line[..pos],
            None => line,
        };

        let mut params: Vec<(char, f64)> = Vec::new();
        let mut kind = None;

        for (position, word) in code.split_whitespace().enumerate() {
            let mut chars = word.chars();
            let Some(letter) = chars.next().map(|c| c.to_ascii_uppercase()) else {
                continue;
            };
            if !letter.is_ascii_alphabetic() {
                continue;
            }
            let value = parse_number(chars.as_str());

            if position == 0 {
                kind = Some(match value {
                    Some(code) => CommandKind::classify(letter, code),
                    None => CommandKind::Other,
                });
            }

            if let Some(value) = value {
                if !params.iter().any(|(l, _)| *l == letter) {
                    params.push((letter, value));
                }
            }

            // M117 carries free text, not parameters
            if position == 0 && kind == Some(CommandKind::DisplayMessage) {
                break;
            }
        }

        let kind = kind.unwrap_or_else(|| {
            if line.trim().is_empty() {
                CommandKind::Empty
            } else {
                CommandKind::Comment
            }
        });

        Self { line, kind, params }
    }

    /// The raw line this instruction was parsed from
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// The command family
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Value of a parameter letter, if present and numeric
    pub fn value(&self, letter: char) -> Option<f64> {
        let letter = letter.to_ascii_uppercase();
        self.params
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, v)| *v)
    }

    /// Value of a parameter letter, or `default` when absent
    pub fn value_or(&self, letter: char, default: f64) -> f64 {
        self.value(letter).unwrap_or(default)
    }

    /// Whether a parameter letter is present
    pub fn has(&self, letter: char) -> bool {
        self.value(letter).is_some()
    }

    /// G0 or G1
    pub fn is_motion(&self) -> bool {
        matches!(self.kind, CommandKind::RapidMove | CommandKind::LinearMove)
    }

    /// The comment text after the first `;`, if any
    pub fn comment(&self) -> Option<&'a str> {
        self.line.find(';').map(|pos| &self.line[pos + 1..])
    }

    /// Read a `;LAYER:<n>` marker
    pub fn layer_marker(&self) -> Option<LayerMarker> {
        let suffix = self.line.trim_start().strip_prefix(LAYER_MARKER)?;
        Some(match suffix.trim().parse::<i64>() {
            Ok(index) => LayerMarker::Index(index),
            Err(_) => LayerMarker::Malformed,
        })
    }

    /// Read a `;FLAVOR:<name>` header comment
    pub fn flavor(&self) -> Option<&'a str> {
        self.line
            .trim_start()
            .strip_prefix(FLAVOR_MARKER)
            .map(str::trim)
    }
}

/// Read the leading number of a parameter word.
///
/// Accepts an optional minus sign, digits and an optional fraction
/// (`-12.5`, `300`, `7.`). Anything after the number is ignored.
fn parse_number(text: &str) -> Option<f64> {
    static NUMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex =
        NUMBER_REGEX.get_or_init(|| Regex::new(r"^-?[0-9]+\.?[0-9]*").expect("invalid regex pattern"));
    regex
        .find(text)
        .and_then(|m| m.as_str().trim_end_matches('.').parse::<f64>().ok())
}

/// Builder for generated G-code lines
///
/// Words are rendered in the fixed order `G M T S F X Y Z E`, followed by
/// any other letters in the order they were added. Setting a letter twice
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GcodeLine {
    words: Vec<(char, f64)>,
    comment: Option<String>,
}

impl GcodeLine {
    /// Start a `G<code>` line
    pub fn g(code: u32) -> Self {
        Self::default().word('G', f64::from(code))
    }

    /// Start an `M<code>` line
    pub fn m(code: u32) -> Self {
        Self::default().word('M', f64::from(code))
    }

    /// Set a word
    pub fn word(mut self, letter: char, value: f64) -> Self {
        let letter = letter.to_ascii_uppercase();
        match self.words.iter_mut().find(|(l, _)| *l == letter) {
            Some(existing) => existing.1 = value,
            None => self.words.push((letter, value)),
        }
        self
    }

    pub fn x(self, value: f64) -> Self {
        self.word('X', value)
    }

    pub fn y(self, value: f64) -> Self {
        self.word('Y', value)
    }

    pub fn z(self, value: f64) -> Self {
        self.word('Z', value)
    }

    pub fn e(self, value: f64) -> Self {
        self.word('E', value)
    }

    pub fn f(self, value: f64) -> Self {
        self.word('F', value)
    }

    pub fn s(self, value: f64) -> Self {
        self.word('S', value)
    }

    pub fn p(self, value: f64) -> Self {
        self.word('P', value)
    }

    /// Attach a trailing `; comment`
    pub fn comment(mut self, text: impl Into<String>) -> Self {
        self.comment = Some(text.into());
        self
    }

    fn rank(letter: char) -> usize {
        WORD_ORDER
            .iter()
            .position(|l| *l == letter)
            .unwrap_or(WORD_ORDER.len())
    }
}

impl fmt::Display for GcodeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&(char, f64)> = self.words.iter().collect();
        // stable: unlisted letters keep insertion order
        words.sort_by_key(|(letter, _)| Self::rank(*letter));

        let rendered: Vec<String> = words
            .iter()
            .map(|(letter, value)| format!("{}{}", letter, format_number(*value)))
            .collect();
        write!(f, "{}", rendered.join(" "))?;

        if let Some(comment) = &self.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}
