//! Resume position lookup around the trigger layer

use serde::Serialize;
use std::ops::Range;

use crate::gcode::Instruction;

/// Where the head returns to after the pause
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResumePosition {
    pub x: f64,
    pub y: f64,
    /// Absolute extruder position restored with G92
    pub e: f64,
}

/// First line of `text` carrying both X and Y
pub fn first_xy(text: &str) -> Option<(f64, f64)> {
    text.lines().find_map(|line| {
        let ins = Instruction::parse(line);
        Some((ins.value('X')?, ins.value('Y')?))
    })
}

/// Last non-negative E in `text`, scanning from the end
pub fn last_extruder_position(text: &str) -> Option<f64> {
    text.lines()
        .rev()
        .filter_map(|line| Instruction::parse(line).value('E'))
        .find(|e| *e >= 0.0)
}

/// Resolved resume data for one trigger
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub position: ResumePosition,
    /// Layers printed again after the pause, oldest first
    pub redo: Range<usize>,
    pub xy_found: bool,
    pub e_found: bool,
}

impl Resolution {
    /// Number of layers redone
    pub fn redone_layers(&self) -> usize {
        self.redo.len()
    }
}

/// Looks ahead and behind the trigger layer
#[derive(Debug)]
pub struct ResumeResolver<'a> {
    layers: &'a [String],
}

impl<'a> ResumeResolver<'a> {
    pub fn new(layers: &'a [String]) -> Self {
        Self { layers }
    }

    /// Resolve the resume position for a trigger in layer `index`.
    ///
    /// Without redo, X/Y comes from the next layer and E from the previous
    /// one. With redo, the count is clamped to the layers available before
    /// the trigger; X/Y then comes from the redone layers followed by the
    /// trigger layer, and E from the layer just before the oldest redone
    /// one. Anything not found falls back to 0.
    pub fn resolve(&self, index: usize, redo_layers: usize) -> Resolution {
        let redo_count = redo_layers.min(index);
        let first_redone = index - redo_count;

        let xy = if redo_count == 0 {
            self.layers.get(index + 1).and_then(|layer| first_xy(layer))
        } else {
            self.layers[first_redone..=index]
                .iter()
                .find_map(|layer| first_xy(layer))
        };

        let e = first_redone
            .checked_sub(1)
            .and_then(|before| self.layers.get(before))
            .and_then(|layer| last_extruder_position(layer));

        let (x, y) = xy.unwrap_or((0.0, 0.0));
        Resolution {
            position: ResumePosition {
                x,
                y,
                e: e.unwrap_or(0.0),
            },
            redo: first_redone..index,
            xy_found: xy.is_some(),
            e_found: e.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_first_xy() {
        assert_eq!(first_xy("G1 X1\nG1 Y2\nG0 X3 Y4\nG1 X5 Y6"), Some((3.0, 4.0)));
        assert_eq!(first_xy("G1 Z2\n; X1 Y1"), None);
    }

    #[test]
    fn test_last_extruder_position_skips_negative() {
        assert_eq!(
            last_extruder_position("G1 E3\nG1 E7.5\nG1 E-1\nG1 X1"),
            Some(7.5)
        );
        assert_eq!(last_extruder_position("G1 E-2\nG1 X4"), None);
    }

    #[test]
    fn test_resolve_without_redo() {
        let layers = layers(&[
            "G28\n",
            ";LAYER:0\nG1 X1 Y1 E1\nG1 E12.5\n",
            ";LAYER:1\nG1 X9 Y9 E14\n",
            ";LAYER:2\nG0 X20 Y30\n",
        ]);
        let r = ResumeResolver::new(&layers).resolve(2, 0);
        assert_eq!(r.position, ResumePosition { x: 20.0, y: 30.0, e: 12.5 });
        assert_eq!(r.redone_layers(), 0);
        assert!(r.xy_found && r.e_found);
    }

    #[test]
    fn test_resolve_last_layer_falls_back() {
        let layers = layers(&[";LAYER:0\nG1 Z0.3\n"]);
        let r = ResumeResolver::new(&layers).resolve(0, 0);
        assert_eq!(r.position, ResumePosition::default());
        assert!(!r.xy_found);
        assert!(!r.e_found);
    }

    #[test]
    fn test_resolve_with_redo() {
        let layers = layers(&[
            "G28\nG1 E0.5\n",
            ";LAYER:0\nG1 X1 Y2 E1\nG1 E2\n",
            ";LAYER:1\nG1 X3 Y4 E3\n",
            ";LAYER:2\nG1 X5 Y6 E5\n",
            ";LAYER:3\nG1 X7 Y8 E7\n",
        ]);
        let r = ResumeResolver::new(&layers).resolve(3, 2);
        assert_eq!(r.redo, 1..3);
        assert_eq!(r.position, ResumePosition { x: 1.0, y: 2.0, e: 0.5 });
    }

    #[test]
    fn test_redo_clamped() {
        let layers = layers(&[";LAYER:0\nG1 X1 Y1 E1\n", ";LAYER:1\nG1 X2 Y2 E2\n"]);
        let r = ResumeResolver::new(&layers).resolve(1, 5);
        assert_eq!(r.redo, 0..1);
        assert_eq!((r.position.x, r.position.y), (1.0, 1.0));
        assert!(!r.e_found);
    }
}
