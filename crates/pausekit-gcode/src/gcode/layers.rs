//! Splitting a G-code document into layers and joining it back

use super::LAYER_MARKER;

/// Split a document into layer chunks.
///
/// A new chunk starts at every line beginning with `;LAYER:`. The first
/// chunk holds everything before the first marker (header and start code).
/// Line endings are kept, so [`join_layers`] restores the exact input.
pub fn split_layers(text: &str) -> Vec<String> {
    let mut layers = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with(LAYER_MARKER) && !current.is_empty() {
            layers.push(std::mem::take(&mut current));
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        layers.push(current);
    }

    layers
}

/// Concatenate layer chunks back into one document
pub fn join_layers(layers: &[String]) -> String {
    layers.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_markers() {
        let text = ";FLAVOR:Marlin\nG28\n;LAYER:0\nG1 Z0.3\n;LAYER:1\nG1 Z0.5\n";
        let layers = split_layers(text);
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0], ";FLAVOR:Marlin\nG28\n");
        assert_eq!(layers[1], ";LAYER:0\nG1 Z0.3\n");
        assert_eq!(layers[2], ";LAYER:1\nG1 Z0.5\n");
    }

    #[test]
    fn test_marker_first_line() {
        let layers = split_layers(";LAYER:0\nG1 Z0.3");
        assert_eq!(layers, vec![";LAYER:0\nG1 Z0.3".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_layers("").is_empty());
        assert_eq!(join_layers(&[]), "");
    }

    #[test]
    fn test_round_trip_preserves_crlf() {
        let text = "G28\r\n;LAYER:0\r\nG1 Z0.3\r\n;LAYER:1\r\nG1 Z0.5";
        assert_eq!(join_layers(&split_layers(text)), text);
    }
}
