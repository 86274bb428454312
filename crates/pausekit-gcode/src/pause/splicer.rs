//! Rewrites the trigger layer with the pause block

use std::ops::Range;

/// Replace layer `index` with `block`, the redone layers and the original
/// layer text, in that order. Other layers are untouched.
///
/// A redone layer that does not end in a newline gets one, so its last
/// line cannot run into the next.
pub fn splice(layers: &mut [String], index: usize, block: &str, redo: Range<usize>) {
    let Some(trigger_layer) = layers.get(index) else {
        return;
    };

    let mut rewritten = String::with_capacity(block.len() + trigger_layer.len());
    rewritten.push_str(block);
    for layer in &layers[redo] {
        rewritten.push_str(layer);
        if !layer.is_empty() && !layer.ends_with('\n') {
            rewritten.push('\n');
        }
    }
    rewritten.push_str(trigger_layer);

    layers[index] = rewritten;
}
