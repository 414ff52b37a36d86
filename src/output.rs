//! CLI output formatting.
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects. The library modules
//! themselves never print.

use crate::state::{EditState, Filter};

/// Indentation for detail lines under a header.
fn indent(line: impl AsRef<str>) -> String {
    format!("    {}", line.as_ref())
}

/// Summarize a session: dimensions, active filters, non-zero sliders,
/// history position.
pub fn format_session(
    state: &EditState,
    dimensions: Option<(u32, u32)>,
    history: Option<(usize, usize)>,
) -> Vec<String> {
    let mut lines = Vec::new();

    match dimensions {
        Some((w, h)) => lines.push(format!("Image {}x{}", w, h)),
        None => {
            lines.push("No image loaded".to_string());
            return lines;
        }
    }

    if state.tools.rotation != 0 {
        lines.push(indent(format!("Rotation: {}°", state.tools.rotation)));
    }

    let filters: Vec<&str> = state.filters.enabled().map(Filter::name).collect();
    if filters.is_empty() {
        lines.push(indent("Filters: none"));
    } else {
        lines.push(indent(format!("Filters: {}", filters.join(", "))));
    }

    let adj = &state.adjustments;
    let sliders = [
        ("exposure", adj.exposure),
        ("contrast", adj.contrast),
        ("saturation", adj.saturation),
        ("temperature", adj.temperature),
    ];
    let active: Vec<String> = sliders
        .iter()
        .filter(|(_, v)| *v != 0)
        .map(|(name, v)| format!("{} {:+}", name, v))
        .collect();
    if !active.is_empty() {
        lines.push(indent(format!("Adjustments: {}", active.join(", "))));
    }

    if state.tools.crop_enabled
        && let Some(rect) = state.tools.crop_rect
    {
        lines.push(indent(format!(
            "Crop: {}x{} at ({}, {}) [{}]",
            rect.width.round(),
            rect.height.round(),
            rect.x.round(),
            rect.y.round(),
            state.tools.aspect_ratio.name()
        )));
    }

    if let Some((index, len)) = history {
        lines.push(indent(format!("History: step {} of {}", index + 1, len)));
    }

    lines
}

pub fn print_session(
    state: &EditState,
    dimensions: Option<(u32, u32)>,
    history: Option<(usize, usize)>,
) {
    for line in format_session(state, dimensions, history) {
        println!("{}", line);
    }
}

/// One line per available filter, marking the randomized ones.
pub fn format_filter_list() -> Vec<String> {
    Filter::ALL
        .into_iter()
        .map(|f| {
            if f.is_randomized() {
                format!("{} (randomized)", f.name())
            } else {
                f.name().to_string()
            }
        })
        .collect()
}

pub fn print_filter_list() {
    for line in format_filter_list() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CropRect;
    use crate::state::{AspectRatio, Slider};

    #[test]
    fn unloaded_session_is_one_line() {
        let lines = format_session(&EditState::default(), None, None);
        assert_eq!(lines, vec!["No image loaded"]);
    }

    #[test]
    fn default_state_shows_dimensions_and_no_filters() {
        let lines = format_session(&EditState::default(), Some((800, 600)), Some((0, 1)));
        assert_eq!(lines[0], "Image 800x600");
        assert_eq!(lines[1], "    Filters: none");
        assert_eq!(lines[2], "    History: step 1 of 1");
    }

    #[test]
    fn active_edits_are_listed() {
        let mut state = EditState::default();
        state.filters.set(Filter::Sepia, true);
        state.filters.set(Filter::Moon, true);
        state.adjustments.set(Slider::Exposure, 40);
        state.adjustments.set(Slider::Temperature, -15);

        let lines = format_session(&state, Some((640, 480)), None);
        assert!(lines.contains(&"    Filters: sepia, moon".to_string()));
        assert!(lines.contains(&"    Adjustments: exposure +40, temperature -15".to_string()));
    }

    #[test]
    fn crop_and_rotation_are_reported() {
        let mut state = EditState::default();
        state.tools.rotation = 90;
        state.tools.crop_enabled = true;
        state.tools.aspect_ratio = AspectRatio::Square;
        state.tools.crop_rect = Some(CropRect::new(60.0, 60.0, 480.0, 480.0));

        let lines = format_session(&state, Some((600, 800)), None);
        assert!(lines.contains(&"    Rotation: 90°".to_string()));
        assert!(lines.contains(&"    Crop: 480x480 at (60, 60) [1:1]".to_string()));
    }

    #[test]
    fn filter_list_marks_randomized_entries() {
        let lines = format_filter_list();
        assert_eq!(lines.len(), 16);
        assert!(lines.contains(&"sepia".to_string()));
        assert!(lines.contains(&"noise (randomized)".to_string()));
        assert!(lines.contains(&"robeautify (randomized)".to_string()));
    }
}
