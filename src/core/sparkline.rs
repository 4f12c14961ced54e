//! Trend line helpers for rendering the recent history.
//!
//! Values are scaled between the window's own min and max, so the line always
//! uses the full height. A flat window draws along the bottom.

/// Block glyphs from lowest to highest.
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Map samples onto a `width` x `height` box, y growing downwards.
///
/// Returns no points for fewer than two samples.
pub fn points(values: &[i32], width: f64, height: f64) -> Vec<(f64, f64)> {
    let Some((min, range)) = window(values) else {
        return Vec::new();
    };

    let step_x = width / (values.len() - 1) as f64;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let x = i as f64 * step_x;
            let y = height * (1.0 - (v as i64 - min) as f64 / range as f64);
            (x, y)
        })
        .collect()
}

/// Render samples as a row of block glyphs.
///
/// Returns an empty string for fewer than two samples.
pub fn render(values: &[i32]) -> String {
    let Some((min, range)) = window(values) else {
        return String::new();
    };

    let top = (BLOCKS.len() - 1) as f64;
    values
        .iter()
        .map(|&v| {
            let level = ((v as i64 - min) as f64 / range as f64 * top).round() as usize;
            BLOCKS[level.min(BLOCKS.len() - 1)]
        })
        .collect()
}

/// Minimum and (non-zero) spread of a window with at least two samples.
///
/// Widened to `i64` since replayed values are not clamped.
fn window(values: &[i32]) -> Option<(i64, i64)> {
    if values.len() < 2 {
        return None;
    }
    let min = *values.iter().min()? as i64;
    let max = *values.iter().max()? as i64;
    Some((min, (max - min).max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_few_values() {
        assert!(points(&[], 100.0, 30.0).is_empty());
        assert!(points(&[72], 100.0, 30.0).is_empty());
        assert_eq!(render(&[72]), "");
    }

    #[test]
    fn test_points_span_the_box() {
        let pts = points(&[60, 80, 70], 100.0, 30.0);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], (0.0, 30.0));
        assert_eq!(pts[1], (50.0, 0.0));
        assert_eq!(pts[2], (100.0, 15.0));
    }

    #[test]
    fn test_flat_window_draws_along_bottom() {
        let pts = points(&[70, 70, 70], 10.0, 30.0);
        assert!(pts.iter().all(|&(_, y)| y == 30.0));
        assert_eq!(render(&[70, 70, 70]), "▁▁▁");
    }

    #[test]
    fn test_render_extremes() {
        let line = render(&[55, 120, 55]);
        assert_eq!(line.chars().count(), 3);
        assert_eq!(line, "▁█▁");
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let values = [-2_000_000_000, 2_000_000_000, i32::MIN, i32::MAX];
        assert_eq!(render(&values), "▁█▁█");
        assert_eq!(render(&[i32::MIN, i32::MAX]), "▁█");

        let pts = points(&[i32::MIN, 0, i32::MAX], 2.0, 10.0);
        assert_eq!(pts[0], (0.0, 10.0));
        assert_eq!(pts[2], (2.0, 0.0));
        assert!((pts[1].1 - 5.0).abs() < 1e-6);
    }
}
