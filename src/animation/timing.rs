//! Per-frame duration computation.

use crate::types::ExportSettings;

const DEFAULT_FPS: f64 = 24.0;

/// Round `ms` to the nearest multiple of `unit`.
fn quantize(ms: f64, unit: u32) -> i64 {
    let unit = unit.max(1) as f64;
    ((ms / unit).round() * unit) as i64
}

/// Durations in milliseconds for each selected frame.
///
/// `explicit` holds one entry per selected frame; a `Some` value (Aseprite
/// frame durations) replaces the fps-derived duration for that frame.
/// `granularity` is the codec's delay unit (10 for GIF). Every frame lasts at
/// least one unit. The last frame absorbs the end delay and any shortfall
/// against the minimum period.
pub fn frame_durations(explicit: &[Option<u32>], settings: &ExportSettings, granularity: u32) -> Vec<u32> {
    let n = explicit.len();
    if n == 0 {
        return Vec::new();
    }

    let unit = granularity.max(1);
    let fps = if settings.fps > 0.0 && settings.fps.is_finite() {
        settings.fps
    } else {
        DEFAULT_FPS
    };
    let base = 1000.0 / fps;

    let mut durations: Vec<u32> = explicit
        .iter()
        .enumerate()
        .map(|(i, explicit)| {
            let ms = match explicit {
                Some(ms) => quantize(*ms as f64, unit),
                None if settings.variable_delay => {
                    quantize((i + 1) as f64 * base, unit) - quantize(i as f64 * base, unit)
                }
                None => quantize(base, unit),
            };
            ms.max(unit as i64).min(u32::MAX as i64) as u32
        })
        .collect();

    let last = n - 1;
    durations[last] = durations[last].saturating_add(settings.end_delay_ms);

    let total: u64 = durations.iter().map(|&d| d as u64).sum();
    let shortfall = (settings.min_period_ms as u64).saturating_sub(total);
    durations[last] = durations[last].saturating_add(shortfall as u32);

    durations
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(fps: f64, delay: u32, period: u32, variable: bool) -> ExportSettings {
        ExportSettings {
            fps,
            end_delay_ms: delay,
            min_period_ms: period,
            variable_delay: variable,
            ..Default::default()
        }
    }

    #[test]
    fn test_uniform_with_end_delay() {
        let d = frame_durations(&[None, None], &settings(10.0, 100, 0, false), 1);
        assert_eq!(d, vec![100, 200]);
    }

    #[test]
    fn test_variable_delay_tracks_ideal_total() {
        let d = frame_durations(&[None; 3], &settings(30.0, 0, 0, true), 1);
        assert_eq!(d, vec![33, 34, 33]);
        assert_eq!(d.iter().sum::<u32>(), 100);
    }

    #[test]
    fn test_gif_granularity() {
        let d = frame_durations(&[None; 2], &settings(24.0, 0, 0, false), 10);
        assert_eq!(d, vec![40, 40]);
    }

    #[test]
    fn test_period_shortfall_goes_to_last() {
        let d = frame_durations(&[None; 3], &settings(10.0, 50, 1000, false), 1);
        assert_eq!(d, vec![100, 100, 800]);
    }

    #[test]
    fn test_zero_fps_defaults() {
        let d = frame_durations(&[None], &settings(0.0, 0, 0, false), 1);
        assert_eq!(d, vec![42]);
    }

    #[test]
    fn test_explicit_durations_override() {
        let d = frame_durations(&[Some(100), None, Some(80)], &settings(10.0, 0, 0, false), 1);
        assert_eq!(d, vec![100, 100, 80]);
    }

    #[test]
    fn test_minimum_one_unit() {
        let d = frame_durations(&[None; 2], &settings(5000.0, 0, 0, false), 10);
        assert_eq!(d, vec![10, 10]);
    }

    #[test]
    fn test_empty_selection() {
        assert!(frame_durations(&[], &settings(10.0, 100, 500, false), 1).is_empty());
    }

    #[test]
    fn test_sum_invariant() {
        for fps in [1.0, 12.0, 24.0, 59.94] {
            for delay in [0, 7, 250] {
                for period in [0, 100, 5000] {
                    for n in 1..6 {
                        let s = settings(fps, delay, period, false);
                        let naive: u32 = frame_durations(&vec![None; n], &settings(fps, 0, 0, false), 1)
                            .iter()
                            .sum();
                        let sum: u32 = frame_durations(&vec![None; n], &s, 1).iter().sum();
                        assert!(sum >= period);
                        assert_eq!(sum, naive + delay + period.saturating_sub(naive + delay));
                    }
                }
            }
        }
    }
}
