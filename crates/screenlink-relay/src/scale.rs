//! Display-scale negotiation between an agent screen and a viewer viewport.

use crate::protocol::{AgentScreen, ViewerScreen};

/// Fraction of the viewport the remote screen may occupy.
pub const VIEWPORT_MARGIN: f64 = 0.9;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 2.0;

/// Advisory render scale that fits `agent` into the viewer's window,
/// preserving aspect ratio.
pub fn compute_scale(agent: &AgentScreen, viewer: &ViewerScreen) -> f64 {
    let scale_x = (viewer.window_width * VIEWPORT_MARGIN) / f64::from(agent.width);
    let scale_y = (viewer.window_height * VIEWPORT_MARGIN) / f64::from(agent.height);
    let scale = scale_x.min(scale_y);

    // 0/0 from a zero-sized agent and viewer.
    if scale.is_nan() {
        return MIN_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(width: u32, height: u32) -> AgentScreen {
        AgentScreen {
            width,
            height,
            dpi: None,
        }
    }

    fn viewer(window_width: f64, window_height: f64) -> ViewerScreen {
        ViewerScreen {
            window_width,
            window_height,
            device_pixel_ratio: None,
        }
    }

    #[test]
    fn half_size_viewport_with_margin() {
        assert_eq!(compute_scale(&agent(1920, 1080), &viewer(960.0, 540.0)), 0.45);
    }

    #[test]
    fn smaller_axis_wins() {
        // Wide viewport: height is the constraint.
        let scale = compute_scale(&agent(1000, 1000), &viewer(2000.0, 500.0));
        assert!((scale - 0.45).abs() < 1e-12);
    }

    #[test]
    fn clamps_to_max() {
        assert_eq!(compute_scale(&agent(100, 100), &viewer(10000.0, 10000.0)), MAX_SCALE);
    }

    #[test]
    fn clamps_to_min() {
        assert_eq!(compute_scale(&agent(10000, 10000), &viewer(1.0, 1.0)), MIN_SCALE);
    }

    #[test]
    fn zero_sized_agent_clamps() {
        assert_eq!(compute_scale(&agent(0, 0), &viewer(800.0, 600.0)), MAX_SCALE);
        assert_eq!(compute_scale(&agent(0, 0), &viewer(0.0, 0.0)), MIN_SCALE);
    }

    #[test]
    fn dpi_does_not_affect_scale() {
        let mut hi_dpi = agent(1920, 1080);
        hi_dpi.dpi = Some(192.0);
        let mut retina = viewer(960.0, 540.0);
        retina.device_pixel_ratio = Some(2.0);
        assert_eq!(compute_scale(&hi_dpi, &retina), 0.45);
    }
}
