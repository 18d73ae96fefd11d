#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub screen_x: f32,
    pub screen_y: f32,
    pub scale: f32,
}

impl Projection {
    /// Stars at or behind the focal plane are never drawn.
    pub fn is_visible(&self) -> bool {
        self.scale > 0.0
    }
}

pub fn project(x: f32, y: f32, z: f32, focal_length: f32, center_x: f32, center_y: f32) -> Projection {
    let scale = focal_length / (focal_length + z);
    Projection {
        screen_x: center_x + x * scale,
        screen_y: center_y + y * scale,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_on_focal_plane_keeps_offset() {
        let p = project(100.0, -50.0, 0.0, 300.0, 800.0, 450.0);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.screen_x, 900.0);
        assert_eq!(p.screen_y, 400.0);
    }

    #[test]
    fn distant_star_converges_to_center() {
        let p = project(1000.0, 1000.0, 2700.0, 300.0, 0.0, 0.0);
        assert!((p.scale - 0.1).abs() < 1e-6);
        assert!((p.screen_x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn star_behind_camera_is_not_visible() {
        // z < -focal flips the sign of the scale.
        let p = project(1.0, 1.0, -400.0, 300.0, 0.0, 0.0);
        assert!(!p.is_visible());
        assert!(project(0.0, 0.0, 10.0, 300.0, 0.0, 0.0).is_visible());
    }
}
