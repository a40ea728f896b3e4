use glam::{DVec3, IVec3};

use crate::config::ProtectionConfig;

/// Square column of protected space around a center, optionally bounded in Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectedArea {
    center: Option<DVec3>,
    radius: i32,
    min_y: i32,
    max_y: i32,
}

impl ProtectedArea {
    /// Area around `center`. With no center nothing is protected.
    pub fn new(center: Option<DVec3>, config: &ProtectionConfig) -> Self {
        Self {
            center,
            radius: config.radius,
            min_y: config.min_y,
            max_y: config.max_y,
        }
    }

    pub fn center(&self) -> Option<DVec3> {
        self.center
    }

    pub fn set_center(&mut self, center: Option<DVec3>) {
        self.center = center;
    }

    /// Entity position. Y is truncated toward zero before the window check.
    pub fn contains(&self, position: DVec3) -> bool {
        self.within_square(position.x, position.z) && self.within_y(position.y as i32)
    }

    pub fn contains_block(&self, block: IVec3) -> bool {
        self.within_square(f64::from(block.x), f64::from(block.z)) && self.within_y(block.y)
    }

    fn within_square(&self, x: f64, z: f64) -> bool {
        let Some(center) = self.center else {
            return false;
        };
        let radius = f64::from(self.radius);
        (x - center.x).abs() <= radius && (z - center.z).abs() <= radius
    }

    /// -1 on either bound disables that side.
    fn within_y(&self, y: i32) -> bool {
        (self.min_y == -1 || y >= self.min_y) && (self.max_y == -1 || y <= self.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn area(min_y: i32, max_y: i32) -> ProtectedArea {
        let config = ProtectionConfig {
            radius: 10,
            min_y,
            max_y,
            ..ProtectionConfig::default()
        };
        ProtectedArea::new(Some(DVec3::new(100.0, 64.0, -50.0)), &config)
    }

    #[test]
    fn square_not_circle() {
        let area = area(-1, -1);
        assert!(area.contains(DVec3::new(110.0, 64.0, -40.0)));
        assert!(!area.contains(DVec3::new(110.5, 64.0, -50.0)));
        assert!(area.contains_block(IVec3::new(90, 0, -60)));
        assert!(!area.contains_block(IVec3::new(89, 0, -50)));
    }

    #[test]
    fn y_window_sides_are_independent() {
        let both = area(50, 80);
        assert!(both.contains_block(IVec3::new(100, 50, -50)));
        assert!(!both.contains_block(IVec3::new(100, 49, -50)));
        assert!(!both.contains_block(IVec3::new(100, 81, -50)));

        let floor_only = area(50, -1);
        assert!(floor_only.contains_block(IVec3::new(100, 1000, -50)));
        assert!(!floor_only.contains_block(IVec3::new(100, 10, -50)));

        let ceiling_only = area(-1, 80);
        assert!(ceiling_only.contains_block(IVec3::new(100, -200, -50)));
        assert!(!ceiling_only.contains_block(IVec3::new(100, 81, -50)));
    }

    #[test]
    fn entity_y_truncates_toward_zero() {
        let area = area(-1, 80);
        assert!(area.contains(DVec3::new(100.0, 80.9, -50.0)));
        assert!(!area.contains(DVec3::new(100.0, 81.0, -50.0)));
    }

    #[test]
    fn no_center_protects_nothing() {
        let mut area = area(-1, -1);
        area.set_center(None);
        assert!(!area.contains(DVec3::new(100.0, 64.0, -50.0)));
        assert!(!area.contains_block(IVec3::new(100, 64, -50)));
    }

    proptest! {
        #[test]
        fn chebyshev_distance_decides(dx in -30i32..30, dz in -30i32..30, y in -100i32..300) {
            let area = area(-1, -1);
            let block = IVec3::new(100 + dx, y, -50 + dz);
            prop_assert_eq!(area.contains_block(block), dx.abs().max(dz.abs()) <= 10);
        }
    }
}
