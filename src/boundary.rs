use bevy::math::{Vec2, Vec3};

/// Rectangular play area on the x/z plane, attached to the platform map when it is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryRegion {
    pub center: Vec3,
    pub half_extents: Vec2,
}

impl BoundaryRegion {
    /// Builds a region from full x/z sizes, as they are configured.
    pub fn from_bounds(center: Vec3, bounds: Vec2) -> Self {
        Self {
            center,
            half_extents: bounds.abs() * 0.5,
        }
    }

    /// Clamps x/z into the region. Height passes through untouched.
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        let local = position - self.center;
        let x = local.x.clamp(-self.half_extents.x, self.half_extents.x);
        let z = local.z.clamp(-self.half_extents.y, self.half_extents.y);
        Vec3::new(self.center.x + x, position.y, self.center.z + z)
    }

    pub fn contains(&self, position: Vec3) -> bool {
        let local = position - self.center;
        local.x.abs() <= self.half_extents.x && local.z.abs() <= self.half_extents.y
    }
}
