use glam::DVec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    min: DVec3,
    max: DVec3
}

impl AABB {
    pub fn new(min: DVec3, max: DVec3) -> Option<AABB> {
        if min.x <= max.x && min.y <= max.y && min.z <= max.z {
            Some(Self {
                min,
                max
            })
        } else {
            None
        }
    }

    /// Box of the given footprint standing on `position`: the bottom face is
    /// centered on the position, the top face is `height` above it.
    pub fn standing_at(position: DVec3, width: f64, height: f64) -> AABB {
        let half_width = width.abs() / 2.0;
        Self {
            min: DVec3::new(position.x - half_width, position.y, position.z - half_width),
            max: DVec3::new(position.x + half_width, position.y + height.abs(), position.z + half_width)
        }
    }

    pub fn block(x: i32, y: i32, z: i32) -> AABB {
        let min = DVec3::new(x as f64, y as f64, z as f64);
        Self {
            min,
            max: min + 1.0
        }
    }

    pub fn expand(&self, vec: DVec3) -> AABB {
        let mut bounds = *self;
        for i in 0..3 {
            if vec[i] < 0.0 {
                bounds.min[i] += vec[i];
            } else {
                bounds.max[i] += vec[i];
            }
        }
        bounds
    }

    /// Grows the box by the given amounts in both directions of each axis.
    pub fn grow(&self, x: f64, y: f64, z: f64) -> AABB {
        let amount = DVec3::new(x, y, z).abs();
        Self {
            min: self.min - amount,
            max: self.max + amount
        }
    }

    pub fn translate(&self, offset: DVec3) -> AABB {
        Self {
            min: self.min + offset,
            max: self.max + offset
        }
    }

    /// Strict overlap. Boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
            self.min.y < other.max.y && self.max.y > other.min.y &&
            self.min.z < other.max.z && self.max.z > other.min.z
    }

    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn min(&self) -> DVec3 {
        self.min
    }

    pub fn max(&self) -> DVec3 {
        self.max
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn minkowski_difference(&self, other: AABB) -> AABB {
        let min = self.min - other.max;
        let max = self.max - other.min;

        // Both boxes are well-formed, so the difference is as well
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        assert!(AABB::new(DVec3::ONE, DVec3::ZERO).is_none());
        assert!(AABB::new(DVec3::ZERO, DVec3::ZERO).is_some());
    }

    #[test]
    fn standing_box_is_centered_on_feet() {
        let aabb = AABB::standing_at(DVec3::new(8.5, 4.0, 8.5), 0.6, 1.8);
        assert!(aabb.min().abs_diff_eq(DVec3::new(8.2, 4.0, 8.2), 1e-9));
        assert!((aabb.max().y - 5.8).abs() < 1e-9);
        assert!((aabb.size().x - 0.6).abs() < 1e-9);
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let a = AABB::block(0, 0, 0);
        let b = AABB::block(1, 0, 0);
        assert!(!a.intersects(&b));
        assert!(a.grow(0.1, 0.0, 0.0).intersects(&b));
    }

    #[test]
    fn expand_only_moves_the_leading_face() {
        let aabb = AABB::block(0, 0, 0).expand(DVec3::new(0.0, -2.0, 3.0));
        assert_eq!(aabb.min(), DVec3::new(0.0, -2.0, 0.0));
        assert_eq!(aabb.max(), DVec3::new(1.0, 1.0, 4.0));
    }
}
