use crate::geometry::{Position, pos};

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 10;

#[derive(Clone, Copy)]
pub(super) struct QuadBounds {
    pub(super) center: Position,
    pub(super) half_extent: f64,
}

impl QuadBounds {
    fn from_points(points: &[Position]) -> Option<Self> {
        let mut min = pos(f64::INFINITY, f64::INFINITY);
        let mut max = pos(f64::NEG_INFINITY, f64::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let center = (min + max) * 0.5;
        let span_x = (max.x - min.x).max(1.0);
        let span_y = (max.y - min.y).max(1.0);
        let half_extent = (span_x.max(span_y) * 0.5) + 1.0;

        Some(Self {
            center,
            half_extent,
        })
    }

    pub(super) fn contains(self, point: Position) -> bool {
        let min = self.center - pos(self.half_extent, self.half_extent);
        let max = self.center + pos(self.half_extent, self.half_extent);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => pos(-quarter, -quarter),
            1 => pos(quarter, -quarter),
            2 => pos(-quarter, quarter),
            _ => pos(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Position) -> usize {
        let right = point.x >= self.center.x;
        let upper = point.y >= self.center.y;
        match (right, upper) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    pub(super) fn side_length(self) -> f64 {
        self.half_extent * 2.0
    }
}

/// Barnes-Hut cell. `mass` is the sum of body masses below this cell and
/// `center_of_mass` their mass-weighted centroid.
pub(super) struct QuadNode {
    pub(super) bounds: QuadBounds,
    pub(super) center_of_mass: Position,
    pub(super) mass: f64,
    pub(super) indices: Vec<usize>,
    pub(super) children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    pub(super) fn build(positions: &[Position], masses: &[f64]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, masses, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Position],
        masses: &[f64],
        depth: usize,
    ) -> Self {
        let mut weighted = Position::ZERO;
        let mut mass = 0.0;
        for &index in &indices {
            weighted += positions[index] * masses[index];
            mass += masses[index];
        }

        let center_of_mass = if mass > 0.0 { weighted / mass } else { bounds.center };

        let mut node = Self {
            bounds,
            center_of_mass,
            mass,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            let child_bounds = bounds.child(quadrant);
            node.children[quadrant] = Some(Box::new(Self::build_node(
                child_bounds,
                bucket,
                positions,
                masses,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_mass_and_centroid_are_weighted() {
        let positions = [pos(0.0, 0.0), pos(10.0, 0.0)];
        let masses = [40.0, 120.0];

        let root = QuadNode::build(&positions, &masses).expect("finite points");

        assert_eq!(root.mass, 160.0);
        assert_eq!(root.center_of_mass, pos(7.5, 0.0));
        assert!(root.is_leaf());
    }

    #[test]
    fn large_inputs_split_into_children() {
        let positions = (0..100)
            .map(|index| pos((index % 10) as f64 * 50.0, (index / 10) as f64 * 50.0))
            .collect::<Vec<_>>();
        let masses = vec![1.0; positions.len()];

        let root = QuadNode::build(&positions, &masses).expect("finite points");

        assert!(!root.is_leaf());
        assert!(root.indices.is_empty());
        assert!(root.bounds.contains(pos(225.0, 225.0)));
    }

    #[test]
    fn non_finite_points_build_nothing() {
        assert!(QuadNode::build(&[pos(f64::NAN, 0.0)], &[1.0]).is_none());
    }
}
