//! Quadtree point index used to detect coincident positions.

use stoon_core::{CenterPoint, CornerPoint, WorldPos};

use crate::config::IndexConfig;

/// Values that occupy a single position on the world plane.
pub trait Located {
    /// Position of the value.
    fn location(&self) -> WorldPos;
}

impl Located for WorldPos {
    fn location(&self) -> WorldPos {
        *self
    }
}

impl Located for CenterPoint {
    fn location(&self) -> WorldPos {
        self.world_pos
    }
}

impl Located for CornerPoint {
    fn location(&self) -> WorldPos {
        self.world_pos
    }
}

/// Hierarchical partition of a square region that stores keyed points.
///
/// Nodes split into four quadrants once they hold more than
/// [`IndexConfig::node_capacity`] points, unless their side is already at the
/// [`IndexConfig::min_node_size`] floor. Points that fall outside the root
/// square go to an overflow list that every query scans.
#[derive(Clone, Debug)]
pub struct SpatialIndex<K, P> {
    config: IndexConfig,
    root: Node<K, P>,
    overflow: Vec<(K, P)>,
    len: usize,
}

impl<K, P: Located> SpatialIndex<K, P> {
    /// Creates an empty index covering `config.extent` around the origin.
    #[must_use]
    pub fn new(config: IndexConfig) -> Self {
        Self {
            root: Node::new(WorldPos::new(0.0, 0.0), config.extent),
            overflow: Vec::new(),
            len: 0,
            config,
        }
    }

    /// Inserts a point unless another point lies within the duplicate epsilon.
    ///
    /// Returns `false` when the point was refused, either as a duplicate or
    /// because its position is not finite.
    pub fn insert(&mut self, key: K, point: P) -> bool {
        let position = point.location();
        if !position.is_finite() {
            return false;
        }

        if !self
            .find_nearby(position, self.config.duplicate_epsilon)
            .is_empty()
        {
            return false;
        }

        if self.root.contains(position) {
            let capacity = self.config.node_capacity.max(1);
            self.root
                .insert(key, point, capacity, self.config.min_node_size);
        } else {
            self.overflow.push((key, point));
        }
        self.len += 1;
        true
    }

    /// Collects every point within `radius` of `position`.
    #[must_use]
    pub fn find_nearby(&self, position: WorldPos, radius: f64) -> Vec<(&K, &P)> {
        let mut found = Vec::new();
        if !position.is_finite() || radius.is_nan() || radius < 0.0 {
            return found;
        }

        self.root.find_nearby(position, radius, &mut found);
        for (key, point) in &self.overflow {
            if point.location().distance(position) <= radius {
                found.push((key, point));
            }
        }
        found
    }

    /// Flattens the whole tree.
    #[must_use]
    pub fn all_points(&self) -> Vec<(&K, &P)> {
        let mut points = Vec::with_capacity(self.len);
        self.root.collect(&mut points);
        points.extend(self.overflow.iter().map(|(key, point)| (key, point)));
        points
    }

    /// Number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the index holds no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels below the root, for diagnostics.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Removes every point and collapses the tree back to a single node.
    pub fn clear(&mut self) {
        self.root = Node::new(WorldPos::new(0.0, 0.0), self.config.extent);
        self.overflow.clear();
        self.len = 0;
    }
}

#[derive(Clone, Debug)]
struct Node<K, P> {
    center: WorldPos,
    size: f64,
    points: Vec<(K, P)>,
    children: Option<Box<[Node<K, P>; 4]>>,
}

impl<K, P: Located> Node<K, P> {
    fn new(center: WorldPos, size: f64) -> Self {
        Self {
            center,
            size,
            points: Vec::new(),
            children: None,
        }
    }

    fn contains(&self, position: WorldPos) -> bool {
        let half = self.size / 2.0;
        position.x >= self.center.x - half
            && position.x <= self.center.x + half
            && position.z >= self.center.z - half
            && position.z <= self.center.z + half
    }

    fn insert(&mut self, key: K, point: P, capacity: usize, min_size: f64) {
        if let Some(children) = self.children.as_deref_mut() {
            let quadrant = quadrant_of(self.center, point.location());
            children[quadrant].insert(key, point, capacity, min_size);
            return;
        }

        if self.points.len() >= capacity && self.size > min_size {
            self.split(capacity, min_size);
            self.insert(key, point, capacity, min_size);
            return;
        }

        self.points.push((key, point));
    }

    fn split(&mut self, capacity: usize, min_size: f64) {
        let half = self.size / 2.0;
        let quarter = self.size / 4.0;
        let at = |dx: f64, dz: f64| {
            Node::new(
                WorldPos::new(self.center.x + dx, self.center.z + dz),
                half,
            )
        };
        // Quadrant order must match `quadrant_of`.
        let mut children = Box::new([
            at(-quarter, -quarter),
            at(quarter, -quarter),
            at(-quarter, quarter),
            at(quarter, quarter),
        ]);

        for (key, point) in self.points.drain(..) {
            let quadrant = quadrant_of(self.center, point.location());
            children[quadrant].insert(key, point, capacity, min_size);
        }
        self.children = Some(children);
    }

    fn find_nearby<'a>(&'a self, position: WorldPos, radius: f64, out: &mut Vec<(&'a K, &'a P)>) {
        match self.children.as_deref() {
            None => {
                for (key, point) in &self.points {
                    if point.location().distance(position) <= radius {
                        out.push((key, point));
                    }
                }
            }
            Some(children) => {
                for child in children {
                    if child.intersects_circle(position, radius) {
                        child.find_nearby(position, radius, out);
                    }
                }
            }
        }
    }

    fn intersects_circle(&self, circle: WorldPos, radius: f64) -> bool {
        let half = self.size / 2.0;
        let dx = (circle.x - self.center.x).abs();
        let dz = (circle.z - self.center.z).abs();

        if dx > half + radius || dz > half + radius {
            return false;
        }
        if dx <= half || dz <= half {
            return true;
        }

        let corner_x = dx - half;
        let corner_z = dz - half;
        corner_x * corner_x + corner_z * corner_z <= radius * radius
    }

    fn collect<'a>(&'a self, out: &mut Vec<(&'a K, &'a P)>) {
        match self.children.as_deref() {
            None => out.extend(self.points.iter().map(|(key, point)| (key, point))),
            Some(children) => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }

    fn depth(&self) -> usize {
        self.children.as_deref().map_or(0, |children| {
            1 + children.iter().map(Node::depth).max().unwrap_or(0)
        })
    }
}

/// Quadrant index: south-west, south-east, north-west, north-east.
fn quadrant_of(center: WorldPos, position: WorldPos) -> usize {
    let east = usize::from(position.x >= center.x);
    let north = usize::from(position.z >= center.z);
    north * 2 + east
}
