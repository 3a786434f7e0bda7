//! Geometry information

/// A point in space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point {
    coords: [f64; 3],
}

impl Point {
    /// Create a new point.
    pub fn new(coords: [f64; 3]) -> Self {
        Self { coords }
    }

    /// Return the coordinates of the point.
    pub fn coords(&self) -> [f64; 3] {
        self.coords
    }

    /// Move the point by `dt * velocity`.
    pub fn advanced(&self, velocity: [f64; 3], dt: f64) -> Self {
        let [x, y, z] = self.coords;
        Self::new([
            x + dt * velocity[0],
            y + dt * velocity[1],
            z + dt * velocity[2],
        ])
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [x, y, z] = self.coords;
        write!(f, "({}, {}, {})", x, y, z)
    }
}

/// A bounding box describes the region a dataset lives in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhysicalBox {
    coords: [f64; 6],
}

impl PhysicalBox {
    /// Create a new bounding box.
    ///
    /// The coordinates are given by `[xmin, ymin, zmin, xmax, ymax, zmax]`.
    pub fn new(coords: [f64; 6]) -> Self {
        Self { coords }
    }

    /// The unit cube `[0, 1]^3`.
    pub fn unit() -> Self {
        Self::new([0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }

    /// Return coordinates
    pub fn coordinates(&self) -> [f64; 6] {
        self.coords
    }

    /// Check if a point lies inside the box. The upper faces are included.
    pub fn contains(&self, point: &Point) -> bool {
        let [xmin, ymin, zmin, xmax, ymax, zmax] = self.coords;
        let [x, y, z] = point.coords();

        (xmin..=xmax).contains(&x) && (ymin..=ymax).contains(&y) && (zmin..=zmax).contains(&z)
    }

    /// Map a point from the reference box to the physical box.
    pub fn reference_to_physical(&self, point: [f64; 3]) -> Point {
        let [xmin, ymin, zmin, xmax, ymax, zmax] = self.coords;

        Point::new([
            xmin + (xmax - xmin) * point[0],
            ymin + (ymax - ymin) * point[1],
            zmin + (zmax - zmin) * point[2],
        ])
    }

    /// Map a point from the physical box to the reference box.
    pub fn physical_to_reference(&self, point: &Point) -> [f64; 3] {
        let [xmin, ymin, zmin, xmax, ymax, zmax] = self.coords;
        let point = point.coords();

        [
            (point[0] - xmin) / (xmax - xmin),
            (point[1] - ymin) / (ymax - ymin),
            (point[2] - zmin) / (zmax - zmin),
        ]
    }
}

impl std::fmt::Display for PhysicalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [xmin, ymin, zmin, xmax, ymax, zmax] = self.coords;

        write!(
            f,
            "(xmin: {}, ymin: {}, zmin: {}, xmax: {}, ymax: {}, zmax: {})",
            xmin, ymin, zmin, xmax, ymax, zmax
        )
    }
}
