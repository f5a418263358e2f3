/// A colored point in a point cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Normalized RGB
    pub color_rgb: [f64; 3],
    pub position: [f64; 3],
}

pub type Points = Vec<Point>;
