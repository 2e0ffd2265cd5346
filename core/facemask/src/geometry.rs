use serde::Deserialize;

/// A polygon corner reported by a face detector.
///
/// Detectors may omit a coordinate (Cloud Vision drops zero values from its
/// JSON), so both axes are optional and read as `0` when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vertex {
    /// Horizontal position in pixels, if reported.
    #[serde(default)]
    pub x: Option<f64>,
    /// Vertical position in pixels, if reported.
    #[serde(default)]
    pub y: Option<f64>,
}

impl Vertex {
    /// A vertex with both coordinates present.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    fn x_or_zero(&self) -> f64 {
        self.x.unwrap_or(0.0)
    }

    fn y_or_zero(&self) -> f64 {
        self.y.unwrap_or(0.0)
    }
}

/// One detected face, as the ordered vertices of its bounding polygon.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Face {
    vertices: Vec<Vertex>,
}

impl Face {
    /// Wrap a detector's polygon. Any number of vertices is accepted.
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// The polygon's vertices in detector order.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Whether the polygon has no vertices at all.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned box around the polygon. See [`extract_bounding_box`].
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        extract_bounding_box(self)
    }
}

/// Axis-aligned bounding box of a face, in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner.
    pub x: f64,
    /// Y coordinate of the top-left corner.
    pub y: f64,
    /// Horizontal span, never negative.
    pub width: f64,
    /// Vertical span, never negative.
    pub height: f64,
}

impl BoundingBox {
    /// Center of the box, where the glyph is anchored.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Reduce a face polygon to its axis-aligned bounding box.
///
/// Missing coordinates count as `0` on their own axis. Returns `None` for a
/// face with no vertices.
pub fn extract_bounding_box(face: &Face) -> Option<BoundingBox> {
    let first = face.vertices.first()?;
    let init = (
        first.x_or_zero(),
        first.y_or_zero(),
        first.x_or_zero(),
        first.y_or_zero(),
    );

    let (min_x, min_y, max_x, max_y) = face.vertices.iter().fold(init, |acc, vertex| {
        let (x, y) = (vertex.x_or_zero(), vertex.y_or_zero());
        (acc.0.min(x), acc.1.min(y), acc.2.max(x), acc.3.max(y))
    });

    Some(BoundingBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(points: &[(f64, f64)]) -> Face {
        Face::new(points.iter().map(|&(x, y)| Vertex::new(x, y)).collect())
    }

    #[test]
    fn rectangle_face() {
        let face = face(&[(10.0, 10.0), (50.0, 10.0), (50.0, 60.0), (10.0, 60.0)]);
        let bbox = extract_bounding_box(&face).unwrap();
        assert_eq!(
            bbox,
            BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 40.0,
                height: 50.0,
            }
        );
    }

    #[test]
    fn missing_x_reads_as_zero() {
        let face = Face::new(vec![
            Vertex::new(0.0, 0.0),
            Vertex {
                x: None,
                y: Some(5.0),
            },
            Vertex::new(20.0, 20.0),
        ]);
        let bbox = extract_bounding_box(&face).unwrap();
        assert_eq!(bbox.x, 0.0);
        assert_eq!(bbox.width, 20.0);
        assert_eq!(bbox.y, 0.0);
        assert_eq!(bbox.height, 20.0);
    }

    #[test]
    fn missing_coordinate_pulls_min_to_zero() {
        // Only one axis is affected by an absent coordinate
        let face = Face::new(vec![
            Vertex::new(30.0, 40.0),
            Vertex {
                x: Some(60.0),
                y: None,
            },
        ]);
        let bbox = extract_bounding_box(&face).unwrap();
        assert_eq!(bbox.x, 30.0);
        assert_eq!(bbox.width, 30.0);
        assert_eq!(bbox.y, 0.0);
        assert_eq!(bbox.height, 40.0);
    }

    #[test]
    fn non_quadrilateral_polygon() {
        let face = face(&[(5.0, 9.0), (12.0, 2.0), (20.0, 7.0), (15.0, 18.0), (7.0, 16.0)]);
        let bbox = extract_bounding_box(&face).unwrap();
        assert_eq!(bbox.x, 5.0);
        assert_eq!(bbox.y, 2.0);
        assert_eq!(bbox.width, 15.0);
        assert_eq!(bbox.height, 16.0);
    }

    #[test]
    fn single_vertex_is_zero_sized() {
        let bbox = extract_bounding_box(&face(&[(7.0, 3.0)])).unwrap();
        assert_eq!(bbox.width, 0.0);
        assert_eq!(bbox.height, 0.0);
        assert_eq!(bbox.center(), (7.0, 3.0));
    }

    #[test]
    fn collinear_vertices_have_zero_height() {
        let bbox = extract_bounding_box(&face(&[(0.0, 4.0), (10.0, 4.0), (25.0, 4.0)])).unwrap();
        assert_eq!(bbox.width, 25.0);
        assert_eq!(bbox.height, 0.0);
    }

    #[test]
    fn empty_face_has_no_box() {
        assert!(extract_bounding_box(&Face::default()).is_none());
        assert!(Face::default().is_empty());
    }

    #[test]
    fn extraction_is_repeatable() {
        let face = face(&[(3.0, 8.0), (41.5, 2.0), (17.0, 33.25)]);
        assert_eq!(face.bounding_box(), face.bounding_box());
    }

    #[test]
    fn center_of_box() {
        let bbox = BoundingBox {
            x: 10.0,
            y: 10.0,
            width: 40.0,
            height: 50.0,
        };
        assert_eq!(bbox.center(), (30.0, 35.0));
    }

    #[test]
    fn deserializes_detector_json() {
        let faces: Vec<Face> =
            serde_json::from_str(r#"[[{"x": 1, "y": 2}, {"y": 9}, {"x": 4}], []]"#).unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(
            faces[0].vertices()[1],
            Vertex {
                x: None,
                y: Some(9.0),
            }
        );
        assert!(faces[1].is_empty());
    }
}
