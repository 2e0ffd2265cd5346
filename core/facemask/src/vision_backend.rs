use std::path::Path;

use base64::Engine;
use log::{debug, info};
use serde::Deserialize;

use crate::error::FaceMaskError;
use crate::face_detector::FaceDetector;
use crate::geometry::{Face, Vertex};

/// Google Cloud Vision `images:annotate` REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Upper bound on faces requested per image.
const MAX_RESULTS: u32 = 100;

/// Face detector backed by the Google Cloud Vision REST API.
///
/// Uploads the image inline (base64) with an API key and maps each face
/// annotation's bounding polygon to a [`Face`].
pub struct CloudVisionDetector {
    api_key: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl CloudVisionDetector {
    /// Create a detector that authenticates with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Send requests to `endpoint` instead of the public Vision API.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl FaceDetector for CloudVisionDetector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Face>, FaceMaskError> {
        let bytes = std::fs::read(image_path).map_err(|e| {
            FaceMaskError::DetectionError(format!("{}: {e}", image_path.display()))
        })?;

        let body = serde_json::json!({
            "requests": [{
                "image": { "content": base64::engine::general_purpose::STANDARD.encode(&bytes) },
                "features": [{ "type": "FACE_DETECTION", "maxResults": MAX_RESULTS }],
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| FaceMaskError::DetectionError(e.to_string()))?;
        let text = response
            .text()
            .map_err(|e| FaceMaskError::DetectionError(e.to_string()))?;

        let faces = parse_annotate_response(&text)?;
        info!(
            "cloud vision found {} face(s) in {}",
            faces.len(),
            image_path.display()
        );
        Ok(faces)
    }
}

#[derive(Debug, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    face_annotations: Vec<FaceAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaceAnnotation {
    bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Deserialize)]
struct BoundingPoly {
    #[serde(default)]
    vertices: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Extract face polygons from an `images:annotate` JSON response body.
fn parse_annotate_response(body: &str) -> Result<Vec<Face>, FaceMaskError> {
    let batch: BatchAnnotateResponse = serde_json::from_str(body)
        .map_err(|e| FaceMaskError::DetectionError(format!("malformed response: {e}")))?;

    let mut faces = Vec::new();
    for response in batch.responses {
        if let Some(status) = response.error {
            return Err(FaceMaskError::DetectionError(format!(
                "vision API error {}: {}",
                status.code, status.message
            )));
        }
        for (index, annotation) in response.face_annotations.into_iter().enumerate() {
            match annotation.bounding_poly {
                Some(poly) if !poly.vertices.is_empty() => faces.push(Face::new(poly.vertices)),
                _ => debug!("face annotation {index} has no bounding polygon, dropping"),
            }
        }
    }
    Ok(faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_face_polygons_in_order() {
        let body = r#"{
            "responses": [{
                "faceAnnotations": [
                    {"boundingPoly": {"vertices": [{"x": 10, "y": 10}, {"x": 50, "y": 10}, {"x": 50, "y": 60}, {"x": 10, "y": 60}]}},
                    {"boundingPoly": {"vertices": [{"y": 5}, {"x": 20, "y": 5}, {"x": 20, "y": 30}, {"y": 30}]}}
                ]
            }]
        }"#;
        let faces = parse_annotate_response(body).unwrap();
        assert_eq!(faces.len(), 2);

        let first = faces[0].bounding_box().unwrap();
        assert_eq!((first.x, first.y, first.width, first.height), (10.0, 10.0, 40.0, 50.0));

        // Omitted zero coordinates read as 0
        let second = faces[1].bounding_box().unwrap();
        assert_eq!((second.x, second.width), (0.0, 20.0));
    }

    #[test]
    fn no_annotations_is_empty_not_error() {
        let faces = parse_annotate_response(r#"{"responses": [{}]}"#).unwrap();
        assert!(faces.is_empty());
    }

    #[test]
    fn annotations_without_polygon_are_dropped() {
        let body = r#"{"responses": [{"faceAnnotations": [{}, {"boundingPoly": {}}]}]}"#;
        assert!(parse_annotate_response(body).unwrap().is_empty());
    }

    #[test]
    fn api_error_is_reported() {
        let body = r#"{"responses": [{"error": {"code": 7, "message": "API key not valid"}}]}"#;
        let err = parse_annotate_response(body).unwrap_err();
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn malformed_body_is_reported() {
        assert!(matches!(
            parse_annotate_response("<html>"),
            Err(FaceMaskError::DetectionError(_))
        ));
    }
}
