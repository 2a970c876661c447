use serde_json::{Map, Value};

/// One entry of a ring as it appeared in the source document.
///
/// Points are kept even when malformed so that the mesh builder can skip
/// them individually without dropping the rest of the ring.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RingPoint {
    LonLat(f64, f64),
    Malformed,
}

impl RingPoint {
    /// Accepts any array whose first two entries are numbers; extra
    /// components (altitude, measures) are ignored.
    pub fn from_value(value: &Value) -> Self {
        let Some(arr) = value.as_array() else {
            return RingPoint::Malformed;
        };
        if arr.len() < 2 {
            return RingPoint::Malformed;
        }
        match (arr[0].as_f64(), arr[1].as_f64()) {
            (Some(lon), Some(lat)) => RingPoint::LonLat(lon, lat),
            _ => RingPoint::Malformed,
        }
    }

    pub fn lon_lat(&self) -> Option<(f64, f64)> {
        match *self {
            RingPoint::LonLat(lon, lat) => Some((lon, lat)),
            RingPoint::Malformed => None,
        }
    }
}

pub type Ring = Vec<RingPoint>;

/// A polygon as a list of rings. Each ring is extruded on its own.
pub type Polygon = Vec<Ring>;

/// A named administrative region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub name: Option<String>,
    /// `[lon, lat]` label anchor in degrees.
    pub centroid: Option<[f64; 2]>,
    pub polygons: Vec<Polygon>,
    pub properties: Map<String, Value>,
}

impl RegionFeature {
    pub fn ring_count(&self) -> usize {
        self.polygons.iter().map(|p| p.len()).sum()
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons.iter().flat_map(|p| p.iter())
    }

    pub fn from_geojson_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let properties = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let name = properties
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let centroid = properties.get("centroid").and_then(|v| {
            let arr = v.as_array()?;
            if arr.len() < 2 {
                return None;
            }
            Some([arr[0].as_f64()?, arr[1].as_f64()?])
        });

        let polygons = obj.get("geometry").map(parse_polygons).unwrap_or_default();

        Some(Self {
            name,
            centroid,
            polygons,
            properties,
        })
    }
}

/// Reads `geometry.coordinates` as a list of polygons.
///
/// `Polygon` geometries are wrapped into a single-polygon list; everything
/// else is read with MultiPolygon nesting. Anything that is not an array at
/// the expected depth contributes nothing.
fn parse_polygons(geometry: &Value) -> Vec<Polygon> {
    let Some(coords) = geometry.get("coordinates").and_then(|v| v.as_array()) else {
        return Vec::new();
    };
    let ty = geometry.get("type").and_then(|v| v.as_str());

    match ty {
        Some("Polygon") => vec![parse_rings(coords)],
        _ => coords
            .iter()
            .filter_map(|poly| poly.as_array())
            .map(|rings| parse_rings(rings.as_slice()))
            .collect(),
    }
}

fn parse_rings(rings: &[Value]) -> Polygon {
    rings
        .iter()
        .map(|ring| match ring.as_array() {
            Some(points) => points.iter().map(RingPoint::from_value).collect(),
            None => Vec::new(),
        })
        .collect()
}

/// The full set of regions in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDataset {
    pub features: Vec<RegionFeature>,
    /// blake3 of the source payload, hex encoded.
    pub digest: String,
}

#[derive(Debug)]
pub enum RegionParseError {
    Json(serde_json::Error),
    NotAFeatureCollection,
}

impl std::fmt::Display for RegionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionParseError::Json(e) => write!(f, "JSON parse error: {e}"),
            RegionParseError::NotAFeatureCollection => {
                write!(f, "expected GeoJSON FeatureCollection")
            }
        }
    }
}

impl std::error::Error for RegionParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegionParseError::Json(e) => Some(e),
            RegionParseError::NotAFeatureCollection => None,
        }
    }
}

impl RegionDataset {
    pub fn from_geojson_str(payload: &str) -> Result<Self, RegionParseError> {
        let value: Value = serde_json::from_str(payload).map_err(RegionParseError::Json)?;
        let digest = blake3::hash(payload.as_bytes()).to_hex().to_string();
        Self::from_geojson_value(&value, digest)
    }

    pub fn from_geojson_value(value: &Value, digest: String) -> Result<Self, RegionParseError> {
        let obj = value
            .as_object()
            .ok_or(RegionParseError::NotAFeatureCollection)?;
        if let Some(ty) = obj.get("type").and_then(|v| v.as_str())
            && ty != "FeatureCollection"
        {
            return Err(RegionParseError::NotAFeatureCollection);
        }
        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(RegionParseError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            match RegionFeature::from_geojson_value(feat_val) {
                Some(feature) => features.push(feature),
                None => tracing::warn!(index, "skipping feature that is not an object"),
            }
        }

        Ok(Self { features, digest })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// First 16 hex chars of the digest, for log lines.
    pub fn short_digest(&self) -> &str {
        let end = self.digest.len().min(16);
        &self.digest[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::{RegionDataset, RegionParseError, RingPoint};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "A", "centroid": [0.5, 0.5] },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "B", "centroid": [10.5, 10.5], "adcode": 2 },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[10, 10], [11, 10], [11, 11], [10, 10]]]]
                }
            }
        ]
    }"#;

    #[test]
    fn parses_names_centroids_and_rings() {
        let ds = RegionDataset::from_geojson_str(TWO_SQUARES).expect("parse");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features[0].name.as_deref(), Some("A"));
        assert_eq!(ds.features[0].centroid, Some([0.5, 0.5]));
        assert_eq!(ds.features[1].ring_count(), 1);
        assert_eq!(
            ds.features[1].polygons[0][0],
            vec![
                RingPoint::LonLat(10.0, 10.0),
                RingPoint::LonLat(11.0, 10.0),
                RingPoint::LonLat(11.0, 11.0),
                RingPoint::LonLat(10.0, 10.0),
            ]
        );
        assert_eq!(ds.features[1].properties.get("adcode"), Some(&json!(2)));
        assert_eq!(ds.digest.len(), 64);
        assert_eq!(ds.short_digest().len(), 16);
    }

    #[test]
    fn keeps_malformed_points_as_markers() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "C" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0, 0], [1], "x", [1, "y"], [2, 2, 100], [0, 1]]]]
                }
            }]
        });
        let ds = RegionDataset::from_geojson_value(&value, String::new()).expect("parse");
        let ring = &ds.features[0].polygons[0][0];
        assert_eq!(
            ring,
            &vec![
                RingPoint::LonLat(0.0, 0.0),
                RingPoint::Malformed,
                RingPoint::Malformed,
                RingPoint::Malformed,
                RingPoint::LonLat(2.0, 2.0),
                RingPoint::LonLat(0.0, 1.0),
            ]
        );
    }

    #[test]
    fn polygon_geometry_is_wrapped_once() {
        let value = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": "P" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [1, 0], [1, 1]], [[0.2, 0.2], [0.4, 0.2], [0.4, 0.4]]]
                }
            }]
        });
        let ds = RegionDataset::from_geojson_value(&value, String::new()).expect("parse");
        assert_eq!(ds.features[0].polygons.len(), 1);
        assert_eq!(ds.features[0].ring_count(), 2);
    }

    #[test]
    fn missing_metadata_is_tolerated() {
        let value = json!({
            "features": [
                { "type": "Feature", "properties": { "name": "  " }, "geometry": null },
                { "type": "Feature", "properties": { "centroid": [1] } },
                42
            ]
        });
        let ds = RegionDataset::from_geojson_value(&value, String::new()).expect("parse");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.features[0].name, None);
        assert!(ds.features[0].polygons.is_empty());
        assert_eq!(ds.features[1].centroid, None);
    }

    #[test]
    fn rejects_other_documents() {
        let err = RegionDataset::from_geojson_value(&json!({"type": "Feature"}), String::new())
            .expect_err("not a collection");
        assert!(matches!(err, RegionParseError::NotAFeatureCollection));

        let err = RegionDataset::from_geojson_str("{").expect_err("bad json");
        assert!(matches!(err, RegionParseError::Json(_)));
    }
}
