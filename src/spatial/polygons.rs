use crate::error::{Error, Result};
use crate::spatial::decade_of;
use geo::{Contains, Geometry, MultiPolygon, Point};
use geojson::GeoJson;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Urban area outlines for one boundary vintage.
#[derive(Debug, Clone, Default)]
pub struct AreaPolygons {
    areas: Vec<(String, MultiPolygon<f64>)>,
}

impl AreaPolygons {
    /// Loads a GeoJSON feature collection from `path`; see [`Self::from_geojson_str`].
    pub fn load(path: &str, code_property: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_geojson_str(&content, code_property)
    }

    /// Parses a GeoJSON feature collection whose features are (multi)polygons
    /// carrying their area code in the `code_property` property.
    pub fn from_geojson_str(content: &str, code_property: &str) -> Result<Self> {
        let GeoJson::FeatureCollection(collection) = content.parse::<GeoJson>()? else {
            return Err(invalid("expected a FeatureCollection".to_string()));
        };

        let mut polygons = Self::default();
        for feature in collection.features {
            let code = feature
                .property(code_property)
                .and_then(property_string)
                .ok_or_else(|| invalid(format!("feature without \"{code_property}\"")))?;
            let geometry = feature
                .geometry
                .ok_or_else(|| invalid(format!("area {code} has no geometry")))?;

            let outline = match Geometry::<f64>::try_from(geometry.value)? {
                Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
                Geometry::MultiPolygon(multi) => multi,
                _ => return Err(invalid(format!("area {code} is not a polygon"))),
            };
            polygons = polygons.with_area(&code, outline);
        }

        debug!(areas = polygons.areas.len(), "Area polygons loaded");
        Ok(polygons)
    }

    pub fn with_area(mut self, area_code: &str, outline: impl Into<MultiPolygon<f64>>) -> Self {
        self.areas.push((area_code.to_string(), outline.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Code of the first area whose outline contains the point.
    pub fn area_code_at(&self, longitude: f64, latitude: f64) -> Option<&str> {
        let point = Point::new(longitude, latitude);
        self.areas
            .iter()
            .find(|(_, outline)| outline.contains(&point))
            .map(|(code, _)| code.as_str())
    }
}

/// [`AreaPolygons`] bucketed by decade.
#[derive(Debug, Clone, Default)]
pub struct DecadePolygons {
    decades: BTreeMap<i32, AreaPolygons>,
}

impl DecadePolygons {
    pub fn with_decade(mut self, decade: i32, polygons: AreaPolygons) -> Self {
        self.decades.insert(decade_of(decade), polygons);
        self
    }

    /// Resolves a coordinate against the boundaries in effect for `year`.
    ///
    /// Both a missing decade and a point outside every area are soft misses.
    pub fn area_code_at(&self, year: i32, longitude: f64, latitude: f64) -> Option<&str> {
        let decade = decade_of(year);
        let Some(polygons) = self.decades.get(&decade) else {
            warn!(decade, "No area boundaries loaded for decade");
            return None;
        };

        let found = polygons.area_code_at(longitude, latitude);
        if found.is_none() {
            warn!(longitude, latitude, decade, "Area code not found for coordinates");
        }
        found
    }
}

fn property_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidBoundaries { message }
}
