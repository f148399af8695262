use crate::error::{Error, Result};
use crate::spatial::decade_of;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Maps decade buckets to the postal codes each urban area covers.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// {
///   "2020": {
///     "63217": ["10001", "10002"],
///     "16264": ["60601"]
///   }
/// }
/// ```
///
/// Areas are scanned in file order; the first area containing a postal code wins.
#[derive(Debug, Clone, Default)]
pub struct PostalBoundaryMap {
    decades: BTreeMap<i32, Vec<(String, HashSet<String>)>>,
}

impl PostalBoundaryMap {
    /// Loads the map from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses the map from a JSON document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(content)?;
        let mut map = Self::default();

        for (decade_key, areas) in &root {
            let decade: i32 = decade_key
                .trim()
                .parse()
                .map_err(|_| invalid(format!("decade key \"{decade_key}\" is not a year")))?;
            let areas = areas
                .as_object()
                .ok_or_else(|| invalid(format!("decade {decade} is not an object")))?;

            for (area_code, postal_codes) in areas {
                let postal_codes = postal_codes
                    .as_array()
                    .ok_or_else(|| invalid(format!("area {area_code} is not a list")))?
                    .iter()
                    .map(|code| {
                        code.as_str().map(str::to_string).ok_or_else(|| {
                            invalid(format!("area {area_code} has a non-string postal code"))
                        })
                    })
                    .collect::<Result<HashSet<_>>>()?;
                map = map.with_area(decade, area_code, postal_codes);
            }
        }

        debug!(decades = map.decades.len(), "Postal boundary map loaded");
        Ok(map)
    }

    /// Adds an area's postal codes to a decade bucket.
    pub fn with_area<I, S>(mut self, decade: i32, area_code: &str, postal_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.decades.entry(decade).or_default().push((
            area_code.to_string(),
            postal_codes.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Decade buckets present in the map.
    pub fn decades(&self) -> impl Iterator<Item = i32> + '_ {
        self.decades.keys().copied()
    }

    /// Returns the area code enclosing `postal_code` in the decade of `year`.
    ///
    /// A postal code outside every area is a soft miss (`Ok(None)`). A decade
    /// missing from the map altogether is a configuration error.
    pub fn area_code_for(&self, postal_code: &str, year: i32) -> Result<Option<&str>> {
        let decade = decade_of(year);
        let areas = self
            .decades
            .get(&decade)
            .ok_or(Error::MissingDecade { decade })?;

        let found = areas
            .iter()
            .find(|(_, codes)| codes.contains(postal_code))
            .map(|(area_code, _)| area_code.as_str());

        if found.is_none() {
            warn!(postal_code, decade, "Area code not found for postal code");
        }
        Ok(found)
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidBoundaries { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "2020": {"63217": ["10001", "10002"], "16264": ["60601", "10002"]},
        "2010": {"63217": ["10001"]}
    }"#;

    #[test]
    fn test_lookup_by_decade() {
        let map = PostalBoundaryMap::from_json_str(MAP).unwrap();

        assert_eq!(map.area_code_for("60601", 2022).unwrap(), Some("16264"));
        assert_eq!(map.area_code_for("10001", 2015).unwrap(), Some("63217"));
        assert_eq!(map.area_code_for("60601", 2015).unwrap(), None);
    }

    #[test]
    fn test_first_area_in_file_order_wins() {
        let map = PostalBoundaryMap::from_json_str(MAP).unwrap();
        assert_eq!(map.area_code_for("10002", 2020).unwrap(), Some("63217"));
    }

    #[test]
    fn test_missing_decade_is_an_error() {
        let map = PostalBoundaryMap::from_json_str(MAP).unwrap();
        let err = map.area_code_for("10001", 2003).unwrap_err();
        assert!(matches!(err, Error::MissingDecade { decade: 2000 }));
    }

    #[test]
    fn test_numeric_postal_codes_are_rejected() {
        let err = PostalBoundaryMap::from_json_str(r#"{"2020": {"1": [10001]}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidBoundaries { .. }));
    }

    #[test]
    fn test_builder() {
        let map = PostalBoundaryMap::default().with_area(2020, "99999", ["45221"]);
        assert_eq!(map.decades().collect::<Vec<_>>(), vec![2020]);
        assert_eq!(map.area_code_for("45221", 2024).unwrap(), Some("99999"));
    }
}
