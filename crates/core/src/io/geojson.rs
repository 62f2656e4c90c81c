//! GeoJSON reading and writing for classified polygon layers
//!
//! Only Polygon and MultiPolygon geometries are understood; any other type
//! is rejected since bloom layers never contain them. A `null` geometry is
//! kept as a feature without geometry so the validity filter can flag it.
//! Non-WGS84 data carries the legacy named `crs` member.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let name = path.as_ref().display().to_string();
    let reader = BufReader::new(File::open(path.as_ref())?);
    let value: Value = serde_json::from_reader(reader)?;
    collection_from_value(&value, &name)
}

/// Parse a GeoJSON FeatureCollection from a string
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_str(text)?;
    collection_from_value(&value, "<string>")
}

/// Write a FeatureCollection as GeoJSON (UTF-8)
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(&mut writer, &collection_to_value(collection))?;
    writer.flush()?;
    Ok(())
}

/// Serialize a FeatureCollection to a GeoJSON string
pub fn to_geojson_string(collection: &FeatureCollection) -> Result<String> {
    Ok(serde_json::to_string(&collection_to_value(collection))?)
}

fn collection_from_value(value: &Value, source: &str) -> Result<FeatureCollection> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(Error::format(source, "top-level object is not a FeatureCollection"));
    }

    // Without a crs member GeoJSON coordinates are WGS84 lon/lat
    let crs = match value.pointer("/crs/properties/name").and_then(Value::as_str) {
        Some(name) => Some(
            CRS::from_authority(name)
                .ok_or_else(|| Error::format(source, format!("unrecognised crs '{}'", name)))?,
        ),
        None => Some(CRS::wgs84()),
    };

    let features = value
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::format(source, "missing features array"))?;

    let mut collection = FeatureCollection {
        features: Vec::with_capacity(features.len()),
        crs,
    };
    for (i, feature) in features.iter().enumerate() {
        collection.push(feature_from_value(feature, source, i)?);
    }
    Ok(collection)
}

fn feature_from_value(value: &Value, source: &str, index: usize) -> Result<Feature> {
    let geometry = match value.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(geometry_from_value(g).map_err(|reason| {
            Error::format(source, format!("feature {}: {}", index, reason))
        })?),
    };

    let mut feature = Feature {
        geometry,
        ..Feature::empty()
    };

    feature.id = match value.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    if let Some(props) = value.get("properties").and_then(Value::as_object) {
        for (key, v) in props {
            feature.set_property(key.clone(), attribute_from_value(v));
        }
    }
    Ok(feature)
}

fn attribute_from_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        other => AttributeValue::String(other.to_string()),
    }
}

fn geometry_from_value(value: &Value) -> std::result::Result<Geometry<f64>, String> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry without type")?;
    let coords = value.get("coordinates").ok_or("geometry without coordinates")?;

    match kind {
        "Polygon" => Ok(Geometry::Polygon(polygon_from_value(coords)?)),
        "MultiPolygon" => {
            let parts = coords.as_array().ok_or("MultiPolygon coordinates are not an array")?;
            let polygons = parts
                .iter()
                .map(polygon_from_value)
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
        }
        other => Err(format!("unsupported geometry type {}", other)),
    }
}

fn polygon_from_value(value: &Value) -> std::result::Result<Polygon<f64>, String> {
    let rings = value.as_array().ok_or("Polygon coordinates are not an array")?;
    let mut rings = rings
        .iter()
        .map(ring_from_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if rings.is_empty() {
        return Err("Polygon without rings".to_string());
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn ring_from_value(value: &Value) -> std::result::Result<LineString<f64>, String> {
    let positions = value.as_array().ok_or("ring is not an array")?;
    positions
        .iter()
        .map(|p| match (p.get(0).and_then(Value::as_f64), p.get(1).and_then(Value::as_f64)) {
            (Some(x), Some(y)) => Ok(Coord { x, y }),
            _ => Err(format!("malformed position {}", p)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn collection_to_value(collection: &FeatureCollection) -> Value {
    let features: Vec<Value> = collection.iter().map(feature_to_value).collect();
    let mut root = Map::new();
    root.insert("type".into(), json!("FeatureCollection"));
    if let Some(crs) = collection.crs.as_ref().filter(|c| !c.is_geographic()) {
        root.insert(
            "crs".into(),
            json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", crs.epsg()) }
            }),
        );
    }
    root.insert("features".into(), Value::Array(features));
    Value::Object(root)
}

fn feature_to_value(feature: &Feature) -> Value {
    let mut properties: Vec<(&String, &AttributeValue)> = feature.properties.iter().collect();
    properties.sort_by(|a, b| a.0.cmp(b.0));
    let properties: Map<String, Value> = properties
        .into_iter()
        .map(|(k, v)| (k.clone(), attribute_to_value(v)))
        .collect();

    let mut out = Map::new();
    out.insert("type".into(), json!("Feature"));
    if let Some(id) = &feature.id {
        out.insert("id".into(), json!(id));
    }
    out.insert(
        "geometry".into(),
        feature
            .geometry
            .as_ref()
            .map(geometry_to_value)
            .unwrap_or(Value::Null),
    );
    out.insert("properties".into(), Value::Object(properties));
    Value::Object(out)
}

fn attribute_to_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => json!(b),
        AttributeValue::Int(i) => json!(i),
        AttributeValue::Float(f) => json!(f),
        AttributeValue::String(s) => json!(s),
    }
}

fn geometry_to_value(geometry: &Geometry<f64>) -> Value {
    match geometry {
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": polygon_to_value(p) }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(polygon_to_value).collect::<Vec<_>>(),
        }),
        // Bloom layers only hold areal features
        _ => Value::Null,
    }
}

fn polygon_to_value(polygon: &Polygon<f64>) -> Value {
    let ring = |ls: &LineString<f64>| -> Value {
        Value::Array(ls.coords().map(|c| json!([c.x, c.y])).collect())
    };
    let mut rings = vec![ring(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring));
    Value::Array(rings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::3006" } },
        "features": [
            { "type": "Feature", "id": 7, "properties": { "class": 2 },
              "geometry": { "type": "Polygon",
                "coordinates": [[[0, 0], [1000, 0], [1000, 1000], [0, 1000], [0, 0]]] } },
            { "type": "Feature", "properties": { "class": null },
              "geometry": { "type": "MultiPolygon",
                "coordinates": [[[[0, 0], [10, 0], [10, 5], [0, 0]]]] } },
            { "type": "Feature", "properties": { "class": 3.0 }, "geometry": null }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let collection = parse_geojson(SAMPLE).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.crs, Some(CRS::sweref99_tm()));

        let first = &collection.features[0];
        assert_eq!(first.id.as_deref(), Some("7"));
        assert_eq!(first.class_code(), Some(2));
        assert!(matches!(first.geometry, Some(Geometry::Polygon(_))));

        let second = &collection.features[1];
        assert_eq!(second.class_code(), None);
        assert!(matches!(second.geometry, Some(Geometry::MultiPolygon(_))));

        let third = &collection.features[2];
        assert!(third.geometry.is_none());
        assert_eq!(third.get_property("class"), Some(&AttributeValue::Float(3.0)));
    }

    #[test]
    fn test_default_crs_is_wgs84() {
        let collection = parse_geojson(r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
        assert_eq!(collection.crs, Some(CRS::wgs84()));
    }

    #[test]
    fn test_rejects_points() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}]}"#;
        assert!(matches!(parse_geojson(text), Err(Error::Format { .. })));
    }

    #[test]
    fn test_write_then_read_keeps_classes_and_crs() {
        let collection = parse_geojson(SAMPLE).unwrap();
        let text = to_geojson_string(&collection).unwrap();
        let back = parse_geojson(&text).unwrap();

        assert_eq!(back.crs, Some(CRS::sweref99_tm()));
        let classes: Vec<_> = back.iter().map(Feature::class_code).collect();
        assert_eq!(classes, vec![Some(2), None, None]);
        assert!(back.features[2].geometry.is_none());
    }
}
