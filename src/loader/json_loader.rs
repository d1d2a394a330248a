use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};

use crate::error::MapError;
use crate::ir_map::*;

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Vec<u32>,
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    source: String,
}

#[derive(Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    layers: Vec<JsonLayer>,
    tilesets: Vec<JsonTilesetRef>,
}

#[derive(Deserialize)]
struct ExternalTileset {
    tilewidth: u32,
    tileheight: u32,
    imagewidth: u32,
    imageheight: u32,
    image: String,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    value: JsonValue,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    properties: Vec<JsonProperty>,
}

fn json_property_to_ir(prop: JsonProperty) -> Result<Option<(String, PropertyValue)>, MapError> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            return Err(MapError::UnsupportedPropertyType {
                name,
                kind: other.to_owned(),
            });
        }
        None => {
            if let Some(v) = value.as_bool() {
                Some(PropertyValue::Bool(v))
            } else if let Some(v) = value.as_i64() {
                Some(PropertyValue::I64(v))
            } else if let Some(v) = value.as_f64() {
                Some(PropertyValue::F32(v as f32))
            } else {
                value.as_str().map(|s| PropertyValue::String(s.to_owned()))
            }
        }
    };

    Ok(parsed.map(|value| (name, value)))
}

fn properties_from_json(props: Vec<JsonProperty>) -> Result<Properties, MapError> {
    let mut out = Properties::new();
    for p in props {
        if let Some((name, value)) = json_property_to_ir(p)? {
            out.insert(name, value);
        }
    }
    Ok(out)
}

/// Decodes a Tiled-style JSON map file into the builder's IR.
///
/// Returns the IR plus the map file's directory; tileset image paths are kept
/// relative and joined against that directory at texture-load time.
pub fn decode_map_file_to_ir(path: &str) -> Result<(IrMap, PathBuf), MapError> {
    let p = Path::new(path);
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {path}"
        )));
    }

    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: p.to_path_buf(),
        source,
    })?;

    let map_dir = p
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    // Build IR tilesets
    let mut ir_tilesets = Vec::with_capacity(j.tilesets.len());
    for ts in &j.tilesets {
        if !ts.source.ends_with(".json") {
            return Err(MapError::InvalidMap(format!(
                "External tileset must be JSON: {}",
                ts.source
            )));
        }
        let ts_path = map_dir.join(&ts.source);
        let ext_txt = std::fs::read_to_string(&ts_path).map_err(|source| MapError::Io {
            path: ts_path.clone(),
            source,
        })?;
        let ext: ExternalTileset =
            serde_json::from_str(&ext_txt).map_err(|source| MapError::Json {
                path: ts_path,
                source,
            })?;

        // (Image path stays relative; Map::from_ir joins it with map_dir)
        ir_tilesets.push(IrTileset::Atlas {
            first_gid: ts.firstgid,
            image: ext.image,
            image_w: ext.imagewidth,
            image_h: ext.imageheight,
            tile_w: ext.tilewidth,
            tile_h: ext.tileheight,
            spacing: ext.spacing,
            margin: ext.margin,
            tiles: ext
                .tiles
                .into_iter()
                .map(|tile| -> Result<IrTileMetadata, MapError> {
                    Ok(IrTileMetadata {
                        id: tile.id,
                        properties: properties_from_json(tile.properties)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        });
    }

    // Sort by first_gid so atlas scan order follows id order
    ir_tilesets.sort_by_key(|t| match t {
        IrTileset::Atlas { first_gid, .. } => *first_gid,
    });

    // Build IR layers
    let mut ir_layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        let layer_kind = match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => IrLayerKind::Tiles {
                width: l.width,
                height: l.height,
                data: l.data,
            },
            _ => IrLayerKind::Unsupported,
        };
        ir_layers.push(IrLayer {
            name: l.name,
            visible: l.visible,
            kind: layer_kind,
        });
    }

    Ok((
        IrMap {
            width: j.width,
            height: j.height,
            tile_w: j.tilewidth,
            tile_h: j.tileheight,
            tilesets: ir_tilesets,
            layers: ir_layers,
        },
        map_dir,
    ))
}
