//! Level file loader. Levels are XML documents carrying a tileset, one
//! or more cell layers and a group of named objects; tile art is
//! resolved through the shared asset cache at load time.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use engine::{AnimationFrame, AssetCache, LevelLayer, LevelMap, LevelObject, LevelTile, Rect};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LevelLoadError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("level XML is malformed: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{element}> is missing required attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("attribute {attribute} on <{element}> is not a valid number: {value}")]
    BadNumber {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    #[error("layer {name} cell {index} is not a valid tile id: {value}")]
    BadCell {
        name: String,
        index: usize,
        value: String,
    },
    #[error("level has no <map> root element")]
    NoMapRoot,
}

/// A tile definition before art resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    pub id: u32,
    pub image: String,
    pub animation: Vec<AnimationFrame>,
}

/// A level parsed from XML, still holding image keys rather than
/// loaded surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSource {
    pub columns: u32,
    pub rows: u32,
    pub tiles: Vec<TileSource>,
    pub layers: Vec<LevelLayer>,
    pub objects: Vec<LevelObject>,
}

/// Read and resolve a level: parse the XML, then swap every tile's
/// image key for a cached surface. Missing art degrades to the cache's
/// placeholder rather than failing the load.
pub fn load_level(path: &Path, assets: &mut AssetCache) -> Result<LevelMap, LevelLoadError> {
    let xml = fs::read_to_string(path).map_err(|source| LevelLoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let source = parse_level(&xml)?;
    debug!(
        path = %path.display(),
        columns = source.columns,
        rows = source.rows,
        layer_count = source.layers.len(),
        object_count = source.objects.len(),
        "level_parsed"
    );
    Ok(resolve_level(source, assets))
}

/// Swap image keys for surfaces from the cache.
pub fn resolve_level(source: LevelSource, assets: &mut AssetCache) -> LevelMap {
    let mut tiles = HashMap::new();
    for tile in source.tiles {
        tiles.insert(
            tile.id,
            LevelTile {
                surface: assets.surface(&tile.image),
                animation: tile.animation,
            },
        );
    }
    LevelMap {
        columns: source.columns,
        rows: source.rows,
        tiles,
        layers: source.layers,
        objects: source.objects,
    }
}

/// Parse level XML without touching the filesystem.
pub fn parse_level(xml: &str) -> Result<LevelSource, LevelLoadError> {
    let document = roxmltree::Document::parse(xml)?;
    let map = document.root_element();
    if map.tag_name().name() != "map" {
        return Err(LevelLoadError::NoMapRoot);
    }
    let columns = required_number(&map, "map", "columns")?;
    let rows = required_number(&map, "map", "rows")?;

    let mut tiles = Vec::new();
    let mut layers = Vec::new();
    let mut objects = Vec::new();

    for child in map.children().filter(roxmltree::Node::is_element) {
        match child.tag_name().name() {
            "tileset" => {
                for tile in child
                    .children()
                    .filter(|node| node.is_element() && node.tag_name().name() == "tile")
                {
                    tiles.push(parse_tile(&tile)?);
                }
            }
            "layer" => layers.push(parse_layer(&child)?),
            "objectgroup" => {
                for object in child
                    .children()
                    .filter(|node| node.is_element() && node.tag_name().name() == "object")
                {
                    objects.push(parse_object(&object)?);
                }
            }
            _ => {}
        }
    }

    Ok(LevelSource {
        columns,
        rows,
        tiles,
        layers,
        objects,
    })
}

fn parse_tile(node: &roxmltree::Node<'_, '_>) -> Result<TileSource, LevelLoadError> {
    let id = required_number(node, "tile", "id")?;
    let image = node
        .attribute("image")
        .ok_or(LevelLoadError::MissingAttribute {
            element: "tile",
            attribute: "image",
        })?
        .to_string();
    let mut animation = Vec::new();
    if let Some(anim) = node
        .children()
        .find(|child| child.is_element() && child.tag_name().name() == "animation")
    {
        for frame in anim
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "frame")
        {
            animation.push(AnimationFrame {
                tile_id: required_number(&frame, "frame", "tile")?,
                duration_ms: required_number(&frame, "frame", "duration")?,
            });
        }
    }
    Ok(TileSource {
        id,
        image,
        animation,
    })
}

fn parse_layer(node: &roxmltree::Node<'_, '_>) -> Result<LevelLayer, LevelLoadError> {
    let name = node.attribute("name").unwrap_or("unnamed").to_string();
    let data = node
        .children()
        .find(|child| child.is_element() && child.tag_name().name() == "data")
        .ok_or(LevelLoadError::MissingAttribute {
            element: "layer",
            attribute: "data",
        })?;
    let raw = data.text().unwrap_or("");
    let mut cells = Vec::new();
    for (index, entry) in raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
    {
        let cell = entry.parse::<u32>().map_err(|_| LevelLoadError::BadCell {
            name: name.clone(),
            index,
            value: entry.to_string(),
        })?;
        cells.push(cell);
    }
    Ok(LevelLayer { name, cells })
}

fn parse_object(node: &roxmltree::Node<'_, '_>) -> Result<LevelObject, LevelLoadError> {
    let name = node.attribute("name").unwrap_or("unnamed").to_string();
    let x = required_number::<i32>(node, "object", "x")?;
    let y = required_number::<i32>(node, "object", "y")?;
    let width = required_number::<u32>(node, "object", "width")?;
    let height = required_number::<u32>(node, "object", "height")?;
    Ok(LevelObject {
        name,
        rect: Rect::new(x, y, width, height),
        solid: flag(node, "solid"),
        active: flag(node, "active"),
        next_node: node.attribute("next_node").map(str::to_string),
        action: node.attribute("action").map(str::to_string),
    })
}

fn flag(node: &roxmltree::Node<'_, '_>, attribute: &str) -> bool {
    matches!(node.attribute(attribute), Some("true") | Some("1"))
}

fn required_number<T: std::str::FromStr>(
    node: &roxmltree::Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T, LevelLoadError> {
    let value = node
        .attribute(attribute)
        .ok_or(LevelLoadError::MissingAttribute { element, attribute })?;
    value.parse::<T>().map_err(|_| LevelLoadError::BadNumber {
        element,
        attribute,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_LEVEL: &str = r#"
        <map columns="2" rows="2">
          <tileset>
            <tile id="1" image="tiles/grass.png"/>
            <tile id="2" image="tiles/water_a.png">
              <animation>
                <frame tile="2" duration="100"/>
                <frame tile="3" duration="100"/>
              </animation>
            </tile>
            <tile id="3" image="tiles/water_b.png"/>
          </tileset>
          <layer name="ground">
            <data>1,1,2,1</data>
          </layer>
          <objectgroup>
            <object name="door" x="16" y="16" width="16" height="16"
                    active="true" next_node="house" action="enter"/>
            <object name="rock" x="0" y="0" width="16" height="16" solid="true"/>
          </objectgroup>
        </map>
    "#;

    #[test]
    fn parses_grid_and_layers() {
        let level = parse_level(SMALL_LEVEL).expect("parse");
        assert_eq!((level.columns, level.rows), (2, 2));
        assert_eq!(level.layers.len(), 1);
        assert_eq!(level.layers[0].name, "ground");
        assert_eq!(level.layers[0].cells, vec![1, 1, 2, 1]);
    }

    #[test]
    fn parses_tile_animation_frames() {
        let level = parse_level(SMALL_LEVEL).expect("parse");
        let water = level.tiles.iter().find(|tile| tile.id == 2).expect("water");
        assert_eq!(
            water.animation,
            vec![
                AnimationFrame {
                    tile_id: 2,
                    duration_ms: 100
                },
                AnimationFrame {
                    tile_id: 3,
                    duration_ms: 100
                },
            ]
        );
        let grass = level.tiles.iter().find(|tile| tile.id == 1).expect("grass");
        assert!(grass.animation.is_empty());
    }

    #[test]
    fn parses_object_properties() {
        let level = parse_level(SMALL_LEVEL).expect("parse");
        let door = level
            .objects
            .iter()
            .find(|object| object.name == "door")
            .expect("door");
        assert_eq!(door.rect, Rect::new(16, 16, 16, 16));
        assert!(door.active);
        assert!(!door.solid);
        assert_eq!(door.next_node.as_deref(), Some("house"));
        assert_eq!(door.action.as_deref(), Some("enter"));

        let rock = level
            .objects
            .iter()
            .find(|object| object.name == "rock")
            .expect("rock");
        assert!(rock.solid);
        assert!(!rock.active);
    }

    #[test]
    fn missing_columns_is_an_error() {
        let result = parse_level(r#"<map rows="2"></map>"#);
        assert!(matches!(
            result,
            Err(LevelLoadError::MissingAttribute {
                element: "map",
                attribute: "columns"
            })
        ));
    }

    #[test]
    fn junk_cell_reports_layer_and_index() {
        let xml = r#"
            <map columns="2" rows="1">
              <layer name="ground"><data>1,oops</data></layer>
            </map>
        "#;
        match parse_level(xml) {
            Err(LevelLoadError::BadCell { name, index, value }) => {
                assert_eq!(name, "ground");
                assert_eq!(index, 1);
                assert_eq!(value, "oops");
            }
            other => panic!("expected BadCell, got {other:?}"),
        }
    }

    #[test]
    fn wrong_root_element_is_rejected() {
        assert!(matches!(
            parse_level("<level/>"),
            Err(LevelLoadError::NoMapRoot)
        ));
    }

    #[test]
    fn resolve_builds_a_loadable_map() {
        let source = parse_level(SMALL_LEVEL).expect("parse");
        let dir = tempfile::tempdir().expect("tempdir");
        let mut assets = AssetCache::new(dir.path());
        let map = resolve_level(source, &mut assets);
        assert_eq!(map.tiles.len(), 3);
        // Art is missing on disk, so every tile resolves to the
        // placeholder, but the map still rasterises.
        let level = engine::LevelSurface::load(&map, 32).expect("load");
        assert_eq!(level.tile_size(), 16);
    }
}
