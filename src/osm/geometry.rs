use geo::{Coord, LineString, MultiLineString, MultiPolygon, Polygon};
use hashbrown::{HashMap, HashSet};
use osmpbfreader::{NodeId, OsmId, OsmObj, OsmPbfReader, RelationId, WayId};
use sled::Db;
use std::io::{Read, Seek};
use tempfile::{Builder, TempDir};
use tracing::info;

use crate::error::Result;
use crate::models::PoiGeometry;

/// Resolves shapes of ways and relations carrying the filter key
pub struct GeometryResolver {
    node_db: Db,
    way_nodes: HashMap<WayId, Vec<NodeId>>,
    relation_members: HashMap<RelationId, Vec<WayId>>,
    // Keeps the node store's directory alive as long as the resolver
    _store_dir: TempDir,
}

impl GeometryResolver {
    /// Build the resolver by scanning the file
    pub fn build<R: Read + Seek>(reader: &mut OsmPbfReader<R>, key: &str) -> Result<Self> {
        info!("Building geometry index for '{}'...", key);

        let mut needed_ways = HashSet::new();
        let mut needed_nodes = HashSet::new();

        let mut relation_members_map = HashMap::new();
        let mut way_nodes_map = HashMap::new();

        // Pass 1: Relations carrying the key, and their outer ways
        info!("Pass 1/3: Identifying relevant relations...");
        reader.rewind()?;
        for obj in reader.iter() {
            if let OsmObj::Relation(rel) = obj? {
                if rel.tags.contains_key(key) {
                    let ways: Vec<WayId> = rel
                        .refs
                        .iter()
                        .filter(|m| m.role == "outer" || m.role.is_empty())
                        .filter_map(|m| match m.member {
                            OsmId::Way(way_id) => Some(way_id),
                            _ => None,
                        })
                        .collect();
                    needed_ways.extend(ways.iter().copied());
                    relation_members_map.insert(rel.id, ways);
                }
            }
        }
        info!("Found {} relevant relations", relation_members_map.len());

        // Pass 2: Ways carrying the key or needed by a relation
        info!("Pass 2/3: Identifying relevant ways...");
        reader.rewind()?;
        for obj in reader.iter() {
            if let OsmObj::Way(way) = obj? {
                if needed_ways.contains(&way.id) || way.tags.contains_key(key) {
                    needed_nodes.extend(way.nodes.iter().copied());
                    way_nodes_map.insert(way.id, way.nodes);
                }
            }
        }
        info!(
            "Found {} relevant ways, referencing {} nodes",
            way_nodes_map.len(),
            needed_nodes.len()
        );

        // Pass 3: Store node coordinates
        info!("Pass 3/3: Storing node coordinates...");
        reader.rewind()?;

        let store_dir = Builder::new().prefix("tagfinder-geo-").tempdir()?;
        let db = sled::open(store_dir.path())?;

        let mut stored_count = 0;
        for obj in reader.iter() {
            if let OsmObj::Node(node) = obj? {
                if needed_nodes.contains(&node.id) {
                    let mut value = [0u8; 16];
                    value[0..8].copy_from_slice(&node.lon().to_be_bytes());
                    value[8..16].copy_from_slice(&node.lat().to_be_bytes());
                    db.insert(node.id.0.to_be_bytes(), &value[..])?;
                    stored_count += 1;
                }
            }
        }

        db.flush()?;
        info!("Stored {} node coordinates", stored_count);

        Ok(Self {
            node_db: db,
            way_nodes: way_nodes_map,
            relation_members: relation_members_map,
            _store_dir: store_dir,
        })
    }

    fn node_coord(&self, node_id: NodeId) -> Option<Coord<f64>> {
        let bytes = self.node_db.get(node_id.0.to_be_bytes()).ok()??;
        if bytes.len() != 16 {
            return None;
        }
        let lon = f64::from_be_bytes(bytes[0..8].try_into().ok()?);
        let lat = f64::from_be_bytes(bytes[8..16].try_into().ok()?);
        Some(Coord { x: lon, y: lat })
    }

    fn way_coords(&self, way_id: WayId) -> Option<Vec<Coord<f64>>> {
        let nodes = self.way_nodes.get(&way_id)?;
        Some(nodes.iter().filter_map(|n| self.node_coord(*n)).collect())
    }

    /// Closed ways become polygons, open ways line strings
    pub fn resolve_way(&self, way_id: WayId) -> Option<PoiGeometry> {
        let coords = self.way_coords(way_id)?;
        match coords.len() {
            0 | 1 => None,
            n if n >= 4 && coords.first() == coords.last() => Some(PoiGeometry::Polygon(
                Polygon::new(LineString::new(coords), vec![]),
            )),
            _ => Some(PoiGeometry::LineString(LineString::new(coords))),
        }
    }

    /// Multipolygon when the member ways close into rings, otherwise their lines
    pub fn resolve_relation(&self, rel_id: RelationId) -> Option<PoiGeometry> {
        let member_ways = self.relation_members.get(&rel_id)?;

        let rings: Vec<Vec<Coord<f64>>> = member_ways
            .iter()
            .filter_map(|w| self.way_coords(*w))
            .filter(|coords| coords.len() >= 2)
            .collect();

        if rings.is_empty() {
            return None;
        }

        let polygons = merge_rings_to_polygons(rings.clone());
        if !polygons.is_empty() {
            return Some(PoiGeometry::MultiPolygon(MultiPolygon::new(polygons)));
        }

        let lines = rings.into_iter().map(LineString::new).collect();
        Some(PoiGeometry::MultiLineString(MultiLineString::new(lines)))
    }
}

/// Merge disconnected rings into closed polygons
pub fn merge_rings_to_polygons(rings: Vec<Vec<Coord<f64>>>) -> Vec<Polygon<f64>> {
    let mut result = Vec::new();
    let mut remaining: Vec<Vec<Coord<f64>>> = rings;

    while !remaining.is_empty() {
        let mut current = remaining.remove(0);

        if current.first() == current.last() && current.len() >= 4 {
            result.push(Polygon::new(LineString::new(current), vec![]));
            continue;
        }

        // Chain segments sharing an endpoint until nothing connects
        let mut merged = true;
        while merged && !remaining.is_empty() {
            merged = false;

            let current_start = current.first().copied();
            let current_end = current.last().copied();

            for i in 0..remaining.len() {
                let ring_start = remaining[i].first().copied();
                let ring_end = remaining[i].last().copied();

                if current_end == ring_start {
                    let mut ring = remaining.remove(i);
                    ring.remove(0);
                    current.extend(ring);
                } else if current_end == ring_end {
                    let mut ring = remaining.remove(i);
                    ring.reverse();
                    ring.remove(0);
                    current.extend(ring);
                } else if current_start == ring_end {
                    let mut ring = remaining.remove(i);
                    ring.pop();
                    ring.extend(current);
                    current = ring;
                } else if current_start == ring_start {
                    let mut ring = remaining.remove(i);
                    ring.reverse();
                    ring.pop();
                    ring.extend(current);
                    current = ring;
                } else {
                    continue;
                }
                merged = true;
                break;
            }
        }

        // Only rings that actually close count as polygons
        if current.len() >= 4 && current.first() == current.last() {
            result.push(Polygon::new(LineString::new(current), vec![]));
        }
    }

    result
}
