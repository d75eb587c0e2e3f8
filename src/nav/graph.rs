// Navigation graph: undirected waypoint graph parsed from "<tok1> <tok2>" edge lines

use super::error::NavError;
use super::pathfinder;
use glam::Vec3;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Width of one coordinate group inside a token
const GROUP_WIDTH: usize = 3;
/// Width of a whole token: three coordinate groups
pub const TOKEN_WIDTH: usize = GROUP_WIDTH * 3;

/// A waypoint and the indices of the waypoints it shares an edge with
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub key: String, // Literal token this vertex was created from
    pub position: Vec3,
    pub neighbours: Vec<usize>,
}

/// Read-only waypoint graph built once per session
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    vertices: Vec<Vertex>,
    index: HashMap<String, usize>,
}

/// Decodes one fixed-width token into a position.
/// A token is nine characters: three signed 3-character integer groups for X, Y and Z,
/// e.g. `010000-05` is (10, 0, -5).
pub fn parse_token(token: &str) -> Result<Vec3, String> {
    if !token.is_ascii() || token.len() != TOKEN_WIDTH {
        return Err(format!(
            "Token '{}' must be {} ASCII characters",
            token, TOKEN_WIDTH
        ));
    }

    let mut coords = [0.0_f32; 3];
    for (axis, coord) in coords.iter_mut().enumerate() {
        let start = axis * GROUP_WIDTH;
        let group = &token[start..start + GROUP_WIDTH];
        let value = group
            .parse::<i32>()
            .map_err(|_| format!("Invalid coordinate group '{}' in token '{}'", group, token))?;
        *coord = value as f32;
    }
    Ok(Vec3::from_array(coords))
}

impl NavGraph {
    /// Loads a graph from a file. A missing or unreadable file is reported as
    /// `NavError::Unavailable`.
    pub fn load(path: &Path) -> Result<Self, NavError> {
        let source = fs::read_to_string(path).map_err(|source| NavError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let graph = Self::parse(&source)?;
        log::info!(
            "Loaded navigation graph from {} ({} nodes)",
            path.display(),
            graph.len()
        );
        Ok(graph)
    }

    /// Parses edge records, one per line. Any line that is not exactly two
    /// well-formed tokens aborts the load.
    pub fn parse(source: &str) -> Result<Self, NavError> {
        let mut graph = NavGraph::default();

        for (line_idx, line) in source.lines().enumerate() {
            let line_num = line_idx + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let [first, second] = tokens.as_slice() else {
                return Err(NavError::Parse {
                    line: line_num,
                    message: format!("Expected 2 tokens, found {}", tokens.len()),
                });
            };

            let a = graph
                .intern(first)
                .map_err(|message| NavError::Parse { line: line_num, message })?;
            let b = graph
                .intern(second)
                .map_err(|message| NavError::Parse { line: line_num, message })?;
            graph.connect(a, b);
        }

        crate::debug_nav!(
            "Parsed navigation graph: {} vertices, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Returns the vertex index for a token, creating the vertex on first sight
    fn intern(&mut self, token: &str) -> Result<usize, String> {
        if let Some(&idx) = self.index.get(token) {
            return Ok(idx);
        }
        let position = parse_token(token)?;
        let idx = self.vertices.len();
        self.vertices.push(Vertex {
            key: token.to_string(),
            position,
            neighbours: Vec::new(),
        });
        self.index.insert(token.to_string(), idx);
        Ok(idx)
    }

    /// Adds an undirected edge. Duplicate edges and self-loops are ignored.
    fn connect(&mut self, a: usize, b: usize) {
        if a == b || self.vertices[a].neighbours.contains(&b) {
            return;
        }
        self.vertices[a].neighbours.push(b);
        self.vertices[b].neighbours.push(a);
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|v| v.neighbours.len()).sum::<usize>() / 2
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, idx: usize) -> Option<&Vertex> {
        self.vertices.get(idx)
    }

    /// Positions of every waypoint, in the order they were first read
    pub fn navigation_nodes(&self) -> Vec<Vec3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Position of the vertex created from `token`
    pub fn node_by_key(&self, token: &str) -> Option<Vec3> {
        self.index.get(token).map(|&idx| self.vertices[idx].position)
    }

    /// Index of the vertex at exactly `position`
    pub fn node_index(&self, position: Vec3) -> Option<usize> {
        self.vertices.iter().position(|v| v.position == position)
    }

    pub fn contains_node(&self, position: Vec3) -> bool {
        self.node_index(position).is_some()
    }

    /// Waypoint closest to an arbitrary position, earliest vertex on ties
    pub fn nearest_node(&self, position: Vec3) -> Option<Vec3> {
        self.vertices
            .iter()
            .map(|v| v.position)
            .fold(None, |best: Option<Vec3>, p| match best {
                Some(b) if b.distance_squared(position) <= p.distance_squared(position) => Some(b),
                _ => Some(p),
            })
    }

    /// Shortest path between two waypoints, both ends included.
    /// `None` if either position is not a waypoint or no route exists.
    pub fn path(&self, start: Vec3, end: Vec3) -> Option<Vec<Vec3>> {
        let start_idx = self.node_index(start)?;
        let end_idx = self.node_index(end)?;
        let indices = pathfinder::find_path(self, start_idx, end_idx)?;
        Some(
            indices
                .into_iter()
                .map(|idx| self.vertices[idx].position)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "\
000000000 010000000
010000000 010000010
010000010 000000010
000000010 000000000
";

    #[test]
    fn test_parse_token() {
        assert_eq!(parse_token("010000-05").unwrap(), Vec3::new(10.0, 0.0, -5.0));
        assert_eq!(parse_token("+01002003").unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert!(parse_token("12345678").is_err());
        assert!(parse_token("0100a0000").is_err());
        assert!(parse_token("0100000000").is_err());
    }

    #[test]
    fn test_edges_are_reciprocal() {
        let graph = NavGraph::parse(SQUARE).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.edge_count(), 4);
        for (idx, vertex) in graph.vertices().iter().enumerate() {
            for &n in &vertex.neighbours {
                assert!(
                    graph.vertex(n).unwrap().neighbours.contains(&idx),
                    "edge {} -> {} has no reverse",
                    vertex.key,
                    graph.vertex(n).unwrap().key
                );
            }
        }
    }

    #[test]
    fn test_tokens_are_reused() {
        let graph = NavGraph::parse("000000000 001000000\n001000000 000000000\n").unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.navigation_nodes(),
            vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]
        );
        assert_eq!(graph.node_by_key("001000000"), Some(Vec3::X));
    }

    #[test]
    fn test_wrong_token_count_is_fatal() {
        let err = NavGraph::parse("000000000 001000000\n000000000\n").unwrap_err();
        match err {
            NavError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(NavGraph::parse("000000000 001000000 002000000\n").is_err());
    }

    #[test]
    fn test_malformed_coordinate_is_fatal() {
        let err = NavGraph::parse("000000000 00x000000\n").unwrap_err();
        assert!(matches!(err, NavError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = NavGraph::load(Path::new("/definitely/not/here.nav")).unwrap_err();
        assert!(matches!(err, NavError::Unavailable { .. }));
    }

    #[test]
    fn test_nearest_node() {
        let graph = NavGraph::parse(SQUARE).unwrap();
        assert_eq!(
            graph.nearest_node(Vec3::new(9.0, 0.0, 2.0)),
            Some(Vec3::new(10.0, 0.0, 0.0))
        );
        assert_eq!(NavGraph::default().nearest_node(Vec3::ZERO), None);
    }
}
