//! GEXF reader.
//!
//! Supports the subset the atlas needs: `<attributes>` declarations,
//! `<attvalue>` values, `viz:position`, edge weights and the graph's default
//! edge type. Unknown elements are skipped.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::{EdgeRecord, Graph, NodeRecord};
use crate::error::{AtlasError, Result};

/// Attribute title mapped to `NodeRecord::homepage`.
pub const HOMEPAGE: &str = "homepage";

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Class {
	Node,
	Edge,
}

struct Declared {
	title: String,
	numeric: bool,
}

enum Pending {
	Node(NodeRecord),
	Edge(EdgeRecord),
}

fn attrs(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
	let mut out = HashMap::new();
	for attr in e.attributes() {
		let attr = attr.map_err(AtlasError::gexf)?;
		let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
		let value = attr.unescape_value().map_err(AtlasError::gexf)?.into_owned();
		out.insert(key, value);
	}
	Ok(out)
}

fn is_numeric_type(kind: &str) -> bool {
	matches!(
		kind,
		"integer" | "long" | "float" | "double" | "short" | "byte"
	)
}

/// Parse a GEXF document into an attribute graph.
pub fn parse(text: &str) -> Result<Graph> {
	let mut reader = Reader::from_str(text);
	reader.config_mut().trim_text(true);

	let mut graph = Graph::new(false);
	let mut declared: HashMap<(Class, String), Declared> = HashMap::new();
	let mut class = Class::Node;
	let mut pending: Option<Pending> = None;
	let mut pending_edges = Vec::new();
	let mut seen_graph = false;

	loop {
		let event = reader.read_event().map_err(|e| {
			AtlasError::gexf(format!("at byte {}: {}", reader.buffer_position(), e))
		})?;
		let (e, empty) = match event {
			Event::Start(e) => (e, false),
			Event::Empty(e) => (e, true),
			Event::End(e) => {
				match e.local_name().as_ref() {
					b"node" | b"edge" => finish(&mut graph, &mut pending_edges, pending.take()),
					_ => {}
				}
				continue;
			}
			Event::Eof => break,
			_ => continue,
		};

		match e.local_name().as_ref() {
			b"graph" => {
				seen_graph = true;
				let a = attrs(&e)?;
				graph.directed = a.get("defaultedgetype").map(String::as_str) == Some("directed");
			}
			b"attributes" => {
				let a = attrs(&e)?;
				class = match a.get("class").map(String::as_str) {
					Some("edge") => Class::Edge,
					_ => Class::Node,
				};
			}
			b"attribute" => {
				let a = attrs(&e)?;
				let Some(id) = a.get("id") else {
					return Err(AtlasError::gexf("attribute declaration without id"));
				};
				let title = a.get("title").cloned().unwrap_or_else(|| id.clone());
				let numeric = a.get("type").is_some_and(|t| is_numeric_type(t));
				declared.insert((class, id.clone()), Declared { title, numeric });
			}
			b"node" => {
				let a = attrs(&e)?;
				let Some(id) = a.get("id") else {
					return Err(AtlasError::gexf("node without id"));
				};
				let mut node = NodeRecord::new(id.clone());
				if let Some(label) = a.get("label") {
					node.label = label.clone();
				}
				pending = Some(Pending::Node(node));
				if empty {
					finish(&mut graph, &mut pending_edges, pending.take());
				}
			}
			b"edge" => {
				let a = attrs(&e)?;
				let (Some(source), Some(target)) = (a.get("source"), a.get("target")) else {
					return Err(AtlasError::gexf("edge without source or target"));
				};
				let mut edge = EdgeRecord::new(source.clone(), target.clone());
				if let Some(w) = a.get("weight").and_then(|w| w.parse().ok()) {
					edge.weight = w;
				}
				pending = Some(Pending::Edge(edge));
				if empty {
					finish(&mut graph, &mut pending_edges, pending.take());
				}
			}
			b"attvalue" => {
				let a = attrs(&e)?;
				let (Some(key), Some(value)) = (a.get("for").or_else(|| a.get("id")), a.get("value"))
				else {
					continue;
				};
				match pending.as_mut() {
					Some(Pending::Node(node)) => {
						let decl = declared.get(&(Class::Node, key.clone()));
						let title = decl.map_or(key.as_str(), |d| d.title.as_str());
						let numeric = decl.map(|d| d.numeric);
						if title == HOMEPAGE {
							node.homepage = Some(value.clone());
						} else if title == "label" {
							node.label = value.clone();
						} else {
							store(&mut node.metrics, &mut node.extra, title, value, numeric);
						}
					}
					Some(Pending::Edge(edge)) => {
						let decl = declared.get(&(Class::Edge, key.clone()));
						let title = decl.map_or(key.as_str(), |d| d.title.as_str());
						if let Ok(v) = value.parse::<f64>() {
							edge.metrics.insert(title.to_string(), v);
						}
					}
					None => {}
				}
			}
			b"position" => {
				if let Some(Pending::Node(node)) = pending.as_mut() {
					let a = attrs(&e)?;
					let x = a.get("x").and_then(|v| v.parse().ok());
					let y = a.get("y").and_then(|v| v.parse().ok());
					if let (Some(x), Some(y)) = (x, y) {
						node.position = Some((x, y));
					}
				}
			}
			_ => {}
		}
	}

	if !seen_graph {
		return Err(AtlasError::gexf("missing <graph> element"));
	}
	// Edges may precede their nodes in hand-written files.
	for edge in pending_edges {
		graph.add_edge(edge);
	}
	Ok(graph)
}

fn finish(graph: &mut Graph, edges: &mut Vec<EdgeRecord>, pending: Option<Pending>) {
	match pending {
		Some(Pending::Node(node)) => graph.add_node(node),
		Some(Pending::Edge(edge)) => edges.push(edge),
		None => {}
	}
}

fn store(
	metrics: &mut std::collections::BTreeMap<String, f64>,
	extra: &mut std::collections::BTreeMap<String, String>,
	title: &str,
	value: &str,
	numeric: Option<bool>,
) {
	match (numeric, value.parse::<f64>()) {
		(Some(true) | None, Ok(v)) => {
			metrics.insert(title.to_string(), v);
		}
		// Declared numeric but unparsable: the mapper defaults absent metrics.
		(Some(true), Err(_)) => {}
		_ => {
			extra.insert(title.to_string(), value.to_string());
		}
	}
}
