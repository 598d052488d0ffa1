//! Traversal and lookup over a graph store.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::error::GraphError;
use super::models::{DomainApi, Edge, EdgeKey, Node, NodeType, Relation};
use super::GraphStore;

/// Neighborhood of a node, as returned by [`GraphQuery::node_with_relations`].
#[derive(Debug, Clone, Serialize)]
pub struct Subgraph {
    pub root: Node,
    /// Every reached node that exists in the store, keyed by id. Includes the root.
    pub nodes: BTreeMap<String, Node>,
    /// Every traversed edge, once per (source, target, relation).
    pub edges: Vec<Edge>,
}

/// A feature with the nodes around it.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureContext {
    pub feature: Node,
    pub domain: Option<Node>,
    pub components: Vec<Node>,
    pub dependencies: Vec<Node>,
    pub dependents: Vec<Node>,
    /// APIs exported by the owning domain.
    pub domain_apis: Vec<DomainApi>,
}

/// A component with the nodes around it.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentContext {
    pub component: Node,
    pub features: Vec<Node>,
    /// Domain of the first realizing feature.
    pub domain: Option<Node>,
    pub dependencies: Vec<Node>,
    /// The `design` block of the component document.
    pub design: Option<serde_yaml::Value>,
}

/// One level of the product tree.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyNode {
    pub node: Node,
    pub children: Vec<HierarchyNode>,
}

/// Product → domain → feature → component tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Hierarchy {
    pub products: Vec<HierarchyNode>,
    /// Features no domain owns.
    pub unowned_features: Vec<Node>,
}

/// Query engine over any [`GraphStore`].
pub struct GraphQuery<'a, S: GraphStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GraphStore + ?Sized> GraphQuery<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn node(&self, id: &str) -> Result<Option<Node>, GraphError> {
        self.store.get_node(id)
    }

    pub fn nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, GraphError> {
        self.store.nodes_by_type(node_type)
    }

    pub fn all_domains(&self) -> Result<Vec<Node>, GraphError> {
        self.store.nodes_by_type(NodeType::Domain)
    }

    pub fn all_features(&self) -> Result<Vec<Node>, GraphError> {
        self.store.nodes_by_type(NodeType::Feature)
    }

    pub fn all_components(&self) -> Result<Vec<Node>, GraphError> {
        self.store.nodes_by_type(NodeType::Component)
    }

    /// Targets of outgoing edges that exist as nodes.
    pub fn children(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Node>, GraphError> {
        let mut nodes = Vec::new();
        for edge in self.store.edges_from(id, relation)? {
            if let Some(node) = self.store.get_node(&edge.target_id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Sources of incoming edges that exist as nodes.
    pub fn parents(&self, id: &str, relation: Option<Relation>) -> Result<Vec<Node>, GraphError> {
        let mut nodes = Vec::new();
        for edge in self.store.edges_to(id, relation)? {
            if let Some(node) = self.store.get_node(&edge.source_id)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Breadth-first neighborhood of `id` up to `depth` hops, following
    /// edges in both directions.
    ///
    /// Returns `None` when `id` is not a node. Edges to missing nodes are
    /// kept in the edge list; the missing ids are neither added to the node
    /// map nor expanded.
    pub fn node_with_relations(&self, id: &str, depth: usize) -> Result<Option<Subgraph>, GraphError> {
        let Some(root) = self.store.get_node(id)? else {
            return Ok(None);
        };

        let mut nodes = BTreeMap::new();
        nodes.insert(root.id.clone(), root.clone());
        let mut visited: HashSet<String> = HashSet::from([root.id.clone()]);
        let mut seen_edges: HashSet<EdgeKey> = HashSet::new();
        let mut edges = Vec::new();
        let mut queue = VecDeque::from([(root.id.clone(), 0usize)]);

        while let Some((current, hops)) = queue.pop_front() {
            if hops >= depth {
                continue;
            }

            for edge in self.incident_edges(&current)? {
                let next = edge.other_end(&current).to_string();
                if seen_edges.insert(edge.key()) {
                    edges.push(edge);
                }
                if !visited.insert(next.clone()) {
                    continue;
                }
                match self.store.get_node(&next)? {
                    Some(node) => {
                        nodes.insert(next.clone(), node);
                        queue.push_back((next, hops + 1));
                    }
                    None => tracing::debug!(id = %next, "skipping dangling reference"),
                }
            }
        }

        Ok(Some(Subgraph { root, nodes, edges }))
    }

    /// Shortest edge sequence between two ids, treating edges as undirected.
    ///
    /// `Some(vec![])` when `from == to`, `None` when `to` is unreachable.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Option<Vec<Edge>>, GraphError> {
        if from == to {
            return Ok(Some(Vec::new()));
        }

        let mut visited: HashSet<String> = HashSet::from([from.to_string()]);
        let mut came_by: HashMap<String, Edge> = HashMap::new();
        let mut queue = VecDeque::from([from.to_string()]);

        while let Some(current) = queue.pop_front() {
            for edge in self.incident_edges(&current)? {
                let next = edge.other_end(&current).to_string();
                if !visited.insert(next.clone()) {
                    continue;
                }
                came_by.insert(next.clone(), edge);
                if next == to {
                    return Ok(Some(Self::unwind(&came_by, from, to)));
                }
                queue.push_back(next);
            }
        }

        Ok(None)
    }

    fn unwind(came_by: &HashMap<String, Edge>, from: &str, to: &str) -> Vec<Edge> {
        let mut path = Vec::new();
        let mut cursor = to.to_string();
        while cursor != from {
            let Some(edge) = came_by.get(&cursor) else {
                break;
            };
            cursor = edge.other_end(&cursor).to_string();
            path.push(edge.clone());
        }
        path.reverse();
        path
    }

    /// Outgoing edges first, then incoming.
    fn incident_edges(&self, id: &str) -> Result<Vec<Edge>, GraphError> {
        let mut edges = self.store.edges_from(id, None)?;
        edges.extend(self.store.edges_to(id, None)?);
        Ok(edges)
    }

    /// Case-insensitive substring search over name and description.
    pub fn search_nodes(&self, query: &str, types: Option<&[NodeType]>) -> Result<Vec<Node>, GraphError> {
        let needle = query.to_lowercase();
        let matches = self
            .store
            .all_nodes()?
            .into_iter()
            .filter(|n| types.map_or(true, |t| t.contains(&n.node_type)))
            .filter(|n| {
                n.name.to_lowercase().contains(&needle)
                    || n.description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(&needle))
            })
            .collect();
        Ok(matches)
    }

    pub fn domain_apis(&self, domain_id: &str) -> Result<Vec<DomainApi>, GraphError> {
        self.store.domain_apis(domain_id)
    }

    /// Features a domain owns.
    pub fn features_by_domain(&self, domain_id: &str) -> Result<Vec<Node>, GraphError> {
        Ok(self
            .children(domain_id, Some(Relation::Owns))?
            .into_iter()
            .filter(|n| n.node_type == NodeType::Feature)
            .collect())
    }

    pub fn feature_context(&self, id: &str) -> Result<Option<FeatureContext>, GraphError> {
        let Some(feature) = self.store.get_node(id)? else {
            return Ok(None);
        };

        let domain = self.parents(id, Some(Relation::Owns))?.into_iter().next();
        let domain_apis = match &domain {
            Some(d) => self.store.domain_apis(&d.id)?,
            None => Vec::new(),
        };

        Ok(Some(FeatureContext {
            components: self.children(id, Some(Relation::RealizedBy))?,
            dependencies: self.children(id, Some(Relation::DependsOn))?,
            dependents: self.parents(id, Some(Relation::DependsOn))?,
            feature,
            domain,
            domain_apis,
        }))
    }

    pub fn component_context(&self, id: &str) -> Result<Option<ComponentContext>, GraphError> {
        let Some(component) = self.store.get_node(id)? else {
            return Ok(None);
        };

        let features = self.parents(id, Some(Relation::RealizedBy))?;
        let domain = match features.first() {
            Some(f) => self.parents(&f.id, Some(Relation::Owns))?.into_iter().next(),
            None => None,
        };
        let design = component
            .raw_content
            .as_deref()
            .and_then(|raw| serde_yaml::from_str::<serde_yaml::Value>(raw).ok())
            .and_then(|doc| doc.get("design").cloned());

        Ok(Some(ComponentContext {
            dependencies: self.children(id, Some(Relation::DependsOn))?,
            component,
            features,
            domain,
            design,
        }))
    }

    /// Build the product tree.
    pub fn hierarchy(&self) -> Result<Hierarchy, GraphError> {
        let mut owned: HashSet<String> = HashSet::new();
        let mut products = Vec::new();

        for product in self.store.nodes_by_type(NodeType::Product)? {
            let mut domains = Vec::new();
            for domain in self.children(&product.id, Some(Relation::Contains))? {
                let mut features = Vec::new();
                for feature in self.features_by_domain(&domain.id)? {
                    owned.insert(feature.id.clone());
                    let components = self
                        .children(&feature.id, Some(Relation::RealizedBy))?
                        .into_iter()
                        .map(|node| HierarchyNode {
                            node,
                            children: Vec::new(),
                        })
                        .collect();
                    features.push(HierarchyNode {
                        node: feature,
                        children: components,
                    });
                }
                domains.push(HierarchyNode {
                    node: domain,
                    children: features,
                });
            }
            products.push(HierarchyNode {
                node: product,
                children: domains,
            });
        }

        let mut unowned_features = Vec::new();
        for feature in self.store.nodes_by_type(NodeType::Feature)? {
            if owned.contains(&feature.id) {
                continue;
            }
            if self.store.edges_to(&feature.id, Some(Relation::Owns))?.is_empty() {
                unowned_features.push(feature);
            }
        }

        Ok(Hierarchy {
            products,
            unowned_features,
        })
    }

    pub fn dangling_edges(&self) -> Result<Vec<Edge>, GraphError> {
        self.store.dangling_edges()
    }
}
