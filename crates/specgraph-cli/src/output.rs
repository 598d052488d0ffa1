//! Plain-text printing of query results.

use serde::Serialize;
use specgraph_core::graph::{ComponentContext, FeatureContext, Hierarchy, HierarchyNode, Subgraph};
use specgraph_core::{Edge, GraphDb, GraphStore, Node, SchemaValidationReport};

pub fn print_node_line(node: &Node) {
    if node.name == node.id {
        println!("{:<10} {}", node.node_type.as_str(), node.id);
    } else {
        println!("{:<10} {}  ({})", node.node_type.as_str(), node.id, node.name);
    }
}

fn print_edge(edge: &Edge) {
    println!("  {} --{}--> {}", edge.source_id, edge.relation, edge.target_id);
}

pub fn print_subgraph(sub: &Subgraph) {
    let root = &sub.root;
    println!("{} [{}] {}", root.id, root.node_type, root.name);
    if let Some(desc) = &root.description {
        println!("  {}", desc);
    }
    if let Some(source) = &root.source_file {
        println!("  source: {}", source);
    }

    println!("\nNodes ({}):", sub.nodes.len());
    for node in sub.nodes.values() {
        print!("  ");
        print_node_line(node);
    }
    println!("\nEdges ({}):", sub.edges.len());
    for edge in &sub.edges {
        let missing = [&edge.source_id, &edge.target_id]
            .into_iter()
            .any(|id| !sub.nodes.contains_key(id.as_str()));
        if missing {
            println!("  {} --{}--> {}  (beyond depth or missing)", edge.source_id, edge.relation, edge.target_id);
        } else {
            print_edge(edge);
        }
    }
}

pub fn print_path(from: &str, path: &[Edge]) {
    println!("{} hops from {}:", path.len(), from);
    for edge in path {
        print_edge(edge);
    }
}

fn print_tree_node(node: &HierarchyNode, depth: usize) {
    println!("{}{} ({})", "  ".repeat(depth), node.node.id, node.node.name);
    for child in &node.children {
        print_tree_node(child, depth + 1);
    }
}

pub fn print_hierarchy(hierarchy: &Hierarchy) {
    if hierarchy.products.is_empty() {
        println!("No product nodes. Run `specgraph sync` first.");
    }
    for product in &hierarchy.products {
        print_tree_node(product, 0);
    }
    if !hierarchy.unowned_features.is_empty() {
        println!("\nFeatures without a domain:");
        for feature in &hierarchy.unowned_features {
            println!("  {} ({})", feature.id, feature.name);
        }
    }
}

fn print_list(title: &str, nodes: &[Node]) {
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    if ids.is_empty() {
        println!("{:<13} -", title);
    } else {
        println!("{:<13} {}", title, ids.join(", "));
    }
}

pub fn print_feature(ctx: &FeatureContext) {
    let f = &ctx.feature;
    println!("{} ({})", f.id, f.name);
    if let Some(intent) = &f.intent {
        println!("Intent:       {}", intent);
    }
    println!(
        "Domain:       {}",
        ctx.domain.as_ref().map(|d| d.id.as_str()).unwrap_or("-")
    );
    print_list("Components:", &ctx.components);
    print_list("Depends on:", &ctx.dependencies);
    print_list("Required by:", &ctx.dependents);
    if !ctx.domain_apis.is_empty() {
        println!("Domain APIs:");
        for api in &ctx.domain_apis {
            println!("  {}  {}", api.api_name, api.signature);
        }
    }
}

pub fn print_component(ctx: &ComponentContext) -> color_eyre::Result<()> {
    let c = &ctx.component;
    println!("{} ({})", c.id, c.name);
    if let Some(path) = &c.file_path {
        println!("File:         {}", path);
    }
    println!(
        "Domain:       {}",
        ctx.domain.as_ref().map(|d| d.id.as_str()).unwrap_or("-")
    );
    print_list("Features:", &ctx.features);
    print_list("Depends on:", &ctx.dependencies);
    if let Some(design) = &ctx.design {
        println!("Design:");
        for line in design_lines(design)? {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn design_lines<T: Serialize>(value: &T) -> color_eyre::Result<Vec<String>> {
    let text = serde_json::to_string_pretty(value)?;
    Ok(text.lines().map(str::to_string).collect())
}

pub fn print_validation(report: &SchemaValidationReport) {
    for result in &report.results {
        if result.errors.is_empty() && result.warnings.is_empty() {
            continue;
        }
        let marker = if result.is_valid { "!" } else { "x" };
        let node_type = result.node_type.map(|t| t.as_str()).unwrap_or("unknown");
        println!("{} {} ({})", marker, result.file_path, node_type);
        for e in &result.errors {
            println!("    error   {}: {}", e.field, e.message);
        }
        for w in &result.warnings {
            println!("    warning {}: {}", w.field, w.message);
        }
    }
    println!(
        "\n{} files: {} valid, {} invalid, {} with warnings",
        report.total_files, report.valid_count, report.invalid_count, report.warning_count
    );
}

pub fn print_stats(db: &GraphDb) -> color_eyre::Result<()> {
    let stats = db.stats()?;
    println!("Nodes:       {}", stats.nodes);
    for (node_type, count) in &stats.nodes_by_type {
        println!("  {:<10} {}", node_type.display_name(), count);
    }
    println!("Edges:       {}", stats.edges);
    println!("Domain APIs: {}", stats.domain_apis);
    if let Some(last) = db.get_metadata("last_sync")? {
        println!("Last sync:   {}", last);
    }

    let dangling = db.dangling_edges()?;
    if !dangling.is_empty() {
        println!("\nEdges pointing at missing nodes ({}):", dangling.len());
        for edge in &dangling {
            print_edge(edge);
        }
    }
    Ok(())
}
