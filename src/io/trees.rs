use std::collections::HashMap;

use anyhow::{anyhow, bail, Result};
use log::{debug, warn};
use phylotree::tree::Tree as PhyloTree;

use crate::tree::{Tree, TreeBundle, TreeFileFormat};

/// Parse every tree in a Newick or Nexus document.
pub fn parse_trees(raw: &str) -> Result<TreeBundle> {
    let format = detect_format(raw);
    let trees = match format {
        TreeFileFormat::Newick => parse_newick(raw)?,
        TreeFileFormat::Nexus => parse_nexus(raw)?,
    };
    Ok(TreeBundle::new(format, trees))
}

const NEXUS_HEADER: &str = "#nexus";

fn detect_format(raw: &str) -> TreeFileFormat {
    if nexus_body(&strip_comments(raw)).is_some() {
        TreeFileFormat::Nexus
    } else {
        TreeFileFormat::Newick
    }
}

/// Text following the `#NEXUS` header, if present.
fn nexus_body(text: &str) -> Option<&str> {
    let text = text.trim_start();
    text.get(..NEXUS_HEADER.len())
        .filter(|header| header.eq_ignore_ascii_case(NEXUS_HEADER))
        .map(|_| &text[NEXUS_HEADER.len()..])
}

fn parse_newick(raw: &str) -> Result<Vec<Tree>> {
    strip_comments(raw)
        .split(';')
        .map(compact)
        .filter(|newick| !newick.is_empty())
        .enumerate()
        .map(|(index, newick)| build_tree(index, None, newick))
        .collect()
}

/// Reads the TREES block statement by statement; bracketed comments and
/// annotations are dropped first.
fn parse_nexus(raw: &str) -> Result<Vec<Tree>> {
    let text = strip_comments(raw);
    let body = nexus_body(&text).ok_or_else(|| anyhow!("missing #NEXUS header"))?;
    let mut trees = Vec::new();
    let mut in_trees_block = false;
    let mut translate: HashMap<String, String> = HashMap::new();

    for statement in body.split(';') {
        let statement = statement.trim();
        let (keyword, rest) = statement
            .split_once(char::is_whitespace)
            .unwrap_or((statement, ""));
        let keyword = keyword.to_ascii_lowercase();

        match keyword.as_str() {
            "begin" => in_trees_block = rest.trim().eq_ignore_ascii_case("trees"),
            "end" | "endblock" => in_trees_block = false,
            "translate" if in_trees_block => translate = parse_translate(rest),
            "tree" | "utree" if in_trees_block => {
                let (label, newick) = split_tree_statement(rest)?;
                let mut tree = build_tree(trees.len(), label, newick)?;
                apply_translate(&mut tree, &translate);
                trees.push(tree);
            }
            _ => {}
        }
    }

    Ok(trees)
}

/// `name = (newick)` with an optional `*` marker and quoted name.
fn split_tree_statement(statement: &str) -> Result<(Option<String>, String)> {
    let (label, newick) = statement
        .split_once('=')
        .ok_or_else(|| anyhow!("missing tree definition in nexus statement: {statement}"))?;

    let label = label
        .trim()
        .trim_start_matches('*')
        .trim()
        .trim_matches(|c| c == '"' || c == '\'');
    let label = (!label.is_empty()).then(|| label.to_string());

    let newick = compact(newick);
    if newick.is_empty() {
        bail!("empty tree definition in nexus statement: {statement}");
    }
    Ok((label, newick))
}

/// `1 Homo_sapiens, 2 Pan_troglodytes, ...`
fn parse_translate(body: &str) -> HashMap<String, String> {
    body.split(',')
        .filter_map(|pair| {
            let mut parts = pair.split_whitespace();
            let token = parts.next()?;
            let name = parts.next()?.trim_matches(|c| c == '"' || c == '\'');
            Some((token.to_string(), name.to_string()))
        })
        .collect()
}

fn apply_translate(tree: &mut Tree, translate: &HashMap<String, String>) {
    if translate.is_empty() {
        return;
    }
    for node in tree.nodes.iter_mut().filter(|node| node.is_leaf()) {
        if let Some(name) = node.name.as_ref().and_then(|name| translate.get(name)) {
            node.name = Some(name.clone());
        }
    }
}

fn build_tree(index: usize, label: Option<String>, newick: String) -> Result<Tree> {
    let phylo = PhyloTree::from_newick(&newick)
        .map_err(|err| anyhow!("failed to parse newick tree #{}: {err}", index + 1))?;
    let tree = Tree::new(index, label, newick, &phylo);
    if tree.root.is_none() {
        warn!("tree #{} has no root", index + 1);
    }
    debug!("parsed tree #{} with {} nodes", index + 1, tree.nodes.len());
    Ok(tree)
}

/// Remove `[...]` comments, leaving quoted names intact.
fn strip_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    let mut quoted = false;

    for c in raw.chars() {
        match c {
            '\'' if depth == 0 => {
                quoted = !quoted;
                out.push(c);
            }
            '[' if !quoted => depth += 1,
            ']' if !quoted && depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Drop whitespace outside quoted names and terminate with `;`.
fn compact(newick: &str) -> String {
    let mut out = String::with_capacity(newick.len() + 1);
    let mut quoted = false;
    for c in newick.chars() {
        if c == '\'' {
            quoted = !quoted;
        }
        if quoted || !c.is_whitespace() {
            out.push(c);
        }
    }
    if !out.is_empty() {
        out.push(';');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_names(tree: &Tree) -> Vec<String> {
        let mut names: Vec<_> = tree
            .external_nodes()
            .into_iter()
            .filter_map(|node| node.name.clone())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn detects_format() {
        assert_eq!(detect_format("#NEXUS\nBEGIN TREES;"), TreeFileFormat::Nexus);
        assert_eq!(detect_format("   #nexus   \n"), TreeFileFormat::Nexus);
        assert_eq!(detect_format("[comment]\n#NEXUS"), TreeFileFormat::Nexus);
        assert_eq!(detect_format("(A:0.1,B:0.2);"), TreeFileFormat::Newick);
    }

    #[test]
    fn parses_several_newick_trees() {
        let bundle = parse_trees("(A:0.1,B:0.2);\n(C:0.3,(D:0.4,E:0.5));\n").unwrap();
        assert_eq!(bundle.format, TreeFileFormat::Newick);
        assert_eq!(bundle.trees.len(), 2);
        assert_eq!(bundle.trees[0].newick, "(A:0.1,B:0.2);");
        assert_eq!(leaf_names(&bundle.trees[1]), vec!["C", "D", "E"]);
        assert_eq!(bundle.trees[1].id, 1);
    }

    #[test]
    fn nexus_annotations_and_comments_are_dropped() {
        let input = "#NEXUS
[This is a comment]
BEGIN TREES;
    TREE tree1 = [&R] ((A[&rate=0.5]:0.1,B:0.2)[&posterior=0.99]:0.3,C:0.4); [inline]
    TREE 'my tree' =
        (D:0.1,
         E:0.2);
END;";
        let bundle = parse_trees(input).unwrap();
        assert_eq!(bundle.format, TreeFileFormat::Nexus);
        assert_eq!(bundle.trees.len(), 2);
        assert_eq!(bundle.trees[0].label.as_deref(), Some("tree1"));
        assert!(!bundle.trees[0].newick.contains('['));
        assert_eq!(leaf_names(&bundle.trees[0]), vec!["A", "B", "C"]);
        assert_eq!(bundle.trees[1].label.as_deref(), Some("my tree"));
        assert_eq!(bundle.trees[1].newick, "(D:0.1,E:0.2);");
    }

    #[test]
    fn nexus_translate_table_renames_tips() {
        let input = "#NEXUS
BEGIN TAXA;
    DIMENSIONS NTAX=2;
END;
BEGIN TREES;
    TRANSLATE
        1 Homo_sapiens,
        2 Pan_troglodytes;
    UTREE * t1 = (1:0.5,2:0.5);
END;";
        let bundle = parse_trees(input).unwrap();
        assert_eq!(bundle.trees.len(), 1);
        assert_eq!(bundle.trees[0].label.as_deref(), Some("t1"));
        assert_eq!(
            leaf_names(&bundle.trees[0]),
            vec!["Homo_sapiens", "Pan_troglodytes"]
        );
    }

    #[test]
    fn tree_statement_without_definition_is_an_error() {
        assert!(split_tree_statement("tree1").is_err());
        assert!(split_tree_statement("tree1 = ").is_err());
    }

    #[test]
    fn compact_keeps_quoted_whitespace() {
        assert_eq!(compact(" ( A , 'B c' ) "), "(A,'B c');");
        assert_eq!(compact("   "), "");
    }
}
