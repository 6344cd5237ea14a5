use crate::fs::tree::{Tree, VisibleRow};

/// Render the visible part of the tree as box-drawn text lines.
pub fn render_lines(tree: &Tree) -> Vec<String> {
    let rows = tree.visible_rows();
    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let node = tree.get(row.id)?;
            Some(format!(
                "{}{}{}",
                build_prefix(row, &rows, i),
                indicator(node.is_expanded, node.is_loaded),
                node.name()
            ))
        })
        .collect()
}

/// Indentation guides for one row.
///
/// Each ancestor level draws a continuation line unless that ancestor was
/// the last of its siblings.
fn build_prefix(row: &VisibleRow, rows: &[VisibleRow], index: usize) -> String {
    if row.depth == 0 {
        return String::new();
    }

    let mut parts: Vec<&str> = Vec::new();
    for d in 1..row.depth {
        let mut ancestor_is_last = false;
        for prev in rows[..index].iter().rev() {
            if prev.depth == d {
                ancestor_is_last = prev.is_last_sibling;
                break;
            }
            if prev.depth < d {
                break;
            }
        }
        parts.push(if ancestor_is_last { "   " } else { "│  " });
    }
    parts.push(if row.is_last_sibling { "└──" } else { "├──" });
    parts.join("")
}

fn indicator(is_expanded: bool, is_loaded: bool) -> &'static str {
    match (is_expanded, is_loaded) {
        (true, true) => "[-] ",
        (true, false) => "[!] ",
        (false, _) => "[+] ",
    }
}
