use crate::panels::{LayoutOption, NodeKind, NodeReport};
use crate::render::legend::LegendPanel;
use crate::tree::TreeBundle;

pub fn render_summary(bundle: &TreeBundle) {
    println!(
        "Loaded {:?} file with {} tree(s).",
        bundle.format,
        bundle.trees.len()
    );

    let Some(tree) = bundle.trees.first() else {
        return;
    };
    let name = tree
        .label
        .clone()
        .unwrap_or_else(|| format!("tree #{}", tree.id + 1));
    println!(
        "Showing {name}: {} nodes, {} tips.",
        tree.nodes.len(),
        tree.leaf_count()
    );
    if bundle.trees.len() > 1 {
        println!("... ({} more tree(s) ignored)", bundle.trees.len() - 1);
    }
}

pub fn print_report(report: &NodeReport, anchor: Option<(i32, i32)>) {
    print!("{}", format_report(report));
    if let Some((x, y)) = anchor {
        println!("(menu at {x},{y})");
    }
}

pub fn print_legend(legend: &LegendPanel) {
    for key in legend.keys() {
        println!("Legend [{}] {}", key.axis.name(), key.title);
        for (category, color) in &key.entries {
            println!("  {color}  {category}");
        }
    }
}

pub fn print_options(columns: &[String], color_maps: &[&str], layouts: &[LayoutOption]) {
    print!("{}", format_options(columns, color_maps, layouts));
}

/// The choices each panel offers, one section per panel list.
pub fn format_options(columns: &[String], color_maps: &[&str], layouts: &[LayoutOption]) -> String {
    let mut out = String::from("Columns:\n");
    for column in columns {
        out.push_str(&format!("  {column}\n"));
    }
    out.push_str("Color maps:\n");
    for id in color_maps {
        out.push_str(&format!("  {id}\n"));
    }
    out.push_str("Layouts:\n");
    for layout in layouts {
        let mark = if layout.checked { '*' } else { ' ' };
        out.push_str(&format!(" {mark}{}\n", layout.name));
    }
    out
}

/// Plain-text node menu: the ID row, then one block per column.
pub fn format_report(report: &NodeReport) -> String {
    let mut out = format!("ID\t{}\n", report.id);
    if report.kind == NodeKind::Internal {
        out.push_str(&format!("Tips\t{}\n", report.tips.len()));
    }
    for row in &report.rows {
        out.push_str(&format!("{} ({})\n", row.column, row.origin.tag()));
        for (category, count) in &row.counts {
            out.push_str(&format!("  {category}\t{count}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panels::node_menu::ReportRow;
    use crate::panels::ColumnOrigin;

    #[test]
    fn report_starts_with_the_node_id() {
        let report = NodeReport {
            id: "X".to_string(),
            kind: NodeKind::Internal,
            tips: vec!["B".to_string(), "C".to_string()],
            rows: vec![ReportRow {
                column: "Site".to_string(),
                origin: ColumnOrigin::Sample,
                counts: vec![("gut".to_string(), 0), ("skin".to_string(), 2)],
            }],
        };

        assert_eq!(
            format_report(&report),
            "ID\tX\nTips\t2\nSite (s)\n  gut\t0\n  skin\t2\n"
        );
    }

    #[test]
    fn options_mark_the_checked_layout() {
        let layouts = [
            LayoutOption {
                name: "Rectangular",
                checked: true,
            },
            LayoutOption {
                name: "Circular",
                checked: false,
            },
        ];
        let text = format_options(&["Site".to_string()], &["Dark2"], &layouts);
        assert_eq!(
            text,
            "Columns:\n  Site\nColor maps:\n  Dark2\nLayouts:\n *Rectangular\n  Circular\n"
        );
    }
}
