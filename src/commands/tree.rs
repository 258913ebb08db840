use super::load_bound;
use crate::error::{self, Result};
use crate::workspace::Workspace;
use std::fmt::Write;
use treesync_model::{Folder, Node};

pub async fn run(workspace: &Workspace) -> Result<()> {
    let (_state, project) = load_bound(&workspace.store(false)).await?;
    let sync = workspace.synchronizer(&project.id, true)?;
    let tree = sync.tree(project.root_folder_id).await.map_err(error::sync)?;
    print!("{}", render(&tree.root));
    println!("{} node(s), {} level(s)", tree.root.node_count(), tree.rounds);
    Ok(())
}

fn render(root: &Folder) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}/", root.descriptor.name);
    render_children(root, 1, &mut out);
    out
}

fn render_children(folder: &Folder, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for child in &folder.children {
        match child {
            Node::File(file) => {
                let _ = writeln!(out, "{indent}{} (v{})", file.filename(), file.version);
            },
            Node::Folder(sub) => {
                let _ = writeln!(out, "{indent}{}/", sub.descriptor.name);
                render_children(sub, depth + 1, out);
            },
        }
    }
}
