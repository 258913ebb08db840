use crate::file::FileVersion;
use crate::id::{FileId, FolderId};
use time::UtcDateTime;

/// Reference to a child node, as listed by its parent folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    File(FileId),
    Folder(FolderId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDescriptor {
    pub id: FolderId,
    pub name: String,
    /// Remote path of the folder's parent, starting with the root folder name.
    /// Empty for the root folder itself.
    pub path: String,
    pub updated_at: UtcDateTime,
}

/// A node as returned by the remote: either a leaf file, or a folder plus the
/// references to its children (not yet resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedNode {
    File(FileVersion),
    Folder(FolderDescriptor, Vec<NodeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File(FileVersion),
    Folder(Folder),
}

/// A fully discovered folder and everything beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub descriptor: FolderDescriptor,
    pub children: Vec<Node>,
}

impl Folder {
    pub fn new(descriptor: FolderDescriptor) -> Self {
        Self { descriptor, children: Vec::new() }
    }

    /// Number of nodes in the tree, counting this folder.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| match child {
                Node::File(_) => 1,
                Node::Folder(folder) => folder.node_count(),
            })
            .sum::<usize>()
    }

    /// Number of levels below this folder. A folder holding only files has a
    /// depth of one; an empty folder has a depth of zero.
    pub fn depth(&self) -> usize {
        if self.children.is_empty() {
            return 0;
        }
        1 + self
            .children
            .iter()
            .map(|child| match child {
                Node::File(_) => 0,
                Node::Folder(folder) => folder.depth(),
            })
            .max()
            .unwrap_or(0)
    }

    /// Every file in the tree, depth-first.
    pub fn files(&self) -> Vec<&FileVersion> {
        let mut files = Vec::new();
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            for child in &folder.children {
                match child {
                    Node::File(file) => files.push(file),
                    Node::Folder(sub) => stack.push(sub),
                }
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileIdentity;

    fn folder(id: u64, name: &str) -> Folder {
        Folder::new(FolderDescriptor {
            id: FolderId(id),
            name: name.to_string(),
            path: String::new(),
            updated_at: UtcDateTime::UNIX_EPOCH,
        })
    }

    fn file(id: u64) -> Node {
        Node::File(FileVersion::new(FileIdentity::new(id, format!("{id}.txt"), "Root"), 1, UtcDateTime::UNIX_EPOCH))
    }

    #[test]
    fn test_counts_and_depth() {
        let empty = folder(1, "Root");
        assert_eq!(empty.node_count(), 1);
        assert_eq!(empty.depth(), 0);

        let mut inner = folder(2, "inner");
        inner.children.push(file(10));
        inner.children.push(Node::Folder(folder(3, "empty")));
        let mut root = folder(1, "Root");
        root.children.push(file(11));
        root.children.push(Node::Folder(inner));
        assert_eq!(root.node_count(), 5);
        assert_eq!(root.depth(), 2);
        let mut ids: Vec<_> = root.files().into_iter().map(|f| f.id().0).collect();
        ids.sort();
        assert_eq!(ids, vec![10, 11]);
    }
}
