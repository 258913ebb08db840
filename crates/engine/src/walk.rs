//! Breadth-first discovery of the remote folder tree.
//!
//! Each level of the tree is one round: every reference in the frontier is
//! resolved concurrently, and the next round only starts once the whole level
//! is back. Files and folders are slotted into their parent at the position
//! the parent listed them, and the tree is assembled bottom-up at the end.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::future::try_join_all;
use std::future::Future;
use tracing::instrument;
use treesync_model::{Folder, FolderDescriptor, FolderId, Node, NodeRef, ResolvedNode};
use treesync_remote::Remote;

/// A fully resolved remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTree {
    pub root: Folder,
    /// Fan-out rounds performed, one per level below the root.
    pub rounds: usize,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    /// Arena index of the parent; `None` for the root folder.
    folder: Option<usize>,
    index: usize,
}

struct Pending {
    descriptor: FolderDescriptor,
    parent: Slot,
    children: Vec<Option<Node>>,
}

fn empty_slots(count: usize) -> Vec<Option<Node>> {
    std::iter::repeat_with(|| None).take(count).collect()
}

fn child_slots(folder: Option<usize>, children: Vec<NodeRef>) -> impl Iterator<Item = (NodeRef, Slot)> {
    children.into_iter().enumerate().map(move |(index, node)| (node, Slot { folder, index }))
}

fn place(root: &mut [Option<Node>], arena: &mut [Pending], slot: Slot, node: Node) {
    match slot.folder {
        None => root[slot.index] = Some(node),
        Some(parent) => arena[parent].children[slot.index] = Some(node),
    }
}

/// Walk the tree below `root`, resolving references with `fetch`.
///
/// Any failed fetch fails the whole walk.
pub async fn walk<F, Fut>(root: FolderId, fetch: F) -> Result<RemoteTree>
where
    F: Fn(NodeRef) -> Fut,
    Fut: Future<Output = treesync_remote::error::Result<ResolvedNode>>,
{
    let (descriptor, children) = match fetch(NodeRef::Folder(root)).await.or_raise(|| ErrorKind::Remote)? {
        ResolvedNode::Folder(descriptor, children) => (descriptor, children),
        ResolvedNode::File(_) => exn::bail!(ErrorKind::NotAFolder(root)),
    };
    let mut root_children = empty_slots(children.len());
    let mut arena: Vec<Pending> = Vec::new();
    let mut frontier: Vec<(NodeRef, Slot)> = child_slots(None, children).collect();
    let mut rounds = 0;

    while !frontier.is_empty() {
        rounds += 1;
        tracing::debug!(round = rounds, nodes = frontier.len(), "Resolving tree level");
        let resolved = try_join_all(frontier.iter().map(|(node, _)| fetch(*node)))
            .await
            .or_raise(|| ErrorKind::Remote)?;
        let mut next = Vec::new();
        for ((_, slot), node) in frontier.into_iter().zip(resolved) {
            match node {
                ResolvedNode::File(file) => place(&mut root_children, &mut arena, slot, Node::File(file)),
                ResolvedNode::Folder(descriptor, children) => {
                    let index = arena.len();
                    arena.push(Pending { descriptor, parent: slot, children: empty_slots(children.len()) });
                    next.extend(child_slots(Some(index), children));
                },
            }
        }
        frontier = next;
    }

    // Children always sit at higher arena indices than their parent.
    while let Some(pending) = arena.pop() {
        let children = pending.children.into_iter().flatten().collect();
        let folder = Folder { descriptor: pending.descriptor, children };
        place(&mut root_children, &mut arena, pending.parent, Node::Folder(folder));
    }
    let root = Folder { descriptor, children: root_children.into_iter().flatten().collect() };
    tracing::info!(nodes = root.node_count(), rounds, "Walked remote tree");
    Ok(RemoteTree { root, rounds })
}

/// [`walk`] using a [`Remote`] to resolve every reference.
#[instrument(skip(remote), fields(remote = remote.name()))]
pub async fn walk_remote(remote: &dyn Remote, root: FolderId) -> Result<RemoteTree> {
    walk(root, |node| remote.fetch_node(node)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::UtcDateTime;
    use treesync_model::{FileId, FileIdentity, FileVersion};
    use treesync_remote::{MockEvent, MockRemote};

    fn folder(id: u64, name: &str) -> FolderDescriptor {
        FolderDescriptor {
            id: FolderId(id),
            name: name.to_string(),
            path: String::new(),
            updated_at: UtcDateTime::UNIX_EPOCH,
        }
    }

    fn file(id: u64) -> FileVersion {
        FileVersion::new(FileIdentity::new(id, format!("{id}.step"), "Root"), 1, UtcDateTime::UNIX_EPOCH)
    }

    /// Root -> [f10, A -> [f11, B -> [f12], C -> []], D -> []]
    fn remote() -> MockRemote {
        MockRemote::default()
            .with_folder(folder(1, "Root"), vec![
                NodeRef::File(FileId(10)),
                NodeRef::Folder(FolderId(2)),
                NodeRef::Folder(FolderId(5)),
            ])
            .with_folder(folder(2, "A"), vec![
                NodeRef::File(FileId(11)),
                NodeRef::Folder(FolderId(3)),
                NodeRef::Folder(FolderId(4)),
            ])
            .with_folder(folder(3, "B"), vec![NodeRef::File(FileId(12))])
            .with_folder(folder(4, "C"), Vec::new())
            .with_folder(folder(5, "D"), Vec::new())
            .with_file(file(10))
            .with_file(file(11))
            .with_file(file(12))
    }

    #[tokio::test]
    async fn test_walk_is_complete() {
        let remote = remote();
        let tree = walk_remote(&remote, FolderId(1)).await.unwrap();
        assert_eq!(tree.rounds, 3);
        assert_eq!(tree.root.depth(), 3);
        assert_eq!(tree.root.node_count(), 8);

        // Children keep the order their parent listed them in.
        let Node::Folder(a) = &tree.root.children[1] else { panic!("expected folder A") };
        assert_eq!(a.descriptor.name, "A");
        assert_eq!(a.children.len(), 3);
        assert!(matches!(&a.children[0], Node::File(f) if f.id() == FileId(11)));
        let Node::Folder(b) = &a.children[1] else { panic!("expected folder B") };
        assert!(matches!(&b.children[..], [Node::File(f)] if f.id() == FileId(12)));
        // Empty folders are attached too.
        assert!(matches!(&tree.root.children[2], Node::Folder(d) if d.children.is_empty()));
    }

    #[tokio::test]
    async fn test_levels_are_resolved_in_order() {
        let remote = remote();
        walk_remote(&remote, FolderId(1)).await.unwrap();
        let events = remote.events();
        let position = |event: MockEvent| events.iter().position(|e| *e == event).unwrap();
        // Every level-one node before any level-two node, and so on.
        let level_one = [MockEvent::FileDescriptor(FileId(10)), MockEvent::FolderDescriptor(FolderId(2))];
        let level_two = [MockEvent::FileDescriptor(FileId(11)), MockEvent::FolderDescriptor(FolderId(3))];
        let last_one = level_one.into_iter().map(position).max().unwrap();
        let first_two = level_two.into_iter().map(position).min().unwrap();
        assert!(last_one < first_two);
        assert!(position(MockEvent::FolderDescriptor(FolderId(4))) < position(MockEvent::FileDescriptor(FileId(12))));
        // The widest level has three nodes.
        assert_eq!(remote.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn test_empty_root() {
        let remote = MockRemote::default().with_folder(folder(1, "Root"), Vec::new());
        let tree = walk_remote(&remote, FolderId(1)).await.unwrap();
        assert_eq!(tree.rounds, 0);
        assert_eq!(tree.root.node_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_fails_the_walk() {
        let remote = remote().fail(NodeRef::Folder(FolderId(3)));
        let err = walk_remote(&remote, FolderId(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Remote));
    }

    #[tokio::test]
    async fn test_root_must_be_a_folder() {
        let walked = walk(FolderId(1), |_| async { Ok(ResolvedNode::File(file(1))) }).await;
        assert!(matches!(&*walked.unwrap_err(), ErrorKind::NotAFolder(FolderId(1))));
    }
}
