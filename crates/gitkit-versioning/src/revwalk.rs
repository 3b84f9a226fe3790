// Gitkit - Git-compatible object store
// Copyright (C) 2025 Gitkit Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Commit history traversal
//!
//! A walker starts from pushed commits and yields every ancestor not
//! reachable from a hidden commit. Unsorted and time-sorted walks are lazy;
//! topological and reversed walks collect the whole history first.
//!
//! The walker only holds a weak handle on the object database: once the
//! owning repository is closed the next step yields `UseAfterDispose`.
//!
//! # Examples
//!
//! ```
//! use gitkit_storage::MockBackend;
//! use gitkit_versioning::{Commit, ObjectBody, ObjectDatabase, RevisionWalker, Signature, Sorting, Tree};
//! use std::sync::Arc;
//!
//! let odb = Arc::new(ObjectDatabase::new(Arc::new(MockBackend::new()), 100));
//! let tree = odb.write_object(&ObjectBody::Tree(Tree::new())).unwrap();
//! let sig = Signature::from_epoch("A U Thor", "author@example.com", 1_000_000_000, 0).unwrap();
//! let root = odb
//!     .write_object(&ObjectBody::Commit(Commit::new(tree, vec![], sig.clone(), sig, "root\n")))
//!     .unwrap();
//!
//! let mut walk = RevisionWalker::new(&odb);
//! walk.sorting(Sorting::TIME);
//! walk.push(root).unwrap();
//! let ids: Vec<_> = walk.collect::<Result<_, _>>().unwrap();
//! assert_eq!(ids, vec![root]);
//! ```

use crate::commit::Commit;
use crate::error::{GitError, GitResult};
use crate::object::ObjectBody;
use crate::odb::ObjectDatabase;
use crate::oid::Oid;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::ops::BitOr;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Order in which a walk yields commits
///
/// Flags combine with `|`: `Sorting::TOPOLOGICAL | Sorting::TIME` yields
/// children before parents, newest first among the ready ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sorting {
    /// Newest committer time first
    pub time: bool,
    /// Never a parent before one of its children
    pub topological: bool,
    /// Reverse whatever the other flags produce
    pub reverse: bool,
}

impl Sorting {
    /// Discovery order: pushed commits, then their parents breadth first
    pub const NONE: Sorting = Sorting {
        time: false,
        topological: false,
        reverse: false,
    };
    /// Committer time, newest first
    pub const TIME: Sorting = Sorting {
        time: true,
        topological: false,
        reverse: false,
    };
    /// Children before parents
    pub const TOPOLOGICAL: Sorting = Sorting {
        time: false,
        topological: true,
        reverse: false,
    };
    /// Reversed output
    pub const REVERSE: Sorting = Sorting {
        time: false,
        topological: false,
        reverse: true,
    };

    fn is_eager(&self) -> bool {
        self.topological || self.reverse
    }
}

impl BitOr for Sorting {
    type Output = Sorting;

    fn bitor(self, rhs: Sorting) -> Sorting {
        Sorting {
            time: self.time || rhs.time,
            topological: self.topological || rhs.topological,
            reverse: self.reverse || rhs.reverse,
        }
    }
}

/// Shared flag telling a walk to stop
///
/// Clones share the flag, so one can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder to stop
    pub fn cancel(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    /// True once `cancel` was called on any clone
    pub fn is_cancelled(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }
}

/// A commit waiting in the frontier
#[derive(Debug)]
struct Queued {
    key: i64,
    seq: u64,
    id: Oid,
    parents: Vec<Oid>,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: largest key first, then earliest queued.
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending commits, ordered by time or by discovery
struct Frontier {
    heap: BinaryHeap<Queued>,
    seen: HashSet<Oid>,
    by_time: bool,
    seq: u64,
}

impl Frontier {
    fn new(by_time: bool) -> Self {
        Frontier {
            heap: BinaryHeap::new(),
            seen: HashSet::new(),
            by_time,
            seq: 0,
        }
    }

    fn enqueue(&mut self, id: Oid, commit: &Commit) {
        if !self.seen.insert(id) {
            return;
        }
        let key = if self.by_time {
            commit.committer.seconds()
        } else {
            0
        };
        self.heap.push(Queued {
            key,
            seq: self.seq,
            id,
            parents: commit.parents.clone(),
        });
        self.seq += 1;
    }
}

enum WalkState {
    Pending,
    Lazy(Frontier),
    Buffered(std::vec::IntoIter<Oid>),
    Done,
}

/// Iterator over commit history
///
/// Yields `GitResult<Oid>`; after an error (including `Cancelled`) the walk
/// ends.
pub struct RevisionWalker {
    odb: Weak<ObjectDatabase>,
    pushed: Vec<Oid>,
    hidden: Vec<Oid>,
    sorting: Sorting,
    token: CancellationToken,
    excluded: HashSet<Oid>,
    state: WalkState,
}

impl RevisionWalker {
    /// Walker over `odb`, unsorted, with nothing pushed
    pub fn new(odb: &Arc<ObjectDatabase>) -> Self {
        RevisionWalker {
            odb: Arc::downgrade(odb),
            pushed: Vec::new(),
            hidden: Vec::new(),
            sorting: Sorting::NONE,
            token: CancellationToken::new(),
            excluded: HashSet::new(),
            state: WalkState::Pending,
        }
    }

    /// Attach a cancellation token, replacing the default one
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Token that stops this walk
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Change the output order; restarts the walk
    pub fn sorting(&mut self, sorting: Sorting) {
        self.sorting = sorting;
        self.state = WalkState::Pending;
    }

    /// Start from `id`; annotated tags are peeled to their commit
    ///
    /// Restarts the walk.
    pub fn push(&mut self, id: Oid) -> GitResult<()> {
        let commit_id = self.peel_to_commit(id)?;
        self.pushed.push(commit_id);
        self.state = WalkState::Pending;
        Ok(())
    }

    /// Exclude `id` and all its ancestors; restarts the walk
    pub fn hide(&mut self, id: Oid) -> GitResult<()> {
        let commit_id = self.peel_to_commit(id)?;
        self.hidden.push(commit_id);
        self.state = WalkState::Pending;
        Ok(())
    }

    /// Forget pushed and hidden commits, keeping sorting and token
    pub fn reset(&mut self) {
        self.pushed.clear();
        self.hidden.clear();
        self.excluded.clear();
        self.state = WalkState::Pending;
    }

    fn odb(&self) -> GitResult<Arc<ObjectDatabase>> {
        self.odb.upgrade().ok_or(GitError::UseAfterDispose)
    }

    fn peel_to_commit(&self, id: Oid) -> GitResult<Oid> {
        let odb = self.odb()?;
        let mut current = id;
        loop {
            match odb.read_object(&current)?.into_body() {
                ObjectBody::Commit(_) => return Ok(current),
                ObjectBody::Tag(tag) => current = tag.target,
                other => {
                    return Err(GitError::invalid_format(format!(
                        "{} is a {}, not a commit",
                        current,
                        other.kind()
                    )))
                }
            }
        }
    }

    fn check_cancelled(&self) -> GitResult<()> {
        if self.token.is_cancelled() {
            debug!("revision walk cancelled");
            Err(GitError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn start(&mut self, odb: &ObjectDatabase) -> GitResult<WalkState> {
        self.excluded = self.mark_hidden(odb)?;

        let mut frontier = Frontier::new(self.sorting.time);
        for id in &self.pushed {
            if !self.excluded.contains(id) {
                frontier.enqueue(*id, &load_commit(odb, id)?);
            }
        }
        debug!(
            pushed = self.pushed.len(),
            hidden = self.excluded.len(),
            sorting = ?self.sorting,
            "starting revision walk"
        );

        if !self.sorting.is_eager() {
            return Ok(WalkState::Lazy(frontier));
        }

        let mut order = Vec::new();
        while let Some(step) = self.step(odb, &mut frontier)? {
            order.push(step);
        }

        let mut ids: Vec<Oid> = if self.sorting.topological {
            topological_order(&order, self.sorting.time)
        } else {
            order.into_iter().map(|queued| queued.id).collect()
        };
        if self.sorting.reverse {
            ids.reverse();
        }
        Ok(WalkState::Buffered(ids.into_iter()))
    }

    /// Everything reachable from a hidden commit
    fn mark_hidden(&self, odb: &ObjectDatabase) -> GitResult<HashSet<Oid>> {
        let mut excluded = HashSet::new();
        let mut stack = self.hidden.clone();
        while let Some(id) = stack.pop() {
            if !excluded.insert(id) {
                continue;
            }
            self.check_cancelled()?;
            stack.extend(load_commit(odb, &id)?.parents);
        }
        Ok(excluded)
    }

    /// Pop the next commit and queue its parents
    fn step(&self, odb: &ObjectDatabase, frontier: &mut Frontier) -> GitResult<Option<Queued>> {
        self.check_cancelled()?;
        let Some(next) = frontier.heap.pop() else {
            return Ok(None);
        };
        for parent in &next.parents {
            if self.excluded.contains(parent) || frontier.seen.contains(parent) {
                continue;
            }
            let commit = load_commit(odb, parent)?;
            frontier.enqueue(*parent, &commit);
        }
        Ok(Some(next))
    }

    fn advance(&mut self) -> GitResult<Option<Oid>> {
        let odb = self.odb()?;
        self.check_cancelled()?;

        if matches!(self.state, WalkState::Pending) {
            self.state = self.start(&odb)?;
        }

        let mut state = std::mem::replace(&mut self.state, WalkState::Done);
        let result = match &mut state {
            WalkState::Lazy(frontier) => self.step(&odb, frontier).map(|s| s.map(|q| q.id)),
            WalkState::Buffered(ids) => Ok(ids.next()),
            WalkState::Pending | WalkState::Done => Ok(None),
        };
        self.state = state;
        result
    }
}

fn load_commit(odb: &ObjectDatabase, id: &Oid) -> GitResult<Commit> {
    let object = odb.read_object(id)?;
    let kind = object.kind();
    object
        .into_commit()
        .ok_or_else(|| GitError::invalid_format(format!("{} is a {}, not a commit", id, kind)))
}

/// Kahn's algorithm over the walked commits: a commit becomes ready once
/// every walked child has been emitted
fn topological_order(order: &[Queued], by_time: bool) -> Vec<Oid> {
    let position: HashMap<Oid, usize> = order
        .iter()
        .enumerate()
        .map(|(i, queued)| (queued.id, i))
        .collect();

    let mut pending_children = vec![0usize; order.len()];
    for queued in order {
        for parent in &queued.parents {
            if let Some(&p) = position.get(parent) {
                pending_children[p] += 1;
            }
        }
    }

    let ready_entry = |i: usize| {
        let queued = &order[i];
        Queued {
            key: if by_time { queued.key } else { 0 },
            seq: i as u64,
            id: queued.id,
            parents: Vec::new(),
        }
    };

    let mut ready: BinaryHeap<Queued> = pending_children
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(i, _)| ready_entry(i))
        .collect();

    let mut out = Vec::with_capacity(order.len());
    while let Some(next) = ready.pop() {
        let i = next.seq as usize;
        out.push(next.id);
        for parent in &order[i].parents {
            if let Some(&p) = position.get(parent) {
                pending_children[p] -= 1;
                if pending_children[p] == 0 {
                    ready.push(ready_entry(p));
                }
            }
        }
    }
    out
}

impl Iterator for RevisionWalker {
    type Item = GitResult<Oid>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, WalkState::Done) {
            return None;
        }
        match self.advance() {
            Ok(Some(id)) => Some(Ok(id)),
            Ok(None) => {
                self.state = WalkState::Done;
                None
            }
            Err(e) => {
                self.state = WalkState::Done;
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for RevisionWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionWalker")
            .field("pushed", &self.pushed)
            .field("hidden", &self.hidden)
            .field("sorting", &self.sorting)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::signature::Signature;
    use crate::tree::Tree;
    use gitkit_storage::MockBackend;

    struct Graph {
        odb: Arc<ObjectDatabase>,
        tree: Oid,
    }

    impl Graph {
        fn new() -> Self {
            let odb = Arc::new(ObjectDatabase::new(Arc::new(MockBackend::new()), 100));
            let tree = odb.write_object(&ObjectBody::Tree(Tree::new())).unwrap();
            Graph { odb, tree }
        }

        fn commit(&self, message: &str, time: i64, parents: &[Oid]) -> Oid {
            let sig = Signature::from_epoch("A U Thor", "author@example.com", time, 0).unwrap();
            let commit = Commit::new(self.tree, parents.to_vec(), sig.clone(), sig, message);
            self.odb.write_object(&ObjectBody::Commit(commit)).unwrap()
        }

        fn walk(&self, sorting: Sorting, push: &[Oid], hide: &[Oid]) -> Vec<Oid> {
            let mut walk = RevisionWalker::new(&self.odb);
            walk.sorting(sorting);
            for id in push {
                walk.push(*id).unwrap();
            }
            for id in hide {
                walk.hide(*id).unwrap();
            }
            walk.collect::<GitResult<Vec<_>>>().unwrap()
        }
    }

    /// root <- a <- b <- merge, root <- side <- merge; side is the oldest
    /// after root so time and topological orders differ
    fn diamond(g: &Graph) -> [Oid; 5] {
        let root = g.commit("root\n", 100, &[]);
        let side = g.commit("side\n", 150, &[root]);
        let a = g.commit("a\n", 200, &[root]);
        let b = g.commit("b\n", 300, &[a]);
        let merge = g.commit("merge\n", 400, &[b, side]);
        [root, side, a, b, merge]
    }

    #[test]
    fn test_time_order() {
        let g = Graph::new();
        let [root, side, a, b, merge] = diamond(&g);
        assert_eq!(
            g.walk(Sorting::TIME, &[merge], &[]),
            vec![merge, b, a, side, root]
        );
    }

    #[test]
    fn test_topological_order_keeps_children_first() {
        let g = Graph::new();
        let [root, side, a, b, merge] = diamond(&g);
        // A parent whose child has a clock skewed into the past still
        // comes after that child.
        let skewed = g.commit("skewed\n", 50, &[merge]);
        let ids = g.walk(Sorting::TOPOLOGICAL | Sorting::TIME, &[skewed], &[]);
        assert_eq!(ids, vec![skewed, merge, b, a, side, root]);

        let time_only = g.walk(Sorting::TIME, &[skewed], &[]);
        assert_eq!(time_only[0], skewed);
        let pos = |ids: &[Oid], id: Oid| ids.iter().position(|x| *x == id).unwrap();
        let topo = g.walk(Sorting::TOPOLOGICAL, &[merge], &[]);
        assert!(pos(&topo, merge) < pos(&topo, b));
        assert!(pos(&topo, b) < pos(&topo, a));
        assert!(pos(&topo, side) < pos(&topo, root));
        assert!(pos(&topo, a) < pos(&topo, root));
    }

    #[test]
    fn test_reverse() {
        let g = Graph::new();
        let [root, side, a, b, merge] = diamond(&g);
        assert_eq!(
            g.walk(Sorting::TIME | Sorting::REVERSE, &[merge], &[]),
            vec![root, side, a, b, merge]
        );
    }

    #[test]
    fn test_hide_excludes_ancestors() {
        let g = Graph::new();
        let [_root, side, _a, b, merge] = diamond(&g);
        assert_eq!(g.walk(Sorting::TIME, &[merge], &[b]), vec![merge, side]);
        assert!(g.walk(Sorting::TIME, &[b], &[merge]).is_empty());
    }

    #[test]
    fn test_unsorted_visits_each_commit_once() {
        let g = Graph::new();
        let ids = diamond(&g);
        let walked = g.walk(Sorting::NONE, &[ids[4], ids[3]], &[]);
        assert_eq!(walked.len(), 5);
        assert_eq!(walked[0], ids[4]);
        let unique: HashSet<_> = walked.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_cancellation_stops_walk() {
        let g = Graph::new();
        let [_, _, _, _, merge] = diamond(&g);
        let token = CancellationToken::new();
        let mut walk = RevisionWalker::new(&g.odb).with_cancellation(token.clone());
        walk.sorting(Sorting::TIME);
        walk.push(merge).unwrap();

        assert_eq!(walk.next().unwrap().unwrap(), merge);
        token.cancel();
        assert!(matches!(walk.next(), Some(Err(GitError::Cancelled))));
        assert!(walk.next().is_none());
    }

    #[test]
    fn test_dropped_database() {
        let g = Graph::new();
        let root = g.commit("root\n", 100, &[]);
        let mut walk = RevisionWalker::new(&g.odb);
        walk.push(root).unwrap();
        drop(g);
        assert!(matches!(walk.next(), Some(Err(GitError::UseAfterDispose))));
        assert!(walk.next().is_none());
    }

    #[test]
    fn test_push_non_commit_fails() {
        let g = Graph::new();
        let mut walk = RevisionWalker::new(&g.odb);
        assert!(matches!(
            walk.push(g.tree),
            Err(GitError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_reset() {
        let g = Graph::new();
        let [root, _, a, _, _] = diamond(&g);
        let mut walk = RevisionWalker::new(&g.odb);
        walk.push(a).unwrap();
        assert_eq!(walk.by_ref().count(), 2);
        walk.reset();
        walk.push(root).unwrap();
        let ids: Vec<_> = walk.map(|r| r.unwrap()).collect();
        assert_eq!(ids, vec![root]);
    }
}
