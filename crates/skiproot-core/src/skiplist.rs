//! The authenticated skip list.
//!
//! ```text
//! Level 2: H2 --------------------> 1501 -----------------> .
//! Level 1: H1 --------------------> 1501 ------> 1999 ----> .
//! Level 0: H0 ------> 1001 -------> 1501 ------> 1999 ----> 2500 -> .
//! ```
//!
//! Every cell carries a rank (base elements spanned by its `right` edge; for
//! heads, the sum of their level's real ranks) and a label
//! `sha256(encode(level) || encode(rank) || encode(slot) || encode(right.label))`,
//! where `slot` is the leaf commitment at level 0 and the down child's label
//! above it. The top head's label is the root.

use log::{debug, trace};
use serde::Serialize;
use skiproot_canonical::{hash_value, sha256, Canonical, Digest};

use crate::config::{RecomputeStrategy, SkipListConfig};
use crate::errors::CoreError;
use crate::height::{CoinFlips, HeightSampler};
use crate::node::{Node, NodeId};
use crate::proof::node_preimage;

/// Work counters, exposed for benchmarking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Successful insertions.
    pub insertions: u64,
    /// Rank/label refresh passes (full or incremental).
    pub recomputes: u64,
    /// Labels computed.
    pub nodes_hashed: u64,
    /// Preimage bytes fed to the hash.
    pub bytes_hashed: u64,
}

/// Skip list whose root digest commits to every key, rank and link.
///
/// Not internally synchronized: mutation takes `&mut self`, so concurrent
/// writers must be serialized by the owner.
pub struct AuthSkipList<K> {
    config: SkipListConfig,
    nodes: Vec<Node<K>>,
    /// Sentinel head per level, index = level.
    heads: Vec<NodeId>,
    /// Per level, base elements that precede its first real node.
    leads: Vec<u64>,
    len: u64,
    sampler: Box<dyn HeightSampler + Send>,
    counters: Counters,
}

impl<K: Ord + Clone + Canonical> AuthSkipList<K> {
    /// Empty list with `max_level + 1` levels and an entropy-seeded coin.
    pub fn new(max_level: usize) -> Self {
        Self::with_config(SkipListConfig::with_max_level(max_level))
    }

    /// Empty list with the given options and an entropy-seeded coin.
    pub fn with_config(config: SkipListConfig) -> Self {
        Self::with_sampler(config, CoinFlips::from_entropy())
    }

    /// Empty list drawing tower heights from `sampler`.
    pub fn with_sampler(
        config: SkipListConfig,
        sampler: impl HeightSampler + Send + 'static,
    ) -> Self {
        let levels = config.max_level + 1;
        let mut nodes = Vec::with_capacity(levels);
        let mut heads = Vec::with_capacity(levels);
        for level in 0..levels {
            let mut head = Node::head(level);
            if level > 0 {
                head.down = Some(heads[level - 1]);
            }
            heads.push(NodeId(nodes.len()));
            nodes.push(head);
        }

        Self {
            config,
            nodes,
            heads,
            leads: vec![0; levels],
            len: 0,
            sampler: Box::new(sampler),
            counters: Counters::default(),
        }
    }

    /// Highest level index.
    pub fn max_level(&self) -> usize {
        self.config.max_level
    }

    /// Construction options.
    pub fn config(&self) -> &SkipListConfig {
        &self.config
    }

    /// Number of inserted keys.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Work counters accumulated so far.
    pub fn stats(&self) -> Counters {
        self.counters
    }

    /// Sentinel head of `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level > max_level`.
    pub fn head(&self, level: usize) -> NodeId {
        self.heads[level]
    }

    /// Top sentinel, the entry point of every descent.
    pub fn top(&self) -> NodeId {
        self.heads[self.config.max_level]
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> &Node<K> {
        &self.nodes[id.0]
    }

    /// Total cells, heads included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Cells of `level` from its head rightward.
    pub fn level_nodes(&self, level: usize) -> LevelIter<'_, K> {
        LevelIter {
            nodes: &self.nodes,
            next: Some(self.heads[level]),
        }
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.level_nodes(0).filter_map(|(_, node)| node.key())
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        let update = self.descend_to(key);
        self.nodes[update[0].0]
            .right
            .and_then(|next| self.nodes[next.0].key.as_ref())
            .is_some_and(|k| k == key)
    }

    /// Root digest: the top head's label.
    pub fn get_root(&self) -> Result<Digest, CoreError> {
        if self.len == 0 {
            return Err(CoreError::UninitializedRoot);
        }
        self.nodes[self.top().0]
            .label
            .ok_or(CoreError::UninitializedRoot)
    }

    /// Inserts `key` with a tower height drawn from the sampler.
    pub fn insert(&mut self, key: K) -> Result<(), CoreError> {
        let update = self.locate(&key)?;
        let height = self
            .sampler
            .sample(self.config.max_level)
            .min(self.config.max_level);
        self.splice(key, height, update);
        Ok(())
    }

    /// Inserts `key` with an explicit tower height (levels `0..=height`).
    pub fn insert_with_height(&mut self, key: K, height: usize) -> Result<(), CoreError> {
        if height > self.config.max_level {
            return Err(CoreError::InvalidHeight {
                height,
                max_level: self.config.max_level,
            });
        }
        let update = self.locate(&key)?;
        self.splice(key, height, update);
        Ok(())
    }

    /// Rightmost node with key < `key` on every level, indexed by level.
    fn descend_to(&self, key: &K) -> Vec<NodeId> {
        let mut update = self.heads.clone();
        let mut cur = self.top();
        for level in (0..=self.config.max_level).rev() {
            while let Some(next) = self.nodes[cur.0].right {
                match self.nodes[next.0].key.as_ref() {
                    Some(k) if k < key => cur = next,
                    _ => break,
                }
            }
            update[level] = cur;
            if let Some(down) = self.nodes[cur.0].down {
                cur = down;
            }
        }
        update
    }

    fn locate(&self, key: &K) -> Result<Vec<NodeId>, CoreError> {
        let update = self.descend_to(key);
        let successor = self.nodes[update[0].0]
            .right
            .and_then(|next| self.nodes[next.0].key.as_ref());
        if successor == Some(key) {
            return Err(CoreError::DuplicateKey);
        }
        Ok(update)
    }

    fn splice(&mut self, key: K, height: usize, update: Vec<NodeId>) {
        let mut tower = Vec::with_capacity(height + 1);
        let mut below = None;
        for (level, &prev) in update.iter().enumerate().take(height + 1) {
            let id = NodeId(self.nodes.len());
            let mut node = Node::new(level, Some(key.clone()));
            if level == 0 {
                node.leaf = Some(hash_value(&key));
            }
            node.down = below;
            node.right = self.nodes[prev.0].right;
            self.nodes.push(node);
            self.nodes[prev.0].right = Some(id);
            below = Some(id);
            tower.push(id);
        }

        self.len += 1;
        self.counters.insertions += 1;
        debug!("inserted tower of height {} ({} elements)", height, self.len);

        match self.config.recompute {
            RecomputeStrategy::Full => self.recompute(),
            RecomputeStrategy::Incremental => self.patch(&update, &tower),
        }
    }

    /// Recomputes every rank and label from scratch.
    ///
    /// Idempotent: running it again leaves the root unchanged.
    pub fn recompute(&mut self) {
        if self.len == 0 {
            return;
        }
        for node in &mut self.nodes {
            node.clear_commitments();
        }

        let n = self.len;
        let base: Vec<NodeId> = self.real_ids(0);
        for id in &base {
            self.nodes[id.0].rank = 1;
        }
        self.leads[0] = n - base.len() as u64;
        self.nodes[self.heads[0].0].rank = base.len() as u64;

        for level in 1..=self.config.max_level {
            let mut covered = 0;
            for id in self.real_ids(level) {
                let rank = self.span_below(id);
                self.nodes[id.0].rank = rank;
                covered += rank;
            }
            self.leads[level] = n - covered;
            self.nodes[self.heads[level].0].rank = covered;
        }

        let mut hashed = 0;
        for level in 0..=self.config.max_level {
            let ids: Vec<NodeId> = self.level_nodes(level).map(|(id, _)| id).collect();
            for &id in ids.iter().rev() {
                self.relabel(id);
            }
            hashed += ids.len();
        }

        self.counters.recomputes += 1;
        trace!(
            "full recompute: {} labels over {} levels",
            hashed,
            self.config.max_level + 1
        );
    }

    /// Refreshes ranks and labels after splicing `tower` behind `update`.
    fn patch(&mut self, update: &[NodeId], tower: &[NodeId]) {
        let n = self.len;
        let mut hashed = 0;
        for level in 0..=self.config.max_level {
            let head = self.heads[level];
            let prev = update[level];

            let last = match tower.get(level) {
                Some(&new) => {
                    let rank = if level == 0 { 1 } else { self.span_below(new) };
                    self.nodes[new.0].rank = rank;
                    // The predecessor gained the new element and handed
                    // `rank` of its span over to the new cell.
                    if prev == head {
                        self.leads[level] = self.leads[level] + 1 - rank;
                    } else {
                        self.nodes[prev.0].rank = self.nodes[prev.0].rank + 1 - rank;
                    }
                    new
                }
                None => {
                    if prev == head {
                        self.leads[level] += 1;
                    } else {
                        self.nodes[prev.0].rank += 1;
                    }
                    prev
                }
            };
            self.nodes[head.0].rank = n - self.leads[level];

            // Labels chain leftward through `right`, so the whole prefix up to
            // the last touched cell changes; everything after it does not.
            let mut prefix = Vec::new();
            for (id, _) in self.level_nodes(level) {
                prefix.push(id);
                if id == last {
                    break;
                }
            }
            for &id in prefix.iter().rev() {
                self.relabel(id);
            }
            hashed += prefix.len();
        }

        self.counters.recomputes += 1;
        trace!("incremental recompute: {} labels", hashed);
    }

    /// Sum of ranks one level down from `id.down` up to, not including,
    /// the down cell of `id`'s right neighbor.
    fn span_below(&self, id: NodeId) -> u64 {
        let node = &self.nodes[id.0];
        let bound = node.right.and_then(|r| self.nodes[r.0].down);
        let mut sum = 0;
        let mut cur = node.down;
        while let Some(d) = cur {
            if Some(d) == bound {
                break;
            }
            sum += self.nodes[d.0].rank;
            cur = self.nodes[d.0].right;
        }
        sum
    }

    fn relabel(&mut self, id: NodeId) {
        let node = &self.nodes[id.0];
        let slot = if node.level == 0 {
            node.leaf
        } else {
            node.down.and_then(|d| self.nodes[d.0].label)
        };
        let right = node.right.and_then(|r| self.nodes[r.0].label);
        let raw = node_preimage(node.level, node.rank, slot.as_ref(), right.as_ref());
        let label = sha256(&raw);

        self.counters.nodes_hashed += 1;
        self.counters.bytes_hashed += raw.len() as u64;
        let node = &mut self.nodes[id.0];
        node.label = Some(label);
        node.raw = raw;
    }

    fn real_ids(&self, level: usize) -> Vec<NodeId> {
        self.level_nodes(level)
            .filter(|(_, node)| !node.is_head())
            .map(|(id, _)| id)
            .collect()
    }

    /// Base elements before the first real cell of `level`.
    pub(crate) fn lead(&self, level: usize) -> u64 {
        self.leads[level]
    }

    /// Checks ordering, tower, rank and label invariants.
    pub fn check_invariants(&self) -> Result<(), CoreError> {
        let n = self.len;
        let mut base = 0u64;

        for level in 0..=self.config.max_level {
            let mut prev_key: Option<&K> = None;
            let mut covered = 0u64;

            for (pos, (id, node)) in self.level_nodes(level).enumerate() {
                if node.level != level {
                    return Err(CoreError::Invariant(format!(
                        "node {} linked on level {} but labelled level {}",
                        id.0, level, node.level
                    )));
                }
                if (pos == 0) != node.is_head() {
                    return Err(CoreError::Invariant(format!(
                        "head misplaced on level {}",
                        level
                    )));
                }

                if let Some(key) = node.key() {
                    if prev_key.is_some_and(|p| p >= key) {
                        return Err(CoreError::Invariant(format!(
                            "keys not strictly increasing on level {}",
                            level
                        )));
                    }
                    prev_key = Some(key);
                    covered += node.rank;

                    if level == 0 {
                        base += 1;
                        if node.down.is_some() {
                            return Err(CoreError::Invariant("base cell has a down link".into()));
                        }
                        if node.leaf != Some(hash_value(key)) {
                            return Err(CoreError::Invariant(
                                "leaf commitment does not match key".into(),
                            ));
                        }
                    } else {
                        let below = node.down.map(|d| &self.nodes[d.0]);
                        match below {
                            Some(b) if b.level + 1 == level && b.key() == Some(key) => {}
                            _ => {
                                return Err(CoreError::Invariant(format!(
                                    "tower broken at level {}",
                                    level
                                )))
                            }
                        }
                    }
                }

                if n > 0 {
                    match node.label {
                        Some(label) if sha256(&node.raw) == label => {}
                        _ => {
                            return Err(CoreError::Invariant(format!(
                                "label of node {} does not replay",
                                id.0
                            )))
                        }
                    }
                }
            }

            if n > 0 {
                let head_rank = self.nodes[self.heads[level].0].rank;
                if head_rank != covered || (level == 0 && head_rank != n) {
                    return Err(CoreError::Invariant(format!(
                        "head rank {} on level {} does not match its {} spanned elements",
                        head_rank, level, covered
                    )));
                }
                if covered + self.leads[level] != n {
                    return Err(CoreError::Invariant(format!(
                        "ranks on level {} cover {} of {} elements",
                        level,
                        covered + self.leads[level],
                        n
                    )));
                }
            }
        }

        if base != n {
            return Err(CoreError::Invariant(format!(
                "{} base cells for {} elements",
                base, n
            )));
        }
        Ok(())
    }
}

/// Iterator over one level, head first.
pub struct LevelIter<'a, K> {
    nodes: &'a [Node<K>],
    next: Option<NodeId>,
}

impl<'a, K> Iterator for LevelIter<'a, K> {
    type Item = (NodeId, &'a Node<K>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = &self.nodes[id.0];
        self.next = node.right;
        Some((id, node))
    }
}
