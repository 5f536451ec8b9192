//! Leader/follower clustering.
//!
//! A random subset of `round(sqrt(N))` documents becomes the leaders. Every
//! other document joins the most similar leader whose cluster still has room,
//! with clusters capped at `round(sqrt(N)) + 1` members.

use crate::config::OverflowPolicy;
use crate::vector::DocumentVector;
use crate::{DocId, Error, Result};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterParams {
    pub leader_count: usize,
    pub max_cluster_size: usize,
}

impl ClusterParams {
    /// Parameters derived from the corpus size.
    pub fn for_corpus(num_docs: usize) -> Self {
        let root = (num_docs as f64).sqrt().round() as usize;
        Self { leader_count: root, max_cluster_size: root + 1 }
    }
}

/// Draw `count` distinct ids uniformly at random, returned in ascending order.
pub fn select_leaders<R: Rng + ?Sized>(ids: &[DocId], count: usize, rng: &mut R) -> Vec<DocId> {
    let count = count.min(ids.len());
    let mut leaders: Vec<DocId> = rand::seq::index::sample(rng, ids.len(), count)
        .into_iter()
        .map(|i| ids[i])
        .collect();
    leaders.sort_unstable();
    leaders
}

/// Clusters keyed by leader id. Each member set includes its leader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clusters {
    members: BTreeMap<DocId, BTreeSet<DocId>>,
    unassigned: Vec<DocId>,
    max_cluster_size: usize,
}

impl Clusters {
    /// Leader ids in ascending order.
    pub fn leaders(&self) -> impl Iterator<Item = DocId> + '_ { self.members.keys().copied() }

    pub fn members(&self, leader: DocId) -> Option<&BTreeSet<DocId>> { self.members.get(&leader) }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &BTreeSet<DocId>)> {
        self.members.iter().map(|(&l, m)| (l, m))
    }

    /// Followers that could not be placed because every candidate cluster was full.
    pub fn unassigned(&self) -> &[DocId] { &self.unassigned }

    pub fn max_cluster_size(&self) -> usize { self.max_cluster_size }

    pub fn len(&self) -> usize { self.members.len() }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }

    /// Leader of the cluster containing `doc`, if any.
    pub fn leader_of(&self, doc: DocId) -> Option<DocId> {
        self.members.iter().find(|(_, m)| m.contains(&doc)).map(|(&l, _)| l)
    }
}

/// Descending score, ties broken by ascending id.
pub(crate) fn by_score_desc(a: &(f64, DocId), b: &(f64, DocId)) -> std::cmp::Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

pub struct ClusterBuilder<'a> {
    vectors: &'a HashMap<DocId, DocumentVector>,
    params: ClusterParams,
    overflow: OverflowPolicy,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(vectors: &'a HashMap<DocId, DocumentVector>, params: ClusterParams) -> Self {
        Self { vectors, params, overflow: OverflowPolicy::default() }
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn params(&self) -> ClusterParams { self.params }

    /// Pick leaders from `ids` with `rng`, then assign the followers.
    pub fn build<R: Rng + ?Sized>(&self, ids: &[DocId], rng: &mut R) -> Result<Clusters> {
        if ids.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let leaders = select_leaders(ids, self.params.leader_count.max(1), rng);
        self.build_with_leaders(ids, &leaders)
    }

    /// Assign every id in `ids` that is not a leader. Leaders must be distinct
    /// members of `ids`.
    pub fn build_with_leaders(&self, ids: &[DocId], leaders: &[DocId]) -> Result<Clusters> {
        if ids.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let known: BTreeSet<DocId> = ids.iter().copied().collect();
        let mut members: BTreeMap<DocId, BTreeSet<DocId>> = BTreeMap::new();
        for &leader in leaders {
            if !known.contains(&leader) {
                return Err(Error::UnknownDocument(leader));
            }
            members.insert(leader, BTreeSet::from([leader]));
        }
        if members.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let empty = DocumentVector::default();
        let vector = |id: DocId| self.vectors.get(&id).unwrap_or(&empty);
        let followers: Vec<DocId> = known.iter().copied().filter(|id| !members.contains_key(id)).collect();
        let mut unassigned = Vec::new();

        for follower in followers {
            let fv = vector(follower);
            let mut ranked: Vec<(f64, DocId)> = members.keys().map(|&l| (fv.cosine(vector(l)), l)).collect();
            ranked.sort_by(by_score_desc);

            let open = ranked
                .iter()
                .map(|&(_, l)| l)
                .find(|l| members[l].len() < self.params.max_cluster_size);
            let target = match (open, self.overflow) {
                (Some(leader), _) => Some(leader),
                (None, OverflowPolicy::ForceBest) => ranked.first().map(|&(_, l)| l),
                (None, OverflowPolicy::Drop) => None,
            };
            match target.and_then(|l| members.get_mut(&l)) {
                Some(cluster) => {
                    cluster.insert(follower);
                }
                None => {
                    tracing::warn!(doc_id = follower, "all candidate clusters are full, follower left unassigned");
                    unassigned.push(follower);
                }
            }
        }

        Ok(Clusters { members, unassigned, max_cluster_size: self.params.max_cluster_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FrequencyIndex;
    use crate::tokenizer::tokenize;
    use crate::vector::vectorize;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus(texts: &[&str]) -> (Vec<DocId>, HashMap<DocId, DocumentVector>) {
        let mut idx = FrequencyIndex::new();
        for (i, t) in texts.iter().enumerate() {
            idx.record_all(tokenize(t), i as DocId);
        }
        let ids: Vec<DocId> = (0..texts.len() as DocId).collect();
        let vectors = vectorize(idx.table(), &ids);
        (ids, vectors)
    }

    fn assert_partition(ids: &[DocId], clusters: &Clusters) {
        let mut seen: Vec<DocId> = clusters.iter().flat_map(|(_, m)| m.iter().copied()).collect();
        seen.extend_from_slice(clusters.unassigned());
        seen.sort_unstable();
        assert_eq!(seen, ids);
    }

    #[test]
    fn params_follow_corpus_size() {
        assert_eq!(ClusterParams::for_corpus(1), ClusterParams { leader_count: 1, max_cluster_size: 2 });
        assert_eq!(ClusterParams::for_corpus(4), ClusterParams { leader_count: 2, max_cluster_size: 3 });
        assert_eq!(ClusterParams::for_corpus(7), ClusterParams { leader_count: 3, max_cluster_size: 4 });
        assert_eq!(ClusterParams::for_corpus(100), ClusterParams { leader_count: 10, max_cluster_size: 11 });
    }

    #[test]
    fn seeded_selection_is_reproducible_and_distinct() {
        let ids: Vec<DocId> = (0..50).collect();
        let a = select_leaders(&ids, 7, &mut StdRng::seed_from_u64(11));
        let b = select_leaders(&ids, 7, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        let unique: BTreeSet<DocId> = a.iter().copied().collect();
        assert_eq!(unique.len(), 7);
        assert!(a.iter().all(|id| ids.contains(id)));
    }

    #[test]
    fn followers_join_most_similar_leader() {
        let (ids, vectors) = corpus(&["red green blue", "red green blue", "cat dog", "cat dog"]);
        let clusters = ClusterBuilder::new(&vectors, ClusterParams::for_corpus(ids.len()))
            .build_with_leaders(&ids, &[0, 3])
            .unwrap();
        assert_eq!(clusters.members(0).unwrap(), &BTreeSet::from([0, 1]));
        assert_eq!(clusters.members(3).unwrap(), &BTreeSet::from([2, 3]));
        assert!(clusters.unassigned().is_empty());
    }

    #[test]
    fn tied_leaders_resolve_to_lower_id() {
        let (ids, vectors) = corpus(&["apple", "apple", "apple", "zebra"]);
        let params = ClusterParams { leader_count: 2, max_cluster_size: 3 };
        let clusters = ClusterBuilder::new(&vectors, params).build_with_leaders(&ids, &[0, 1]).unwrap();
        assert!(clusters.members(0).unwrap().contains(&2));
        // zero similarity to both leaders is still a tie
        assert!(clusters.members(0).unwrap().contains(&3));
        assert_eq!(clusters.members(1).unwrap(), &BTreeSet::from([1]));
    }

    #[test]
    fn full_cluster_spills_to_next_best_leader() {
        let (ids, vectors) = corpus(&["sun moon", "sun moon", "sun moon", "star", "sun moon"]);
        let params = ClusterParams { leader_count: 2, max_cluster_size: 3 };
        let clusters = ClusterBuilder::new(&vectors, params).build_with_leaders(&ids, &[0, 3]).unwrap();
        assert_eq!(clusters.members(0).unwrap(), &BTreeSet::from([0, 1, 2]));
        assert_eq!(clusters.members(3).unwrap(), &BTreeSet::from([3, 4]));
    }

    #[test]
    fn drop_policy_records_unassigned_followers() {
        let (ids, vectors) = corpus(&["a", "b", "c", "d", "e"]);
        let params = ClusterParams { leader_count: 1, max_cluster_size: 3 };
        let clusters = ClusterBuilder::new(&vectors, params).build_with_leaders(&ids, &[0]).unwrap();
        assert_eq!(clusters.members(0).unwrap(), &BTreeSet::from([0, 1, 2]));
        assert_eq!(clusters.unassigned(), &[3, 4]);
        assert_partition(&ids, &clusters);
    }

    #[test]
    fn force_best_policy_ignores_the_cap() {
        let (ids, vectors) = corpus(&["a", "b", "c", "d", "e"]);
        let params = ClusterParams { leader_count: 1, max_cluster_size: 3 };
        let clusters = ClusterBuilder::new(&vectors, params)
            .overflow(OverflowPolicy::ForceBest)
            .build_with_leaders(&ids, &[0])
            .unwrap();
        assert_eq!(clusters.members(0).unwrap().len(), 5);
        assert!(clusters.unassigned().is_empty());
    }

    #[test]
    fn derived_params_never_leave_followers_unassigned() {
        let texts: Vec<String> = (0..40).map(|i| format!("word{} shared", "x".repeat(i % 7))).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let (ids, vectors) = corpus(&refs);
        let params = ClusterParams::for_corpus(ids.len());
        for seed in 0..10 {
            let clusters = ClusterBuilder::new(&vectors, params)
                .build(&ids, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            assert_eq!(clusters.len(), params.leader_count);
            assert!(clusters.unassigned().is_empty());
            for (leader, members) in clusters.iter() {
                assert!(members.contains(&leader));
                assert!(members.len() <= params.max_cluster_size);
            }
            assert_partition(&ids, &clusters);
        }
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let vectors = HashMap::new();
        let err = ClusterBuilder::new(&vectors, ClusterParams::for_corpus(0))
            .build(&[], &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus));
    }

    #[test]
    fn unknown_leader_is_rejected() {
        let (ids, vectors) = corpus(&["a", "b"]);
        let err = ClusterBuilder::new(&vectors, ClusterParams::for_corpus(2))
            .build_with_leaders(&ids, &[9])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownDocument(9)));
    }
}
