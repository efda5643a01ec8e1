//! The shared unique table: a dense node array plus a reverse index,
//! so every distinct function owns exactly one node.
use fxhash::FxHashMap;
use crate::err::{DdError, Result};
use crate::nid::{Nid, MAX_IDX, I};
use crate::node::NodeKind;

/// Hash-consed node store. Index 0 permanently holds the terminal; every
/// other index is handed out by `get_or_insert`. The reverse index maps a
/// full node tuple back to its index, which is what makes construction
/// canonical: reduction, complement normalisation and chain merging all
/// happen here, before the lookup.
#[derive(Debug)]
pub struct NodePool<K: NodeKind> {
  pub(crate) nodes: Vec<K>,
  pub(crate) index: FxHashMap<K, u32> }

impl<K: NodeKind> NodePool<K> {

  pub fn with_capacity(cap: usize) -> Self {
    let mut nodes = Vec::with_capacity(cap.max(1));
    nodes.push(K::build(K::TOP_VAR, 0, I, I)); // the terminal
    NodePool { nodes, index: FxHashMap::default() }}

  /// number of nodes in the pool, terminal included.
  #[inline] pub fn len(&self) -> usize { self.nodes.len() }
  pub fn is_empty(&self) -> bool { false } // the terminal is always there

  /// branch rank of the node behind `n`. the terminal reports the
  /// sentinel rank, which sorts below every real rank.
  #[inline] pub fn var_of(&self, n: Nid) -> u32 { self.nodes[n.idx()].var() }

  /// decode `(var, skip, lo, hi)` with the edge's polarity pushed onto the
  /// children, so callers never see an inverted view of the node itself.
  #[inline] pub fn fetch(&self, n: Nid) -> (u32, u32, Nid, Nid) {
    let k = &self.nodes[n.idx()];
    if n.is_inv() { (k.var(), k.skip(), !k.lo(), !k.hi()) }
    else { (k.var(), k.skip(), k.lo(), k.hi()) }}

  /// canonical node construction.
  ///
  /// * `lo == hi` reduces to the child.
  /// * an inverted `hi` edge is normalised away by inverting both children
  ///   and returning an inverted edge, so a stored `hi` never carries the
  ///   complement flag.
  /// * for chain encodings, a `lo` child that is itself a run on
  ///   `var+skip+1` with the same `hi` (seen through matching polarity) is
  ///   absorbed, keeping every stored run maximal.
  pub fn get_or_insert(&mut self, var: u32, skip: u32, lo: Nid, hi: Nid) -> Result<Nid> {
    debug_assert!(var + skip <= K::MAX_VAR);
    debug_assert!(self.var_of(lo) > var + skip && self.var_of(hi) > var + skip,
                  "children must branch strictly below the run");
    if lo == hi { return Ok(lo) }
    let inv = hi.is_inv();
    let (mut lo, hi) = if inv { (!lo, !hi) } else { (lo, hi) };
    let mut skip = skip;
    if K::CHAINED && !lo.is_const() {
      let lk = self.nodes[lo.idx()];
      let (clo, chi) = if lo.is_inv() { (!lk.lo(), !lk.hi()) } else { (lk.lo(), lk.hi()) };
      if lk.var() == var + skip + 1 && chi == hi {
        // stored runs are maximal, so one absorption step suffices
        skip += lk.skip() + 1;
        lo = clo }}
    let key = K::build(var, skip, lo, hi);
    let ix = if let Some(&ix) = self.index.get(&key) { ix }
      else {
        if self.nodes.len() > MAX_IDX {
          return Err(DdError::CapacityExhausted("node index space")) }
        let ix = self.nodes.len() as u32;
        self.nodes.push(key);
        self.index.insert(key, ix);
        ix };
    Ok(Nid::from_idx(ix as usize).inv_if(inv)) }}


#[cfg(test)] mod test {
  use super::*;
  use crate::nid::O;
  use crate::node::{BddNode, CbddNode};

  #[test] fn test_hash_consing() {
    let mut p: NodePool<BddNode> = NodePool::with_capacity(8);
    let a = p.get_or_insert(0, 0, O, I).unwrap();
    let b = p.get_or_insert(0, 0, O, I).unwrap();
    assert_eq!(a, b, "same tuple, same nid");
    assert_eq!(p.len(), 2) }

  #[test] fn test_reduction() {
    let mut p: NodePool<BddNode> = NodePool::with_capacity(8);
    assert_eq!(p.get_or_insert(3, 0, I, I).unwrap(), I);
    assert_eq!(p.len(), 1, "a redundant test allocates nothing") }

  #[test] fn test_complement_edges() {
    let mut p: NodePool<BddNode> = NodePool::with_capacity(8);
    let a = p.get_or_insert(0, 0, O, I).unwrap();
    let na = p.get_or_insert(0, 0, I, O).unwrap();
    assert_eq!(na, !a, "inverted hi folds into the edge");
    assert_eq!(p.len(), 2, "both polarities share one node");
    let (_, _, lo, hi) = p.fetch(na);
    assert_eq!((lo, hi), (I, O), "fetch pushes the polarity down") }

  #[test] fn test_chain_merge() {
    let mut p: NodePool<CbddNode> = NodePool::with_capacity(8);
    // x2 alone, then x1 with the same hi: must fuse into one run on 1..=2
    let x2 = p.get_or_insert(2, 0, O, I).unwrap();
    let run = p.get_or_insert(1, 0, x2, I).unwrap();
    let (v, s, lo, hi) = p.fetch(run);
    assert_eq!((v, s, lo, hi), (1, 1, O, I));
    // and the inverted flavor fuses too
    let nrun = p.get_or_insert(0, 0, !run, O).unwrap();
    assert!(nrun.is_inv(), "inverted hi folds into the edge");
    let (v, s, lo, hi) = p.fetch(nrun.raw());
    assert_eq!((v, s), (0, 2));
    assert_eq!((lo, hi), (O, I), "polarity flowed through the merge") }

  #[test] fn test_no_merge_on_different_hi() {
    let mut p: NodePool<CbddNode> = NodePool::with_capacity(8);
    let x2 = p.get_or_insert(2, 0, O, I).unwrap();
    let n = p.get_or_insert(1, 0, x2, !x2).unwrap();
    // hi differs from the child's hi, so no run forms
    assert_eq!(p.fetch(n.raw()).1, 0) }}
