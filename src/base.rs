//! The manager: one pool, one computed table, one handle registry.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use fxhash::FxHashMap;
use crate::cache::{CacheStats, Op, OpCache};
use crate::err::{DdError, Result};
use crate::handle::{Bdd, HandleTable};
use crate::nid::{Nid, I, O};
use crate::node::{BddNode, CbddNode, NodeKind};
use crate::pool::NodePool;
use crate::vars::{VarMap, VarSet};

/// Construction knobs. Capacities are rounded up to the next power of two;
/// the collection cutoff never goes below 8192 nodes. `seed` only perturbs
/// computed-table slot selection -- results are identical for every seed.
#[derive(Debug, Clone, Copy)]
pub struct DdConfig {
  /// node pool pre-allocation.
  pub initial_capacity: usize,
  /// pool size that triggers a collection at the next operation boundary.
  pub gc_cutoff: usize,
  /// log2 of the computed-table slot count.
  pub cache_bits: u32,
  /// mixed into computed-table hashing.
  pub seed: u64 }

impl Default for DdConfig {
  fn default() -> Self {
    DdConfig { initial_capacity: 1024, gc_cutoff: 8192, cache_bits: 16, seed: 0 }}}

/// smallest allowed collection cutoff.
pub(crate) const GC_FLOOR: usize = 8192;

/// stamp source so handles can be tied to their manager.
static NEXT_MGR: AtomicU32 = AtomicU32::new(1);

/// A decision-diagram manager, generic over the node encoding.
///
/// All graph construction funnels through the pool's `get_or_insert`, so
/// within one manager equal functions always share a node, and handle
/// equality is function equality. The manager is single-threaded; several
/// independent managers may coexist, and mixing their handles is reported
/// as an error rather than silently misreading indices.
pub struct DdBase<K: NodeKind> {
  pub(crate) id: u32,
  pub(crate) pool: NodePool<K>,
  pub(crate) cache: OpCache,
  pub(crate) handles: HandleTable,
  /// user-friendly names for specific nodes. tagged handles count as roots.
  tags: HashMap<String, Bdd>,
  pub(crate) next_rank: u32,
  next_map_id: u32,
  pub(crate) gc_floor: usize,
  pub(crate) gc_cutoff: usize,
  pub(crate) poisoned: bool }

/// manager over classic nodes.
pub type BddBase = DdBase<BddNode>;
/// manager over chain nodes.
pub type CbddBase = DdBase<CbddNode>;

/// result of putting an if/then/else triple in normal form.
pub(crate) enum Norm {
  /// the triple collapsed to a single nid.
  Done(Nid),
  /// a normalized triple.
  Run(Nid, Nid, Nid),
  /// a normalized triple whose result must be inverted.
  Inv(Nid, Nid, Nid) }

impl<K: NodeKind> DdBase<K> {

  pub fn new() -> Self { Self::new_with_config(DdConfig::default()) }

  pub fn new_with_config(cfg: DdConfig) -> Self {
    let floor = cfg.gc_cutoff.max(GC_FLOOR).next_power_of_two();
    DdBase {
      id: NEXT_MGR.fetch_add(1, Ordering::Relaxed),
      pool: NodePool::with_capacity(cfg.initial_capacity.max(1).next_power_of_two()),
      cache: OpCache::new(cfg.cache_bits.clamp(4, 28), cfg.seed),
      handles: HandleTable::new(),
      tags: HashMap::new(),
      next_rank: 0,
      next_map_id: 1,
      gc_floor: floor,
      gc_cutoff: floor,
      poisoned: false }}

  // -- plumbing --------------------------------------------------------

  #[inline] pub(crate) fn ok(&self) -> Result<()> {
    if self.poisoned { Err(DdError::InternalConsistency("manager was poisoned earlier")) }
    else { Ok(()) }}

  /// read a handle's nid, rejecting handles from other managers.
  #[inline] pub(crate) fn take(&self, h: &Bdd) -> Result<Nid> {
    if h.mgr_id() != self.id { return Err(DdError::WrongManager) }
    Ok(h.nid()) }

  #[inline] pub(crate) fn wrap(&mut self, n: Nid) -> Bdd { self.handles.issue(self.id, n) }

  pub(crate) fn poison(&mut self, what: &'static str) -> DdError {
    self.poisoned = true;
    DdError::InternalConsistency(what) }

  /// reserve a contiguous span of ranks, or fail when the encoding's rank
  /// space is spent.
  pub(crate) fn alloc_ranks(&mut self, n: usize) -> Result<u32> {
    let base = self.next_rank;
    if n == 0 || base as u64 + n as u64 - 1 > K::MAX_VAR as u64 {
      return Err(DdError::CapacityExhausted("variable ranks")) }
    self.next_rank = base + n as u32;
    Ok(base) }

  /// the single-node diagram testing one rank.
  pub(crate) fn var_nid(&mut self, rank: u32) -> Result<Nid> {
    debug_assert!(rank < self.next_rank, "rank was never allocated");
    self.pool.get_or_insert(rank, 0, O, I) }

  // -- terminals and simple queries ------------------------------------

  /// handle for the constant true function.
  pub fn i(&mut self) -> Bdd { let id = self.id; self.handles.issue(id, I) }
  /// handle for the constant false function.
  pub fn o(&mut self) -> Bdd { let id = self.id; self.handles.issue(id, O) }

  /// number of nodes in the pool (terminal included).
  pub fn len(&self) -> usize { self.pool.len() }
  #[must_use] pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// number of allocated variable ranks.
  pub fn num_vars(&self) -> u32 { self.next_rank }

  /// `(hi, lo)` children of the node behind a handle. for a run node these
  /// are the children *after* the whole run.
  pub fn tup(&mut self, h: &Bdd) -> Result<(Bdd, Bdd)> {
    self.ok()?;
    let n = self.take(h)?;
    let (_, _, lo, hi) = self.pool.fetch(n);
    Ok((self.wrap(hi), self.wrap(lo))) }

  /// the hi child (the function once the run's first 1 is seen).
  pub fn hi(&mut self, h: &Bdd) -> Result<Bdd> { Ok(self.tup(h)?.0) }
  /// the lo child (the function once the whole run is 0).
  pub fn lo(&mut self, h: &Bdd) -> Result<Bdd> { Ok(self.tup(h)?.1) }

  /// branch rank of the topmost node, or None for a constant.
  pub fn branch_var(&self, h: &Bdd) -> Result<Option<u32>> {
    self.ok()?;
    let n = self.take(h)?;
    Ok(if n.is_const() { None } else { Some(self.pool.var_of(n)) }) }

  /// how many extra ranks the topmost node's run covers (always 0 for the
  /// plain encoding).
  pub fn branch_skip(&self, h: &Bdd) -> Result<u32> {
    self.ok()?;
    let n = self.take(h)?;
    Ok(if n.is_const() { 0 } else { self.pool.nodes[n.idx()].skip() }) }

  // -- logical connectives ---------------------------------------------

  /// negation: constant time, just the complement flag.
  pub fn not(&mut self, x: &Bdd) -> Result<Bdd> {
    self.ok()?;
    let n = self.take(x)?;
    Ok(self.wrap(!n)) }

  pub fn and(&mut self, x: &Bdd, y: &Bdd) -> Result<Bdd> {
    self.apply2(x, y, |f, g| (f, g, O)) }

  pub fn or(&mut self, x: &Bdd, y: &Bdd) -> Result<Bdd> {
    self.apply2(x, y, |f, g| (f, I, g)) }

  pub fn xor(&mut self, x: &Bdd, y: &Bdd) -> Result<Bdd> {
    self.apply2(x, y, |f, g| (f, !g, g)) }

  pub fn iff(&mut self, x: &Bdd, y: &Bdd) -> Result<Bdd> {
    self.apply2(x, y, |f, g| (f, g, !g)) }

  pub fn implies(&mut self, x: &Bdd, y: &Bdd) -> Result<Bdd> {
    self.apply2(x, y, |f, g| (f, g, I)) }

  fn apply2(&mut self, x: &Bdd, y: &Bdd, as_ite: fn(Nid, Nid) -> (Nid, Nid, Nid)) -> Result<Bdd> {
    self.ok()?;
    self.take(x)?; self.take(y)?;
    self.maybe_gc()?;
    let (f, g, h) = as_ite(x.nid(), y.nid());
    let r = self.ite_n(f, g, h)?;
    Ok(self.wrap(r)) }

  /// all-purpose node creation/lookup.
  pub fn ite(&mut self, f: &Bdd, g: &Bdd, h: &Bdd) -> Result<Bdd> {
    self.ok()?;
    self.take(f)?; self.take(g)?; self.take(h)?;
    self.maybe_gc()?;
    let (f, g, h) = (f.nid(), g.nid(), h.nid());
    let r = self.ite_n(f, g, h)?;
    Ok(self.wrap(r)) }

  // -- the generic traversal -------------------------------------------

  /// does `a` come before `b` in the canonical argument order?
  /// (higher branch rank first, then lower node index.)
  fn before(&self, a: Nid, b: Nid) -> bool {
    let (va, vb) = (self.pool.var_of(a), self.pool.var_of(b));
    va < vb || (va == vb && a.idx() < b.idx()) }

  /// choose normal form for an if/then/else triple. Algorithm based on:
  /// "Efficient Implementation of a BDD Package"
  /// <http://www.cs.cmu.edu/~emc/15817-f08/bryant-bdd-1991.pdf>
  pub(crate) fn norm(&self, f0: Nid, g0: Nid, h0: Nid) -> Norm {
    let (mut f, mut g, mut h) = (f0, g0, h0);
    loop {
      if f.is_const() { return Norm::Done(if f == I { g } else { h }) }   // (I/O, _, _)
      if g == h { return Norm::Done(g) }                                  // (_, g, g)
      if g == f { if h.is_const() {
                  return Norm::Done(if h == I { I } else { f }) }         // (f, f, I/O)
                  else { g = I }}
      else if g.is_const() && h.is_const() { // both const, and we know g != h
        return Norm::Done(if g == I { f } else { !f }) }
      else {
        let nf = !f;
        if      g == nf { g = O }
        else if h == nf { h = I }
        else if h == f  { h = O }
        else if g.is_const() && self.before(h, f) {
          if g == I { std::mem::swap(&mut f, &mut h) }
          else      { let t = !h; h = nf; f = t }}
        else if h.is_const() && self.before(g, f) {
          if h == I { let t = !g; g = nf; f = t }
          else      { std::mem::swap(&mut f, &mut g) }}
        else {
          let ng = !g;
          if h == ng && self.before(g, f) { h = nf; let t = f; f = g; g = t }
          // choose form where the first 2 slots are not inverted:
          // from { (f,g,h), (¬f,h,g), ¬(f,¬g,¬h), ¬(¬f,¬h,¬g) }
          else if f.is_inv() { f = nf; std::mem::swap(&mut g, &mut h) }
          else if g.is_inv() {
            return match self.norm(f, ng, !h) {
              Norm::Done(n) => Norm::Done(!n),
              Norm::Run(a, b, c) => Norm::Inv(a, b, c),
              Norm::Inv(a, b, c) => Norm::Run(a, b, c) }}
          else { return Norm::Run(f, g, h) }}}}}

  pub(crate) fn ite_n(&mut self, f: Nid, g: Nid, h: Nid) -> Result<Nid> {
    match self.norm(f, g, h) {
      Norm::Done(n) => Ok(n),
      Norm::Run(f, g, h) => self.ite_run(f, g, h),
      Norm::Inv(f, g, h) => Ok(!self.ite_run(f, g, h)?) }}

  /// recursive descent on a normalized triple: probe the computed table,
  /// split on the topmost rank (for chain encodings, on the longest run
  /// all three operands sit out together), recurse, rebuild, memoize.
  fn ite_run(&mut self, f: Nid, g: Nid, h: Nid) -> Result<Nid> {
    let key = (f.bits(), g.bits(), h.bits());
    if let Some(r) = self.cache.get(Op::Ite, key) { return Ok(r) }
    let v = self.pool.var_of(f)
      .min(self.pool.var_of(g))
      .min(self.pool.var_of(h));
    let k = if K::CHAINED { self.common_run(v, f, g, h) } else { 0 };
    let (ft, fe) = self.cof(f, v, k)?;
    let (gt, ge) = self.cof(g, v, k)?;
    let (ht, he) = self.cof(h, v, k)?;
    let t = self.ite_n(ft, gt, ht)?;
    let e = self.ite_n(fe, ge, he)?;
    let r = self.pool.get_or_insert(v, k, e, t)?;
    self.cache.put(Op::Ite, key, r);
    Ok(r) }

  /// longest run starting at `v` that every operand branches through
  /// identically: a run node at `v` holds still for its own skip, and an
  /// operand branching below `v` holds still until just above its rank.
  fn common_run(&self, v: u32, f: Nid, g: Nid, h: Nid) -> u32 {
    let mut k = u32::MAX;
    for x in [f, g, h] {
      if x.is_const() { continue }
      let xv = self.pool.var_of(x);
      k = k.min(if xv == v { self.pool.nodes[x.idx()].skip() } else { xv - v - 1 }) }
    debug_assert!(k != u32::MAX, "at least one operand branches at v");
    k }

  /// cofactors of `x` against the run `v ..= v+k`: the function once the
  /// run's first 1 is seen, and the function once the run is all 0. the
  /// tail of a longer run becomes its own (canonical) node.
  fn cof(&mut self, x: Nid, v: u32, k: u32) -> Result<(Nid, Nid)> {
    if x.is_const() { return Ok((x, x)) }
    let (xv, s, lo, hi) = self.pool.fetch(x);
    if xv != v { debug_assert!(xv > v + k); return Ok((x, x)) }
    debug_assert!(s >= k);
    let tail = if s == k { lo } else { self.pool.get_or_insert(v + k + 1, s - k - 1, lo, hi)? };
    Ok((hi, tail)) }

  // -- quantifiers ------------------------------------------------------

  /// existential quantification over a variable set.
  pub fn exists(&mut self, h: &Bdd, s: &VarSet) -> Result<Bdd> {
    self.ok()?;
    if s.mgr_id() != self.id { return Err(DdError::WrongManager) }
    self.take(h)?;
    self.maybe_gc()?;
    let (n, cube) = (h.nid(), s.cube_nid());
    let r = self.exists_n(n, cube)?;
    Ok(self.wrap(r)) }

  /// universal quantification: `∀V.f = ¬∃V.¬f`.
  pub fn forall(&mut self, h: &Bdd, s: &VarSet) -> Result<Bdd> {
    self.ok()?;
    if s.mgr_id() != self.id { return Err(DdError::WrongManager) }
    self.take(h)?;
    self.maybe_gc()?;
    let (n, cube) = (h.nid(), s.cube_nid());
    let r = !self.exists_n(!n, cube)?;
    Ok(self.wrap(r)) }

  fn exists_n(&mut self, n: Nid, cube: Nid) -> Result<Nid> {
    if n.is_const() || cube == I { return Ok(n) }
    let nv = self.pool.var_of(n);
    let (cv, _, _, ctail) = self.pool.fetch(cube);
    // a quantified rank above n's branch cannot occur in n: drop it.
    if cv < nv { return self.exists_n(n, ctail) }
    let key = (n.bits(), cube.bits(), 0);
    if let Some(r) = self.cache.get(Op::Ex, key) { return Ok(r) }
    let (hi, lo) = self.cof(n, nv, 0)?;
    let r = if cv == nv {
      let a = self.exists_n(hi, ctail)?;
      if a == I { I } // short-circuit: the disjunction can only grow
      else {
        let b = self.exists_n(lo, ctail)?;
        self.ite_n(a, I, b)? }}
    else {
      let a = self.exists_n(hi, cube)?;
      let b = self.exists_n(lo, cube)?;
      self.pool.get_or_insert(nv, 0, b, a)? };
    self.cache.put(Op::Ex, key, r);
    Ok(r) }

  // -- substitution -----------------------------------------------------

  /// rewrite `h` with every mapped rank replaced by its image. images may
  /// sit anywhere in the order: each node is rebuilt from the leaves up
  /// through `ite`, which restores the ordering invariant.
  pub fn replace(&mut self, h: &Bdd, m: &VarMap) -> Result<Bdd> {
    self.ok()?;
    if m.mgr_id() != self.id { return Err(DdError::WrongManager) }
    self.take(h)?;
    self.maybe_gc()?;
    let n = h.nid();
    if m.is_identity() { return Ok(self.wrap(n)) }
    let r = self.replace_n(n, m)?;
    Ok(self.wrap(r)) }

  fn replace_n(&mut self, n: Nid, m: &VarMap) -> Result<Nid> {
    if n.is_const() { return Ok(n) }
    let key = (n.bits(), m.id(), 0);
    if let Some(r) = self.cache.get(Op::Sub, key) { return Ok(r) }
    let nv = self.pool.var_of(n);
    let (hi, lo) = self.cof(n, nv, 0)?;
    let hi2 = self.replace_n(hi, m)?;
    let lo2 = self.replace_n(lo, m)?;
    let wn = self.var_nid(m.image_of(nv))?;
    let r = self.ite_n(wn, hi2, lo2)?;
    self.cache.put(Op::Sub, key, r);
    Ok(r) }

  /// hand out the next substitution-map stamp (used as a cache key part).
  pub(crate) fn issue_map_id(&mut self) -> u32 {
    let id = self.next_map_id;
    self.next_map_id += 1;
    id }

  // -- cofactor helpers -------------------------------------------------

  pub(crate) fn when_n(&mut self, x: u32, y: Nid, val: bool) -> Result<Nid> {
    if y.is_const() { return Ok(y) }
    let yv = self.pool.var_of(y);
    if yv > x { return Ok(y) }              // y branches below x only
    let (hi, lo) = self.cof(y, yv, 0)?;
    if yv == x { return Ok(if val { hi } else { lo }) }
    let th = self.when_n(x, hi, val)?;
    let el = self.when_n(x, lo, val)?;
    if th == el { Ok(th) } else { self.pool.get_or_insert(yv, 0, el, th) }}

  // -- inspection -------------------------------------------------------

  /// walk the distinct nodes under a handle, top-down. the callback sees
  /// `(nid, var, skip, hi, lo)` once per physical node.
  pub fn walk<F>(&self, h: &Bdd, f: &mut F) -> Result<()>
  where F: FnMut(Nid, u32, u32, Nid, Nid) {
    self.ok()?;
    let n = self.take(h)?;
    let mut seen = fxhash::FxHashSet::default();
    self.step(n, f, &mut seen);
    Ok(()) }

  fn step<F>(&self, n: Nid, f: &mut F, seen: &mut fxhash::FxHashSet<usize>)
  where F: FnMut(Nid, u32, u32, Nid, Nid) {
    if n.is_const() || seen.contains(&n.idx()) { return }
    seen.insert(n.idx());
    let (v, s, lo, hi) = self.pool.fetch(n.raw());
    f(n.raw(), v, s, hi, lo);
    self.step(lo, f, seen);
    self.step(hi, f, seen) }

  /// size of the diagram: its distinct internal nodes plus the two
  /// constant leaves. a bare constant counts as 1.
  pub fn node_count(&self, h: &Bdd) -> Result<usize> {
    let n = self.take(h)?;
    if n.is_const() { return Ok(1) }
    let mut c = 0;
    self.walk(h, &mut |_, _, _, _, _| c += 1)?;
    Ok(c + 2) }

  /// evaluate under an environment (false for ranks the closure declines).
  pub fn eval_with<F: Fn(u32) -> bool>(&self, h: &Bdd, env: F) -> Result<bool> {
    self.ok()?;
    let mut n = self.take(h)?;
    while !n.is_const() {
      let (v, s, lo, hi) = self.pool.fetch(n);
      n = if (v..=v + s).any(&env) { hi } else { lo }}
    Ok(n == I) }

  // -- truth tables (mostly for the test suites) ------------------------

  fn tt_aux(&mut self, res: &mut [u8], n: Nid, i: usize, r: u32, nvars: u32) -> Result<()> {
    if r == nvars {
      if n == I { res[i] = 1 }
      else { assert!(n == O, "expected a leaf nid, got {}", n) }}
    else {
      let lo = self.when_n(r, n, false)?;
      self.tt_aux(res, lo, i * 2, r + 1, nvars)?;
      let hi = self.when_n(r, n, true)?;
      self.tt_aux(res, hi, i * 2 + 1, r + 1, nvars)?; }
    Ok(()) }

  /// Truth table over ranks `0..nvars` (rank 0 drives the top bit of the
  /// table index). Could have been `Vec<bool>` but this is mostly for
  /// testing and the literals are much smaller when you type `1` and `0`
  /// instead of `true` and `false`.
  pub fn tt(&mut self, h: &Bdd, nvars: u32) -> Result<Vec<u8>> {
    assert!(nvars > 0, "nvars should be > 0");
    assert!(nvars <= 16, "refusing to generate a truth table of 2^{} bytes", nvars);
    self.ok()?;
    let n = self.take(h)?;
    let mut res = vec![0; 1 << nvars];
    self.tt_aux(&mut res, n, 0, 0, nvars)?;
    Ok(res) }

  /// number of satisfying assignments over ranks `0..nvars`.
  pub fn sat_count(&self, h: &Bdd, nvars: u32) -> Result<u64> {
    assert!(nvars <= 63, "model counts only fit u64 up to 63 ranks");
    self.ok()?;
    let n = self.take(h)?;
    let mut memo: FxHashMap<usize, u64> = FxHashMap::default();
    Ok(self.sc(n, 0, nvars, &mut memo)) }

  fn sc(&self, n: Nid, r: u32, nvars: u32, memo: &mut FxHashMap<usize, u64>) -> u64 {
    if n == I { return 1u64 << (nvars - r) }
    if n == O { return 0 }
    let (v, s, lo, hi) = self.pool.fetch(n.raw());
    debug_assert!(v + s < nvars, "diagram branches past the counted ranks");
    let base = if let Some(&b) = memo.get(&n.idx()) { b }
      else {
        let run_hits = (1u64 << (s + 1)) - 1; // run patterns containing a 1
        let b = run_hits * self.sc(hi, v + s + 1, nvars, memo)
              + self.sc(lo, v + s + 1, nvars, memo);
        memo.insert(n.idx(), b); b };
    let cnt = if n.is_inv() { (1u64 << (nvars - v)) - base } else { base };
    cnt << (v - r) }

  // -- tags -------------------------------------------------------------

  /// give a node a name. tagged nodes stay alive across collections.
  pub fn tag(&mut self, h: &Bdd, s: String) -> Result<Bdd> {
    self.ok()?;
    self.take(h)?;
    self.tags.insert(s, h.clone());
    Ok(h.clone()) }

  /// look a name up again.
  pub fn tagged(&self, s: &str) -> Option<Bdd> { self.tags.get(s).cloned() }

  /// drop a name (the node stays collectable through other handles).
  pub fn untag(&mut self, s: &str) -> Option<Bdd> { self.tags.remove(s) }

  // -- statistics -------------------------------------------------------

  pub fn get_stats(&self) -> CacheStats { self.cache.stats() }
  pub fn init_stats(&mut self) { self.cache.reset_stats() }
  pub fn print_stats(&mut self) {
    let CacheStats { tests, hits } = self.get_stats();
    info!("cache stats: {hits} hits / {tests} tests ({:.1}%).",
      (hits as f64 / tests as f64) * 100.0) }
}

impl<K: NodeKind> Default for DdBase<K> { fn default() -> Self { Self::new() }}

#[cfg(test)] #[path = "test-base.rs"] mod test_base;
