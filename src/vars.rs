//! Variable allocation: booleans, fixed-width integer bundles, interleaved
//! groups, plus the variable sets and maps consumed by the quantifiers and
//! by substitution.
use fxhash::FxHashMap;
use crate::base::DdBase;
use crate::err::{DdError, Result};
use crate::handle::Bdd;
use crate::nid::{Nid, I, O};
use crate::node::NodeKind;

/// How an integer's bits map onto its span of ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitOrder {
  /// most significant bit on top (the default).
  Msb,
  /// least significant bit on top.
  Lsb,
  /// explicit permutation: bit `i` (counted from the most significant)
  /// lands at `base + p[i]`. must be a bijection on `[0, width)`.
  Custom(Vec<usize>) }

impl BitOrder {
  fn permutation(&self, width: usize) -> Result<Vec<usize>> {
    let p = match self {
      BitOrder::Msb => (0..width).collect(),
      BitOrder::Lsb => (0..width).rev().collect(),
      BitOrder::Custom(p) => p.clone() };
    if p.len() != width {
      return Err(DdError::InvalidArgument(
        format!("ordering has {} entries for width {}", p.len(), width))) }
    let mut seen = vec![false; width];
    for &i in &p {
      if i >= width || seen[i] {
        return Err(DdError::InvalidArgument(
          format!("ordering is not a bijection on [0,{})", width))) }
      seen[i] = true }
    Ok(p) }}


/// A typed variable: one rank for a boolean, a span of ranks for an
/// integer. `ranks[i]` is the rank of bit `i`, counted from the most
/// significant bit. Stamped with its manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var { mgr: u32, ranks: Vec<u32> }

impl Var {
  pub fn width(&self) -> usize { self.ranks.len() }
  pub(crate) fn mgr_id(&self) -> u32 { self.mgr }
  pub(crate) fn ranks(&self) -> &[u32] { &self.ranks }

  /// rank of bit `i`, counted from the most significant bit.
  pub fn rank_of_bit(&self, i: usize) -> Result<u32> {
    self.ranks.get(i).copied().ok_or_else(|| DdError::InvalidArgument(
      format!("bit {} of a {}-bit variable", i, self.ranks.len()))) }}


/// A set of variables for the quantifiers. Internally a positive cube
/// (one node per rank); the cube handle keeps the set alive as a root.
pub struct VarSet { mgr: u32, cube: Bdd, ranks: Vec<u32> }

impl VarSet {
  pub(crate) fn mgr_id(&self) -> u32 { self.mgr }
  pub(crate) fn cube_nid(&self) -> Nid { self.cube.nid() }
  pub fn ranks(&self) -> &[u32] { &self.ranks }
  pub fn is_empty(&self) -> bool { self.ranks.is_empty() }}


/// A rank-to-rank substitution. Pairs must map between equal widths; the
/// rank translation is fixed when the map is built (ranks never move, so a
/// map stays valid however many variables are allocated afterwards).
#[derive(Debug)]
pub struct VarMap { mgr: u32, id: u32, map: FxHashMap<u32, u32> }

impl VarMap {
  pub(crate) fn mgr_id(&self) -> u32 { self.mgr }
  pub(crate) fn id(&self) -> u32 { self.id }
  pub(crate) fn image_of(&self, rank: u32) -> u32 {
    *self.map.get(&rank).unwrap_or(&rank) }
  pub fn is_identity(&self) -> bool { self.map.is_empty() }
  pub fn len(&self) -> usize { self.map.len() }
  pub fn is_empty(&self) -> bool { self.map.is_empty() }}


impl<K: NodeKind> DdBase<K> {

  // -- allocation -------------------------------------------------------

  /// allocate a single boolean variable.
  pub fn new_bool(&mut self) -> Result<Var> { self.new_int(1, BitOrder::Msb) }

  /// allocate a `width`-bit integer variable with the given bit ordering.
  pub fn new_int(&mut self, width: usize, order: BitOrder) -> Result<Var> {
    if width == 0 {
      return Err(DdError::InvalidArgument("zero-width integer".to_string())) }
    let perm = order.permutation(width)?;
    let base = self.alloc_ranks(width)?;
    let ranks = perm.iter().map(|&p| base + p as u32).collect();
    Ok(Var { mgr: self.id, ranks }) }

  pub fn new_int8(&mut self) -> Result<Var> { self.new_int(8, BitOrder::Msb) }
  pub fn new_int16(&mut self) -> Result<Var> { self.new_int(16, BitOrder::Msb) }
  pub fn new_int32(&mut self) -> Result<Var> { self.new_int(32, BitOrder::Msb) }
  pub fn new_int64(&mut self) -> Result<Var> { self.new_int(64, BitOrder::Msb) }

  /// allocate `count` integers of `width` bits whose ranks interleave:
  /// bit `i` of member `j` sits at `base + i*count + j`, so the members
  /// share path structure through the order.
  pub fn new_interleaved(&mut self, count: usize, width: usize) -> Result<Vec<Var>> {
    if count == 0 || width == 0 {
      return Err(DdError::InvalidArgument("empty interleaved group".to_string())) }
    let base = self.alloc_ranks(count * width)?;
    Ok((0..count).map(|j| Var {
      mgr: self.id,
      ranks: (0..width).map(|i| base + (i * count + j) as u32).collect() })
      .collect()) }

  pub fn new_interleaved_int8(&mut self, count: usize) -> Result<Vec<Var>> {
    self.new_interleaved(count, 8) }
  pub fn new_interleaved_int16(&mut self, count: usize) -> Result<Vec<Var>> {
    self.new_interleaved(count, 16) }
  pub fn new_interleaved_int32(&mut self, count: usize) -> Result<Vec<Var>> {
    self.new_interleaved(count, 32) }
  pub fn new_interleaved_int64(&mut self, count: usize) -> Result<Vec<Var>> {
    self.new_interleaved(count, 64) }

  // -- literals ---------------------------------------------------------

  pub(crate) fn check_var(&self, v: &Var) -> Result<()> {
    if v.mgr_id() != self.id { Err(DdError::WrongManager) } else { Ok(()) }}

  /// the diagram testing a boolean variable.
  pub fn var_bdd(&mut self, v: &Var) -> Result<Bdd> {
    self.ok()?;
    self.check_var(v)?;
    if v.width() != 1 {
      return Err(DdError::InvalidArgument(
        format!("expected a boolean, got a {}-bit variable", v.width()))) }
    let n = self.var_nid(v.ranks[0])?;
    Ok(self.wrap(n)) }

  /// the diagram testing bit `i` (from the most significant) of a variable.
  pub fn bit_bdd(&mut self, v: &Var, i: usize) -> Result<Bdd> {
    self.ok()?;
    self.check_var(v)?;
    let rank = v.rank_of_bit(i)?;
    let n = self.var_nid(rank)?;
    Ok(self.wrap(n)) }

  // -- cofactors by variable --------------------------------------------

  /// the function once a boolean variable is set high.
  pub fn when_hi(&mut self, v: &Var, h: &Bdd) -> Result<Bdd> { self.when(v, h, true) }
  /// the function once a boolean variable is set low.
  pub fn when_lo(&mut self, v: &Var, h: &Bdd) -> Result<Bdd> { self.when(v, h, false) }

  fn when(&mut self, v: &Var, h: &Bdd, val: bool) -> Result<Bdd> {
    self.ok()?;
    self.check_var(v)?;
    if v.width() != 1 {
      return Err(DdError::InvalidArgument(
        format!("cofactor by a {}-bit variable", v.width()))) }
    self.take(h)?;
    self.maybe_gc()?;
    let r = self.when_n(v.ranks[0], h.nid(), val)?;
    Ok(self.wrap(r)) }

  // -- sets and maps ----------------------------------------------------

  /// bundle variables into a set for `exists` / `forall`. every bit of
  /// every listed variable is quantified.
  pub fn var_set(&mut self, vars: &[&Var]) -> Result<VarSet> {
    self.ok()?;
    let mut ranks: Vec<u32> = vec![];
    for v in vars {
      self.check_var(v)?;
      ranks.extend_from_slice(v.ranks()) }
    ranks.sort_unstable();
    ranks.dedup();
    // build the cube bottom-up so each node sits above its tail
    let mut cube = I;
    for &rank in ranks.iter().rev() {
      cube = self.pool.get_or_insert(rank, 0, O, cube)? }
    let cube = self.wrap(cube);
    Ok(VarSet { mgr: self.id, cube, ranks }) }

  /// build a substitution from variable pairs. both sides of a pair must
  /// have the same width; bits map positionally. the rank translation is
  /// resolved here, against the ranks the variables already own.
  pub fn var_map(&mut self, pairs: &[(&Var, &Var)]) -> Result<VarMap> {
    self.ok()?;
    let mut map = FxHashMap::default();
    for (a, b) in pairs {
      self.check_var(a)?;
      self.check_var(b)?;
      if a.width() != b.width() {
        return Err(DdError::TypeMismatch { expected: a.width(), found: b.width() }) }
      for (&from, &to) in a.ranks().iter().zip(b.ranks()) {
        if from == to { continue }
        if map.insert(from, to).is_some() {
          return Err(DdError::InvalidArgument(
            format!("rank {} is mapped twice", from))) }}}
    let id = self.issue_map_id();
    Ok(VarMap { mgr: self.id, id, map }) }}


#[cfg(test)] mod test {
  use super::*;
  use crate::base::BddBase;

  #[test] fn test_rank_layout() {
    let mut b = BddBase::new();
    let x = b.new_int8().unwrap();
    assert_eq!(x.ranks(), &[0, 1, 2, 3, 4, 5, 6, 7], "msb-first is the default");
    let y = b.new_int(4, BitOrder::Lsb).unwrap();
    assert_eq!(y.ranks(), &[11, 10, 9, 8]);
    let z = b.new_int(4, BitOrder::Custom(vec![2, 0, 3, 1])).unwrap();
    assert_eq!(z.ranks(), &[14, 12, 15, 13]) }

  #[test] fn test_bad_orderings() {
    let mut b = BddBase::new();
    // shifted off the end: i -> i+1
    let e = b.new_int(8, BitOrder::Custom((0..8).map(|i| i + 1).collect()));
    assert!(matches!(e, Err(DdError::InvalidArgument(_))));
    // not injective: i -> i mod 4
    let e = b.new_int(8, BitOrder::Custom((0..8).map(|i| i % 4).collect()));
    assert!(matches!(e, Err(DdError::InvalidArgument(_))));
    assert!(b.new_int8().is_ok(), "a rejected ordering must not leak ranks part-way");
    assert!(matches!(b.new_int(0, BitOrder::Msb), Err(DdError::InvalidArgument(_)))) }

  #[test] fn test_interleave() {
    let mut b = BddBase::new();
    let vs = b.new_interleaved(3, 4).unwrap();
    assert_eq!(vs.len(), 3);
    assert_eq!(vs[0].ranks(), &[0, 3, 6, 9]);
    assert_eq!(vs[1].ranks(), &[1, 4, 7, 10]);
    assert_eq!(vs[2].ranks(), &[2, 5, 8, 11]);
    assert_eq!(b.num_vars(), 12) }

  #[test] fn test_var_set_cube() {
    let mut b = BddBase::new();
    let x = b.new_bool().unwrap();
    let y = b.new_bool().unwrap();
    let s = b.var_set(&[&y, &x]).unwrap();
    assert_eq!(s.ranks(), &[0, 1], "ranks come back sorted and deduped");
    assert_eq!(b.node_count(&s.cube).unwrap(), 4, "one cube node per rank") }

  #[test] fn test_var_map_widths() {
    let mut b = BddBase::new();
    let x = b.new_int8().unwrap();
    let y = b.new_int16().unwrap();
    let e = b.var_map(&[(&x, &y)]);
    assert_eq!(e.unwrap_err(), DdError::TypeMismatch { expected: 8, found: 16 });
    let z = b.new_int8().unwrap();
    let m = b.var_map(&[(&x, &z)]).unwrap();
    assert_eq!(m.len(), 8);
    assert_eq!(m.image_of(x.ranks()[0]), z.ranks()[0]);
    assert!(b.var_map(&[]).unwrap().is_identity()) }

  #[test] fn test_wrong_manager_var() {
    let mut a = BddBase::new();
    let mut b = BddBase::new();
    let x = a.new_bool().unwrap();
    assert_eq!(b.var_bdd(&x).unwrap_err(), DdError::WrongManager) }}
