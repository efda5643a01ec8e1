//! Witness extraction: walk one satisfying path and decode it per variable.
use fxhash::{FxHashMap, FxHashSet};
use crate::base::DdBase;
use crate::err::{DdError, Result};
use crate::handle::Bdd;
use crate::nid::{Nid, I, O};
use crate::node::NodeKind;
use crate::vars::Var;

/// A decoded variable value, sized by the variable's width. Widths past 64
/// bits come back as big-endian bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Bool(bool),
  U8(u8),
  U16(u16),
  U32(u32),
  U64(u64),
  Bytes(Vec<u8>) }

impl Value {
  /// numeric view where one exists (everything but `Bytes`).
  pub fn as_u64(&self) -> Option<u64> {
    match *self {
      Value::Bool(b) => Some(b as u64),
      Value::U8(v) => Some(v as u64),
      Value::U16(v) => Some(v as u64),
      Value::U32(v) => Some(v as u64),
      Value::U64(v) => Some(v),
      Value::Bytes(_) => None }}}


/// One satisfying assignment. Ranks the chosen path never touched decode
/// to the default 0. An assignment built over a variable subset refuses to
/// decode anything outside that subset.
pub struct Assignment {
  mgr: u32,
  values: FxHashMap<u32, bool>,
  scope: Option<FxHashSet<u32>> }

impl Assignment {

  /// the chosen value of a single rank (false unless the path set it).
  pub fn rank_value(&self, rank: u32) -> bool {
    self.values.get(&rank).copied().unwrap_or(false) }

  /// decode a variable to a typed value.
  pub fn get(&self, v: &Var) -> Result<Value> {
    if v.mgr_id() != self.mgr { return Err(DdError::WrongManager) }
    if let Some(scope) = &self.scope {
      if v.ranks().iter().any(|r| !scope.contains(r)) {
        return Err(DdError::UnknownVariable) }}
    let w = v.width();
    if w == 1 { return Ok(Value::Bool(self.rank_value(v.ranks()[0]))) }
    if w <= 64 {
      let mut acc = 0u64;
      for &r in v.ranks() { acc = (acc << 1) | self.rank_value(r) as u64 }
      return Ok(match w {
        0..=8 => Value::U8(acc as u8),
        9..=16 => Value::U16(acc as u16),
        17..=32 => Value::U32(acc as u32),
        _ => Value::U64(acc) }) }
    let mut bytes = vec![0u8; w.div_ceil(8)];
    for (i, &r) in v.ranks().iter().enumerate() {
      // bit i counts from the most significant end
      let k = w - 1 - i; // significance
      if self.rank_value(r) {
        let bi = bytes.len() - 1 - k / 8;
        bytes[bi] |= 1 << (k % 8) }}
    Ok(Value::Bytes(bytes)) }

  /// shorthand for boolean variables.
  pub fn get_bool(&self, v: &Var) -> Result<bool> {
    match self.get(v)? {
      Value::Bool(b) => Ok(b),
      _ => Err(DdError::InvalidArgument(
        format!("expected a boolean, got a {}-bit variable", v.width()))) }}}


impl<K: NodeKind> DdBase<K> {

  /// find one satisfying assignment, or None when the function is false.
  ///
  /// Greedy descent: at each node take the lo branch unless it leads
  /// straight to the false terminal, so every rank the function does not
  /// constrain keeps the default 0.
  pub fn sat(&self, h: &Bdd) -> Result<Option<Assignment>> {
    self.ok()?;
    let n = self.take(h)?;
    Ok(self.sat_n(n).map(|values| Assignment {
      mgr: self.id, values, scope: None })) }

  /// like `sat`, but the returned assignment only decodes the listed
  /// variables; anything else reports `UnknownVariable`.
  pub fn sat_within(&self, h: &Bdd, vs: &[&Var]) -> Result<Option<Assignment>> {
    self.ok()?;
    let n = self.take(h)?;
    let mut scope = FxHashSet::default();
    for v in vs {
      self.check_var(v)?;
      scope.extend(v.ranks().iter().copied()) }
    Ok(self.sat_n(n).map(|values| Assignment {
      mgr: self.id, values, scope: Some(scope) })) }

  fn sat_n(&self, n: Nid) -> Option<FxHashMap<u32, bool>> {
    if n == O { return None }
    let mut values = FxHashMap::default();
    let mut cur = n;
    while !cur.is_const() {
      let (v, s, lo, hi) = self.pool.fetch(cur);
      if lo != O {
        for r in v..=v + s { values.insert(r, false); }
        cur = lo }
      else {
        // lo is the false leaf, so the run's first rank goes high.
        // (hi can't be false too: that node would have been reduced away.)
        values.insert(v, true);
        for r in v + 1..=v + s { values.insert(r, false); }
        cur = hi }}
    debug_assert!(cur == I, "greedy descent can only end at the true leaf");
    Some(values) }

  /// evaluate a function under an assignment (unset ranks read as 0).
  pub fn eval(&self, h: &Bdd, a: &Assignment) -> Result<bool> {
    if a.mgr != self.id { return Err(DdError::WrongManager) }
    self.eval_with(h, |r| a.rank_value(r)) }}


#[cfg(test)] mod test {
  use super::*;
  use crate::base::{BddBase, CbddBase};

  #[test] fn test_sat_consts() {
    let mut b = BddBase::new();
    let o = b.o(); let i = b.i();
    assert!(b.sat(&o).unwrap().is_none(), "false has no witness");
    let a = b.sat(&i).unwrap().expect("true is satisfiable");
    let x = b.new_bool().unwrap();
    assert_eq!(a.get(&x).unwrap(), Value::Bool(false), "unconstrained defaults to 0") }

  #[test] fn test_sat_prefers_lo() {
    let mut b = BddBase::new();
    let x = b.new_bool().unwrap();
    let y = b.new_bool().unwrap();
    let xb = b.var_bdd(&x).unwrap();
    let yb = b.var_bdd(&y).unwrap();
    let f = b.or(&xb, &yb).unwrap();
    let a = b.sat(&f).unwrap().unwrap();
    assert_eq!(a.get_bool(&x).unwrap(), false, "lo branch first");
    assert_eq!(a.get_bool(&y).unwrap(), true);
    assert!(b.eval(&f, &a).unwrap()) }

  #[test] fn test_sat_chain() {
    let mut b = CbddBase::new();
    let x = b.new_bool().unwrap();
    let y = b.new_bool().unwrap();
    let z = b.new_bool().unwrap();
    let (xb, yb) = (b.var_bdd(&x).unwrap(), b.var_bdd(&y).unwrap());
    let zb = b.var_bdd(&z).unwrap();
    let xy = b.or(&xb, &yb).unwrap();
    let f = b.or(&xy, &zb).unwrap();
    let a = b.sat(&f).unwrap().unwrap();
    // one run node: lo leads to O, so its first rank goes high
    assert_eq!(a.get_bool(&x).unwrap(), true);
    assert_eq!(a.get_bool(&y).unwrap(), false);
    assert_eq!(a.get_bool(&z).unwrap(), false);
    assert!(b.eval(&f, &a).unwrap()) }

  #[test] fn test_sat_within_scope() {
    let mut b = BddBase::new();
    let x = b.new_bool().unwrap();
    let y = b.new_bool().unwrap();
    let xb = b.var_bdd(&x).unwrap();
    let a = b.sat_within(&xb, &[&x]).unwrap().unwrap();
    assert_eq!(a.get_bool(&x).unwrap(), true);
    assert_eq!(a.get(&y).unwrap_err(), DdError::UnknownVariable) }

  #[test] fn test_value_widths() {
    let mut b = BddBase::new();
    let v8 = b.new_int8().unwrap();
    let v16 = b.new_int16().unwrap();
    let v32 = b.new_int32().unwrap();
    let v64 = b.new_int64().unwrap();
    let parts = [
      b.eq_const(&v8, 4).unwrap(),
      b.eq_const(&v16, 9).unwrap(),
      b.eq_const(&v32, 11).unwrap(),
      b.eq_const(&v64, 18).unwrap() ];
    let mut f = b.i();
    for p in &parts { f = b.and(&f, p).unwrap() }
    let a = b.sat(&f).unwrap().unwrap();
    assert_eq!(a.get(&v8).unwrap(), Value::U8(4));
    assert_eq!(a.get(&v16).unwrap(), Value::U16(9));
    assert_eq!(a.get(&v32).unwrap(), Value::U32(11));
    assert_eq!(a.get(&v64).unwrap(), Value::U64(18)) }

  #[test] fn test_value_bytes() {
    let mut b = BddBase::new();
    let v = b.new_int(128, crate::vars::BitOrder::Msb).unwrap();
    let mut want = vec![0u8; 16];
    want[15] = 3;
    let f = b.eq_bytes(&v, &want).unwrap();
    let a = b.sat(&f).unwrap().unwrap();
    assert_eq!(a.get(&v).unwrap(), Value::Bytes(want)) }}
