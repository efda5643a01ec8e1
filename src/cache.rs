//! The computed table: a fixed-capacity, direct-mapped memo for the
//! recursive operations. Losing an entry only costs a recomputation, so
//! collisions simply overwrite and the whole table is dropped on every
//! collection cycle.
use std::hash::{Hash, Hasher};
use fxhash::FxHasher;
use crate::nid::Nid;

/// Tag distinguishing which operation produced an entry, so the three
/// traversals can share one table without crosstalk. Discriminants start
/// at 1; 0 marks an empty slot.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Op { Ite = 1, Ex = 2, Sub = 3 }

#[derive(Clone, Copy, Default)]
struct Slot { op: u8, a: u32, b: u32, c: u32, res: u32 }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats { pub tests: u64, pub hits: u64 }

pub struct OpCache {
  slots: Vec<Slot>,
  mask: usize,
  seed: u64,
  tests: u64,
  hits: u64 }

impl OpCache {

  /// `bits` is the log2 of the slot count.
  pub fn new(bits: u32, seed: u64) -> Self {
    let cap = 1usize << bits;
    OpCache { slots: vec![Slot::default(); cap], mask: cap - 1, seed,
              tests: 0, hits: 0 }}

  #[inline] fn slot_of(&self, op: Op, key: (u32, u32, u32)) -> usize {
    let mut h = FxHasher::default();
    self.seed.hash(&mut h);
    (op as u8).hash(&mut h);
    key.hash(&mut h);
    (h.finish() as usize) & self.mask }

  pub fn get(&mut self, op: Op, key: (u32, u32, u32)) -> Option<Nid> {
    self.tests += 1;
    let s = &self.slots[self.slot_of(op, key)];
    if s.op == op as u8 && (s.a, s.b, s.c) == key {
      self.hits += 1;
      Some(Nid::from_bits(s.res)) }
    else { None }}

  pub fn put(&mut self, op: Op, key: (u32, u32, u32), res: Nid) {
    let ix = self.slot_of(op, key);
    self.slots[ix] = Slot { op: op as u8, a: key.0, b: key.1, c: key.2, res: res.bits() }}

  /// forget every entry. the counters survive so long-run hit rates stay
  /// meaningful across collections.
  pub fn clear(&mut self) {
    for s in self.slots.iter_mut() { s.op = 0 }}

  pub fn stats(&self) -> CacheStats { CacheStats { tests: self.tests, hits: self.hits }}
  pub fn reset_stats(&mut self) { self.tests = 0; self.hits = 0 }}


#[cfg(test)] mod test {
  use super::*;
  use crate::nid::{Nid, I, O};

  #[test] fn test_roundtrip() {
    let mut c = OpCache::new(4, 0);
    let k = (Nid::from_idx(3).bits(), Nid::from_idx(4).bits(), O.bits());
    assert_eq!(c.get(Op::Ite, k), None);
    c.put(Op::Ite, k, I);
    assert_eq!(c.get(Op::Ite, k), Some(I));
    assert_eq!(c.get(Op::Ex, k), None, "tags keep operations apart");
    assert_eq!(c.stats(), CacheStats { tests: 3, hits: 1 }) }

  #[test] fn test_collisions_overwrite() {
    let mut c = OpCache::new(0, 0); // one slot: everything collides
    let k1 = (1, 2, 3); let k2 = (4, 5, 6);
    c.put(Op::Ite, k1, I);
    c.put(Op::Ite, k2, O);
    assert_eq!(c.get(Op::Ite, k2), Some(O));
    assert_eq!(c.get(Op::Ite, k1), None, "collision overwrote the older entry") }

  #[test] fn test_clear() {
    let mut c = OpCache::new(4, 7);
    c.put(Op::Sub, (9, 9, 9), I);
    c.clear();
    assert_eq!(c.get(Op::Sub, (9, 9, 9)), None) }}
