//! This module allows you to work with vectors of bit handles
//! as if they were plain old integers.
use crate::base::DdBase;
use crate::err::{DdError, Result};
use crate::handle::Bdd;
use crate::node::NodeKind;
use crate::vars::Var;

/// A fixed-width tuple of handles, one per bit, with the least significant
/// bit in slot 0. The vector itself is a plain value: writing a slot only
/// changes this vector, never the shared pool.
#[derive(Clone, Debug)]
pub struct Bitvec { mgr: u32, bits: Vec<Bdd> }

impl Bitvec {

  /// lift a tuple of handles (least significant first).
  pub fn from_bits(bits: Vec<Bdd>) -> Result<Bitvec> {
    let first = bits.first().ok_or_else(|| {
      DdError::InvalidArgument("empty bit vector".to_string()) })?;
    let mgr = first.mgr_id();
    if bits.iter().any(|b| b.mgr_id() != mgr) { return Err(DdError::WrongManager) }
    Ok(Bitvec { mgr, bits }) }

  pub fn width(&self) -> usize { self.bits.len() }
  pub(crate) fn mgr_id(&self) -> u32 { self.mgr }
  pub fn bits(&self) -> &[Bdd] { &self.bits }

  /// the handle for bit `i` (significance `2^i`).
  pub fn bit(&self, i: usize) -> Result<&Bdd> {
    self.bits.get(i).ok_or_else(|| DdError::InvalidArgument(
      format!("bit {} of a {}-bit vector", i, self.bits.len()))) }

  /// overwrite bit `i` in this vector only.
  pub fn set_bit(&mut self, i: usize, h: Bdd) -> Result<()> {
    if h.mgr_id() != self.mgr { return Err(DdError::WrongManager) }
    if i >= self.bits.len() {
      return Err(DdError::InvalidArgument(
        format!("bit {} of a {}-bit vector", i, self.bits.len()))) }
    self.bits[i] = h;
    Ok(()) }}


impl<K: NodeKind> DdBase<K> {

  fn check_bv(&self, x: &Bitvec) -> Result<()> {
    if x.mgr_id() != self.id { Err(DdError::WrongManager) } else { Ok(()) }}

  fn check_pair(&self, x: &Bitvec, y: &Bitvec) -> Result<()> {
    self.check_bv(x)?;
    self.check_bv(y)?;
    if x.width() != y.width() {
      return Err(DdError::MismatchedSize { lhs: x.width(), rhs: y.width() }) }
    Ok(()) }

  // -- constructors -----------------------------------------------------

  /// a constant vector. `val` is zero-extended (or truncated) to `width`.
  pub fn bitvec_from_u64(&mut self, width: usize, val: u64) -> Result<Bitvec> {
    if width == 0 {
      return Err(DdError::InvalidArgument("zero-width bit vector".to_string())) }
    let bits = (0..width)
      .map(|i| if i < 64 && (val >> i) & 1 == 1 { self.i() } else { self.o() })
      .collect();
    Ok(Bitvec { mgr: self.id, bits }) }

  /// a constant vector from big-endian bytes; `bytes` must hold exactly
  /// `ceil(width/8)` entries.
  pub fn bitvec_from_bytes(&mut self, width: usize, bytes: &[u8]) -> Result<Bitvec> {
    if width == 0 {
      return Err(DdError::InvalidArgument("zero-width bit vector".to_string())) }
    if bytes.len() != width.div_ceil(8) {
      return Err(DdError::InvalidArgument(
        format!("{} bytes for a {}-bit vector", bytes.len(), width))) }
    let bits = (0..width)
      .map(|i| {
        let byte = bytes[bytes.len() - 1 - i / 8];
        if (byte >> (i % 8)) & 1 == 1 { self.i() } else { self.o() }})
      .collect();
    Ok(Bitvec { mgr: self.id, bits }) }

  /// the vector of an integer variable's own bits.
  pub fn bitvec_from_var(&mut self, v: &Var) -> Result<Bitvec> {
    self.ok()?;
    self.check_var(v)?;
    let w = v.width();
    let mut bits = Vec::with_capacity(w);
    for i in 0..w {
      let n = self.var_nid(v.ranks()[w - 1 - i])?; // ranks run msb-first
      bits.push(self.wrap(n)) }
    Ok(Bitvec { mgr: self.id, bits }) }

  // -- bitwise ----------------------------------------------------------

  pub fn bv_not(&mut self, x: &Bitvec) -> Result<Bitvec> {
    self.check_bv(x)?;
    let mut bits = Vec::with_capacity(x.width());
    for b in x.bits() { bits.push(self.not(b)?) }
    Ok(Bitvec { mgr: x.mgr_id(), bits }) }

  pub fn bv_and(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bitvec> {
    self.zip2(x, y, Self::and) }
  pub fn bv_or(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bitvec> {
    self.zip2(x, y, Self::or) }
  pub fn bv_xor(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bitvec> {
    self.zip2(x, y, Self::xor) }

  fn zip2(&mut self, x: &Bitvec, y: &Bitvec,
          op: fn(&mut Self, &Bdd, &Bdd) -> Result<Bdd>) -> Result<Bitvec> {
    self.check_pair(x, y)?;
    let mut bits = Vec::with_capacity(x.width());
    for (a, b) in x.bits().iter().zip(y.bits()) { bits.push(op(self, a, b)?) }
    Ok(Bitvec { mgr: x.mgr_id(), bits }) }

  /// bitwise multiplex: `c ? t : e`.
  pub fn bv_ite(&mut self, c: &Bdd, t: &Bitvec, e: &Bitvec) -> Result<Bitvec> {
    self.check_pair(t, e)?;
    self.take(c)?;
    let mut bits = Vec::with_capacity(t.width());
    for (a, b) in t.bits().iter().zip(e.bits()) { bits.push(self.ite(c, a, b)?) }
    Ok(Bitvec { mgr: t.mgr_id(), bits }) }

  // -- arithmetic -------------------------------------------------------

  /// majority of three bits, the full adder's carry.
  fn bitmaj(&mut self, x: &Bdd, y: &Bdd, z: &Bdd) -> Result<Bdd> {
    let xy = self.and(x, y)?;
    let xz = self.and(x, z)?;
    let yz = self.and(y, z)?;
    let t = self.xor(&xy, &xz)?;
    self.xor(&t, &yz) }

  fn ripple(&mut self, x: &Bitvec, y: &Bitvec, carry0: Bdd) -> Result<Bitvec> {
    let mut carry = carry0;
    let mut bits = Vec::with_capacity(x.width());
    for (a, b) in x.bits().iter().zip(y.bits()) {
      let ab = self.xor(a, b)?;
      bits.push(self.xor(&ab, &carry)?);
      carry = self.bitmaj(a, b, &carry)? }
    Ok(Bitvec { mgr: x.mgr_id(), bits }) }

  /// wrapping addition (ripple carry; the final carry out is dropped).
  pub fn bv_add(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bitvec> {
    self.check_pair(x, y)?;
    let o = self.o();
    self.ripple(x, y, o) }

  /// wrapping subtraction: `x + ¬y + 1`.
  pub fn bv_sub(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bitvec> {
    self.check_pair(x, y)?;
    let ny = self.bv_not(y)?;
    let i = self.i();
    self.ripple(x, &ny, i) }

  // -- shifts -----------------------------------------------------------

  /// shift toward the most significant bit, filling with zeros.
  pub fn bv_shl(&mut self, x: &Bitvec, k: usize) -> Result<Bitvec> {
    self.check_bv(x)?;
    let w = x.width();
    if k >= w {
      return Err(DdError::InvalidArgument(
        format!("shift by {} on a {}-bit vector", k, w))) }
    let bits = (0..w)
      .map(|i| if i < k { self.o() } else { x.bits()[i - k].clone() })
      .collect();
    Ok(Bitvec { mgr: x.mgr_id(), bits }) }

  /// shift toward the least significant bit, filling with zeros.
  pub fn bv_shr(&mut self, x: &Bitvec, k: usize) -> Result<Bitvec> {
    self.check_bv(x)?;
    let w = x.width();
    if k >= w {
      return Err(DdError::InvalidArgument(
        format!("shift by {} on a {}-bit vector", k, w))) }
    let bits = (0..w)
      .map(|i| if i + k < w { x.bits()[i + k].clone() } else { self.o() })
      .collect();
    Ok(Bitvec { mgr: x.mgr_id(), bits }) }

  // -- comparisons ------------------------------------------------------

  /// equality: the conjunction of per-bit equivalences.
  pub fn bv_eq(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> {
    self.check_pair(x, y)?;
    let mut acc = self.i();
    for (a, b) in x.bits().iter().zip(y.bits()).rev() {
      let e = self.iff(a, b)?;
      acc = self.and(&acc, &e)? }
    Ok(acc) }

  /// unsigned less-than: sliced from the most significant bit down --
  /// `x < y` iff the top bit decides it, or ties and the rest decides.
  pub fn bv_lt(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> {
    self.check_pair(x, y)?;
    let mut acc = self.o();
    for (a, b) in x.bits().iter().zip(y.bits()) { // lsb upward
      let na = self.not(a)?;
      let win = self.and(&na, b)?;
      let tie = self.iff(a, b)?;
      let rest = self.and(&tie, &acc)?;
      acc = self.or(&win, &rest)? }
    Ok(acc) }

  pub fn bv_le(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> {
    let gt = self.bv_lt(y, x)?;
    self.not(&gt) }
  pub fn bv_gt(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> { self.bv_lt(y, x) }
  pub fn bv_ge(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> { self.bv_le(y, x) }

  /// two's-complement comparisons: invert the sign bits, then compare
  /// unsigned.
  pub fn bv_lt_s(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> {
    self.check_pair(x, y)?;
    let (xs, ys) = (self.flip_top(x)?, self.flip_top(y)?);
    self.bv_lt(&xs, &ys) }
  pub fn bv_le_s(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> {
    let gt = self.bv_lt_s(y, x)?;
    self.not(&gt) }
  pub fn bv_gt_s(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> { self.bv_lt_s(y, x) }
  pub fn bv_ge_s(&mut self, x: &Bitvec, y: &Bitvec) -> Result<Bdd> { self.bv_le_s(y, x) }

  fn flip_top(&mut self, x: &Bitvec) -> Result<Bitvec> {
    let mut r = x.clone();
    let top = x.width() - 1;
    let flipped = self.not(&r.bits()[top])?;
    r.set_bit(top, flipped)?;
    Ok(r) }

  // -- integer variables against constants ------------------------------

  pub fn eq_const(&mut self, v: &Var, c: u64) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_u64(v.width(), c)?;
    self.bv_eq(&a, &b) }

  /// equality against a big-endian byte string (for widths past 64 bits).
  pub fn eq_bytes(&mut self, v: &Var, bytes: &[u8]) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_bytes(v.width(), bytes)?;
    self.bv_eq(&a, &b) }

  pub fn lt_const(&mut self, v: &Var, c: u64) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_u64(v.width(), c)?;
    self.bv_lt(&a, &b) }

  pub fn le_const(&mut self, v: &Var, c: u64) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_u64(v.width(), c)?;
    self.bv_le(&a, &b) }

  pub fn gt_const(&mut self, v: &Var, c: u64) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_u64(v.width(), c)?;
    self.bv_gt(&a, &b) }

  pub fn ge_const(&mut self, v: &Var, c: u64) -> Result<Bdd> {
    let a = self.bitvec_from_var(v)?;
    let b = self.bitvec_from_u64(v.width(), c)?;
    self.bv_ge(&a, &b) }}


#[cfg(test)] mod test {
  use super::*;
  use crate::base::BddBase;

  /// decode a constant vector back to a number (tests only).
  fn as_u64(bv: &Bitvec) -> u64 {
    let mut u = 0;
    for (i, b) in bv.bits().iter().enumerate() {
      assert!(b.is_const(), "vector is not constant");
      if b.is_true() { u |= 1 << i }}
    u }

  #[test] fn test_from_bits() {
    let mut b = BddBase::new();
    let x = b.new_bool().unwrap();
    let xb = b.var_bdd(&x).unwrap();
    let nxb = b.not(&xb).unwrap();
    let v = Bitvec::from_bits(vec![xb, nxb, b.o()]).unwrap();
    assert_eq!(v.width(), 3);
    assert!(matches!(Bitvec::from_bits(vec![]), Err(DdError::InvalidArgument(_))));
    let mut b2 = BddBase::new();
    assert_eq!(Bitvec::from_bits(vec![b.i(), b2.i()]).unwrap_err(),
               DdError::WrongManager) }

  #[test] fn test_const_roundtrip() {
    let mut b = BddBase::new();
    let k = b.bitvec_from_u64(32, 1234567890).unwrap();
    assert_eq!(as_u64(&k), 1234567890);
    let k = b.bitvec_from_bytes(16, &[0x12, 0x34]).unwrap();
    assert_eq!(as_u64(&k), 0x1234) }

  #[test] fn test_add_sub() {
    let mut b = BddBase::new();
    let x = b.bitvec_from_u64(8, 200).unwrap();
    let y = b.bitvec_from_u64(8, 99).unwrap();
    let s = b.bv_add(&x, &y).unwrap();
    assert_eq!(as_u64(&s), (200 + 99) & 0xff, "addition wraps at the width");
    let d = b.bv_sub(&x, &y).unwrap();
    assert_eq!(as_u64(&d), 101);
    let d = b.bv_sub(&y, &x).unwrap();
    assert_eq!(as_u64(&d), (99u64.wrapping_sub(200)) & 0xff) }

  #[test] fn test_shifts() {
    let mut b = BddBase::new();
    let x = b.bitvec_from_u64(8, 0b0110_1001).unwrap();
    assert_eq!(as_u64(&b.bv_shl(&x, 2).unwrap()), 0b1010_0100);
    assert_eq!(as_u64(&b.bv_shr(&x, 3).unwrap()), 0b0000_1101);
    assert!(matches!(b.bv_shl(&x, 8), Err(DdError::InvalidArgument(_))));
    assert!(matches!(b.bv_shr(&x, 9), Err(DdError::InvalidArgument(_)))) }

  #[test] fn test_logic_ops() {
    let mut b = BddBase::new();
    let x = b.bitvec_from_u64(8, 0b1100).unwrap();
    let y = b.bitvec_from_u64(8, 0b1010).unwrap();
    assert_eq!(as_u64(&b.bv_and(&x, &y).unwrap()), 0b1000);
    assert_eq!(as_u64(&b.bv_or(&x, &y).unwrap()), 0b1110);
    assert_eq!(as_u64(&b.bv_xor(&x, &y).unwrap()), 0b0110);
    assert_eq!(as_u64(&b.bv_not(&x).unwrap()), 0b1111_0011) }

  #[test] fn test_mismatched_width() {
    let mut b = BddBase::new();
    let x = b.bitvec_from_u64(8, 1).unwrap();
    let y = b.bitvec_from_u64(16, 1).unwrap();
    assert_eq!(b.bv_add(&x, &y).unwrap_err(),
               DdError::MismatchedSize { lhs: 8, rhs: 16 }) }

  #[test] fn test_compare_consts() {
    let mut b = BddBase::new();
    for (x, y) in [(3u64, 5u64), (5, 3), (7, 7), (0, 255)] {
      let bx = b.bitvec_from_u64(8, x).unwrap();
      let by = b.bitvec_from_u64(8, y).unwrap();
      assert_eq!(b.bv_lt(&bx, &by).unwrap().is_true(), x < y, "{} < {}", x, y);
      assert_eq!(b.bv_le(&bx, &by).unwrap().is_true(), x <= y);
      assert_eq!(b.bv_gt(&bx, &by).unwrap().is_true(), x > y);
      assert_eq!(b.bv_ge(&bx, &by).unwrap().is_true(), x >= y);
      assert_eq!(b.bv_eq(&bx, &by).unwrap().is_true(), x == y) }}

  #[test] fn test_compare_signed() {
    let mut b = BddBase::new();
    // -1 (0xff) is less than 1 when signed, greater when unsigned
    let neg = b.bitvec_from_u64(8, 0xff).unwrap();
    let one = b.bitvec_from_u64(8, 1).unwrap();
    assert!(b.bv_lt(&one, &neg).unwrap().is_true());
    assert!(b.bv_lt_s(&neg, &one).unwrap().is_true());
    assert!(b.bv_le_s(&neg, &one).unwrap().is_true());
    assert!(b.bv_gt_s(&one, &neg).unwrap().is_true());
    assert!(b.bv_ge_s(&neg, &neg).unwrap().is_true()) }

  #[test] fn test_ite_and_slots() {
    let mut b = BddBase::new();
    let c = b.new_bool().unwrap();
    let cb = b.var_bdd(&c).unwrap();
    let t = b.bitvec_from_u64(4, 0b1010).unwrap();
    let e = b.bitvec_from_u64(4, 0b0101).unwrap();
    let m = b.bv_ite(&cb, &t, &e).unwrap();
    // bit 0 is ite(c, 0, 1) = ¬c
    let nc = b.not(&cb).unwrap();
    assert_eq!(m.bit(0).unwrap(), &nc);
    // setting a slot changes this vector only
    let mut m2 = m.clone();
    m2.set_bit(0, b.i()).unwrap();
    assert!(m2.bit(0).unwrap().is_true());
    assert_eq!(m.bit(0).unwrap(), &nc, "the original vector is untouched") }}
