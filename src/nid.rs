/* Bitmask diagram:

   NID
   ------------------
   31   : INV
   30..0: node index

*/
use std::fmt;

/// A NID names one node in a pool, packed into a u32 for cheap copying.
/// Bit 31 is the complement flag; the remaining 31 bits are the pool index.
/// Two NIDs with the same index and opposite complement bits denote
/// complementary functions.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Nid { n: u32 }

/// Single-bit mask representing that a NID is inverted.
const INV: u32 = 1 << 31;

/// Mask extracting the index part of a NID.
const IDX_MASK: u32 = INV - 1;

/// Largest index a NID can carry.
pub const MAX_IDX: usize = IDX_MASK as usize;

/// NID of the terminal read as the constant function 1, or "always true."
pub const I: Nid = Nid { n: 0 };
/// NID of the terminal read as the constant function 0: the same node as
/// `I`, seen through an inverted edge.
pub const O: Nid = Nid { n: INV };

impl Nid {
  /// construct a non-inverted NID for the given pool index.
  #[inline] pub(crate) fn from_idx(ix: usize) -> Nid {
    debug_assert!(ix <= MAX_IDX);
    Nid { n: ix as u32 }}

  /// the pool index this NID points at.
  #[inline] pub fn idx(self) -> usize { (self.n & IDX_MASK) as usize }

  /// is the complement flag set?
  #[inline] pub fn is_inv(self) -> bool { (self.n & INV) != 0 }

  /// does this NID point at the terminal? (either polarity)
  #[inline] pub fn is_const(self) -> bool { (self.n & IDX_MASK) == 0 }

  /// the NID with the complement flag cleared.
  #[inline] pub fn raw(self) -> Nid { Nid { n: self.n & !INV }}

  /// conditional inversion, used when unwinding inverted recursions.
  #[inline] pub fn inv_if(self, inv: bool) -> Nid { if inv { !self } else { self }}

  /// same polarity, different index. used when the pool is compacted.
  #[inline] pub(crate) fn with_idx(self, ix: usize) -> Nid {
    debug_assert!(ix <= MAX_IDX);
    Nid { n: (self.n & INV) | ix as u32 }}

  /// raw bit pattern, used as a cache key component.
  #[inline] pub(crate) fn bits(self) -> u32 { self.n }

  /// rebuild from a raw bit pattern previously taken with `bits`.
  #[inline] pub(crate) fn from_bits(n: u32) -> Nid { Nid { n }}}

impl std::ops::Not for Nid {
  type Output = Nid;
  fn not(self) -> Nid { Nid { n: self.n ^ INV }}}

/// Pretty-printer that reveals the packed parts.
impl fmt::Display for Nid {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    if self.is_const() { if self.is_inv() { write!(f, "O") } else { write!(f, "I") }}
    else if self.is_inv() { write!(f, "¬#{}", self.idx()) }
    else { write!(f, "#{}", self.idx()) }}}

/// Same as fmt::Display. Mostly so it's easier to see the problem when an assertion fails.
impl fmt::Debug for Nid {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self) }}


#[test] fn test_nids() {
  assert_eq!(I.n, 0x0000_0000);
  assert_eq!(O.n, 0x8000_0000);
  assert_eq!(!I, O); assert_eq!(!O, I);
  let n = Nid::from_idx(5);
  assert!(!n.is_const()); assert!(!n.is_inv());
  assert_eq!(n.idx(), 5);
  assert!((!n).is_inv());
  assert_eq!((!n).idx(), 5);
  assert_eq!((!n).raw(), n);
  assert_eq!(n.inv_if(true), !n);
  assert_eq!(n.inv_if(false), n) }

#[test] fn test_rewrite() {
  let n = !Nid::from_idx(9);
  let m = n.with_idx(2);
  assert!(m.is_inv(), "rewriting the index should keep the polarity");
  assert_eq!(m.idx(), 2) }
