//! Public handles and the registry that lets the collector rewrite them.
use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use crate::nid::{Nid, I, O};

/// An opaque reference to one diagram in one manager.
///
/// The packed node id lives in a shared cell: when the pool is compacted
/// the owning manager rewrites the cell in place, so a handle keeps
/// denoting the same function across collections. Clones share the cell.
/// Equality and hashing read the current id -- within one manager this is
/// function equality, because construction is canonical.
#[derive(Clone)]
pub struct Bdd { cell: Rc<Cell<Nid>>, mgr: u32 }

impl Bdd {
  #[inline] pub(crate) fn nid(&self) -> Nid { self.cell.get() }
  #[inline] pub(crate) fn mgr_id(&self) -> u32 { self.mgr }

  /// does this handle denote a constant function?
  pub fn is_const(&self) -> bool { self.nid().is_const() }
  /// does this handle denote the constant true function?
  pub fn is_true(&self) -> bool { self.nid() == I }
  /// does this handle denote the constant false function?
  pub fn is_false(&self) -> bool { self.nid() == O }}

impl PartialEq for Bdd {
  fn eq(&self, other: &Self) -> bool {
    self.mgr == other.mgr && self.nid() == other.nid() }}
impl Eq for Bdd {}

impl Hash for Bdd {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.mgr.hash(state);
    self.nid().hash(state) }}

impl fmt::Debug for Bdd {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Bdd({})", self.nid()) }}


/// Weak registry of every outstanding handle cell.
///
/// The table never owns a handle: entries are weak, so dropping the last
/// clone of a handle makes its nodes collectable. The collector walks the
/// live entries as its root set and rewrites each surviving cell through
/// the compaction remap. Dead entries are swept out whenever the table
/// doubles past its high-water mark, and again on every collection.
pub struct HandleTable { cells: Vec<Weak<Cell<Nid>>>, prune_at: usize }

impl HandleTable {

  pub fn new() -> Self { HandleTable { cells: vec![], prune_at: 64 }}

  /// wrap a node id in a fresh registered handle.
  pub fn issue(&mut self, mgr: u32, n: Nid) -> Bdd {
    let cell = Rc::new(Cell::new(n));
    self.cells.push(Rc::downgrade(&cell));
    if self.cells.len() >= self.prune_at { self.prune() }
    Bdd { cell, mgr }}

  /// drop entries whose handles are gone.
  pub fn prune(&mut self) {
    self.cells.retain(|w| w.strong_count() > 0);
    self.prune_at = (self.cells.len() * 2).max(64) }

  /// upgrade every live entry. the returned cells keep their handles
  /// pinned while the collector runs.
  pub fn live(&mut self) -> Vec<Rc<Cell<Nid>>> {
    self.prune();
    self.cells.iter().filter_map(|w| w.upgrade()).collect() }

  /// registered entries, dead ones included (until the next sweep).
  pub fn len(&self) -> usize { self.cells.len() }}

impl Default for HandleTable { fn default() -> Self { Self::new() }}


#[cfg(test)] mod test {
  use super::*;

  #[test] fn test_identity() {
    let mut tbl = HandleTable::new();
    let a = tbl.issue(1, Nid::from_idx(4));
    let b = tbl.issue(1, Nid::from_idx(4));
    let c = tbl.issue(2, Nid::from_idx(4));
    assert_eq!(a, b, "same manager, same node: equal");
    assert!(a != c, "handles never match across managers");
    assert!(tbl.issue(1, I).is_true());
    assert!(tbl.issue(1, O).is_false()) }

  #[test] fn test_weak_registry() {
    let mut tbl = HandleTable::new();
    let keep = tbl.issue(1, Nid::from_idx(1));
    { let _drop = tbl.issue(1, Nid::from_idx(2)); }
    assert_eq!(tbl.len(), 2);
    let live = tbl.live();
    assert_eq!(live.len(), 1, "dropped handles fall out of the table");
    assert_eq!(live[0].get(), keep.nid()) }

  #[test] fn test_rewrite_through_cell() {
    let mut tbl = HandleTable::new();
    let h = tbl.issue(1, Nid::from_idx(7));
    for cell in tbl.live() { cell.set(cell.get().with_idx(3)) }
    assert_eq!(h.nid(), Nid::from_idx(3), "rewrites are visible through the handle") }}
