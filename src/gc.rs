//! Two-phase collection: mark from the registered handles, slide the
//! survivors down, then rewrite children, the reverse index, and every
//! outstanding handle through the same remap.
use fxhash::FxHashMap;
use crate::base::DdBase;
use crate::err::Result;
use crate::mark::MarkSet;
use crate::node::NodeKind;

impl<K: NodeKind> DdBase<K> {

  /// collection check at operation boundaries. never runs while a
  /// traversal is in flight, because intermediate nids on the call stack
  /// are not registered roots.
  pub(crate) fn maybe_gc(&mut self) -> Result<()> {
    if self.pool.len() > self.gc_cutoff { self.gc()?; }
    Ok(()) }

  /// collect unreachable nodes now. returns how many were reclaimed.
  ///
  /// Handles keep their identity: equal handles share an index before the
  /// sweep, and the remap is a pure function of the index, so they still
  /// share (and hash alike) afterwards.
  pub fn gc(&mut self) -> Result<usize> {
    self.ok()?;
    let before = self.pool.len();
    let roots = self.handles.live();

    // mark
    let mut marked = MarkSet::new(before);
    marked.mark(0); // the terminal always survives
    let mut stack: Vec<usize> = Vec::with_capacity(64);
    for cell in &roots {
      let n = cell.get();
      if n.idx() >= before { return Err(self.poison("handle points past the pool")) }
      stack.push(n.idx()) }
    while let Some(ix) = stack.pop() {
      if !marked.mark(ix) { continue }
      let node = self.pool.nodes[ix];
      stack.push(node.lo().idx());
      stack.push(node.hi().idx()) }

    // compact: stable slide, record old -> new
    let live = marked.len();
    let mut remap: Vec<u32> = vec![0; before];
    let mut nodes: Vec<K> = Vec::with_capacity(live.next_power_of_two());
    for (ix, node) in self.pool.nodes.iter().enumerate() {
      if marked.is_marked(ix) {
        remap[ix] = nodes.len() as u32;
        nodes.push(*node) }}

    // rewrite surviving children; rebuild the reverse index from scratch
    let mut index: FxHashMap<K, u32> =
      FxHashMap::with_capacity_and_hasher(live, Default::default());
    for i in 1..nodes.len() {
      let n = nodes[i];
      let lo = n.lo().with_idx(remap[n.lo().idx()] as usize);
      let hi = n.hi().with_idx(remap[n.hi().idx()] as usize);
      let n2 = K::build(n.var(), n.skip(), lo, hi);
      nodes[i] = n2;
      index.insert(n2, i as u32); }

    // rewrite the registered handles in place
    for cell in &roots {
      let n = cell.get();
      if !marked.is_marked(n.idx()) {
        return Err(self.poison("live handle points at an unmarked node")) }
      cell.set(n.with_idx(remap[n.idx()] as usize)) }

    self.pool.nodes = nodes;
    self.pool.index = index;
    self.cache.clear();
    self.gc_cutoff = (live * 2).next_power_of_two().max(self.gc_floor);
    debug!("gc: {} -> {} nodes ({} reclaimed), {} roots, next cutoff {}",
           before, live, before - live, roots.len(), self.gc_cutoff);
    Ok(before - live) }}
