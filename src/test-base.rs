// generic manager test suite, instantiated once per node encoding.
use crate::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hv<T: Hash>(t: &T) -> u64 {
  let mut h = DefaultHasher::new();
  t.hash(&mut h);
  h.finish() }

macro_rules! dd_suite { ($name:ident, $B:ident) => { mod $name {
  use crate::*;
  use super::hv;
  use rand::{rngs::StdRng, Rng, SeedableRng};

  /// allocate n booleans and hand back their literal handles.
  fn lits(b: &mut $B, n: usize) -> (Vec<vars::Var>, Vec<Bdd>) {
    let vs: Vec<_> = (0..n).map(|_| b.new_bool().unwrap()).collect();
    let hs = vs.iter().map(|v| b.var_bdd(v).unwrap()).collect();
    (vs, hs) }

  #[test] fn test_consts() {
    let mut base = $B::new();
    let (o, i) = (base.o(), base.i());
    assert!(o.is_false() && i.is_true());
    assert_eq!(base.and(&o, &i).unwrap(), o);
    assert_eq!(base.or(&o, &i).unwrap(), i);
    assert_eq!(base.not(&i).unwrap(), o);
    assert_eq!(base.node_count(&i).unwrap(), 1) }

  #[test] fn test_and() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 3);
    let a = base.and(&hs[0], &hs[1]).unwrap();
    let o = base.o();
    assert_eq!(base.when_lo(&vs[0], &a).unwrap(), o);
    assert_eq!(base.when_hi(&vs[0], &a).unwrap(), hs[1]);
    assert_eq!(base.when_lo(&vs[1], &a).unwrap(), o);
    assert_eq!(base.when_hi(&vs[1], &a).unwrap(), hs[0]);
    assert_eq!(base.when_hi(&vs[2], &a).unwrap(), a);
    assert_eq!(base.when_lo(&vs[2], &a).unwrap(), a) }

  #[test] fn test_xor() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 3);
    let x = base.xor(&hs[0], &hs[1]).unwrap();
    let n1 = base.not(&hs[1]).unwrap();
    let n0 = base.not(&hs[0]).unwrap();
    assert_eq!(base.when_lo(&vs[0], &x).unwrap(), hs[1]);
    assert_eq!(base.when_hi(&vs[0], &x).unwrap(), n1);
    assert_eq!(base.when_lo(&vs[1], &x).unwrap(), hs[0]);
    assert_eq!(base.when_hi(&vs[1], &x).unwrap(), n0);
    assert_eq!(base.when_lo(&vs[2], &x).unwrap(), x);
    assert_eq!(base.when_hi(&vs[2], &x).unwrap(), x) }

  #[test] fn test_involution_and_demorgan() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 2);
    let (a, b) = (&hs[0], &hs[1]);
    let na = base.not(a).unwrap();
    assert_eq!(&base.not(&na).unwrap(), a, "¬¬a = a");
    let ab = base.and(a, b).unwrap();
    let nab = base.not(&ab).unwrap();
    let nb = base.not(b).unwrap();
    let demorgan = base.or(&na, &nb).unwrap();
    assert_eq!(nab, demorgan, "¬(a∧b) = ¬a∨¬b") }

  #[test] fn test_commutativity_distributivity() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 3);
    let (a, b, c) = (&hs[0], &hs[1], &hs[2]);
    assert_eq!(base.and(a, b).unwrap(), base.and(b, a).unwrap());
    assert_eq!(base.or(a, b).unwrap(), base.or(b, a).unwrap());
    assert_eq!(base.iff(a, b).unwrap(), base.iff(b, a).unwrap());
    let bc = base.or(b, c).unwrap();
    let lhs = base.and(a, &bc).unwrap();
    let ab = base.and(a, b).unwrap();
    let ac = base.and(a, c).unwrap();
    let rhs = base.or(&ab, &ac).unwrap();
    assert_eq!(lhs, rhs, "a∧(b∨c) = (a∧b)∨(a∧c)") }

  #[test] fn test_ite_identities() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 2);
    let (a, b) = (&hs[0], &hs[1]);
    let (i, o) = (base.i(), base.o());
    assert_eq!(&base.ite(a, &i, &o).unwrap(), a);
    assert_eq!(base.ite(a, b, &o).unwrap(), base.and(a, b).unwrap());
    assert_eq!(base.ite(a, &i, b).unwrap(), base.or(a, b).unwrap());
    let nb = base.not(b).unwrap();
    assert_eq!(base.ite(a, &nb, b).unwrap(), base.xor(a, b).unwrap()) }

  #[test] fn test_implies_contrapositive() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 2);
    let (a, b) = (&hs[0], &hs[1]);
    let (na, nb) = (base.not(a).unwrap(), base.not(b).unwrap());
    assert_eq!(base.implies(a, b).unwrap(), base.implies(&nb, &na).unwrap());
    let i = base.i();
    assert_eq!(base.implies(a, a).unwrap(), i) }

  #[test] fn test_tt() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 3);
    assert_eq!(base.tt(&hs[0], 3).unwrap(), vec![0, 0, 0, 0, 1, 1, 1, 1]);
    assert_eq!(base.tt(&hs[1], 3).unwrap(), vec![0, 0, 1, 1, 0, 0, 1, 1]);
    assert_eq!(base.tt(&hs[2], 3).unwrap(), vec![0, 1, 0, 1, 0, 1, 0, 1]);
    let x = base.xor(&hs[0], &hs[1]).unwrap();
    assert_eq!(base.tt(&x, 3).unwrap(), vec![0, 0, 1, 1, 1, 1, 0, 0]);
    let a = base.and(&hs[1], &hs[2]).unwrap();
    assert_eq!(base.tt(&a, 3).unwrap(), vec![0, 0, 0, 1, 0, 0, 0, 1]);
    let na = base.not(&a).unwrap();
    let m = base.ite(&x, &a, &na).unwrap();
    assert_eq!(base.tt(&m, 3).unwrap(), vec![1, 1, 0, 1, 0, 0, 1, 0]) }

  #[test] fn test_sat_count() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 2);
    let or = base.or(&hs[0], &hs[1]).unwrap();
    let and = base.and(&hs[0], &hs[1]).unwrap();
    let xor = base.xor(&hs[0], &hs[1]).unwrap();
    assert_eq!(base.sat_count(&or, 2).unwrap(), 3);
    assert_eq!(base.sat_count(&and, 2).unwrap(), 1);
    assert_eq!(base.sat_count(&xor, 2).unwrap(), 2);
    assert_eq!(base.sat_count(&or, 4).unwrap(), 12, "free ranks double the count");
    let i = base.i();
    assert_eq!(base.sat_count(&i, 4).unwrap(), 16) }

  #[test] fn test_quantifiers() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 2);
    let (x, y) = (&hs[0], &hs[1]);
    let sx = base.var_set(&[&vs[0]]).unwrap();
    let xy = base.and(x, y).unwrap();
    assert_eq!(&base.exists(&xy, &sx).unwrap(), y, "∃x. x∧y = y");
    let o = base.o();
    assert_eq!(base.forall(&xy, &sx).unwrap(), o, "∀x. x∧y = 0");
    let xoy = base.or(x, y).unwrap();
    let i = base.i();
    assert_eq!(base.exists(&xoy, &sx).unwrap(), i);
    assert_eq!(&base.forall(&xoy, &sx).unwrap(), y);
    // the set survives a collection (its cube is a root)
    base.gc().unwrap();
    assert_eq!(&base.exists(&xy, &sx).unwrap(), y);
    // quantifying over nothing changes nothing
    let empty = base.var_set(&[]).unwrap();
    assert_eq!(base.exists(&xy, &empty).unwrap(), xy) }

  #[test] fn test_quantifier_absorption() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 3);
    // v ∉ vars(g): ∃v. g∧v = g and ∃v. g = g
    let g = base.xor(&hs[1], &hs[2]).unwrap();
    let sv = base.var_set(&[&vs[0]]).unwrap();
    let gv = base.and(&g, &hs[0]).unwrap();
    assert_eq!(base.exists(&gv, &sv).unwrap(), g);
    assert_eq!(base.exists(&g, &sv).unwrap(), g) }

  #[test] fn test_replace() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 4);
    // map x1 -> x2 (image below the pre-image)
    let m = base.var_map(&[(&vs[1], &vs[2])]).unwrap();
    let f = base.and(&hs[0], &hs[1]).unwrap();
    let want = base.and(&hs[0], &hs[2]).unwrap();
    assert_eq!(base.replace(&f, &m).unwrap(), want);
    // map x3 -> x0 (image above the pre-image forces a rebuild)
    let up = base.var_map(&[(&vs[3], &vs[0])]).unwrap();
    let g = base.and(&hs[2], &hs[3]).unwrap();
    let want = base.and(&hs[2], &hs[0]).unwrap();
    assert_eq!(base.replace(&g, &up).unwrap(), want);
    // identity map is a no-op
    let id = base.var_map(&[]).unwrap();
    assert_eq!(base.replace(&f, &id).unwrap(), f) }

  #[test] fn test_replace_roundtrip() {
    let mut base = $B::new();
    let (vs, hs) = lits(&mut base, 3);
    // b ∉ vars(f): a->b then b->a restores f
    let f = base.implies(&hs[0], &hs[2]).unwrap();
    let ab = base.var_map(&[(&vs[0], &vs[1])]).unwrap();
    let ba = base.var_map(&[(&vs[1], &vs[0])]).unwrap();
    let there = base.replace(&f, &ab).unwrap();
    assert!(there != f);
    assert_eq!(base.replace(&there, &ba).unwrap(), f) }

  #[test] fn test_gc_identity() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 3);
    let xy = base.or(&hs[0], &hs[1]).unwrap();
    let f = base.and(&xy, &hs[2]).unwrap();
    let tt0 = base.tt(&f, 3).unwrap();
    for _ in 0..50 { // churn out garbage
      let t = base.xor(&hs[0], &hs[1]).unwrap();
      let t = base.ite(&t, &hs[2], &f).unwrap();
      let _ = base.sat_count(&t, 3).unwrap(); }
    let reclaimed = base.gc().unwrap();
    assert!(reclaimed > 0, "the dropped intermediates were collectable");
    // the retained handle kept its meaning, equality, and hash
    assert_eq!(base.tt(&f, 3).unwrap(), tt0);
    let xy2 = base.or(&hs[0], &hs[1]).unwrap();
    let f2 = base.and(&xy2, &hs[2]).unwrap();
    assert_eq!(f, f2, "recomputation meets the survivor");
    assert_eq!(hv(&f), hv(&f2)) }

  #[test] fn test_auto_gc_bounds_the_pool() {
    use simplelog::*;
    let _ = TermLogger::init(LevelFilter::Debug, Config::default());
    let mut base = $B::new();
    let v = base.new_int16().unwrap();
    let mut rng = StdRng::seed_from_u64(0xfeed);
    for _ in 0..3000 {
      let c: u64 = rng.gen_range(0..65536);
      let f = base.eq_const(&v, c).unwrap();
      assert!(base.sat(&f).unwrap().is_some()) }
    assert!(base.len() < 20000, "collection kept the pool bounded: {}", base.len());
    base.gc().unwrap();
    assert_eq!(base.len(), 1, "nothing was live but the terminal") }

  #[test] fn test_wrong_manager() {
    let mut a = $B::new();
    let mut b = $B::new();
    let (_, ha) = lits(&mut a, 1);
    let (vb, hb) = lits(&mut b, 1);
    assert_eq!(a.and(&ha[0], &hb[0]).unwrap_err(), DdError::WrongManager);
    assert_eq!(a.not(&hb[0]).unwrap_err(), DdError::WrongManager);
    let sb = b.var_set(&[&vb[0]]).unwrap();
    assert_eq!(a.exists(&ha[0], &sb).unwrap_err(), DdError::WrongManager);
    let mb = b.var_map(&[]).unwrap();
    assert_eq!(a.replace(&ha[0], &mb).unwrap_err(), DdError::WrongManager);
    assert!(ha[0] != hb[0], "handles of different managers never compare equal") }

  #[test] fn test_interleaved_pair() {
    let mut base = $B::new();
    let vs = base.new_interleaved_int32(2).unwrap();
    let (x, y) = (&vs[0], &vs[1]);
    let bx = base.bitvec_from_var(x).unwrap();
    let by = base.bitvec_from_var(y).unwrap();
    let eq = base.bv_eq(&bx, &by).unwrap();
    let le = base.le_const(x, 10).unwrap();
    let f = base.and(&eq, &le).unwrap();
    let a = base.sat(&f).unwrap().expect("x = y ≤ 10 is satisfiable");
    let xv = a.get(x).unwrap().as_u64().unwrap();
    let yv = a.get(y).unwrap().as_u64().unwrap();
    assert_eq!(xv, yv);
    assert!(xv <= 10);
    assert!(base.eval(&f, &a).unwrap()) }

  #[test] fn test_mixed_widths_sat() {
    let mut base = $B::new();
    let v8 = base.new_int8().unwrap();
    let v16 = base.new_int16().unwrap();
    let v32 = base.new_int32().unwrap();
    let v64 = base.new_int64().unwrap();
    let v128 = base.new_int(128, BitOrder::Msb).unwrap();
    let mut big = vec![0u8; 16];
    big[15] = 3;
    let parts = [
      base.eq_const(&v8, 4).unwrap(),
      base.eq_const(&v16, 9).unwrap(),
      base.eq_const(&v32, 11).unwrap(),
      base.eq_const(&v64, 18).unwrap(),
      base.eq_bytes(&v128, &big).unwrap() ];
    let mut f = base.i();
    for p in &parts { f = base.and(&f, p).unwrap() }
    let a = base.sat(&f).unwrap().expect("the conjunction is satisfiable");
    assert_eq!(a.get(&v8).unwrap(), Value::U8(4));
    assert_eq!(a.get(&v16).unwrap(), Value::U16(9));
    assert_eq!(a.get(&v32).unwrap(), Value::U32(11));
    assert_eq!(a.get(&v64).unwrap(), Value::U64(18));
    assert_eq!(a.get(&v128).unwrap(), Value::Bytes(big)) }

  #[test] fn test_tags_survive_gc() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 2);
    let f = base.iff(&hs[0], &hs[1]).unwrap();
    base.tag(&f, "goal".to_string()).unwrap();
    let tt0 = base.tt(&f, 2).unwrap();
    drop(f);
    base.gc().unwrap();
    let back = base.tagged("goal").expect("tagged nodes are roots");
    assert_eq!(base.tt(&back, 2).unwrap(), tt0);
    assert!(base.tagged("nope").is_none()) }

  #[test] fn test_deterministic_replay() {
    let run = || {
      let mut base = $B::new();
      let (_, hs) = lits(&mut base, 3);
      let x = base.xor(&hs[0], &hs[1]).unwrap();
      let f = base.ite(&x, &hs[2], &hs[0]).unwrap();
      (base.len(), base.tt(&f, 3).unwrap()) };
    assert_eq!(run(), run()) }

  #[test] fn test_tiny_cache_still_correct() {
    // a 16-slot table collides constantly; results must not change
    let cfg = DdConfig { cache_bits: 4, ..DdConfig::default() };
    let mut base = $B::new_with_config(cfg);
    let (_, hs) = lits(&mut base, 4);
    let mut f = base.o();
    for w in hs.windows(2) {
      let x = base.xor(&w[0], &w[1]).unwrap();
      f = base.or(&f, &x).unwrap() }
    assert_eq!(base.tt(&f, 4).unwrap().iter().filter(|&&b| b == 1).count(), 14);
    let stats = base.get_stats();
    assert!(stats.tests > 0) }

  /// build a random formula alongside its 4-variable truth table
  /// (bit `i` of the mask is the value at truth-table index `i`).
  fn rand_formula(base: &mut $B, lits: &[(Bdd, u16)], rng: &mut StdRng, depth: u32)
    -> (Bdd, u16) {
    if depth == 0 || rng.gen_range(0..4) == 0 {
      let (h, m) = &lits[rng.gen_range(0..lits.len())];
      if rng.gen() { (h.clone(), *m) }
      else { (base.not(h).unwrap(), !*m) }}
    else {
      let (x, mx) = rand_formula(base, lits, rng, depth - 1);
      match rng.gen_range(0..4) {
        0 => { let (y, my) = rand_formula(base, lits, rng, depth - 1);
               (base.and(&x, &y).unwrap(), mx & my) }
        1 => { let (y, my) = rand_formula(base, lits, rng, depth - 1);
               (base.or(&x, &y).unwrap(), mx | my) }
        2 => { let (y, my) = rand_formula(base, lits, rng, depth - 1);
               (base.xor(&x, &y).unwrap(), mx ^ my) }
        _ => (base.not(&x).unwrap(), !mx) }}}

  #[test] fn test_random_formulas() {
    let mut base = $B::new();
    let (_, hs) = lits(&mut base, 4);
    let masks: Vec<u16> = (0..4).map(|r| {
      let mut m = 0u16;
      for i in 0..16 { if (i >> (3 - r)) & 1 == 1 { m |= 1 << i }}
      m }).collect();
    let lits: Vec<(Bdd, u16)> =
      hs.iter().cloned().zip(masks.iter().copied()).collect();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..2000 {
      let (f, mask) = rand_formula(&mut base, &lits, &mut rng, 3);
      let got = base.tt(&f, 4).unwrap();
      for (i, &bit) in got.iter().enumerate() {
        assert_eq!(bit == 1, (mask >> i) & 1 == 1, "truth tables disagree at {}", i) }
      match base.sat(&f).unwrap() {
        Some(a) => {
          assert!(mask != 0);
          assert!(base.eval(&f, &a).unwrap(), "the witness satisfies the formula") }
        None => {
          assert_eq!(mask, 0, "no witness means the constant false function");
          let nf = base.not(&f).unwrap();
          assert!(base.sat(&nf).unwrap().is_some()) }}}}
}}}

dd_suite!(bdd, BddBase);
dd_suite!(cbdd, CbddBase);


// -- encoding-specific behavior ----------------------------------------

#[test] fn test_or_node_counts() {
  // two internal nodes under the plain encoding, one run node when chained
  let mut b = BddBase::new();
  let x = b.new_bool().unwrap(); let y = b.new_bool().unwrap();
  let (xb, yb) = (b.var_bdd(&x).unwrap(), b.var_bdd(&y).unwrap());
  let f = b.or(&xb, &yb).unwrap();
  assert_eq!(b.node_count(&f).unwrap(), 4);

  let mut c = CbddBase::new();
  let x = c.new_bool().unwrap(); let y = c.new_bool().unwrap();
  let (xb, yb) = (c.var_bdd(&x).unwrap(), c.var_bdd(&y).unwrap());
  let f = c.or(&xb, &yb).unwrap();
  assert_eq!(c.node_count(&f).unwrap(), 3);
  assert_eq!(c.branch_skip(&f).unwrap(), 1, "the run covers both ranks") }

#[test] fn test_long_or_chain_is_one_node() {
  let mut c = CbddBase::new();
  let mut f = c.o();
  for _ in 0..60 {
    let v = c.new_bool().unwrap();
    let vb = c.var_bdd(&v).unwrap();
    f = c.or(&f, &vb).unwrap() }
  assert_eq!(c.node_count(&f).unwrap(), 3, "a 60-wide or is a single run node");
  assert_eq!(c.branch_skip(&f).unwrap(), 59);
  assert_eq!(c.sat_count(&f, 60).unwrap(), (1u64 << 60) - 1) }

#[test] fn test_rank_capacity() {
  let mut c = CbddBase::new();
  for _ in 0..32767 { c.new_bool().unwrap(); }
  assert!(matches!(c.new_bool(), Err(DdError::CapacityExhausted(_))),
          "the chain encoding runs out of 15-bit ranks");
  let mut b = BddBase::new();
  for _ in 0..32768 { b.new_bool().unwrap(); }
  assert_eq!(b.num_vars(), 32768, "the plain encoding keeps going") }

#[test] fn test_cross_kind_counts_agree() {
  // same function, same truth table, whatever the encoding
  let mut b = BddBase::new();
  let mut c = CbddBase::new();
  let (bt, ct) = ({
    let x = b.new_int8().unwrap();
    let f = b.le_const(&x, 100).unwrap();
    b.tt(&f, 8).unwrap() },
  { let x = c.new_int8().unwrap();
    let f = c.le_const(&x, 100).unwrap();
    c.tt(&f, 8).unwrap() });
  assert_eq!(bt, ct) }
