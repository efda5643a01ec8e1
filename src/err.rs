//! Error types shared by every manager operation.
use std::fmt;

/// Everything a misused manager can report. Apart from
/// `InternalConsistency` (which poisons the manager), an error leaves the
/// manager exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdError {
  /// a parameter was out of range: bad shift amount, bit index past the
  /// width, a non-bijective bit ordering, a zero width or count.
  InvalidArgument(String),
  /// bit-vector operands of different widths.
  MismatchedSize { lhs: usize, rhs: usize },
  /// a handle, variable, set or map stamped by a different manager.
  WrongManager,
  /// an assignment was queried for a variable outside its scope.
  UnknownVariable,
  /// a variable-map image whose width differs from its pre-image.
  TypeMismatch { expected: usize, found: usize },
  /// the rank space of the node encoding (or the pool index space) ran out.
  CapacityExhausted(&'static str),
  /// a collector invariant failed; the manager is poisoned and every
  /// further operation returns this error.
  InternalConsistency(&'static str) }

impl fmt::Display for DdError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DdError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
      DdError::MismatchedSize { lhs, rhs } =>
        write!(f, "bit vectors differ in width ({} vs {})", lhs, rhs),
      DdError::WrongManager =>
        write!(f, "handle or variable belongs to a different manager"),
      DdError::UnknownVariable =>
        write!(f, "variable is not covered by this assignment"),
      DdError::TypeMismatch { expected, found } =>
        write!(f, "variable widths differ ({} vs {})", expected, found),
      DdError::CapacityExhausted(what) => write!(f, "capacity exhausted: {}", what),
      DdError::InternalConsistency(what) =>
        write!(f, "internal consistency failure (manager poisoned): {}", what) }}}

impl std::error::Error for DdError {}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, DdError>;


#[test] fn test_display() {
  let e = DdError::MismatchedSize { lhs: 8, rhs: 16 };
  assert_eq!(e.to_string(), "bit vectors differ in width (8 vs 16)");
  let e = DdError::CapacityExhausted("variable ranks");
  assert!(e.to_string().contains("variable ranks")) }
