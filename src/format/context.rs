use core::cell::RefCell;
use core::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// IEEE-style exception flags. Flags are sticky: once raised in a [`RoundingContext`] they stay
/// raised until [cleared](RoundingContext::clear_flags).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExceptionFlags(u8);

impl ExceptionFlags {
  pub const NONE: Self = Self(0);
  pub const DIVISION_BY_ZERO: Self = Self(1 << 0);
  pub const OVERFLOW: Self = Self(1 << 1);
  pub const UNDERFLOW: Self = Self(1 << 2);
  pub const INVALID: Self = Self(1 << 3);
  pub const INEXACT: Self = Self(1 << 4);

  const NAMES: [(Self, &'static str); 5] = [
    (Self::DIVISION_BY_ZERO, "DIVISION_BY_ZERO"),
    (Self::OVERFLOW, "OVERFLOW"),
    (Self::UNDERFLOW, "UNDERFLOW"),
    (Self::INVALID, "INVALID"),
    (Self::INEXACT, "INEXACT"),
  ];

  pub const fn bits(self) -> u8 { self.0 }

  pub const fn is_empty(self) -> bool { self.0 == 0 }

  /// Whether every flag of `other` is raised in `self`.
  pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

  pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }
}

impl core::ops::BitOr for ExceptionFlags {
  type Output = Self;

  fn bitor(self, rhs: Self) -> Self { self.union(rhs) }
}

impl core::ops::BitOrAssign for ExceptionFlags {
  fn bitor_assign(&mut self, rhs: Self) { *self = self.union(rhs) }
}

impl fmt::Debug for ExceptionFlags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut set = f.debug_set();
    for (flag, name) in Self::NAMES {
      if self.contains(flag) {
        set.entry(&format_args!("{name}"));
      }
    }
    set.finish()
  }
}

/// The mutable state rounding may need: the random source for
/// [`StochasticRounding`](super::RoundingMode::StochasticRounding), and the exception flags raised
/// so far.
///
/// Every operation that rounds has a variant taking an explicit `&mut RoundingContext` (the `*_in`
/// functions); the others use a per-thread context, reseedable with [`set_seed`]. Two contexts
/// seeded alike produce identical roundings.
///
/// ```
/// # use narrowfloat::*;
/// type F = NarrowFloat<presets::E4M3Fn>;
/// let mut ctx = RoundingContext::seeded(7);
/// let x = F::from_f64_in(1000.0, &mut ctx).unwrap();
/// assert_eq!(x, F::MAX);
/// assert!(ctx.flags().contains(ExceptionFlags::OVERFLOW));
/// ```
#[derive(Debug, Clone)]
pub struct RoundingContext {
  rng: StdRng,
  flags: ExceptionFlags,
}

impl RoundingContext {
  /// A context seeded from system entropy.
  pub fn new() -> Self {
    Self { rng: StdRng::from_entropy(), flags: ExceptionFlags::NONE }
  }

  /// A deterministic context.
  pub fn seeded(seed: u64) -> Self {
    Self { rng: StdRng::seed_from_u64(seed), flags: ExceptionFlags::NONE }
  }

  /// Restart the random stream from `seed`. Flags are left alone.
  pub fn reseed(&mut self, seed: u64) {
    self.rng = StdRng::seed_from_u64(seed);
  }

  pub fn flags(&self) -> ExceptionFlags {
    self.flags
  }

  pub fn clear_flags(&mut self) {
    self.flags = ExceptionFlags::NONE;
  }

  pub fn raise(&mut self, flags: ExceptionFlags) {
    self.flags |= flags;
  }

  /// A child context whose random stream is drawn from this one. Parallel kernels fork one child
  /// per task before spawning, so results do not depend on scheduling.
  pub fn fork(&mut self) -> Self {
    Self::seeded(self.rng.r#gen())
  }

  /// Fold the flags raised in `child` back into `self`.
  pub fn absorb(&mut self, child: &Self) {
    self.flags |= child.flags;
  }

  /// Decide a stochastic rounding. `fraction` is the discarded part of a quantum, in `(0, 1)`.
  /// With `bits == 0` the draw is a uniform `f64`; otherwise it is a uniform `bits`-bit integer
  /// compared against the fraction truncated to `bits` bits.
  pub(crate) fn stochastic_round_up(&mut self, fraction: f64, bits: u32) -> bool {
    if bits == 0 {
      self.rng.r#gen::<f64>() < fraction
    } else {
      let scale = (1u64 << bits) as f64;
      let threshold = (fraction * scale) as u64;
      self.rng.gen_range(0 .. 1u64 << bits) < threshold
    }
  }
}

impl Default for RoundingContext {
  fn default() -> Self {
    Self::new()
  }
}

thread_local! {
  static THREAD_CONTEXT: RefCell<RoundingContext> = RefCell::new(RoundingContext::new());
}

/// Run `f` with this thread's default [`RoundingContext`].
///
/// # Panics
///
/// If called re-entrantly from inside `f`.
pub fn with_thread_context<R>(f: impl FnOnce(&mut RoundingContext) -> R) -> R {
  THREAD_CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

/// Reseed this thread's default [`RoundingContext`], making stochastic rounding on this thread
/// reproducible from here on.
pub fn set_seed(seed: u64) {
  log::trace!("reseeding thread rounding context with {seed}");
  with_thread_context(|ctx| ctx.reseed(seed))
}

/// Exception flags raised so far in this thread's default context.
pub fn exception_flags() -> ExceptionFlags {
  with_thread_context(|ctx| ctx.flags())
}

/// Clear the exception flags of this thread's default context.
pub fn clear_exception_flags() {
  with_thread_context(|ctx| ctx.clear_flags())
}
