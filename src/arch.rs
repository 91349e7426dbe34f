//! What SIMD extensions the host CPU offers. The kernels in this crate are portable; this is
//! informational, for callers choosing tilings or reporting their environment.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArchExtension {
  #[default]
  None,
  Avx256,
  Avx512,
  Neon,
}

impl ArchExtension {
  /// The widest extension available on this CPU, detected at runtime.
  pub fn detect() -> Self {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
      if std::arch::is_x86_feature_detected!("avx512f") {
        return Self::Avx512
      }
      if std::arch::is_x86_feature_detected!("avx2") {
        return Self::Avx256
      }
    }
    #[cfg(target_arch = "aarch64")]
    {
      if std::arch::is_aarch64_feature_detected!("neon") {
        return Self::Neon
      }
    }
    Self::None
  }

  /// Vector register width in bits, 0 for [`None`](Self::None).
  pub const fn register_bits(self) -> u32 {
    match self {
      Self::None => 0,
      Self::Avx256 => 256,
      Self::Neon => 128,
      Self::Avx512 => 512,
    }
  }
}

impl fmt::Display for ArchExtension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::None => "none",
      Self::Avx256 => "avx256",
      Self::Avx512 => "avx512",
      Self::Neon => "neon",
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detect_is_stable() {
    assert_eq!(ArchExtension::detect(), ArchExtension::detect());
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    assert_eq!(ArchExtension::detect(), ArchExtension::None);
  }

  #[test]
  fn display() {
    assert_eq!(ArchExtension::Avx512.to_string(), "avx512");
    assert_eq!(ArchExtension::default().register_bits(), 0);
  }
}
