//! TLS model computation (spec §4.2, Concrete scenario 5, Glossary).
//!
//! `tp_addr` is the address the thread pointer register holds at
//! runtime; its relationship to `tls_begin` (the first byte of the TLS
//! template) is fixed per ABI family and is the one piece of the TLS
//! model that varies by target, so it is kept separate from
//! `profile::TargetProfile` rather than folded into it.

/// ABI families with a distinct `tp_addr` formula (spec §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsAbi {
    /// x86, x86-64, SPARC, s390x: TCB sits below the TLS template,
    /// `tp_addr` points just past the template.
    TcbBeforeTls,
    /// ARM/ARM64 variant: two reserved words precede the template and
    /// `tp_addr` points at the start of those words.
    ArmStyle,
    /// PowerPC: fixed offset bias from `tls_begin`.
    Powerpc,
    /// RISC-V: `tp_addr == tls_begin`, no bias.
    RiscV,
}

#[inline]
fn align_up(v: u64, align: u64) -> u64 {
    if align == 0 {
        v
    } else {
        (v + align - 1) & !(align - 1)
    }
}

#[inline]
fn align_down(v: u64, align: u64) -> u64 {
    if align == 0 {
        v
    } else {
        v & !(align - 1)
    }
}

/// PowerPC's fixed TCB bias (psABI constant).
const POWERPC_TP_BIAS: u64 = 0x7000;

/// Computes `tp_addr` for a TLS template `[tls_begin, tls_begin +
/// tls_memsz)` with alignment `tls_align`, per the target ABI family.
///
/// Scenario from spec §8: `tls_begin=0x1000, tls_memsz=0x40,
/// tls_align=16` on x86-64 gives `tp_addr = align_up(0x1040, 16) =
/// 0x1040`; on ARM32 the same inputs give `tp_addr =
/// align_down(0x1000 - 8, 16) = 0xFF0`.
pub fn tp_addr(abi: TlsAbi, tls_begin: u64, tls_memsz: u64, tls_align: u64) -> u64 {
    match abi {
        TlsAbi::TcbBeforeTls => align_up(tls_begin + tls_memsz, tls_align),
        TlsAbi::ArmStyle => {
            let word = 4u64;
            align_down(tls_begin.wrapping_sub(2 * word), tls_align)
        }
        TlsAbi::Powerpc => tls_begin + POWERPC_TP_BIAS,
        TlsAbi::RiscV => tls_begin,
    }
}

/// `dtv_offset` (spec Glossary): the bias subtracted on `__tls_get_addr`
/// dtv lookups. Zero for every family except the variant-II TCB layout
/// used by x86/x86-64/SPARC/s390x, which biases by the two reserved
/// DTV-pointer words.
pub fn dtv_offset(abi: TlsAbi) -> i64 {
    match abi {
        TlsAbi::TcbBeforeTls => -0x8000,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x86_64_tp_addr_matches_spec_scenario() {
        assert_eq!(tp_addr(TlsAbi::TcbBeforeTls, 0x1000, 0x40, 16), 0x1040);
    }

    #[test]
    fn arm32_tp_addr_matches_spec_scenario() {
        assert_eq!(tp_addr(TlsAbi::ArmStyle, 0x1000, 0x40, 16), 0xFF0);
    }

    #[test]
    fn riscv_tp_addr_equals_tls_begin() {
        assert_eq!(tp_addr(TlsAbi::RiscV, 0x2000, 0x10, 8), 0x2000);
    }

    #[test]
    fn powerpc_tp_addr_applies_fixed_bias() {
        assert_eq!(tp_addr(TlsAbi::Powerpc, 0x3000, 0x10, 8), 0x3000 + POWERPC_TP_BIAS);
    }
}
