//! Nucleotide helpers.

/// Complement of a single base. Case is preserved; unknown symbols map to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'n' => b'n',
        _ => b'N',
    }
}

/// Reverse complement of a sequence.
pub fn reverse_complement(seq: &str) -> String {
    seq.bytes().rev().map(|b| complement(b) as char).collect()
}

/// True for A and G.
#[inline]
pub fn is_purine(base: &str) -> bool {
    matches!(base, "A" | "G" | "a" | "g")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("ACG"), "CGT");
        assert_eq!(reverse_complement("TTAGC"), "GCTAA");
        assert_eq!(reverse_complement("G"), "C");
        assert_eq!(reverse_complement("aN"), "Nt");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_is_purine() {
        assert!(is_purine("A"));
        assert!(is_purine("G"));
        assert!(!is_purine("C"));
        assert!(!is_purine("T"));
        assert!(!is_purine("AG"));
    }
}
