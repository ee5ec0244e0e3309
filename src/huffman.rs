//! Huffman table construction for JPEG encoding.
//!
//! Builds derived (symbol-indexed) code tables from the raw `BITS`/`HUFFVAL`
//! form stored in a DHT segment, following Figures C.1-C.3 of T.81.
//! The derived table gives O(1) code lookup during entropy coding.

use crate::error::{Error, Result};

/// Maximum code length allowed by JPEG (16 bits)
pub const MAX_CODE_LENGTH: usize = 16;

/// A Huffman table in the raw format (bits + values).
///
/// This is the format stored in the JPEG file and used as input
/// to build derived tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffTable {
    /// Number of codes of each length (`bits[0]` is unused, `bits[1-16]` are counts)
    pub bits: [u8; 17],
    /// Symbol values in order of increasing code length
    pub huffval: [u8; 256],
}

impl Default for HuffTable {
    fn default() -> Self {
        Self {
            bits: [0; 17],
            huffval: [0; 256],
        }
    }
}

impl HuffTable {
    /// Build a raw table from a `BITS` array and its symbol list.
    pub fn from_spec(bits: &[u8; 17], values: &[u8]) -> Self {
        let mut table = Self {
            bits: *bits,
            ..Self::default()
        };
        let n = values.len().min(table.huffval.len());
        table.huffval[..n].copy_from_slice(&values[..n]);
        table
    }

    /// Number of symbols defined by this table.
    pub fn num_symbols(&self) -> usize {
        self.bits[1..=MAX_CODE_LENGTH]
            .iter()
            .map(|&b| b as usize)
            .sum()
    }
}

/// Derived Huffman table optimized for encoding.
///
/// This format allows O(1) lookup of the code for any symbol.
#[derive(Clone, Debug)]
pub struct DerivedTable {
    /// Huffman code for each symbol (indexed by symbol value)
    pub ehufco: [u32; 256],
    /// Code length for each symbol (0 means no code assigned)
    pub ehufsi: [u8; 256],
}

impl Default for DerivedTable {
    fn default() -> Self {
        Self {
            ehufco: [0; 256],
            ehufsi: [0; 256],
        }
    }
}

impl DerivedTable {
    /// Build a derived table from a raw Huffman table.
    ///
    /// # Arguments
    /// * `htbl` - The raw Huffman table (bits + huffval)
    /// * `is_dc` - True for DC tables (max symbol 15), false for AC (max symbol 255)
    pub fn from_huff_table(htbl: &HuffTable, is_dc: bool) -> Result<Self> {
        let mut dtbl = Self::default();

        // Figure C.1: code length for each symbol
        let mut huffsize = [0u8; 257];
        let mut p = 0usize;
        for l in 1..=MAX_CODE_LENGTH {
            let count = htbl.bits[l] as usize;
            if p + count > 256 {
                return Err(Error::InvalidHuffmanTable);
            }
            huffsize[p..p + count].fill(l as u8);
            p += count;
        }
        let lastp = p;

        // Figure C.2: the codes themselves
        let mut huffcode = [0u32; 257];
        let mut code = 0u32;
        let mut si = huffsize[0] as usize;
        p = 0;
        while p < lastp {
            while p < lastp && huffsize[p] as usize == si {
                huffcode[p] = code;
                code += 1;
                p += 1;
            }
            // All-ones codes are reserved
            if code >= (1 << si) {
                return Err(Error::InvalidHuffmanTable);
            }
            code <<= 1;
            si += 1;
        }

        // Figure C.3: encoding tables indexed by symbol
        let max_symbol = if is_dc { 15 } else { 255 };
        for i in 0..lastp {
            let symbol = htbl.huffval[i] as usize;
            if symbol > max_symbol || dtbl.ehufsi[symbol] != 0 {
                return Err(Error::InvalidHuffmanTable);
            }
            dtbl.ehufco[symbol] = huffcode[i];
            dtbl.ehufsi[symbol] = huffsize[i];
        }

        Ok(dtbl)
    }

    /// Get the code and length for a symbol.
    ///
    /// Returns (0, 0) if the symbol has no code.
    #[inline]
    pub fn get_code(&self, symbol: u8) -> (u32, u8) {
        let idx = symbol as usize;
        (self.ehufco[idx], self.ehufsi[idx])
    }
}
