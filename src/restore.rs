//! Reinsert standard Huffman tables into an abbreviated stream.
//!
//! Streams encoded with Huffman tables omitted carry no DHT segment and
//! rely on the decoder already knowing the Annex K tables. Generic decoders
//! do not, so [`restore_huffman_tables`] splices those tables back in
//! ahead of the scan header.

use crate::consts::{JPEG_DHT, JPEG_RST0, JPEG_SOI, JPEG_SOS};
use crate::encode::std_huffman_tables;
use crate::error::{Error, Result};
use crate::marker::MarkerWriter;

/// TEM, the only other marker that carries no length field.
const JPEG_TEM: u8 = 0x01;

/// Return a copy of `jpeg` that a generic decoder can read.
///
/// If any DHT segment appears before the first SOS the stream is returned
/// unchanged. Otherwise one DHT segment holding the four standard tables is
/// inserted immediately before SOS. Entropy-coded data is copied verbatim.
///
/// # Errors
/// [`Error::MalformedStream`] if the header cannot be walked up to SOS.
pub fn restore_huffman_tables(jpeg: &[u8]) -> Result<Vec<u8>> {
    let sos = match find_scan(jpeg)? {
        ScanSearch::HasTables => {
            let mut out = Vec::new();
            out.try_reserve_exact(jpeg.len())?;
            out.extend_from_slice(jpeg);
            return Ok(out);
        }
        ScanSearch::MissingTables { sos } => sos,
    };

    let tables = std_huffman_tables();
    let dht = tables.each_ref().map(|(slot, is_ac, table)| (*slot, *is_ac, table));
    let dht_len = 4 + dht
        .iter()
        .map(|(_, _, t)| 17 + t.num_symbols())
        .sum::<usize>();

    let mut out = Vec::new();
    out.try_reserve_exact(jpeg.len() + dht_len)?;
    out.extend_from_slice(&jpeg[..sos]);
    let mut marker = MarkerWriter::new(&mut out);
    marker.write_dht_multiple(&dht)?;
    debug_assert_eq!(marker.bytes_written(), dht_len);
    out.extend_from_slice(&jpeg[sos..]);
    Ok(out)
}

enum ScanSearch {
    HasTables,
    /// Offset of the SOS marker's 0xFF byte
    MissingTables { sos: usize },
}

/// Walk the header segments from SOI up to the first SOS.
fn find_scan(jpeg: &[u8]) -> Result<ScanSearch> {
    if jpeg.len() < 4 || jpeg[0] != 0xFF || jpeg[1] != JPEG_SOI {
        return Err(Error::MalformedStream("missing SOI marker"));
    }

    let mut pos = 2;
    loop {
        if pos >= jpeg.len() || jpeg[pos] != 0xFF {
            return Err(Error::MalformedStream("expected a marker"));
        }
        // Any number of 0xFF fill bytes may precede a marker code
        let start = pos;
        while pos < jpeg.len() && jpeg[pos] == 0xFF {
            pos += 1;
        }
        let Some(&code) = jpeg.get(pos) else {
            return Err(Error::MalformedStream("truncated marker"));
        };
        pos += 1;

        match code {
            JPEG_SOS => return Ok(ScanSearch::MissingTables { sos: start }),
            JPEG_DHT => return Ok(ScanSearch::HasTables),
            JPEG_TEM | JPEG_RST0..=0xD7 => continue,
            0x00 => return Err(Error::MalformedStream("stuffed byte outside a scan")),
            _ => {}
        }

        let Some(len_bytes) = jpeg.get(pos..pos + 2) else {
            return Err(Error::MalformedStream("truncated segment length"));
        };
        let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if len < 2 || pos + len > jpeg.len() {
            return Err(Error::MalformedStream("segment runs past end of stream"));
        }
        pos += len;
    }
}
