// FASTA input for pairwise alignment, using bio::io::fasta
//
// - Automatic gzip/bgzip detection by magic bytes
// - Parallel BGZIP decompression via noodles-bgzf, flate2 for plain gzip
// - Records are consumed two at a time: 1st vs 2nd, 3rd vs 4th, ...

use bio::io::fasta;
use flate2::read::GzDecoder;
use noodles_bgzf as bgzf;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::alignment::utils::encode_sequence;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// Compression of an input file, from its first bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Gzip,
    Bgzip,
}

fn detect_compression(path: &Path) -> io::Result<Compression> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 18]; // BGZIP header is at least 18 bytes
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if filled < 2 || header[0] != 0x1f || header[1] != 0x8b {
        return Ok(Compression::None);
    }
    // BGZIP sets FEXTRA and carries a 'BC' subfield at byte 12
    if filled == header.len() && header[3] & 0x04 != 0 && header[12] == b'B' && header[13] == b'C' {
        return Ok(Compression::Bgzip);
    }
    Ok(Compression::Gzip)
}

/// FASTA reader with automatic gzip/bgzip detection
pub struct FastaReader {
    records: fasta::Records<BufReader<Box<dyn Read>>>,
}

impl FastaReader {
    /// Open a FASTA file, plain or (bgzip-)compressed.
    pub fn new<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn Read> = match detect_compression(path)? {
            Compression::Bgzip => {
                log::debug!("{}: BGZIP input, using parallel decompression", path.display());
                Box::new(BufReader::with_capacity(
                    BUFFER_SIZE,
                    bgzf::MultithreadedReader::new(file),
                ))
            }
            Compression::Gzip => {
                log::debug!("{}: gzip input, single-threaded decompression", path.display());
                Box::new(BufReader::with_capacity(BUFFER_SIZE, GzDecoder::new(file)))
            }
            Compression::None => Box::new(BufReader::with_capacity(BUFFER_SIZE, file)),
        };

        Ok(Self {
            records: fasta::Reader::new(reader).records(),
        })
    }

    /// Read the next FASTA record
    ///
    /// Returns `Ok(Some(record))` if a record is found, `Ok(None)` at EOF,
    /// and `Err(e)` on a parse error.
    pub fn read_record(&mut self) -> io::Result<Option<fasta::Record>> {
        match self.records.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            None => Ok(None),
        }
    }

    /// Read all records as consecutive pairs with nucleotide-encoded
    /// sequences. A trailing unpaired record is returned separately.
    pub fn read_pairs(&mut self) -> io::Result<(Vec<SequencePair>, Option<String>)> {
        let mut pairs = Vec::new();
        loop {
            let Some(first) = self.read_record()? else {
                return Ok((pairs, None));
            };
            let Some(second) = self.read_record()? else {
                return Ok((pairs, Some(first.id().to_string())));
            };
            pairs.push(SequencePair {
                u_name: first.id().to_string(),
                v_name: second.id().to_string(),
                useq: encode_sequence(first.seq()),
                vseq: encode_sequence(second.seq()),
            });
        }
    }
}

/// Two named, encoded sequences to be aligned against each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePair {
    pub u_name: String,
    pub v_name: String,
    pub useq: Vec<u8>,
    pub vseq: Vec<u8>,
}
