pub mod fasta_reader;

pub use fasta_reader::{FastaReader, SequencePair};
