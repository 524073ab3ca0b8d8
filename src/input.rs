//! Loading of reference and read sequences from (possibly compressed) FASTA/FASTQ.
use crate::error::Error;
use crate::Result;
use log::debug;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// A named sequence
pub type SequenceRecord = (String, Vec<u8>);

/// Record format, told apart by the first byte of the stream
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Format {
    /// FASTA, `>` headers
    Fasta,
    /// FASTQ, `@` headers
    Fastq,
}

fn sniff<R: BufRead>(rdr: &mut R) -> Result<Format> {
    match rdr.fill_buf()?.first() {
        Some(b'@') => Ok(Format::Fastq),
        _ => Ok(Format::Fasta),
    }
}

/// Reads every record of a FASTA or FASTQ stream
pub fn read_records<R: Read>(rdr: R) -> Result<Vec<SequenceRecord>> {
    let mut rdr = BufReader::new(rdr);
    let format = sniff(&mut rdr)?;
    debug!("Reading {:?} records", format);

    match format {
        Format::Fasta => bio::io::fasta::Reader::new(rdr)
            .records()
            .map(|record| {
                let record = record?;
                Ok((record.id().to_string(), record.seq().to_vec()))
            })
            .collect(),
        Format::Fastq => bio::io::fastq::Reader::new(rdr)
            .records()
            .map(|record| {
                let record = record.map_err(|e| Error::ReadsRecordError(e.to_string()))?;
                Ok((record.id().to_string(), record.seq().to_vec()))
            })
            .collect(),
    }
}

/// Opens `path` through niffler so gzipped files are read transparently
pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>> {
    let (rdr, compression) = niffler::from_path(path.as_ref())?;
    debug!("Opened {} ({:?})", path.as_ref().display(), compression);
    read_records(rdr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fasta() {
        let records = read_records(&b">chr1 first\nACGT\nAC\n>chr2\nTTT\n"[..]).unwrap();
        assert_eq!(
            records,
            vec![
                ("chr1".to_string(), b"ACGTAC".to_vec()),
                ("chr2".to_string(), b"TTT".to_vec())
            ]
        );
    }

    #[test]
    fn test_fastq() {
        let records = read_records(&b"@read1\nACGT\n+\nIIII\n@read2\nGG\n+\nII\n"[..]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], ("read2".to_string(), b"GG".to_vec()));
    }

    #[test]
    fn test_empty_input() {
        assert!(read_records(&b""[..]).unwrap().is_empty());
    }
}
