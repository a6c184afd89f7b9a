use bytes::BufMut;

use super::{Error, Result};

/// Splits a non-negative integer, given as big-endian bytes, into its MPI
/// length prefix and its magnitude with leading zero bytes stripped.
pub(crate) fn mpi_parts(magnitude: &[u8]) -> Result<([u8; 4], &[u8])> {
    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());
    let minimal = &magnitude[start..];
    let len = u32::try_from(minimal.len()).map_err(|_| Error::SerializationFailure)?;
    Ok((len.to_be_bytes(), minimal))
}

/// Writes a non-negative integer in the MPI wire format: a 4-byte big-endian
/// length followed by the minimal magnitude. Zero is written as an empty MPI.
pub fn write_mpi<B: BufMut>(buf: &mut B, magnitude: &[u8]) -> Result<()> {
    let (len, minimal) = mpi_parts(magnitude)?;
    buf.put_slice(&len);
    buf.put_slice(minimal);
    Ok(())
}
