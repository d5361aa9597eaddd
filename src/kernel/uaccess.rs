// CLASSIFICATION: COMMUNITY
// Filename: uaccess.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Copy helpers between kernel buffers and a caller's destination.

use crate::kernel::errno::{KResult, KernelError};

/// Copy from `from` at offset `*ppos` into `to`, advancing `*ppos` by the
/// number of bytes copied. Returns 0 once the offset reaches the end.
pub fn simple_read_from_buffer(to: &mut [u8], ppos: &mut u64, from: &[u8]) -> KResult<usize> {
    let pos = usize::try_from(*ppos).map_err(|_| KernelError::InvalidArgument("offset"))?;
    if pos >= from.len() || to.is_empty() {
        return Ok(0);
    }
    let n = to.len().min(from.len() - pos);
    to[..n].copy_from_slice(&from[pos..pos + n]);
    *ppos += n as u64;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_reads_reassemble() {
        let src = b"0,0,0x1,0x2,[swapper/0]\n";
        let mut pos = 0u64;
        let mut out = Vec::new();
        let mut chunk = [0u8; 5];
        loop {
            let n = simple_read_from_buffer(&mut chunk, &mut pos, src).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, src);
        assert_eq!(pos, src.len() as u64);
    }

    #[test]
    fn read_past_end_is_empty() {
        let mut pos = 100u64;
        let mut buf = [0u8; 8];
        assert_eq!(simple_read_from_buffer(&mut buf, &mut pos, b"abc").unwrap(), 0);
        assert_eq!(pos, 100);
    }
}
