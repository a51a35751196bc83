//! Binary postcode index.
//!
//! mmap'd binary search on postcodes.bin.
//! Entry format: 4 bytes ASCII postcode + 4 bytes f32 lon + 4 bytes f32 lat.
//! File header: 4 bytes u32 count (little-endian). Entries sorted by postcode.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use crate::dataset::PostalPoint;
use crate::error::{Error, Result};
use crate::POSTCODE_LEN;

const ENTRY_SIZE: usize = POSTCODE_LEN + 8; // 4 + 4 + 4
const HEADER_SIZE: usize = 4; // u32 count

/// Serialize placed points into the index layout. Points without a centroid
/// or with a malformed postcode are skipped; duplicates keep the first.
pub fn encode(points: &[PostalPoint]) -> Vec<u8> {
    let mut entries: Vec<([u8; POSTCODE_LEN], f32, f32)> = points
        .iter()
        .filter_map(|p| {
            let (lon, lat) = p.centroid?;
            let key: [u8; POSTCODE_LEN] = p.postcode.as_bytes().try_into().ok()?;
            key.iter().all(u8::is_ascii_digit).then_some((key, lon as f32, lat as f32))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.dedup_by(|a, b| a.0 == b.0);

    let mut buf = Vec::with_capacity(HEADER_SIZE + entries.len() * ENTRY_SIZE);
    buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for (key, lon, lat) in &entries {
        buf.extend_from_slice(key);
        buf.extend_from_slice(&lon.to_le_bytes());
        buf.extend_from_slice(&lat.to_le_bytes());
    }
    buf
}

/// Binary search an encoded index for `postcode`, returning (lon, lat).
pub fn search(data: &[u8], postcode: &str) -> Result<Option<(f32, f32)>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::Index("truncated header".to_string()));
    }

    let count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if HEADER_SIZE + count * ENTRY_SIZE > data.len() {
        return Err(Error::Index(format!(
            "{} entries declared but file holds {} bytes",
            count,
            data.len()
        )));
    }

    let key = postcode.as_bytes();
    if key.len() != POSTCODE_LEN {
        return Ok(None);
    }

    let entry = |i: usize| &data[HEADER_SIZE + i * ENTRY_SIZE..HEADER_SIZE + (i + 1) * ENTRY_SIZE];
    let (mut low, mut high) = (0usize, count);
    while low < high {
        let mid = low + (high - low) / 2;
        let e = entry(mid);
        match e[..POSTCODE_LEN].cmp(key) {
            std::cmp::Ordering::Equal => {
                let lon = f32::from_le_bytes([e[4], e[5], e[6], e[7]]);
                let lat = f32::from_le_bytes([e[8], e[9], e[10], e[11]]);
                return Ok(Some((lon, lat)));
            }
            std::cmp::Ordering::Less => low = mid + 1,
            std::cmp::Ordering::Greater => high = mid,
        }
    }
    Ok(None)
}

/// Look up `postcode` in the index file at `db_path`.
pub fn lookup(db_path: &Path, postcode: &str) -> Result<Option<(f32, f32)>> {
    let file = File::open(db_path).map_err(|e| Error::io(db_path, e))?;
    let file_size = file.metadata().map_err(|e| Error::io(db_path, e))?.len() as usize;

    if file_size < HEADER_SIZE {
        return Err(Error::Index(format!("{}: truncated header", db_path.display())));
    }

    // mmap the file
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            file_size,
            libc::PROT_READ,
            libc::MAP_PRIVATE,
            file.as_raw_fd(),
            0,
        )
    };
    if ptr == libc::MAP_FAILED {
        return Err(Error::io(db_path, std::io::Error::last_os_error()));
    }
    let data = unsafe { std::slice::from_raw_parts(ptr as *const u8, file_size) };

    let result = search(data, postcode);

    unsafe {
        libc::munmap(ptr, file_size);
    }

    result
}
