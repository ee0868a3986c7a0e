use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

/// Magic number identifying a sheet snapshot file.
///
/// The sequence includes DOS/Unix line ending detection bytes (0x1A, 0x0A)
/// to help detect text-mode corruption.
const SNAPSHOT_MAGIC: [u8; 9] = *b"gshr-ss\x1A\x0A";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

/// Size of the fixed snapshot header: magic, version, row and column
/// counts, and the header CRC.
const SNAPSHOT_HEADER_SIZE: usize = 9 + 1 + 8 + 8 + 4;

/// A point-in-time image of a sheet's content, used only during save and
/// load.
///
/// The encoding is little-endian throughout:
///
/// ```text
/// magic      [u8; 9]
/// version    u8
/// nrows      u64
/// ncols      u64
/// header_crc u32     crc32 of the fields above
/// cells      nrows * ncols length-prefixed UTF-8 strings, row-major
/// body_crc   u32     crc32 of the cells region
/// ```
///
/// Round-trip content fidelity is the only contract; callers never see the
/// bytes. Decoding validates the magic, version, both checksums and the
/// dimensions, so a torn or corrupted file is rejected rather than loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    rows: Vec<Vec<String>>,
}

impl Snapshot {
    /// Wraps an owned content image. All rows must share one width; the
    /// sheet captures content under every row lock, which guarantees it.
    pub(crate) fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Number of rows in the image.
    pub(crate) fn nrows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the image.
    pub(crate) fn ncols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Consumes the snapshot, yielding its rows.
    pub(crate) fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    /// Serializes the snapshot to bytes.
    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SNAPSHOT_HEADER_SIZE);

        buf.extend_from_slice(&SNAPSHOT_MAGIC);
        buf.push(SNAPSHOT_VERSION);
        buf.extend_from_slice(&(self.nrows() as u64).to_le_bytes());
        buf.extend_from_slice(&(self.ncols() as u64).to_le_bytes());

        let header_crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&header_crc.to_le_bytes());

        let mut body = Vec::new();
        for row in &self.rows {
            for cell in row {
                let bytes = cell.as_bytes();
                let len = u32::try_from(bytes.len()).expect("cell text exceeds maximum length");
                body.extend_from_slice(&len.to_le_bytes());
                body.extend_from_slice(bytes);
            }
        }

        let body_crc = crc32fast::hash(&body);
        buf.extend_from_slice(&body);
        buf.extend_from_slice(&body_crc.to_le_bytes());
        buf
    }

    /// Deserializes a snapshot from bytes, validating the magic, version,
    /// checksums and dimensions.
    pub(crate) fn from_bytes(data: &[u8]) -> io::Result<Self> {
        if data.len() < SNAPSHOT_HEADER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated snapshot header",
            ));
        }

        if data[0..9] != SNAPSHOT_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid snapshot magic number",
            ));
        }

        let version = data[9];
        if version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported snapshot version: {version}"),
            ));
        }

        let nrows = u64::from_le_bytes(data[10..18].try_into().unwrap());
        let ncols = u64::from_le_bytes(data[18..26].try_into().unwrap());

        let stored_crc = u32::from_le_bytes(data[26..30].try_into().unwrap());
        let computed_crc = crc32fast::hash(&data[0..26]);
        if computed_crc != stored_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "snapshot header CRC mismatch",
            ));
        }

        if nrows == 0 || ncols == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "snapshot has empty dimensions",
            ));
        }

        let nrows = usize::try_from(nrows)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "row count too large"))?;
        let ncols = usize::try_from(ncols)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "column count too large"))?;

        if data.len() < SNAPSHOT_HEADER_SIZE + 4 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated snapshot body",
            ));
        }
        let body_end = data.len() - 4;
        let body = &data[SNAPSHOT_HEADER_SIZE..body_end];

        let stored_crc = u32::from_le_bytes(data[body_end..].try_into().unwrap());
        let computed_crc = crc32fast::hash(body);
        if computed_crc != stored_crc {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "snapshot body CRC mismatch",
            ));
        }

        let mut offset = 0;
        let mut rows = Vec::with_capacity(nrows);
        for _ in 0..nrows {
            let mut row = Vec::with_capacity(ncols);
            for _ in 0..ncols {
                let (cell, consumed) = read_cell(&body[offset..])?;
                row.push(cell);
                offset += consumed;
            }
            rows.push(row);
        }

        if offset != body.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "snapshot body has trailing bytes",
            ));
        }

        Ok(Self { rows })
    }

    /// Encodes the snapshot and writes it to `path`, syncing the file
    /// before returning.
    pub(crate) fn write_to_path(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.sync_all()
    }

    /// Reads and decodes the snapshot stored at `path`.
    pub(crate) fn read_from_path(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }
}

/// Reads one length-prefixed UTF-8 cell.
///
/// Returns the cell text and the number of bytes consumed.
fn read_cell(data: &[u8]) -> io::Result<(String, usize)> {
    if data.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated cell length",
        ));
    }

    let len = u32::from_le_bytes(data[0..4].try_into().unwrap()) as usize;
    if data.len() < 4 + len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated cell text",
        ));
    }

    let text = String::from_utf8(data[4..4 + len].to_vec()).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid UTF-8 in cell text: {e}"),
        )
    })?;

    Ok((text, 4 + len))
}
