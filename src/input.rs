//! Loading the input blob and writing the output file

use crate::error::{RosterContext, RosterError, RosterResult};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Raw bytes of one input, either mapped from a file or read from a stream
pub enum InputData {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl InputData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            InputData::Mapped(mmap) => &mmap[..],
            InputData::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

/// Map a file into memory. Empty files are not mapped.
pub fn read_file(path: &Path) -> RosterResult<InputData> {
    let name = path.display().to_string();
    let metadata = std::fs::metadata(path).with_file_context(&name)?;
    if metadata.is_dir() {
        return Err(RosterError::is_directory(&name));
    }
    if metadata.len() == 0 {
        return Ok(InputData::Buffered(Vec::new()));
    }

    let file = File::open(path).with_file_context(&name)?;
    // SAFETY: the mapping is read-only and lives for one run; concurrent truncation
    // of the input file by another process is not supported.
    let mmap = unsafe { Mmap::map(&file) }.with_file_context(&name)?;
    Ok(InputData::Mapped(mmap))
}

/// Read an entire stream into memory
pub fn read_stream<R: Read>(mut reader: R) -> RosterResult<InputData> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    Ok(InputData::Buffered(buffer))
}

/// `-` or no path means stdin
pub fn read_input(path: Option<&str>) -> RosterResult<InputData> {
    match path {
        None | Some("-") => read_stream(io::stdin().lock()),
        Some(path) => read_file(Path::new(path)),
    }
}

/// Write `contents` to `path` atomically.
///
/// The data goes to a temporary file in the destination directory first and
/// replaces the destination only once fully flushed.
pub fn write_output_atomic(path: &Path, contents: &str) -> RosterResult<()> {
    let name = path.display().to_string();
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let temp_file = NamedTempFile::new_in(parent).with_file_context(&name)?;
    let mut writer = BufWriter::new(temp_file);
    writer.write_all(contents.as_bytes())?;

    let temp_file = writer
        .into_inner()
        .map_err(|e| RosterError::Io(e.into_error()))?;
    temp_file
        .persist(path)
        .map_err(|e| RosterError::Io(e.error))
        .with_file_context(&name)?;

    Ok(())
}

/// Write `contents` followed by a newline to stdout
pub fn write_stdout(contents: &str) -> RosterResult<()> {
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    writer.write_all(contents.as_bytes())?;
    if !contents.is_empty() {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
