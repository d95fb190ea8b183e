use std::path::Path;

use crate::{MAX_FILE_SIZE, TransferError};

/// Checks that `size` is uploadable: non-zero and below 4 GiB.
pub fn validate_file_size(size: u64) -> Result<(), TransferError> {
    if size == 0 {
        return Err(TransferError::EmptyFile);
    }
    if size >= MAX_FILE_SIZE {
        return Err(TransferError::FileTooLarge { size });
    }
    Ok(())
}

/// Returns the name a local file is uploaded under (its final component).
///
/// Rejects paths without a final component (`/`, `..`) and names that are
/// not valid UTF-8.
pub fn upload_file_name(path: &Path) -> Result<String, TransferError> {
    let name = path
        .file_name()
        .ok_or_else(|| TransferError::InvalidFileName(path.display().to_string()))?;
    name.to_str()
        .map(str::to_owned)
        .ok_or_else(|| TransferError::InvalidFileName(path.display().to_string()))
}
