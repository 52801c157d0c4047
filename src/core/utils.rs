use std::{fs, io::Write, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use super::Error;

pub fn write_json_file<T: Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<(), Error> {
    let file = fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

/// `Ok(None)` when the file does not exist.
pub fn read_json_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Option<T>, Error> {
    let path = path.as_ref();
    if fs::metadata(path).is_err() {
        return Ok(None);
    }

    let json = fs::read_to_string(path)?;
    // Some editors save with a BOM
    Ok(Some(serde_json::from_str(json.trim_start_matches('\u{feff}'))?))
}
