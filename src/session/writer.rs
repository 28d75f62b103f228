use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::debug;

use super::Session;
use crate::PitwallError;

pub fn write_session(file: &Path, session: &Session) -> Result<(), PitwallError> {
    let session_file = File::create(file).map_err(|e| PitwallError::WriterError { source: e })?;
    let mut session_file_writer = BufWriter::new(session_file);
    let mut written = 0;
    for record in session.records() {
        let line = serde_json::to_string(&record)
            .map_err(|e| PitwallError::SessionSerializeError { source: e })?;
        writeln!(session_file_writer, "{}", line)
            .map_err(|e| PitwallError::WriterError { source: e })?;
        written += 1;
    }
    session_file_writer
        .flush()
        .map_err(|e| PitwallError::WriterError { source: e })?;
    debug!("Wrote {} session records to {:?}", written, file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::load_session_jsonl;
    use crate::session::test_support::constant_pace_race;
    use tempfile::TempDir;

    #[test]
    fn test_written_session_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("race.jsonl");
        let session = constant_pace_race(&[("VER", 90.), ("HAM", 91.)], 3);

        write_session(&path, &session).unwrap();
        let loaded = load_session_jsonl(&path).unwrap();

        assert_eq!(loaded.info, session.info);
        assert_eq!(loaded.drivers, session.drivers);
        assert_eq!(loaded.laps, session.laps);
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("race.jsonl");
        let session = constant_pace_race(&[("VER", 90.)], 1);

        assert!(matches!(
            write_session(&path, &session),
            Err(PitwallError::WriterError { .. })
        ));
    }
}
