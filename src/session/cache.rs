// File-based session cache, the local data source for all analysis

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use log::{debug, info, warn};

use super::{EventInfo, Session, SessionKind, SessionRecord, load_session_jsonl, write_session};
use crate::PitwallError;

const SESSION_FILE_EXTENSION: &str = "jsonl";

/// Trait defining the interface for session data sources
pub trait SessionProvider {
    /// Load a session by year, event name (or location) and session kind
    fn get_session(
        &mut self,
        year: u16,
        event: &str,
        kind: SessionKind,
    ) -> Result<Session, PitwallError>;

    /// List the event info of every session available
    fn list_sessions(&self) -> Result<Vec<EventInfo>, PitwallError>;
}

/// Session cache laid out as `<cache>/<year>/<event>/<KIND>.jsonl`
#[derive(Debug)]
pub struct FileBasedCache {
    cache_path: PathBuf,
    /// Sessions already loaded from disk, keyed by file path
    cache: HashMap<PathBuf, Session>,
}

impl FileBasedCache {
    /// Create a new cache rooted at `cache_path`, creating the directory if needed
    pub fn new(cache_path: PathBuf) -> Result<Self, PitwallError> {
        if !cache_path.exists() {
            fs::create_dir_all(&cache_path).map_err(|e| PitwallError::CacheIOError { source: e })?;
        }

        Ok(Self {
            cache_path,
            cache: HashMap::new(),
        })
    }

    /// Create the cache in the default user cache directory
    pub fn new_default() -> Result<Self, PitwallError> {
        Self::new(Self::default_cache_path()?)
    }

    /// Enable the cache at a user supplied location, `~` expands to the home directory
    pub fn enable(path: &str) -> Result<Self, PitwallError> {
        let expanded = match path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().ok_or(PitwallError::NoCacheDir)?.join(rest),
            None => PathBuf::from(path),
        };
        Self::new(expanded)
    }

    pub fn default_cache_path() -> Result<PathBuf, PitwallError> {
        let cache_dir = dirs::cache_dir().ok_or(PitwallError::NoCacheDir)?;
        Ok(cache_dir.join("pitwall"))
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Normalize event name for consistent directory naming
    pub fn normalize_event_name(event: &str) -> String {
        event
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }

    fn file_path_for_session(&self, info: &EventInfo) -> PathBuf {
        self.cache_path
            .join(info.year.to_string())
            .join(Self::normalize_event_name(&info.event_name))
            .join(format!("{}.{}", info.session_kind, SESSION_FILE_EXTENSION))
    }

    /// Write a session to its slot in the cache, replacing any previous copy
    pub fn store_session(&mut self, session: &Session) -> Result<PathBuf, PitwallError> {
        let file_path = self.file_path_for_session(&session.info);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| PitwallError::CacheIOError { source: e })?;
        }
        write_session(&file_path, session)?;
        self.cache.insert(file_path.clone(), session.clone());
        info!(
            "Stored {} {} {} in cache",
            session.info.year, session.info.event_name, session.info.session_kind
        );
        Ok(file_path)
    }

    /// Load a session file from anywhere on disk and add it to the cache
    pub fn import_file(&mut self, source_file: &Path) -> Result<EventInfo, PitwallError> {
        let session = load_session_jsonl(source_file)?;
        self.store_session(&session)?;
        Ok(session.info)
    }

    /// Clear the in-memory copy of loaded sessions
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn event_dirs(&self, year: u16) -> Result<Vec<PathBuf>, PitwallError> {
        let year_dir = self.cache_path.join(year.to_string());
        if !year_dir.exists() {
            return Ok(Vec::new());
        }
        let entries =
            fs::read_dir(&year_dir).map_err(|e| PitwallError::CacheIOError { source: e })?;
        let mut dirs = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| PitwallError::CacheIOError { source: e })?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Resolve the session file for a possibly partial event name or location
    fn resolve_session_file(
        &self,
        year: u16,
        event: &str,
        kind: SessionKind,
    ) -> Result<PathBuf, PitwallError> {
        let query = Self::normalize_event_name(event);
        let file_name = format!("{}.{}", kind, SESSION_FILE_EXTENSION);

        let exact = self
            .cache_path
            .join(year.to_string())
            .join(&query)
            .join(&file_name);
        if exact.exists() {
            return Ok(exact);
        }

        let mut candidates = Vec::new();
        for dir in self.event_dirs(year)? {
            let session_file = dir.join(&file_name);
            if !session_file.exists() {
                continue;
            }
            let dir_name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            if dir_name.contains(&query) {
                candidates.push((dir_name, session_file));
                continue;
            }
            match read_event_info(&session_file) {
                Some(info) if Self::normalize_event_name(&info.location).contains(&query) => {
                    candidates.push((dir_name, session_file));
                }
                Some(_) => {}
                None => warn!("Could not read event record of {:?}", session_file),
            }
        }

        match candidates.len() {
            0 => Err(PitwallError::SessionNotFound {
                year,
                event: event.to_string(),
                session: kind.to_string(),
            }),
            1 => {
                let (dir_name, path) = candidates.remove(0);
                debug!("Resolved event '{}' to {}", event, dir_name);
                Ok(path)
            }
            _ => Err(PitwallError::AmbiguousEvent {
                query: event.to_string(),
                candidates: candidates.into_iter().map(|(name, _)| name).collect(),
            }),
        }
    }
}

impl SessionProvider for FileBasedCache {
    fn get_session(
        &mut self,
        year: u16,
        event: &str,
        kind: SessionKind,
    ) -> Result<Session, PitwallError> {
        let file_path = self.resolve_session_file(year, event, kind)?;
        if let Some(session) = self.cache.get(&file_path) {
            debug!("Session {:?} served from memory", file_path);
            return Ok(session.clone());
        }
        let session = load_session_jsonl(&file_path)?;
        self.cache.insert(file_path, session.clone());
        Ok(session)
    }

    fn list_sessions(&self) -> Result<Vec<EventInfo>, PitwallError> {
        if !self.cache_path.exists() {
            return Ok(Vec::new());
        }
        let mut sessions = Vec::new();
        let years = fs::read_dir(&self.cache_path)
            .map_err(|e| PitwallError::CacheIOError { source: e })?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u16>().ok())
            .sorted()
            .collect_vec();
        for year in years {
            for dir in self.event_dirs(year)? {
                let entries =
                    fs::read_dir(&dir).map_err(|e| PitwallError::CacheIOError { source: e })?;
                for entry in entries.filter_map(|e| e.ok()) {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(SESSION_FILE_EXTENSION) {
                        continue;
                    }
                    match read_event_info(&path) {
                        Some(info) => sessions.push(info),
                        None => warn!("Skipping unreadable session file {:?}", path),
                    }
                }
            }
        }
        sessions.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then(a.event_name.cmp(&b.event_name))
                .then(a.session_kind.cmp(&b.session_kind))
        });
        Ok(sessions)
    }
}

/// Reads only the leading event record of a session file
fn read_event_info(session_file: &Path) -> Option<EventInfo> {
    let file = File::open(session_file).ok()?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line).ok()?;

    match serde_json::from_str::<SessionRecord>(&first_line).ok()? {
        SessionRecord::Event(info) => Some(info),
        _ => None,
    }
}
