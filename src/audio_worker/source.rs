use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use crate::error::AudioError;

/// 可解码的音频字节流
pub trait MediaStream: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> MediaStream for T {}

pub type TrackStream = Box<dyn MediaStream>;

/// 曲目标识（对目录来源而言就是文件路径）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(PathBuf);

impl TrackId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.file_name() {
            Some(name) => write!(f, "{}", name.to_string_lossy()),
            None => write!(f, "{}", self.0.display()),
        }
    }
}

pub trait TrackSource: Send + Sync {
    /// 当前可用的曲目，可能为空
    fn enumerate(&self) -> Vec<TrackId>;

    fn open_stream(&self, id: &TrackId) -> Result<TrackStream, AudioError>;

    /// 日志里使用的来源描述
    fn describe(&self) -> String;
}

/// 从目录中按扩展名收集曲目
#[derive(Debug, Clone)]
pub struct DirTrackSource {
    dir: PathBuf,
    extension: String,
}

impl DirTrackSource {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl TrackSource for DirTrackSource {
    fn enumerate(&self) -> Vec<TrackId> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(dir = %self.dir.display(), err = %e, "读取曲目目录失败");
                return Vec::new();
            }
        };

        let mut tracks: Vec<TrackId> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .map(|entry| entry.path())
            .filter(|path| self.matches(path))
            .map(TrackId::new)
            .collect();
        tracks.sort_by(|a, b| a.path().file_name().cmp(&b.path().file_name()));
        tracks
    }

    fn open_stream(&self, id: &TrackId) -> Result<TrackStream, AudioError> {
        let path = id.path();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AudioError::TrackNotFound(path.to_path_buf()),
            _ => AudioError::OpenFile {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        format!("{}/*.{}", self.dir.display(), self.extension)
    }
}
