use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::device::{DeviceFactory, OutputDevice};
use super::signal::CancelSignal;
use super::source::{TrackId, TrackStream};
use crate::error::AudioError;

/// 不发声的输出：读完曲目数据后按固定时长“播放”
#[derive(Debug)]
pub struct NullOutput {
    track_length: Duration,
    buffer_depth: usize,
    stop: CancelSignal,
    played: AtomicUsize,
}

impl NullOutput {
    pub fn new(track_length: Duration, buffer_depth: usize) -> Self {
        Self {
            track_length,
            buffer_depth,
            stop: CancelSignal::new(),
            played: AtomicUsize::new(0),
        }
    }

    pub fn buffer_depth(&self) -> usize {
        self.buffer_depth
    }

    /// 已经开始播放的曲目数
    pub fn played(&self) -> usize {
        self.played.load(Ordering::SeqCst)
    }
}

impl OutputDevice for NullOutput {
    fn play_streaming(&self, track: &TrackId, mut stream: TrackStream) -> Result<(), AudioError> {
        let mut sink = Vec::new();
        stream
            .read_to_end(&mut sink)
            .map_err(|e| AudioError::PlaybackFault(format!("读取 {track} 失败: {e}")))?;
        self.played.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(track = %track, bytes = sink.len(), "null output playing");
        self.stop.wait(self.track_length);
        Ok(())
    }

    fn request_stop(&self) {
        self.stop.raise();
    }

    fn close(&self) {
        self.stop.raise();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NullFactory {
    track_length: Duration,
}

impl NullFactory {
    pub fn new(track_length: Duration) -> Self {
        Self { track_length }
    }
}

impl Default for NullFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(180))
    }
}

impl DeviceFactory for NullFactory {
    fn open(&self, buffer_depth: usize) -> Result<Arc<dyn OutputDevice>, AudioError> {
        Ok(Arc::new(NullOutput::new(self.track_length, buffer_depth)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn stop_interrupts_playback() {
        let out = Arc::new(NullOutput::new(Duration::from_secs(60), 5));
        let player = {
            let out = Arc::clone(&out);
            thread::spawn(move || {
                let start = Instant::now();
                out.play_streaming(&TrackId::new("a.ogg"), Box::new(Cursor::new(vec![0u8; 16])))
                    .map(|_| start.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(30));
        out.request_stop();

        let elapsed = player.join().expect("player thread").expect("play ok");
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(out.played(), 1);
    }
}
