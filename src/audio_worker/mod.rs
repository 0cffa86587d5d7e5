mod controller;
mod device;
mod notify;
mod null_output;
mod policy;
mod signal;
mod source;
mod worker;

use std::sync::Arc;

pub use controller::{PlaybackConfig, PlaybackController};
pub use device::{DeviceFactory, OutputDevice, RodioFactory, RodioOutput};
pub use notify::{LogNotifier, NotificationSink, PlaybackNotice};
pub use null_output::{NullFactory, NullOutput};
pub use policy::{DisableRequest, ErrorPolicy, FaultKind};
pub use signal::{CancelSignal, WaitOutcome};
pub use source::{DirTrackSource, MediaStream, TrackId, TrackSource, TrackStream};
pub use worker::{IdleInterval, LoopExit};

/// 选择真实输出还是静音输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioBackend {
    #[default]
    Real,
    Null,
}

impl AudioBackend {
    pub fn device_factory(self) -> Arc<dyn DeviceFactory> {
        match self {
            AudioBackend::Real => Arc::new(RodioFactory),
            AudioBackend::Null => Arc::new(NullFactory::default()),
        }
    }
}
