//! Extracts a mono PCM track from the source video. A thin wrapper over
//! `ffmpeg`, out of scope for anything beyond "produce `audio/source.wav`" —
//! container/codec handling is not this pipeline's concern.

use std::path::PathBuf;

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};

use crate::process;
use crate::workspace::AUDIO_SOURCE;

pub struct DemuxPhase {
    pub video_path: PathBuf,
    pub sample_rate: u32,
}

#[async_trait]
impl Phase for DemuxPhase {
    fn name(&self) -> &str {
        "demux"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec![]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::file("audio.source", AUDIO_SOURCE)]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let out_path = ctx.resolve(std::path::Path::new(AUDIO_SOURCE));
        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let sample_rate = self.sample_rate.to_string();
        let video_path = self.video_path.as_os_str();
        let args: Vec<&std::ffi::OsStr> = vec![
            std::ffi::OsStr::new("-y"),
            std::ffi::OsStr::new("-i"),
            video_path,
            std::ffi::OsStr::new("-vn"),
            std::ffi::OsStr::new("-ac"),
            std::ffi::OsStr::new("1"),
            std::ffi::OsStr::new("-ar"),
            std::ffi::OsStr::new(&sample_rate),
            out_path.as_os_str(),
        ];
        process::run("ffmpeg", &args, None).await
    }
}
