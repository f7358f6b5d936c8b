//! Renders both SRT tracks and muxes the dubbed mix against the original
//! video, burning the target-language subtitles in. A thin `ffmpeg` wrapper
//! — container/codec handling is out of scope here.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_model::align::SubtitleAlignment;
use dubcast_model::subtitle::SubtitleModel;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};
use dubcast_render::{render_source_srt, render_target_srt};

use crate::process;
use crate::workspace::{AUDIO_MIX, RENDER_DUBBED_MP4, RENDER_EN_SRT, RENDER_ZH_SRT, SUBTITLE_ALIGN, SUBTITLE_MODEL};

pub struct BurnPhase {
    pub video_path: PathBuf,
}

#[async_trait]
impl Phase for BurnPhase {
    fn name(&self) -> &str {
        "burn"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec![
            "audio.mix".to_string(),
            "subtitle_model".to_string(),
            "derive.subtitle_align".to_string(),
        ]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::file("render.en_srt", RENDER_EN_SRT),
            OutputSpec::file("render.zh_srt", RENDER_ZH_SRT),
            OutputSpec::file("render.dubbed_mp4", RENDER_DUBBED_MP4),
        ]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let model_path = ctx.resolve(Path::new(SUBTITLE_MODEL));
        let model_bytes = tokio::fs::read(&model_path).await?;
        let model: SubtitleModel =
            serde_json::from_slice(&model_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let align_path = ctx.resolve(Path::new(SUBTITLE_ALIGN));
        let align_bytes = tokio::fs::read(&align_path).await?;
        let alignment: SubtitleAlignment =
            serde_json::from_slice(&align_bytes).map_err(dubcast_foundation::error::ModelError::from)?;

        let en_srt_path = ctx.resolve(Path::new(RENDER_EN_SRT));
        let zh_srt_path = ctx.resolve(Path::new(RENDER_ZH_SRT));
        if let Some(parent) = en_srt_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&en_srt_path, render_target_srt(&alignment)).await?;
        tokio::fs::write(&zh_srt_path, render_source_srt(&model)).await?;

        let mix_path = ctx.resolve(Path::new(AUDIO_MIX));
        let out_path = ctx.resolve(Path::new(RENDER_DUBBED_MP4));

        let video_filter = format!("subtitles={}", en_srt_path.display());
        let args: Vec<&std::ffi::OsStr> = vec![
            std::ffi::OsStr::new("-y"),
            std::ffi::OsStr::new("-i"),
            self.video_path.as_os_str(),
            std::ffi::OsStr::new("-i"),
            mix_path.as_os_str(),
            std::ffi::OsStr::new("-map"),
            std::ffi::OsStr::new("0:v:0"),
            std::ffi::OsStr::new("-map"),
            std::ffi::OsStr::new("1:a:0"),
            std::ffi::OsStr::new("-vf"),
            std::ffi::OsStr::new(&video_filter),
            std::ffi::OsStr::new("-c:a"),
            std::ffi::OsStr::new("aac"),
            std::ffi::OsStr::new("-shortest"),
            out_path.as_os_str(),
        ];
        process::run("ffmpeg", &args, None).await
    }
}
