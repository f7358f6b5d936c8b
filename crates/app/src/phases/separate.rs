//! Splits `audio/source.wav` into a vocal stem and an accompaniment stem. A
//! thin wrapper over an external source-separation tool (e.g. `demucs`) —
//! the separation model itself is out of scope here.

use async_trait::async_trait;
use dubcast_foundation::error::DubError;
use dubcast_pipeline::phase::{OutputSpec, Phase, PhaseContext};

use crate::process;
use crate::workspace::{AUDIO_ACCOMPANIMENT, AUDIO_SOURCE, AUDIO_VOCALS};

pub struct SeparatePhase {
    pub separator_binary: String,
}

#[async_trait]
impl Phase for SeparatePhase {
    fn name(&self) -> &str {
        "separate"
    }

    fn version(&self) -> u32 {
        1
    }

    fn requires(&self) -> Vec<String> {
        vec!["audio.source".to_string()]
    }

    fn provides(&self) -> Vec<OutputSpec> {
        vec![
            OutputSpec::file("audio.vocals", AUDIO_VOCALS),
            OutputSpec::file("audio.accompaniment", AUDIO_ACCOMPANIMENT),
        ]
    }

    async fn run(&self, ctx: &PhaseContext) -> Result<(), DubError> {
        let source = ctx.resolve(std::path::Path::new(AUDIO_SOURCE));
        let vocals = ctx.resolve(std::path::Path::new(AUDIO_VOCALS));
        let accompaniment = ctx.resolve(std::path::Path::new(AUDIO_ACCOMPANIMENT));
        if let Some(parent) = vocals.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args: Vec<&std::ffi::OsStr> = vec![
            std::ffi::OsStr::new("--vocals-out"),
            vocals.as_os_str(),
            std::ffi::OsStr::new("--accompaniment-out"),
            accompaniment.as_os_str(),
            source.as_os_str(),
        ];
        process::run(&self.separator_binary, &args, None).await
    }
}
