//! Audio emitter and receiver.

use bytemuck::{Pod, Zeroable};

use crate::ecs::{Component, ComponentKind, EcsResult, TickContext};
use crate::io::{StreamReader, StreamWriter};

/// Positional sound emitter.
///
/// `is_playing` is runtime state and is not serialized.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSource {
    /// Asset path of the audio clip.
    pub clip: String,
    /// Silences output without stopping playback.
    pub mute: bool,
    /// Starts playback when the simulation starts.
    pub play_on_start: bool,
    /// Restarts the clip when it ends.
    pub looping: bool,
    /// Mixer priority, lower plays first.
    pub priority: u32,
    /// Linear volume, 0..=1.
    pub volume: f32,
    /// Playback speed multiplier.
    pub pitch: f32,
    /// Stereo pan, -1 (left) to 1 (right).
    pub pan: f32,
    playing: bool,
}

impl Default for AudioSource {
    fn default() -> Self {
        Self {
            clip: String::new(),
            mute: false,
            play_on_start: true,
            looping: false,
            priority: 128,
            volume: 1.0,
            pitch: 1.0,
            pan: 0.0,
            playing: false,
        }
    }
}

impl AudioSource {
    /// Whether the clip is currently playing.
    #[inline]
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Starts playback if a clip is assigned.
    pub fn play(&mut self) {
        self.playing = !self.clip.is_empty();
    }

    /// Stops playback.
    pub fn stop(&mut self) {
        self.playing = false;
    }
}

impl Component for AudioSource {
    const KIND: ComponentKind = ComponentKind::AudioSource;

    fn on_start(&mut self, _ctx: &mut TickContext<'_>) {
        if self.play_on_start {
            self.play();
        }
    }

    fn on_stop(&mut self) {
        self.stop();
    }

    fn serialize(&self, stream: &mut StreamWriter) {
        stream.write_str(&self.clip);
        stream.write_bool(self.mute);
        stream.write_bool(self.play_on_start);
        stream.write_bool(self.looping);
        stream.write_u32(self.priority);
        stream.write_f32(self.volume);
        stream.write_f32(self.pitch);
        stream.write_f32(self.pan);
    }

    fn deserialize(&mut self, stream: &mut StreamReader<'_>) -> EcsResult<()> {
        self.clip = stream.read_string()?;
        self.mute = stream.read_bool()?;
        self.play_on_start = stream.read_bool()?;
        self.looping = stream.read_bool()?;
        self.priority = stream.read_u32()?;
        self.volume = stream.read_f32()?;
        self.pitch = stream.read_f32()?;
        self.pan = stream.read_f32()?;
        Ok(())
    }
}

/// Audio receiver, usually attached next to the camera.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct AudioListener {
    /// Master volume applied to everything this listener hears.
    pub volume: f32,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

pod_component!(AudioListener => AudioListener);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_fields_survive_stream() {
        let source = AudioSource {
            clip: "music/theme.ogg".to_string(),
            looping: true,
            volume: 0.5,
            ..AudioSource::default()
        };

        let mut stream = StreamWriter::new();
        source.serialize(&mut stream);

        let mut target = AudioSource::default();
        target
            .deserialize(&mut StreamReader::new(stream.as_slice()))
            .unwrap();
        assert_eq!(target, source);
    }

    #[test]
    fn test_play_requires_clip() {
        let mut source = AudioSource::default();
        source.play();
        assert!(!source.is_playing());

        source.clip = "fx/step.wav".to_string();
        source.play();
        assert!(source.is_playing());
        source.on_stop();
        assert!(!source.is_playing());
    }
}
