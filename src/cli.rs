use clap::Parser;
use std::path::PathBuf;

use crate::config::SequenceSettings;
use crate::core::resolver::Source;
use crate::entities::FilterMode;

// Build version with decoder info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Images: image 0.25 (PNG, JPEG, TIFF, TGA, EXR, HDR)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Image sequence flipbook
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Folder of images, printf pattern (`shot.%04d.png`) or filename prefix (with --start/--end)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// First frame number of a numbered sequence
    #[arg(long = "start", value_name = "N", allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Last frame number of a numbered sequence (inclusive)
    #[arg(long = "end", value_name = "N", allow_negative_numbers = true)]
    pub end: Option<i64>,

    /// Zero padding width of frame numbers (0 = unpadded)
    #[arg(short = 'd', long = "digits", value_name = "N", default_value_t = 0)]
    pub digits: usize,

    /// File extension: required for numbered sequences, filters folder listings
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub ext: Option<String>,

    /// Playback frame rate (overrides settings file)
    #[arg(long = "fps", value_name = "FPS")]
    pub fps: Option<f64>,

    /// Decode folder loads on a background thread
    #[arg(short = 't', long = "threaded")]
    pub threaded: bool,

    /// Cap on images listed from a folder (0 = unlimited)
    #[arg(short = 'm', long = "max-frames", value_name = "N")]
    pub max_frames: Option<usize>,

    /// Texture filter for both minification and magnification (nearest|linear)
    #[arg(long = "filter", value_name = "MODE")]
    pub filter: Option<FilterMode>,

    /// Load and walk every frame without opening a window
    #[arg(long = "headless")]
    pub headless: bool,

    /// Write the effective settings (file values plus these flags) back to the settings file
    #[arg(long = "save-settings")]
    pub save_settings: bool,

    /// Enable debug logging to file (default: flipbook.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Interpret SOURCE and the range flags as a load source.
    ///
    /// - `%` in SOURCE: printf pattern, needs `--start` and `--end`
    /// - `--start`/`--end` given: numbered prefix, needs `--ext`
    /// - otherwise: folder
    pub fn load_source(&self) -> Result<Source, String> {
        let range = match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            (None, None) => None,
            _ => return Err("--start and --end must be given together".to_string()),
        };

        if self.source.contains('%') {
            let (start, end) = range.ok_or("printf patterns need --start and --end")?;
            return Ok(Source::Pattern {
                pattern: self.source.clone(),
                start,
                end,
            });
        }

        if let Some((start, end)) = range {
            let ext = self.ext.clone().ok_or("numbered sequences need --ext")?;
            return Ok(Source::Numbered {
                prefix: self.source.clone(),
                ext,
                start,
                end,
                digits: self.digits,
            });
        }

        Ok(Source::Folder {
            folder: PathBuf::from(&self.source),
            extension: self.ext.clone(),
            max_frames: None,
        })
    }

    /// Override settings-file values with the flags given on the command line
    pub fn apply_to(&self, settings: &mut SequenceSettings) {
        if let Some(fps) = self.fps {
            settings.frame_rate = fps;
        }
        if self.threaded {
            settings.threaded = true;
        }
        if let Some(max_frames) = self.max_frames {
            settings.max_frames = max_frames;
        }
        if self.ext.is_some() {
            settings.extension = self.ext.clone();
        }
        if let Some(filter) = self.filter {
            settings.min_filter = filter;
            settings.mag_filter = filter;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("flipbook").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_folder_source() {
        let args = parse(&["shots/", "--ext", "png", "-vv"]);
        assert_eq!(args.verbosity, 2);
        match args.load_source().unwrap() {
            Source::Folder { folder, extension, .. } => {
                assert_eq!(folder, PathBuf::from("shots/"));
                assert_eq!(extension.as_deref(), Some("png"));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_numbered_source() {
        let args = parse(&["frames/f", "--start", "1", "--end", "3", "-d", "3", "-e", "png"]);
        match args.load_source().unwrap() {
            Source::Numbered { prefix, ext, start, end, digits } => {
                assert_eq!((prefix.as_str(), ext.as_str()), ("frames/f", "png"));
                assert_eq!((start, end, digits), (1, 3, 3));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_pattern_source_needs_range() {
        assert!(parse(&["shot.%04d.exr"]).load_source().is_err());
        let args = parse(&["shot.%04d.exr", "--start", "10", "--end", "20"]);
        assert!(matches!(args.load_source(), Ok(Source::Pattern { start: 10, end: 20, .. })));
    }

    #[test]
    fn test_numbered_without_ext_is_error() {
        assert!(parse(&["f", "--start", "1", "--end", "2"]).load_source().is_err());
        assert!(parse(&["f", "--start", "1"]).load_source().is_err());
    }

    #[test]
    fn test_filter_and_log_flags() {
        let args = parse(&["dir", "--filter", "nearest", "--log", "--headless"]);
        assert_eq!(args.filter, Some(FilterMode::Nearest));
        assert_eq!(args.log_file, Some(None));
        assert!(args.headless);
        assert!(!args.save_settings);
    }

    #[test]
    fn test_flags_override_settings() {
        let mut settings = SequenceSettings {
            frame_rate: 24.0,
            max_frames: 5,
            ..Default::default()
        };
        parse(&["dir", "--fps", "12", "-t", "--filter", "nearest"]).apply_to(&mut settings);

        assert_eq!(settings.frame_rate, 12.0);
        assert!(settings.threaded);
        assert_eq!(settings.max_frames, 5);
        assert_eq!(settings.extension, None);
        assert_eq!((settings.min_filter, settings.mag_filter), (FilterMode::Nearest, FilterMode::Nearest));
    }
}
